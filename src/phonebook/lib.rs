//! # Phonebook Architecture
//!
//! Phonebook is a **contact-book library** with a small CLI client on top. The
//! library owns validation, storage and rendering plugins; the binary only
//! parses arguments and prints.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, prints tables, handles exit codes      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Configuration (config.rs)                                  │
//! │  - YAML file → schema, store location, plugin folders       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model (model.rs)                                           │
//! │  - Validates every write and every read through the Schema  │
//! │  - Coerces query values, projects store ids into Entries    │
//! └─────────────────────────────────────────────────────────────┘
//!                 │                               │
//!                 ▼                               ▼
//! ┌───────────────────────────────┐ ┌───────────────────────────┐
//! │  Schema (schema/)             │ │  Storage Layer (store/)   │
//! │  - Field types and rules      │ │  - RecordStore trait      │
//! │  - Extension and custom files │ │  - JsonStore, MemoryStore │
//! └───────────────────────────────┘ └───────────────────────────┘
//! ```
//!
//! Formatter plugins ([`formatter`]) sit beside the model: they receive
//! serialized [`Entry`](record::Entry) values and return text.
//!
//! ## Workspaces
//!
//! Every record lives in exactly one named workspace. Operations that take a
//! `workspace: Option<&str>` use [`record::DEFAULT_WORKSPACE`] when given
//! `None`. Identifiers are per workspace and start at 1.
//!
//! ## No I/O Assumptions in Core
//!
//! Nothing outside the CLI writes to stdout or stderr. Diagnostics go through
//! `tracing`; it's up to the binary to install a subscriber.
//!
//! ## Testing Strategy
//!
//! 1. **Schema, query, store**: unit tests next to the code.
//! 2. **Model**: unit tests over [`store::memory::MemoryStore`]; this is where
//!    most behaviour is pinned down.
//! 3. **Integration** (`tests/`): the model over a real [`store::json::JsonStore`]
//!    file, and the binary end to end with `assert_cmd`.
//!
//! ## Module Overview
//!
//! - [`model`]: the orchestrator
//! - [`schema`]: field types, validation, schema composition
//! - [`store`]: storage abstraction and implementations
//! - [`query`]: exact and fuzzy predicates
//! - [`record`]: record and entry types
//! - [`formatter`]: formatter registry and template plugins
//! - [`config`]: configuration file
//! - [`error`]: error types
//! - `cli`: argument parsing and printing for the binary (not part of the lib API)

pub mod config;
pub mod error;
pub mod formatter;
pub mod model;
pub mod query;
pub mod record;
pub mod schema;
pub mod store;
