//! # Storage Layer
//!
//! The [`RecordStore`] trait is the persistence contract the [`Model`](crate::model::Model)
//! talks to. Stores deal in raw records: they never validate, they only keep
//! records per workspace, hand out identifiers and evaluate [`Query`]s.
//!
//! ## Identifiers
//!
//! Each workspace numbers its records from 1, in insertion order. The next
//! identifier is always one past the highest ever stored in that workspace, and
//! since nothing in the core deletes records, an identifier is never reused.
//!
//! Raw records returned by a store carry their identifier under
//! [`RecordStore::id_field`]. The name is store metadata, so a different backend
//! can use a different key without the model layer noticing.
//!
//! ## Implementations
//!
//! - [`json::JsonStore`]: the embedded JSON document store (production).
//! - [`memory::MemoryStore`]: same table logic with no I/O (testing).
//!
//! ## Storage Format
//!
//! ```text
//! {
//!   "personal": { "1": { "name": "Adam", ... }, "2": { ... } },
//!   "work":     { "1": { "name": "Bruce", ... } }
//! }
//! ```

use crate::error::Result;
use crate::query::Query;
use crate::record::{resolve_workspace, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod json;
pub mod memory;

/// Identifier key used by the shipped stores.
pub const DOC_ID_FIELD: &str = "doc_id";

/// Abstract interface for workspace-scoped record storage.
///
/// `workspace: None` always means [`DEFAULT_WORKSPACE`](crate::record::DEFAULT_WORKSPACE).
pub trait RecordStore {
    /// Key under which raw results carry their identifier.
    fn id_field(&self) -> &str;

    /// Every record of every workspace, ordered by identifier.
    fn all(&self) -> Result<BTreeMap<String, Vec<Record>>>;

    fn get(&self, id: u64, workspace: Option<&str>) -> Result<Option<Record>>;

    /// Stores a record and returns its new identifier.
    fn insert(&mut self, record: Record, workspace: Option<&str>) -> Result<u64>;

    /// Stores several records at once; identifiers follow input order.
    fn insert_many(&mut self, records: Vec<Record>, workspace: Option<&str>) -> Result<Vec<u64>>;

    /// Records of one workspace matching every predicate of `query`.
    fn query(&self, query: &Query, workspace: Option<&str>) -> Result<Vec<Record>>;

    /// Merges `fields` into an existing record.
    ///
    /// Keys absent from `fields` are left as stored. Returns `None` if there is
    /// no record `id` in the workspace.
    fn update(&mut self, id: u64, fields: Record, workspace: Option<&str>) -> Result<Option<u64>>;
}

type Workspace = BTreeMap<u64, Record>;

/// The in-memory shape of a store: workspace name to records by identifier.
///
/// Both shipped stores keep their data in one of these; [`json::JsonStore`]
/// additionally mirrors it to disk after every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Tables {
    workspaces: BTreeMap<String, Workspace>,
}

impl Tables {
    pub(crate) fn all(&self, id_field: &str) -> BTreeMap<String, Vec<Record>> {
        self.workspaces
            .iter()
            .map(|(name, records)| {
                let rows = records
                    .iter()
                    .map(|(id, r)| with_id(*id, r, id_field))
                    .collect();
                (name.clone(), rows)
            })
            .collect()
    }

    pub(crate) fn get(&self, id: u64, workspace: Option<&str>, id_field: &str) -> Option<Record> {
        self.workspaces
            .get(resolve_workspace(workspace))?
            .get(&id)
            .map(|r| with_id(id, r, id_field))
    }

    pub(crate) fn insert(&mut self, record: Record, workspace: Option<&str>) -> u64 {
        let table = self
            .workspaces
            .entry(resolve_workspace(workspace).to_string())
            .or_default();
        let id = table.keys().next_back().map_or(1, |last| last + 1);
        table.insert(id, record);
        id
    }

    pub(crate) fn query(&self, query: &Query, workspace: Option<&str>, id_field: &str) -> Vec<Record> {
        let Some(table) = self.workspaces.get(resolve_workspace(workspace)) else {
            return Vec::new();
        };
        table
            .iter()
            .filter(|(_, r)| query.matches(r))
            .map(|(id, r)| with_id(*id, r, id_field))
            .collect()
    }

    pub(crate) fn update(&mut self, id: u64, fields: Record, workspace: Option<&str>) -> Option<u64> {
        let stored = self
            .workspaces
            .get_mut(resolve_workspace(workspace))?
            .get_mut(&id)?;
        for (key, value) in fields {
            stored.insert(key, value);
        }
        Some(id)
    }
}

fn with_id(id: u64, record: &Record, id_field: &str) -> Record {
    let mut row = record.clone();
    row.insert(id_field.to_string(), Value::from(id));
    row
}
