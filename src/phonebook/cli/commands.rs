//! # CLI Layer
//!
//! The binary is one client of the `phonebook` library. This layer is the only
//! place that parses arguments, prints to the terminal or decides exit codes;
//! everything it does goes through [`Model`] and [`FormatterRegistry`].
//!
//! - `run()`: dispatch (called by `main.rs`)
//! - `init_context()`: loads the configuration and opens the model
//! - `handle_*()`: one handler per subcommand

use super::print::{print_info, print_success, print_table};
use super::setup::{init_logging, Cli, Commands};
use clap::Parser;
use phonebook::config::Configuration;
use phonebook::error::{PhonebookError, Result};
use phonebook::formatter::FormatterRegistry;
use phonebook::model::Model;
use phonebook::record::{resolve_workspace, Entry, Record};
use phonebook::store::json::JsonStore;
use serde_json::Value;
use tracing::debug;

/// Explicit `--format` value that forces the table view.
const TABLE_FORMAT: &str = "table";

struct AppContext {
    config: Configuration,
    model: Model<JsonStore>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut ctx = init_context(&cli)?;

    match cli.command {
        Commands::Add { workspace, fields } => handle_add(&mut ctx, workspace, fields),
        Commands::List { format } => handle_list(&ctx, format),
        Commands::Search {
            field,
            value,
            exact,
            workspace,
            format,
        } => handle_search(&ctx, field, value, exact, workspace, format),
        Commands::Update {
            id,
            fields,
            workspace,
        } => handle_update(&mut ctx, id, fields, workspace),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let config = match cli.config.clone().or_else(Configuration::default_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading configuration");
            Configuration::load(path)?
        }
        None => Configuration::default(),
    };
    let model = config.create_model()?;
    Ok(AppContext { config, model })
}

fn handle_add(
    ctx: &mut AppContext,
    workspace: Option<String>,
    fields: Vec<(String, String)>,
) -> Result<()> {
    let ws = workspace.as_deref();
    let id = ctx.model.add(&to_record(fields), ws)?;
    let stored = ctx.model.get(id, ws)?;

    print_success(&format!(
        "Added contact {} to {}",
        id,
        resolve_workspace(ws)
    ));
    print_entries(ctx, resolve_workspace(ws), &[Entry::new(id, stored)]);
    Ok(())
}

fn handle_list(ctx: &AppContext, format: Option<String>) -> Result<()> {
    let all = ctx.model.all()?;
    if all.is_empty() {
        print_info("No contacts found.");
        return Ok(());
    }

    let registry = registry_for(ctx, format.as_deref());
    for (workspace, entries) in &all {
        render(ctx, registry.as_ref(), format.as_deref(), workspace, entries)?;
    }
    Ok(())
}

fn handle_search(
    ctx: &AppContext,
    field: String,
    value: String,
    exact: bool,
    workspace: Option<String>,
    format: Option<String>,
) -> Result<()> {
    let ws = workspace.as_deref();
    print_info(&format!(
        "Searching for field {} with value {}",
        field, value
    ));

    let mut predicates = Record::new();
    predicates.insert(field, Value::String(value));
    let found = ctx.model.filter(&predicates, exact, ws)?;

    let registry = registry_for(ctx, format.as_deref());
    render(
        ctx,
        registry.as_ref(),
        format.as_deref(),
        resolve_workspace(ws),
        &found,
    )
}

fn handle_update(
    ctx: &mut AppContext,
    id: u64,
    fields: Vec<(String, String)>,
    workspace: Option<String>,
) -> Result<()> {
    let ws = workspace.as_deref();
    match ctx.model.update(id, &to_record(fields), ws)? {
        Some(id) => {
            let stored = ctx.model.get(id, ws)?;
            print_success(&format!("Updated contact {}", id));
            print_entries(ctx, resolve_workspace(ws), &[Entry::new(id, stored)]);
            Ok(())
        }
        None => Err(PhonebookError::RecordNotFound {
            id,
            workspace: resolve_workspace(ws).to_string(),
        }),
    }
}

/// CLI values are strings; an empty value means "not given".
fn to_record(fields: Vec<(String, String)>) -> Record {
    fields
        .into_iter()
        .map(|(k, v)| {
            let value = if v.is_empty() {
                Value::Null
            } else {
                Value::String(v)
            };
            (k, value)
        })
        .collect()
}

/// A registry is only scanned when some formatter might be used.
fn registry_for(ctx: &AppContext, format: Option<&str>) -> Option<FormatterRegistry> {
    match format {
        Some(TABLE_FORMAT) => None,
        Some(_) => Some(ctx.config.formatter_registry()),
        None if ctx.config.formatters.is_empty() => None,
        None => Some(ctx.config.formatter_registry()),
    }
}

/// Renders with `--format NAME`, else the first enabled formatter, else a table.
fn render(
    ctx: &AppContext,
    registry: Option<&FormatterRegistry>,
    format: Option<&str>,
    title: &str,
    entries: &[Entry],
) -> Result<()> {
    let Some(registry) = registry else {
        print_entries(ctx, title, entries);
        return Ok(());
    };

    let formatter = match format {
        Some(name) => registry.get(name).ok_or_else(|| {
            PhonebookError::Formatter(format!(
                "unknown formatter '{}' (available: {})",
                name,
                registry.names().collect::<Vec<_>>().join(", ")
            ))
        })?,
        None => match registry.enabled(ctx.config.formatters.as_slice()).first() {
            Some(formatter) => *formatter,
            None => {
                print_entries(ctx, title, entries);
                return Ok(());
            }
        },
    };

    let value = serde_json::to_value(entries)?;
    println!("{}", formatter.format(&value)?);
    Ok(())
}

fn print_entries(ctx: &AppContext, title: &str, entries: &[Entry]) {
    let columns: Vec<&str> = ctx.model.schema().field_names().collect();
    print_table(title, &columns, entries);
}
