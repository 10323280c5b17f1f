use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Workspace used whenever the caller doesn't name one.
pub const DEFAULT_WORKSPACE: &str = "personal";

/// Key under which [`Entry`] serializes its identifier.
pub const ENTRY_ID_FIELD: &str = "id";

/// A contact: field name to scalar value, in schema order.
pub type Record = Map<String, Value>;

pub fn resolve_workspace(workspace: Option<&str>) -> &str {
    workspace.unwrap_or(DEFAULT_WORKSPACE)
}

/// A validated record together with the identifier the store assigned to it.
///
/// This is the output view of a record: the identifier is read-only and never
/// part of an insert payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Record,
}

impl Entry {
    pub fn new(id: u64, fields: Record) -> Self {
        Self { id, fields }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the field rendered for display, or an empty string when absent.
    pub fn display_value(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Builds a [`Record`] from `(field, value)` pairs.
///
/// ```
/// use phonebook::record::record;
/// let r = record([("name", "Adam".into()), ("age", 30.into())]);
/// assert_eq!(r["age"], 30);
/// ```
pub fn record<I, K>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}
