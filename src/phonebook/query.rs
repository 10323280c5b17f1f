//! Record filtering.
//!
//! A [`Query`] is a conjunction of field predicates evaluated in one
//! [`MatchMode`]. Stores evaluate it against each raw record of a workspace;
//! it knows nothing about schemas or storage.

use crate::record::Record;
use serde_json::Value;

/// How a predicate compares its target with a stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Type-aware equality. Strings are case-sensitive, numbers compare by value.
    Exact,
    /// Case-insensitive substring containment on the string form of both sides.
    #[default]
    Fuzzy,
}

impl MatchMode {
    pub fn from_exact(exact: bool) -> Self {
        if exact {
            MatchMode::Exact
        } else {
            MatchMode::Fuzzy
        }
    }
}

/// A single `field = value` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub value: Value,
}

impl Predicate {
    pub fn new(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Returns `false` when the record lacks the field.
    pub fn matches(&self, record: &Record, mode: MatchMode) -> bool {
        let Some(stored) = record.get(&self.field) else {
            return false;
        };
        match mode {
            MatchMode::Exact => values_equal(stored, &self.value),
            MatchMode::Fuzzy => contains(stored, &self.value),
        }
    }
}

/// Predicates joined with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    pub mode: MatchMode,
}

impl Query {
    pub fn new(mode: MatchMode) -> Self {
        Self {
            predicates: Vec::new(),
            mode,
        }
    }

    pub fn exact() -> Self {
        Self::new(MatchMode::Exact)
    }

    pub fn fuzzy() -> Self {
        Self::new(MatchMode::Fuzzy)
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.predicates.push(Predicate::new(field, value));
        self
    }

    /// Builds a query from a field mapping, one predicate per entry.
    pub fn from_record(fields: &Record, mode: MatchMode) -> Self {
        Self {
            predicates: fields
                .iter()
                .map(|(k, v)| Predicate::new(k.clone(), v.clone()))
                .collect(),
            mode,
        }
    }

    /// True if every predicate holds. An empty query matches everything.
    pub fn matches(&self, record: &Record) -> bool {
        self.predicates.iter().all(|p| p.matches(record, self.mode))
    }
}

fn values_equal(stored: &Value, target: &Value) -> bool {
    match (stored, target) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => a.as_f64() == b.as_f64(),
        },
        (a, b) => a == b,
    }
}

fn contains(stored: &Value, target: &Value) -> bool {
    let Some(haystack) = string_form(stored) else {
        return false;
    };
    if haystack.is_empty() {
        return false;
    }
    let needle = string_form(target).unwrap_or_default();
    haystack
        .to_lowercase()
        .contains(&needle.trim().to_lowercase())
}

fn string_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
