//! # Model
//!
//! [`Model`] binds the active [`Schema`] to a [`RecordStore`]. It is the only
//! layer that validates: every write passes through the schema before touching
//! the store, and every read is re-materialized through it on the way out.
//!
//! The store is always handed in explicitly; there is no implicit default store.
//!
//! Because reads are re-validated, swapping the schema with
//! [`Model::update_schema`] can make previously stored records fail on read.
//! Stored data is never migrated.

use crate::error::{PhonebookError, Result, ValidationError};
use crate::query::{MatchMode, Query};
use crate::record::{resolve_workspace, Entry, Record};
use crate::schema::Schema;
use crate::store::RecordStore;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

pub struct Model<S: RecordStore> {
    store: S,
    schema: Schema,
}

impl<S: RecordStore> Model<S> {
    /// Binds `schema` to `store`.
    ///
    /// Fails with [`PhonebookError::SchemaField`] if the schema declares the
    /// store's identifier key as a field.
    pub fn new(store: S, schema: Schema) -> Result<Self> {
        check_id_field(&schema, store.id_field())?;
        Ok(Self { store, schema })
    }

    /// A model over the built-in contact schema.
    pub fn with_contact_schema(store: S) -> Result<Self> {
        Self::new(store, Schema::contact())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hands the store back, ending the model's use of it.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Replaces the active schema for the rest of the process.
    pub fn update_schema(&mut self, schema: Schema) -> Result<()> {
        check_id_field(&schema, self.store.id_field())?;
        self.schema = schema;
        Ok(())
    }

    pub fn add(&mut self, fields: &Record, workspace: Option<&str>) -> Result<u64> {
        let record = self.schema.validate(fields)?;
        let id = self.store.insert(record, workspace)?;
        debug!(id, workspace = resolve_workspace(workspace), "added record");
        Ok(id)
    }

    /// Adds several records. Nothing is written unless every item validates.
    pub fn add_many(&mut self, items: &[Record], workspace: Option<&str>) -> Result<Vec<u64>> {
        let records = items
            .iter()
            .map(|raw| self.schema.validate(raw))
            .collect::<std::result::Result<Vec<_>, ValidationError>>()?;
        let ids = self.store.insert_many(records, workspace)?;
        debug!(count = ids.len(), workspace = resolve_workspace(workspace), "added records");
        Ok(ids)
    }

    pub fn get(&self, id: u64, workspace: Option<&str>) -> Result<Record> {
        let raw = self
            .store
            .get(id, workspace)?
            .ok_or_else(|| PhonebookError::RecordNotFound {
                id,
                workspace: resolve_workspace(workspace).to_string(),
            })?;
        Ok(self.materialize(raw)?.fields)
    }

    /// Records of a workspace matching every `field = value` predicate.
    ///
    /// Exact predicates are coerced through the schema's field types first, so
    /// `{"age": "33"}` finds a stored integer `33`. Fuzzy predicates are matched
    /// on the string form the caller gave.
    pub fn filter(
        &self,
        predicates: &Record,
        exact: bool,
        workspace: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let mode = MatchMode::from_exact(exact);
        let query = match mode {
            MatchMode::Exact => {
                let typed: Record = predicates
                    .iter()
                    .map(|(field, value)| {
                        (field.clone(), self.schema.coerce_query_value(field, value))
                    })
                    .collect();
                Query::from_record(&typed, mode)
            }
            MatchMode::Fuzzy => Query::from_record(predicates, mode),
        };
        self.store
            .query(&query, workspace)?
            .into_iter()
            .map(|raw| self.materialize(raw))
            .collect()
    }

    /// Every workspace with its entries, ordered by identifier.
    pub fn all(&self) -> Result<BTreeMap<String, Vec<Entry>>> {
        self.store
            .all()?
            .into_iter()
            .map(|(workspace, rows)| {
                let entries = rows
                    .into_iter()
                    .map(|raw| self.materialize(raw))
                    .collect::<Result<Vec<_>>>()?;
                Ok((workspace, entries))
            })
            .collect()
    }

    /// Applies a partial update. Only the fields present in `fields` are written.
    ///
    /// The stored record with the update applied must still satisfy the active
    /// schema, otherwise nothing is written. Returns `None` if there is no
    /// record `id` in the workspace.
    pub fn update(
        &mut self,
        id: u64,
        fields: &Record,
        workspace: Option<&str>,
    ) -> Result<Option<u64>> {
        let partial = self.schema.partial().validate(fields)?;

        let Some(mut merged) = self.store.get(id, workspace)? else {
            debug!(id, workspace = resolve_workspace(workspace), "update target not found");
            return Ok(None);
        };
        merged.remove(self.store.id_field());
        for (key, value) in &partial {
            merged.insert(key.clone(), value.clone());
        }
        self.schema.validate(&merged)?;

        self.store.update(id, partial, workspace)
    }

    /// Splits the store's identifier off a raw row and validates the rest.
    fn materialize(&self, mut raw: Record) -> Result<Entry> {
        let id = raw
            .remove(self.store.id_field())
            .as_ref()
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                PhonebookError::Storage(format!(
                    "stored record is missing its {} field",
                    self.store.id_field()
                ))
            })?;
        let fields = self.schema.validate(&raw)?;
        Ok(Entry::new(id, fields))
    }
}

fn check_id_field(schema: &Schema, id_field: &str) -> Result<()> {
    if schema.field(id_field).is_some() {
        return Err(PhonebookError::schema_field(
            id_field,
            "name is reserved for the store identifier",
        ));
    }
    Ok(())
}
