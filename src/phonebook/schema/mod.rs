//! # Record Schema
//!
//! A [`Schema`] is an ordered list of [`FieldSpec`]s describing what a contact
//! may contain. Every write goes through [`Schema::validate`], and every read is
//! re-materialized through it, so records always come back in schema order with
//! defaults applied.
//!
//! ## Validation order
//!
//! 1. Unknown fields are rejected.
//! 2. Each supplied value is coerced to its field type (length bounds, email
//!    format, number parsing, positivity).
//! 3. Omitted fields take their declared default; a required field with neither
//!    a value nor a default fails.
//!
//! All failures of one record are reported together in a single
//! [`ValidationError`].
//!
//! ## Views
//!
//! - [`Schema::partial`]: the update view. Every field is optional and no
//!   defaults are applied, so a partial payload validates to exactly the fields
//!   it carries.
//! - [`Entry`](crate::record::Entry): the output view, a validated record plus
//!   its read-only identifier.
//!
//! ## Custom schemas
//!
//! Besides [`SchemaBuilder::extend`], a complete schema can be loaded from a
//! JSON schema unit with [`Schema::load`]:
//!
//! ```json
//! {
//!   "name": { "type": "string", "required": true, "max_length": 100, "strip_whitespace": true },
//!   "email": { "type": "email" },
//!   "age": { "type": "integer", "positive": true }
//! }
//! ```

mod builder;
mod field;

pub use builder::{contact_fields, FieldDecl, SchemaBuilder};
pub use field::{FieldSpec, FieldType};

use crate::error::{FieldError, PhonebookError, Result, ValidationError};
use crate::record::Record;
use serde_json::Value;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::contact()
    }
}

impl Schema {
    pub(crate) fn from_fields(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    /// The built-in contact schema: `name`, `address`, `email`, `phone_number`.
    pub fn contact() -> Self {
        SchemaBuilder::contact().build()
    }

    /// Loads a complete schema from a JSON schema unit.
    ///
    /// Field order in the file is the schema's field order. Unlike extensions,
    /// required fields here don't need a default.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Value::Object(decls) = value else {
            return Err(PhonebookError::schema_field(
                "<root>",
                "schema must be a JSON object of field declarations",
            ));
        };

        let mut builder = SchemaBuilder::empty();
        for (name, raw) in decls {
            let decl: FieldDecl = serde_json::from_value(raw)
                .map_err(|e| PhonebookError::schema_field(&name, e.to_string()))?;
            builder = builder.field(decl.into_spec(&name, false)?);
        }
        Ok(builder.build())
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Validates raw fields into a record in schema order.
    pub fn validate(&self, raw: &Record) -> std::result::Result<Record, ValidationError> {
        let mut errors: Vec<FieldError> = raw
            .keys()
            .filter(|key| self.field(key).is_none())
            .map(|key| FieldError::new(key.as_str(), "extra fields not permitted"))
            .collect();

        let mut record = Record::new();
        for spec in &self.fields {
            match raw.get(&spec.name) {
                Some(value) if !value.is_null() => match spec.ty.coerce(value) {
                    Ok(coerced) => {
                        record.insert(spec.name.clone(), coerced);
                    }
                    Err(message) => errors.push(FieldError::new(&spec.name, message)),
                },
                _ => {
                    if let Some(default) = &spec.default {
                        record.insert(spec.name.clone(), default.clone());
                    } else if spec.required {
                        errors.push(FieldError::new(&spec.name, "field required"));
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError::new(errors))
        }
    }

    /// The update view: every field optional, no defaults.
    pub fn partial(&self) -> Schema {
        let fields = self
            .fields
            .iter()
            .cloned()
            .map(|mut f| {
                f.required = false;
                f.default = None;
                f
            })
            .collect();
        Schema { fields }
    }

    /// Coerces a query value through the declared field type.
    ///
    /// Returns the value unchanged when the field is unknown or coercion fails,
    /// so queries on undeclared fields still run.
    pub fn coerce_query_value(&self, field: &str, value: &Value) -> Value {
        self.field(field)
            .and_then(|spec| spec.ty.coerce(value).ok())
            .unwrap_or_else(|| value.clone())
    }
}
