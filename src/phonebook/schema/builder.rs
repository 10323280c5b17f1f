//! Schema composition.
//!
//! A [`SchemaBuilder`] starts from a static field set (usually the contact
//! fields) and merges runtime declarations into it. The result is an immutable
//! [`Schema`]; nothing about a schema changes after `build()`.

use super::field::{FieldSpec, FieldType};
use super::Schema;
use crate::error::{PhonebookError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field as declared in configuration or in a schema file.
///
/// ```yaml
/// secondary_email:
///   type: email
///   required: true
///   default: foo@bar.com
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(rename = "type", default)]
    pub type_name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    #[serde(default)]
    pub strip_whitespace: bool,

    #[serde(default)]
    pub positive: bool,
}

impl FieldDecl {
    pub fn of_type(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            ..Default::default()
        }
    }

    pub fn required_with_default(mut self, default: Value) -> Self {
        self.required = true;
        self.default = Some(default);
        self
    }

    fn field_type(&self) -> FieldType {
        match FieldType::from_type_name(&self.type_name) {
            FieldType::String { .. } => FieldType::String {
                min_length: self.min_length,
                max_length: self.max_length,
                trim: self.strip_whitespace,
            },
            FieldType::Integer { .. } => FieldType::Integer {
                positive: self.positive,
            },
            FieldType::Float { .. } => FieldType::Float {
                positive: self.positive,
            },
            FieldType::Email => FieldType::Email,
        }
    }

    /// Turns the declaration into a field spec, coercing the default.
    ///
    /// With `require_default`, a required field must carry a default: records
    /// already stored never had the field, so it could not otherwise be satisfied.
    pub(crate) fn into_spec(self, name: &str, require_default: bool) -> Result<FieldSpec> {
        let ty = self.field_type();
        if require_default && self.required && self.default.is_none() {
            return Err(PhonebookError::schema_field(
                name,
                "required field must declare a default",
            ));
        }
        let default = match self.default {
            None | Some(Value::Null) => None,
            Some(value) => Some(ty.coerce(&value).map_err(|reason| {
                PhonebookError::schema_field(name, format!("invalid default: {}", reason))
            })?),
        };
        Ok(FieldSpec {
            name: name.to_string(),
            ty,
            required: self.required,
            default,
        })
    }
}

/// The built-in contact fields.
pub fn contact_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::required(
            "name",
            FieldType::String {
                min_length: None,
                max_length: Some(100),
                trim: true,
            },
        ),
        FieldSpec::optional(
            "address",
            FieldType::String {
                min_length: None,
                max_length: Some(100),
                trim: false,
            },
        ),
        FieldSpec::optional("email", FieldType::Email),
        FieldSpec::optional(
            "phone_number",
            FieldType::String {
                min_length: Some(8),
                max_length: Some(15),
                trim: true,
            },
        ),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    fields: Vec<FieldSpec>,
}

impl SchemaBuilder {
    /// A builder with no fields at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A builder seeded with the built-in contact fields.
    pub fn contact() -> Self {
        Self {
            fields: contact_fields(),
        }
    }

    pub fn from_schema(schema: &Schema) -> Self {
        Self {
            fields: schema.fields().to_vec(),
        }
    }

    /// Adds a field, replacing any existing field with the same name in place.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        match self.fields.iter_mut().find(|f| f.name == spec.name) {
            Some(existing) => *existing = spec,
            None => self.fields.push(spec),
        }
        self
    }

    /// Merges a field-extension map.
    ///
    /// Fails with [`PhonebookError::SchemaField`] if a required extension field
    /// has no default, or if a default doesn't satisfy its own type.
    pub fn extend<I, K>(mut self, decls: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, FieldDecl)>,
        K: AsRef<str>,
    {
        for (name, decl) in decls {
            let spec = decl.into_spec(name.as_ref(), true)?;
            self = self.field(spec);
        }
        Ok(self)
    }

    pub fn build(self) -> Schema {
        Schema::from_fields(self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn extension() -> BTreeMap<String, FieldDecl> {
        let mut map = BTreeMap::new();
        map.insert("age".to_string(), FieldDecl::of_type("integer"));
        map.insert(
            "secondary_email".to_string(),
            FieldDecl::of_type("email").required_with_default(json!("foo@bar.com")),
        );
        map
    }

    #[test]
    fn extension_fields_are_merged() {
        let schema = SchemaBuilder::contact().extend(extension()).unwrap().build();

        let age = schema.field("age").unwrap();
        assert!(!age.required);
        assert_eq!(age.ty, FieldType::Integer { positive: false });

        let secondary = schema.field("secondary_email").unwrap();
        assert!(secondary.required);
        assert_eq!(secondary.default, Some(json!("foo@bar.com")));
    }

    #[test]
    fn required_extension_without_default_is_rejected() {
        let mut map = BTreeMap::new();
        map.insert("nickname", FieldDecl {
            type_name: "string".into(),
            required: true,
            ..Default::default()
        });

        let err = SchemaBuilder::contact().extend(map).unwrap_err();
        assert!(matches!(
            err,
            PhonebookError::SchemaField { ref field, .. } if field == "nickname"
        ));
    }

    #[test]
    fn invalid_default_is_rejected() {
        let map = [(
            "secondary_email",
            FieldDecl::of_type("email").required_with_default(json!("nope")),
        )];
        assert!(matches!(
            SchemaBuilder::contact().extend(map),
            Err(PhonebookError::SchemaField { .. })
        ));
    }

    #[test]
    fn extension_replaces_builtin_in_place() {
        let map = [("email", FieldDecl::of_type("string"))];
        let schema = SchemaBuilder::contact().extend(map).unwrap().build();
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names, vec!["name", "address", "email", "phone_number"]);
        assert_eq!(schema.field("email").unwrap().ty, FieldType::string());
    }

    #[test]
    fn unrecognized_type_becomes_string() {
        let map = [("birthday", FieldDecl::of_type("date"))];
        let schema = SchemaBuilder::contact().extend(map).unwrap().build();
        assert_eq!(schema.field("birthday").unwrap().ty.type_name(), "string");
    }

    #[test]
    fn decl_parses_from_yaml() {
        let decl: FieldDecl =
            serde_yaml::from_str("type: email\nrequired: true\ndefault: foo@bar.com\n").unwrap();
        assert_eq!(decl.type_name, "email");
        assert!(decl.required);
        assert_eq!(decl.default, Some(json!("foo@bar.com")));
    }
}
