//! Configuration file handling.
//!
//! The configuration is a YAML file, by default `phonebook.yaml` in the
//! platform config directory. `PHONEBOOK_CONFIG` points somewhere else.
//!
//! ```yaml
//! database_path: ~/contacts.json
//! custom_schema_path: ./schema.json
//! custom_fields:
//!   age: { type: integer }
//! plugin_folders: [./formatters]
//! formatters: [Csv]
//! ```
//!
//! Relative paths are resolved against the directory holding the file, and a
//! leading `~` against the home directory.

use crate::error::{ConfigurationError, PhonebookError, Result};
use crate::formatter::FormatterRegistry;
use crate::model::Model;
use crate::schema::{FieldDecl, Schema, SchemaBuilder};
use crate::store::json::JsonStore;
use crate::store::DOC_ID_FIELD;
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "PHONEBOOK_CONFIG";

const CONFIG_FILENAME: &str = "phonebook.yaml";
const DATABASE_FILENAME: &str = "phonebook.json";
const JSON_EXTENSION: &str = "json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Store document; `<data dir>/phonebook.json` when unset.
    #[serde(default, alias = "databasePath", skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// A complete JSON schema replacing the built-in contact fields.
    #[serde(default, alias = "customSchemaPath", skip_serializing_if = "Option::is_none")]
    pub custom_schema_path: Option<PathBuf>,

    /// Fields merged into the base schema, in the order the file declares them.
    #[serde(
        default,
        alias = "customFields",
        with = "ordered_fields",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub custom_fields: Vec<(String, FieldDecl)>,

    #[serde(default, alias = "pluginFolders", skip_serializing_if = "Vec::is_empty")]
    pub plugin_folders: Vec<PathBuf>,

    /// Formatter names enabled by default.
    #[serde(default, alias = "formatterNames", skip_serializing_if = "Vec::is_empty")]
    pub formatters: Vec<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "phonebook", "phonebook")
}

impl Configuration {
    /// `$PHONEBOOK_CONFIG`, or `phonebook.yaml` in the platform config dir.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    pub fn default_database_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILENAME))
    }

    /// Loads and validates the file at `path`, or returns defaults if it doesn't exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml(&content)?.resolve_paths(base);
        config.validate()?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses YAML without touching the filesystem. An empty document is the default.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, ConfigurationError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: PathBuf| -> PathBuf {
            let p = expand_home(p);
            if p.is_relative() {
                base.join(p)
            } else {
                p
            }
        };
        self.database_path = self.database_path.map(resolve);
        self.custom_schema_path = self.custom_schema_path.map(resolve);
        self.plugin_folders = self.plugin_folders.into_iter().map(resolve).collect();
        self
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        if let Some(db) = &self.database_path {
            require_json(db)?;
        }

        if let Some(schema) = &self.custom_schema_path {
            if !schema.exists() {
                return Err(ConfigurationError::MissingPath(schema.clone()));
            }
            require_json(schema)?;
        }

        for folder in &self.plugin_folders {
            if !folder.exists() {
                return Err(ConfigurationError::MissingPath(folder.clone()));
            }
            if !folder.is_dir() {
                return Err(ConfigurationError::NotADirectory(folder.clone()));
            }
        }

        if self.custom_field(DOC_ID_FIELD).is_some() {
            return Err(ConfigurationError::Schema(format!(
                "field {} is reserved for the store identifier",
                DOC_ID_FIELD
            )));
        }
        SchemaBuilder::contact()
            .extend(self.custom_fields.clone())
            .map_err(|e| ConfigurationError::Schema(e.to_string()))?;
        Ok(())
    }

    pub fn custom_field(&self, name: &str) -> Option<&FieldDecl> {
        self.custom_fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, decl)| decl)
    }

    /// The active schema: the custom schema (or the contact fields) plus `custom_fields`.
    pub fn build_schema(&self) -> Result<Schema> {
        let builder = match &self.custom_schema_path {
            Some(path) => {
                let base = Schema::load(path).map_err(|e| {
                    ConfigurationError::Schema(format!("{}: {}", path.display(), e))
                })?;
                SchemaBuilder::from_schema(&base)
            }
            None => SchemaBuilder::contact(),
        };
        Ok(builder.extend(self.custom_fields.clone())?.build())
    }

    /// The store document this configuration points to.
    pub fn database_path(&self) -> Result<PathBuf> {
        self.database_path
            .clone()
            .or_else(Self::default_database_path)
            .ok_or_else(|| {
                PhonebookError::Storage("could not determine a data directory".to_string())
            })
    }

    /// Opens the store and binds it to the configured schema.
    ///
    /// The default data directory is created on first use; a configured
    /// `database_path` must live in an existing directory.
    pub fn create_model(&self) -> Result<Model<JsonStore>> {
        let path = self.database_path()?;
        if self.database_path.is_none() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let schema = self.build_schema()?;
        Model::new(JsonStore::open(&path)?, schema)
    }

    pub fn formatter_registry(&self) -> FormatterRegistry {
        FormatterRegistry::from_configuration(self)
    }
}

fn require_json(path: &Path) -> std::result::Result<(), ConfigurationError> {
    if path.extension().is_some_and(|ext| ext == JSON_EXTENSION) {
        Ok(())
    } else {
        Err(ConfigurationError::WrongExtension {
            path: path.to_path_buf(),
            expected: ".json",
        })
    }
}

fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path,
    }
}

/// `custom_fields` as a YAML mapping that keeps its key order.
mod ordered_fields {
    use crate::schema::FieldDecl;
    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(fields: &[(String, FieldDecl)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(fields.iter().map(|(name, decl)| (name, decl)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, FieldDecl)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(FieldsVisitor)
    }

    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, FieldDecl)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of field names to declarations")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut fields: Vec<(String, FieldDecl)> = Vec::new();
            while let Some((name, decl)) = map.next_entry::<String, FieldDecl>()? {
                match fields.iter_mut().find(|(existing, _)| *existing == name) {
                    Some(slot) => slot.1 = decl,
                    None => fields.push((name, decl)),
                }
            }
            Ok(fields)
        }
    }
}
