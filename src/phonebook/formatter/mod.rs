//! # Formatter Plugins
//!
//! A [`FormatterRegistry`] maps type names to [`Formatter`]s. Formatters come
//! from two places:
//!
//! - **Plugin folders**, scanned by [`FormatterRegistry::collect`]. Every
//!   `*.jinja` unit found (recursively, in file-name order) is loaded on its own
//!   and each top-level macro it declares with exactly one argument is
//!   registered under the macro's name.
//! - **Programmatic registration** with [`FormatterRegistry::register`].
//!
//! ```jinja
//! {# formatters/csv.jinja #}
//! {% macro Csv(entries) -%}
//! {% for e in entries %}{{ e.id }},{{ e.name }}
//! {% endfor %}
//! {%- endmacro %}
//! ```
//!
//! Later folders and later units override earlier registrations of the same
//! name. Nothing that goes wrong in a unit aborts the scan: the problem is
//! logged and kept in [`FormatterRegistry::warnings`].

mod template;

pub use template::{TemplateFormatter, UNIT_EXTENSION};

use crate::config::Configuration;
use crate::error::Result;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Something that renders entries as text.
///
/// The value handed to [`format`](Formatter::format) is either one serialized
/// [`Entry`](crate::record::Entry) or an array of them.
pub trait Formatter {
    fn name(&self) -> &str;
    fn format(&self, value: &serde_json::Value) -> Result<String>;
}

/// A problem found while scanning plugin folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginWarning {
    pub path: PathBuf,
    pub message: String,
}

impl PluginWarning {
    fn unit(path: &Path, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    fn type_without_format(name: &str, folder: &Path, kind: &str) -> Self {
        Self {
            path: folder.to_path_buf(),
            message: format!(
                "plugin type {} ({}) from folder {} is not a single-argument macro, skipping",
                name,
                kind,
                folder.display()
            ),
        }
    }
}

impl fmt::Display for PluginWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Uninitialized,
    Scanning,
    Populated,
}

pub struct FormatterRegistry {
    folders: Vec<PathBuf>,
    formatters: BTreeMap<String, Box<dyn Formatter>>,
    warnings: Vec<PluginWarning>,
    state: RegistryState,
}

impl FormatterRegistry {
    /// A registry over `folders`. Nothing is scanned until [`collect`](Self::collect).
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self {
            folders,
            formatters: BTreeMap::new(),
            warnings: Vec::new(),
            state: RegistryState::Uninitialized,
        }
    }

    /// Builds and collects a registry from the configured plugin folders.
    pub fn from_configuration(configuration: &Configuration) -> Self {
        let mut registry = Self::new(configuration.plugin_folders.clone());
        registry.collect();
        registry
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Scans every folder and registers what it finds.
    ///
    /// Safe to call again: units are re-read and re-registered under the same
    /// names, and programmatic registrations are kept unless a unit declares
    /// the same name.
    pub fn collect(&mut self) -> &mut Self {
        self.state = RegistryState::Scanning;
        self.warnings.clear();

        for folder in self.folders.clone() {
            if !folder.is_dir() {
                self.warn(PluginWarning::unit(&folder, "plugin folder not found"));
                continue;
            }
            for unit in self.plugin_units(&folder) {
                let scan = template::scan_unit(&unit);
                for warning in scan.warnings {
                    self.warn(warning);
                }
                for formatter in scan.formatters {
                    debug!(name = formatter.name(), unit = %unit.display(), "registered formatter");
                    self.register(Box::new(formatter));
                }
            }
        }

        self.state = RegistryState::Populated;
        self
    }

    /// Registers a formatter, replacing any earlier one with the same name.
    pub fn register(&mut self, formatter: Box<dyn Formatter>) {
        self.formatters.insert(formatter.name().to_string(), formatter);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Formatter> {
        self.formatters.get(name).map(|f| f.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.formatters.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.formatters.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.formatters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formatters.is_empty()
    }

    /// Diagnostics from the last [`collect`](Self::collect).
    pub fn warnings(&self) -> &[PluginWarning] {
        &self.warnings
    }

    /// The formatters among `names`, in the order given. Unknown names are
    /// logged and left out.
    pub fn enabled<S: AsRef<str>>(&self, names: &[S]) -> Vec<&dyn Formatter> {
        names
            .iter()
            .filter_map(|name| {
                let name = name.as_ref();
                let found = self.get(name);
                if found.is_none() {
                    warn!(name, "enabled formatter is not registered");
                }
                found
            })
            .collect()
    }

    fn warn(&mut self, warning: PluginWarning) {
        warn!(path = %warning.path.display(), "{}", warning.message);
        self.warnings.push(warning);
    }

    /// Unit files under `folder`, sorted by name. Entries that can't be walked
    /// are warned about and skipped.
    fn plugin_units(&mut self, folder: &Path) -> Vec<PathBuf> {
        let mut units = Vec::new();
        for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(folder).to_path_buf();
                    self.warn(PluginWarning::unit(
                        &path,
                        format!("failed to read plugin folder entry: {}", err),
                    ));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if path.extension().is_some_and(|ext| ext == UNIT_EXTENSION) {
                units.push(path);
            }
        }
        units
    }
}
