use super::{RecordStore, Tables, DOC_ID_FIELD};
use crate::error::{PhonebookError, Result};
use crate::query::Query;
use crate::record::Record;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Embedded JSON document store.
///
/// The whole document is read once on [`open`](JsonStore::open) and written
/// back after every mutating call (write to a temp file, then rename). No file
/// handle is held between calls, so opening the same path again is always safe.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    tables: Tables,
}

impl JsonStore {
    /// Opens the store at `path`, creating an empty document if it doesn't exist.
    ///
    /// Fails with [`PhonebookError::Storage`] if `path` is a directory, its parent
    /// is not an existing directory, the file can't be written, or it holds
    /// something other than a store document.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.is_dir() {
            return Err(PhonebookError::Storage(format!(
                "{} is a directory, expected a .json file",
                path.display()
            )));
        }
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if !parent.is_dir() {
            return Err(PhonebookError::Storage(format!(
                "{} is not a valid directory",
                parent.display()
            )));
        }

        let store = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| storage_error(&path, e))?;
            let tables = if content.trim().is_empty() {
                Tables::default()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    PhonebookError::Storage(format!(
                        "{} is not a valid store document: {}",
                        path.display(),
                        e
                    ))
                })?
            };
            Self { path, tables }
        } else {
            let store = Self {
                path,
                tables: Tables::default(),
            };
            store.persist(&store.tables)?;
            store
        };

        debug!(path = %store.path.display(), "opened json store");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Releases the store. Every write is already on disk.
    pub fn close(self) {
        debug!(path = %self.path.display(), "closed json store");
    }

    fn persist(&self, tables: &Tables) -> Result<()> {
        let content = serde_json::to_string_pretty(tables)?;
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "store.json".to_string());
        let tmp = self.path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&tmp, content).map_err(|e| storage_error(&self.path, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| storage_error(&self.path, e))?;
        Ok(())
    }

    /// Applies `op` to a copy of the tables and keeps it only once it's on disk.
    fn write<T>(&mut self, op: impl FnOnce(&mut Tables) -> T) -> Result<T> {
        let mut next = self.tables.clone();
        let out = op(&mut next);
        self.persist(&next)?;
        self.tables = next;
        Ok(out)
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> PhonebookError {
    PhonebookError::Storage(format!("{}: {}", path.display(), err))
}

impl RecordStore for JsonStore {
    fn id_field(&self) -> &str {
        DOC_ID_FIELD
    }

    fn all(&self) -> Result<BTreeMap<String, Vec<Record>>> {
        Ok(self.tables.all(DOC_ID_FIELD))
    }

    fn get(&self, id: u64, workspace: Option<&str>) -> Result<Option<Record>> {
        Ok(self.tables.get(id, workspace, DOC_ID_FIELD))
    }

    fn insert(&mut self, record: Record, workspace: Option<&str>) -> Result<u64> {
        self.write(|t| t.insert(record, workspace))
    }

    fn insert_many(&mut self, records: Vec<Record>, workspace: Option<&str>) -> Result<Vec<u64>> {
        self.write(|t| {
            records
                .into_iter()
                .map(|r| t.insert(r, workspace))
                .collect()
        })
    }

    fn query(&self, query: &Query, workspace: Option<&str>) -> Result<Vec<Record>> {
        Ok(self.tables.query(query, workspace, DOC_ID_FIELD))
    }

    fn update(&mut self, id: u64, fields: Record, workspace: Option<&str>) -> Result<Option<u64>> {
        if self.tables.get(id, workspace, DOC_ID_FIELD).is_none() {
            return Ok(None);
        }
        self.write(|t| t.update(id, fields, workspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn open_creates_an_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let store = JsonStore::open(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap().trim(), "{}");
    }

    #[test]
    fn data_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");

        let mut store = JsonStore::open(&path).unwrap();
        store.insert(record([("name", json!("Adam"))]), None).unwrap();
        store
            .insert(record([("name", json!("Bruce"))]), Some("work"))
            .unwrap();
        store.close();

        let mut store = JsonStore::open(&path).unwrap();
        assert_eq!(store.get(1, None).unwrap().unwrap()["name"], json!("Adam"));
        assert_eq!(
            store.get(1, Some("work")).unwrap().unwrap()["name"],
            json!("Bruce")
        );
        assert_eq!(store.insert(record([("name", json!("C"))]), None).unwrap(), 2);
    }

    #[test]
    fn directory_path_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, PhonebookError::Storage(_)));
    }

    #[test]
    fn missing_parent_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let err = JsonStore::open(dir.path().join("nope").join("db.json")).unwrap_err();
        assert!(matches!(err, PhonebookError::Storage(_)));
    }

    #[test]
    fn garbage_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonStore::open(&path),
            Err(PhonebookError::Storage(_))
        ));
    }

    #[test]
    fn update_of_missing_id_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db.json");
        let mut store = JsonStore::open(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        assert_eq!(
            store.update(7, record([("name", json!("x"))]), None).unwrap(),
            None
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonStore::open(dir.path().join("db.json")).unwrap();
        store.insert(record([("name", json!("Adam"))]), None).unwrap();

        for entry in fs::read_dir(dir.path()).unwrap() {
            let name = entry.unwrap().file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"));
        }
    }
}
