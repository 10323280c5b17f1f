use super::{RecordStore, Tables, DOC_ID_FIELD};
use crate::error::Result;
use crate::query::Query;
use crate::record::Record;
use std::collections::BTreeMap;

/// In-memory storage for testing and development.
/// Does NOT persist data.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
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
        Ok(self.tables.insert(record, workspace))
    }

    fn insert_many(&mut self, records: Vec<Record>, workspace: Option<&str>) -> Result<Vec<u64>> {
        Ok(records
            .into_iter()
            .map(|r| self.tables.insert(r, workspace))
            .collect())
    }

    fn query(&self, query: &Query, workspace: Option<&str>) -> Result<Vec<Record>> {
        Ok(self.tables.query(query, workspace, DOC_ID_FIELD))
    }

    fn update(&mut self, id: u64, fields: Record, workspace: Option<&str>) -> Result<Option<u64>> {
        Ok(self.tables.update(id, fields, workspace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::record;
    use serde_json::json;

    #[test]
    fn insert_many_assigns_ids_in_input_order() {
        let mut store = MemoryStore::new();
        let rows: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|n| record([("name", json!(n))]))
            .collect();
        assert_eq!(store.insert_many(rows, None).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(store.get(3, None).unwrap().unwrap()["name"], json!("c"));
    }

    #[test]
    fn workspaces_are_isolated() {
        let mut store = MemoryStore::new();
        store.insert(record([("name", json!("Adam"))]), None).unwrap();
        store
            .insert(record([("name", json!("Doug"))]), Some("secondary"))
            .unwrap();

        let q = Query::fuzzy().with("name", "doug");
        assert!(store.query(&q, None).unwrap().is_empty());
        assert_eq!(store.query(&q, Some("secondary")).unwrap().len(), 1);
        assert!(store.query(&q, Some("missing")).unwrap().is_empty());

        let all = store.all().unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["personal", "secondary"]);
    }
}
