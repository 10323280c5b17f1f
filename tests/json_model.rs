use phonebook::error::PhonebookError;
use phonebook::model::Model;
use phonebook::record::{record, Record};
use phonebook::schema::{FieldDecl, Schema, SchemaBuilder};
use phonebook::store::json::JsonStore;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

fn schema() -> Schema {
    SchemaBuilder::contact()
        .extend([("age", FieldDecl::of_type("integer"))])
        .unwrap()
        .build()
}

fn people() -> Vec<Record> {
    vec![
        record([("name", json!("Adam")), ("email", json!("adam@al.com")), ("age", json!(30))]),
        record([("name", json!("Bruce")), ("email", json!("bruce@al.com")), ("age", json!(40))]),
        record([("name", json!("Clarisse")), ("email", json!("clarisse@al.com")), ("age", json!(60))]),
        record([("name", json!("Doug")), ("email", json!("doug@al.com")), ("age", json!(33))]),
    ]
}

fn open(path: &Path) -> Model<JsonStore> {
    Model::new(JsonStore::open(path).unwrap(), schema()).unwrap()
}

#[test]
fn records_survive_reopening_the_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.json");

    let mut model = open(&path);
    model.add_many(&people()[..3], None).unwrap();
    model.add_many(&people()[2..], Some("secondary")).unwrap();
    model.into_store().close();

    let model = open(&path);
    let all = model.all().unwrap();
    assert_eq!(all["personal"].len(), 3);
    assert_eq!(all["secondary"].len(), 2);

    let hits = model
        .filter(&record([("age", json!("33"))]), true, Some("secondary"))
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 2);
    assert_eq!(hits[0].display_value("name"), "Doug");
}

#[test]
fn partial_update_is_persisted() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.json");

    let mut model = open(&path);
    let ids = model.add_many(&people(), None).unwrap();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(
        model
            .update(2, &record([("email", json!("bruce@wayne.com"))]), None)
            .unwrap(),
        Some(2)
    );
    drop(model);

    let model = open(&path);
    let bruce = model.get(2, None).unwrap();
    assert_eq!(bruce["email"], json!("bruce@wayne.com"));
    assert_eq!(bruce["age"], json!(40));
}

#[test]
fn failed_batch_leaves_the_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.json");

    let mut model = open(&path);
    model.add(&people()[0], None).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    let mut batch = people();
    batch.push(record([("name", json!("Eve")), ("age", json!("old"))]));
    assert!(matches!(
        model.add_many(&batch, None),
        Err(PhonebookError::Validation(_))
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn stale_records_fail_after_narrowing_the_schema() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.json");

    let mut model = open(&path);
    model.add(&people()[0], None).unwrap();
    model.update_schema(Schema::contact()).unwrap();
    assert!(matches!(model.all(), Err(PhonebookError::Validation(_))));
}

#[test]
fn rejected_update_after_narrowing_leaves_the_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("contacts.json");

    let mut model = open(&path);
    model.add(&people()[0], None).unwrap();
    let before = std::fs::read_to_string(&path).unwrap();

    model.update_schema(Schema::contact()).unwrap();
    assert!(matches!(
        model.update(1, &record([("name", json!("Adam2"))]), None),
        Err(PhonebookError::Validation(ref e)) if e.has_field("age")
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}
