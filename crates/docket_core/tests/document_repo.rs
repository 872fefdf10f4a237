use chrono::{TimeDelta, TimeZone, Utc};
use docket_core::store::keys;
use docket_core::{
    CoreContext, Document, DocumentRepository, LocalStore, ManualClock, MemoryRemoteStore,
    SqliteLocalStore,
};
use serde_json::{json, Value};
use std::rc::Rc;

const PROJECT: &str = "p1";

struct Fixture {
    local: Rc<SqliteLocalStore>,
    clock: Rc<ManualClock>,
    repo: DocumentRepository,
}

fn fixture() -> Fixture {
    let local = Rc::new(SqliteLocalStore::open_in_memory().unwrap());
    let clock = Rc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let ctx = CoreContext::new("alice", local.clone(), Rc::new(MemoryRemoteStore::new()))
        .with_clock(clock.clone());
    Fixture {
        local,
        clock,
        repo: DocumentRepository::new(ctx),
    }
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

#[test]
fn set_document_indexes_path_once_and_selects_it() {
    let f = fixture();
    let document = Document::with_title_content("Intro", "Hello");

    f.repo.set_document(PROJECT, "a", Some(&document)).unwrap();
    f.repo.set_document(PROJECT, "a", Some(&document)).unwrap();
    f.repo.set_document(PROJECT, "b", Some(&document)).unwrap();

    assert_eq!(f.repo.document_index(PROJECT).unwrap(), vec!["a", "b"]);
    assert_eq!(f.repo.get_document(PROJECT, "a").unwrap(), Some(document));
    assert_eq!(
        f.local.retrieve(&keys::selected_doc_key(PROJECT)).unwrap(),
        Some(json!("b"))
    );
}

#[test]
fn delete_removes_document_and_index_entry_but_not_descendants() {
    let f = fixture();
    for path in ["a", "a.b", "a.b.c", "d"] {
        f.repo
            .set_document(PROJECT, path, Some(&Document::with_title_content(path, "")))
            .unwrap();
    }

    f.repo.delete_document(PROJECT, "a").unwrap();

    assert_eq!(f.repo.get_document(PROJECT, "a").unwrap(), None);
    assert_eq!(
        f.repo.document_index(PROJECT).unwrap(),
        vec!["a.b", "a.b.c", "d"]
    );
    assert!(f.repo.get_document(PROJECT, "a.b").unwrap().is_some());
    assert_eq!(
        f.repo.descendant_paths(PROJECT, "a").unwrap(),
        vec!["a.b", "a.b.c"]
    );
    // Deletes move the selection too.
    assert_eq!(
        f.local.retrieve(&keys::selected_doc_key(PROJECT)).unwrap(),
        Some(json!("a"))
    );
}

#[test]
fn deleting_twice_is_harmless() {
    let f = fixture();
    f.repo
        .set_document(PROJECT, "a", Some(&Document::new()))
        .unwrap();
    f.repo.delete_document(PROJECT, "a").unwrap();
    f.repo.delete_document(PROJECT, "a").unwrap();

    assert!(f.repo.document_index(PROJECT).unwrap().is_empty());
    assert!(f.repo.get_all_documents(PROJECT).unwrap().is_empty());
}

#[test]
fn get_all_documents_follows_index_order_and_skips_missing_entries() {
    let f = fixture();
    f.repo
        .set_document(PROJECT, "z", Some(&doc(json!({"title": "z"}))))
        .unwrap();
    f.repo
        .set_document(PROJECT, "a", Some(&doc(json!({"title": "a"}))))
        .unwrap();
    f.local
        .store(
            &keys::docs_index_key(PROJECT),
            &json!(["z", "ghost", "a"]),
        )
        .unwrap();

    let all = f.repo.get_all_documents(PROJECT).unwrap();
    let paths: Vec<&str> = all.keys().map(String::as_str).collect();
    assert_eq!(paths, vec!["z", "a"]);
    assert_eq!(all["a"].title(), Some("a"));
}

#[test]
fn malformed_index_reads_as_empty_and_recovers_on_write() {
    let f = fixture();
    f.local
        .store(&keys::docs_index_key(PROJECT), &json!({"not": "a list"}))
        .unwrap();
    assert!(f.repo.document_index(PROJECT).unwrap().is_empty());

    f.local
        .store(&keys::docs_index_key(PROJECT), &json!(["a", 3, "a", null]))
        .unwrap();
    assert_eq!(f.repo.document_index(PROJECT).unwrap(), vec!["a"]);

    f.repo
        .set_document(PROJECT, "b", Some(&Document::new()))
        .unwrap();
    assert_eq!(
        f.local.retrieve(&keys::docs_index_key(PROJECT)).unwrap(),
        Some(json!(["a", "b"]))
    );
}

#[test]
fn non_object_document_reads_as_absent() {
    let f = fixture();
    f.local
        .store(&keys::doc_key(PROJECT, "a"), &json!("plain text"))
        .unwrap();
    assert_eq!(f.repo.get_document(PROJECT, "a").unwrap(), None);
}

#[test]
fn documents_are_scoped_per_project() {
    let f = fixture();
    f.repo
        .set_document("p1", "a", Some(&doc(json!({"title": "one"}))))
        .unwrap();
    f.repo
        .set_document("p2", "a", Some(&doc(json!({"title": "two"}))))
        .unwrap();

    assert_eq!(
        f.repo.get_document("p1", "a").unwrap().unwrap().title(),
        Some("one")
    );
    assert_eq!(
        f.repo.get_document("p2", "a").unwrap().unwrap().title(),
        Some("two")
    );
}

#[test]
fn selected_document_falls_back_to_first_and_persists_choice() {
    let f = fixture();
    assert_eq!(f.repo.get_selected_document(PROJECT).unwrap(), None);

    f.repo
        .set_document(PROJECT, "a", Some(&Document::new()))
        .unwrap();
    f.repo
        .set_document(PROJECT, "b", Some(&Document::new()))
        .unwrap();
    assert_eq!(
        f.repo.get_selected_document(PROJECT).unwrap().as_deref(),
        Some("b")
    );

    f.local
        .store(&keys::selected_doc_key(PROJECT), &Value::Null)
        .unwrap();
    assert_eq!(
        f.repo.get_selected_document(PROJECT).unwrap().as_deref(),
        Some("a")
    );
    assert_eq!(
        f.local.retrieve(&keys::selected_doc_key(PROJECT)).unwrap(),
        Some(json!("a"))
    );
}

#[test]
fn open_document_only_moves_selection() {
    let f = fixture();
    f.repo.open_document(PROJECT, "nowhere").unwrap();

    assert_eq!(
        f.repo.get_selected_document(PROJECT).unwrap().as_deref(),
        Some("nowhere")
    );
    assert!(f.repo.document_index(PROJECT).unwrap().is_empty());
}

#[test]
fn update_merges_fields_and_marks_buffered() {
    let f = fixture();
    f.repo
        .set_document(
            PROJECT,
            "a",
            Some(&doc(json!({"title": "old", "content": "body", "extra": 1}))),
        )
        .unwrap();
    f.clock.advance(TimeDelta::minutes(5));

    let updated = f
        .repo
        .update_document(PROJECT, "a", &doc(json!({"title": "new"})))
        .unwrap();

    assert_eq!(updated.title(), Some("new"));
    assert_eq!(updated.content(), Some("body"));
    assert_eq!(updated.get("extra"), Some(&json!(1)));
    assert_eq!(updated.get("updatedAt"), Some(&json!("2024-06-01T12:05:00.000Z")));
    assert!(updated.is_buffered());
    assert_eq!(f.repo.get_document(PROJECT, "a").unwrap(), Some(updated));
}

#[test]
fn update_of_missing_document_creates_it() {
    let f = fixture();
    let updated = f
        .repo
        .update_document(PROJECT, "fresh", &doc(json!({"title": "t"})))
        .unwrap();

    assert_eq!(updated.title(), Some("t"));
    assert!(updated.is_buffered());
    assert_eq!(f.repo.document_index(PROJECT).unwrap(), vec!["fresh"]);
}

#[test]
fn create_document_under_root_and_parent() {
    let f = fixture();

    let root_path = f.repo.create_document(PROJECT, None, None).unwrap();
    assert_eq!(root_path.len(), 7);
    assert!(!root_path.contains('.'));

    let child = f
        .repo
        .create_document(
            PROJECT,
            Some(&root_path),
            Some(doc(json!({"title": "Child", "tag": "x"}))),
        )
        .unwrap();
    assert!(child.starts_with(&format!("{root_path}.")));
    assert_eq!(child.len(), root_path.len() + 1 + 7);

    let root_doc = f.repo.get_document(PROJECT, &root_path).unwrap().unwrap();
    assert_eq!(root_doc.title(), Some(""));
    assert_eq!(root_doc.content(), Some(""));
    assert_eq!(
        root_doc.get("createdAt"),
        Some(&json!("2024-06-01T12:00:00.000Z"))
    );
    assert!(root_doc.is_buffered());

    let child_doc = f.repo.get_document(PROJECT, &child).unwrap().unwrap();
    assert_eq!(child_doc.get("tag"), Some(&json!("x")));
    assert!(child_doc.is_buffered());

    assert_eq!(
        f.repo.document_index(PROJECT).unwrap(),
        vec![root_path, child.clone()]
    );
    assert_eq!(
        f.repo.get_selected_document(PROJECT).unwrap(),
        Some(child)
    );
}

#[test]
fn create_document_with_empty_parent_is_root_level() {
    let f = fixture();
    let path = f.repo.create_document(PROJECT, Some(""), None).unwrap();
    assert!(!path.contains('.'));
}
