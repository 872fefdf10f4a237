use chrono::{TimeDelta, TimeZone, Utc};
use docket_core::{
    CoreContext, CoreHandle, Document, InitOutcome, ManualClock, MemoryRemoteStore,
    ProjectSynchronizer, SkipReason, SqliteLocalStore,
};
use serde_json::{json, Value};
use std::rc::Rc;

const PROJECT: &str = "p1";

struct Fixture {
    remote: Rc<MemoryRemoteStore>,
    clock: Rc<ManualClock>,
    handle: CoreHandle,
}

fn fixture() -> Fixture {
    let remote = Rc::new(MemoryRemoteStore::new());
    remote
        .seed(json!({
            "alice": {"document": {"p1": {
                "a": {"title": "remote a", "updatedAt": "2024-06-01T10:00:00.000Z"},
                "a.b": {"title": "remote a.b", "updatedAt": "2024-06-01T10:00:00.000Z"}
            }}},
            "bob": {"document": {"p1": {
                "x": {"title": "not alice's"}
            }}}
        }))
        .unwrap();
    let clock = Rc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    ));
    let ctx = CoreContext::new(
        "alice",
        Rc::new(SqliteLocalStore::open_in_memory().unwrap()),
        remote.clone(),
    )
    .with_clock(clock.clone());
    Fixture {
        remote,
        clock,
        handle: CoreHandle::new(ctx),
    }
}

fn doc(value: Value) -> Document {
    Document::from_value(value).unwrap()
}

#[test]
fn first_init_pulls_every_remote_document() {
    let f = fixture();

    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert_eq!(outcome, InitOutcome::Merged { applied: 2, kept: 0 });
    let all = f.handle.document().get_all_documents(PROJECT).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["a.b"].title(), Some("remote a.b"));
    assert!(!all.contains_key("x"));

    let sync = ProjectSynchronizer::new(f.handle.document());
    assert_eq!(
        sync.last_initialized_at(PROJECT).unwrap(),
        Some(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn newer_local_copy_and_unstamped_local_copy_are_kept() {
    let f = fixture();
    let repo = f.handle.document();
    repo.set_document(
        PROJECT,
        "a",
        Some(&doc(json!({"title": "local a", "updatedAt": "2024-06-01T11:00:00.000Z"}))),
    )
    .unwrap();
    repo.set_document(PROJECT, "a.b", Some(&doc(json!({"title": "local draft"}))))
        .unwrap();

    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert_eq!(outcome, InitOutcome::Merged { applied: 0, kept: 2 });
    assert_eq!(
        repo.get_document(PROJECT, "a").unwrap().unwrap().title(),
        Some("local a")
    );
    assert_eq!(
        repo.get_document(PROJECT, "a.b").unwrap().unwrap().title(),
        Some("local draft")
    );
}

#[test]
fn strictly_newer_remote_copy_replaces_local() {
    let f = fixture();
    let repo = f.handle.document();
    repo.set_document(
        PROJECT,
        "a",
        Some(&doc(json!({"title": "stale", "updatedAt": "2024-06-01T09:00:00.000Z"}))),
    )
    .unwrap();
    repo.set_document(
        PROJECT,
        "a.b",
        Some(&doc(json!({"title": "tie", "updatedAt": "2024-06-01T10:00:00.000Z"}))),
    )
    .unwrap();

    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert_eq!(outcome, InitOutcome::Merged { applied: 1, kept: 1 });
    assert_eq!(
        repo.get_document(PROJECT, "a").unwrap().unwrap().title(),
        Some("remote a")
    );
    assert_eq!(
        repo.get_document(PROJECT, "a.b").unwrap().unwrap().title(),
        Some("tie")
    );
}

#[test]
fn local_only_documents_survive_init() {
    let f = fixture();
    let repo = f.handle.document();
    let path = repo.create_document(PROJECT, None, None).unwrap();

    f.handle.project().init(PROJECT, false).unwrap();

    let all = repo.get_all_documents(PROJECT).unwrap();
    assert_eq!(all.len(), 3);
    assert!(all[&path].is_buffered());
    assert_eq!(repo.document_index(PROJECT).unwrap()[0], path);
}

#[test]
fn init_inside_staleness_window_skips_fetch() {
    let f = fixture();
    f.handle.project().init(PROJECT, false).unwrap();
    assert_eq!(f.remote.fetch_count(), 1);

    f.clock.advance(TimeDelta::hours(23));
    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert_eq!(
        outcome,
        InitOutcome::Skipped {
            reason: SkipReason::Fresh
        }
    );
    assert_eq!(f.remote.fetch_count(), 1);
}

#[test]
fn init_after_staleness_window_fetches_again() {
    let f = fixture();
    f.handle.project().init(PROJECT, false).unwrap();

    f.clock.advance(TimeDelta::hours(24));
    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert!(matches!(outcome, InitOutcome::Merged { .. }));
    assert_eq!(f.remote.fetch_count(), 2);
}

#[test]
fn forced_init_ignores_staleness_window() {
    let f = fixture();
    f.handle.project().init(PROJECT, false).unwrap();
    f.handle.project().init(PROJECT, true).unwrap();

    assert_eq!(f.remote.fetch_count(), 2);
}

#[test]
fn unavailable_remote_aborts_without_touching_marker() {
    let f = fixture();
    f.remote.set_available(false);

    let outcome = f.handle.project().init(PROJECT, false).unwrap();

    assert_eq!(outcome, InitOutcome::Aborted);
    assert_eq!(f.remote.fetch_count(), 1);
    let sync = ProjectSynchronizer::new(f.handle.document());
    assert_eq!(sync.last_initialized_at(PROJECT).unwrap(), None);
    assert!(f
        .handle
        .document()
        .get_all_documents(PROJECT)
        .unwrap()
        .is_empty());

    f.remote.set_available(true);
    let retried = f.handle.project().init(PROJECT, false).unwrap();
    assert_eq!(retried, InitOutcome::Merged { applied: 2, kept: 0 });
}

#[test]
fn project_without_remote_documents_still_records_marker() {
    let f = fixture();

    let outcome = f.handle.project().init("empty", false).unwrap();

    assert_eq!(outcome, InitOutcome::Merged { applied: 0, kept: 0 });
    let sync = ProjectSynchronizer::new(f.handle.document());
    assert!(sync.last_initialized_at("empty").unwrap().is_some());
}

#[test]
fn empty_project_id_is_skipped_without_fetch() {
    let f = fixture();

    let outcome = f.handle.project().init("", true).unwrap();

    assert_eq!(
        outcome,
        InitOutcome::Skipped {
            reason: SkipReason::MissingProject
        }
    );
    assert_eq!(f.remote.fetch_count(), 0);
}

#[test]
fn non_object_remote_entries_are_ignored() {
    let f = fixture();
    f.remote
        .seed(json!({"alice": {"document": {"p2": {"ok": {"title": "t"}, "bad": 42}}}}))
        .unwrap();

    let outcome = f.handle.project().init("p2", false).unwrap();

    assert_eq!(outcome, InitOutcome::Merged { applied: 1, kept: 0 });
    assert_eq!(
        f.handle.document().document_index("p2").unwrap(),
        vec!["ok"]
    );
}
