//! Pending-change store persistence tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use histofy::prelude::*;
use tempfile::TempDir;

fn change_for(dates: &[&str], level: ContributionLevel) -> PendingChange {
    let mut map = BTreeMap::new();
    for d in dates {
        map.insert(d.parse::<NaiveDate>().unwrap(), level);
    }
    PendingChange::date_selection(map, None)
}

#[test]
fn test_file_store_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("pending.json"));

    let change = change_for(&["2024-03-01", "2024-03-02"], ContributionLevel::Medium);
    let id = change.id.clone();
    store.add(change).unwrap();

    let pending = store.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, id);
    assert_eq!(pending[0].dates().unwrap().len(), 2);

    store.remove(&id).unwrap();
    assert!(store.list_pending().unwrap().is_empty());
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pending.json");

    {
        let store = JsonFileStore::new(&path);
        store
            .add(change_for(&["2024-01-15"], ContributionLevel::Low))
            .unwrap();
        store
            .add(change_for(&["2024-01-16"], ContributionLevel::High))
            .unwrap();
    }

    let reopened = JsonFileStore::new(&path);
    let pending = reopened.list_pending().unwrap();
    assert_eq!(pending.len(), 2);
}

#[test]
fn test_file_store_missing_file_is_empty_queue() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("never-written.json"));
    assert!(store.list_pending().unwrap().is_empty());
}

#[test]
fn test_file_store_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("nested/deeper/pending.json"));
    store
        .add(change_for(&["2024-06-01"], ContributionLevel::Low))
        .unwrap();
    assert_eq!(store.list_pending().unwrap().len(), 1);
}

#[test]
fn test_file_store_clear() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("pending.json"));
    store
        .add(change_for(&["2024-06-01"], ContributionLevel::Low))
        .unwrap();
    store.clear().unwrap();
    assert!(store.list_pending().unwrap().is_empty());
}

#[test]
fn test_note_changes_pass_through_untouched() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("pending.json"));

    let note = PendingChange {
        id: "note-1".into(),
        kind: ChangeKind::Note {
            text: "remember to check the graph".into(),
        },
        created_at: chrono::Utc::now(),
    };
    store.add(note).unwrap();

    let pending = store.list_pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert!(pending[0].dates().is_none());
}
