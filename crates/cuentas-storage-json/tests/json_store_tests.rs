use std::{fs, sync::Arc, thread};

use cuentas_core::{
    collection::{mutate_collection, Mutation},
    CoreError, Database, KeyValueStore, Session,
};
use cuentas_storage_json::JsonFileStore;
use tempfile::tempdir;

#[test]
fn values_survive_reopening() {
    let dir = tempdir().expect("tempdir");
    {
        let store = JsonFileStore::open(dir.path(), None).expect("open");
        assert_eq!(store.put("currentUser", r#"{"id":"1"}"#, None).expect("put"), 1);
        assert_eq!(store.put("currentUser", r#"{"id":"2"}"#, Some(1)).expect("put"), 2);
    }
    let store = JsonFileStore::open(dir.path(), None).expect("reopen");
    let stored = store.get("currentUser").expect("get").expect("present");
    assert_eq!(stored.value, r#"{"id":"2"}"#);
    assert_eq!(stored.version, 2);

    let raw = fs::read_to_string(store.entry_path("currentUser")).expect("envelope");
    let envelope: serde_json::Value = serde_json::from_str(&raw).expect("json");
    assert_eq!(envelope["version"], 2);
    assert!(envelope.get("updatedAt").is_some());
}

#[test]
fn stale_writes_conflict() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFileStore::open(dir.path(), None).expect("open");
    store.put("budgets", "[]", None).expect("put");
    let err = store.put("budgets", "[1]", Some(0)).unwrap_err();
    assert!(matches!(err, CoreError::Conflict { .. }));
    assert_eq!(store.get("budgets").expect("get").expect("present").value, "[]");
}

#[test]
fn scan_returns_original_keys() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFileStore::open(dir.path(), None).expect("open");
    for key in ["config_ana", "config_b.o", "transactions"] {
        store.put(key, "{}", None).expect("put");
    }
    assert_eq!(
        store.scan("config_").expect("scan"),
        vec!["config_ana".to_string(), "config_b.o".to_string()]
    );
    assert!(store.delete("config_ana").expect("delete"));
    assert!(!store.delete("config_ana").expect("delete again"));
}

#[test]
fn quota_rejects_oversized_writes() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFileStore::open(dir.path(), Some(64)).expect("open");
    store.put("a", &"x".repeat(40), None).expect("fits");
    let err = store.put("b", &"y".repeat(40), None).unwrap_err();
    assert!(err.is_quota_exceeded());
    assert!(store.get("b").expect("get").is_none());
    // Replacing an entry only counts the difference.
    store.put("a", &"z".repeat(60), None).expect("replacement fits");
    assert_eq!(store.usage().expect("usage").used_bytes, 61);
}

#[test]
fn concurrent_mutations_are_not_lost() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(JsonFileStore::open(dir.path(), None).expect("open"));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for step in 0..5 {
                    loop {
                        let result = mutate_collection(
                            store.as_ref(),
                            "people",
                            |items: &mut Vec<String>| {
                                items.push(format!("{worker}-{step}"));
                                Ok(Mutation::Commit(()))
                            },
                        );
                        match result {
                            Ok(()) => break,
                            Err(CoreError::Conflict { .. }) => continue,
                            Err(err) => panic!("unexpected error: {err}"),
                        }
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }
    let stored = store.get("people").expect("get").expect("present");
    let items: Vec<String> = serde_json::from_str(&stored.value).expect("json");
    assert_eq!(items.len(), 20);
    assert_eq!(stored.version, 20);
}

#[test]
fn backups_restore_the_whole_store() {
    let dir = tempdir().expect("tempdir");
    let store = Arc::new(JsonFileStore::open(dir.path(), None).expect("open"));
    let session = Session::new(Database::new(store.clone()));
    let ana = session.register_profile("ana", "personal").expect("register");

    let info = store.backup(Some("antes de limpiar")).expect("backup");
    assert!(info.id.starts_with("store_"));
    assert!(info.id.ends_with("_antes-de-limpiar.json"));
    assert!(info.created_at.is_some());

    let version_before = store.get("users").expect("get").expect("present").version;
    session.delete_profile(&ana.id).expect("delete");
    store.put("scratch", "1", None).expect("put");

    let restored = store.restore(&info.id).expect("restore");
    assert!(restored > 0);
    assert!(store.get("scratch").expect("get").is_none());
    let users = store.get("users").expect("get").expect("present");
    assert!(users.version > version_before);
    assert_eq!(session.profiles().expect("profiles").len(), 1);
    assert_eq!(session.current().expect("current").map(|p| p.id), Some(ana.id));
}

#[test]
fn backups_are_pruned_to_retention() {
    let dir = tempdir().expect("tempdir");
    let store = JsonFileStore::with_retention(dir.path(), None, 3).expect("open");
    store.put("transactions", "[]", None).expect("put");
    for index in 0..5 {
        store.backup(Some(&format!("paso {index}"))).expect("backup");
    }
    let backups = store.list_backups().expect("list");
    assert_eq!(backups.len(), 3);
    assert!(matches!(
        store.restore("store_19990101_0000.json"),
        Err(CoreError::NotFound { .. })
    ));
}
