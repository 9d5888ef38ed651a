use gearbook_core::{
    CollectionEntry, CollectionStore, CoreErrorCode, FixedClock, MemoryStorage, StorageKeys,
};
use serde_json::json;

fn entry(id: &str, name: &str) -> CollectionEntry {
    serde_json::from_value(json!({
        "id": id,
        "index": 1,
        "displayId": id,
        "name": name,
        "level": 7,
        "options": 2,
        "luck": true,
        "skill": false,
        "exeOptions": [{"text": "Reflect Damage %", "rarity": "epic"}],
        "done": false,
        "ts": 5
    }))
    .expect("valid entry")
}

fn open(storage: MemoryStorage, scope: &str) -> CollectionStore<MemoryStorage> {
    CollectionStore::open(
        storage,
        StorageKeys::new("gearbook", scope),
        Box::new(FixedClock(42)),
    )
    .expect("failed to open store")
}

#[test]
fn last_collection_cannot_be_deleted() {
    let mut store = open(MemoryStorage::new(), "s");
    let only = store.active_id().to_string();
    store.working_mut().push(entry("0-1", "Kris"));

    let err = store.delete(&only).expect_err("last collection");
    assert_eq!(err.code, CoreErrorCode::InvariantGuard);
    assert_eq!(store.collections().len(), 1);
    assert_eq!(store.active_id(), only);
    assert_eq!(store.working().len(), 1);
}

#[test]
fn switching_flushes_unsaved_edits() {
    let mut store = open(MemoryStorage::new(), "s");
    let first = store.active_id().to_string();
    let second = store.create("Second", "").expect("create");

    store.working_mut().push(entry("0-1", "Kris"));
    assert!(store.switch(&second).expect("switch away"));
    assert!(store.working().is_empty());
    assert!(store.switch(&first).expect("switch back"));
    assert_eq!(store.working().len(), 1);
    assert_eq!(store.working()[0].id, "0-1");
}

#[test]
fn working_buffer_is_a_copy() {
    let mut store = open(MemoryStorage::new(), "s");
    store.working_mut().push(entry("0-1", "Kris"));
    store.flush().expect("flush");
    store.working_mut()[0].level = 15;
    assert_eq!(store.active().items[0].level, 7);
}

#[test]
fn export_then_import_preserves_items() {
    let mut store = open(MemoryStorage::new(), "s");
    let original = store.active_id().to_string();
    store
        .rename(&original, "Wishlist", "things to farm")
        .expect("rename");
    store.working_mut().push(entry("0-1", "Kris"));
    store.working_mut().push(entry("7-2", "Storm Crow Helm"));

    let json = store
        .export_json(&original)
        .expect("export")
        .expect("known id");
    let outcome = store.import(&json).expect("import");

    assert_ne!(outcome.id, original);
    assert_eq!(outcome.dropped, 0);
    let imported = store.get(&outcome.id).expect("imported collection");
    let source = store.get(&original).expect("original collection");
    assert_eq!(imported.items, source.items);
    assert_eq!(imported.name, "Wishlist");
    assert_eq!(imported.description, "things to farm");
}

#[test]
fn export_envelope_has_version_and_timestamp() {
    let mut store = open(MemoryStorage::new(), "s");
    let id = store.active_id().to_string();
    let envelope = store.export(&id).expect("export").expect("known id");
    let value = serde_json::to_value(&envelope).expect("encode");
    assert_eq!(value["version"], json!("1.0"));
    assert_eq!(value["exportedAt"], json!(42));
    assert!(value["items"].is_array());
}

#[test]
fn malformed_imports_change_nothing() {
    let mut store = open(MemoryStorage::new(), "s");
    for doc in [
        "not json",
        r#"{"items": []}"#,
        r#"{"name": "  ", "items": []}"#,
        r#"{"name": "x", "items": {}}"#,
        r#"[1, 2]"#,
    ] {
        let err = store.import(doc).expect_err(doc);
        assert_eq!(err.code, CoreErrorCode::Validation);
    }
    assert_eq!(store.collections().len(), 1);
}

#[test]
fn import_accepts_legacy_entries() {
    let mut store = open(MemoryStorage::new(), "s");
    let outcome = store
        .import(
            r#"{"name": "Old", "items": [
                {"id": "0-1", "name": "Kris", "optionLevel": 3, "exeLines": ["Reflect Damage %"]},
                42
            ]}"#,
        )
        .expect("import");
    assert_eq!(outcome.imported, 1);
    assert_eq!(outcome.dropped, 1);
    let items = &store.get(&outcome.id).expect("collection").items;
    assert_eq!(items[0].options, 3);
    assert_eq!(items[0].exe_options[0].text, "Reflect Damage %");
}

#[test]
fn cross_check_skips_the_active_collection() {
    let mut store = open(MemoryStorage::new(), "s");
    let has_it = store.create("Has it", "").expect("create");
    let lacks_it = store.create("Lacks it", "").expect("create");
    assert!(store.add_entry_to(&has_it, entry("0-1", "Kris")).expect("add"));
    store.working_mut().push(entry("0-1", "Kris"));

    let checks = store.cross_check("0-1");
    assert_eq!(checks.len(), 2);
    let fit = |id: &str| {
        checks
            .iter()
            .find(|c| c.collection_id == id)
            .map(|c| c.would_fit)
    };
    assert_eq!(fit(&has_it), Some(false));
    assert_eq!(fit(&lacks_it), Some(true));
    assert!(store.get(&has_it).expect("has it").items.len() == 1);
    assert!(store.working().len() == 1);
}

#[test]
fn scopes_keep_separate_collections() {
    let mut store = open(MemoryStorage::new(), "season-6");
    store.working_mut().push(entry("0-1", "Kris"));
    store.create("S6 extra", "").expect("create");

    store
        .switch_scope(StorageKeys::new("gearbook", "season-7"))
        .expect("switch scope");
    assert_eq!(store.collections().len(), 1);
    assert!(store.working().is_empty());

    store
        .switch_scope(StorageKeys::new("gearbook", "season-6"))
        .expect("switch back");
    assert_eq!(store.collections().len(), 2);
    assert_eq!(store.working().len(), 1);
}

#[test]
fn corrupt_storage_falls_back_to_a_default_collection() {
    use gearbook_core::Storage as _;

    let keys = StorageKeys::new("gearbook", "s");
    let mut storage = MemoryStorage::new();
    storage.set(&keys.index(), "{{{").expect("set");
    let store = open(storage, "s");
    assert_eq!(store.collections().len(), 1);
    assert_eq!(store.active().name, "My Collection");
}
