use std::fs;
use std::io::Write as _;
use std::path::PathBuf;

use flate2::Compression;
use flate2::write::GzEncoder;
use gearbook_core::dataset::{DatasetSource, FileDatasetProvider, load_dataset};
use gearbook_core::{AppConfig, AppState, FixedClock, ItemClass, MemoryStorage, Slot};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn fixture_path() -> PathBuf {
    workspace_root().join("tests/fixtures/items.json")
}

#[test]
fn fixture_loads_with_skip_count() {
    let dataset = load_dataset(&FileDatasetProvider::new(fixture_path()))
        .expect("failed to load fixture dataset");

    assert_eq!(dataset.len(), 16);
    assert_eq!(dataset.stats.skipped, 1);
    assert!(!dataset.stats.used_flat_fallback);
    assert!(dataset.items.windows(2).all(|w| w[0].index <= w[1].index));

    let kris = dataset.item("0-0").expect("Kris should be present");
    assert_eq!(kris.display_id.as_deref(), Some("0-0"));
    assert_eq!(kris.slot, Some(Slot::Weapon));
    assert_eq!(ItemClass::of(kris), ItemClass::WeaponNonStaff);

    let staff = dataset.item("5-9").expect("staff should be present");
    assert_eq!(ItemClass::of(staff), ItemClass::WeaponStaff);
}

#[test]
fn gzip_file_loads_the_same_catalog() {
    let json = fs::read(fixture_path()).expect("failed to read fixture");
    let dir = tempfile::tempdir().expect("failed to create tempdir");
    let gz_path = dir.path().join("items.json.gz");
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json).expect("gzip write");
    fs::write(&gz_path, encoder.finish().expect("gzip finish")).expect("write gz");

    let plain = load_dataset(&FileDatasetProvider::new(fixture_path())).expect("plain load");
    let packed = load_dataset(&FileDatasetProvider::new(&gz_path)).expect("gzip load");
    assert_eq!(plain.len(), packed.len());
    assert!(plain.items.iter().all(|item| packed.item(&item.id).is_some()));
}

#[test]
fn missing_file_is_a_load_failure() {
    let err = load_dataset(&FileDatasetProvider::new(workspace_root().join("tests/fixtures/nope.json")))
        .expect_err("missing dataset should fail");
    assert_eq!(err.code, gearbook_core::CoreErrorCode::Io);
}

#[test]
fn app_load_derives_sets_and_caches_per_scope() {
    let provider = FileDatasetProvider::new(fixture_path());
    let (app, source) = AppState::load(
        AppConfig::default(),
        MemoryStorage::new(),
        "items",
        &provider,
        false,
        Box::new(FixedClock(1)),
    )
    .expect("app load");
    assert_eq!(source, DatasetSource::Fresh);
    assert_eq!(
        app.sets().keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["Bronze Set", "Storm Crow Set"]
    );
    assert_eq!(app.sets()["Bronze Set"].items.len(), 5);

    let storage = app.shutdown().expect("shutdown");
    let (_, source) = AppState::load(
        AppConfig::default(),
        storage,
        "items",
        &provider,
        false,
        Box::new(FixedClock(2)),
    )
    .expect("second load");
    assert_eq!(source, DatasetSource::Cached);
}
