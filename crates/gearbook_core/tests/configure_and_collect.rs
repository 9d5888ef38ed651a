use std::path::PathBuf;

use gearbook_core::dataset::{FileDatasetProvider, load_dataset};
use gearbook_core::{
    AppConfig, AppState, CoreErrorCode, FixedClock, MemoryStorage, Rarity, SetItemConfig,
    StoredRarity,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn app() -> AppState<MemoryStorage> {
    let dataset = load_dataset(&FileDatasetProvider::new(
        workspace_root().join("tests/fixtures/items.json"),
    ))
    .expect("failed to load fixture dataset");
    AppState::new(
        AppConfig::default(),
        MemoryStorage::new(),
        "items",
        dataset,
        Box::new(FixedClock(1_700_000_000_000)),
    )
    .expect("failed to build app state")
}

#[test]
fn kris_end_to_end() {
    let mut app = app();
    assert!(app.select_item("0-0"));
    app.configurator_mut().set_options(3);

    let effect = app
        .configurator()
        .compute_options_effect()
        .expect("Kris is configurable");
    assert_eq!(effect.magnitude, 90);
    assert_eq!(effect.label, "Additional damage");

    let entry = app.add_to_collection().expect("save Kris");
    assert_eq!(entry.options, 3);
    assert_eq!(app.store().working().len(), 1);

    app.configurator_mut().reset();
    assert!(app.edit_into_configurator(0));
    assert_eq!(app.configurator().options(), 3);
    assert_eq!(app.configurator().item_id(), Some("0-0"));
}

#[test]
fn saving_without_selection_is_a_validation_error() {
    let mut app = app();
    let err = app.add_to_collection().expect_err("nothing selected");
    assert_eq!(err.code, CoreErrorCode::Validation);
    assert_eq!(err.message, "Select an item first.");
    assert!(app.store().working().is_empty());
}

#[test]
fn saving_twice_replaces_the_entry() {
    let mut app = app();
    app.select_item("6-1");
    app.add_to_collection().expect("first save");
    app.configurator_mut().set_level(11);
    app.add_to_collection().expect("second save");
    assert_eq!(app.store().working().len(), 1);
    assert_eq!(app.store().working()[0].level, 11);
}

#[test]
fn tier_round_trips_through_storage() {
    let mut app = app();
    app.select_item("7-2");
    let cfg = app.configurator_mut();
    cfg.toggle_excellent("Reflect Damage %").expect("pick");
    cfg.set_rarity("Reflect Damage %", Rarity::Rare);
    let expected = cfg.resolve_excellent_value("Reflect Damage %");
    app.add_to_collection().expect("save");

    let storage = app.shutdown().expect("shutdown");
    let dataset = load_dataset(&FileDatasetProvider::new(
        workspace_root().join("tests/fixtures/items.json"),
    ))
    .expect("reload dataset");
    let mut reopened = AppState::new(
        AppConfig::default(),
        storage,
        "items",
        dataset,
        Box::new(FixedClock(1)),
    )
    .expect("reopen");

    assert_eq!(
        reopened.store().working()[0].exe_options[0].rarity,
        StoredRarity::Tier(Rarity::Rare)
    );
    assert!(reopened.edit_into_configurator(0));
    assert_eq!(
        reopened.configurator().resolve_excellent_value("Reflect Damage %"),
        expected
    );
    assert_eq!(expected, Some(3));
}

#[test]
fn wings_store_single_and_resolve_fixed_values() {
    let mut app = app();
    app.select_item("12-36");
    let cfg = app.configurator_mut();
    cfg.set_rarity("Increases double damage rate 3%", Rarity::Epic);
    cfg.toggle_excellent("Increases double damage rate 3%").expect("pick");
    let entry = app.add_to_collection().expect("save wings");
    assert_eq!(entry.exe_options[0].rarity, StoredRarity::Single);

    assert!(app.edit_into_configurator(0));
    assert_eq!(
        app.configurator()
            .resolve_excellent_value("Increases double damage rate 3%"),
        Some(3)
    );
}

#[test]
fn set_entries_take_luck_from_luck_flag() {
    for (luck, skill) in [(true, false), (false, true)] {
        let mut app = app();
        let added = app
            .add_set_to_collection(
                "Storm Crow Set",
                SetItemConfig {
                    level: 9,
                    options: 2,
                    luck,
                    skill,
                },
            )
            .expect("add set")
            .expect("known set");
        assert_eq!(added, 3);
        for entry in app.store().working() {
            assert_eq!(entry.luck, luck);
            assert_eq!(entry.set.as_deref(), Some("Storm Crow Set"));
            assert!(entry.exe_options.is_empty());
            assert_eq!(entry.level, 9);
        }
    }
}

#[test]
fn unknown_set_and_indexes_are_no_ops() {
    let mut app = app();
    assert_eq!(
        app.add_set_to_collection("Nope Set", SetItemConfig::default())
            .expect("no error"),
        None
    );
    assert!(!app.edit_into_configurator(3));
    assert_eq!(app.remove_entry(3).expect("no error"), None);
    assert_eq!(app.toggle_done(3).expect("no error"), None);
}

#[test]
fn done_remove_and_wipe_flush_each_time() {
    let mut app = app();
    for id in ["0-0", "0-5", "6-1"] {
        app.select_item(id);
        app.add_to_collection().expect("save");
    }
    assert_eq!(app.toggle_done(1).expect("toggle"), Some(true));
    assert!(app.store().active().items[1].done);

    let removed = app.remove_entry(0).expect("remove").expect("entry");
    assert_eq!(removed.id, "0-0");
    assert_eq!(app.store().active().items.len(), 2);

    assert_eq!(app.wipe().expect("wipe"), 2);
    assert!(app.store().active().items.is_empty());
}
