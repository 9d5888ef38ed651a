use std::path::PathBuf;

use gearbook_core::catalog::{DEFAULT_IMAGE_BASE_URL, search_items};
use gearbook_core::dataset::{FileDatasetProvider, load_dataset};
use gearbook_core::store::view::EntryFilter;
use gearbook_core::{AppConfig, AppState, FixedClock, MemoryStorage, Rarity, SetItemConfig};
use gearbook_render::{
    entry_property_lines, item_list_json, preview_json, preview_lines, render_collection_json,
    render_collection_text, render_item_list, render_item_preview, render_sets, sets_json,
};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn app() -> AppState<MemoryStorage> {
    let dataset = load_dataset(&FileDatasetProvider::new(
        workspace_root().join("tests/fixtures/items.json"),
    ))
    .expect("fixture should load");
    AppState::new(
        AppConfig::default(),
        MemoryStorage::new(),
        "items",
        dataset,
        Box::new(FixedClock(7)),
    )
    .expect("app should build")
}

#[test]
fn item_list_hides_pets_and_labels_classes() {
    let app = app();
    let items = search_items(app.dataset(), "", false);
    let text = render_item_list(&items);
    assert!(text.contains("Kris"));
    assert!(text.contains("Weapon (Staffs)"));
    assert!(!text.contains("Horn of Fenrir"));

    let json = item_list_json(&items);
    let first = &json.as_array().expect("array")[0];
    let keys: Vec<&str> = first
        .as_object()
        .expect("object")
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["id", "index", "name", "slot", "slotName", "class"]);
}

#[test]
fn preview_lists_effect_luck_skill_and_excellent_lines() {
    let mut app = app();
    assert!(app.select_item("0-5"));
    let cfg = app.configurator_mut();
    cfg.set_options(2);
    cfg.set_luck(true);
    cfg.set_skill(true);
    cfg.toggle_excellent("Increases Attack Speed +").expect("pick");
    cfg.set_rarity("Increases Attack Speed +", Rarity::Epic);

    let item = app.selected_item().expect("selected");
    let lines = preview_lines(app.dataset(), item, app.configurator());
    assert_eq!(
        lines,
        vec![
            "Additional damage: +60".to_string(),
            "Luck (Success rate increase +25%)".to_string(),
            "Luck (Critical damage rate +5%)".to_string(),
            "Skill: Falling Slash".to_string(),
            "[EPIC] Increases Attack Speed + (40)".to_string(),
        ]
    );

    let text = render_item_preview(app.dataset(), item, app.configurator(), DEFAULT_IMAGE_BASE_URL);
    assert!(text.contains("image=https://dreamassets.fra1.cdn.digitaloceanspaces.com/items_seasons/6plus/0/5.webp"));
    assert!(text.contains("Damage: 36~47"));
    assert!(text.contains("Excellent options (1/4):"));

    let json = preview_json(app.dataset(), item, app.configurator(), DEFAULT_IMAGE_BASE_URL);
    assert_eq!(json["effect"]["magnitude"], 60);
    assert_eq!(json["excellentOptions"].as_array().map(Vec::len), Some(6));
}

#[test]
fn earring_recovery_is_shown_as_percent() {
    let mut app = app();
    assert!(app.select_item("13-27"));
    app.configurator_mut().set_options(4);
    let entry = app.add_to_collection().expect("save");
    assert_eq!(
        entry_property_lines(app.dataset(), &entry),
        vec!["Automatic HP recovery: +60%".to_string()]
    );
}

#[test]
fn collection_text_groups_sets_before_individual_items() {
    let mut app = app();
    app.add_set_to_collection(
        "Storm Crow Set",
        SetItemConfig {
            level: 9,
            options: 1,
            luck: false,
            skill: false,
        },
    )
    .expect("add set");
    app.select_item("0-0");
    app.add_to_collection().expect("save Kris");
    app.toggle_done(0).expect("toggle");

    let text = render_collection_text(&app, &EntryFilter::default());
    let set_pos = text.find("== Storm Crow Set 1/3 (33%)").expect("set header");
    let individual_pos = text.find("== Individual items").expect("individual header");
    assert!(set_pos < individual_pos);
    assert!(text.starts_with("My Collection (4 items, 25% done)"));
    assert!(text.contains("[x] #0 Storm Crow Helm +9"));
    assert!(text.contains("Additional defense: +15"));

    let json = render_collection_json(&app, &EntryFilter::new("kris", false));
    assert_eq!(json["completion"], 0);
    assert_eq!(json["sets"].as_array().map(Vec::len), Some(0));
    assert_eq!(json["individual"][0]["name"], "Kris");
    assert_eq!(json["individual"][0]["position"], 3);
}

#[test]
fn empty_search_explains_itself() {
    let app = app();
    let text = render_collection_text(&app, &EntryFilter::new("zzz", false));
    assert!(text.contains("No items found matching \"zzz\"."));
}

#[test]
fn sets_render_in_slot_order() {
    let app = app();
    let text = render_sets(app.sets());
    assert!(text.contains(
        "Storm Crow Set [3]: helm=Storm Crow Helm, body=Storm Crow Armor, pants=Storm Crow Pants"
    ));
    let json = sets_json(app.sets());
    assert_eq!(json["Bronze Set"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["Bronze Set"][4]["slotName"], "boots");
}
