use std::fmt::Write as _;

use gearbook_core::catalog::{
    additional_options, gear_stats, image_url, option_group, option_name, skill_name, slot_name,
};
use gearbook_core::store::view::{EntryFilter, completion_percent};
use gearbook_core::{
    AppState, CatalogItem, Collection, CollectionEntry, Configurator, CrossCheck, Dataset,
    EquipmentSet, ItemClass, ItemClassConfig, SetMap, Storage, StoredRarity,
};
use serde_json::{Map as JsonMap, Value as JsonValue};

const ID_COL_WIDTH: usize = 10;
const NAME_COL_WIDTH: usize = 30;
const SLOT_COL_WIDTH: usize = 12;

fn percent_suffix(text: &str) -> &'static str {
    if text.contains('%') { "%" } else { "" }
}

fn luck_lines(config: Option<&ItemClassConfig>) -> Vec<String> {
    let texts = config.map_or(
        ["Success rate increase +25%", "Critical damage rate +5%"],
        |c| c.luck_on,
    );
    texts.iter().map(|t| format!("Luck ({t})")).collect()
}

fn excellent_line(config: Option<&ItemClassConfig>, text: &str, rarity: StoredRarity) -> String {
    let def = config.and_then(|c| c.excellent_option(text));
    match def.and_then(|d| d.value_for(Some(rarity)).map(|v| (d, v))) {
        Some((def, value)) if def.values.is_single() => {
            format!("{text} {value}{}", percent_suffix(text))
        }
        Some((_, value)) => format!(
            "[{}] {text} ({value}{})",
            rarity.as_str().to_uppercase(),
            percent_suffix(text)
        ),
        None => text.to_string(),
    }
}

pub fn render_item_list(items: &[&CatalogItem]) -> String {
    let mut out = String::new();
    for item in items {
        writeln!(
            &mut out,
            "{:<id_w$} {:<name_w$} {:<slot_w$} {}",
            item.id,
            item.name,
            slot_name(item.slot),
            ItemClass::of(item),
            id_w = ID_COL_WIDTH,
            name_w = NAME_COL_WIDTH,
            slot_w = SLOT_COL_WIDTH,
        )
        .expect("writing to String cannot fail");
    }
    out
}

pub fn item_list_json(items: &[&CatalogItem]) -> JsonValue {
    JsonValue::Array(
        items
            .iter()
            .map(|item| {
                let mut obj = JsonMap::new();
                obj.insert("id".to_string(), JsonValue::String(item.id.clone()));
                obj.insert("index".to_string(), JsonValue::from(item.index));
                obj.insert("name".to_string(), JsonValue::String(item.name.clone()));
                obj.insert(
                    "slot".to_string(),
                    item.slot.map_or(JsonValue::Null, |s| JsonValue::from(s.raw())),
                );
                obj.insert("slotName".to_string(), JsonValue::String(slot_name(item.slot)));
                obj.insert(
                    "class".to_string(),
                    JsonValue::String(ItemClass::of(item).label()),
                );
                JsonValue::Object(obj)
            })
            .collect(),
    )
}

/// The derived lines for the configurator's current selection.
pub fn preview_lines(dataset: &Dataset, item: &CatalogItem, cfg: &Configurator) -> Vec<String> {
    let config = cfg.class_config();
    let mut lines = Vec::new();

    if let Some(effect) = cfg.compute_options_effect()
        && effect.magnitude > 0
    {
        lines.push(format!("{}: +{}{}", effect.label, effect.magnitude, effect.unit));
    }
    if cfg.luck() {
        lines.extend(luck_lines(config));
    }
    if cfg.skill() && config.is_some_and(|c| c.skill) {
        lines.push(format!("Skill: {}", skill_name(dataset, item)));
    }
    for state in cfg.option_states().iter().filter(|s| s.selected) {
        lines.push(excellent_line(config, state.name, state.rarity));
    }
    lines
}

pub fn render_item_preview(
    dataset: &Dataset,
    item: &CatalogItem,
    cfg: &Configurator,
    image_base: &str,
) -> String {
    let mut out = String::new();
    let class = ItemClass::of(item);
    writeln!(&mut out, "{} +{}", item.name, cfg.level()).expect("writing to String cannot fail");
    writeln!(&mut out, "id={}", item.id).expect("writing to String cannot fail");
    writeln!(&mut out, "class={class}").expect("writing to String cannot fail");
    writeln!(&mut out, "slot={}", slot_name(item.slot)).expect("writing to String cannot fail");
    if let Some(url) = image_url(image_base, item.display_id.as_deref()) {
        writeln!(&mut out, "image={url}").expect("writing to String cannot fail");
    }
    if let Some(stats) = gear_stats(item) {
        out.push('\n');
        for line in stats {
            writeln!(&mut out, "  {line}").expect("writing to String cannot fail");
        }
    }

    let extras = additional_options(dataset, option_group(item), cfg.level());
    if !extras.is_empty() {
        out.push('\n');
        for extra in extras {
            writeln!(&mut out, "  {} +{}", option_name(extra.id), extra.value)
                .expect("writing to String cannot fail");
        }
    }

    let lines = preview_lines(dataset, item, cfg);
    if !lines.is_empty() {
        out.push('\n');
        for line in lines {
            writeln!(&mut out, "  {line}").expect("writing to String cannot fail");
        }
    }

    if let Some(config) = class.config()
        && !config.excellent.is_empty()
    {
        writeln!(
            &mut out,
            "\nExcellent options ({}/{}):",
            cfg.selected_excellent().len(),
            cfg.max_excellent()
        )
        .expect("writing to String cannot fail");
        for state in cfg.option_states() {
            let mark = if state.selected {
                "[x]"
            } else if state.selectable {
                "[ ]"
            } else {
                "[-]"
            };
            let value = state.value.map(|v| v.to_string()).unwrap_or_default();
            writeln!(&mut out, "  {mark} {} = {value} ({})", state.name, state.rarity)
                .expect("writing to String cannot fail");
        }
    }
    out
}

pub fn preview_json(dataset: &Dataset, item: &CatalogItem, cfg: &Configurator, image_base: &str) -> JsonValue {
    let mut obj = JsonMap::new();
    obj.insert("id".to_string(), JsonValue::String(item.id.clone()));
    obj.insert("name".to_string(), JsonValue::String(item.name.clone()));
    obj.insert(
        "class".to_string(),
        JsonValue::String(ItemClass::of(item).label()),
    );
    obj.insert("slotName".to_string(), JsonValue::String(slot_name(item.slot)));
    obj.insert(
        "image".to_string(),
        image_url(image_base, item.display_id.as_deref()).map_or(JsonValue::Null, JsonValue::String),
    );
    obj.insert("level".to_string(), JsonValue::from(cfg.level()));
    obj.insert("options".to_string(), JsonValue::from(cfg.options()));
    obj.insert("luck".to_string(), JsonValue::Bool(cfg.luck()));
    obj.insert("skill".to_string(), JsonValue::Bool(cfg.skill()));
    obj.insert(
        "effect".to_string(),
        serde_json::to_value(cfg.compute_options_effect()).unwrap_or(JsonValue::Null),
    );
    obj.insert(
        "excellentOptions".to_string(),
        serde_json::to_value(cfg.option_states()).unwrap_or(JsonValue::Null),
    );
    obj.insert(
        "lines".to_string(),
        JsonValue::from(preview_lines(dataset, item, cfg)),
    );
    obj.insert(
        "stats".to_string(),
        gear_stats(item).map_or(JsonValue::Null, JsonValue::from),
    );
    JsonValue::Object(obj)
}

/// Property lines for a saved entry, using the catalog item when present.
pub fn entry_property_lines(dataset: &Dataset, entry: &CollectionEntry) -> Vec<String> {
    let item = dataset.item(&entry.id);
    let config = item.and_then(|i| ItemClass::of(i).config());
    let mut lines = Vec::new();

    if entry.options > 0 {
        match config {
            Some(config) => {
                let kind = config.options.kind;
                let value = u32::from(entry.options) * config.options.per_level;
                lines.push(format!("{}: +{value}{}", kind.label(), kind.unit()));
            }
            None => lines.push(format!("Options: {}", entry.options)),
        }
    }
    if entry.luck {
        lines.extend(luck_lines(config));
    }
    if entry.skill {
        let name = item.map_or_else(|| "None".to_string(), |i| skill_name(dataset, i));
        lines.push(format!("Skill: {name}"));
    }
    for record in &entry.exe_options {
        lines.push(excellent_line(config, &record.text, record.rarity));
    }
    lines
}

fn entry_line(out: &mut String, dataset: &Dataset, idx: usize, entry: &CollectionEntry, indent: &str) {
    let mark = if entry.done { "[x]" } else { "[ ]" };
    writeln!(out, "{indent}{mark} #{idx} {} +{}", entry.name, entry.level)
        .expect("writing to String cannot fail");
    for line in entry_property_lines(dataset, entry) {
        writeln!(out, "{indent}      {line}").expect("writing to String cannot fail");
    }
}

pub fn render_collection_text<S: Storage>(app: &AppState<S>, filter: &EntryFilter) -> String {
    let store = app.store();
    let entries = store.working();
    let mut out = String::new();
    writeln!(
        &mut out,
        "{} ({} items, {}% done)",
        store.active().name,
        entries.len(),
        completion_percent(entries, filter)
    )
    .expect("writing to String cannot fail");
    if !store.active().description.is_empty() {
        writeln!(&mut out, "{}", store.active().description)
            .expect("writing to String cannot fail");
    }

    let grouped = app.grouped_entries(filter);
    if grouped.sets.is_empty() && grouped.individual.is_empty() {
        let message = if filter.is_searching() {
            format!("No items found matching \"{}\".", filter.query)
        } else if filter.hide_completed {
            "All items are completed or no items in collection.".to_string()
        } else {
            "Your collection is empty.".to_string()
        };
        writeln!(&mut out, "{message}").expect("writing to String cannot fail");
        return out;
    }

    for group in &grouped.sets {
        writeln!(
            &mut out,
            "\n== {} {}/{} ({}%)",
            group.name, group.done, group.total, group.percent
        )
        .expect("writing to String cannot fail");
        for &(idx, entry) in &group.entries {
            entry_line(&mut out, app.dataset(), idx, entry, "  ");
        }
    }
    if !grouped.individual.is_empty() {
        if !grouped.sets.is_empty() {
            writeln!(&mut out, "\n== Individual items").expect("writing to String cannot fail");
        }
        for &(idx, entry) in &grouped.individual {
            entry_line(&mut out, app.dataset(), idx, entry, "  ");
        }
    }
    out
}

pub fn render_collection_json<S: Storage>(app: &AppState<S>, filter: &EntryFilter) -> JsonValue {
    let store = app.store();
    let entry_json = |idx: usize, entry: &CollectionEntry| {
        let mut value = serde_json::to_value(entry).unwrap_or(JsonValue::Null);
        if let Some(obj) = value.as_object_mut() {
            obj.insert("position".to_string(), JsonValue::from(idx));
            obj.insert(
                "lines".to_string(),
                JsonValue::from(entry_property_lines(app.dataset(), entry)),
            );
        }
        value
    };

    let grouped = app.grouped_entries(filter);
    let sets: Vec<JsonValue> = grouped
        .sets
        .iter()
        .map(|group| {
            let mut obj = JsonMap::new();
            obj.insert("name".to_string(), JsonValue::String(group.name.clone()));
            obj.insert("done".to_string(), JsonValue::from(group.done));
            obj.insert("total".to_string(), JsonValue::from(group.total));
            obj.insert("percent".to_string(), JsonValue::from(group.percent));
            obj.insert(
                "entries".to_string(),
                JsonValue::Array(group.entries.iter().map(|&(i, e)| entry_json(i, e)).collect()),
            );
            JsonValue::Object(obj)
        })
        .collect();

    let mut out = JsonMap::new();
    out.insert("id".to_string(), JsonValue::String(store.active_id().to_string()));
    out.insert("name".to_string(), JsonValue::String(store.active().name.clone()));
    out.insert(
        "description".to_string(),
        JsonValue::String(store.active().description.clone()),
    );
    out.insert("count".to_string(), JsonValue::from(store.working().len()));
    out.insert(
        "completion".to_string(),
        JsonValue::from(completion_percent(store.working(), filter)),
    );
    out.insert("sets".to_string(), JsonValue::Array(sets));
    out.insert(
        "individual".to_string(),
        JsonValue::Array(
            grouped
                .individual
                .iter()
                .map(|&(i, e)| entry_json(i, e))
                .collect(),
        ),
    );
    JsonValue::Object(out)
}

pub fn render_collections_list(collections: &[Collection], active_id: &str) -> String {
    let mut out = String::new();
    for collection in collections {
        let marker = if collection.id == active_id { "*" } else { " " };
        writeln!(
            &mut out,
            "{marker} {} {} ({} items)",
            collection.id,
            collection.name,
            collection.items.len()
        )
        .expect("writing to String cannot fail");
    }
    out
}

pub fn collections_list_json(collections: &[Collection], active_id: &str) -> JsonValue {
    JsonValue::Array(
        collections
            .iter()
            .map(|c| {
                let mut obj = JsonMap::new();
                obj.insert("id".to_string(), JsonValue::String(c.id.clone()));
                obj.insert("name".to_string(), JsonValue::String(c.name.clone()));
                obj.insert(
                    "description".to_string(),
                    JsonValue::String(c.description.clone()),
                );
                obj.insert("items".to_string(), JsonValue::from(c.items.len()));
                obj.insert("active".to_string(), JsonValue::Bool(c.id == active_id));
                obj.insert("createdAt".to_string(), JsonValue::from(c.created_at));
                obj.insert("updatedAt".to_string(), JsonValue::from(c.updated_at));
                JsonValue::Object(obj)
            })
            .collect(),
    )
}

pub fn render_cross_check(checks: &[CrossCheck]) -> String {
    if checks.is_empty() {
        return "No other collections.\n".to_string();
    }
    let mut out = String::new();
    for check in checks {
        let mark = if check.would_fit { "+" } else { "-" };
        writeln!(
            &mut out,
            "{mark} {} {}: {}",
            check.collection_id, check.collection_name, check.reason
        )
        .expect("writing to String cannot fail");
    }
    out
}

fn set_members_text(set: &EquipmentSet) -> String {
    set.items
        .iter()
        .map(|m| format!("{}={}", m.slot.name(), m.name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn render_sets(sets: &SetMap) -> String {
    let mut out = String::new();
    for set in sets.values() {
        writeln!(&mut out, "{} [{}]: {}", set.name, set.items.len(), set_members_text(set))
            .expect("writing to String cannot fail");
    }
    out
}

pub fn sets_json(sets: &SetMap) -> JsonValue {
    let mut out = JsonMap::new();
    for (name, set) in sets {
        let members = set
            .items
            .iter()
            .map(|m| {
                let mut obj = JsonMap::new();
                obj.insert("name".to_string(), JsonValue::String(m.name.clone()));
                obj.insert("slot".to_string(), JsonValue::from(m.slot.raw()));
                obj.insert("slotName".to_string(), JsonValue::String(m.slot.name()));
                JsonValue::Object(obj)
            })
            .collect();
        out.insert(name.clone(), JsonValue::Array(members));
    }
    JsonValue::Object(out)
}

#[cfg(test)]
mod tests {
    use gearbook_core::class_config::{ARMOR_AND_RINGS, WINGS};
    use gearbook_core::{Rarity, StoredRarity};

    use super::excellent_line;

    #[test]
    fn tiered_lines_carry_rarity_and_percent() {
        assert_eq!(
            excellent_line(
                Some(&ARMOR_AND_RINGS),
                "Increase Zen Drop Rate %",
                StoredRarity::Tier(Rarity::Rare)
            ),
            "[RARE] Increase Zen Drop Rate % (15%)"
        );
    }

    #[test]
    fn single_lines_show_fixed_value() {
        assert_eq!(
            excellent_line(Some(&WINGS), "Increases attack speed 50", StoredRarity::Single),
            "Increases attack speed 50 50"
        );
        assert_eq!(
            excellent_line(None, "Mystery", StoredRarity::Single),
            "Mystery"
        );
    }
}
