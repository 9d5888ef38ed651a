//! Display lookups over the catalog and its side tables.

use serde::Serialize;
use serde_json::Value;

use crate::classify::{is_allowed, is_armor};
use crate::dataset::{CatalogItem, Dataset, plain_string, value_as_i64};
use crate::slot::Slot;

pub const DEFAULT_IMAGE_BASE_URL: &str =
    "https://dreamassets.fra1.cdn.digitaloceanspaces.com/items_seasons/6plus";

#[rustfmt::skip]
const GEAR_STAT_FIELDS: &[(&str, &str)] = &[
    ("Damage",            "Damage"),
    ("Defense",           "Defense"),
    ("AttackSpeed",       "Attack Speed"),
    ("SuccessRate",       "Success Rate"),
    ("RequireLevel",      "Level"),
    ("RequireStrength",   "Strength"),
    ("RequireDexterity",  "Dexterity"),
    ("RequireEnergy",     "Energy"),
    ("RequireVitality",   "Vitality"),
    ("RequireLeadership", "Leadership"),
    ("Durability",        "Durability"),
    ("Excellent",         "Excellent"),
    ("Skill",             "Skill"),
    ("Luck",              "Luck"),
    ("Option",            "Option"),
    ("Ancient",           "Ancient"),
    ("Socket",            "Socket"),
    ("Pentagram",         "Pentagram"),
    ("Element",           "Element"),
    ("ElementLevel",      "Element Level"),
];

#[rustfmt::skip]
const OPTION_NAMES: &[&str] = &[
    "Max HP", "Max MP", "Max AG", "Max SD",
    "HP Recovery", "MP Recovery", "AG Recovery", "SD Recovery",
    "Attack Power", "Defense", "Attack Speed", "Attack Success Rate",
    "Defense Success Rate", "Critical Damage", "Excellent Damage", "Skill Attack",
    "Skill Defense", "Ignore Defense", "Double Damage", "Triple Damage",
    "Wizardry", "Excellent Rate", "Critical Rate", "Skill Rate",
    "HP Absorb", "MP Absorb", "SD Absorb", "AG Absorb",
    "Reflect", "Block", "Dodge", "Resistance",
    "Elemental Damage", "Elemental Defense", "Elemental Resistance", "Elemental Absorb",
    "Elemental Reflect", "Elemental Block", "Elemental Dodge", "Elemental Critical",
    "Elemental Excellent",
];

pub fn slot_name(slot: Option<Slot>) -> String {
    match slot {
        Some(slot) => slot.name(),
        None => "slot ?".to_string(),
    }
}

/// `<base>/<category>/<index>.webp` for a well-formed display id.
pub fn image_url(base: &str, display_id: Option<&str>) -> Option<String> {
    let display_id = display_id?;
    let parts: Vec<&str> = display_id.split('-').collect();
    match parts.as_slice() {
        [category, index] => Some(format!(
            "{}/{category}/{index}.webp",
            base.trim_end_matches('/')
        )),
        _ => None,
    }
}

pub fn gear_stats(item: &CatalogItem) -> Option<Vec<String>> {
    let stats: Vec<String> = GEAR_STAT_FIELDS
        .iter()
        .filter_map(|(key, label)| {
            item.attribute(key)
                .filter(|v| !v.is_null())
                .map(|v| format!("{label}: {}", plain_string(v)))
        })
        .collect();
    (!stats.is_empty()).then_some(stats)
}

pub fn skill_name(dataset: &Dataset, item: &CatalogItem) -> String {
    let skill = match item.attribute("Skill") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return "None".to_string(),
        Some(value) => plain_string(value),
    };
    if skill.is_empty() || skill == "0" {
        return "None".to_string();
    }
    dataset
        .skills
        .get(&skill)
        .and_then(|entry| entry.get("text"))
        .map(plain_string)
        .unwrap_or_else(|| format!("Skill {skill}"))
}

/// Excellent-option table category for an item: by slot when the table has
/// that category, otherwise by keywords in the name.
pub fn exe_category_for(item: &CatalogItem, dataset: &Dataset) -> Option<String> {
    let by_slot = match item.slot? {
        Slot::Weapon => Some("1"),
        Slot::Shield => Some("2"),
        Slot::Helm => Some("3"),
        Slot::Body => Some("4"),
        Slot::Pants => Some("5"),
        Slot::Gloves => Some("6"),
        Slot::Boots => Some("7"),
        Slot::Wings => Some("8"),
        Slot::Pet => Some("9"),
        Slot::RingLeft | Slot::RingRight => Some("10"),
        Slot::EarringLeft | Slot::EarringRight => Some("11"),
        Slot::Common | Slot::Unknown(_) => None,
    };
    if let Some(category) = by_slot
        && dataset.exe_by_category.contains_key(category)
    {
        return Some(category.to_string());
    }

    let name = item.name.to_lowercase();
    let has_any = |words: &[&str]| words.iter().any(|w| name.contains(w));
    let category = if name.contains("wing") {
        "8"
    } else if name.contains("shield") {
        "2"
    } else if has_any(&["sword", "staff", "bow", "blade", "mace", "axe", "scepter", "dagger"]) {
        "1"
    } else if name.contains("helm") {
        "3"
    } else if has_any(&["armor", "plate", "mail"]) {
        "4"
    } else if name.contains("pant") {
        "5"
    } else if name.contains("glove") {
        "6"
    } else if name.contains("boot") {
        "7"
    } else if name.contains("ear") {
        "11"
    } else {
        return None;
    };
    Some(category.to_string())
}

/// `add_option` group: the slot number for weapon through boots, else 0.
pub fn option_group(item: &CatalogItem) -> i64 {
    match item.slot {
        Some(slot @ (Slot::Weapon
        | Slot::Shield
        | Slot::Helm
        | Slot::Body
        | Slot::Pants
        | Slot::Gloves
        | Slot::Boots)) => slot.raw(),
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AdditionalOption {
    pub id: i64,
    pub value: i64,
}

pub fn additional_options(dataset: &Dataset, group: i64, plus: u8) -> Vec<AdditionalOption> {
    let Some(row) = dataset
        .add_option
        .get(&group.to_string())
        .and_then(|g| g.get(plus.to_string()))
    else {
        return Vec::new();
    };

    [("opt1", "val1"), ("opt2", "val2")]
        .iter()
        .filter_map(|(opt, val)| {
            let id = row.get(*opt).and_then(value_as_i64).filter(|id| *id != 0)?;
            let value = row.get(*val).and_then(value_as_i64).unwrap_or(0);
            Some(AdditionalOption { id, value })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionResult {
    pub name: String,
    pub value: Value,
    pub ancient: Vec<Value>,
}

/// Row of `item_options` for the item's group at `option_level` (1-based).
pub fn option_result(dataset: &Dataset, item: &CatalogItem, option_level: u8) -> Option<OptionResult> {
    if option_level == 0 {
        return None;
    }
    let group = option_group(item);
    let group_options = dataset
        .item_options
        .iter()
        .find(|g| g.get("group").and_then(value_as_i64) == Some(group))?;
    let option = group_options
        .get("options")?
        .as_array()?
        .iter()
        .find(|o| o.get("index").and_then(value_as_i64) == Some(i64::from(option_level) - 1))?;

    Some(OptionResult {
        name: group_options
            .get("groupName")
            .map(plain_string)
            .unwrap_or_default(),
        value: option
            .get(format!("value{option_level}"))
            .cloned()
            .unwrap_or(Value::from(0)),
        ancient: option
            .get("ancient")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
    })
}

pub fn option_name(id: i64) -> String {
    usize::try_from(id)
        .ok()
        .and_then(|i| OPTION_NAMES.get(i))
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| format!("Option {id}"))
}

/// Browsable items whose name contains `query`, ignoring case.
pub fn search_items<'a>(dataset: &'a Dataset, query: &str, armor_only: bool) -> Vec<&'a CatalogItem> {
    let query = query.trim().to_lowercase();
    dataset
        .items
        .iter()
        .filter(|item| if armor_only { is_armor(item) } else { is_allowed(item) })
        .filter(|item| query.is_empty() || item.name.to_lowercase().contains(&query))
        .collect()
}
