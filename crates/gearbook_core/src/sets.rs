//! Groups armor pieces into named equipment sets.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::CatalogItem;
use crate::slot::Slot;

/// Base names that contain spaces and would otherwise be split wrongly.
#[rustfmt::skip]
pub const KNOWN_SET_PREFIXES: &[&str] = &[
    "Storm Crow", "Black Dragon", "Dark Phoenix", "Grand Soul", "Holy Spirit",
    "Thunder Hawk", "Great Dragon", "Dark Soul", "Red Spirit", "Dragon Knight",
    "Venom Mist", "Sylphid Ray", "Ashcrow", "Eclipse", "Iris", "Violent Wind",
    "Red Winged", "Ancient", "Demonic", "Storm Blitz", "Eternal Winged", "Brave",
    "Divine", "Royal", "Hades", "Succubus", "Sacred Fire", "Storm Zahard",
    "Piercing Grove", "Phoenix Soul", "Bloody Dragon", "Aurelia", "Drakzar",
    "Ravager", "Netherion", "Sylvaria", "Varkrul", "Nymberis", "Bloodgrin",
    "Gravion", "Luxorion", "Crimessia", "Thalrion", "Virelith", "Carnavor",
    "Aetheron", "Nexarion",
];

const MIN_SET_PIECES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetMember {
    pub name: String,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquipmentSet {
    pub name: String,
    /// Ordered helm, armor, pants, gloves, boots.
    pub items: Vec<SetMember>,
}

impl EquipmentSet {
    /// Whether an entry with this name and slot belongs to the set.
    pub fn matches(&self, entry_name: &str, slot: Option<Slot>) -> bool {
        let entry_name = entry_name.to_lowercase();
        self.items.iter().any(|member| {
            Some(member.slot) == slot && entry_name.contains(&member.name.to_lowercase())
        })
    }
}

pub type SetMap = BTreeMap<String, EquipmentSet>;

pub fn base_name(name: &str, slot: Slot) -> String {
    if let Some(prefix) = KNOWN_SET_PREFIXES
        .iter()
        .find(|prefix| name.strip_prefix(**prefix).is_some_and(|rest| rest.starts_with(' ')))
    {
        return (*prefix).to_string();
    }
    match slot.set_suffix() {
        Some(suffix) => name
            .strip_suffix(suffix)
            .and_then(|rest| rest.strip_suffix(' '))
            .unwrap_or(name)
            .to_string(),
        None => name.to_string(),
    }
}

pub fn derive_sets(items: &[CatalogItem]) -> SetMap {
    let mut groups: BTreeMap<String, BTreeMap<Slot, String>> = BTreeMap::new();
    for item in items {
        let Some(slot) = item.slot.filter(Slot::is_set_slot) else {
            continue;
        };
        groups
            .entry(base_name(&item.name, slot))
            .or_default()
            .insert(slot, item.name.clone());
    }

    groups
        .into_iter()
        .filter(|(_, pieces)| pieces.len() >= MIN_SET_PIECES)
        .map(|(base, mut pieces)| {
            let name = format!("{base} Set");
            let items = Slot::SET_SLOTS
                .iter()
                .filter_map(|slot| {
                    pieces.remove(slot).map(|name| SetMember { name, slot: *slot })
                })
                .collect();
            (name.clone(), EquipmentSet { name, items })
        })
        .collect()
}

/// First set (in map order) that claims an entry by name and slot.
pub fn find_item_set<'a>(sets: &'a SetMap, name: &str, slot: Option<Slot>) -> Option<&'a str> {
    sets.values()
        .find(|set| set.matches(name, slot))
        .map(|set| set.name.as_str())
}

#[cfg(test)]
mod tests {
    use serde_json::Map as JsonMap;

    use super::{base_name, derive_sets, find_item_set};
    use crate::dataset::CatalogItem;
    use crate::slot::Slot;

    fn item(name: &str, slot: Slot) -> CatalogItem {
        CatalogItem {
            id: name.to_string(),
            index: 0,
            display_id: None,
            name: name.to_string(),
            slot: Some(slot),
            width: None,
            height: None,
            category_key: None,
            item_key: None,
            attributes: JsonMap::new(),
        }
    }

    #[test]
    fn prefix_overrides_suffix_split() {
        assert_eq!(base_name("Storm Crow Armor", Slot::Body), "Storm Crow");
        assert_eq!(base_name("Bronze Helm", Slot::Helm), "Bronze");
        assert_eq!(base_name("Bronze Helmet", Slot::Helm), "Bronze Helmet");
        assert_eq!(base_name("Irises Pants", Slot::Pants), "Irises");
    }

    #[test]
    fn three_pieces_make_a_set_in_slot_order() {
        let sets = derive_sets(&[
            item("Storm Crow Pants", Slot::Pants),
            item("Storm Crow Helm", Slot::Helm),
            item("Storm Crow Armor", Slot::Body),
        ]);
        let set = sets.get("Storm Crow Set").expect("set derived");
        let members: Vec<_> = set.items.iter().map(|m| (m.name.as_str(), m.slot)).collect();
        assert_eq!(
            members,
            vec![
                ("Storm Crow Helm", Slot::Helm),
                ("Storm Crow Armor", Slot::Body),
                ("Storm Crow Pants", Slot::Pants),
            ]
        );
    }

    #[test]
    fn two_pieces_or_non_set_slots_do_not_count() {
        let sets = derive_sets(&[
            item("Storm Crow Helm", Slot::Helm),
            item("Storm Crow Armor", Slot::Body),
            item("Storm Crow Sword", Slot::Weapon),
        ]);
        assert!(sets.is_empty());
    }

    #[test]
    fn entries_find_their_set_by_substring_and_slot() {
        let sets = derive_sets(&[
            item("Bronze Helm", Slot::Helm),
            item("Bronze Armor", Slot::Body),
            item("Bronze Boots", Slot::Boots),
        ]);
        assert_eq!(
            find_item_set(&sets, "bronze boots +15", Some(Slot::Boots)),
            Some("Bronze Set")
        );
        assert_eq!(find_item_set(&sets, "Bronze Boots", Some(Slot::Helm)), None);
    }
}
