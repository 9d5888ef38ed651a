use std::fmt;

use serde::{Serialize, Serializer};

use crate::class_config::{
    ARMOR_AND_RINGS, EARRINGS, ItemClassConfig, SHIELDS, WEAPON_NON_STAFF, WEAPON_STAFF, WINGS,
};
use crate::dataset::CatalogItem;
use crate::slot::Slot;

/// Configuration class of a catalog item. Every item maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemClass {
    WeaponNonStaff,
    WeaponStaff,
    Shield,
    ArmorAndRings,
    Wings,
    Earrings,
    /// Not configurable; carries the slot for its label.
    Other(Option<Slot>),
}

impl ItemClass {
    pub fn of(item: &CatalogItem) -> Self {
        Self::from_parts(item.slot, &item.name)
    }

    pub fn from_parts(slot: Option<Slot>, name: &str) -> Self {
        let Some(slot) = slot else {
            return Self::Other(None);
        };
        match slot {
            Slot::Weapon if name.to_lowercase().contains("staff") => Self::WeaponStaff,
            Slot::Weapon => Self::WeaponNonStaff,
            Slot::Shield => Self::Shield,
            Slot::Helm
            | Slot::Body
            | Slot::Pants
            | Slot::Gloves
            | Slot::Boots
            | Slot::RingLeft
            | Slot::RingRight => Self::ArmorAndRings,
            Slot::Wings => Self::Wings,
            Slot::EarringLeft | Slot::EarringRight => Self::Earrings,
            other => Self::Other(Some(other)),
        }
    }

    pub fn config(&self) -> Option<&'static ItemClassConfig> {
        match *self {
            Self::WeaponNonStaff => Some(&WEAPON_NON_STAFF),
            Self::WeaponStaff => Some(&WEAPON_STAFF),
            Self::Shield => Some(&SHIELDS),
            Self::ArmorAndRings => Some(&ARMOR_AND_RINGS),
            Self::Wings => Some(&WINGS),
            Self::Earrings => Some(&EARRINGS),
            Self::Other(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match (self.config(), self) {
            (Some(config), _) => config.label.to_string(),
            (None, Self::Other(Some(slot))) => capitalize(&slot.name()),
            (None, _) => "Unknown".to_string(),
        }
    }
}

impl fmt::Display for ItemClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl Serialize for ItemClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Slots that appear in the browsable item list at all.
pub fn is_allowed(item: &CatalogItem) -> bool {
    matches!(
        item.slot,
        Some(
            Slot::Weapon
                | Slot::Shield
                | Slot::Helm
                | Slot::Body
                | Slot::Pants
                | Slot::Gloves
                | Slot::Boots
                | Slot::Wings
                | Slot::RingLeft
                | Slot::RingRight
                | Slot::EarringLeft
                | Slot::EarringRight
        )
    )
}

/// The armor-only view: the five set slots.
pub fn is_armor(item: &CatalogItem) -> bool {
    item.slot.is_some_and(|slot| slot.is_set_slot())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ItemClass, is_allowed, is_armor};
    use crate::dataset::parse_dataset;
    use crate::slot::Slot;

    #[test]
    fn weapon_split_is_case_insensitive() {
        assert_eq!(
            ItemClass::from_parts(Some(Slot::Weapon), "Kris"),
            ItemClass::WeaponNonStaff
        );
        assert_eq!(
            ItemClass::from_parts(Some(Slot::Weapon), "Dragon Soul STAFF"),
            ItemClass::WeaponStaff
        );
        assert_eq!(
            ItemClass::from_parts(Some(Slot::Weapon), "Staffless Blade").label(),
            "Weapon (Staffs)"
        );
    }

    #[test]
    fn rings_configure_like_armor() {
        for slot in [Slot::Helm, Slot::Boots, Slot::RingLeft, Slot::RingRight] {
            assert_eq!(
                ItemClass::from_parts(Some(slot), "x"),
                ItemClass::ArmorAndRings
            );
        }
        assert_eq!(
            ItemClass::from_parts(Some(Slot::EarringRight), "x"),
            ItemClass::Earrings
        );
    }

    #[test]
    fn unmapped_slots_get_a_capitalized_label_and_no_config() {
        let pet = ItemClass::from_parts(Some(Slot::Pet), "Horn of Fenrir");
        assert_eq!(pet.label(), "Pet");
        assert!(pet.config().is_none());
        assert_eq!(ItemClass::from_parts(Some(Slot::Unknown(11)), "x").label(), "Slot 11");
        assert_eq!(ItemClass::from_parts(None, "x").label(), "Unknown");
    }

    #[test]
    fn slotless_items_are_unknown_and_not_listed() {
        let item = parse_dataset(json!({
            "items": {"0": {"a": {"Name": "Mystery Staff", "Index": 1, "Slot": null}}}
        }))
        .items
        .remove(0);

        let class = ItemClass::of(&item);
        assert_eq!(class, ItemClass::Other(None));
        assert_eq!(class.label(), "Unknown");
        assert!(class.config().is_none());
        assert!(!is_allowed(&item));
        assert!(!is_armor(&item));
    }
}
