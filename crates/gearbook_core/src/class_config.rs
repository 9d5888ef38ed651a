//! Static rule tables for every configurable item class.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const LEVEL_MIN: u8 = 0;
pub const LEVEL_MAX: u8 = 15;
pub const OPTIONS_MIN: u8 = 0;
pub const OPTIONS_MAX: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Rarity {
    #[default]
    Normal,
    Uncommon,
    Rare,
    Legendary,
    Epic,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Normal,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
        Rarity::Epic,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Normal => "normal",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
            Self::Epic => "epic",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    fn position(&self) -> usize {
        match *self {
            Self::Normal => 0,
            Self::Uncommon => 1,
            Self::Rare => 2,
            Self::Legendary => 3,
            Self::Epic => 4,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rarity as written into a collection entry. Options without tiers are
/// stored as `"single"`; unrecognised strings read back as `normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StoredRarity {
    Tier(Rarity),
    Single,
}

impl StoredRarity {
    pub const SINGLE: &'static str = "single";

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Tier(tier) => tier.as_str(),
            Self::Single => Self::SINGLE,
        }
    }

    pub fn tier(&self) -> Option<Rarity> {
        match *self {
            Self::Tier(tier) => Some(tier),
            Self::Single => None,
        }
    }
}

impl Default for StoredRarity {
    fn default() -> Self {
        Self::Tier(Rarity::Normal)
    }
}

impl From<&str> for StoredRarity {
    fn from(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case(Self::SINGLE) {
            Self::Single
        } else {
            Self::Tier(Rarity::parse(raw).unwrap_or_default())
        }
    }
}

impl From<String> for StoredRarity {
    fn from(raw: String) -> Self {
        Self::from(raw.as_str())
    }
}

impl From<StoredRarity> for String {
    fn from(rarity: StoredRarity) -> Self {
        rarity.as_str().to_string()
    }
}

impl fmt::Display for StoredRarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValues {
    /// Magnitudes in `Rarity::ALL` order.
    Tiered([u32; 5]),
    Single(u32),
}

impl OptionValues {
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExcellentOptionDef {
    pub name: &'static str,
    pub values: OptionValues,
}

impl ExcellentOptionDef {
    /// Single magnitudes ignore the tier. Tiered options default to normal and
    /// have no value for a `single` tag.
    pub fn value_for(&self, rarity: Option<StoredRarity>) -> Option<u32> {
        match self.values {
            OptionValues::Single(value) => Some(value),
            OptionValues::Tiered(values) => match rarity {
                None => Some(values[Rarity::Normal.position()]),
                Some(StoredRarity::Tier(tier)) => Some(values[tier.position()]),
                Some(StoredRarity::Single) => None,
            },
        }
    }

    pub fn stored_rarity(&self, chosen: Option<Rarity>) -> StoredRarity {
        if self.values.is_single() {
            StoredRarity::Single
        } else {
            StoredRarity::Tier(chosen.unwrap_or_default())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    Damage,
    Defense,
    HpRecovery,
}

impl EffectKind {
    pub fn label(&self) -> &'static str {
        match *self {
            Self::Damage => "Additional damage",
            Self::Defense => "Additional defense",
            Self::HpRecovery => "Automatic HP recovery",
        }
    }

    pub fn unit(&self) -> &'static str {
        match *self {
            Self::HpRecovery => "%",
            Self::Damage | Self::Defense => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionsRule {
    pub per_level: u32,
    pub kind: EffectKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemClassConfig {
    pub label: &'static str,
    pub options: OptionsRule,
    pub luck_on: [&'static str; 2],
    pub luck_off: &'static str,
    pub skill: bool,
    pub excellent: &'static [ExcellentOptionDef],
}

impl ItemClassConfig {
    pub fn level_range(&self) -> (u8, u8) {
        (LEVEL_MIN, LEVEL_MAX)
    }

    pub fn options_range(&self) -> (u8, u8) {
        (OPTIONS_MIN, OPTIONS_MAX)
    }

    pub fn excellent_option(&self, name: &str) -> Option<&'static ExcellentOptionDef> {
        self.excellent.iter().find(|def| def.name == name)
    }

    pub fn resolve_excellent_value(&self, name: &str, rarity: Option<StoredRarity>) -> Option<u32> {
        self.excellent_option(name)?.value_for(rarity)
    }

    pub fn has_rarity_tiers(&self) -> bool {
        self.excellent.iter().any(|def| !def.values.is_single())
    }
}

const LUCK_ON: [&str; 2] = ["Success rate increase +25%", "Critical damage rate +5%"];
const LUCK_OFF: &str = "none";

const fn tiered(name: &'static str, values: [u32; 5]) -> ExcellentOptionDef {
    ExcellentOptionDef {
        name,
        values: OptionValues::Tiered(values),
    }
}

const fn single(name: &'static str, value: u32) -> ExcellentOptionDef {
    ExcellentOptionDef {
        name,
        values: OptionValues::Single(value),
    }
}

// Tier columns: normal, uncommon, rare, legendary, epic.
#[rustfmt::skip]
const WEAPON_EXCELLENT: &[ExcellentOptionDef] = &[
    tiered("Excellent Damage Rate %",               [ 6,  7,  8,  9, 10]),
    tiered("Physical Damage Increases +level/",     [35, 30, 25, 20, 15]),
    tiered("Physical Damage Increase %",            [ 6,  7,  8,  9, 10]),
    tiered("Increases Attack Speed +",              [20, 25, 30, 35, 40]),
    tiered("Obtains (Life) when monster is killed", [14, 12, 10,  8,  6]),
    tiered("Obtains (Mana) when monster is killed", [14, 12, 10,  8,  6]),
];

#[rustfmt::skip]
const STAFF_EXCELLENT: &[ExcellentOptionDef] = &[
    tiered("Excellent Damage Rate %",               [ 6,  7,  8,  9, 10]),
    tiered("Wizardry Damage Increases +level/",     [35, 30, 25, 20, 15]),
    tiered("Wizardry Damage Increase %",            [ 6,  7,  8,  9, 10]),
    tiered("Increases Attack Speed +",              [20, 25, 30, 35, 40]),
    tiered("Obtains (Life) when monster is killed", [14, 12, 10,  8,  6]),
    tiered("Obtains (Mana) when monster is killed", [14, 12, 10,  8,  6]),
];

#[rustfmt::skip]
const DEFENSIVE_EXCELLENT: &[ExcellentOptionDef] = &[
    tiered("Increase Maximum Life %",             [1,  2,  3,  4,  5]),
    tiered("Increase Maximum SD %",               [1,  2,  3,  4,  5]),
    tiered("Damage Decrease %",                   [1,  2,  3,  4,  5]),
    tiered("Reflect Damage %",                    [1,  2,  3,  4,  5]),
    tiered("Defense success rate % (PVM Only)",   [3,  6,  9, 12, 15]),
    tiered("Increase Zen Drop Rate %",            [5, 10, 15, 20, 25]),
];

#[rustfmt::skip]
const WINGS_EXCELLENT: &[ExcellentOptionDef] = &[
    single("Increases attack speed 50",       50),
    single("Increases double damage rate 3%",  3),
    single("Enemy's Attack Return Rate 3%",    3),
    single("Enemy's Defense Ignore Rate 3%",   3),
];

pub static WEAPON_NON_STAFF: ItemClassConfig = ItemClassConfig {
    label: "Weapon (All except staffs)",
    options: OptionsRule { per_level: 30, kind: EffectKind::Damage },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: true,
    excellent: WEAPON_EXCELLENT,
};

pub static WEAPON_STAFF: ItemClassConfig = ItemClassConfig {
    label: "Weapon (Staffs)",
    options: OptionsRule { per_level: 30, kind: EffectKind::Damage },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: false,
    excellent: STAFF_EXCELLENT,
};

pub static SHIELDS: ItemClassConfig = ItemClassConfig {
    label: "Shields",
    options: OptionsRule { per_level: 5, kind: EffectKind::Defense },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: true,
    excellent: DEFENSIVE_EXCELLENT,
};

pub static ARMOR_AND_RINGS: ItemClassConfig = ItemClassConfig {
    label: "Armor & Rings",
    options: OptionsRule { per_level: 15, kind: EffectKind::Defense },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: false,
    excellent: DEFENSIVE_EXCELLENT,
};

pub static EARRINGS: ItemClassConfig = ItemClassConfig {
    label: "Earrings",
    options: OptionsRule { per_level: 15, kind: EffectKind::HpRecovery },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: false,
    excellent: &[],
};

pub static WINGS: ItemClassConfig = ItemClassConfig {
    label: "Wings",
    options: OptionsRule { per_level: 1, kind: EffectKind::HpRecovery },
    luck_on: LUCK_ON,
    luck_off: LUCK_OFF,
    skill: false,
    excellent: WINGS_EXCELLENT,
};

#[cfg(test)]
mod tests {
    use super::{
        ARMOR_AND_RINGS, Rarity, StoredRarity, WEAPON_NON_STAFF, WEAPON_STAFF, WINGS,
    };

    #[test]
    fn tiered_lookup_defaults_to_normal() {
        let name = "Physical Damage Increases +level/";
        assert_eq!(WEAPON_NON_STAFF.resolve_excellent_value(name, None), Some(35));
        assert_eq!(
            WEAPON_NON_STAFF.resolve_excellent_value(name, Some(StoredRarity::Tier(Rarity::Epic))),
            Some(15)
        );
        assert_eq!(
            WEAPON_NON_STAFF.resolve_excellent_value(name, Some(StoredRarity::Single)),
            None
        );
        assert_eq!(WEAPON_NON_STAFF.resolve_excellent_value("Nope", None), None);
    }

    #[test]
    fn staff_table_swaps_physical_for_wizardry() {
        assert!(WEAPON_STAFF.excellent_option("Wizardry Damage Increase %").is_some());
        assert!(WEAPON_STAFF.excellent_option("Physical Damage Increase %").is_none());
        assert!(!WEAPON_STAFF.skill);
    }

    #[test]
    fn wings_ignore_tier() {
        for tier in Rarity::ALL {
            assert_eq!(
                WINGS.resolve_excellent_value(
                    "Increases attack speed 50",
                    Some(StoredRarity::Tier(tier))
                ),
                Some(50)
            );
        }
        assert!(!WINGS.has_rarity_tiers());
        assert!(ARMOR_AND_RINGS.has_rarity_tiers());
    }

    #[test]
    fn stored_rarity_reads_leniently() {
        assert_eq!(StoredRarity::from("single"), StoredRarity::Single);
        assert_eq!(StoredRarity::from("Rare"), StoredRarity::Tier(Rarity::Rare));
        assert_eq!(StoredRarity::from("mythic"), StoredRarity::Tier(Rarity::Normal));
        let json = serde_json::to_string(&StoredRarity::Tier(Rarity::Legendary)).expect("encode");
        assert_eq!(json, "\"legendary\"");
    }
}
