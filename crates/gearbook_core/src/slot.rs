use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Equipment slot code as carried by the dataset's `Slot` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Slot {
    Weapon,
    Shield,
    Helm,
    Body,
    Pants,
    Gloves,
    Boots,
    Wings,
    Pet,
    RingLeft,
    RingRight,
    EarringLeft,
    EarringRight,
    Common,
    Unknown(i64),
}

impl Slot {
    pub const WEAPON_RAW: i64 = 0;
    pub const SHIELD_RAW: i64 = 1;
    pub const HELM_RAW: i64 = 2;
    pub const BODY_RAW: i64 = 3;
    pub const PANTS_RAW: i64 = 4;
    pub const GLOVES_RAW: i64 = 5;
    pub const BOOTS_RAW: i64 = 6;
    pub const WINGS_RAW: i64 = 7;
    pub const PET_RAW: i64 = 8;
    pub const RING_LEFT_RAW: i64 = 9;
    pub const RING_RIGHT_RAW: i64 = 10;
    pub const EARRING_LEFT_RAW: i64 = 12;
    pub const EARRING_RIGHT_RAW: i64 = 13;
    pub const COMMON_RAW: i64 = 255;

    /// The five slots that make up an equipment set, in display order.
    pub const SET_SLOTS: [Slot; 5] = [
        Slot::Helm,
        Slot::Body,
        Slot::Pants,
        Slot::Gloves,
        Slot::Boots,
    ];

    pub fn from_raw(raw: i64) -> Self {
        match raw {
            Self::WEAPON_RAW => Self::Weapon,
            Self::SHIELD_RAW => Self::Shield,
            Self::HELM_RAW => Self::Helm,
            Self::BODY_RAW => Self::Body,
            Self::PANTS_RAW => Self::Pants,
            Self::GLOVES_RAW => Self::Gloves,
            Self::BOOTS_RAW => Self::Boots,
            Self::WINGS_RAW => Self::Wings,
            Self::PET_RAW => Self::Pet,
            Self::RING_LEFT_RAW => Self::RingLeft,
            Self::RING_RIGHT_RAW => Self::RingRight,
            Self::EARRING_LEFT_RAW => Self::EarringLeft,
            Self::EARRING_RIGHT_RAW => Self::EarringRight,
            Self::COMMON_RAW => Self::Common,
            other => Self::Unknown(other),
        }
    }

    /// Reads a slot from a dataset value; numbers and numeric strings are accepted.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .map(Self::from_raw),
            Value::String(s) => s.trim().parse::<i64>().ok().map(Self::from_raw),
            _ => None,
        }
    }

    pub fn raw(&self) -> i64 {
        match *self {
            Self::Weapon => Self::WEAPON_RAW,
            Self::Shield => Self::SHIELD_RAW,
            Self::Helm => Self::HELM_RAW,
            Self::Body => Self::BODY_RAW,
            Self::Pants => Self::PANTS_RAW,
            Self::Gloves => Self::GLOVES_RAW,
            Self::Boots => Self::BOOTS_RAW,
            Self::Wings => Self::WINGS_RAW,
            Self::Pet => Self::PET_RAW,
            Self::RingLeft => Self::RING_LEFT_RAW,
            Self::RingRight => Self::RING_RIGHT_RAW,
            Self::EarringLeft => Self::EARRING_LEFT_RAW,
            Self::EarringRight => Self::EARRING_RIGHT_RAW,
            Self::Common => Self::COMMON_RAW,
            Self::Unknown(other) => other,
        }
    }

    pub fn name(&self) -> String {
        match *self {
            Self::Weapon => "weapon".to_string(),
            Self::Shield => "shield".to_string(),
            Self::Helm => "helm".to_string(),
            Self::Body => "body".to_string(),
            Self::Pants => "pants".to_string(),
            Self::Gloves => "gloves".to_string(),
            Self::Boots => "boots".to_string(),
            Self::Wings => "wings".to_string(),
            Self::Pet => "pet".to_string(),
            Self::RingLeft => "ring(L)".to_string(),
            Self::RingRight => "ring(R)".to_string(),
            Self::EarringLeft => "earring(L)".to_string(),
            Self::EarringRight => "earring(R)".to_string(),
            Self::Common => "common".to_string(),
            Self::Unknown(other) => format!("slot {other}"),
        }
    }

    /// Suffix stripped from item names when deriving set base names.
    pub fn set_suffix(&self) -> Option<&'static str> {
        match *self {
            Self::Helm => Some("Helm"),
            Self::Body => Some("Armor"),
            Self::Pants => Some("Pants"),
            Self::Gloves => Some("Gloves"),
            Self::Boots => Some("Boots"),
            _ => None,
        }
    }

    pub fn is_set_slot(&self) -> bool {
        self.set_suffix().is_some()
    }
}

impl From<i64> for Slot {
    fn from(raw: i64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<Slot> for i64 {
    fn from(slot: Slot) -> Self {
        slot.raw()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
