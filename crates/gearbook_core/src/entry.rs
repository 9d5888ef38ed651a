//! Saved configuration snapshots and their on-disk shape.
//!
//! Older records carry `optionLevel` instead of `options` and a flat
//! `exeLines` list instead of `exeOptions`. Both are folded into the current
//! shape while deserializing, so nothing downstream sees the legacy fields.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::class_config::{LEVEL_MAX, OPTIONS_MAX, StoredRarity};
use crate::dataset::{plain_string, value_as_i64};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExeOptionRecord {
    pub text: String,
    pub rarity: StoredRarity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEntry")]
pub struct CollectionEntry {
    pub id: String,
    pub index: i64,
    pub display_id: Option<String>,
    pub name: String,
    pub level: u8,
    pub options: u8,
    pub luck: bool,
    pub skill: bool,
    pub exe_options: Vec<ExeOptionRecord>,
    pub done: bool,
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawEntry {
    id: Value,
    index: Value,
    display_id: Value,
    name: Value,
    level: Value,
    options: Value,
    option_level: Value,
    luck: Value,
    skill: Value,
    exe_options: Value,
    exe_lines: Value,
    done: Value,
    ts: Value,
    set: Value,
}

impl From<RawEntry> for CollectionEntry {
    fn from(raw: RawEntry) -> Self {
        let options = [&raw.options, &raw.option_level]
            .into_iter()
            .filter_map(value_as_i64)
            .find(|n| *n != 0)
            .unwrap_or(0);

        Self {
            id: optional_text(&raw.id).unwrap_or_default(),
            index: value_as_i64(&raw.index).unwrap_or(0),
            display_id: optional_text(&raw.display_id),
            name: optional_text(&raw.name).unwrap_or_default(),
            level: clamp_u8(value_as_i64(&raw.level).unwrap_or(0), LEVEL_MAX),
            options: clamp_u8(options, OPTIONS_MAX),
            luck: truthy(&raw.luck),
            skill: truthy(&raw.skill),
            exe_options: exe_records(&raw.exe_options, &raw.exe_lines),
            done: truthy(&raw.done),
            ts: value_as_i64(&raw.ts).unwrap_or(0),
            set: optional_text(&raw.set),
        }
    }
}

fn exe_records(exe_options: &Value, exe_lines: &Value) -> Vec<ExeOptionRecord> {
    if let Some(records) = exe_options.as_array().filter(|a| !a.is_empty()) {
        return records
            .iter()
            .filter_map(|record| match record {
                Value::String(text) => Some(ExeOptionRecord {
                    text: text.clone(),
                    rarity: StoredRarity::default(),
                }),
                Value::Object(obj) => {
                    let text = obj.get("text").and_then(optional_text)?;
                    let rarity = obj
                        .get("rarity")
                        .and_then(Value::as_str)
                        .map(StoredRarity::from)
                        .unwrap_or_default();
                    Some(ExeOptionRecord { text, rarity })
                }
                _ => None,
            })
            .collect();
    }

    exe_lines
        .as_array()
        .map(|lines| {
            lines
                .iter()
                .filter_map(optional_text)
                .map(|text| ExeOptionRecord {
                    text,
                    rarity: StoredRarity::default(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn optional_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(plain_string(other)),
    }
}

fn clamp_u8(value: i64, max: u8) -> u8 {
    u8::try_from(value.clamp(0, i64::from(max))).unwrap_or(0)
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Reads a list of stored entries, dropping any that are not JSON objects.
/// Returns the entries and the number dropped.
pub fn entries_from_values(values: &[Value]) -> (Vec<CollectionEntry>, usize) {
    let mut entries = Vec::with_capacity(values.len());
    let mut dropped = 0;
    for value in values {
        if !value.is_object() {
            dropped += 1;
            continue;
        }
        match serde_json::from_value::<CollectionEntry>(value.clone()) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                warn!("dropping unreadable collection entry: {e}");
                dropped += 1;
            }
        }
    }
    if dropped > 0 {
        warn!("dropped {dropped} unreadable collection entries");
    }
    (entries, dropped)
}

pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{CollectionEntry, entries_from_values};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<CollectionEntry>, D::Error> {
        let values = match Value::deserialize(deserializer)? {
            Value::Array(values) => values,
            _ => Vec::new(),
        };
        Ok(entries_from_values(&values).0)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{CollectionEntry, entries_from_values};
    use crate::class_config::{Rarity, StoredRarity};

    #[test]
    fn legacy_fields_are_migrated() {
        let entry: CollectionEntry = serde_json::from_value(json!({
            "id": "0-3", "index": 3, "displayId": "0-3", "name": "Kris",
            "level": 20, "optionLevel": 4, "luck": 1,
            "exeLines": ["Excellent Damage Rate %"],
            "ts": 10
        }))
        .expect("legacy entry");

        assert_eq!(entry.level, 15);
        assert_eq!(entry.options, 4);
        assert!(entry.luck);
        assert!(!entry.done);
        assert_eq!(entry.exe_options.len(), 1);
        assert_eq!(entry.exe_options[0].rarity, StoredRarity::Tier(Rarity::Normal));
    }

    #[test]
    fn current_shape_round_trips_without_set() {
        let original = json!({
            "id": "7-a", "index": 12, "displayId": "7-12", "name": "Wings of Storm",
            "level": 9, "options": 2, "luck": false, "skill": false,
            "exeOptions": [{"text": "Increases attack speed 50", "rarity": "single"}],
            "done": true, "ts": 1_700_000_000_000_i64
        });
        let entry: CollectionEntry = serde_json::from_value(original.clone()).expect("entry");
        assert_eq!(entry.exe_options[0].rarity, StoredRarity::Single);
        assert_eq!(serde_json::to_value(&entry).expect("encode"), original);
    }

    #[test]
    fn non_objects_are_dropped_and_counted() {
        let (entries, dropped) = entries_from_values(&[json!({"id": "x"}), json!(4), json!(null)]);
        assert_eq!(entries.len(), 1);
        assert_eq!(dropped, 2);
    }
}
