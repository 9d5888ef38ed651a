//! Normalizes the raw item database into a canonical in-memory catalog.
//!
//! The source JSON is loosely shaped: items live under `items.<category>.<key>`
//! (or directly at the top level in older dumps) and a handful of sibling
//! option tables ride along. Entries that do not look like items are skipped
//! and counted rather than rejected.

mod cache;
mod payload;

use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value};

use crate::slot::Slot;

pub use cache::{DATASET_CACHE_VERSION, DatasetSource, load_cached, load_dataset_cached, store_cached};
pub use payload::{
    CONTENT_TYPE_GZIP, CONTENT_TYPE_JSON, DatasetPayload, DatasetProvider, FileDatasetProvider,
    decode_payload, load_dataset,
};

/// One gear piece from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub index: i64,
    pub display_id: Option<String>,
    pub name: String,
    pub slot: Option<Slot>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub category_key: Option<String>,
    pub item_key: Option<String>,
    /// Every field of the source record, kept for stat display and skill lookups.
    pub attributes: JsonMap<String, Value>,
}

impl CatalogItem {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExeTableEntry {
    pub name: String,
    pub value: Option<Value>,
    pub code: Option<Value>,
}

/// Counters from the filter-and-count pass over the raw records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseStats {
    pub items: usize,
    pub skipped: usize,
    pub used_flat_fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dataset {
    pub items: Vec<CatalogItem>,
    pub exe_by_category: BTreeMap<String, BTreeMap<i64, Vec<ExeTableEntry>>>,
    pub add_option: JsonMap<String, Value>,
    pub add_exe_options: JsonMap<String, Value>,
    pub exe_options_rank: JsonMap<String, Value>,
    pub source_options: Vec<Value>,
    pub item_refine_options: Vec<Value>,
    pub item_options: Vec<Value>,
    pub item_harmony_options: Vec<Value>,
    pub skills: JsonMap<String, Value>,
    pub raw: Value,
    pub stats: ParseStats,
}

impl Dataset {
    pub fn item(&self, id: &str) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

pub fn parse_dataset(raw: Value) -> Dataset {
    let mut stats = ParseStats::default();
    let mut items = Vec::new();

    if let Some(categories) = raw.get("items").and_then(Value::as_object) {
        for (category_key, category_items) in categories {
            let Some(category_items) = category_items.as_object() else {
                continue;
            };
            for (item_key, record) in category_items {
                match nested_item(category_key, item_key, record) {
                    Some(item) => items.push(item),
                    None => stats.skipped += 1,
                }
            }
        }
    }

    if items.is_empty()
        && let Some(top_level) = raw.as_object()
    {
        stats.used_flat_fallback = true;
        for (key, record) in top_level {
            if !is_item_record(record) {
                continue;
            }
            match flat_item(key, record) {
                Some(item) => items.push(item),
                None => stats.skipped += 1,
            }
        }
    }

    items.sort_by_key(|item| item.index);
    stats.items = items.len();

    if stats.skipped > 0 {
        warn!(
            "skipped {} dataset entries without a usable Name/Index",
            stats.skipped
        );
    }
    debug!(
        "parsed {} catalog items (flat fallback: {})",
        stats.items, stats.used_flat_fallback
    );

    Dataset {
        items,
        exe_by_category: normalize_exe_options(raw.get("exe_options")),
        add_option: object_table(&raw, "add_option"),
        add_exe_options: object_table(&raw, "add_exe_options"),
        exe_options_rank: object_table(&raw, "exe_options_rank"),
        source_options: array_table(&raw, "source_options"),
        item_refine_options: array_table(&raw, "item_refine_options"),
        item_options: array_table(&raw, "item_options"),
        item_harmony_options: array_table(&raw, "item_harmony_options"),
        skills: object_table(&raw, "skill"),
        raw,
        stats,
    }
}

fn is_item_record(record: &Value) -> bool {
    record
        .as_object()
        .is_some_and(|obj| obj.contains_key("Name") && obj.contains_key("Index"))
}

fn nested_item(category_key: &str, item_key: &str, record: &Value) -> Option<CatalogItem> {
    let obj = record.as_object()?;
    let raw_index = obj.get("Index")?;
    if !obj.contains_key("Name") {
        return None;
    }
    let index = value_as_i64(raw_index)?;

    Some(CatalogItem {
        id: format!("{category_key}-{item_key}"),
        index,
        display_id: Some(format!("{category_key}-{index}")),
        name: item_name(obj.get("Name"), item_key),
        slot: obj.get("Slot").and_then(Slot::from_value),
        width: obj.get("Width").and_then(value_as_i64),
        height: obj.get("Height").and_then(value_as_i64),
        category_key: Some(category_key.to_string()),
        item_key: Some(item_key.to_string()),
        attributes: obj.clone(),
    })
}

fn flat_item(key: &str, record: &Value) -> Option<CatalogItem> {
    let obj = record.as_object()?;
    let raw_index = obj.get("Index")?;
    let index = value_as_i64(raw_index)?;

    Some(CatalogItem {
        id: plain_string(raw_index),
        index,
        display_id: None,
        name: item_name(obj.get("Name"), key),
        slot: obj.get("Slot").and_then(Slot::from_value),
        width: obj.get("Width").and_then(value_as_i64),
        height: obj.get("Height").and_then(value_as_i64),
        category_key: None,
        item_key: None,
        attributes: obj.clone(),
    })
}

fn item_name(name: Option<&Value>, key: &str) -> String {
    match name {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => format!("Item {key}"),
    }
}

fn normalize_exe_options(
    table: Option<&Value>,
) -> BTreeMap<String, BTreeMap<i64, Vec<ExeTableEntry>>> {
    let mut out = BTreeMap::new();
    let Some(categories) = table.and_then(Value::as_object) else {
        return out;
    };

    for (category_key, levels) in categories {
        let Some(levels) = levels.as_object() else {
            continue;
        };
        let category: &mut BTreeMap<i64, Vec<ExeTableEntry>> =
            out.entry(category_key.clone()).or_default();
        for (level_key, level_data) in levels {
            let Some(level_data) = level_data.as_object() else {
                continue;
            };
            let Ok(level) = level_key.trim().parse::<i64>() else {
                continue;
            };
            let bucket = category.entry(level).or_default();
            let Some(name) = level_data.get("name").and_then(non_empty_string) else {
                continue;
            };
            bucket.push(ExeTableEntry {
                name,
                value: level_data.get("value").cloned(),
                code: level_data.get("code").cloned(),
            });
        }
    }

    out
}

fn object_table(raw: &Value, key: &str) -> JsonMap<String, Value> {
    raw.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn array_table(raw: &Value, key: &str) -> Vec<Value> {
    raw.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn non_empty_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Numeric coercion for dataset fields that may arrive as numbers or numeric strings.
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub(crate) fn plain_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
