//! Working selection for one item and the numbers derived from it.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::class_config::{
    EffectKind, ItemClassConfig, LEVEL_MAX, OPTIONS_MAX, Rarity, StoredRarity,
};
use crate::classify::ItemClass;
use crate::dataset::CatalogItem;
use crate::entry::{CollectionEntry, ExeOptionRecord};
use crate::error::{CoreError, CoreErrorCode};

pub const DEFAULT_MAX_EXCELLENT_OPTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionsEffect {
    pub kind: EffectKind,
    pub label: &'static str,
    pub magnitude: u32,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcellentOptionState {
    pub name: &'static str,
    pub selected: bool,
    /// False once the selection is full and this option is not part of it.
    pub selectable: bool,
    pub rarity: StoredRarity,
    pub value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configurator {
    item_id: Option<String>,
    class: Option<ItemClass>,
    level: u8,
    options: u8,
    luck: bool,
    skill: bool,
    excellent: Vec<String>,
    rarities: BTreeMap<String, Rarity>,
    max_excellent: usize,
}

impl Default for Configurator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_EXCELLENT_OPTIONS)
    }
}

impl Configurator {
    pub fn new(max_excellent: usize) -> Self {
        Self {
            item_id: None,
            class: None,
            level: 0,
            options: 0,
            luck: false,
            skill: false,
            excellent: Vec::new(),
            rarities: BTreeMap::new(),
            max_excellent,
        }
    }

    /// Switches the configured item. Excellent picks belong to the old
    /// item's table and are dropped; the numeric fields are kept.
    pub fn select_item(&mut self, item: &CatalogItem) {
        self.item_id = Some(item.id.clone());
        self.class = Some(ItemClass::of(item));
        self.excellent.clear();
        self.rarities.clear();
    }

    /// Back to level 0, no options, no luck, no skill, no excellent picks.
    pub fn reset(&mut self) {
        self.level = 0;
        self.options = 0;
        self.luck = false;
        self.skill = false;
        self.excellent.clear();
        self.rarities.clear();
    }

    pub fn clear_item(&mut self) {
        self.item_id = None;
        self.class = None;
        self.excellent.clear();
        self.rarities.clear();
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn class(&self) -> Option<ItemClass> {
        self.class
    }

    pub fn class_config(&self) -> Option<&'static ItemClassConfig> {
        self.class.and_then(|class| class.config())
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn options(&self) -> u8 {
        self.options
    }

    pub fn luck(&self) -> bool {
        self.luck
    }

    pub fn skill(&self) -> bool {
        self.skill
    }

    pub fn max_excellent(&self) -> usize {
        self.max_excellent
    }

    pub fn selected_excellent(&self) -> &[String] {
        &self.excellent
    }

    pub fn rarity_of(&self, name: &str) -> Option<Rarity> {
        self.rarities.get(name).copied()
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level.min(LEVEL_MAX);
    }

    pub fn set_options(&mut self, options: u8) {
        self.options = options.min(OPTIONS_MAX);
    }

    pub fn set_luck(&mut self, luck: bool) {
        self.luck = luck;
    }

    pub fn set_skill(&mut self, skill: bool) {
        self.skill = skill;
    }

    /// Rarity can be chosen before or after the option itself is selected.
    pub fn set_rarity(&mut self, name: &str, rarity: Rarity) {
        self.rarities.insert(name.to_string(), rarity);
    }

    pub fn is_full(&self) -> bool {
        self.excellent.len() >= self.max_excellent
    }

    /// Selects or deselects an excellent option. Returns whether it is now
    /// selected. A pick past the limit is refused, never dropped silently.
    pub fn toggle_excellent(&mut self, name: &str) -> Result<bool, CoreError> {
        if let Some(pos) = self.excellent.iter().position(|n| n == name) {
            self.excellent.remove(pos);
            return Ok(false);
        }

        let config = self.class_config().ok_or_else(|| {
            CoreError::validation("Select a configurable item first.")
        })?;
        if config.excellent_option(name).is_none() {
            return Err(CoreError::not_found(format!(
                "{} has no excellent option named {name:?}",
                config.label
            )));
        }
        if self.is_full() {
            return Err(CoreError::new(
                CoreErrorCode::InvariantGuard,
                format!(
                    "At most {} excellent options can be selected.",
                    self.max_excellent
                ),
            ));
        }
        self.excellent.push(name.to_string());
        Ok(true)
    }

    pub fn option_states(&self) -> Vec<ExcellentOptionState> {
        let Some(config) = self.class_config() else {
            return Vec::new();
        };
        let full = self.is_full();
        config
            .excellent
            .iter()
            .map(|def| {
                let selected = self.excellent.iter().any(|n| n == def.name);
                let rarity = def.stored_rarity(self.rarity_of(def.name));
                ExcellentOptionState {
                    name: def.name,
                    selected,
                    selectable: selected || !full,
                    rarity,
                    value: def.value_for(Some(rarity)),
                }
            })
            .collect()
    }

    pub fn compute_options_effect(&self) -> Option<OptionsEffect> {
        let config = self.class_config()?;
        let rule = config.options;
        Some(OptionsEffect {
            kind: rule.kind,
            label: rule.kind.label(),
            magnitude: u32::from(self.options) * rule.per_level,
            unit: rule.kind.unit(),
        })
    }

    /// Value shown for an excellent option under the current rarity pick.
    pub fn resolve_excellent_value(&self, name: &str) -> Option<u32> {
        let config = self.class_config()?;
        let def = config.excellent_option(name)?;
        def.value_for(Some(def.stored_rarity(self.rarity_of(name))))
    }

    /// Snapshot of the selection for `item`, timestamped `ts`.
    pub fn commit(&self, item: &CatalogItem, ts: i64) -> CollectionEntry {
        let config = self.class_config();
        let exe_options = self
            .excellent
            .iter()
            .map(|name| {
                let rarity = config
                    .and_then(|c| c.excellent_option(name))
                    .map(|def| def.stored_rarity(self.rarity_of(name)))
                    .unwrap_or_else(|| StoredRarity::Tier(self.rarity_of(name).unwrap_or_default()));
                ExeOptionRecord {
                    text: name.clone(),
                    rarity,
                }
            })
            .collect();

        CollectionEntry {
            id: item.id.clone(),
            index: item.index,
            display_id: item.display_id.clone(),
            name: item.name.clone(),
            level: self.level,
            options: self.options,
            luck: self.luck,
            skill: self.skill && config.is_some_and(|c| c.skill),
            exe_options,
            done: false,
            ts,
            set: None,
        }
    }

    /// Loads a saved entry back into the selection. `item` is the catalog
    /// item the entry refers to, when it is still in the catalog.
    pub fn restore(&mut self, entry: &CollectionEntry, item: Option<&CatalogItem>) {
        match item {
            Some(item) => self.select_item(item),
            None => {
                self.item_id = Some(entry.id.clone());
                self.class = None;
                self.excellent.clear();
                self.rarities.clear();
            }
        }
        self.level = entry.level.min(LEVEL_MAX);
        self.options = entry.options.min(OPTIONS_MAX);
        self.luck = entry.luck;
        self.skill = entry.skill;

        for record in entry.exe_options.iter().take(self.max_excellent) {
            if !self.excellent.contains(&record.text) {
                self.excellent.push(record.text.clone());
            }
            if let StoredRarity::Tier(tier) = record.rarity {
                self.rarities.insert(record.text.clone(), tier);
            }
        }
        debug!(
            "restored {} into configurator (level {}, options {})",
            entry.id, self.level, self.options
        );
    }
}
