use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::catalog::DEFAULT_IMAGE_BASE_URL;
use crate::class_config::{LEVEL_MAX, OPTIONS_MAX};
use crate::classify::ItemClass;
use crate::clock::Clock;
use crate::configurator::{Configurator, DEFAULT_MAX_EXCELLENT_OPTIONS};
use crate::dataset::{
    CatalogItem, Dataset, DatasetProvider, DatasetSource, load_dataset_cached,
};
use crate::entry::CollectionEntry;
use crate::error::CoreError;
use crate::sets::{SetMap, derive_sets};
use crate::slot::Slot;
use crate::store::view::{EntryFilter, GroupedEntries, IndexedEntry, filter_entries, group_by_sets};
use crate::store::{CollectionStore, CrossCheck, Storage, StorageKeys, upsert_entry};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub storage_prefix: String,
    pub image_base_url: String,
    pub max_excellent_options: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_prefix: "gearbook".to_string(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            max_excellent_options: DEFAULT_MAX_EXCELLENT_OPTIONS,
        }
    }
}

impl AppConfig {
    pub fn keys(&self, scope: &str) -> StorageKeys {
        StorageKeys::new(&self.storage_prefix, scope)
    }
}

/// Level/options/luck/skill applied to every piece when adding a whole set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetItemConfig {
    pub level: u8,
    pub options: u8,
    pub luck: bool,
    pub skill: bool,
}

/// Everything one session works on: the catalog for the current scope, the
/// derived sets, the collection store and the configurator selection.
///
/// Built once per dataset; [`AppState::switch_dataset`] and
/// [`AppState::shutdown`] flush the working buffer before letting go.
pub struct AppState<S: Storage> {
    config: AppConfig,
    scope: String,
    dataset: Dataset,
    sets: SetMap,
    store: CollectionStore<S>,
    configurator: Configurator,
}

impl<S: Storage> AppState<S> {
    pub fn new(
        config: AppConfig,
        storage: S,
        scope: &str,
        dataset: Dataset,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CoreError> {
        let store = CollectionStore::open(storage, config.keys(scope), clock)?;
        let sets = derive_sets(&dataset.items);
        info!(
            "scope {scope}: {} items, {} sets, {} collections",
            dataset.len(),
            sets.len(),
            store.collections().len()
        );
        Ok(Self {
            configurator: Configurator::new(config.max_excellent_options),
            config,
            scope: scope.to_string(),
            dataset,
            sets,
            store,
        })
    }

    /// Loads the dataset through the per-scope cache, then opens the store.
    pub fn load(
        config: AppConfig,
        mut storage: S,
        scope: &str,
        provider: &dyn DatasetProvider,
        refresh: bool,
        clock: Box<dyn Clock>,
    ) -> Result<(Self, DatasetSource), CoreError> {
        let keys = config.keys(scope);
        let (dataset, source) = load_dataset_cached(&mut storage, &keys, provider, refresh)?;
        Ok((Self::new(config, storage, scope, dataset, clock)?, source))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn sets(&self) -> &SetMap {
        &self.sets
    }

    pub fn store(&self) -> &CollectionStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CollectionStore<S> {
        &mut self.store
    }

    pub fn configurator(&self) -> &Configurator {
        &self.configurator
    }

    pub fn configurator_mut(&mut self) -> &mut Configurator {
        &mut self.configurator
    }

    pub fn selected_item(&self) -> Option<&CatalogItem> {
        self.configurator
            .item_id()
            .and_then(|id| self.dataset.item(id))
    }

    /// Returns false when the id is not in the catalog.
    pub fn select_item(&mut self, id: &str) -> bool {
        match self.dataset.item(id) {
            Some(item) => {
                self.configurator.select_item(item);
                true
            }
            None => false,
        }
    }

    pub fn entry_slot(&self, entry: &CollectionEntry) -> Option<Slot> {
        self.dataset.item(&entry.id).and_then(|item| item.slot)
    }

    fn selected_or_err(&self) -> Result<&CatalogItem, CoreError> {
        self.selected_item()
            .ok_or_else(|| CoreError::validation("Select an item first."))
    }

    /// Saves the current configuration into the active collection, replacing
    /// any entry for the same item.
    pub fn add_to_collection(&mut self) -> Result<CollectionEntry, CoreError> {
        let item = self.selected_or_err()?;
        let entry = self.configurator.commit(item, self.store.now_ms());
        upsert_entry(self.store.working_mut(), entry.clone());
        self.store.flush()?;
        debug!("saved {} into the active collection", entry.id);
        Ok(entry)
    }

    /// Commits the current configuration straight into another collection.
    pub fn add_item_to_collection(&mut self, collection_id: &str) -> Result<bool, CoreError> {
        let item = self.selected_or_err()?;
        let entry = self.configurator.commit(item, self.store.now_ms());
        self.store.add_entry_to(collection_id, entry)
    }

    /// Cross-collection presence of the selected item.
    pub fn cross_check(&self) -> Vec<CrossCheck> {
        self.configurator
            .item_id()
            .map(|id| self.store.cross_check(id))
            .unwrap_or_default()
    }

    /// Loads a working-buffer entry into the configurator. Returns false for
    /// an unknown index.
    pub fn edit_into_configurator(&mut self, index: usize) -> bool {
        let Some(entry) = self.store.working().get(index) else {
            return false;
        };
        let item = self.dataset.item(&entry.id);
        self.configurator.restore(entry, item);
        true
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<Option<CollectionEntry>, CoreError> {
        if index >= self.store.working().len() {
            return Ok(None);
        }
        let removed = self.store.working_mut().remove(index);
        self.store.flush()?;
        Ok(Some(removed))
    }

    /// Flips the done flag and returns its new value.
    pub fn toggle_done(&mut self, index: usize) -> Result<Option<bool>, CoreError> {
        let Some(entry) = self.store.working_mut().get_mut(index) else {
            return Ok(None);
        };
        entry.done = !entry.done;
        let done = entry.done;
        self.store.flush()?;
        Ok(Some(done))
    }

    /// Empties the active collection and returns how many entries it held.
    pub fn wipe(&mut self) -> Result<usize, CoreError> {
        let count = self.store.working().len();
        self.store.working_mut().clear();
        self.store.flush()?;
        Ok(count)
    }

    /// Appends one entry per set piece found in the catalog. Returns the
    /// number added, or `None` for an unknown set.
    pub fn add_set_to_collection(
        &mut self,
        set_name: &str,
        config: SetItemConfig,
    ) -> Result<Option<usize>, CoreError> {
        let Some(set) = self.sets.get(set_name) else {
            return Ok(None);
        };
        let ts = self.store.now_ms();
        let entries: Vec<CollectionEntry> = set
            .items
            .iter()
            .filter_map(|member| {
                let wanted = member.name.to_lowercase();
                self.dataset.items.iter().find(|item| {
                    item.slot == Some(member.slot) && item.name.to_lowercase().contains(&wanted)
                })
            })
            .map(|item| {
                let skill_slot = ItemClass::of(item)
                    .config()
                    .is_some_and(|c| c.skill);
                CollectionEntry {
                    id: item.id.clone(),
                    index: item.index,
                    display_id: item.display_id.clone(),
                    name: item.name.clone(),
                    level: config.level.min(LEVEL_MAX),
                    options: config.options.min(OPTIONS_MAX),
                    luck: config.luck,
                    skill: config.skill && skill_slot,
                    exe_options: Vec::new(),
                    done: false,
                    ts,
                    set: Some(set.name.clone()),
                }
            })
            .collect();

        let added = entries.len();
        self.store.working_mut().extend(entries);
        self.store.flush()?;
        info!("added {added} pieces of {set_name}");
        Ok(Some(added))
    }

    pub fn rename_collection(
        &mut self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<bool, CoreError> {
        self.store.rename(id, name, description)
    }

    pub fn grouped_entries(&self, filter: &EntryFilter) -> GroupedEntries<'_> {
        let visible: Vec<IndexedEntry<'_>> = filter_entries(self.store.working(), filter);
        group_by_sets(&visible, &self.sets, |entry| self.entry_slot(entry))
    }

    /// Installs another dataset under its own scope. The outgoing scope's
    /// working buffer is flushed before the incoming collections load.
    pub fn switch_dataset(&mut self, scope: &str, dataset: Dataset) -> Result<(), CoreError> {
        self.store.switch_scope(self.config.keys(scope))?;
        self.sets = derive_sets(&dataset.items);
        self.dataset = dataset;
        self.scope = scope.to_string();
        self.configurator.clear_item();
        info!("switched to dataset scope {scope}");
        Ok(())
    }

    /// Flushes and returns the storage.
    pub fn shutdown(self) -> Result<S, CoreError> {
        self.store.close()
    }
}
