//! Named collections of saved entries, persisted per dataset scope.
//!
//! One collection is always active. Its entries live in a working buffer that
//! callers edit directly; [`CollectionStore::flush`] writes the buffer back.
//! Switching, deleting, exporting and changing scope flush first.

mod storage;
pub mod view;

use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::entry::{self, CollectionEntry, entries_from_values};
use crate::error::{CoreError, CoreErrorCode};

pub use storage::{FileStorage, MemoryStorage, Storage, StorageKeys};
pub(crate) use storage::{read_json, write_json};

pub const DEFAULT_COLLECTION_NAME: &str = "My Collection";
pub const EXPORT_VERSION: &str = "1.0";

const ID_SUFFIX_LEN: usize = 6;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "entry::lenient::deserialize")]
    pub items: Vec<CollectionEntry>,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

/// The document written by export and accepted by import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEnvelope {
    pub name: String,
    pub description: String,
    pub items: Vec<CollectionEntry>,
    pub exported_at: i64,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub id: String,
    pub imported: usize,
    pub dropped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossCheck {
    pub collection_id: String,
    pub collection_name: String,
    pub would_fit: bool,
    pub reason: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CollectionIndex {
    order: Vec<String>,
    active_id: Option<String>,
}

/// Replaces the entry for the same item, keeping its set tag, or appends.
pub fn upsert_entry(items: &mut Vec<CollectionEntry>, mut entry: CollectionEntry) {
    match items.iter_mut().find(|existing| existing.id == entry.id) {
        Some(existing) => {
            if entry.set.is_none() {
                entry.set = existing.set.take();
            }
            *existing = entry;
        }
        None => items.push(entry),
    }
}

pub struct CollectionStore<S: Storage> {
    storage: S,
    keys: StorageKeys,
    clock: Box<dyn Clock>,
    collections: Vec<Collection>,
    active_id: String,
    working: Vec<CollectionEntry>,
}

impl<S: Storage> CollectionStore<S> {
    /// Loads the scope's collections, creating the default one on first use.
    pub fn open(storage: S, keys: StorageKeys, clock: Box<dyn Clock>) -> Result<Self, CoreError> {
        let mut store = Self {
            storage,
            keys,
            clock,
            collections: Vec::new(),
            active_id: String::new(),
            working: Vec::new(),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&mut self) -> Result<(), CoreError> {
        let index: CollectionIndex = read_json(&self.storage, &self.keys.index()).unwrap_or_default();
        self.collections = index
            .order
            .iter()
            .filter_map(|id| {
                let loaded: Option<Collection> = read_json(&self.storage, &self.keys.collection(id));
                if loaded.is_none() {
                    warn!("collection {id} is listed but unreadable, skipping");
                }
                loaded
            })
            .collect();

        if self.collections.is_empty() {
            let now = self.clock.now_ms();
            let id = self.fresh_id();
            info!("creating default collection {id}");
            self.collections.push(Collection {
                id,
                name: DEFAULT_COLLECTION_NAME.to_string(),
                description: String::new(),
                items: Vec::new(),
                created_at: now,
                updated_at: now,
            });
        }

        self.active_id = index
            .active_id
            .filter(|id| self.position(id).is_some())
            .unwrap_or_else(|| self.collections[0].id.clone());
        self.working = self.active().items.clone();

        for collection in &self.collections {
            write_json(&mut self.storage, &self.keys.collection(&collection.id), collection)?;
        }
        self.persist_index()?;
        debug!(
            "opened {} collections, active {}",
            self.collections.len(),
            self.active_id
        );
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.collections.iter().position(|c| c.id == id)
    }

    fn fresh_id(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let suffix: String = (0..ID_SUFFIX_LEN)
                .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
                .collect();
            let id = format!("{}{suffix}", to_base36(self.clock.now_ms()));
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn persist_index(&mut self) -> Result<(), CoreError> {
        let index = CollectionIndex {
            order: self.collections.iter().map(|c| c.id.clone()).collect(),
            active_id: Some(self.active_id.clone()),
        };
        write_json(&mut self.storage, &self.keys.index(), &index)
    }

    fn persist_collection(&mut self, pos: usize) -> Result<(), CoreError> {
        let key = self.keys.collection(&self.collections[pos].id);
        write_json(&mut self.storage, &key, &self.collections[pos])
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.keys
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn collections(&self) -> &[Collection] {
        &self.collections
    }

    pub fn get(&self, id: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// The stored record of the active collection. Its items lag the working
    /// buffer until the next flush.
    pub fn active(&self) -> &Collection {
        let pos = self.position(&self.active_id).unwrap_or(0);
        &self.collections[pos]
    }

    pub fn working(&self) -> &[CollectionEntry] {
        &self.working
    }

    pub fn working_mut(&mut self) -> &mut Vec<CollectionEntry> {
        &mut self.working
    }

    /// Writes the working buffer into the active collection and persists it.
    pub fn flush(&mut self) -> Result<(), CoreError> {
        let now = self.clock.now_ms();
        let Some(pos) = self.position(&self.active_id) else {
            return Err(CoreError::new(
                CoreErrorCode::InvariantGuard,
                format!("active collection {} is missing", self.active_id),
            ));
        };
        self.collections[pos].items = self.working.clone();
        self.collections[pos].updated_at = now;
        self.persist_collection(pos)
    }

    pub fn create(&mut self, name: &str, description: &str) -> Result<String, CoreError> {
        let name = validated_name(name)?;
        let now = self.clock.now_ms();
        let id = self.fresh_id();
        self.collections.push(Collection {
            id: id.clone(),
            name,
            description: description.trim().to_string(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        let pos = self.collections.len() - 1;
        self.persist_collection(pos)?;
        self.persist_index()?;
        info!("created collection {id}");
        Ok(id)
    }

    /// Returns `Ok(false)` for an unknown id.
    pub fn switch(&mut self, id: &str) -> Result<bool, CoreError> {
        let Some(pos) = self.position(id) else {
            debug!("switch to unknown collection {id} ignored");
            return Ok(false);
        };
        self.flush()?;
        self.active_id = id.to_string();
        self.working = self.collections[pos].items.clone();
        self.persist_index()?;
        info!("switched to collection {id}");
        Ok(true)
    }

    /// Returns `Ok(false)` for an unknown id. The last collection of a scope
    /// cannot be deleted.
    pub fn delete(&mut self, id: &str) -> Result<bool, CoreError> {
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        if self.collections.len() == 1 {
            return Err(CoreError::new(
                CoreErrorCode::InvariantGuard,
                "Cannot delete the last collection.",
            ));
        }

        self.flush()?;
        let removed = self.collections.remove(pos);
        self.storage.remove(&self.keys.collection(&removed.id))?;
        if removed.id == self.active_id {
            self.active_id = self.collections[0].id.clone();
            self.working = self.collections[0].items.clone();
        }
        self.persist_index()?;
        info!("deleted collection {}", removed.id);
        Ok(true)
    }

    pub fn rename(&mut self, id: &str, name: &str, description: &str) -> Result<bool, CoreError> {
        let name = validated_name(name)?;
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        let now = self.clock.now_ms();
        let collection = &mut self.collections[pos];
        collection.name = name;
        collection.description = description.trim().to_string();
        collection.updated_at = now;
        self.persist_collection(pos)?;
        Ok(true)
    }

    pub fn export(&mut self, id: &str) -> Result<Option<ExportEnvelope>, CoreError> {
        if self.position(id).is_none() {
            return Ok(None);
        }
        self.flush()?;
        let exported_at = self.clock.now_ms();
        Ok(self.get(id).map(|c| ExportEnvelope {
            name: c.name.clone(),
            description: c.description.clone(),
            items: c.items.clone(),
            exported_at,
            version: EXPORT_VERSION.to_string(),
        }))
    }

    pub fn export_json(&mut self, id: &str) -> Result<Option<String>, CoreError> {
        let Some(envelope) = self.export(id)? else {
            return Ok(None);
        };
        serde_json::to_string_pretty(&envelope)
            .map(Some)
            .map_err(|e| CoreError::new(CoreErrorCode::Parse, format!("failed to encode export: {e}")))
    }

    /// Creates a new collection from an exported document. The shape is
    /// checked before anything is created; entries that are not objects are
    /// dropped and counted.
    pub fn import(&mut self, json: &str) -> Result<ImportOutcome, CoreError> {
        let doc: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::validation(format!("Invalid collection file: {e}")))?;
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::validation("Invalid collection file: missing name."))?;
        let items = doc
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| CoreError::validation("Invalid collection file: items must be a list."))?;
        let description = doc.get("description").and_then(Value::as_str).unwrap_or_default();

        let (entries, dropped) = entries_from_values(items);
        let id = self.create(name, description)?;
        let imported = entries.len();
        if let Some(pos) = self.position(&id) {
            self.collections[pos].items = entries;
            self.persist_collection(pos)?;
        }
        info!("imported collection {id} with {imported} entries ({dropped} dropped)");
        Ok(ImportOutcome {
            id,
            imported,
            dropped,
        })
    }

    /// Reports, for every collection except the active one, whether an entry
    /// for `item_id` could still be added there.
    pub fn cross_check(&self, item_id: &str) -> Vec<CrossCheck> {
        self.collections
            .iter()
            .filter(|c| c.id != self.active_id)
            .map(|c| {
                let present = c.items.iter().any(|e| e.id == item_id);
                CrossCheck {
                    collection_id: c.id.clone(),
                    collection_name: c.name.clone(),
                    would_fit: !present,
                    reason: if present {
                        "Already in this collection".to_string()
                    } else {
                        "Not in this collection yet".to_string()
                    },
                }
            })
            .collect()
    }

    /// Adds an entry to any collection without changing the active one.
    pub fn add_entry_to(&mut self, id: &str, entry: CollectionEntry) -> Result<bool, CoreError> {
        if id == self.active_id {
            upsert_entry(&mut self.working, entry);
            self.flush()?;
            return Ok(true);
        }
        let Some(pos) = self.position(id) else {
            return Ok(false);
        };
        upsert_entry(&mut self.collections[pos].items, entry);
        self.collections[pos].updated_at = self.clock.now_ms();
        self.persist_collection(pos)?;
        Ok(true)
    }

    /// Flushes the outgoing scope, then loads (or seeds) the incoming one.
    pub fn switch_scope(&mut self, keys: StorageKeys) -> Result<(), CoreError> {
        self.flush()?;
        info!("switching collection scope to {}", keys.index());
        self.keys = keys;
        self.load()
    }

    /// Flushes and hands the storage back.
    pub fn close(mut self) -> Result<S, CoreError> {
        self.flush()?;
        Ok(self.storage)
    }
}

fn validated_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("Please enter a collection name."));
    }
    Ok(name.to_string())
}

fn to_base36(value: i64) -> String {
    let mut n = value.unsigned_abs();
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
