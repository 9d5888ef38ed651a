use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::store::{Storage, StorageKeys, read_json, write_json};

use super::{Dataset, DatasetProvider, load_dataset};

/// Bumped whenever the shape of `Dataset` changes.
pub const DATASET_CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetSource {
    Cached,
    Fresh,
}

#[derive(Serialize)]
struct CachedDatasetRef<'a> {
    version: u32,
    dataset: &'a Dataset,
}

#[derive(Deserialize)]
struct CachedDataset {
    version: u32,
    dataset: Dataset,
}

pub fn load_cached(storage: &dyn Storage, keys: &StorageKeys) -> Option<Dataset> {
    let cached: CachedDataset = read_json(storage, &keys.dataset())?;
    if cached.version != DATASET_CACHE_VERSION {
        debug!(
            "ignoring dataset cache version {} (want {})",
            cached.version, DATASET_CACHE_VERSION
        );
        return None;
    }
    Some(cached.dataset)
}

pub fn store_cached(
    storage: &mut dyn Storage,
    keys: &StorageKeys,
    dataset: &Dataset,
) -> Result<(), CoreError> {
    write_json(
        storage,
        &keys.dataset(),
        &CachedDatasetRef {
            version: DATASET_CACHE_VERSION,
            dataset,
        },
    )
}

/// Returns the cached dataset for the scope unless `refresh` is set or the
/// cache is missing, stale or corrupt; a fresh load is written back.
pub fn load_dataset_cached(
    storage: &mut dyn Storage,
    keys: &StorageKeys,
    provider: &dyn DatasetProvider,
    refresh: bool,
) -> Result<(Dataset, DatasetSource), CoreError> {
    if !refresh && let Some(dataset) = load_cached(storage, keys) {
        debug!("using cached dataset ({} items)", dataset.len());
        return Ok((dataset, DatasetSource::Cached));
    }

    let dataset = load_dataset(provider)?;
    info!("loaded dataset with {} items", dataset.len());
    if let Err(e) = store_cached(storage, keys, &dataset) {
        warn!("failed to cache dataset: {e}");
    }
    Ok((dataset, DatasetSource::Fresh))
}
