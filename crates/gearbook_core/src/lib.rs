pub mod app;
pub mod catalog;
pub mod class_config;
pub mod classify;
pub mod clock;
pub mod configurator;
pub mod dataset;
pub mod entry;
mod error;
pub mod sets;
pub mod slot;
pub mod store;

pub use app::{AppConfig, AppState, SetItemConfig};
pub use class_config::{EffectKind, ItemClassConfig, Rarity, StoredRarity};
pub use classify::ItemClass;
pub use clock::{Clock, FixedClock, SystemClock};
pub use configurator::{Configurator, ExcellentOptionState, OptionsEffect};
pub use dataset::{CatalogItem, Dataset, DatasetProvider, DatasetSource, FileDatasetProvider};
pub use entry::{CollectionEntry, ExeOptionRecord};
pub use error::{CoreError, CoreErrorCode};
pub use sets::{EquipmentSet, SetMap, SetMember};
pub use slot::Slot;
pub use store::{
    Collection, CollectionStore, CrossCheck, ExportEnvelope, FileStorage, ImportOutcome,
    MemoryStorage, Storage, StorageKeys,
};
