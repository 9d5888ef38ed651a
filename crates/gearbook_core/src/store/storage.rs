use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CoreError;

/// String key/value persistence, shaped after browser `localStorage`.
///
/// A write either fully replaces the previous value or fails; there is no
/// partial-write recovery.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.values.remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            CoreError::storage(format!("failed to create {}: {e}", root.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", percent_encode(key, &['.'])))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::storage(format!(
                "failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| CoreError::storage(format!("failed to write {}: {e}", path.display())))
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::storage(format!(
                "failed to remove {}: {e}",
                path.display()
            ))),
        }
    }
}

/// Key space for one dataset scope. Scopes never share keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    base: String,
}

impl StorageKeys {
    pub fn new(prefix: &str, scope: &str) -> Self {
        Self {
            base: format!("{}.{}", percent_encode(prefix, &[]), percent_encode(scope, &[])),
        }
    }

    pub fn dataset(&self) -> String {
        format!("{}.dataset", self.base)
    }

    pub fn index(&self) -> String {
        format!("{}.collections", self.base)
    }

    pub fn collection(&self, id: &str) -> String {
        format!("{}.collection.{}", self.base, percent_encode(id, &[]))
    }
}

/// Percent-encodes every character outside `[A-Za-z0-9_-]` and `keep`, so
/// distinct inputs never share an encoding.
fn percent_encode(raw: &str, keep: &[char]) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == '-' || c == '_' || keep.contains(&c) {
            out.push(c);
            continue;
        }
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Reads a JSON value; unreadable or malformed data counts as absent.
pub(crate) fn read_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("treating unreadable key {key} as absent: {e}");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("treating malformed data under {key} as absent: {e}");
            None
        }
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    storage: &mut dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let encoded = serde_json::to_string(value)
        .map_err(|e| CoreError::storage(format!("failed to encode {key}: {e}")))?;
    storage.set(key, &encoded)
}
