use std::{
    collections::{BTreeMap, HashMap},
    future::Future,
    ops::Deref,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::fs::operations::{read_locked, update_locked};

use super::key::StoreKey;

/// A value kept under a [StoreKey]. Serialized untagged, so the file holds plain JSON numbers and
/// strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredValue {
    Int(i64),
    Text(String),
}

/// Interface for abstracting the persisted key-value state.
///
/// Reads never fail: anything absent or of an unexpected type reads as the supplied default.
/// Writes are last-write-wins and visible to the next read.
pub trait KeyValueStore {
    fn get(&self, key: &StoreKey) -> Option<StoredValue>;

    fn put(&self, key: &StoreKey, value: StoredValue) -> impl Future<Output = Result<()>>;

    /// Picks up writes made through other handles to the same storage.
    fn refresh(&self) -> impl Future<Output = Result<()>> {
        async { Ok(()) }
    }

    fn read_int(&self, key: &StoreKey, default: i64) -> i64 {
        match self.get(key) {
            Some(StoredValue::Int(v)) => v,
            Some(StoredValue::Text(v)) => v.parse().unwrap_or_else(|_| {
                warn!("Value {v:?} under {key} isn't an integer");
                default
            }),
            None => default,
        }
    }

    fn read_text(&self, key: &StoreKey, default: &str) -> String {
        match self.get(key) {
            Some(StoredValue::Text(v)) => v,
            Some(StoredValue::Int(v)) => {
                warn!("Expected text under {key}, found {v}");
                default.into()
            }
            None => default.into(),
        }
    }
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &StoreKey) -> Option<StoredValue> {
        self.deref().get(key)
    }

    fn put(&self, key: &StoreKey, value: StoredValue) -> impl Future<Output = Result<()>> {
        self.deref().put(key, value)
    }

    fn refresh(&self) -> impl Future<Output = Result<()>> {
        self.deref().refresh()
    }
}

/// The main realization of [KeyValueStore]. Entries are kept in a single JSON object file and
/// cached in memory. Every write merges into whatever is on disk under an exclusive lock, so
/// several processes can share one file.
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl FileKeyValueStore {
    /// Loads the store from `path`. A missing file is an empty store. A file that can't be parsed
    /// is moved to `<path>.corrupt` and the store starts empty.
    pub async fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = read_locked(&path)
            .await
            .with_context(|| format!("Failed to read store {path:?}"))?;

        let entries = match contents.as_deref().map(parse_entries) {
            None => BTreeMap::new(),
            Some(Ok(entries)) => entries,
            Some(Err(e)) => {
                let aside = set_aside(&path).await?;
                warn!("Store {path:?} is corrupted ({e}), moved it to {aside:?}");
                BTreeMap::new()
            }
        };

        debug!("Loaded {} entries from {path:?}", entries.len());

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, StoredValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_entries(bytes: &[u8]) -> serde_json::Result<BTreeMap<String, StoredValue>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BTreeMap::new());
    }
    serde_json::from_slice(bytes)
}

async fn set_aside(path: &Path) -> Result<PathBuf> {
    let mut aside = path.as_os_str().to_owned();
    aside.push(".corrupt");
    let aside = PathBuf::from(aside);
    tokio::fs::rename(path, &aside).await?;
    Ok(aside)
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &StoreKey) -> Option<StoredValue> {
        self.entries().get(&key.to_string()).cloned()
    }

    async fn put(&self, key: &StoreKey, value: StoredValue) -> Result<()> {
        let mut written = None;
        update_locked(&self.path, |current| {
            let mut entries = match current.map(parse_entries) {
                None => BTreeMap::new(),
                Some(Ok(entries)) => entries,
                Some(Err(e)) => {
                    warn!(
                        "Store {:?} can't be parsed ({e}), rewriting it from memory",
                        self.path
                    );
                    self.entries().clone()
                }
            };
            entries.insert(key.to_string(), value);
            let contents = serde_json::to_vec_pretty(&entries)?;
            written = Some(entries);
            Ok(contents)
        })
        .await
        .with_context(|| format!("Failed to write store {:?}", self.path))?;

        // Only state that reached the disk is cached.
        if let Some(entries) = written {
            *self.entries() = entries;
        }
        debug!("Stored {key}");
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        let contents = read_locked(&self.path)
            .await
            .with_context(|| format!("Failed to read store {:?}", self.path))?;
        match contents.as_deref().map(parse_entries) {
            None => self.entries().clear(),
            Some(Ok(entries)) => *self.entries() = entries,
            Some(Err(e)) => warn!(
                "Store {:?} can't be parsed ({e}), keeping the last known state",
                self.path
            ),
        }
        Ok(())
    }
}

/// Volatile [KeyValueStore], for tests and for embedding the tracker without a file.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, StoredValue>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, StoredValue>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &StoreKey) -> Option<StoredValue> {
        self.entries().get(&key.to_string()).cloned()
    }

    async fn put(&self, key: &StoreKey, value: StoredValue) -> Result<()> {
        self.entries().insert(key.to_string(), value);
        Ok(())
    }
}
