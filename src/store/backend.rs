use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::RwLock;
use tracing::warn;

use crate::config::Settings;

/// Key-value port behind the token store.
///
/// Every operation is infallible from the caller's side: a backend that
/// cannot read or write degrades to `None`/no-op instead of failing, so the
/// auth flows never crash on an unavailable storage medium.
pub trait StoragePort: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Process-local fallback backend.
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl StoragePort for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().ok().and_then(|m| m.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut m) = self.values.write() {
            m.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut m) = self.values.write() {
            m.remove(key);
        }
    }
}

/// Persistent backend: a JSON object of string keys/values on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !path.exists() {
            fs::write(&path, b"{}")?;
        }
        Ok(Self { path })
    }

    fn load(&self) -> HashMap<String, String> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default()
    }

    fn persist(&self, values: &HashMap<String, String>) {
        match serde_json::to_string(values) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    warn!("Failed to persist token file {}: {}", self.path.display(), e);
                }
            }
            Err(e) => warn!("Failed to serialize token file: {}", e),
        }
    }
}

impl StoragePort for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.load().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.load();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.load();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

/// Pick the storage backend for the configured environment: the token file
/// when a path is configured and usable, otherwise in-memory storage.
pub fn select_backend(settings: &Settings) -> Box<dyn StoragePort> {
    if settings.storage.path.is_empty() {
        return Box::new(MemoryStorage::new());
    }
    match FileStorage::open(&settings.storage.path) {
        Ok(backend) => Box::new(backend),
        Err(e) => {
            warn!(
                "Token file {} unavailable, falling back to in-memory tokens: {}",
                settings.storage.path, e
            );
            Box::new(MemoryStorage::new())
        }
    }
}
