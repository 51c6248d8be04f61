//! Per-user alert configuration storage.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use scenariolab_core::domain::{AlertConfiguration, AlertId};

use crate::store::StoreError;

/// Keyed storage of alert configurations, scoped by user id.
///
/// `list` preserves insertion order; `put` replaces an existing entry with
/// the same id in place.
pub trait AlertRepository: Send + Sync {
    fn list(&self, user_id: &str) -> Result<Vec<AlertConfiguration>, StoreError>;
    fn get(&self, user_id: &str, id: &AlertId) -> Result<Option<AlertConfiguration>, StoreError>;
    fn put(&self, user_id: &str, config: AlertConfiguration) -> Result<(), StoreError>;
    /// Returns whether the entry existed.
    fn delete(&self, user_id: &str, id: &AlertId) -> Result<bool, StoreError>;
}

fn upsert(alerts: &mut Vec<AlertConfiguration>, config: AlertConfiguration) {
    match alerts.iter_mut().find(|a| a.id == config.id) {
        Some(existing) => *existing = config,
        None => alerts.push(config),
    }
}

fn remove(alerts: &mut Vec<AlertConfiguration>, id: &AlertId) -> bool {
    let before = alerts.len();
    alerts.retain(|a| &a.id != id);
    alerts.len() != before
}

#[derive(Debug, Default)]
pub struct InMemoryAlertRepository {
    alerts: RwLock<HashMap<String, Vec<AlertConfiguration>>>,
}

impl InMemoryAlertRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertRepository for InMemoryAlertRepository {
    fn list(&self, user_id: &str) -> Result<Vec<AlertConfiguration>, StoreError> {
        let map = self.alerts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(user_id).cloned().unwrap_or_default())
    }

    fn get(&self, user_id: &str, id: &AlertId) -> Result<Option<AlertConfiguration>, StoreError> {
        let map = self.alerts.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map
            .get(user_id)
            .and_then(|alerts| alerts.iter().find(|a| &a.id == id))
            .cloned())
    }

    fn put(&self, user_id: &str, config: AlertConfiguration) -> Result<(), StoreError> {
        let mut map = self.alerts.write().map_err(|_| StoreError::Poisoned)?;
        upsert(map.entry(user_id.to_string()).or_default(), config);
        Ok(())
    }

    fn delete(&self, user_id: &str, id: &AlertId) -> Result<bool, StoreError> {
        let mut map = self.alerts.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get_mut(user_id).is_some_and(|alerts| remove(alerts, id)))
    }
}

type AlertBook = BTreeMap<String, Vec<AlertConfiguration>>;

/// All users' alerts in a single JSON document.
///
/// Every mutation rewrites the whole document (temp file + rename) under a
/// process-local lock.
#[derive(Debug)]
pub struct JsonFileAlertRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileAlertRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<AlertBook, StoreError> {
        if !self.path.exists() {
            return Ok(AlertBook::new());
        }
        let json = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, book: &AlertBook) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(book)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl AlertRepository for JsonFileAlertRepository {
    fn list(&self, user_id: &str) -> Result<Vec<AlertConfiguration>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(user_id).unwrap_or_default())
    }

    fn get(&self, user_id: &str, id: &AlertId) -> Result<Option<AlertConfiguration>, StoreError> {
        Ok(self.list(user_id)?.into_iter().find(|a| &a.id == id))
    }

    fn put(&self, user_id: &str, config: AlertConfiguration) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut book = self.load()?;
        upsert(book.entry(user_id.to_string()).or_default(), config);
        self.save(&book)
    }

    fn delete(&self, user_id: &str, id: &AlertId) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut book = self.load()?;
        let removed = book.get_mut(user_id).is_some_and(|alerts| remove(alerts, id));
        if removed {
            self.save(&book)?;
        }
        Ok(removed)
    }
}
