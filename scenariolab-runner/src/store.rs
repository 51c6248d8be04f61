//! Persistence boundary for scenarios and risk-assessment snapshots.
//!
//! `InMemoryScenarioStore` backs tests and one-shot CLI runs;
//! `FileScenarioStore` keeps one pretty-printed JSON document per scenario
//! and per assessment, written through a temp file and renamed into place.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

use scenariolab_core::domain::{RiskAssessment, Scenario, ScenarioId};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid identifier '{0}' for file storage")]
    InvalidId(String),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Storage for scenarios and their latest risk assessment.
pub trait ScenarioStore: Send + Sync {
    fn save_scenario(&self, scenario: &Scenario) -> Result<(), StoreError>;
    fn load_scenario(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError>;
    /// Removes the scenario and its assessment. Returns whether it existed.
    fn delete_scenario(&self, id: &ScenarioId) -> Result<bool, StoreError>;
    /// All stored scenarios, oldest first.
    fn list_scenarios(&self) -> Result<Vec<Scenario>, StoreError>;
    fn save_assessment(&self, assessment: &RiskAssessment) -> Result<(), StoreError>;
    fn load_assessment(&self, id: &ScenarioId) -> Result<Option<RiskAssessment>, StoreError>;
    /// Drops the assessment snapshot only. Returns whether one existed.
    fn delete_assessment(&self, id: &ScenarioId) -> Result<bool, StoreError>;
}

fn sort_oldest_first(scenarios: &mut [Scenario]) {
    scenarios.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

// ─── In-memory ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryScenarioStore {
    scenarios: RwLock<HashMap<ScenarioId, Scenario>>,
    assessments: RwLock<HashMap<ScenarioId, RiskAssessment>>,
}

impl InMemoryScenarioStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScenarioStore for InMemoryScenarioStore {
    fn save_scenario(&self, scenario: &Scenario) -> Result<(), StoreError> {
        let mut map = self.scenarios.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(scenario.id.clone(), scenario.clone());
        Ok(())
    }

    fn load_scenario(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError> {
        let map = self.scenarios.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn delete_scenario(&self, id: &ScenarioId) -> Result<bool, StoreError> {
        let existed = self
            .scenarios
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(id)
            .is_some();
        self.assessments
            .write()
            .map_err(|_| StoreError::Poisoned)?
            .remove(id);
        Ok(existed)
    }

    fn list_scenarios(&self) -> Result<Vec<Scenario>, StoreError> {
        let map = self.scenarios.read().map_err(|_| StoreError::Poisoned)?;
        let mut all: Vec<Scenario> = map.values().cloned().collect();
        sort_oldest_first(&mut all);
        Ok(all)
    }

    fn save_assessment(&self, assessment: &RiskAssessment) -> Result<(), StoreError> {
        let mut map = self.assessments.write().map_err(|_| StoreError::Poisoned)?;
        map.insert(assessment.scenario_id.clone(), assessment.clone());
        Ok(())
    }

    fn load_assessment(&self, id: &ScenarioId) -> Result<Option<RiskAssessment>, StoreError> {
        let map = self.assessments.read().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn delete_assessment(&self, id: &ScenarioId) -> Result<bool, StoreError> {
        let mut map = self.assessments.write().map_err(|_| StoreError::Poisoned)?;
        Ok(map.remove(id).is_some())
    }
}

// ─── JSON files ──────────────────────────────────────────────────────

/// One JSON file per record under `<root>/scenarios` and `<root>/assessments`.
#[derive(Debug, Clone)]
pub struct FileScenarioStore {
    root: PathBuf,
}

impl FileScenarioStore {
    /// Opens (and creates, if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        for sub in ["scenarios", "assessments"] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir, source })?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scenario_path(&self, id: &ScenarioId) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("scenarios").join(file_name(id)?))
    }

    fn assessment_path(&self, id: &ScenarioId) -> Result<PathBuf, StoreError> {
        Ok(self.root.join("assessments").join(file_name(id)?))
    }
}

/// Ids become file names, so anything that could escape the directory is refused.
fn file_name(id: &ScenarioId) -> Result<String, StoreError> {
    let raw = id.as_str();
    if raw.is_empty() || raw == "." || raw == ".." || raw.contains(|c| c == '/' || c == '\\') {
        return Err(StoreError::InvalidId(raw.to_string()));
    }
    Ok(format!("{raw}.json"))
}

fn write_json_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).map_err(|source| StoreError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(serde_json::from_str(&json)?))
}

fn remove_if_exists(path: &Path) -> Result<bool, StoreError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

impl ScenarioStore for FileScenarioStore {
    fn save_scenario(&self, scenario: &Scenario) -> Result<(), StoreError> {
        write_json_atomic(&self.scenario_path(&scenario.id)?, scenario)
    }

    fn load_scenario(&self, id: &ScenarioId) -> Result<Option<Scenario>, StoreError> {
        read_json(&self.scenario_path(id)?)
    }

    fn delete_scenario(&self, id: &ScenarioId) -> Result<bool, StoreError> {
        let existed = remove_if_exists(&self.scenario_path(id)?)?;
        remove_if_exists(&self.assessment_path(id)?)?;
        Ok(existed)
    }

    fn list_scenarios(&self) -> Result<Vec<Scenario>, StoreError> {
        let dir = self.root.join("scenarios");
        let entries = fs::read_dir(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut all = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(scenario) = read_json::<Scenario>(&path)? {
                    all.push(scenario);
                }
            }
        }
        sort_oldest_first(&mut all);
        Ok(all)
    }

    fn save_assessment(&self, assessment: &RiskAssessment) -> Result<(), StoreError> {
        write_json_atomic(&self.assessment_path(&assessment.scenario_id)?, assessment)
    }

    fn load_assessment(&self, id: &ScenarioId) -> Result<Option<RiskAssessment>, StoreError> {
        read_json(&self.assessment_path(id)?)
    }

    fn delete_assessment(&self, id: &ScenarioId) -> Result<bool, StoreError> {
        remove_if_exists(&self.assessment_path(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scenariolab_core::domain::{MarketCondition, RiskMetrics, ScenarioParameters};
    use tempfile::TempDir;

    fn scenario(id: &str) -> Scenario {
        Scenario::new(
            ScenarioId::new(id),
            ScenarioParameters {
                name: id.to_string(),
                description: String::new(),
                duration_days: 1,
                market_conditions: vec![MarketCondition::new("X", 10.0, 0.1, 100)],
                strategies: vec![],
            },
        )
    }

    fn assessment(id: &str) -> RiskAssessment {
        RiskAssessment {
            scenario_id: ScenarioId::new(id),
            metrics: RiskMetrics {
                var95: 0.03,
                ..RiskMetrics::default()
            },
            assessed_at: Utc::now(),
        }
    }

    fn exercise(store: &dyn ScenarioStore) {
        assert!(store.load_scenario(&ScenarioId::new("a")).unwrap().is_none());

        store.save_scenario(&scenario("a")).unwrap();
        store.save_scenario(&scenario("b")).unwrap();
        store.save_assessment(&assessment("a")).unwrap();

        let loaded = store.load_scenario(&ScenarioId::new("a")).unwrap().unwrap();
        assert_eq!(loaded, scenario_with_times(&loaded, "a"));
        assert_eq!(store.list_scenarios().unwrap().len(), 2);
        assert_eq!(
            store
                .load_assessment(&ScenarioId::new("a"))
                .unwrap()
                .unwrap()
                .metrics
                .var95,
            0.03
        );

        store.save_assessment(&assessment("b")).unwrap();
        assert!(store.delete_assessment(&ScenarioId::new("b")).unwrap());
        assert!(!store.delete_assessment(&ScenarioId::new("b")).unwrap());
        assert!(store.load_scenario(&ScenarioId::new("b")).unwrap().is_some());

        assert!(store.delete_scenario(&ScenarioId::new("a")).unwrap());
        assert!(!store.delete_scenario(&ScenarioId::new("a")).unwrap());
        assert!(store.load_assessment(&ScenarioId::new("a")).unwrap().is_none());
        assert_eq!(store.list_scenarios().unwrap().len(), 1);
    }

    /// Rebuild the fixture with the loaded timestamps so equality is structural.
    fn scenario_with_times(loaded: &Scenario, id: &str) -> Scenario {
        let mut expected = scenario(id);
        expected.created_at = loaded.created_at;
        expected.updated_at = loaded.updated_at;
        expected
    }

    #[test]
    fn in_memory_store_roundtrip() {
        exercise(&InMemoryScenarioStore::new());
    }

    #[test]
    fn file_store_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = FileScenarioStore::open(tmp.path()).unwrap();
        exercise(&store);
    }

    #[test]
    fn file_store_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        let store = FileScenarioStore::open(tmp.path()).unwrap();
        store.save_scenario(&scenario("x")).unwrap();
        let names: Vec<String> = fs::read_dir(tmp.path().join("scenarios"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["x.json".to_string()]);
    }

    #[test]
    fn file_store_rejects_path_like_ids() {
        let tmp = TempDir::new().unwrap();
        let store = FileScenarioStore::open(tmp.path()).unwrap();
        for bad in ["", "..", "a/b", "..\\evil"] {
            assert!(matches!(
                store.load_scenario(&ScenarioId::new(bad)),
                Err(StoreError::InvalidId(_))
            ));
        }
    }
}
