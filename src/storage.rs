//! Session key-value store shared with the wizard front end.
//!
//! The wizard writes the gender, analysis type and photos under fixed keys;
//! the analysis step reads them back and stores the derived plan for the
//! improvement page.

use crate::Result;
use crate::errors::PreconditionError;
use crate::logging::*;
use crate::types::{AnalysisMode, AnalysisRequest, AnalysisResult, DataUri, Gender, WorkoutEntry};
use anyhow::Context;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const GENDER_KEY: &str = "physique-gender";
pub const ANALYSIS_TYPE_KEY: &str = "physique-analysis-type";
pub const FRONT_IMAGE_KEY: &str = "physique-front-image";
pub const BACK_IMAGE_KEY: &str = "physique-back-image";
pub const SIDE_IMAGE_KEY: &str = "physique-side-image";
pub const STRENGTHS_KEY: &str = "physique-strengths";
pub const IMPROVEMENTS_KEY: &str = "physique-improvements";
pub const WORKOUT_PLAN_KEY: &str = "physique-workout-plan";

pub const SESSION_KEYS: [&str; 8] = [
    GENDER_KEY,
    ANALYSIS_TYPE_KEY,
    FRONT_IMAGE_KEY,
    BACK_IMAGE_KEY,
    SIDE_IMAGE_KEY,
    STRENGTHS_KEY,
    IMPROVEMENTS_KEY,
    WORKOUT_PLAN_KEY,
];

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store persisted as one JSON object on disk; every write rewrites the
/// whole file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read session file {}", path.display()))?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse session file {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    fn flush(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to write session file {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Stored analysis type, defaulting to full-body when absent or unknown.
pub fn load_mode<S: KeyValueStore + ?Sized>(store: &S) -> AnalysisMode {
    store
        .get(ANALYSIS_TYPE_KEY)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default()
}

pub fn load_request<S: KeyValueStore + ?Sized>(store: &S) -> Result<AnalysisRequest, PreconditionError> {
    let gender: Gender = store
        .get(GENDER_KEY)
        .and_then(|v| v.parse().ok())
        .ok_or(PreconditionError::MissingGender)?;
    let image = |key: &str| store.get(key).map(DataUri::from);

    Ok(AnalysisRequest {
        front: image(FRONT_IMAGE_KEY),
        back: image(BACK_IMAGE_KEY),
        side: image(SIDE_IMAGE_KEY),
        gender,
        mode: load_mode(store),
    })
}

/// Writes the wizard inputs of `request` into the store.
pub fn save_request<S: KeyValueStore + ?Sized>(store: &mut S, request: &AnalysisRequest) -> Result<()> {
    store.set(GENDER_KEY, &request.gender.to_string())?;
    store.set(ANALYSIS_TYPE_KEY, &request.mode.to_string())?;
    let images = [
        (FRONT_IMAGE_KEY, &request.front),
        (BACK_IMAGE_KEY, &request.back),
        (SIDE_IMAGE_KEY, &request.side),
    ];
    for (key, image) in images {
        match image {
            Some(uri) => store.set(key, uri.as_str())?,
            None => store.remove(key)?,
        }
    }
    Ok(())
}

pub fn save_result<S: KeyValueStore + ?Sized>(store: &mut S, result: &AnalysisResult) -> Result<()> {
    let log = DEFAULT.new(o!("function" => "save_result"));
    store.set(STRENGTHS_KEY, &serde_json::to_string(&result.strengths)?)?;
    store.set(IMPROVEMENTS_KEY, &serde_json::to_string(&result.improvements)?)?;
    store.set(WORKOUT_PLAN_KEY, &serde_json::to_string(&result.workout_plan)?)?;
    debug!(log, "result saved";
        "strengths" => result.strengths.len(),
        "improvements" => result.improvements.len(),
        "workout_plan" => result.workout_plan.len(),
    );
    Ok(())
}

/// What the improvement page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedPlan {
    pub mode: AnalysisMode,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub workout_plan: Vec<WorkoutEntry>,
}

fn load_json<S: KeyValueStore + ?Sized, T: DeserializeOwned + Default>(store: &S, key: &str) -> T {
    let log = DEFAULT.new(o!("function" => "load_json", "key" => key.to_string()));
    match store.get(key) {
        Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(log, "ignoring unreadable entry"; "error" => %err);
            T::default()
        }),
        None => T::default(),
    }
}

pub fn load_plan<S: KeyValueStore + ?Sized>(store: &S) -> SavedPlan {
    SavedPlan {
        mode: load_mode(store),
        strengths: load_json(store, STRENGTHS_KEY),
        improvements: load_json(store, IMPROVEMENTS_KEY),
        workout_plan: load_json(store, WORKOUT_PLAN_KEY),
    }
}

pub fn clear_session<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<()> {
    for key in SESSION_KEYS {
        store.remove(key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RatingSet;

    fn sample_result() -> AnalysisResult {
        AnalysisResult {
            overall_score: 78,
            ratings: RatingSet::new(),
            strengths: vec!["Strong back development".to_string()],
            improvements: vec!["Build more chest thickness".to_string()],
            workout_plan: vec![WorkoutEntry::new("Dumbbell Flyes", "3 x 12-15", "Chest")],
            is_fallback: false,
        }
    }

    #[test]
    fn test_load_request_reads_wizard_keys() {
        let mut store = MemoryStore::new();
        store.set(GENDER_KEY, "female").unwrap();
        store.set(ANALYSIS_TYPE_KEY, "upper-body").unwrap();
        store.set(FRONT_IMAGE_KEY, "data:image/png;base64,Rg==").unwrap();
        store.set(BACK_IMAGE_KEY, "data:image/png;base64,Qg==").unwrap();

        let request = load_request(&store).unwrap();
        assert_eq!(request.gender, Gender::Female);
        assert_eq!(request.mode, AnalysisMode::UpperBody);
        assert_eq!(request.front.unwrap().as_str(), "data:image/png;base64,Rg==");
        assert!(request.back.is_some());
        assert!(request.side.is_none());
    }

    #[test]
    fn test_load_request_defaults_mode_and_requires_gender() {
        let mut store = MemoryStore::new();
        assert_eq!(load_request(&store), Err(PreconditionError::MissingGender));

        store.set(GENDER_KEY, "male").unwrap();
        store.set(ANALYSIS_TYPE_KEY, "arms-only").unwrap();
        let request = load_request(&store).unwrap();
        assert_eq!(request.mode, AnalysisMode::FullBody);
        assert!(request.front.is_none());
    }

    #[test]
    fn test_save_and_load_plan() {
        let mut store = MemoryStore::new();
        store.set(ANALYSIS_TYPE_KEY, "upper-body").unwrap();
        save_result(&mut store, &sample_result()).unwrap();

        let plan = load_plan(&store);
        assert_eq!(plan.mode, AnalysisMode::UpperBody);
        assert_eq!(plan.strengths, vec!["Strong back development".to_string()]);
        assert_eq!(plan.workout_plan[0].exercise_name, "Dumbbell Flyes");
        assert_eq!(
            store.get(WORKOUT_PLAN_KEY).unwrap(),
            r#"[{"exercise":"Dumbbell Flyes","sets":"3 x 12-15","focus":"Chest"}]"#
        );
    }

    #[test]
    fn test_corrupt_entries_load_empty() {
        let mut store = MemoryStore::new();
        store.set(STRENGTHS_KEY, "not json").unwrap();
        let plan = load_plan(&store);
        assert!(plan.strengths.is_empty());
        assert!(plan.workout_plan.is_empty());
        assert_eq!(plan.mode, AnalysisMode::FullBody);
    }

    #[test]
    fn test_save_request_round_trips() {
        let mut store = MemoryStore::new();
        store.set(SIDE_IMAGE_KEY, "stale").unwrap();
        let request = AnalysisRequest::new(
            DataUri::new("data:image/png;base64,Rg=="),
            DataUri::new("data:image/png;base64,Qg=="),
            Gender::Male,
            AnalysisMode::UpperBody,
        );
        save_request(&mut store, &request).unwrap();
        assert_eq!(store.get(SIDE_IMAGE_KEY), None);
        assert_eq!(load_request(&store).unwrap(), request);
    }

    #[test]
    fn test_clear_session() {
        let mut store = MemoryStore::new();
        store.set(GENDER_KEY, "male").unwrap();
        save_result(&mut store, &sample_result()).unwrap();
        store.set("unrelated", "kept").unwrap();

        clear_session(&mut store).unwrap();
        for key in SESSION_KEYS {
            assert_eq!(store.get(key), None, "{key}");
        }
        assert_eq!(store.get("unrelated"), Some("kept".to_string()));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set(GENDER_KEY, "female").unwrap();
        save_result(&mut store, &sample_result()).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(GENDER_KEY), Some("female".to_string()));
        assert_eq!(load_plan(&reopened).improvements.len(), 1);

        let mut reopened = reopened;
        reopened.remove(GENDER_KEY).unwrap();
        assert_eq!(FileStore::open(&path).unwrap().get(GENDER_KEY), None);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2").unwrap();
        assert!(FileStore::open(&path).is_err());
    }
}
