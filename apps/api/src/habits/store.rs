//! Habit persistence port. The tracker reads once on init and writes after every mutation.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

use crate::habits::models::Habit;

pub trait HabitStore: Send + Sync {
    fn load(&self) -> Result<Vec<Habit>>;
    fn save(&self, habits: &[Habit]) -> Result<()>;
}

/// Stores the habit list as pretty-printed JSON at `path`.
pub struct JsonFileHabitStore {
    path: PathBuf,
}

impl JsonFileHabitStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HabitStore for JsonFileHabitStore {
    fn load(&self) -> Result<Vec<Habit>> {
        if !self.path.exists() {
            debug!("No habit file at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw)
            .with_context(|| format!("Corrupt habit file {}", self.path.display()))
    }

    fn save(&self, habits: &[Habit]) -> Result<()> {
        let json = serde_json::to_string_pretty(habits)?;
        // write then rename so a crash never leaves a truncated file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Keeps the last saved list in memory.
#[derive(Default)]
pub struct MemoryHabitStore {
    habits: Mutex<Vec<Habit>>,
}

impl MemoryHabitStore {
    pub fn new(initial: Vec<Habit>) -> Self {
        Self {
            habits: Mutex::new(initial),
        }
    }
}

impl HabitStore for MemoryHabitStore {
    fn load(&self) -> Result<Vec<Habit>> {
        let habits = self
            .habits
            .lock()
            .map_err(|_| anyhow::anyhow!("habit store lock poisoned"))?;
        Ok(habits.clone())
    }

    fn save(&self, habits: &[Habit]) -> Result<()> {
        let mut stored = self
            .habits
            .lock()
            .map_err(|_| anyhow::anyhow!("habit store lock poisoned"))?;
        *stored = habits.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn habit(name: &str) -> Habit {
        Habit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
            completions: [NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()].into(),
        }
    }

    #[test]
    fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileHabitStore::new(dir.path().join("habits.json"));
        assert!(store.load().unwrap().is_empty());

        let habits = vec![habit("read"), habit("run")];
        store.save(&habits).unwrap();
        assert_eq!(store.load().unwrap(), habits);
    }

    #[test]
    fn test_json_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(JsonFileHabitStore::new(path).load().is_err());
    }

    #[test]
    fn test_memory_store_returns_last_save() {
        let store = MemoryHabitStore::default();
        store.save(&[habit("stretch")]).unwrap();
        assert_eq!(store.load().unwrap()[0].name, "stretch");
    }
}
