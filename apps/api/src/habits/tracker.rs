//! Habit tracker — explicit state container over an injected `HabitStore`.
//!
//! Reads once on construction; every mutation writes the full list back before
//! returning. A failed write rolls the in-memory state back.

use std::sync::Arc;

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::habits::models::{Habit, HabitView};
use crate::habits::store::HabitStore;

const MAX_NAME_CHARS: usize = 80;

pub struct HabitTracker {
    habits: Mutex<Vec<Habit>>,
    store: Arc<dyn HabitStore>,
}

impl HabitTracker {
    pub fn load(store: Arc<dyn HabitStore>) -> Result<Self> {
        let habits = store.load()?;
        info!("Loaded {} habits", habits.len());
        Ok(Self {
            habits: Mutex::new(habits),
            store,
        })
    }

    pub async fn list(&self, today: NaiveDate) -> Vec<HabitView> {
        self.habits
            .lock()
            .await
            .iter()
            .cloned()
            .map(|h| HabitView::new(h, today))
            .collect()
    }

    pub async fn add(&self, name: &str) -> Result<Habit, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("habit name cannot be empty".to_string()));
        }
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(AppError::Validation(format!(
                "habit name must be at most {MAX_NAME_CHARS} characters"
            )));
        }

        let habit = Habit {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: Utc::now(),
            completions: Default::default(),
        };
        let created = habit.clone();
        self.mutate(move |habits| {
            habits.push(habit);
            Ok(())
        })
        .await?;
        Ok(created)
    }

    /// Flips completion of habit `id` on `date`; returns the updated habit.
    pub async fn toggle(&self, id: Uuid, date: NaiveDate) -> Result<Habit, AppError> {
        self.mutate(|habits| {
            let habit = habits
                .iter_mut()
                .find(|h| h.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Habit {id} not found")))?;
            if !habit.completions.remove(&date) {
                habit.completions.insert(date);
            }
            Ok(habit.clone())
        })
        .await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.mutate(|habits| {
            let before = habits.len();
            habits.retain(|h| h.id != id);
            if habits.len() == before {
                return Err(AppError::NotFound(format!("Habit {id} not found")));
            }
            Ok(())
        })
        .await
    }

    /// Applies `change` to a working copy, persists it on the blocking pool, then commits it.
    async fn mutate<T, F>(&self, change: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Vec<Habit>) -> Result<T, AppError>,
    {
        let mut habits = self.habits.lock().await;
        let mut working = habits.clone();
        let output = change(&mut working)?;

        let store = Arc::clone(&self.store);
        let saved = tokio::task::spawn_blocking(move || store.save(&working).map(|()| working))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Habit save task failed: {e}")))?
            .map_err(AppError::Internal)?;
        *habits = saved;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::store::{JsonFileHabitStore, MemoryHabitStore};

    struct FailingStore;

    impl HabitStore for FailingStore {
        fn load(&self) -> Result<Vec<Habit>> {
            Ok(Vec::new())
        }

        fn save(&self, _habits: &[Habit]) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    /// Remembers which thread each save ran on.
    #[derive(Default)]
    struct ThreadRecordingStore {
        save_threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl HabitStore for ThreadRecordingStore {
        fn load(&self) -> Result<Vec<Habit>> {
            Ok(Vec::new())
        }

        fn save(&self, _habits: &[Habit]) -> Result<()> {
            self.save_threads
                .lock()
                .unwrap()
                .push(std::thread::current().id());
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_mutations_write_through() {
        let store = Arc::new(MemoryHabitStore::default());
        let tracker = HabitTracker::load(store.clone()).unwrap();

        let habit = tracker.add("Read 10 pages").await.unwrap();
        assert_eq!(store.load().unwrap().len(), 1);

        tracker.toggle(habit.id, today()).await.unwrap();
        assert!(store.load().unwrap()[0].completions.contains(&today()));

        tracker.remove(habit.id).await.unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reads_existing_state_on_init() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("habits.json");

        let first = HabitTracker::load(Arc::new(JsonFileHabitStore::new(&path))).unwrap();
        let habit = first.add("Meditate").await.unwrap();
        first.toggle(habit.id, today()).await.unwrap();

        let second = HabitTracker::load(Arc::new(JsonFileHabitStore::new(&path))).unwrap();
        let views = second.list(today()).await;
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].habit.name, "Meditate");
        assert!(views[0].completed_today);
        assert_eq!(views[0].current_streak, 1);
    }

    #[tokio::test]
    async fn test_toggle_twice_clears_completion() {
        let tracker = HabitTracker::load(Arc::new(MemoryHabitStore::default())).unwrap();
        let habit = tracker.add("Run").await.unwrap();
        tracker.toggle(habit.id, today()).await.unwrap();
        let toggled = tracker.toggle(habit.id, today()).await.unwrap();
        assert!(toggled.completions.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let tracker = HabitTracker::load(Arc::new(FailingStore)).unwrap();
        let result = tracker.add("Journal").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(tracker.list(today()).await.is_empty());
    }

    #[tokio::test]
    async fn test_validation_and_not_found() {
        let tracker = HabitTracker::load(Arc::new(MemoryHabitStore::default())).unwrap();
        assert!(matches!(tracker.add("   ").await, Err(AppError::Validation(_))));
        assert!(matches!(
            tracker.add(&"x".repeat(81)).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            tracker.toggle(Uuid::new_v4(), today()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            tracker.remove(Uuid::new_v4()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_saves_run_off_the_runtime_thread() {
        let store = Arc::new(ThreadRecordingStore::default());
        let tracker = HabitTracker::load(store.clone()).unwrap();
        tracker.add("Stretch").await.unwrap();

        let threads = store.save_threads.lock().unwrap().clone();
        assert_eq!(threads.len(), 1);
        assert_ne!(threads[0], std::thread::current().id());
    }
}
