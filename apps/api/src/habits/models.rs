use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completions: BTreeSet<NaiveDate>,
}

impl Habit {
    /// Consecutive completed days ending at `today`, or at yesterday if today is not
    /// completed yet.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let mut day = if self.completions.contains(&today) {
            today
        } else {
            match today.checked_sub_days(Days::new(1)) {
                Some(yesterday) => yesterday,
                None => return 0,
            }
        };

        let mut streak = 0;
        while self.completions.contains(&day) {
            streak += 1;
            match day.checked_sub_days(Days::new(1)) {
                Some(previous) => day = previous,
                None => break,
            }
        }
        streak
    }
}

/// A habit as returned to clients, with derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct HabitView {
    #[serde(flatten)]
    pub habit: Habit,
    pub completed_today: bool,
    pub current_streak: u32,
}

impl HabitView {
    pub fn new(habit: Habit, today: NaiveDate) -> Self {
        Self {
            completed_today: habit.completions.contains(&today),
            current_streak: habit.current_streak(today),
            habit,
        }
    }
}
