//! Habit tracking: state container with an injected persistence port.

pub mod handlers;
pub mod models;
pub mod store;
pub mod tracker;

pub use store::{HabitStore, JsonFileHabitStore, MemoryHabitStore};
pub use tracker::HabitTracker;
