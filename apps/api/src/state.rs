use std::sync::Arc;

use crate::config::Config;
use crate::habits::HabitTracker;
use crate::tailoring::{EnhancementQueue, ResumeStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Postgres-backed when `DATABASE_URL` is set, in-memory otherwise.
    pub resumes: Arc<dyn ResumeStore>,
    /// Redis-backed when `REDIS_URL` is set, in-memory otherwise.
    pub enhancer: Arc<dyn EnhancementQueue>,
    pub habits: Arc<HabitTracker>,
    /// Shared HTTP client for paper searches.
    pub http: reqwest::Client,
}
