mod analysis;
mod auth;
mod config;
mod db;
mod errors;
mod habits;
mod models;
mod papers;
mod routes;
mod state;
mod tailoring;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::habits::{HabitStore, HabitTracker, JsonFileHabitStore, MemoryHabitStore};
use crate::routes::build_router;
use crate::state::AppState;
use crate::tailoring::{
    EnhancementQueue, MemoryEnhancementQueue, MemoryResumeStore, PgResumeStore,
    RedisEnhancementQueue, ResumeStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Coach API v{}", env!("CARGO_PKG_VERSION"));

    // Résumé store: PostgreSQL when configured
    let resumes: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => {
            let pool = create_pool(url, config.db_max_connections).await?;
            Arc::new(PgResumeStore::new(pool).await?)
        }
        None => {
            info!("DATABASE_URL not set, keeping resumes in memory");
            Arc::new(MemoryResumeStore::new())
        }
    };

    // Enhancement queue: Redis when configured
    let enhancer: Arc<dyn EnhancementQueue> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).context("Invalid REDIS_URL")?;
            info!("Redis client initialized");
            Arc::new(RedisEnhancementQueue::new(client))
        }
        None => {
            info!("REDIS_URL not set, enhancement jobs stay in memory");
            Arc::new(MemoryEnhancementQueue::new())
        }
    };

    // Habit tracker: JSON file when configured
    let habit_store: Arc<dyn HabitStore> = match &config.habits_file {
        Some(path) => {
            info!("Persisting habits to {}", path.display());
            Arc::new(JsonFileHabitStore::new(path.clone()))
        }
        None => Arc::new(MemoryHabitStore::default()),
    };
    let habits = Arc::new(HabitTracker::load(habit_store)?);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .user_agent(concat!("coach-api/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState {
        config: config.clone(),
        resumes,
        enhancer,
        habits,
        http,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
