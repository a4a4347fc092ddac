pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::habits::handlers as habits;
use crate::papers::handlers as papers;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Text analysis
        .route("/api/v1/keywords", post(analysis::handle_extract_keywords))
        .route("/api/v1/cluster", post(analysis::handle_cluster))
        .route("/api/v1/summarize", post(analysis::handle_summarize))
        // Résumé + enhancement jobs
        .route(
            "/api/v1/resume",
            get(tailoring::handle_get_resume)
                .put(tailoring::handle_put_resume)
                .delete(tailoring::handle_delete_resume),
        )
        .route("/api/v1/resume/tailor", post(tailoring::handle_tailor_resume))
        .route("/api/v1/jobs/:id", get(tailoring::handle_job_status))
        .route("/api/v1/jobs/:id/result", post(tailoring::handle_job_result))
        // Papers
        .route("/api/v1/papers/search", get(papers::handle_search_papers))
        .route("/api/v1/papers/cluster", post(papers::handle_cluster_papers))
        // Habits
        .route(
            "/api/v1/habits",
            get(habits::handle_list_habits).post(habits::handle_create_habit),
        )
        .route("/api/v1/habits/:id/toggle", post(habits::handle_toggle_habit))
        .route("/api/v1/habits/:id", delete(habits::handle_delete_habit))
        .with_state(state)
}
