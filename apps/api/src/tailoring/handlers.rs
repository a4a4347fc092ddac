//! Axum route handlers for the Résumé and enhancement Jobs APIs.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::keywords::{extract_keywords, KeywordSet};
use crate::auth::AuthenticatedUser;
use crate::errors::AppError;
use crate::models::resume::{ResumeDocument, TailoringMethod};
use crate::state::AppState;
use crate::tailoring::engine::{tailor_resume, TailoringContext};
use crate::tailoring::enhancement::{wait_for_job, EnhancementJob, JobRecord, JobStatus, WaitOutcome};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";
/// Failure reason recorded on jobs cancelled by a résumé deletion.
pub const RESUME_DELETED: &str = "resume deleted before the enhancement finished";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TailorRequest {
    pub job_description: String,
    /// Tailors the stored résumé when absent.
    pub resume: Option<ResumeDocument>,
    pub target_role: Option<String>,
    /// Also queue an AI enhancement job.
    #[serde(default)]
    pub enhance: bool,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub resume: ResumeDocument,
    pub keywords: KeywordSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobStatusParams {
    /// Block up to this long (capped at `JOB_WAIT_TIMEOUT_MS`) while the job is pending.
    pub wait_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub job: JobRecord,
    /// True when a requested wait ran out with the job still pending.
    pub timed_out: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Résumé handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/resume
pub async fn handle_get_resume(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<ResumeDocument>, AppError> {
    state
        .resumes
        .get(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No resume stored for this user".to_string()))
}

/// PUT /api/v1/resume
pub async fn handle_put_resume(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(resume): Json<ResumeDocument>,
) -> Result<Json<ResumeDocument>, AppError> {
    resume.validate().map_err(AppError::Validation)?;
    state.resumes.save(user_id, &resume).await?;
    info!("Stored resume for user {}", user_id);
    Ok(Json(resume))
}

/// DELETE /api/v1/resume
///
/// Also fails the user's pending enhancement jobs so a late result cannot land on a
/// résumé stored afterwards.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<StatusCode, AppError> {
    if !state.resumes.delete(user_id).await? {
        return Err(AppError::NotFound("No resume stored for this user".to_string()));
    }
    if let Err(e) = state.enhancer.cancel_pending(user_id, RESUME_DELETED).await {
        warn!("Could not cancel pending jobs for user {}: {}", user_id, e);
    }
    info!("Deleted resume for user {}", user_id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/resume/tailor
///
/// Keyword fallback tailoring. Always returns the fallback immediately; with
/// `enhance` it also dispatches an AI job that may overwrite the stored résumé later.
pub async fn handle_tailor_resume(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    let base = match request.resume {
        Some(resume) => {
            resume.validate().map_err(AppError::Validation)?;
            resume
        }
        None => state.resumes.get(user_id).await?.ok_or_else(|| {
            AppError::NotFound(
                "No resume stored for this user; supply one in the request".to_string(),
            )
        })?,
    };

    let keywords = extract_keywords(&request.job_description);
    let ctx = TailoringContext {
        job_description: &request.job_description,
        target_role: request.target_role.as_deref(),
        tailored_at: Utc::now(),
    };
    let tailored = tailor_resume(&base, &keywords, &ctx);
    state.resumes.save(user_id, &tailored).await?;
    info!(
        "Tailored resume for user {} with {} keywords",
        user_id,
        keywords.len()
    );

    let job_id = if request.enhance {
        let job = EnhancementJob {
            id: Uuid::new_v4(),
            user_id,
            job_description: request.job_description.clone(),
            resume: tailored.clone(),
            requested_at: ctx.tailored_at,
        };
        // the fallback is already stored; a queue outage only loses the enhancement
        match state.enhancer.dispatch(&job).await {
            Ok(()) => Some(job.id),
            Err(e) => {
                warn!("Enhancement dispatch failed for user {}: {}", user_id, e);
                None
            }
        }
    } else {
        None
    };

    Ok(Json(TailorResponse {
        resume: tailored,
        keywords,
        job_id,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Job handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/jobs/:id?wait_ms=
///
/// Returns the job record. Jobs owned by other users are reported as not found.
pub async fn handle_job_status(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(params): Query<JobStatusParams>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let job = owned_job(&state, id, user_id).await?;

    let wait = params
        .wait_ms
        .map(Duration::from_millis)
        .map(|d| d.min(state.config.job_wait.timeout))
        .filter(|d| !d.is_zero());

    let (job, timed_out) = match wait {
        Some(timeout) if !job.status.is_terminal() => {
            let policy = state.config.job_wait.with_timeout(timeout);
            let outcome =
                wait_for_job(state.enhancer.as_ref(), id, policy, std::future::pending()).await?;
            let timed_out = matches!(outcome, WaitOutcome::TimedOut | WaitOutcome::Cancelled);
            (owned_job(&state, id, user_id).await?, timed_out)
        }
        _ => (job, false),
    };

    Ok(Json(JobStatusResponse { job, timed_out }))
}

/// POST /api/v1/jobs/:id/result
///
/// Worker webhook. Body is the terminal status, e.g.
/// `{"status": "completed", "resume": {...}}` or `{"status": "failed", "error": "..."}`.
/// A completed result replaces the user's stored résumé if one is still stored.
pub async fn handle_job_result(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(status): Json<JobStatus>,
) -> Result<Json<JobRecord>, AppError> {
    if let Some(expected) = state.config.webhook_secret.as_deref() {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if provided != Some(expected) {
            warn!("Rejected job result for {} with a bad webhook secret", id);
            return Err(AppError::Unauthorized);
        }
    }

    let existing = state
        .enhancer
        .fetch(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    if existing.status.is_terminal() {
        return Err(AppError::Conflict(format!("Job {id} already has a result")));
    }

    let status = match status {
        JobStatus::Pending => {
            return Err(AppError::Validation(
                "result status must be completed or failed".to_string(),
            ))
        }
        JobStatus::Completed { mut resume } => {
            resume.validate().map_err(AppError::Validation)?;
            resume.metadata.method = Some(TailoringMethod::AiEnhanced);
            resume.metadata.generated_at.get_or_insert_with(Utc::now);
            JobStatus::Completed { resume }
        }
        failed @ JobStatus::Failed { .. } => failed,
    };

    let record = JobRecord {
        id,
        user_id: existing.user_id,
        status,
        updated_at: Utc::now(),
    };
    if !state.enhancer.finish(&record).await? {
        return Err(AppError::Conflict(format!("Job {id} already has a result")));
    }

    match &record.status {
        JobStatus::Completed { resume } => {
            if state.resumes.replace(record.user_id, resume).await? {
                info!("Job {} completed; stored AI-enhanced resume", id);
            } else {
                info!("Job {} completed after its resume was deleted; not restoring it", id);
            }
        }
        JobStatus::Failed { error } => warn!("Job {} failed: {}", id, error),
        JobStatus::Pending => {}
    }
    Ok(Json(record))
}

async fn owned_job(state: &AppState, id: Uuid, user_id: Uuid) -> Result<JobRecord, AppError> {
    state
        .enhancer
        .fetch(id)
        .await?
        .filter(|job| job.user_id == user_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}
