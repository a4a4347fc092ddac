//! Axum route handlers for the Habits API.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::habits::models::{Habit, HabitView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateHabitRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ToggleRequest {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

/// GET /api/v1/habits
pub async fn handle_list_habits(State(state): State<AppState>) -> Json<Vec<HabitView>> {
    Json(state.habits.list(Utc::now().date_naive()).await)
}

/// POST /api/v1/habits
pub async fn handle_create_habit(
    State(state): State<AppState>,
    Json(request): Json<CreateHabitRequest>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let habit = state.habits.add(&request.name).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// POST /api/v1/habits/:id/toggle
///
/// The body is optional; when present it must be a valid `ToggleRequest`.
pub async fn handle_toggle_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<HabitView>, AppError> {
    let today = Utc::now().date_naive();
    let date = parse_toggle_body(&body)?.date.unwrap_or(today);
    let habit = state.habits.toggle(id, date).await?;
    Ok(Json(HabitView::new(habit, today)))
}

/// DELETE /api/v1/habits/:id
pub async fn handle_delete_habit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.habits.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn parse_toggle_body(body: &[u8]) -> Result<ToggleRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ToggleRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("invalid toggle request: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toggle_body_defaults() {
        assert!(parse_toggle_body(b"").unwrap().date.is_none());
        assert!(parse_toggle_body(b"  \n").unwrap().date.is_none());
    }

    #[test]
    fn test_toggle_body_with_date() {
        let request = parse_toggle_body(br#"{"date": "2025-03-04"}"#).unwrap();
        assert_eq!(request.date, NaiveDate::from_ymd_opt(2025, 3, 4));
    }

    #[test]
    fn test_malformed_toggle_body_is_rejected() {
        assert!(matches!(
            parse_toggle_body(b"{\"date\": \"yesterday\"}"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(parse_toggle_body(b"{not json"), Err(AppError::Validation(_))));
    }
}
