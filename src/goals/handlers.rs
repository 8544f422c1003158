use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{auth::services::AuthUser, error::ApiError, helpers, state::AppState};

use super::dto::{
    CurrentGoalQuery, CurrentGoalResponse, GoalHistoryResponse, GoalResponse, SetGoalRequest,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/goals", post(set_goal))
        .route("/goals/current", get(current_goal))
        .route("/goals/history", get(goal_history))
}

/// The goal in effect on the given date (today when omitted).
#[instrument(skip(state))]
pub async fn current_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<CurrentGoalQuery>,
) -> Result<Json<CurrentGoalResponse>, ApiError> {
    let date = q.date.unwrap_or_else(helpers::today_utc);
    let value = state.data.goal_for_date(user_id, date).await?;
    Ok(Json(CurrentGoalResponse { value }))
}

#[instrument(skip(state))]
pub async fn goal_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<GoalHistoryResponse>, ApiError> {
    let history = state.data.goal_history(user_id).await?;
    Ok(Json(history.into()))
}

#[instrument(skip(state, payload))]
pub async fn set_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SetGoalRequest>,
) -> Result<(StatusCode, Json<GoalResponse>), ApiError> {
    let goal = state.data.set_goal(user_id, payload.value).await?;
    info!(user_id = %user_id, value = goal.value, "goal set");
    Ok((StatusCode::CREATED, Json(goal.into())))
}
