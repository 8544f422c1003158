use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{auth::services::AuthUser, error::ApiError, service::NewEntry, state::AppState};

use super::dto::{CreateEntryRequest, EntryResponse, ListEntriesQuery};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/entries", get(list_entries).post(create_entry))
        .route("/entries/:id", delete(delete_entry))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListEntriesQuery>,
) -> Result<Json<Vec<EntryResponse>>, ApiError> {
    let entries = state.data.list_entries(user_id, q.date).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<EntryResponse>), ApiError> {
    let entry = state
        .data
        .create_entry(
            user_id,
            NewEntry {
                product_id: payload.product_id,
                grams: payload.grams,
                date: payload.date,
            },
        )
        .await?;

    info!(user_id = %user_id, entry_id = %entry.id, calories = entry.calories, "entry created");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.data.delete_entry(user_id, id).await?;
    info!(user_id = %user_id, entry_id = %id, "entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
