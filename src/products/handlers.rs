use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::services::AuthUser,
    error::ApiError,
    service::NewProduct,
    state::AppState,
    view::search::filter_products,
};

use super::dto::{CreateProductRequest, ListProductsQuery, ProductResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<ListProductsQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.data.list_products(user_id).await?;
    let products = match q.search.as_deref() {
        Some(query) => filter_products(&products, query),
        None => products,
    };
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    let product = state
        .data
        .create_product(
            user_id,
            NewProduct {
                name: payload.name,
                calories_per_100g: payload.calories_per_100g,
            },
        )
        .await?;

    info!(user_id = %user_id, product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product.into())))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.data.delete_product(user_id, id).await?;
    info!(user_id = %user_id, product_id = %id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
