use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A reusable food definition with a calorie rate per 100 g. Immutable once
/// created; there is no update operation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub calories_per_100g: i32,
    pub created_at: OffsetDateTime,
}

pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, user_id, name, calories_per_100g, created_at
        FROM products
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn find_by_id(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, user_id, name, calories_per_100g, created_at
        FROM products
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    name: &str,
    calories_per_100g: i32,
) -> anyhow::Result<Product> {
    let row = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (user_id, name, calories_per_100g)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, name, calories_per_100g, created_at
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(calories_per_100g)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Delete a product owned by the user. Returns whether a row was removed.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM products
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
