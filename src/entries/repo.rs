use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A logged meal: a product reference plus quantity, pinned to a calendar
/// date. `product_name` and `calories` are denormalized at creation time so
/// later changes to the product never alter history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub grams: i32,
    pub calories: i32,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

pub async fn list_by_user_and_date(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> anyhow::Result<Vec<Entry>> {
    let rows = sqlx::query_as::<_, Entry>(
        r#"
        SELECT id, user_id, product_id, product_name, grams, calories, date, created_at
        FROM entries
        WHERE user_id = $1 AND date = $2
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

#[allow(clippy::too_many_arguments)]
pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
    product_name: &str,
    grams: i32,
    calories: i32,
    date: Date,
) -> anyhow::Result<Entry> {
    let row = sqlx::query_as::<_, Entry>(
        r#"
        INSERT INTO entries (user_id, product_id, product_name, grams, calories, date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, product_id, product_name, grams, calories, date, created_at
        "#,
    )
    .bind(user_id)
    .bind(product_id)
    .bind(product_name)
    .bind(grams)
    .bind(calories)
    .bind(date)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// Delete an entry owned by the user. Returns whether a row was removed.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM entries
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}
