use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::Date;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    changes::{ChangeHub, ChangeKind},
    entries::repo::{self as entries_repo, Entry},
    error::ApiError,
    goals::repo::{self as goals_repo, CalorieGoal},
    helpers,
    products::repo::{self as products_repo, Product},
};

#[cfg(test)]
pub mod fake;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Invalid(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Invalid(msg) => ApiError::Validation(msg.to_string()),
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Other(e) => ApiError::Internal(e),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub calories_per_100g: i32,
}

#[derive(Debug, Clone, Copy)]
pub struct NewEntry {
    pub product_id: Uuid,
    pub grams: i32,
    pub date: Date,
}

#[derive(Debug, Clone)]
pub struct GoalHistory {
    pub current: Option<i32>,
    pub history: Vec<CalorieGoal>,
}

/// The data-access contract consumed by both the HTTP handlers and the view
/// driver. Every operation is scoped to the owning user and may fail; callers
/// surface failure without assuming success first.
#[async_trait]
pub trait DataService: Send + Sync {
    async fn list_products(&self, user_id: Uuid) -> Result<Vec<Product>, ServiceError>;
    async fn create_product(
        &self,
        user_id: Uuid,
        new: NewProduct,
    ) -> Result<Product, ServiceError>;
    async fn delete_product(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError>;

    async fn list_entries(&self, user_id: Uuid, date: Date) -> Result<Vec<Entry>, ServiceError>;
    async fn create_entry(&self, user_id: Uuid, new: NewEntry) -> Result<Entry, ServiceError>;
    async fn delete_entry(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError>;

    async fn goal_for_date(&self, user_id: Uuid, date: Date)
        -> Result<Option<i32>, ServiceError>;
    async fn goal_history(&self, user_id: Uuid) -> Result<GoalHistory, ServiceError>;
    async fn set_goal(&self, user_id: Uuid, value: i32) -> Result<CalorieGoal, ServiceError>;

    /// Subscribe to this user's change notifications. Dropping the receiver
    /// releases the subscription.
    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ChangeKind>;
}

/// Postgres-backed implementation; publishes a change notification after
/// every successful write.
#[derive(Clone)]
pub struct PgDataService {
    db: PgPool,
    changes: ChangeHub,
}

impl PgDataService {
    pub fn new(db: PgPool, changes: ChangeHub) -> Self {
        Self { db, changes }
    }
}

#[async_trait]
impl DataService for PgDataService {
    async fn list_products(&self, user_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        Ok(products_repo::list_by_user(&self.db, user_id).await?)
    }

    async fn create_product(
        &self,
        user_id: Uuid,
        new: NewProduct,
    ) -> Result<Product, ServiceError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Invalid("Product name must not be empty"));
        }
        if new.calories_per_100g <= 0 {
            return Err(ServiceError::Invalid("Calories per 100g must be positive"));
        }

        let product =
            products_repo::insert(&self.db, user_id, name, new.calories_per_100g).await?;
        self.changes.publish(user_id, ChangeKind::Products);
        Ok(product)
    }

    async fn delete_product(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !products_repo::delete(&self.db, user_id, id).await? {
            return Err(ServiceError::NotFound("Product not found"));
        }
        self.changes.publish(user_id, ChangeKind::Products);
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid, date: Date) -> Result<Vec<Entry>, ServiceError> {
        Ok(entries_repo::list_by_user_and_date(&self.db, user_id, date).await?)
    }

    async fn create_entry(&self, user_id: Uuid, new: NewEntry) -> Result<Entry, ServiceError> {
        if new.grams <= 0 {
            return Err(ServiceError::Invalid("Grams must be positive"));
        }

        // Calories are computed here, once, from the product as it exists
        // right now. The stored value never changes afterwards.
        let product = products_repo::find_by_id(&self.db, user_id, new.product_id)
            .await?
            .ok_or(ServiceError::NotFound("Product not found"))?;
        let calories = helpers::compute_calories(product.calories_per_100g, new.grams);

        let entry = entries_repo::insert(
            &self.db,
            user_id,
            product.id,
            &product.name,
            new.grams,
            calories,
            new.date,
        )
        .await?;
        self.changes.publish(user_id, ChangeKind::Entries);
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        if !entries_repo::delete(&self.db, user_id, id).await? {
            return Err(ServiceError::NotFound("Entry not found"));
        }
        self.changes.publish(user_id, ChangeKind::Entries);
        Ok(())
    }

    async fn goal_for_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<i32>, ServiceError> {
        let history = goals_repo::list_by_user(&self.db, user_id).await?;
        Ok(goals_repo::goal_in_effect(&history, date))
    }

    async fn goal_history(&self, user_id: Uuid) -> Result<GoalHistory, ServiceError> {
        let history = goals_repo::list_by_user(&self.db, user_id).await?;
        Ok(GoalHistory {
            current: history.first().map(|g| g.value),
            history,
        })
    }

    async fn set_goal(&self, user_id: Uuid, value: i32) -> Result<CalorieGoal, ServiceError> {
        if value <= 0 {
            return Err(ServiceError::Invalid("Goal must be positive"));
        }
        let goal = goals_repo::insert(&self.db, user_id, value).await?;
        self.changes.publish(user_id, ChangeKind::Goals);
        Ok(goal)
    }

    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ChangeKind> {
        self.changes.subscribe(user_id)
    }
}
