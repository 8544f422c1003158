//! In-memory `DataService` used by view-layer tests, mirroring the Postgres
//! implementation's ordering and validation rules.

use std::sync::Mutex;

use async_trait::async_trait;
use anyhow::anyhow;
use time::{Date, OffsetDateTime};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    changes::{ChangeHub, ChangeKind},
    entries::repo::Entry,
    goals::repo::{goal_in_effect, CalorieGoal},
    helpers,
    products::repo::Product,
};

use super::{DataService, GoalHistory, NewEntry, NewProduct, ServiceError};

#[derive(Default)]
struct Inner {
    products: Vec<Product>,
    entries: Vec<Entry>,
    goals: Vec<CalorieGoal>,
    fail_reads: bool,
    fail_writes: bool,
}

#[derive(Default)]
pub struct InMemoryService {
    inner: Mutex<Inner>,
    changes: ChangeHub,
}

impl InMemoryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read operation fail until further notice.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.lock().unwrap().fail_reads = fail;
    }

    /// Make every write operation fail until further notice.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    pub fn seed_product(&self, user_id: Uuid, name: &str, calories_per_100g: i32) -> Product {
        let product = Product {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            calories_per_100g,
            created_at: OffsetDateTime::now_utc(),
        };
        // Newest first, matching created_at DESC.
        self.inner.lock().unwrap().products.insert(0, product.clone());
        product
    }

    pub fn seed_goal(&self, user_id: Uuid, value: i32, start_date: OffsetDateTime) -> CalorieGoal {
        let goal = CalorieGoal {
            id: Uuid::new_v4(),
            user_id,
            value,
            start_date,
            created_at: start_date,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.goals.push(goal.clone());
        inner.goals.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        goal
    }

    pub fn entry_count(&self, user_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .count()
    }

    pub fn product_count(&self, user_id: Uuid) -> usize {
        self.inner
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| p.user_id == user_id)
            .count()
    }
}

fn read_gate(inner: &Inner) -> Result<(), ServiceError> {
    if inner.fail_reads {
        return Err(ServiceError::Other(anyhow!("injected read failure")));
    }
    Ok(())
}

fn write_gate(inner: &Inner) -> Result<(), ServiceError> {
    if inner.fail_writes {
        return Err(ServiceError::Other(anyhow!("injected write failure")));
    }
    Ok(())
}

#[async_trait]
impl DataService for InMemoryService {
    async fn list_products(&self, user_id: Uuid) -> Result<Vec<Product>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        read_gate(&inner)?;
        Ok(inner
            .products
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
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

        let mut inner = self.inner.lock().unwrap();
        write_gate(&inner)?;
        let product = Product {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            calories_per_100g: new.calories_per_100g,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.products.insert(0, product.clone());
        drop(inner);
        self.changes.publish(user_id, ChangeKind::Products);
        Ok(product)
    }

    async fn delete_product(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        write_gate(&inner)?;
        let before = inner.products.len();
        inner
            .products
            .retain(|p| !(p.id == id && p.user_id == user_id));
        if inner.products.len() == before {
            return Err(ServiceError::NotFound("Product not found"));
        }
        drop(inner);
        self.changes.publish(user_id, ChangeKind::Products);
        Ok(())
    }

    async fn list_entries(&self, user_id: Uuid, date: Date) -> Result<Vec<Entry>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        read_gate(&inner)?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.user_id == user_id && e.date == date)
            .cloned()
            .collect())
    }

    async fn create_entry(&self, user_id: Uuid, new: NewEntry) -> Result<Entry, ServiceError> {
        if new.grams <= 0 {
            return Err(ServiceError::Invalid("Grams must be positive"));
        }

        let mut inner = self.inner.lock().unwrap();
        write_gate(&inner)?;
        let product = inner
            .products
            .iter()
            .find(|p| p.id == new.product_id && p.user_id == user_id)
            .cloned()
            .ok_or(ServiceError::NotFound("Product not found"))?;

        let entry = Entry {
            id: Uuid::new_v4(),
            user_id,
            product_id: product.id,
            product_name: product.name,
            grams: new.grams,
            calories: helpers::compute_calories(product.calories_per_100g, new.grams),
            date: new.date,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.entries.insert(0, entry.clone());
        drop(inner);
        self.changes.publish(user_id, ChangeKind::Entries);
        Ok(entry)
    }

    async fn delete_entry(&self, user_id: Uuid, id: Uuid) -> Result<(), ServiceError> {
        let mut inner = self.inner.lock().unwrap();
        write_gate(&inner)?;
        let before = inner.entries.len();
        inner
            .entries
            .retain(|e| !(e.id == id && e.user_id == user_id));
        if inner.entries.len() == before {
            return Err(ServiceError::NotFound("Entry not found"));
        }
        drop(inner);
        self.changes.publish(user_id, ChangeKind::Entries);
        Ok(())
    }

    async fn goal_for_date(
        &self,
        user_id: Uuid,
        date: Date,
    ) -> Result<Option<i32>, ServiceError> {
        let inner = self.inner.lock().unwrap();
        read_gate(&inner)?;
        let history: Vec<CalorieGoal> = inner
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        Ok(goal_in_effect(&history, date))
    }

    async fn goal_history(&self, user_id: Uuid) -> Result<GoalHistory, ServiceError> {
        let inner = self.inner.lock().unwrap();
        read_gate(&inner)?;
        let history: Vec<CalorieGoal> = inner
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        Ok(GoalHistory {
            current: history.first().map(|g| g.value),
            history,
        })
    }

    async fn set_goal(&self, user_id: Uuid, value: i32) -> Result<CalorieGoal, ServiceError> {
        if value <= 0 {
            return Err(ServiceError::Invalid("Goal must be positive"));
        }
        let mut inner = self.inner.lock().unwrap();
        write_gate(&inner)?;
        let now = OffsetDateTime::now_utc();
        let goal = CalorieGoal {
            id: Uuid::new_v4(),
            user_id,
            value,
            start_date: now,
            created_at: now,
        };
        inner.goals.push(goal.clone());
        inner.goals.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        drop(inner);
        self.changes.publish(user_id, ChangeKind::Goals);
        Ok(goal)
    }

    fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<ChangeKind> {
        self.changes.subscribe(user_id)
    }
}
