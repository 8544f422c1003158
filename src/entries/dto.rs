use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::entries::repo::Entry;

#[derive(Debug, Deserialize)]
pub struct ListEntriesQuery {
    pub date: Date,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntryRequest {
    pub product_id: Uuid,
    pub grams: i32,
    pub date: Date,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub grams: i32,
    pub calories: i32,
    pub date: Date,
    pub created_at: OffsetDateTime,
}

impl From<Entry> for EntryResponse {
    fn from(e: Entry) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            product_id: e.product_id,
            product_name: e.product_name,
            grams: e.grams,
            calories: e.calories,
            date: e.date,
            created_at: e.created_at,
        }
    }
}
