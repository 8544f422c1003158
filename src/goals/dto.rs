use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{goals::repo::CalorieGoal, service::GoalHistory};

#[derive(Debug, Deserialize)]
pub struct CurrentGoalQuery {
    #[serde(default)]
    pub date: Option<Date>,
}

#[derive(Debug, Deserialize)]
pub struct SetGoalRequest {
    pub value: i32,
}

#[derive(Debug, Serialize)]
pub struct CurrentGoalResponse {
    pub value: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub value: i32,
    pub start_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl From<CalorieGoal> for GoalResponse {
    fn from(g: CalorieGoal) -> Self {
        Self {
            id: g.id,
            user_id: g.user_id,
            value: g.value,
            start_date: g.start_date,
            created_at: g.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GoalHistoryResponse {
    pub current: Option<i32>,
    pub history: Vec<GoalResponse>,
}

impl From<GoalHistory> for GoalHistoryResponse {
    fn from(h: GoalHistory) -> Self {
        Self {
            current: h.current,
            history: h.history.into_iter().map(Into::into).collect(),
        }
    }
}
