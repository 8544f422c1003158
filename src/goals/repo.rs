use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// One row of the append-only goal history. Setting a goal inserts a new row;
/// nothing ever mutates or deletes a prior one.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CalorieGoal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub value: i32,
    pub start_date: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

/// Goal history sorted descending by start date, newest first.
pub async fn list_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<CalorieGoal>> {
    let rows = sqlx::query_as::<_, CalorieGoal>(
        r#"
        SELECT id, user_id, value, start_date, created_at
        FROM calorie_goals
        WHERE user_id = $1
        ORDER BY start_date DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn insert(db: &PgPool, user_id: Uuid, value: i32) -> anyhow::Result<CalorieGoal> {
    let row = sqlx::query_as::<_, CalorieGoal>(
        r#"
        INSERT INTO calorie_goals (user_id, value)
        VALUES ($1, $2)
        RETURNING id, user_id, value, start_date, created_at
        "#,
    )
    .bind(user_id)
    .bind(value)
    .fetch_one(db)
    .await?;
    Ok(row)
}

/// The goal in effect on `date`: the first entry of the descending history
/// whose start date (UTC calendar date) is on or before `date`. None when the
/// whole history postdates `date` or is empty.
pub fn goal_in_effect(history: &[CalorieGoal], date: Date) -> Option<i32> {
    history
        .iter()
        .find(|goal| goal.start_date.date() <= date)
        .map(|goal| goal.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn goal(value: i32, start: OffsetDateTime) -> CalorieGoal {
        CalorieGoal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            value,
            start_date: start,
            created_at: start,
        }
    }

    #[test]
    fn goal_history_is_queryable_by_date() {
        // 2000 set on day 1, 1800 on day 5; history descending by start date.
        let history = vec![
            goal(1800, datetime!(2026-08-05 09:00 UTC)),
            goal(2000, datetime!(2026-08-01 12:00 UTC)),
        ];

        assert_eq!(
            goal_in_effect(&history, time::macros::date!(2026 - 08 - 03)),
            Some(2000)
        );
        assert_eq!(
            goal_in_effect(&history, time::macros::date!(2026 - 08 - 06)),
            Some(1800)
        );
    }

    #[test]
    fn goal_set_during_the_day_applies_to_that_whole_day() {
        // Start timestamps are truncated to their UTC calendar date, so a goal
        // set at 23:59 still governs that entire day.
        let history = vec![goal(2200, datetime!(2026-08-10 23:59 UTC))];
        assert_eq!(
            goal_in_effect(&history, time::macros::date!(2026 - 08 - 10)),
            Some(2200)
        );
    }

    #[test]
    fn no_goal_before_the_first_entry() {
        let history = vec![goal(2000, datetime!(2026-08-10 00:00 UTC))];
        assert_eq!(
            goal_in_effect(&history, time::macros::date!(2026 - 08 - 09)),
            None
        );
    }

    #[test]
    fn empty_history_has_no_goal() {
        assert_eq!(
            goal_in_effect(&[], time::macros::date!(2026 - 08 - 24)),
            None
        );
    }
}
