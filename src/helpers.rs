use time::{Date, Duration, OffsetDateTime};
use uuid::Uuid;

/// Today's calendar date. All dates in the system are UTC; goal lookups and
/// entry dates both rely on this.
pub fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Shift a calendar date by whole days (positive or negative).
pub fn add_days(date: Date, days: i64) -> Date {
    date.saturating_add(Duration::days(days))
}

/// Human-readable date for the tracker header, e.g. "24 August 2026".
pub fn format_display_date(date: Date) -> String {
    format!("{} {} {}", date.day(), date.month(), date.year())
}

pub fn generate_id() -> Uuid {
    Uuid::new_v4()
}

/// Calories for `grams` of a product rated `calories_per_100g` per 100 g.
/// Rounds half up: 0.5 becomes 1. Saturates at `i32::MAX` instead of
/// wrapping when the product exceeds the i32 range.
pub fn compute_calories(calories_per_100g: i32, grams: i32) -> i32 {
    let raw = i64::from(calories_per_100g) * i64::from(grams);
    i32::try_from((raw + 50) / 100).unwrap_or(i32::MAX)
}

/// Thousands-separated rendering for calorie totals, e.g. 12345 -> "12,345".
pub fn format_number(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if n < 0 {
        format!("-{out}")
    } else {
        out
    }
}

/// Limit a string to `max_len` characters, appending an ellipsis when cut.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_len).collect();
    format!("{cut}...")
}
