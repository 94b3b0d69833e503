//! Database query functions for the `days` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Day, StorageZone};

/// Insert a day. The key `(owner_id, day_date, zone)` is unique, so a date
/// already held by the owner in that zone fails.
pub async fn insert_day<'e>(
    db: impl PgExecutor<'e>,
    week_id: Uuid,
    week_number: i32,
    owner_id: Uuid,
    day_date: NaiveDate,
    zone: StorageZone,
) -> Result<Day> {
    let day = sqlx::query_as::<_, Day>(
        "INSERT INTO days (week_id, week_number, owner_id, day_date, zone) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(week_id)
    .bind(week_number)
    .bind(owner_id)
    .bind(day_date)
    .bind(zone)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert day {day_date}"))?;

    Ok(day)
}

/// Fetch a day by ID.
pub async fn get_day<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Day>> {
    let day = sqlx::query_as::<_, Day>("SELECT * FROM days WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch day")?;

    Ok(day)
}

/// Fetch the day holding a given date in an owner's zone, if any.
pub async fn find_day<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
    day_date: NaiveDate,
    zone: StorageZone,
) -> Result<Option<Day>> {
    let day = sqlx::query_as::<_, Day>(
        "SELECT * FROM days WHERE owner_id = $1 AND day_date = $2 AND zone = $3",
    )
    .bind(owner_id)
    .bind(day_date)
    .bind(zone)
    .fetch_optional(db)
    .await
    .context("failed to look up day")?;

    Ok(day)
}

/// Fetch and lock a set of days, in ascending id order.
pub async fn lock_days<'e>(db: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<Day>> {
    let days = sqlx::query_as::<_, Day>(
        "SELECT * FROM days WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("failed to lock days")?;

    Ok(days)
}

/// List a week's days in calendar order.
pub async fn list_days_for_week<'e>(db: impl PgExecutor<'e>, week_id: Uuid) -> Result<Vec<Day>> {
    let days = sqlx::query_as::<_, Day>(
        "SELECT * FROM days WHERE week_id = $1 ORDER BY day_date ASC",
    )
    .bind(week_id)
    .fetch_all(db)
    .await
    .context("failed to list days for week")?;

    Ok(days)
}

/// Move a day under another week, updating its date.
pub async fn rebind_day<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    week_id: Uuid,
    week_number: i32,
    day_date: NaiveDate,
) -> Result<Day> {
    let day = sqlx::query_as::<_, Day>(
        "UPDATE days SET week_id = $1, week_number = $2, day_date = $3 \
         WHERE id = $4 \
         RETURNING *",
    )
    .bind(week_id)
    .bind(week_number)
    .bind(day_date)
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to rebind day")?;

    day.with_context(|| format!("day {id} not found"))
}

/// Delete a day; sessions and below cascade.
pub async fn delete_day<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM days WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete day")?;

    Ok(result.rows_affected())
}
