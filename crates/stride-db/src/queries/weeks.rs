//! Database query functions for the `weeks` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::Week;

/// Insert a week row.
pub async fn insert_week<'e>(
    db: impl PgExecutor<'e>,
    plan_id: Uuid,
    week_number: i32,
    start_date: NaiveDate,
    period_id: Option<Uuid>,
) -> Result<Week> {
    let week = sqlx::query_as::<_, Week>(
        "INSERT INTO weeks (plan_id, week_number, start_date, period_id) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(plan_id)
    .bind(week_number)
    .bind(start_date)
    .bind(period_id)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert week {week_number}"))?;

    Ok(week)
}

/// Fetch a week by ID.
pub async fn get_week<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Week>> {
    let week = sqlx::query_as::<_, Week>("SELECT * FROM weeks WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch week")?;

    Ok(week)
}

/// Fetch and lock a set of weeks, in ascending id order.
///
/// Locking in a fixed order keeps two operations that touch the same pair
/// of weeks from deadlocking.
pub async fn lock_weeks<'e>(db: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<Week>> {
    let weeks = sqlx::query_as::<_, Week>(
        "SELECT * FROM weeks WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("failed to lock weeks")?;

    Ok(weeks)
}

/// List a plan's weeks in week-number order.
pub async fn list_weeks_for_plan<'e>(db: impl PgExecutor<'e>, plan_id: Uuid) -> Result<Vec<Week>> {
    let weeks = sqlx::query_as::<_, Week>(
        "SELECT * FROM weeks WHERE plan_id = $1 ORDER BY week_number ASC",
    )
    .bind(plan_id)
    .fetch_all(db)
    .await
    .context("failed to list weeks for plan")?;

    Ok(weeks)
}

/// Overwrite a week's classification and notes.
pub async fn update_week_details<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    period_id: Option<Uuid>,
    notes: Option<&str>,
) -> Result<Week> {
    let week = sqlx::query_as::<_, Week>(
        "UPDATE weeks SET period_id = $1, notes = $2 WHERE id = $3 RETURNING *",
    )
    .bind(period_id)
    .bind(notes)
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to update week details")?;

    week.with_context(|| format!("week {id} not found"))
}

/// Delete every week of a plan. Days and below cascade.
pub async fn delete_weeks_for_plan<'e>(db: impl PgExecutor<'e>, plan_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM weeks WHERE plan_id = $1")
        .bind(plan_id)
        .execute(db)
        .await
        .context("failed to delete weeks for plan")?;

    Ok(result.rows_affected())
}
