//! Database query functions for the weakly referenced `periods` and
//! `techniques` tables.
//!
//! Deleting a classification nulls the references to it; it never cascades
//! into the schedule.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Period, Technique};

/// Insert a period for `owner_id`.
pub async fn insert_period<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
    name: &str,
    color: Option<&str>,
) -> Result<Period> {
    let period = sqlx::query_as::<_, Period>(
        "INSERT INTO periods (owner_id, name, color) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .bind(color)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert period {name:?}"))?;

    Ok(period)
}

/// Fetch a period by ID.
pub async fn get_period<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Period>> {
    let period = sqlx::query_as::<_, Period>("SELECT * FROM periods WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch period")?;

    Ok(period)
}

/// Find an owner's period by name, creating it when absent.
pub async fn find_or_create_period<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
    name: &str,
) -> Result<Period> {
    // The no-op update makes RETURNING yield the existing row on conflict.
    let period = sqlx::query_as::<_, Period>(
        "INSERT INTO periods (owner_id, name) VALUES ($1, $2) \
         ON CONFLICT (owner_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to find or create period {name:?}"))?;

    Ok(period)
}

/// List an owner's periods by name.
pub async fn list_periods_for_owner<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
) -> Result<Vec<Period>> {
    let periods = sqlx::query_as::<_, Period>(
        "SELECT * FROM periods WHERE owner_id = $1 ORDER BY name ASC",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("failed to list periods")?;

    Ok(periods)
}

/// Delete a period. Weeks referencing it keep their content.
pub async fn delete_period<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM periods WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete period")?;

    Ok(result.rows_affected())
}

/// Find a technique by name, creating it when absent.
pub async fn find_or_create_technique<'e>(db: impl PgExecutor<'e>, name: &str) -> Result<Technique> {
    let technique = sqlx::query_as::<_, Technique>(
        "INSERT INTO techniques (name) VALUES ($1) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING *",
    )
    .bind(name)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to find or create technique {name:?}"))?;

    Ok(technique)
}

/// Fetch a technique by ID.
pub async fn get_technique<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Technique>> {
    let technique = sqlx::query_as::<_, Technique>("SELECT * FROM techniques WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch technique")?;

    Ok(technique)
}

/// List every technique by name.
pub async fn list_techniques<'e>(db: impl PgExecutor<'e>) -> Result<Vec<Technique>> {
    let techniques = sqlx::query_as::<_, Technique>("SELECT * FROM techniques ORDER BY name ASC")
        .fetch_all(db)
        .await
        .context("failed to list techniques")?;

    Ok(techniques)
}
