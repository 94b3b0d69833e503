//! Database query functions for the `repetition_laps` table.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{NewLap, RepetitionLap};

/// Insert a lap with an explicit repetition number.
pub async fn insert_lap<'e>(
    db: impl PgExecutor<'e>,
    move_unit_id: Uuid,
    repetition_number: i32,
    fields: &NewLap,
) -> Result<RepetitionLap> {
    let lap = sqlx::query_as::<_, RepetitionLap>(
        "INSERT INTO repetition_laps \
             (move_unit_id, repetition_number, distance_m, reps, load_kg, \
              pace_seconds, rest_seconds, duration_seconds, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(move_unit_id)
    .bind(repetition_number)
    .bind(fields.distance_m)
    .bind(fields.reps)
    .bind(fields.load_kg)
    .bind(fields.pace_seconds)
    .bind(fields.rest_seconds)
    .bind(fields.duration_seconds)
    .bind(&fields.notes)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert lap {repetition_number}"))?;

    Ok(lap)
}

/// Fetch a lap by ID.
pub async fn get_lap<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<RepetitionLap>> {
    let lap = sqlx::query_as::<_, RepetitionLap>("SELECT * FROM repetition_laps WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch lap")?;

    Ok(lap)
}

/// List a unit's laps in repetition order.
pub async fn list_laps_for_unit<'e>(
    db: impl PgExecutor<'e>,
    move_unit_id: Uuid,
) -> Result<Vec<RepetitionLap>> {
    let laps = sqlx::query_as::<_, RepetitionLap>(
        "SELECT * FROM repetition_laps WHERE move_unit_id = $1 \
         ORDER BY repetition_number ASC",
    )
    .bind(move_unit_id)
    .fetch_all(db)
    .await
    .context("failed to list laps for move unit")?;

    Ok(laps)
}

/// Highest repetition number in a unit, or 0 when it has no laps.
pub async fn max_repetition_number<'e>(db: impl PgExecutor<'e>, move_unit_id: Uuid) -> Result<i32> {
    let row: (i32,) = sqlx::query_as(
        "SELECT COALESCE(MAX(repetition_number), 0) FROM repetition_laps \
         WHERE move_unit_id = $1",
    )
    .bind(move_unit_id)
    .fetch_one(db)
    .await
    .context("failed to read max repetition number")?;

    Ok(row.0)
}

/// Delete a lap.
pub async fn delete_lap<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM repetition_laps WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete lap")?;

    Ok(result.rows_affected())
}

/// Close gaps in a unit's repetition numbers, preserving their order.
pub async fn renumber_laps<'e>(db: impl PgExecutor<'e>, move_unit_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE repetition_laps l SET repetition_number = r.rn \
         FROM ( \
             SELECT id, ROW_NUMBER() OVER (ORDER BY repetition_number)::int AS rn \
             FROM repetition_laps WHERE move_unit_id = $1 \
         ) r \
         WHERE l.id = r.id AND l.repetition_number <> r.rn",
    )
    .bind(move_unit_id)
    .execute(db)
    .await
    .context("failed to renumber laps")?;

    Ok(result.rows_affected())
}
