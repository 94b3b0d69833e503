//! Database query functions for the `move_units` table.
//!
//! Letters sort by `(length(letter), letter)`, which matches position order
//! for bijective base-26 labels ("Z" before "AA").

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{MoveUnit, NewMoveUnit, WorkType};

/// Insert a move unit under `session_id` with an explicit letter.
pub async fn insert_move_unit<'e>(
    db: impl PgExecutor<'e>,
    session_id: Uuid,
    letter: &str,
    fields: &NewMoveUnit,
) -> Result<MoveUnit> {
    let unit = sqlx::query_as::<_, MoveUnit>(
        "INSERT INTO move_units \
             (session_id, letter, discipline, unit_type, work_type, description, technique_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(session_id)
    .bind(letter)
    .bind(fields.discipline)
    .bind(fields.unit_type)
    .bind(fields.work_type)
    .bind(&fields.description)
    .bind(fields.technique_id)
    .fetch_one(db)
    .await
    .with_context(|| format!("failed to insert move unit {letter}"))?;

    Ok(unit)
}

/// Fetch a move unit by ID.
pub async fn get_move_unit<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<MoveUnit>> {
    let unit = sqlx::query_as::<_, MoveUnit>("SELECT * FROM move_units WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch move unit")?;

    Ok(unit)
}

/// Fetch a set of move units by ID (order unspecified).
pub async fn get_move_units<'e>(db: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<MoveUnit>> {
    let units = sqlx::query_as::<_, MoveUnit>("SELECT * FROM move_units WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await
        .context("failed to fetch move units")?;

    Ok(units)
}

/// List a session's move units in letter order.
pub async fn list_move_units_for_session<'e>(
    db: impl PgExecutor<'e>,
    session_id: Uuid,
) -> Result<Vec<MoveUnit>> {
    let units = sqlx::query_as::<_, MoveUnit>(
        "SELECT * FROM move_units WHERE session_id = $1 \
         ORDER BY length(letter) ASC, letter ASC",
    )
    .bind(session_id)
    .fetch_all(db)
    .await
    .context("failed to list move units for session")?;

    Ok(units)
}

/// Set a unit's parent session and letter.
pub async fn set_placement<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    session_id: Uuid,
    letter: &str,
) -> Result<()> {
    let result = sqlx::query("UPDATE move_units SET session_id = $1, letter = $2 WHERE id = $3")
        .bind(session_id)
        .bind(letter)
        .bind(id)
        .execute(db)
        .await
        .context("failed to place move unit")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("move unit {id} not found");
    }

    Ok(())
}

/// Set or clear a unit's work type.
pub async fn set_work_type<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    work_type: Option<WorkType>,
) -> Result<()> {
    let result = sqlx::query("UPDATE move_units SET work_type = $1 WHERE id = $2")
        .bind(work_type)
        .bind(id)
        .execute(db)
        .await
        .context("failed to set work type")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("move unit {id} not found");
    }

    Ok(())
}

/// Clear the work type of every listed unit.
pub async fn clear_work_types<'e>(db: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<u64> {
    let result = sqlx::query("UPDATE move_units SET work_type = NULL WHERE id = ANY($1)")
        .bind(ids)
        .execute(db)
        .await
        .context("failed to clear work types")?;

    Ok(result.rows_affected())
}

/// Delete a move unit; its laps cascade.
pub async fn delete_move_unit<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM move_units WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete move unit")?;

    Ok(result.rows_affected())
}
