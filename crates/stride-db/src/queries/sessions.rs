//! Database query functions for the `sessions` table.
//!
//! `(day_id, session_number)` is a deferred unique constraint, so numbers
//! may collide mid-transaction as long as they are contiguous at commit.

use anyhow::{Context, Result};
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{NewSession, Session};

/// Insert a session under `day_id` with an explicit number.
pub async fn insert_session<'e>(
    db: impl PgExecutor<'e>,
    day_id: Uuid,
    session_number: i32,
    fields: &NewSession,
) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        "INSERT INTO sessions (day_id, session_number, title, notes, duration_minutes) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(day_id)
    .bind(session_number)
    .bind(&fields.title)
    .bind(&fields.notes)
    .bind(fields.duration_minutes)
    .fetch_one(db)
    .await
    .context("failed to insert session")?;

    Ok(session)
}

/// Fetch a session by ID.
pub async fn get_session<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Session>> {
    let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch session")?;

    Ok(session)
}

/// Fetch and lock a set of sessions, in ascending id order.
pub async fn lock_sessions<'e>(db: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<Session>> {
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE id = ANY($1) ORDER BY id FOR UPDATE",
    )
    .bind(ids)
    .fetch_all(db)
    .await
    .context("failed to lock sessions")?;

    Ok(sessions)
}

/// List a day's sessions in session-number order.
pub async fn list_sessions_for_day<'e>(
    db: impl PgExecutor<'e>,
    day_id: Uuid,
) -> Result<Vec<Session>> {
    let sessions = sqlx::query_as::<_, Session>(
        "SELECT * FROM sessions WHERE day_id = $1 ORDER BY session_number ASC",
    )
    .bind(day_id)
    .fetch_all(db)
    .await
    .context("failed to list sessions for day")?;

    Ok(sessions)
}

/// Count the sessions on a day.
pub async fn count_sessions_for_day<'e>(db: impl PgExecutor<'e>, day_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE day_id = $1")
        .bind(day_id)
        .fetch_one(db)
        .await
        .context("failed to count sessions for day")?;

    Ok(row.0)
}

/// Move a session under `day_id` with a new number.
pub async fn rebind_session<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    day_id: Uuid,
    session_number: i32,
) -> Result<Session> {
    let session = sqlx::query_as::<_, Session>(
        "UPDATE sessions SET day_id = $1, session_number = $2 WHERE id = $3 RETURNING *",
    )
    .bind(day_id)
    .bind(session_number)
    .bind(id)
    .fetch_optional(db)
    .await
    .context("failed to rebind session")?;

    session.with_context(|| format!("session {id} not found"))
}

/// Exchange the parent day and number of two sessions in one statement.
pub async fn swap_sessions<'e>(db: impl PgExecutor<'e>, a: &Session, b: &Session) -> Result<()> {
    let result = sqlx::query(
        "UPDATE sessions SET \
             day_id = CASE WHEN id = $1 THEN $4::uuid ELSE $2::uuid END, \
             session_number = CASE WHEN id = $1 THEN $5::int ELSE $3::int END \
         WHERE id IN ($1, $6)",
    )
    .bind(a.id)
    .bind(a.day_id)
    .bind(a.session_number)
    .bind(b.day_id)
    .bind(b.session_number)
    .bind(b.id)
    .execute(db)
    .await
    .context("failed to swap sessions")?;

    if result.rows_affected() != 2 {
        anyhow::bail!("expected to swap 2 sessions, updated {}", result.rows_affected());
    }

    Ok(())
}

/// Delete a session; move units and laps cascade.
pub async fn delete_session<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete session")?;

    Ok(result.rows_affected())
}

/// Delete every session of a day.
pub async fn delete_sessions_for_day<'e>(db: impl PgExecutor<'e>, day_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE day_id = $1")
        .bind(day_id)
        .execute(db)
        .await
        .context("failed to delete sessions for day")?;

    Ok(result.rows_affected())
}

/// Close gaps in a day's session numbers, preserving their order.
pub async fn renumber_sessions<'e>(db: impl PgExecutor<'e>, day_id: Uuid) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE sessions s SET session_number = r.rn \
         FROM ( \
             SELECT id, ROW_NUMBER() OVER (ORDER BY session_number, created_at)::int AS rn \
             FROM sessions WHERE day_id = $1 \
         ) r \
         WHERE s.id = r.id AND s.session_number <> r.rn",
    )
    .bind(day_id)
    .execute(db)
    .await
    .context("failed to renumber sessions")?;

    Ok(result.rows_affected())
}
