//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Plan, PlanKind};

/// Insert a new plan row. Weeks are inserted separately.
pub async fn insert_plan<'e>(
    db: impl PgExecutor<'e>,
    owner_id: Uuid,
    name: &str,
    kind: PlanKind,
    start_date: NaiveDate,
    week_count: i32,
) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (owner_id, name, kind, start_date, week_count) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(owner_id)
    .bind(name)
    .bind(kind)
    .bind(start_date)
    .bind(week_count)
    .fetch_one(db)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch a plan and lock its row until the end of the transaction.
pub async fn lock_plan<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(db)
        .await
        .context("failed to lock plan")?;

    Ok(plan)
}

/// List the plans owned by `owner_id`, newest first.
pub async fn list_plans_for_owner<'e>(db: impl PgExecutor<'e>, owner_id: Uuid) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("failed to list plans for owner")?;

    Ok(plans)
}

/// Delete a plan; weeks and everything below cascade.
pub async fn delete_plan<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("failed to delete plan")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Ancestor lookups (used for access checks on nested entities)
// -----------------------------------------------------------------------

/// Find the plan that owns a week.
pub async fn plan_for_week<'e>(db: impl PgExecutor<'e>, week_id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT p.* FROM plans p \
         JOIN weeks w ON w.plan_id = p.id \
         WHERE w.id = $1",
    )
    .bind(week_id)
    .fetch_optional(db)
    .await
    .context("failed to resolve plan for week")?;

    Ok(plan)
}

/// Find the plan that owns a day.
pub async fn plan_for_day<'e>(db: impl PgExecutor<'e>, day_id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT p.* FROM plans p \
         JOIN weeks w ON w.plan_id = p.id \
         JOIN days d ON d.week_id = w.id \
         WHERE d.id = $1",
    )
    .bind(day_id)
    .fetch_optional(db)
    .await
    .context("failed to resolve plan for day")?;

    Ok(plan)
}

/// Find the plan that owns a session.
pub async fn plan_for_session<'e>(
    db: impl PgExecutor<'e>,
    session_id: Uuid,
) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT p.* FROM plans p \
         JOIN weeks w ON w.plan_id = p.id \
         JOIN days d ON d.week_id = w.id \
         JOIN sessions s ON s.day_id = d.id \
         WHERE s.id = $1",
    )
    .bind(session_id)
    .fetch_optional(db)
    .await
    .context("failed to resolve plan for session")?;

    Ok(plan)
}

/// Find the plan that owns a move unit.
pub async fn plan_for_move_unit<'e>(
    db: impl PgExecutor<'e>,
    move_unit_id: Uuid,
) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>(
        "SELECT p.* FROM plans p \
         JOIN weeks w ON w.plan_id = p.id \
         JOIN days d ON d.week_id = w.id \
         JOIN sessions s ON s.day_id = d.id \
         JOIN move_units u ON u.session_id = s.id \
         WHERE u.id = $1",
    )
    .bind(move_unit_id)
    .fetch_optional(db)
    .await
    .context("failed to resolve plan for move unit")?;

    Ok(plan)
}
