//! The plan structure manager.
//!
//! Every public operation runs in one transaction: it locks the parent rows
//! it will mutate, re-validates under the lock, authorizes the caller
//! against each plan it writes to, and commits only if every step
//! succeeded. Returning early drops the transaction and rolls back.

mod classifications;
mod days;
mod laps;
mod move_units;
mod plans;
mod sessions;
mod templates;
mod weeks;

use std::sync::Arc;

use anyhow::Context;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use stride_db::models::Plan;
use stride_db::queries::{move_units as unit_queries, plans as plan_queries};

use crate::access::{AccessPolicy, Caller};
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult, Entity};
use crate::ordering::labels_from;

pub use plans::NewPlan;
pub use weeks::WeekCopyMode;

pub struct PlanStructureManager {
    pool: PgPool,
    access: Arc<dyn AccessPolicy>,
    config: EngineConfig,
}

impl PlanStructureManager {
    pub fn new(pool: PgPool, access: Arc<dyn AccessPolicy>, config: EngineConfig) -> Self {
        Self {
            pool,
            access,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn begin(&self) -> EngineResult<Transaction<'static, Postgres>> {
        let tx = self
            .pool
            .begin()
            .await
            .context("failed to begin transaction")?;
        Ok(tx)
    }

    async fn authorize(&self, caller: &Caller, plan: &Plan) -> EngineResult<()> {
        let allowed = self
            .access
            .may_modify(caller, plan)
            .await
            .context("access policy failed")?;
        if !allowed {
            debug!(caller = %caller.id, plan_id = %plan.id, "access denied");
            return Err(EngineError::Forbidden {
                caller: caller.id,
                plan_id: plan.id,
            });
        }
        Ok(())
    }

    /// Authorize against several plans, each once.
    async fn authorize_all(&self, caller: &Caller, plans: &[&Plan]) -> EngineResult<()> {
        let mut seen: Vec<Uuid> = Vec::with_capacity(plans.len());
        for plan in plans {
            if !seen.contains(&plan.id) {
                self.authorize(caller, plan).await?;
                seen.push(plan.id);
            }
        }
        Ok(())
    }
}

async fn plan_of_week(conn: &mut PgConnection, week_id: Uuid) -> EngineResult<Plan> {
    plan_queries::plan_for_week(&mut *conn, week_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::Week, week_id))
}

async fn plan_of_day(conn: &mut PgConnection, day_id: Uuid) -> EngineResult<Plan> {
    plan_queries::plan_for_day(&mut *conn, day_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::Day, day_id))
}

async fn plan_of_session(conn: &mut PgConnection, session_id: Uuid) -> EngineResult<Plan> {
    plan_queries::plan_for_session(&mut *conn, session_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))
}

/// Trimmed non-empty name, or `InvalidInput` naming `what`.
fn required_name<'a>(what: &str, name: &'a str) -> EngineResult<&'a str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(EngineError::InvalidInput(format!("{what} name cannot be empty")));
    }
    Ok(name)
}

/// Sorted, deduplicated ids for lock calls.
fn lock_order(ids: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Write contiguous labels for `units` in the given order.
async fn write_labels(conn: &mut PgConnection, session_id: Uuid, units: &[Uuid]) -> EngineResult<()> {
    for (id, label) in units.iter().zip(labels_from(0, units.len())) {
        unit_queries::set_placement(&mut *conn, *id, session_id, &label).await?;
    }
    Ok(())
}

/// Close label gaps in a session, keeping its current order.
async fn relabel_session(conn: &mut PgConnection, session_id: Uuid) -> EngineResult<()> {
    let units = unit_queries::list_move_units_for_session(&mut *conn, session_id).await?;
    for (unit, label) in units.iter().zip(labels_from(0, units.len())) {
        if unit.letter != label {
            unit_queries::set_placement(&mut *conn, unit.id, session_id, &label).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_order_sorts_and_dedups() {
        let a = Uuid::from_u128(2);
        let b = Uuid::from_u128(1);
        assert_eq!(lock_order([a, b, a]), [b, a]);
    }
}
