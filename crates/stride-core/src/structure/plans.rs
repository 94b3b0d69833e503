use anyhow::Context;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use tracing::info;
use uuid::Uuid;

use stride_db::models::{Plan, PlanKind};
use stride_db::queries::{classifications, plans, weeks};

use super::days::claim_day;
use super::{PlanStructureManager, required_name};
use crate::access::Caller;
use crate::config::{MAX_DAYS_PER_WEEK, MAX_WEEK_COUNT};
use crate::error::{EngineError, EngineResult, Entity};
use crate::tree::{self, PlanTree};

/// Parameters of a new plan. The caller becomes its owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlan {
    pub name: String,
    pub kind: PlanKind,
    pub start_date: NaiveDate,
    /// Defaults to the configured span for `kind`.
    #[serde(default)]
    pub week_count: Option<i32>,
    /// Period given to every week.
    #[serde(default)]
    pub period_id: Option<Uuid>,
}

impl PlanStructureManager {
    /// Create a plan with contiguous weeks starting at `start_date`.
    pub async fn create_plan(&self, caller: &Caller, new: NewPlan) -> EngineResult<Plan> {
        let name = required_name("plan", &new.name)?;
        let week_count = new
            .week_count
            .unwrap_or_else(|| self.config.week_count_for(new.kind));
        if !(1..=MAX_WEEK_COUNT).contains(&week_count) {
            return Err(EngineError::InvalidInput(format!(
                "week count must be between 1 and {MAX_WEEK_COUNT}, got {week_count}"
            )));
        }

        let mut tx = self.begin().await?;

        let plan = plans::insert_plan(
            &mut *tx,
            caller.id,
            name,
            new.kind,
            new.start_date,
            week_count,
        )
        .await?;
        let period_id = self.resolve_period(&mut tx, caller.id, new.period_id).await?;
        self.build_weeks(&mut tx, &plan, period_id).await?;

        tx.commit().await.context("failed to commit plan")?;

        info!(
            plan_id = %plan.id,
            kind = %plan.kind,
            weeks = plan.week_count,
            "plan created"
        );
        Ok(plan)
    }

    /// Delete every week of a plan (and their contents) and build them again.
    pub async fn rebuild_plan(&self, caller: &Caller, plan_id: Uuid) -> EngineResult<Plan> {
        let mut tx = self.begin().await?;

        let plan = plans::lock_plan(&mut *tx, plan_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Plan, plan_id))?;
        self.authorize(caller, &plan).await?;

        let existing = weeks::list_weeks_for_plan(&mut *tx, plan.id).await?;
        let kept_period = existing.first().and_then(|w| w.period_id);
        let removed = weeks::delete_weeks_for_plan(&mut *tx, plan.id).await?;

        let period_id = self.resolve_period(&mut tx, plan.owner_id, kept_period).await?;
        self.build_weeks(&mut tx, &plan, period_id).await?;

        tx.commit().await.context("failed to commit plan rebuild")?;

        info!(plan_id = %plan.id, removed, weeks = plan.week_count, "plan rebuilt");
        Ok(plan)
    }

    pub async fn delete_plan(&self, caller: &Caller, plan_id: Uuid) -> EngineResult<()> {
        let mut tx = self.begin().await?;

        let plan = plans::lock_plan(&mut *tx, plan_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Plan, plan_id))?;
        self.authorize(caller, &plan).await?;
        plans::delete_plan(&mut *tx, plan.id).await?;

        tx.commit().await.context("failed to commit plan deletion")?;

        info!(plan_id = %plan.id, "plan deleted");
        Ok(())
    }

    /// Load a plan with its whole hierarchy.
    pub async fn get_plan_tree(&self, plan_id: Uuid) -> EngineResult<PlanTree> {
        let mut conn = self.pool.acquire().await.context("failed to acquire connection")?;
        let plan = plans::get_plan(&mut *conn, plan_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Plan, plan_id))?;
        Ok(tree::load_plan(&mut conn, plan).await?)
    }

    pub async fn list_plans(&self, caller: &Caller) -> EngineResult<Vec<Plan>> {
        Ok(plans::list_plans_for_owner(&self.pool, caller.id).await?)
    }

    async fn resolve_period(
        &self,
        conn: &mut PgConnection,
        owner_id: Uuid,
        requested: Option<Uuid>,
    ) -> EngineResult<Option<Uuid>> {
        if let Some(id) = requested {
            let period = classifications::get_period(&mut *conn, id)
                .await?
                .filter(|p| p.owner_id == owner_id)
                .ok_or_else(|| EngineError::not_found(Entity::Period, id))?;
            return Ok(Some(period.id));
        }
        if !self.config.auto_create_default_period {
            return Ok(None);
        }
        let period =
            classifications::find_or_create_period(&mut *conn, owner_id, &self.config.default_period_name)
                .await?;
        Ok(Some(period.id))
    }

    async fn build_weeks(
        &self,
        conn: &mut PgConnection,
        plan: &Plan,
        period_id: Option<Uuid>,
    ) -> EngineResult<()> {
        for n in 1..=plan.week_count {
            let start = plan.start_date + Duration::weeks(i64::from(n - 1));
            let week = weeks::insert_week(&mut *conn, plan.id, n, start, period_id).await?;
            if self.config.eager_days {
                for offset in 0..MAX_DAYS_PER_WEEK as i64 {
                    claim_day(&mut *conn, plan, &week, start + Duration::days(offset)).await?;
                }
            }
        }
        Ok(())
    }
}
