use anyhow::Context;
use tracing::info;
use uuid::Uuid;

use stride_db::models::{Period, Technique};
use stride_db::queries::classifications;

use super::{PlanStructureManager, required_name};
use crate::access::Caller;
use crate::error::{EngineError, EngineResult, Entity};

impl PlanStructureManager {
    /// Create a period owned by the caller. Names are unique per owner.
    pub async fn create_period(&self, caller: &Caller, name: &str, color: Option<&str>) -> EngineResult<Period> {
        let name = required_name("period", name)?;
        let mut tx = self.begin().await?;

        let existing = classifications::list_periods_for_owner(&mut *tx, caller.id).await?;
        if existing.iter().any(|p| p.name == name) {
            return Err(EngineError::InvalidInput(format!("period {name:?} already exists")));
        }
        let period = classifications::insert_period(&mut *tx, caller.id, name, color).await?;

        tx.commit().await.context("failed to commit period")?;

        info!(period_id = %period.id, name = %period.name, "period created");
        Ok(period)
    }

    pub async fn list_periods(&self, caller: &Caller) -> EngineResult<Vec<Period>> {
        Ok(classifications::list_periods_for_owner(&self.pool, caller.id).await?)
    }

    /// Delete one of the caller's periods. Weeks that used it keep their
    /// content and lose the classification.
    pub async fn delete_period(&self, caller: &Caller, period_id: Uuid) -> EngineResult<()> {
        let period = classifications::get_period(&self.pool, period_id)
            .await?
            .filter(|p| p.owner_id == caller.id)
            .ok_or_else(|| EngineError::not_found(Entity::Period, period_id))?;
        classifications::delete_period(&self.pool, period.id).await?;

        info!(period_id = %period.id, "period deleted");
        Ok(())
    }

    /// Return the technique called `name`, creating it if needed.
    pub async fn ensure_technique(&self, name: &str) -> EngineResult<Technique> {
        let name = required_name("technique", name)?;
        Ok(classifications::find_or_create_technique(&self.pool, name).await?)
    }

    pub async fn list_techniques(&self) -> EngineResult<Vec<Technique>> {
        Ok(classifications::list_techniques(&self.pool).await?)
    }
}
