use anyhow::Context;
use tracing::{debug, info};
use uuid::Uuid;

use stride_db::models::{MoveUnit, NewLap, RepetitionLap, UnitType};
use stride_db::queries::{laps, move_units};

use super::move_units::lock_unit_session;
use super::{PlanStructureManager, plan_of_session};
use crate::access::Caller;
use crate::error::{EngineError, EngineResult, Entity};
use crate::reps::{RepetitionSpec, generate_repetitions};

impl PlanStructureManager {
    /// Append one lap to a unit.
    pub async fn add_lap(&self, caller: &Caller, unit_id: Uuid, fields: NewLap) -> EngineResult<RepetitionLap> {
        let mut tx = self.begin().await?;

        let unit = lock_unit_session(&mut tx, unit_id).await?;
        let plan = plan_of_session(&mut tx, unit.session_id).await?;
        self.authorize(caller, &plan).await?;
        reject_annotation(&unit)?;

        let number = laps::max_repetition_number(&mut *tx, unit.id).await? + 1;
        let lap = laps::insert_lap(&mut *tx, unit.id, number, &fields).await?;

        tx.commit().await.context("failed to commit lap")?;

        debug!(lap_id = %lap.id, unit_id = %unit.id, number, "lap added");
        Ok(lap)
    }

    /// Delete a lap; later laps of the unit move up.
    pub async fn delete_lap(&self, caller: &Caller, lap_id: Uuid) -> EngineResult<()> {
        let mut tx = self.begin().await?;

        let lap = laps::get_lap(&mut *tx, lap_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Lap, lap_id))?;
        let unit = lock_unit_session(&mut tx, lap.move_unit_id).await?;
        let plan = plan_of_session(&mut tx, unit.session_id).await?;
        self.authorize(caller, &plan).await?;

        if laps::delete_lap(&mut *tx, lap.id).await? == 0 {
            return Err(EngineError::not_found(Entity::Lap, lap.id));
        }
        laps::renumber_laps(&mut *tx, unit.id).await?;

        tx.commit().await.context("failed to commit lap deletion")?;

        debug!(lap_id = %lap.id, unit_id = %unit.id, "lap deleted");
        Ok(())
    }

    /// Generate a repetition sequence and append it to a unit's laps.
    ///
    /// The unit's discipline decides whether values land in meters or
    /// repetitions, whatever class `spec` names.
    pub async fn populate_move_unit(
        &self,
        caller: &Caller,
        unit_id: Uuid,
        spec: RepetitionSpec,
    ) -> EngineResult<Vec<RepetitionLap>> {
        let mut tx = self.begin().await?;

        let unit = lock_unit_session(&mut tx, unit_id).await?;
        let plan = plan_of_session(&mut tx, unit.session_id).await?;
        self.authorize(caller, &plan).await?;
        reject_annotation(&unit)?;

        let mut spec = spec;
        let class = unit.discipline.class();
        if spec.class != class {
            debug!(unit_id = %unit.id, requested = %spec.class, used = %class, "discipline class overridden");
            spec.class = class;
        }

        let existing_max = laps::max_repetition_number(&mut *tx, unit.id).await?;
        let drafts = generate_repetitions(&spec, existing_max)?;

        let mut created = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            created.push(laps::insert_lap(&mut *tx, unit.id, draft.repetition_number, &draft.lap).await?);
        }

        tx.commit().await.context("failed to commit generated laps")?;

        info!(
            unit_id = %unit.id,
            laps = created.len(),
            pattern = %spec.pattern,
            first = existing_max + 1,
            "move unit populated"
        );
        Ok(created)
    }

    /// List a unit's laps in order.
    pub async fn list_laps(&self, unit_id: Uuid) -> EngineResult<Vec<RepetitionLap>> {
        let unit = move_units::get_move_unit(&self.pool, unit_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, unit_id))?;
        Ok(laps::list_laps_for_unit(&self.pool, unit.id).await?)
    }
}

fn reject_annotation(unit: &MoveUnit) -> EngineResult<()> {
    if unit.unit_type == UnitType::Annotation {
        return Err(EngineError::InvalidInput(format!(
            "move unit {} is an annotation and cannot carry laps",
            unit.letter
        )));
    }
    Ok(())
}
