use std::collections::HashSet;

use anyhow::Context;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use stride_db::models::{MoveUnit, NewMoveUnit, Session, WorkType};
use stride_db::queries::{classifications, move_units, sessions};

use super::{PlanStructureManager, lock_order, plan_of_session, relabel_session, write_labels};
use crate::access::Caller;
use crate::conflict::{self, UnitAction, UnitPlacement};
use crate::duplicate;
use crate::error::{EngineError, EngineResult, Entity};
use crate::ordering::{compare_labels, labels_from, position_to_label};
use crate::summary::MoveUnitSummary;
use crate::tree;

impl PlanStructureManager {
    /// Append a new unit to a session.
    pub async fn add_move_unit(
        &self,
        caller: &Caller,
        session_id: Uuid,
        fields: NewMoveUnit,
    ) -> EngineResult<MoveUnit> {
        let mut tx = self.begin().await?;

        let session = lock_session(&mut tx, session_id).await?;
        let plan = plan_of_session(&mut tx, session.id).await?;
        self.authorize(caller, &plan).await?;

        if let Some(technique_id) = fields.technique_id {
            classifications::get_technique(&mut *tx, technique_id)
                .await?
                .ok_or_else(|| EngineError::not_found(Entity::Technique, technique_id))?;
        }
        let siblings = move_units::list_move_units_for_session(&mut *tx, session.id).await?;
        if let Some(wt) = fields.work_type {
            if let Some(holder) = siblings.iter().find(|u| u.work_type == Some(wt)) {
                return Err(EngineError::InvalidInput(format!(
                    "move unit {} is already the session's {wt} unit",
                    holder.letter
                )));
            }
        }
        let letter = position_to_label(siblings.len());
        let unit = move_units::insert_move_unit(&mut *tx, session.id, &letter, &fields).await?;

        tx.commit().await.context("failed to commit move unit")?;

        info!(unit_id = %unit.id, session_id = %session.id, letter = %unit.letter, "move unit added");
        Ok(unit)
    }

    /// Delete a unit and its laps; later units of the session move up.
    pub async fn delete_move_unit(&self, caller: &Caller, unit_id: Uuid) -> EngineResult<()> {
        let mut tx = self.begin().await?;

        let unit = lock_unit_session(&mut tx, unit_id).await?;
        let plan = plan_of_session(&mut tx, unit.session_id).await?;
        self.authorize(caller, &plan).await?;

        move_units::delete_move_unit(&mut *tx, unit.id).await?;
        relabel_session(&mut tx, unit.session_id).await?;

        tx.commit().await.context("failed to commit move unit deletion")?;

        info!(unit_id = %unit.id, session_id = %unit.session_id, "move unit deleted");
        Ok(())
    }

    /// Set or clear a unit's work type. Setting one takes it from whichever
    /// sibling held it.
    pub async fn set_work_type(
        &self,
        caller: &Caller,
        unit_id: Uuid,
        work_type: Option<WorkType>,
    ) -> EngineResult<MoveUnit> {
        let mut tx = self.begin().await?;

        let unit = lock_unit_session(&mut tx, unit_id).await?;
        let plan = plan_of_session(&mut tx, unit.session_id).await?;
        self.authorize(caller, &plan).await?;

        if let Some(wt) = work_type {
            let holders: Vec<Uuid> = move_units::list_move_units_for_session(&mut *tx, unit.session_id)
                .await?
                .into_iter()
                .filter(|u| u.id != unit.id && u.work_type == Some(wt))
                .map(|u| u.id)
                .collect();
            if !holders.is_empty() {
                move_units::clear_work_types(&mut *tx, &holders).await?;
                debug!(work_type = %wt, cleared = holders.len(), "work type taken from sibling");
            }
        }
        move_units::set_work_type(&mut *tx, unit.id, work_type).await?;
        let updated = move_units::get_move_unit(&mut *tx, unit.id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, unit.id))?;

        tx.commit().await.context("failed to commit work type")?;
        Ok(updated)
    }

    /// Move or copy an ordered batch of units into a session.
    ///
    /// The batch lands contiguously at `placement` and every affected
    /// session is relabeled `A, B, C, ...`. A work type the target already
    /// holds is cleared on the incoming unit. [`UnitPlacement::Replace`]
    /// deletes the reference unit and needs `confirmed`.
    pub async fn move_or_copy_move_units(
        &self,
        caller: &Caller,
        unit_ids: &[Uuid],
        target_session_id: Uuid,
        placement: UnitPlacement,
        action: UnitAction,
        confirmed: bool,
    ) -> EngineResult<Vec<MoveUnitSummary>> {
        if unit_ids.is_empty() {
            return Err(EngineError::InvalidInput("no move units given".to_owned()));
        }
        let distinct: HashSet<Uuid> = unit_ids.iter().copied().collect();
        if distinct.len() != unit_ids.len() {
            return Err(EngineError::InvalidInput(
                "a move unit is listed more than once".to_owned(),
            ));
        }

        let mut tx = self.begin().await?;

        let seen = load_batch(&mut tx, unit_ids).await?;
        let session_ids = lock_order(
            seen.iter()
                .map(|u| u.session_id)
                .chain(std::iter::once(target_session_id)),
        );
        let locked = sessions::lock_sessions(&mut *tx, &session_ids).await?;
        if !locked.iter().any(|s| s.id == target_session_id) {
            return Err(EngineError::not_found(Entity::Session, target_session_id));
        }
        let batch = load_batch(&mut tx, unit_ids).await?;
        if batch.iter().zip(&seen).any(|(now, before)| now.session_id != before.session_id) {
            return Err(EngineError::InvalidPosition(
                "a move unit changed session while being placed".to_owned(),
            ));
        }

        let source_sessions = lock_order(
            batch
                .iter()
                .map(|u| u.session_id)
                .filter(|id| *id != target_session_id),
        );
        let mut plans = vec![plan_of_session(&mut tx, target_session_id).await?];
        if action == UnitAction::Move {
            for session_id in &source_sessions {
                plans.push(plan_of_session(&mut tx, *session_id).await?);
            }
        }
        self.authorize_all(caller, &plans.iter().collect::<Vec<_>>()).await?;

        let target_units = move_units::list_move_units_for_session(&mut *tx, target_session_id).await?;
        let mut remaining: Vec<MoveUnit> = match action {
            UnitAction::Move => target_units
                .into_iter()
                .filter(|u| !distinct.contains(&u.id))
                .collect(),
            UnitAction::Copy => target_units,
        };

        let insertion = conflict::locate_insertion(&remaining, unit_ids, placement)?;
        if let Some(replaced_id) = insertion.replaces {
            let replaced = &remaining[insertion.index];
            if !confirmed {
                let summary = MoveUnitSummary::load(&mut tx, replaced).await?;
                return Err(EngineError::ConflictRequiresConfirmation {
                    existing: summary.describe(),
                });
            }
            move_units::delete_move_unit(&mut *tx, replaced_id).await?;
            debug!(unit_id = %replaced_id, "replaced target unit");
            remaining.remove(insertion.index);
        }

        let kept = conflict::reconcile_work_types(remaining.iter().filter_map(|u| u.work_type), &batch);

        let placed: Vec<Uuid> = match action {
            UnitAction::Move => {
                let ids: Vec<Uuid> = batch.iter().map(|u| u.id).collect();
                move_units::clear_work_types(&mut *tx, &ids).await?;

                let order: Vec<Uuid> = remaining[..insertion.index]
                    .iter()
                    .map(|u| u.id)
                    .chain(ids.iter().copied())
                    .chain(remaining[insertion.index..].iter().map(|u| u.id))
                    .collect();
                write_labels(&mut tx, target_session_id, &order).await?;

                for (unit, work_type) in batch.iter().zip(&kept) {
                    if work_type.is_some() {
                        move_units::set_work_type(&mut *tx, unit.id, *work_type).await?;
                    }
                }

                for session_id in &source_sessions {
                    relabel_session(&mut tx, *session_id).await?;
                }
                ids
            }
            UnitAction::Copy => {
                let mut trees = Vec::with_capacity(batch.len());
                for unit in &batch {
                    trees.push(tree::load_unit(&mut tx, unit.clone()).await?);
                }

                let before: Vec<Uuid> = remaining[..insertion.index].iter().map(|u| u.id).collect();
                let after: Vec<Uuid> = remaining[insertion.index..].iter().map(|u| u.id).collect();
                write_labels(&mut tx, target_session_id, &before).await?;
                for (id, label) in after.iter().zip(labels_from(before.len() + batch.len(), after.len())) {
                    move_units::set_placement(&mut *tx, *id, target_session_id, &label).await?;
                }

                let mut ids = Vec::with_capacity(trees.len());
                let labels = labels_from(before.len(), trees.len());
                for ((source, work_type), label) in trees.iter().zip(&kept).zip(labels) {
                    let copy =
                        duplicate::duplicate_move_unit(&mut tx, source, target_session_id, &label, *work_type)
                            .await?;
                    ids.push(copy.id);
                }
                ids
            }
        };

        let mut summaries = Vec::with_capacity(placed.len());
        for unit in move_units::get_move_units(&mut *tx, &placed).await? {
            summaries.push(MoveUnitSummary::load(&mut tx, &unit).await?);
        }
        summaries.sort_by(|a, b| compare_labels(&a.letter, &b.letter));

        tx.commit().await.context("failed to commit move unit placement")?;

        info!(
            target_session_id = %target_session_id,
            units = summaries.len(),
            ?action,
            ?placement,
            "move units placed"
        );
        Ok(summaries)
    }

    /// Exchange the session and label of two units.
    pub async fn switch_move_units(
        &self,
        caller: &Caller,
        a_id: Uuid,
        b_id: Uuid,
    ) -> EngineResult<(MoveUnitSummary, MoveUnitSummary)> {
        if a_id == b_id {
            return Err(EngineError::InvalidPosition(
                "cannot switch a move unit with itself".to_owned(),
            ));
        }

        let mut tx = self.begin().await?;

        let seen = load_batch(&mut tx, &[a_id, b_id]).await?;
        let locked = sessions::lock_sessions(&mut *tx, &lock_order(seen.iter().map(|u| u.session_id))).await?;
        let units = load_batch(&mut tx, &[a_id, b_id]).await?;
        if units.iter().any(|u| !locked.iter().any(|s| s.id == u.session_id)) {
            return Err(EngineError::InvalidPosition(
                "a move unit changed session while being switched".to_owned(),
            ));
        }
        let (a, b) = (&units[0], &units[1]);

        let plan_a = plan_of_session(&mut tx, a.session_id).await?;
        let plan_b = plan_of_session(&mut tx, b.session_id).await?;
        self.authorize_all(caller, &[&plan_a, &plan_b]).await?;

        move_units::clear_work_types(&mut *tx, &[a.id, b.id]).await?;
        move_units::set_placement(&mut *tx, a.id, b.session_id, &b.letter).await?;
        move_units::set_placement(&mut *tx, b.id, a.session_id, &a.letter).await?;

        for (unit, session_id) in [(a, b.session_id), (b, a.session_id)] {
            let Some(wt) = unit.work_type else { continue };
            let held = move_units::list_move_units_for_session(&mut *tx, session_id)
                .await?
                .iter()
                .any(|u| u.id != unit.id && u.work_type == Some(wt));
            if held {
                debug!(unit_id = %unit.id, work_type = %wt, "clearing work type already held in target");
            } else {
                move_units::set_work_type(&mut *tx, unit.id, Some(wt)).await?;
            }
        }

        let a_summary = unit_summary(&mut tx, a.id).await?;
        let b_summary = unit_summary(&mut tx, b.id).await?;

        tx.commit().await.context("failed to commit move unit switch")?;

        info!(a = %a.id, b = %b.id, "move units switched");
        Ok((a_summary, b_summary))
    }
}

/// Lock a single session row.
pub(super) async fn lock_session(conn: &mut PgConnection, session_id: Uuid) -> EngineResult<Session> {
    sessions::lock_sessions(&mut *conn, &[session_id])
        .await?
        .pop()
        .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))
}

/// Fetch a unit and lock its session, re-reading the unit under the lock.
pub(super) async fn lock_unit_session(conn: &mut PgConnection, unit_id: Uuid) -> EngineResult<MoveUnit> {
    let seen = move_units::get_move_unit(&mut *conn, unit_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, unit_id))?;
    lock_session(conn, seen.session_id).await?;
    let unit = move_units::get_move_unit(&mut *conn, unit_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, unit_id))?;
    if unit.session_id != seen.session_id {
        return Err(EngineError::InvalidPosition(format!(
            "move unit {unit_id} changed session while being locked"
        )));
    }
    Ok(unit)
}

async fn unit_summary(conn: &mut PgConnection, unit_id: Uuid) -> EngineResult<MoveUnitSummary> {
    let unit = move_units::get_move_unit(&mut *conn, unit_id)
        .await?
        .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, unit_id))?;
    Ok(MoveUnitSummary::load(conn, &unit).await?)
}

/// Fetch units in the order given, failing on the first missing id.
async fn load_batch(conn: &mut PgConnection, ids: &[Uuid]) -> EngineResult<Vec<MoveUnit>> {
    let mut found = move_units::get_move_units(&mut *conn, ids).await?;
    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
        let pos = found
            .iter()
            .position(|u| u.id == *id)
            .ok_or_else(|| EngineError::not_found(Entity::MoveUnit, *id))?;
        ordered.push(found.swap_remove(pos));
    }
    Ok(ordered)
}
