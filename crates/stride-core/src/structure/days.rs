use anyhow::Context;
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::{debug, info};
use uuid::Uuid;

use stride_db::models::{Day, Plan, Week};
use stride_db::queries::{days, sessions, weeks};

use super::{PlanStructureManager, lock_order, plan_of_week};
use crate::access::Caller;
use crate::error::{EngineError, EngineResult, Entity};

impl PlanStructureManager {
    /// Return the day for `date` in a week, creating it if needed.
    pub async fn ensure_day(&self, caller: &Caller, week_id: Uuid, date: NaiveDate) -> EngineResult<Day> {
        let mut tx = self.begin().await?;

        let week = weeks::lock_weeks(&mut *tx, &[week_id])
            .await?
            .pop()
            .ok_or_else(|| EngineError::not_found(Entity::Week, week_id))?;
        if !week.contains(date) {
            return Err(EngineError::InvalidInput(format!(
                "{date} is outside week {} ({} to {})",
                week.week_number,
                week.start_date,
                week.end_date()
            )));
        }

        let plan = plan_of_week(&mut tx, week.id).await?;
        self.authorize(caller, &plan).await?;

        let day = claim_day(&mut tx, &plan, &week, date).await?;

        tx.commit().await.context("failed to commit day")?;

        debug!(day_id = %day.id, week_id = %week.id, %date, "day ensured");
        Ok(day)
    }

    /// Move a day, with its sessions, into another week.
    ///
    /// The day keeps its weekday and takes that weekday's date inside the
    /// target week. A day already holding that date is a conflict unless
    /// `replace` is set, in which case it is deleted with its contents.
    pub async fn move_day_to_week(
        &self,
        caller: &Caller,
        day_id: Uuid,
        target_week_id: Uuid,
        target_index: Option<usize>,
        replace: bool,
    ) -> EngineResult<Day> {
        let mut tx = self.begin().await?;

        let day = days::get_day(&mut *tx, day_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Day, day_id))?;
        if day.week_id == target_week_id {
            let plan = plan_of_week(&mut tx, day.week_id).await?;
            self.authorize(caller, &plan).await?;
            debug!(day_id = %day.id, "day already in target week");
            return Ok(day);
        }

        let locked = weeks::lock_weeks(&mut *tx, &lock_order([day.week_id, target_week_id])).await?;
        let target = locked
            .iter()
            .find(|w| w.id == target_week_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(Entity::Week, target_week_id))?;

        let source_plan = plan_of_week(&mut tx, day.week_id).await?;
        let target_plan = plan_of_week(&mut tx, target.id).await?;
        self.authorize_all(caller, &[&source_plan, &target_plan]).await?;

        if target_plan.kind.zone() != day.zone || target_plan.owner_id != day.owner_id {
            return Err(EngineError::InvalidPosition(format!(
                "day {} belongs to another schedule than week {}",
                day.id, target.id
            )));
        }
        if let Some(index) = target_index {
            debug!(index, "target index is not used for day placement");
        }

        let new_date = target.date_for(day.weekday());
        let occupant = days::find_day(&mut *tx, day.owner_id, new_date, day.zone).await?;

        let lock_ids = lock_order(std::iter::once(day.id).chain(occupant.as_ref().map(|d| d.id)));
        let locked_days = days::lock_days(&mut *tx, &lock_ids).await?;
        let day = locked_days
            .iter()
            .find(|d| d.id == day_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(Entity::Day, day_id))?;

        if let Some(occupant) = occupant.filter(|o| o.id != day.id) {
            if !replace {
                let n = sessions::count_sessions_for_day(&mut *tx, occupant.id).await?;
                return Err(EngineError::ConflictRequiresConfirmation {
                    existing: format!("day {} with {n} sessions", occupant.day_date),
                });
            }
            days::delete_day(&mut *tx, occupant.id).await?;
            debug!(day_id = %occupant.id, "replaced occupying day");
        }

        let moved = days::rebind_day(&mut *tx, day.id, target.id, target.week_number, new_date).await?;

        tx.commit().await.context("failed to commit day move")?;

        info!(
            day_id = %moved.id,
            from = %day.day_date,
            to = %moved.day_date,
            week_id = %target.id,
            "day moved"
        );
        Ok(moved)
    }
}

/// The day for `date` under `week`, inserting it when the owner has none.
///
/// A date held by a week of another plan is refused. Days only change week
/// through `move_day_to_week`.
pub(super) async fn claim_day(
    conn: &mut PgConnection,
    plan: &Plan,
    week: &Week,
    date: NaiveDate,
) -> EngineResult<Day> {
    let zone = plan.kind.zone();
    match days::find_day(&mut *conn, plan.owner_id, date, zone).await? {
        Some(day) if day.week_id == week.id => Ok(day),
        Some(day) => {
            let holder = plan_of_week(conn, day.week_id).await?;
            Err(EngineError::InvalidPosition(format!(
                "{date} already belongs to plan {:?} ({}) in the {zone} zone",
                holder.name, holder.id
            )))
        }
        None => {
            let day = days::insert_day(&mut *conn, week.id, week.week_number, plan.owner_id, date, zone).await?;
            Ok(day)
        }
    }
}
