use std::collections::HashMap;

use anyhow::Context;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use stride_db::models::Day;
use stride_db::queries::{days, sessions, weeks};

use super::{PlanStructureManager, lock_order, plan_of_week};
use crate::access::Caller;
use crate::config::MAX_SESSIONS_PER_DAY;
use crate::conflict::ReplaceConfirmed;
use crate::duplicate::{self, DuplicateMode};
use crate::error::{EngineError, EngineResult, Entity};
use crate::summary::WeekCopyReport;

/// How `copy_week` treats sessions already in the target week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WeekCopyMode {
    /// Keep target sessions and number the copies after them.
    Append,
    /// Replace each matched target day's sessions wholesale.
    Replace {
        #[serde(default)]
        confirmed: bool,
    },
}

impl PlanStructureManager {
    /// Copy every day's sessions from one week into another, matching days
    /// by weekday, and mirror the source week's period and notes.
    pub async fn copy_week(
        &self,
        caller: &Caller,
        source_week_id: Uuid,
        target_week_id: Uuid,
        mode: WeekCopyMode,
    ) -> EngineResult<WeekCopyReport> {
        if source_week_id == target_week_id {
            return Err(EngineError::InvalidPosition(
                "cannot copy a week onto itself".to_owned(),
            ));
        }

        let mut tx = self.begin().await?;

        let locked = weeks::lock_weeks(&mut *tx, &lock_order([source_week_id, target_week_id])).await?;
        let find = |id: Uuid| {
            locked
                .iter()
                .find(|w| w.id == id)
                .cloned()
                .ok_or_else(|| EngineError::not_found(Entity::Week, id))
        };
        let source = find(source_week_id)?;
        let target = find(target_week_id)?;

        let target_plan = plan_of_week(&mut tx, target.id).await?;
        self.authorize(caller, &target_plan).await?;

        let source_listed = days::list_days_for_week(&mut *tx, source.id).await?;
        let target_listed = days::list_days_for_week(&mut *tx, target.id).await?;
        let day_ids = lock_order(source_listed.iter().chain(&target_listed).map(|d| d.id));
        let locked_days = days::lock_days(&mut *tx, &day_ids).await?;
        let mut source_days: Vec<Day> = locked_days
            .iter()
            .filter(|d| d.week_id == source.id)
            .cloned()
            .collect();
        source_days.sort_by_key(|d| d.day_date);
        let target_days: Vec<Day> = locked_days
            .iter()
            .filter(|d| d.week_id == target.id)
            .cloned()
            .collect();

        let by_weekday: HashMap<Weekday, &Day> = target_days.iter().map(|d| (d.weekday(), d)).collect();
        let matched: Vec<(&Day, &Day)> = source_days
            .iter()
            .filter_map(|s| by_weekday.get(&s.weekday()).map(|t| (s, *t)))
            .collect();

        let duplicate_mode = match mode {
            WeekCopyMode::Append => {
                for (source_day, target_day) in &matched {
                    let incoming = sessions::count_sessions_for_day(&mut *tx, source_day.id).await?;
                    let existing = sessions::count_sessions_for_day(&mut *tx, target_day.id).await?;
                    if (incoming + existing) as usize > MAX_SESSIONS_PER_DAY {
                        return Err(EngineError::CapacityExceeded {
                            entity: Entity::Day,
                            id: target_day.id,
                            limit: MAX_SESSIONS_PER_DAY,
                        });
                    }
                }
                DuplicateMode::Append
            }
            WeekCopyMode::Replace { confirmed } => {
                if !confirmed {
                    let mut occupied = Vec::new();
                    for (_, target_day) in &matched {
                        let n = sessions::count_sessions_for_day(&mut *tx, target_day.id).await?;
                        if n > 0 {
                            occupied.push(format!("{} ({n} sessions)", target_day.day_date));
                        }
                    }
                    if !occupied.is_empty() {
                        return Err(EngineError::ConflictRequiresConfirmation {
                            existing: occupied.join(", "),
                        });
                    }
                }
                DuplicateMode::Replace(ReplaceConfirmed::granted())
            }
        };

        let report = duplicate::duplicate_week(&mut tx, &source_days, &target_days, duplicate_mode).await?;
        weeks::update_week_details(&mut *tx, target.id, source.period_id, source.notes.as_deref()).await?;

        tx.commit().await.context("failed to commit week copy")?;

        info!(
            source_week_id = %source.id,
            target_week_id = %target.id,
            days = report.copied_days.len(),
            sessions = report.sessions_copied(),
            skipped = report.skipped_weekdays.len(),
            "week copied"
        );
        Ok(report)
    }
}
