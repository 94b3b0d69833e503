//! Flat results returned by structural operations.

use anyhow::Result;
use chrono::Weekday;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use stride_db::models::{Discipline, MoveUnit, Session, WorkType};
use stride_db::queries::{laps, move_units};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub day_id: Uuid,
    pub session_number: i32,
    pub title: String,
    pub move_unit_count: usize,
}

impl SessionSummary {
    pub(crate) async fn load(conn: &mut PgConnection, session: &Session) -> Result<Self> {
        let units = move_units::list_move_units_for_session(&mut *conn, session.id).await?;
        Ok(Self {
            id: session.id,
            day_id: session.day_id,
            session_number: session.session_number,
            title: session.title.clone(),
            move_unit_count: units.len(),
        })
    }

    /// Short human description used in conflict messages.
    pub fn describe(&self) -> String {
        let title = if self.title.is_empty() {
            "untitled"
        } else {
            self.title.as_str()
        };
        format!(
            "session {} \"{title}\" with {} move units",
            self.session_number, self.move_unit_count
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveUnitSummary {
    pub id: Uuid,
    pub session_id: Uuid,
    pub letter: String,
    pub discipline: Discipline,
    pub work_type: Option<WorkType>,
    pub lap_count: usize,
}

impl MoveUnitSummary {
    pub(crate) async fn load(conn: &mut PgConnection, unit: &MoveUnit) -> Result<Self> {
        let laps = laps::list_laps_for_unit(&mut *conn, unit.id).await?;
        Ok(Self {
            id: unit.id,
            session_id: unit.session_id,
            letter: unit.letter.clone(),
            discipline: unit.discipline,
            work_type: unit.work_type,
            lap_count: laps.len(),
        })
    }

    pub fn describe(&self) -> String {
        format!(
            "move unit {} ({}) with {} laps",
            self.letter, self.discipline, self.lap_count
        )
    }
}

/// One target day filled by a week copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopiedDay {
    pub weekday: Weekday,
    pub source_day_id: Uuid,
    pub target_day_id: Uuid,
    pub sessions_copied: usize,
}

/// Outcome of `copy_week`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeekCopyReport {
    pub copied_days: Vec<CopiedDay>,
    /// Source weekdays with no day in the target week.
    pub skipped_weekdays: Vec<Weekday>,
}

impl WeekCopyReport {
    pub fn sessions_copied(&self) -> usize {
        self.copied_days.iter().map(|d| d.sessions_copied).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_description() {
        let summary = SessionSummary {
            id: Uuid::nil(),
            day_id: Uuid::nil(),
            session_number: 2,
            title: String::new(),
            move_unit_count: 4,
        };
        assert_eq!(summary.describe(), "session 2 \"untitled\" with 4 move units");
    }

    #[test]
    fn report_totals() {
        let day = |n| CopiedDay {
            weekday: Weekday::Mon,
            source_day_id: Uuid::nil(),
            target_day_id: Uuid::nil(),
            sessions_copied: n,
        };
        let report = WeekCopyReport {
            copied_days: vec![day(2), day(1), day(0)],
            skipped_weekdays: vec![Weekday::Sun],
        };
        assert_eq!(report.sessions_copied(), 3);
    }
}
