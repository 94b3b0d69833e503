//! Deep copies of hierarchy subtrees.
//!
//! Copies never carry ids, parent references or ordering labels over from
//! the source; those are derived from the target at write time. All
//! functions run on the caller's transaction.

use std::collections::HashMap;

use chrono::Weekday;
use sqlx::PgConnection;
use tracing::{debug, warn};
use uuid::Uuid;

use stride_db::models::{Day, MoveUnit, NewLap, NewMoveUnit, NewSession, Session, WorkType};
use stride_db::queries::{laps, move_units, sessions};

use crate::config::MAX_SESSIONS_PER_DAY;
use crate::conflict::ReplaceConfirmed;
use crate::error::{EngineError, EngineResult, Entity};
use crate::ordering::labels_from;
use crate::summary::{CopiedDay, WeekCopyReport};
use crate::tree::{self, SessionTree, UnitTree};

/// How copied sessions meet a target day's existing sessions.
#[derive(Debug, Clone, Copy)]
pub enum DuplicateMode {
    /// Number the copies after the existing sessions.
    Append,
    /// Delete the target's sessions first.
    Replace(ReplaceConfirmed),
}

/// Copy a unit and its laps under `session_id` with the given label.
pub async fn duplicate_move_unit(
    conn: &mut PgConnection,
    source: &UnitTree,
    session_id: Uuid,
    letter: &str,
    work_type: Option<WorkType>,
) -> EngineResult<MoveUnit> {
    let fields = NewMoveUnit {
        work_type,
        ..NewMoveUnit::from(&source.unit)
    };
    let unit = move_units::insert_move_unit(&mut *conn, session_id, letter, &fields).await?;
    for (i, lap) in source.laps.iter().enumerate() {
        laps::insert_lap(&mut *conn, unit.id, i as i32 + 1, &NewLap::from(lap)).await?;
    }
    Ok(unit)
}

/// Copy a session subtree under `day_id` as session `session_number`.
pub async fn duplicate_session(
    conn: &mut PgConnection,
    source: &SessionTree,
    day_id: Uuid,
    session_number: i32,
) -> EngineResult<Session> {
    let session = sessions::insert_session(
        &mut *conn,
        day_id,
        session_number,
        &NewSession::from(&source.session),
    )
    .await?;

    for (unit, label) in source.units.iter().zip(labels_from(0, source.units.len())) {
        duplicate_move_unit(conn, unit, session.id, &label, unit.unit.work_type).await?;
    }

    debug!(
        source_id = %source.session.id,
        session_id = %session.id,
        units = source.units.len(),
        "session duplicated"
    );
    Ok(session)
}

/// Copy every session of `source_day` into `target_day`.
pub async fn duplicate_day_contents(
    conn: &mut PgConnection,
    source_day: &Day,
    target_day: &Day,
    mode: DuplicateMode,
) -> EngineResult<Vec<Session>> {
    let source = tree::load_day(conn, source_day.clone()).await?;

    let first_number = match mode {
        DuplicateMode::Append => {
            let existing = sessions::count_sessions_for_day(&mut *conn, target_day.id).await? as usize;
            if existing + source.sessions.len() > MAX_SESSIONS_PER_DAY {
                return Err(EngineError::CapacityExceeded {
                    entity: Entity::Day,
                    id: target_day.id,
                    limit: MAX_SESSIONS_PER_DAY,
                });
            }
            existing + 1
        }
        DuplicateMode::Replace(_) => {
            if source_day.id == target_day.id {
                return Err(EngineError::InvalidPosition(
                    "cannot replace a day's sessions with its own".to_owned(),
                ));
            }
            let removed = sessions::delete_sessions_for_day(&mut *conn, target_day.id).await?;
            if removed > 0 {
                debug!(day_id = %target_day.id, removed, "replaced target sessions");
            }
            1
        }
    };

    let mut copies = Vec::with_capacity(source.sessions.len());
    for (i, session) in source.sessions.iter().enumerate() {
        let number = (first_number + i) as i32;
        copies.push(duplicate_session(conn, session, target_day.id, number).await?);
    }
    Ok(copies)
}

/// Copy day contents between two weeks, matching days by weekday.
///
/// A source weekday with no day in the target week is skipped with a
/// warning and listed in the report.
pub async fn duplicate_week(
    conn: &mut PgConnection,
    source_days: &[Day],
    target_days: &[Day],
    mode: DuplicateMode,
) -> EngineResult<WeekCopyReport> {
    let targets: HashMap<Weekday, &Day> = target_days.iter().map(|d| (d.weekday(), d)).collect();
    let mut report = WeekCopyReport::default();

    for source_day in source_days {
        let weekday = source_day.weekday();
        let Some(target_day) = targets.get(&weekday) else {
            warn!(
                source_day_id = %source_day.id,
                weekday = %weekday,
                "target week has no day on this weekday, skipping"
            );
            report.skipped_weekdays.push(weekday);
            continue;
        };

        let copies = duplicate_day_contents(conn, source_day, target_day, mode).await?;
        report.copied_days.push(CopiedDay {
            weekday,
            source_day_id: source_day.id,
            target_day_id: target_day.id,
            sessions_copied: copies.len(),
        });
    }

    Ok(report)
}
