//! Conflict detection and resolution choices.
//!
//! A write that would land on occupied ground is refused with
//! [`EngineError::ConflictRequiresConfirmation`] until the caller
//! re-issues it with an explicit resolution. A day at the session ceiling
//! is [`SessionConflict::Blocked`] and offers no resolution at all.

use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;

use stride_db::models::{MoveUnit, WorkType};
use stride_db::queries::sessions;

use crate::config::MAX_SESSIONS_PER_DAY;
use crate::error::{EngineError, EngineResult};
use crate::summary::SessionSummary;

/// What to do with a session relative to a target day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionAction {
    /// Deep-copy beside the target's sessions. The source is untouched.
    Copy,
    /// Rebind to the target day. On an occupied day `confirmed` must be
    /// set; `replace` names the session to delete, and may be omitted when
    /// the day holds exactly one.
    Move {
        #[serde(default)]
        replace: Option<Uuid>,
        #[serde(default)]
        confirmed: bool,
    },
    /// Exchange day and number with `with`, or with the target day's only
    /// session.
    Switch {
        #[serde(default)]
        with: Option<Uuid>,
    },
}

/// Where a batch of move units lands in the target session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "at", content = "unit", rename_all = "snake_case")]
pub enum UnitPlacement {
    Append,
    Before(Uuid),
    After(Uuid),
    /// Delete the named unit and take its position. Needs confirmation.
    Replace(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitAction {
    Move,
    Copy,
}

/// State of a day about to receive a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionConflict {
    Free,
    Occupied(Vec<SessionSummary>),
    Blocked(Vec<SessionSummary>),
}

impl SessionConflict {
    pub fn existing(&self) -> &[SessionSummary] {
        match self {
            Self::Free => &[],
            Self::Occupied(s) | Self::Blocked(s) => s,
        }
    }
}

pub async fn detect_session_conflict(conn: &mut PgConnection, day_id: Uuid) -> Result<SessionConflict> {
    let mut existing = Vec::new();
    for session in sessions::list_sessions_for_day(&mut *conn, day_id).await? {
        existing.push(SessionSummary::load(conn, &session).await?);
    }

    Ok(match existing.len() {
        0 => SessionConflict::Free,
        n if n >= MAX_SESSIONS_PER_DAY => SessionConflict::Blocked(existing),
        _ => SessionConflict::Occupied(existing),
    })
}

pub fn describe_sessions(sessions: &[SessionSummary]) -> String {
    sessions
        .iter()
        .map(SessionSummary::describe)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Proof that the caller confirmed replacing existing content.
///
/// Only the engine mints one, after the conflict check has passed, so the
/// duplicator cannot be asked to destroy content without it.
#[derive(Debug, Clone, Copy)]
pub struct ReplaceConfirmed(());

impl ReplaceConfirmed {
    pub(crate) fn granted() -> Self {
        Self(())
    }
}

/// Resolved insertion point for a batch of move units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Index into the target's units (with the batch removed) where the
    /// batch starts.
    pub index: usize,
    /// Unit to delete before inserting, for [`UnitPlacement::Replace`].
    pub replaces: Option<Uuid>,
}

/// Resolve `placement` against the target session's units.
///
/// `remaining` is the target's units in letter order without any of
/// `batch`. A reference unit must belong to the target and must not be
/// part of the batch.
pub fn locate_insertion(
    remaining: &[MoveUnit],
    batch: &[Uuid],
    placement: UnitPlacement,
) -> EngineResult<Insertion> {
    let reference = match placement {
        UnitPlacement::Append => {
            return Ok(Insertion {
                index: remaining.len(),
                replaces: None,
            });
        }
        UnitPlacement::Before(id) | UnitPlacement::After(id) | UnitPlacement::Replace(id) => id,
    };

    if batch.contains(&reference) {
        return Err(EngineError::InvalidPosition(format!(
            "reference unit {reference} is part of the batch being placed"
        )));
    }
    let pos = remaining
        .iter()
        .position(|u| u.id == reference)
        .ok_or_else(|| {
            EngineError::InvalidPosition(format!(
                "reference unit {reference} is not in the target session"
            ))
        })?;

    Ok(match placement {
        UnitPlacement::Before(_) => Insertion {
            index: pos,
            replaces: None,
        },
        UnitPlacement::After(_) => Insertion {
            index: pos + 1,
            replaces: None,
        },
        _ => Insertion {
            index: pos,
            replaces: Some(reference),
        },
    })
}

/// Work types the incoming units may keep, given those already held in
/// the target. A held work type is cleared on the incoming unit; within
/// the batch the first holder wins.
pub fn reconcile_work_types(
    held: impl IntoIterator<Item = WorkType>,
    incoming: &[MoveUnit],
) -> Vec<Option<WorkType>> {
    let mut held: HashSet<WorkType> = held.into_iter().collect();
    incoming
        .iter()
        .map(|u| match u.work_type {
            Some(wt) if held.insert(wt) => Some(wt),
            Some(wt) => {
                tracing::debug!(unit_id = %u.id, work_type = %wt, "clearing work type already held in target");
                None
            }
            None => None,
        })
        .collect()
}
