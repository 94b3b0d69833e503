use anyhow::Context;
use tracing::{debug, info};
use uuid::Uuid;

use stride_db::models::{NewSession, Session};
use stride_db::queries::{days, sessions};

use super::{PlanStructureManager, lock_order, plan_of_day};
use crate::access::Caller;
use crate::config::MAX_SESSIONS_PER_DAY;
use crate::conflict::{self, SessionAction, SessionConflict};
use crate::duplicate;
use crate::error::{EngineError, EngineResult, Entity};
use crate::summary::SessionSummary;
use crate::tree;

impl PlanStructureManager {
    pub async fn create_session(
        &self,
        caller: &Caller,
        day_id: Uuid,
        fields: NewSession,
    ) -> EngineResult<Session> {
        let mut tx = self.begin().await?;

        let day = days::lock_days(&mut *tx, &[day_id])
            .await?
            .pop()
            .ok_or_else(|| EngineError::not_found(Entity::Day, day_id))?;
        let plan = plan_of_day(&mut tx, day.id).await?;
        self.authorize(caller, &plan).await?;

        let count = sessions::count_sessions_for_day(&mut *tx, day.id).await? as usize;
        if count >= MAX_SESSIONS_PER_DAY {
            return Err(day_at_capacity(day.id));
        }
        let session = sessions::insert_session(&mut *tx, day.id, count as i32 + 1, &fields).await?;

        tx.commit().await.context("failed to commit session")?;

        info!(session_id = %session.id, day_id = %day.id, number = session.session_number, "session created");
        Ok(session)
    }

    /// Delete a session with its move units and laps; later sessions of the
    /// day move up.
    pub async fn delete_session(&self, caller: &Caller, session_id: Uuid) -> EngineResult<()> {
        let mut tx = self.begin().await?;

        let session = self.lock_session_day(&mut tx, session_id).await?;
        let plan = plan_of_day(&mut tx, session.day_id).await?;
        self.authorize(caller, &plan).await?;

        sessions::delete_session(&mut *tx, session.id).await?;
        sessions::renumber_sessions(&mut *tx, session.day_id).await?;

        tx.commit().await.context("failed to commit session deletion")?;

        info!(session_id = %session.id, day_id = %session.day_id, "session deleted");
        Ok(())
    }

    /// Copy, move or switch a session relative to a target day.
    pub async fn move_or_copy_or_switch_session(
        &self,
        caller: &Caller,
        session_id: Uuid,
        target_day_id: Uuid,
        action: SessionAction,
    ) -> EngineResult<SessionSummary> {
        let mut tx = self.begin().await?;

        let seen = sessions::get_session(&mut *tx, session_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))?;
        let locked = days::lock_days(&mut *tx, &lock_order([seen.day_id, target_day_id])).await?;
        if !locked.iter().any(|d| d.id == target_day_id) {
            return Err(EngineError::not_found(Entity::Day, target_day_id));
        }
        let session = sessions::get_session(&mut *tx, session_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))?;
        if session.day_id != seen.day_id {
            return Err(EngineError::InvalidPosition(format!(
                "session {session_id} changed day while being placed"
            )));
        }

        let target_plan = plan_of_day(&mut tx, target_day_id).await?;
        match action {
            SessionAction::Copy => self.authorize(caller, &target_plan).await?,
            SessionAction::Move { .. } | SessionAction::Switch { .. } => {
                let source_plan = plan_of_day(&mut tx, session.day_id).await?;
                self.authorize_all(caller, &[&source_plan, &target_plan]).await?;
            }
        }

        let state = conflict::detect_session_conflict(&mut tx, target_day_id).await?;
        let result = match action {
            SessionAction::Copy => {
                if let SessionConflict::Blocked(_) = state {
                    return Err(day_at_capacity(target_day_id));
                }
                let number = state.existing().len() as i32 + 1;
                let source = tree::load_session(&mut tx, session.clone()).await?;
                duplicate::duplicate_session(&mut tx, &source, target_day_id, number).await?
            }
            SessionAction::Move { replace, confirmed } => {
                if session.day_id == target_day_id {
                    return Err(EngineError::InvalidPosition(
                        "session is already on the target day".to_owned(),
                    ));
                }
                let number = match &state {
                    SessionConflict::Blocked(_) => return Err(day_at_capacity(target_day_id)),
                    SessionConflict::Free => 1,
                    SessionConflict::Occupied(existing) if !confirmed => {
                        return Err(EngineError::ConflictRequiresConfirmation {
                            existing: conflict::describe_sessions(existing),
                        });
                    }
                    SessionConflict::Occupied(existing) => {
                        let replaced = match replace {
                            Some(id) => existing.iter().find(|s| s.id == id).ok_or_else(|| {
                                EngineError::InvalidPosition(format!(
                                    "session {id} is not on the target day"
                                ))
                            })?,
                            None if existing.len() == 1 => &existing[0],
                            None => {
                                return Err(EngineError::InvalidPosition(format!(
                                    "target day holds {} sessions; name the one to replace",
                                    existing.len()
                                )));
                            }
                        };
                        sessions::delete_session(&mut *tx, replaced.id).await?;
                        debug!(session_id = %replaced.id, "replaced target session");
                        replaced.session_number
                    }
                };
                let moved = sessions::rebind_session(&mut *tx, session.id, target_day_id, number).await?;
                sessions::renumber_sessions(&mut *tx, session.day_id).await?;
                moved
            }
            SessionAction::Switch { with } => {
                let existing = state.existing();
                let other_id = match with {
                    Some(id) => id,
                    None if existing.len() == 1 => existing[0].id,
                    None if existing.is_empty() => {
                        return Err(EngineError::InvalidPosition(
                            "target day has no session to switch with".to_owned(),
                        ));
                    }
                    None => {
                        return Err(EngineError::InvalidPosition(format!(
                            "target day holds {} sessions; name the one to switch with",
                            existing.len()
                        )));
                    }
                };
                if other_id == session.id {
                    return Err(EngineError::InvalidPosition(
                        "cannot switch a session with itself".to_owned(),
                    ));
                }
                let other = sessions::get_session(&mut *tx, other_id)
                    .await?
                    .filter(|s| s.day_id == target_day_id)
                    .ok_or_else(|| {
                        EngineError::InvalidPosition(format!("session {other_id} is not on the target day"))
                    })?;
                sessions::swap_sessions(&mut *tx, &session, &other).await?;
                sessions::get_session(&mut *tx, session.id)
                    .await?
                    .ok_or_else(|| EngineError::not_found(Entity::Session, session.id))?
            }
        };

        let summary = SessionSummary::load(&mut tx, &result).await?;
        tx.commit().await.context("failed to commit session placement")?;

        info!(
            session_id = %session.id,
            result_id = %summary.id,
            day_id = %summary.day_id,
            number = summary.session_number,
            ?action,
            "session placed"
        );
        Ok(summary)
    }

    /// Fetch a session and lock its day, re-reading the session under the
    /// lock so the parent cannot change underneath.
    pub(super) async fn lock_session_day(
        &self,
        conn: &mut sqlx::PgConnection,
        session_id: Uuid,
    ) -> EngineResult<Session> {
        let seen = sessions::get_session(&mut *conn, session_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))?;
        days::lock_days(&mut *conn, &[seen.day_id]).await?;
        let session = sessions::get_session(&mut *conn, session_id)
            .await?
            .ok_or_else(|| EngineError::not_found(Entity::Session, session_id))?;
        if session.day_id != seen.day_id {
            return Err(EngineError::InvalidPosition(format!(
                "session {session_id} changed day while being locked"
            )));
        }
        Ok(session)
    }
}

fn day_at_capacity(day_id: Uuid) -> EngineError {
    EngineError::CapacityExceeded {
        entity: Entity::Day,
        id: day_id,
        limit: MAX_SESSIONS_PER_DAY,
    }
}
