//! Nested read models of the hierarchy.
//!
//! Loaded for display (`get_plan_tree`), for deep copies, and for
//! capturing templates from live content.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgConnection;

use stride_db::models::{Day, MoveUnit, Plan, RepetitionLap, Session, Week};
use stride_db::queries::{days, laps, move_units, sessions, weeks};

#[derive(Debug, Clone, Serialize)]
pub struct UnitTree {
    pub unit: MoveUnit,
    pub laps: Vec<RepetitionLap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionTree {
    pub session: Session,
    pub units: Vec<UnitTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayTree {
    pub day: Day,
    pub sessions: Vec<SessionTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekTree {
    pub week: Week,
    pub days: Vec<DayTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanTree {
    pub plan: Plan,
    pub weeks: Vec<WeekTree>,
}

pub async fn load_unit(conn: &mut PgConnection, unit: MoveUnit) -> Result<UnitTree> {
    let laps = laps::list_laps_for_unit(&mut *conn, unit.id).await?;
    Ok(UnitTree { unit, laps })
}

pub async fn load_session(conn: &mut PgConnection, session: Session) -> Result<SessionTree> {
    let mut units = Vec::new();
    for unit in move_units::list_move_units_for_session(&mut *conn, session.id).await? {
        units.push(load_unit(conn, unit).await?);
    }
    Ok(SessionTree { session, units })
}

pub async fn load_day(conn: &mut PgConnection, day: Day) -> Result<DayTree> {
    let mut trees = Vec::new();
    for session in sessions::list_sessions_for_day(&mut *conn, day.id).await? {
        trees.push(load_session(conn, session).await?);
    }
    Ok(DayTree {
        day,
        sessions: trees,
    })
}

pub async fn load_week(conn: &mut PgConnection, week: Week) -> Result<WeekTree> {
    let mut trees = Vec::new();
    for day in days::list_days_for_week(&mut *conn, week.id).await? {
        trees.push(load_day(conn, day).await?);
    }
    Ok(WeekTree { week, days: trees })
}

pub async fn load_plan(conn: &mut PgConnection, plan: Plan) -> Result<PlanTree> {
    let mut trees = Vec::new();
    for week in weeks::list_weeks_for_plan(&mut *conn, plan.id).await? {
        trees.push(load_week(conn, week).await?);
    }
    Ok(PlanTree { plan, weeks: trees })
}
