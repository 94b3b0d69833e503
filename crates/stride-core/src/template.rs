//! Typed template bodies.
//!
//! A template is stored as JSON and parsed into [`TemplateBody`] at the
//! boundary. Anything that fails to parse or validate is rejected with
//! [`EngineError::MalformedTemplate`] before any mutation begins.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use stride_db::models::{Discipline, NewLap, NewMoveUnit, NewSession, TemplateKind, UnitType, WorkType};

use crate::config::MAX_SESSIONS_PER_DAY;
use crate::error::{EngineError, EngineResult};
use crate::tree::{SessionTree, UnitTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateBody {
    Session(SessionTemplate),
    Day(DayTemplate),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DayTemplate {
    pub sessions: Vec<SessionTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionTemplate {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub move_units: Vec<MoveUnitTemplate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveUnitTemplate {
    pub discipline: Discipline,
    #[serde(default)]
    pub unit_type: UnitType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<WorkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub laps: Vec<LapTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LapTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TemplateBody {
    /// Parse and validate a stored body against the kind recorded beside it.
    pub fn parse(kind: TemplateKind, value: &serde_json::Value) -> EngineResult<Self> {
        let body: TemplateBody = serde_json::from_value(value.clone())
            .map_err(|e| EngineError::MalformedTemplate(e.to_string()))?;
        if body.kind() != kind {
            return Err(EngineError::MalformedTemplate(format!(
                "template is stored as {kind} but its body describes a {}",
                body.kind()
            )));
        }
        body.validate()?;
        Ok(body)
    }

    pub fn kind(&self) -> TemplateKind {
        match self {
            Self::Session(_) => TemplateKind::Session,
            Self::Day(_) => TemplateKind::Day,
        }
    }

    pub fn sessions(&self) -> &[SessionTemplate] {
        match self {
            Self::Session(s) => std::slice::from_ref(s),
            Self::Day(d) => &d.sessions,
        }
    }

    pub fn to_json(&self) -> EngineResult<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| EngineError::Storage(anyhow::Error::new(e).context("failed to serialize template")))
    }

    fn validate(&self) -> EngineResult<()> {
        if let Self::Day(day) = self {
            if day.sessions.is_empty() {
                return Err(EngineError::MalformedTemplate(
                    "day template has no sessions".to_owned(),
                ));
            }
            if day.sessions.len() > MAX_SESSIONS_PER_DAY {
                // Extra sessions are truncated on apply; the body itself is
                // still usable.
                tracing::debug!(
                    sessions = day.sessions.len(),
                    "day template holds more sessions than a day accepts"
                );
            }
        }
        for (i, session) in self.sessions().iter().enumerate() {
            session
                .validate()
                .map_err(|msg| EngineError::MalformedTemplate(format!("session {}: {msg}", i + 1)))?;
        }
        Ok(())
    }
}

impl SessionTemplate {
    fn validate(&self) -> Result<(), String> {
        if self.duration_minutes.is_some_and(|m| m < 0) {
            return Err("duration_minutes cannot be negative".to_owned());
        }

        let mut held = HashSet::new();
        for (i, unit) in self.move_units.iter().enumerate() {
            if let Some(wt) = unit.work_type {
                if !held.insert(wt) {
                    return Err(format!("more than one {wt} move unit"));
                }
            }
            if unit.unit_type == UnitType::Annotation && !unit.laps.is_empty() {
                return Err(format!("annotation unit {} carries laps", i + 1));
            }
            for lap in &unit.laps {
                let negative = [lap.distance_m, lap.reps]
                    .into_iter()
                    .flatten()
                    .any(|v| v < 0);
                if negative {
                    return Err(format!("unit {} has a negative lap value", i + 1));
                }
            }
        }
        Ok(())
    }

    pub fn session_fields(&self) -> NewSession {
        NewSession {
            title: self.title.clone(),
            notes: self.notes.clone(),
            duration_minutes: self.duration_minutes,
        }
    }

    /// Capture a live session subtree.
    pub fn from_tree(tree: &SessionTree) -> Self {
        Self {
            title: tree.session.title.clone(),
            notes: tree.session.notes.clone(),
            duration_minutes: tree.session.duration_minutes,
            move_units: tree.units.iter().map(MoveUnitTemplate::from_tree).collect(),
        }
    }
}

impl MoveUnitTemplate {
    pub fn unit_fields(&self) -> NewMoveUnit {
        NewMoveUnit {
            discipline: self.discipline,
            unit_type: self.unit_type,
            work_type: self.work_type,
            description: self.description.clone(),
            technique_id: None,
        }
    }

    fn from_tree(tree: &UnitTree) -> Self {
        Self {
            discipline: tree.unit.discipline,
            unit_type: tree.unit.unit_type,
            work_type: tree.unit.work_type,
            description: tree.unit.description.clone(),
            laps: tree
                .laps
                .iter()
                .map(|l| LapTemplate::from(&NewLap::from(l)))
                .collect(),
        }
    }
}

impl From<&NewLap> for LapTemplate {
    fn from(l: &NewLap) -> Self {
        Self {
            distance_m: l.distance_m,
            reps: l.reps,
            load_kg: l.load_kg,
            pace_seconds: l.pace_seconds,
            rest_seconds: l.rest_seconds,
            duration_seconds: l.duration_seconds,
            notes: l.notes.clone(),
        }
    }
}

impl From<&LapTemplate> for NewLap {
    fn from(l: &LapTemplate) -> Self {
        Self {
            distance_m: l.distance_m,
            reps: l.reps,
            load_kg: l.load_kg,
            pace_seconds: l.pace_seconds,
            rest_seconds: l.rest_seconds,
            duration_seconds: l.duration_seconds,
            notes: l.notes.clone(),
        }
    }
}
