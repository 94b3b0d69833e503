use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Error returned when a text column or CLI argument names an unknown variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// What a plan is used for. Fixes the storage zone of every day under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanKind {
    TemplateWeeks,
    YearlyPlan,
    CompletedLog,
}

impl PlanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemplateWeeks => "template_weeks",
            Self::YearlyPlan => "yearly_plan",
            Self::CompletedLog => "completed_log",
        }
    }

    /// Storage zone the plan's days live in.
    pub fn zone(self) -> StorageZone {
        match self {
            Self::TemplateWeeks => StorageZone::Template,
            Self::YearlyPlan => StorageZone::Planned,
            Self::CompletedLog => StorageZone::Done,
        }
    }
}

impl fmt::Display for PlanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template_weeks" => Ok(Self::TemplateWeeks),
            "yearly_plan" => Ok(Self::YearlyPlan),
            "completed_log" => Ok(Self::CompletedLog),
            other => Err(UnknownVariant::new("plan kind", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Independent parallel schedule sharing a date range with others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StorageZone {
    Planned,
    Done,
    Template,
}

impl StorageZone {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Done => "done",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for StorageZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageZone {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planned" => Ok(Self::Planned),
            "done" => Ok(Self::Done),
            "template" => Ok(Self::Template),
            other => Err(UnknownVariant::new("storage zone", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Which measurement a discipline is prescribed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisciplineClass {
    /// Endurance work prescribed in meters.
    Distance,
    /// Resistance work prescribed in repetitions.
    Load,
}

impl fmt::Display for DisciplineClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Load => "load",
        })
    }
}

impl FromStr for DisciplineClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "distance" => Ok(Self::Distance),
            "load" => Ok(Self::Load),
            other => Err(UnknownVariant::new("discipline class", other)),
        }
    }
}

/// Discipline tag carried by a move unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Run,
    Bike,
    Swim,
    Row,
    Ski,
    Strength,
    Plyometrics,
    Mobility,
    Other,
}

impl Discipline {
    pub const ALL: [Discipline; 9] = [
        Self::Run,
        Self::Bike,
        Self::Swim,
        Self::Row,
        Self::Ski,
        Self::Strength,
        Self::Plyometrics,
        Self::Mobility,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Bike => "bike",
            Self::Swim => "swim",
            Self::Row => "row",
            Self::Ski => "ski",
            Self::Strength => "strength",
            Self::Plyometrics => "plyometrics",
            Self::Mobility => "mobility",
            Self::Other => "other",
        }
    }

    pub fn class(self) -> DisciplineClass {
        match self {
            Self::Run | Self::Bike | Self::Swim | Self::Row | Self::Ski => {
                DisciplineClass::Distance
            }
            Self::Strength | Self::Plyometrics | Self::Mobility | Self::Other => {
                DisciplineClass::Load
            }
        }
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Discipline {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("discipline", s))
    }
}

// ---------------------------------------------------------------------------

/// How a move unit is rendered and whether it carries laps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    #[default]
    Standard,
    /// Free-text note only; never has laps.
    Annotation,
    Manual,
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Annotation => "annotation",
            Self::Manual => "manual",
        })
    }
}

impl FromStr for UnitType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "annotation" => Ok(Self::Annotation),
            "manual" => Ok(Self::Manual),
            other => Err(UnknownVariant::new("unit type", other)),
        }
    }
}

/// Focus marker on a move unit; unique per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Primary,
    Secondary,
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
        })
    }
}

impl FromStr for WorkType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            other => Err(UnknownVariant::new("work type", other)),
        }
    }
}

// ---------------------------------------------------------------------------

/// Granularity of a stored template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Session,
    Day,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Session => "session",
            Self::Day => "day",
        })
    }
}

impl FromStr for TemplateKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "session" => Ok(Self::Session),
            "day" => Ok(Self::Day),
            other => Err(UnknownVariant::new("template kind", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A scheduling container spanning a fixed number of weeks.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Plan {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub kind: PlanKind,
    pub start_date: NaiveDate,
    pub week_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A 7-day subdivision of a plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Week {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub week_number: i32,
    pub start_date: NaiveDate,
    pub period_id: Option<Uuid>,
    pub notes: Option<String>,
}

impl Week {
    pub fn end_date(&self) -> NaiveDate {
        self.start_date + Duration::days(6)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date()
    }

    /// The date inside this week that falls on `weekday`.
    pub fn date_for(&self, weekday: Weekday) -> NaiveDate {
        let start = self.start_date.weekday().num_days_from_monday() as i64;
        let target = weekday.num_days_from_monday() as i64;
        self.start_date + Duration::days((target - start).rem_euclid(7))
    }
}

/// A single calendar date inside a week.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Day {
    pub id: Uuid,
    pub week_id: Uuid,
    pub week_number: i32,
    pub owner_id: Uuid,
    pub day_date: NaiveDate,
    pub zone: StorageZone,
    pub notes: Option<String>,
}

impl Day {
    pub fn weekday(&self) -> Weekday {
        self.day_date.weekday()
    }
}

/// One of up to three training sessions on a day.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: Uuid,
    pub day_id: Uuid,
    pub session_number: i32,
    pub title: String,
    pub notes: Option<String>,
    pub duration_minutes: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// A lettered block within a session.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoveUnit {
    pub id: Uuid,
    pub session_id: Uuid,
    pub letter: String,
    pub discipline: Discipline,
    pub unit_type: UnitType,
    pub work_type: Option<WorkType>,
    pub description: Option<String>,
    pub technique_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One numbered repetition, interval or set within a move unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RepetitionLap {
    pub id: Uuid,
    pub move_unit_id: Uuid,
    pub repetition_number: i32,
    pub distance_m: Option<i32>,
    pub reps: Option<i32>,
    pub load_kg: Option<f64>,
    pub pace_seconds: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub notes: Option<String>,
}

/// Week classification (base, build, taper, ...). Weakly referenced.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Period {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Applied-technique tag. Weakly referenced from move units.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Technique {
    pub id: Uuid,
    pub name: String,
}

/// A stored session or day structure. `body` is validated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Template {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub kind: TemplateKind,
    pub body: serde_json::Value,
    pub usage_count: i32,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Insert payloads
// ---------------------------------------------------------------------------

/// Scalar fields of a session, without id, parent or number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub notes: Option<String>,
    pub duration_minutes: Option<i32>,
}

impl From<&Session> for NewSession {
    fn from(s: &Session) -> Self {
        Self {
            title: s.title.clone(),
            notes: s.notes.clone(),
            duration_minutes: s.duration_minutes,
        }
    }
}

/// Scalar fields of a move unit, without id, parent or letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMoveUnit {
    pub discipline: Discipline,
    pub unit_type: UnitType,
    pub work_type: Option<WorkType>,
    pub description: Option<String>,
    pub technique_id: Option<Uuid>,
}

impl NewMoveUnit {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            unit_type: UnitType::Standard,
            work_type: None,
            description: None,
            technique_id: None,
        }
    }
}

impl From<&MoveUnit> for NewMoveUnit {
    fn from(u: &MoveUnit) -> Self {
        Self {
            discipline: u.discipline,
            unit_type: u.unit_type,
            work_type: u.work_type,
            description: u.description.clone(),
            technique_id: u.technique_id,
        }
    }
}

/// Measurements of a lap, without id, parent or number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLap {
    pub distance_m: Option<i32>,
    pub reps: Option<i32>,
    pub load_kg: Option<f64>,
    pub pace_seconds: Option<i32>,
    pub rest_seconds: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub notes: Option<String>,
}

impl From<&RepetitionLap> for NewLap {
    fn from(l: &RepetitionLap) -> Self {
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_kind_display_roundtrip() {
        for v in [
            PlanKind::TemplateWeeks,
            PlanKind::YearlyPlan,
            PlanKind::CompletedLog,
        ] {
            let parsed: PlanKind = v.to_string().parse().expect("should parse");
            assert_eq!(v, parsed);
        }
    }

    #[test]
    fn plan_kind_selects_zone() {
        assert_eq!(PlanKind::TemplateWeeks.zone(), StorageZone::Template);
        assert_eq!(PlanKind::YearlyPlan.zone(), StorageZone::Planned);
        assert_eq!(PlanKind::CompletedLog.zone(), StorageZone::Done);
    }

    #[test]
    fn discipline_parse_and_class() {
        for d in Discipline::ALL {
            let parsed: Discipline = d.as_str().parse().expect("should parse");
            assert_eq!(parsed, d);
        }
        assert_eq!(Discipline::Run.class(), DisciplineClass::Distance);
        assert_eq!(Discipline::Swim.class(), DisciplineClass::Distance);
        assert_eq!(Discipline::Strength.class(), DisciplineClass::Load);
    }

    #[test]
    fn unknown_variant_message() {
        let err = "kayak".parse::<Discipline>().unwrap_err();
        assert_eq!(err.to_string(), "invalid discipline: \"kayak\"");
        assert!("daily".parse::<TemplateKind>().is_err());
        assert!("tertiary".parse::<WorkType>().is_err());
    }

    fn week_starting(date: NaiveDate) -> Week {
        Week {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            week_number: 1,
            start_date: date,
            period_id: None,
            notes: None,
        }
    }

    #[test]
    fn week_date_for_weekday_from_monday_start() {
        // 2026-01-05 is a Monday.
        let week = week_starting(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(
            week.date_for(Weekday::Sat),
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()
        );
        assert_eq!(week.date_for(Weekday::Mon), week.start_date);
        assert!(week.contains(week.date_for(Weekday::Sun)));
    }

    #[test]
    fn week_date_for_weekday_from_midweek_start() {
        // 2026-01-07 is a Wednesday; Monday falls at the end of the span.
        let week = week_starting(NaiveDate::from_ymd_opt(2026, 1, 7).unwrap());
        assert_eq!(
            week.date_for(Weekday::Mon),
            NaiveDate::from_ymd_opt(2026, 1, 12).unwrap()
        );
        assert_eq!(week.end_date(), NaiveDate::from_ymd_opt(2026, 1, 13).unwrap());
        assert!(!week.contains(NaiveDate::from_ymd_opt(2026, 1, 14).unwrap()));
    }
}
