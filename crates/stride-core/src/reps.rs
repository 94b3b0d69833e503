//! Procedural repetition generator.
//!
//! Pure: no I/O, identical inputs always give identical drafts. Used to
//! preview a sequence before it is persisted by
//! [`PlanStructureManager::populate_move_unit`](crate::PlanStructureManager::populate_move_unit).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use stride_db::models::{DisciplineClass, NewLap, UnknownVariant};

use crate::error::{EngineError, EngineResult};

/// Most repetitions one generation may produce.
pub const MAX_REPETITIONS: u32 = 50;

/// How the varied value changes across the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationPattern {
    #[default]
    None,
    Linear,
    Pyramid,
    Alternating,
}

impl VariationPattern {
    /// Multiplier of the variation amount for 0-based index `i`.
    fn offset(self, i: u32, count: u32) -> i64 {
        match self {
            Self::None => 0,
            Self::Linear => i as i64,
            Self::Pyramid => {
                let mid = count / 2;
                if i <= mid {
                    i as i64
                } else {
                    (count - 1 - i) as i64
                }
            }
            Self::Alternating => (i % 2) as i64,
        }
    }
}

impl fmt::Display for VariationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Linear => "linear",
            Self::Pyramid => "pyramid",
            Self::Alternating => "alternating",
        })
    }
}

impl FromStr for VariationPattern {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "linear" => Ok(Self::Linear),
            "pyramid" => Ok(Self::Pyramid),
            "alternating" => Ok(Self::Alternating),
            other => Err(UnknownVariant {
                kind: "variation pattern",
                value: other.to_owned(),
            }),
        }
    }
}

/// Parameters of one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepetitionSpec {
    pub count: u32,
    /// Meters for distance disciplines, repetitions for load disciplines.
    pub base_value: i32,
    #[serde(default)]
    pub pattern: VariationPattern,
    #[serde(default)]
    pub amount: i32,
    pub class: DisciplineClass,
    /// Copied unchanged onto every draft.
    #[serde(default)]
    pub rest_seconds: Option<i32>,
    #[serde(default)]
    pub pace_seconds: Option<i32>,
    #[serde(default)]
    pub load_kg: Option<f64>,
}

impl RepetitionSpec {
    pub fn new(count: u32, base_value: i32, class: DisciplineClass) -> Self {
        Self {
            count,
            base_value,
            pattern: VariationPattern::None,
            amount: 0,
            class,
            rest_seconds: None,
            pace_seconds: None,
            load_kg: None,
        }
    }

    pub fn with_variation(mut self, pattern: VariationPattern, amount: i32) -> Self {
        self.pattern = pattern;
        self.amount = amount;
        self
    }
}

/// One generated lap, numbered but not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapDraft {
    pub repetition_number: i32,
    #[serde(flatten)]
    pub lap: NewLap,
}

impl LapDraft {
    /// The varied value, whichever field it landed in.
    pub fn value(&self) -> Option<i32> {
        self.lap.distance_m.or(self.lap.reps)
    }
}

/// Produce `spec.count` drafts numbered from `existing_max + 1`.
///
/// Values below zero are clamped to zero.
pub fn generate_repetitions(spec: &RepetitionSpec, existing_max: i32) -> EngineResult<Vec<LapDraft>> {
    if spec.count == 0 || spec.count > MAX_REPETITIONS {
        return Err(EngineError::InvalidInput(format!(
            "repetition count must be between 1 and {MAX_REPETITIONS}, got {}",
            spec.count
        )));
    }
    if existing_max < 0 {
        return Err(EngineError::InvalidInput(format!(
            "existing repetition number cannot be negative ({existing_max})"
        )));
    }

    let drafts = (0..spec.count)
        .map(|i| {
            let raw = spec.base_value as i64 + spec.pattern.offset(i, spec.count) * spec.amount as i64;
            let value = raw.clamp(0, i32::MAX as i64) as i32;
            let (distance_m, reps) = match spec.class {
                DisciplineClass::Distance => (Some(value), None),
                DisciplineClass::Load => (None, Some(value)),
            };
            LapDraft {
                repetition_number: existing_max + 1 + i as i32,
                lap: NewLap {
                    distance_m,
                    reps,
                    load_kg: spec.load_kg,
                    pace_seconds: spec.pace_seconds,
                    rest_seconds: spec.rest_seconds,
                    duration_seconds: None,
                    notes: None,
                },
            }
        })
        .collect();

    Ok(drafts)
}
