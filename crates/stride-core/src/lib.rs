//! The plan hierarchy and reorganization engine.
//!
//! Leaf-first: [`ordering`] (letter labels), [`reps`] (repetition
//! generator), [`duplicate`] (deep copies), [`conflict`] (conflict
//! detection and resolution), and [`structure`] (the transactional
//! operations callers use).

pub mod access;
pub mod config;
pub mod conflict;
pub mod duplicate;
pub mod error;
pub mod ordering;
pub mod reps;
pub mod structure;
pub mod summary;
pub mod template;
pub mod tree;

pub use access::{AccessPolicy, Caller, CallerGrant, OwnerOnly};
pub use config::EngineConfig;
pub use conflict::{SessionAction, UnitAction, UnitPlacement};
pub use error::{EngineError, EngineResult, Entity, ErrorKind};
pub use reps::{LapDraft, RepetitionSpec, VariationPattern, generate_repetitions};
pub use structure::{NewPlan, PlanStructureManager, WeekCopyMode};
pub use summary::{MoveUnitSummary, SessionSummary, WeekCopyReport};
pub use template::TemplateBody;
