//! Error type shared by every engine operation.

use std::fmt;

use uuid::Uuid;

/// Hierarchy entity named in an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Plan,
    Week,
    Day,
    Session,
    MoveUnit,
    Lap,
    Template,
    Period,
    Technique,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plan => "plan",
            Self::Week => "week",
            Self::Day => "day",
            Self::Session => "session",
            Self::MoveUnit => "move unit",
            Self::Lap => "lap",
            Self::Template => "template",
            Self::Period => "period",
            Self::Technique => "technique",
        })
    }
}

/// Failure of a structural operation. None of these leave partial writes:
/// the transaction is dropped without commit.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: Uuid },

    #[error("caller {caller} may not modify plan {plan_id}")]
    Forbidden { caller: Uuid, plan_id: Uuid },

    #[error("{entity} {id} is at capacity ({limit} max)")]
    CapacityExceeded {
        entity: Entity,
        id: Uuid,
        limit: usize,
    },

    #[error("target is occupied ({existing}); re-issue with an explicit resolution")]
    ConflictRequiresConfirmation { existing: String },

    #[error("invalid position: {0}")]
    InvalidPosition(String),

    #[error("malformed template: {0}")]
    MalformedTemplate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Flat discriminant of [`EngineError`] for callers that branch on kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    CapacityExceeded,
    ConflictRequiresConfirmation,
    InvalidPosition,
    MalformedTemplate,
    InvalidInput,
    Storage,
}

impl EngineError {
    pub fn not_found(entity: Entity, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::ConflictRequiresConfirmation { .. } => ErrorKind::ConflictRequiresConfirmation,
            Self::InvalidPosition(_) => ErrorKind::InvalidPosition,
            Self::MalformedTemplate(_) => ErrorKind::MalformedTemplate,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True when the caller is expected to follow up with a resolution
    /// choice rather than give up.
    pub fn is_resolvable(&self) -> bool {
        matches!(self, Self::ConflictRequiresConfirmation { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
