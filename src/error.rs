//! Error types for the rules engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtgError {
    /// A card or game was built from inconsistent parts (no type, no owner, too few players)
    #[error("Invalid construction: {0}")]
    InvalidConstruction(String),

    #[error("Entity not found: {0}")]
    EntityNotFound(u32),

    #[error("Invalid game action: {0}")]
    InvalidAction(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// A second selection was requested for a player who still has one outstanding
    #[error("Player {0} already has a pending selection")]
    SelectionPending(u32),

    #[error("Player {0} has no pending selection")]
    NoPendingSelection(u32),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for MtgError {
    fn from(err: serde_json::Error) -> Self {
        MtgError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MtgError>;
