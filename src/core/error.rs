//! Error types for core module
//!
//! Provides custom error types for application infrastructure: settings
//! persistence, the puzzle catalog and the session actor.

use battler_engine::EngineError;
use thiserror::Error;

/// Errors that can occur outside the pure engine
#[derive(Error, Debug)]
pub enum CoreError {
    /// File or console I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or catalog serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No puzzle with this id in the catalog
    #[error("Unknown puzzle: {id}")]
    UnknownPuzzle { id: String },

    /// The catalog parsed but its contents are unusable
    #[error("Puzzle catalog error: {message}")]
    Catalog { message: String },

    /// Puzzle load failed inside the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The session actor has stopped and no longer answers
    #[error("Session actor is no longer running")]
    SessionClosed,
}

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;
