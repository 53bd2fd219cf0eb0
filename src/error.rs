//! Error types returned by engine operations

use thiserror::Error;

use crate::state::TimerId;

/// Errors surfaced by the timer engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A timer definition was rejected at creation time
    #[error("invalid timer definition: {0}")]
    InvalidInput(String),

    /// The operation referenced a timer id that does not exist
    #[error("unknown timer: {0}")]
    UnknownTimer(TimerId),

    /// Reading, writing or deleting the durable snapshot failed
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// The engine lock was poisoned by a panicking holder
    #[error("engine state poisoned: {0}")]
    StatePoisoned(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
