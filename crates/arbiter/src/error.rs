//! Error types for the arbiter and its service.

use thiserror::Error;

/// Errors reported by a [`crate::VolumeActuator`].
///
/// The arbiter never propagates these: a failed read or write is treated as
/// a write that hasn't been confirmed yet.
#[derive(Debug, Error)]
pub enum ActuatorError {
    /// The output device could not be reached.
    #[error("volume actuator unavailable: {0}")]
    Unavailable(String),

    /// Reading the current level failed.
    #[error("failed to read volume: {0}")]
    Read(String),

    /// Writing a new level failed.
    #[error("failed to write volume: {0}")]
    Write(String),

    /// The device answered with something we could not parse.
    #[error("unexpected actuator output: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the async [`crate::ArbiterHandle`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The arbiter task has stopped; nothing more can be submitted.
    #[error("arbiter service is closed")]
    Closed,

    /// The arbiter task panicked or was aborted.
    #[error("arbiter task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
