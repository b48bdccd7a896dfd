//! Error types shared by the simulation core

use thiserror::Error;

/// Errors raised by lattice setup, parameter changes and control transitions.
///
/// Every variant is reported before any simulation state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("lattice dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("temperature must be positive and finite, got {0}")]
    InvalidTemperature(f64),

    #[error("coupling constant must be finite and nonzero, got {0}")]
    InvalidCoupling(f64),

    #[error("external field must be finite, got {0}")]
    InvalidField(f64),

    #[error("unknown parameter '{0}' (expected temperature, field or coupling)")]
    UnknownParameter(String),

    #[error("cannot resize while the simulation is running; stop it first")]
    ResizeWhileRunning,

    #[error("sweeps per tick must be at least 1, got {0}")]
    InvalidSweepRate(usize),

    #[error("invalid control transition: {0}")]
    InvalidTransition(String),

    #[error("simulation worker is no longer running")]
    WorkerDisconnected,

    #[error("invalid scan setup: {0}")]
    InvalidScan(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
