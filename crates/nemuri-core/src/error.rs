//! Core error types for nemuri-core.
//!
//! Everything in this crate is locally recoverable: sensor problems
//! degrade to a missing reading, advice and calendar problems degrade
//! to "no message" / the configured base window. Nothing here is meant
//! to abort a running state machine.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for nemuri-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Sensor-related errors
    #[error("Sensor error: {0}")]
    Sensor(#[from] SensorError),

    /// Advice generator errors
    #[error("Advice error: {0}")]
    Advice(#[from] AdviceError),

    /// Calendar provider errors
    #[error("Calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// Mission verification errors
    #[error("Mission error: {0}")]
    Mission(#[from] MissionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Background task lifecycle errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// The hardware source a sensor error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Light,
    Accelerometer,
    Noise,
    Camera,
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SensorKind::Light => "light",
            SensorKind::Accelerometer => "accelerometer",
            SensorKind::Noise => "noise",
            SensorKind::Camera => "camera",
        };
        f.write_str(name)
    }
}

/// Sensor-specific errors. Callers treat all of these as "no reading".
#[derive(Error, Debug)]
pub enum SensorError {
    /// No hardware present on this host
    #[error("{kind} sensor not available")]
    Unavailable { kind: SensorKind },

    /// The OS denied access to the sensor
    #[error("permission denied for {kind} sensor")]
    PermissionDenied { kind: SensorKind },

    /// A read was attempted and failed
    #[error("{kind} sensor read failed: {message}")]
    ReadFailed { kind: SensorKind, message: String },
}

/// Advice generator errors. The owning state machine logs and drops
/// the message; phase progression is unaffected.
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("advice generation failed: {0}")]
    GenerationFailed(String),

    #[error("advice generator not available")]
    Unavailable,
}

/// Calendar provider errors. The resilience-window computation falls
/// back to the configured base window on any of these.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("calendar fetch failed: {0}")]
    FetchFailed(String),

    #[error("calendar provider not available")]
    Unavailable,
}

/// Mission verification errors. The alarm keeps ringing on all of
/// these; a rejected (non-matching) image is not an error but a
/// [`MissionOutcome`](crate::mission::MissionOutcome).
#[derive(Error, Debug)]
pub enum MissionError {
    #[error("image capture failed: {0}")]
    CaptureFailed(String),

    #[error("image verification failed: {0}")]
    VerificationFailed(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// No config directory could be resolved on this host
    #[error("No configuration directory available")]
    NoConfigDir,
}

/// Background task lifecycle errors, surfaced to the caller as values
/// so a failed start/stop never corrupts the owning state machine.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("{0} is already running")]
    AlreadyRunning(&'static str),

    #[error("{0} is not running")]
    NotRunning(&'static str),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
