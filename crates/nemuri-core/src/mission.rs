//! Morning mission verification contract.
//!
//! In the strict alarm phase, with a mission configured, stopping the
//! alarm requires a photo that an external verifier accepts as showing
//! the configured target. A rejected photo is a normal outcome, not an
//! error: the alarm keeps ringing and the caller offers a retry.

use serde::{Deserialize, Serialize};

use crate::error::MissionError;

/// Result of submitting a mission photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionOutcome {
    /// The photo matched; the alarm has been reset.
    Passed,
    /// The photo did not match; the alarm keeps ringing, retry.
    Rejected,
}

/// Photo verification collaborator.
pub trait ImageVerifier: Send + Sync {
    /// Whether `image` shows the `target_label` object.
    fn verify(&self, image: &[u8], target_label: &str) -> Result<bool, MissionError>;
}

/// Verifier that accepts every photo. Useful for the CLI and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPass;

impl ImageVerifier for AlwaysPass {
    fn verify(&self, _image: &[u8], _target_label: &str) -> Result<bool, MissionError> {
        Ok(true)
    }
}

/// Verifier that rejects every photo.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReject;

impl ImageVerifier for AlwaysReject {
    fn verify(&self, _image: &[u8], _target_label: &str) -> Result<bool, MissionError> {
        Ok(false)
    }
}
