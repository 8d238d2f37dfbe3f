//! Debounced device-orientation classification.
//!
//! Classifies the accelerometer's vertical-axis component into
//! face-up / face-down / other, and suppresses chatter by requiring
//! the same classification for three consecutive samples before the
//! reported orientation changes.

use serde::{Deserialize, Serialize};

/// Device orientation as reported after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    FaceUp,
    FaceDown,
    Other,
}

/// Samples required before a new classification is reported.
const DEBOUNCE_COUNT: u32 = 3;

/// Vertical-axis component above which the device counts as face-up.
const FACE_UP_THRESHOLD: f64 = 0.8;
/// Vertical-axis component below which the device counts as face-down.
const FACE_DOWN_THRESHOLD: f64 = -0.8;

/// Instantaneous classification of one vertical-axis sample.
pub fn classify_vertical_axis(z: f64) -> Orientation {
    if z > FACE_UP_THRESHOLD {
        Orientation::FaceUp
    } else if z < FACE_DOWN_THRESHOLD {
        Orientation::FaceDown
    } else {
        Orientation::Other
    }
}

/// Chatter-suppressing orientation filter.
///
/// A candidate classification must repeat for [`DEBOUNCE_COUNT`]
/// consecutive samples before the reported orientation flips; a single
/// deviating sample restarts the candidate count and leaves the
/// reported value untouched.
#[derive(Debug, Clone)]
pub struct OrientationFilter {
    reported: Orientation,
    pending: Orientation,
    count: u32,
}

impl Default for OrientationFilter {
    fn default() -> Self {
        Self {
            reported: Orientation::Other,
            pending: Orientation::Other,
            count: 0,
        }
    }
}

impl OrientationFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one vertical-axis sample; returns the (possibly updated)
    /// reported orientation.
    pub fn push(&mut self, z: f64) -> Orientation {
        let detected = classify_vertical_axis(z);

        if detected == self.pending {
            self.count += 1;
        } else {
            self.pending = detected;
            self.count = 1;
        }

        if self.count >= DEBOUNCE_COUNT {
            self.reported = detected;
        }
        self.reported
    }

    /// Currently reported (debounced) orientation.
    pub fn orientation(&self) -> Orientation {
        self.reported
    }
}
