//! State types for the sleep monitor.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::usage::UsageWindow;

/// Countdown phase of the pre-sleep monitor.
///
/// Derived purely from the time remaining until the target bedtime;
/// ordering matches progression so transitions can be kept
/// monotonically forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum MonitorPhase {
    Idle,
    Phase1,
    Phase2,
    Phase3,
    Completed,
}

impl MonitorPhase {
    /// Phase for a given target bedtime at a given instant.
    ///
    /// More than 60 minutes out is not a monitored window; 60..30 is
    /// phase 1, 30..10 phase 2, the last 10 minutes phase 3, and
    /// anything at or past the bedtime is completed.
    pub fn for_sleep_time(sleep_time: DateTime<Utc>, now: DateTime<Utc>) -> MonitorPhase {
        let remaining_secs = (sleep_time - now).num_seconds();
        if remaining_secs <= 0 {
            MonitorPhase::Completed
        } else if remaining_secs <= 10 * 60 {
            MonitorPhase::Phase3
        } else if remaining_secs <= 30 * 60 {
            MonitorPhase::Phase2
        } else if remaining_secs <= 60 * 60 {
            MonitorPhase::Phase1
        } else {
            MonitorPhase::Idle
        }
    }
}

/// Severity of a usage warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    Normal,
    Strict,
}

/// A recorded usage warning. At most one per phase per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub id: Uuid,
    pub phase: MonitorPhase,
    pub level: WarningLevel,
    pub message: String,
    pub triggered_at: DateTime<Utc>,
}

/// Latest ambient readings and their threshold flags. `None` means
/// the reading is unavailable and is never treated as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EnvironmentSample {
    pub light_lux: Option<f64>,
    pub noise_db: Option<f64>,
    pub light_exceeded: bool,
    pub noise_exceeded: bool,
}

/// Full snapshot of the monitor, as exposed to the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorState {
    pub sleep_time: Option<DateTime<Utc>>,
    pub current_phase: MonitorPhase,
    pub is_monitoring: bool,
    pub environment: EnvironmentSample,
    pub usage: UsageWindow,
    pub usage_minutes: u32,
    pub warnings: Vec<Warning>,
    pub score: super::SleepScore,
    pub monitor_start_time: Option<DateTime<Utc>>,
}
