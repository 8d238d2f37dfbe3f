use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmPhase;
use crate::monitor::{MonitorPhase, SleepScore, WarningLevel};

/// Environment channel an alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentChannel {
    Light,
    Noise,
}

/// Every state change in the system produces an Event.
/// The GUI polls for events; the CLI prints them as JSON lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    MonitorStarted {
        sleep_time: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    PhaseChanged {
        from: MonitorPhase,
        to: MonitorPhase,
        at: DateTime<Utc>,
    },
    /// A usage warning fired (at most once per phase per session).
    UsageWarning {
        phase: MonitorPhase,
        level: WarningLevel,
        usage_minutes: u32,
        message: String,
        at: DateTime<Utc>,
    },
    /// An environment ceiling was exceeded and passed the cooldown gate.
    EnvironmentAlert {
        channel: EnvironmentChannel,
        value: f64,
        ceiling: f64,
        at: DateTime<Utc>,
    },
    /// Phase 3 in-app full-screen warning with advice text.
    EnvironmentAdvice {
        message: String,
        at: DateTime<Utc>,
    },
    ScoreUpdated {
        score: SleepScore,
        at: DateTime<Utc>,
    },
    /// The countdown reached the sleep time; monitoring auto-stopped.
    MonitorCompleted {
        score: SleepScore,
        at: DateTime<Utc>,
    },
    MonitorStopped {
        score: SleepScore,
        at: DateTime<Utc>,
    },
    AlarmTriggered {
        volume: f64,
        at: DateTime<Utc>,
    },
    AlarmVolumeChanged {
        volume: f64,
        at: DateTime<Utc>,
    },
    /// Gentle -> Strict escalation; volume is forced to 1.0.
    AlarmEscalated {
        window_minutes: i64,
        elapsed_minutes: i64,
        at: DateTime<Utc>,
    },
    AlarmSnoozed {
        at: DateTime<Utc>,
    },
    AlarmStopped {
        phase: AlarmPhase,
        at: DateTime<Utc>,
    },
    /// Mission photo matched the target; the alarm was reset.
    MissionPassed {
        target: String,
        at: DateTime<Utc>,
    },
    /// Mission photo did not match; the alarm keeps ringing and the
    /// caller should offer a retry.
    MissionFailed {
        target: String,
        at: DateTime<Utc>,
    },
}
