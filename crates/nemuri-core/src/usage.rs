//! Phone-usage tracking during the pre-sleep countdown.
//!
//! Time spent outside this app is the proxy for "using the phone":
//! leaving for another app (or the home screen) during bedtime prep is
//! exactly the behavior being measured, while watching the monitor
//! screen itself is not. The tracker records the moment the app goes
//! to the background and adds the elapsed seconds when it returns.
//!
//! Seconds are accumulated internally and reported as minutes rounded
//! up, so short switches (30 s + 40 s) still add up correctly and any
//! nonzero usage reports as at least one minute.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Foreground/background state of the application, as reported by the
/// host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Foreground,
    Background,
}

/// Snapshot of the current usage window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageWindow {
    pub usage_seconds: u64,
    pub is_outside_app: bool,
}

/// Accumulates time spent outside the app while tracking is on.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    tracking: bool,
    accumulated_secs: u64,
    background_since: Option<DateTime<Utc>>,
    outside_app: bool,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin tracking. Any stale background mark is discarded.
    pub fn start_tracking(&mut self) {
        self.tracking = true;
        self.background_since = None;
        self.outside_app = false;
    }

    /// Stop tracking, flushing a currently-open background interval
    /// first so usage accrued right up to the stop is not lost.
    pub fn stop_tracking(&mut self, now: DateTime<Utc>) {
        self.flush(now);
        self.tracking = false;
        self.outside_app = false;
    }

    /// Zero the accumulator. Used at the phase boundary so each phase
    /// measures its own usage window.
    pub fn reset_counter(&mut self) {
        self.accumulated_secs = 0;
        self.background_since = None;
    }

    /// Feed a foreground/background transition. Ignored while not
    /// tracking.
    pub fn on_app_state(&mut self, state: AppState, now: DateTime<Utc>) {
        if !self.tracking {
            return;
        }
        match state {
            AppState::Foreground => {
                self.outside_app = false;
                self.flush(now);
            }
            AppState::Background => {
                if self.background_since.is_none() {
                    self.background_since = Some(now);
                    self.outside_app = true;
                }
            }
        }
    }

    /// Accumulated usage in whole minutes, rounded up.
    pub fn usage_minutes(&self) -> u32 {
        self.accumulated_secs.div_ceil(60) as u32
    }

    /// Whether the app is currently in the background.
    pub fn is_outside_app(&self) -> bool {
        self.outside_app
    }

    /// Current window snapshot.
    pub fn window(&self) -> UsageWindow {
        UsageWindow {
            usage_seconds: self.accumulated_secs,
            is_outside_app: self.outside_app,
        }
    }

    fn flush(&mut self, now: DateTime<Utc>) {
        if let Some(since) = self.background_since.take() {
            let secs = (now - since).num_seconds();
            if secs > 0 {
                self.accumulated_secs += secs as u64;
            }
        }
    }
}
