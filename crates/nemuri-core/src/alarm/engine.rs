//! Alarm escalation state machine.
//!
//! Wall-clock-based and caller-ticked, like the sleep monitor. A
//! runtime checks the clock every second, ramps the volume every ten,
//! and re-derives the resilience window every five; this type holds
//! the state and the transition rules.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Gentle -> Strict -> Idle
//!           \________________/
//!            stop / snooze / mission
//! ```
//!
//! Every exit path resets the state to its initial value; snooze
//! additionally leaves `is_snoozed` set so a host can tell the two
//! apart. Volume never decreases while ringing.

use chrono::{DateTime, Local, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AlarmConfig;
use crate::events::Event;

/// Cadence for the wake-time clock check.
pub const CLOCK_CHECK_SECS: u64 = 1;
/// Cadence for the gentle-phase volume ramp.
pub const VOLUME_RAMP_SECS: u64 = 10;
/// Cadence for the escalation (window) check.
pub const ESCALATION_CHECK_SECS: u64 = 5;

/// Volume the gentle phase starts at.
pub const INITIAL_VOLUME: f64 = 0.2;
/// Volume added per ramp tick.
pub const VOLUME_STEP: f64 = 0.05;

/// The wake-time match only fires within the first seconds of the
/// minute, so one minute cannot trigger twice.
const TRIGGER_WINDOW_SECS: u32 = 2;

/// Urgency phase of a ringing alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlarmPhase {
    #[default]
    Idle,
    Gentle,
    Strict,
}

/// Alarm state as exposed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AlarmState {
    pub is_ringing: bool,
    pub current_phase: AlarmPhase,
    pub volume: f64,
    pub is_snoozed: bool,
    pub alarm_start_time: Option<DateTime<Utc>>,
}

/// What a stop request resulted in.
#[derive(Debug, Clone)]
pub enum StopOutcome {
    /// The alarm was reset.
    Stopped(Event),
    /// Strict phase with a mission configured: the caller must submit
    /// a photo of the target before the alarm will stop.
    MissionRequired { target: String },
    /// Nothing was ringing.
    NotRinging,
}

/// The wake-up alarm state machine.
#[derive(Debug)]
pub struct AlarmEngine {
    config: AlarmConfig,
    state: AlarmState,
    /// Bumped whenever ringing starts or ends; an escalation window
    /// derived for an older generation is discarded.
    generation: u64,
}

impl AlarmEngine {
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            state: AlarmState::default(),
            generation: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn snapshot(&self) -> AlarmState {
        self.state.clone()
    }

    pub fn is_ringing(&self) -> bool {
        self.state.is_ringing
    }

    pub fn phase(&self) -> AlarmPhase {
        self.state.current_phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    /// Minutes of ringing so far, fractional.
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        self.state
            .alarm_start_time
            .map(|start| (now - start).num_seconds() as f64 / 60.0)
            .unwrap_or(0.0)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// One-second clock check: fires when the local wall clock reaches
    /// the configured wake time, only within the first seconds of that
    /// minute and only if not already ringing.
    pub fn check_trigger(
        &mut self,
        now_local: DateTime<Local>,
        wake_hour: u32,
        wake_minute: u32,
    ) -> Option<Event> {
        if self.state.is_ringing {
            return None;
        }
        if now_local.hour() == wake_hour
            && now_local.minute() == wake_minute
            && now_local.second() < TRIGGER_WINDOW_SECS
        {
            return Some(self.trigger(now_local.with_timezone(&Utc)));
        }
        None
    }

    /// Start ringing immediately.
    pub fn trigger(&mut self, now: DateTime<Utc>) -> Event {
        self.generation += 1;
        self.state = AlarmState {
            is_ringing: true,
            current_phase: AlarmPhase::Gentle,
            volume: INITIAL_VOLUME,
            is_snoozed: false,
            alarm_start_time: Some(now),
        };
        Event::AlarmTriggered {
            volume: INITIAL_VOLUME,
            at: now,
        }
    }

    /// Ten-second ramp tick: raise the gentle-phase volume one step,
    /// capped at 1.0. Strict volume is already pinned at maximum.
    pub fn tick_volume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.state.is_ringing || self.state.current_phase != AlarmPhase::Gentle {
            return None;
        }
        let next = (self.state.volume + VOLUME_STEP).min(1.0);
        if next <= self.state.volume {
            return None;
        }
        self.state.volume = next;
        Some(Event::AlarmVolumeChanged {
            volume: next,
            at: now,
        })
    }

    /// Apply an escalation check against a freshly derived resilience
    /// window. The window was computed asynchronously, so it carries
    /// the generation it was derived for; a stale one is ignored.
    pub fn apply_escalation(
        &mut self,
        generation: u64,
        window_minutes: i64,
        now: DateTime<Utc>,
    ) -> Option<Event> {
        if generation != self.generation
            || !self.state.is_ringing
            || self.state.current_phase != AlarmPhase::Gentle
        {
            return None;
        }
        let elapsed = self.elapsed_minutes(now);
        if elapsed < window_minutes as f64 {
            return None;
        }
        self.state.current_phase = AlarmPhase::Strict;
        self.state.volume = 1.0;
        Some(Event::AlarmEscalated {
            window_minutes,
            elapsed_minutes: elapsed.floor() as i64,
            at: now,
        })
    }

    /// Snooze. Only available while gentle; resets everything to idle
    /// values except the snoozed marker. No re-trigger is scheduled --
    /// whether a snoozed alarm should ring again is the host's call.
    pub fn snooze(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.state.is_ringing || self.state.current_phase != AlarmPhase::Gentle {
            return None;
        }
        self.reset();
        self.state.is_snoozed = true;
        Some(Event::AlarmSnoozed { at: now })
    }

    /// Request a stop. In the strict phase with a mission configured
    /// this does not stop anything -- it tells the caller which photo
    /// to produce.
    pub fn request_stop(&mut self, now: DateTime<Utc>) -> StopOutcome {
        if !self.state.is_ringing {
            return StopOutcome::NotRinging;
        }
        if self.state.current_phase == AlarmPhase::Strict && self.config.mission_enabled {
            return StopOutcome::MissionRequired {
                target: self.config.mission_target.clone(),
            };
        }
        let phase = self.state.current_phase;
        self.reset();
        StopOutcome::Stopped(Event::AlarmStopped { phase, at: now })
    }

    /// Apply a mission verification result. A pass resets the alarm;
    /// a rejection keeps it ringing and reports the failure so the
    /// caller can offer a retry.
    pub fn complete_mission(&mut self, passed: bool, now: DateTime<Utc>) -> Vec<Event> {
        if !self.state.is_ringing {
            return Vec::new();
        }
        let target = self.config.mission_target.clone();
        if passed {
            let phase = self.state.current_phase;
            self.reset();
            vec![
                Event::MissionPassed { target, at: now },
                Event::AlarmStopped { phase, at: now },
            ]
        } else {
            vec![Event::MissionFailed { target, at: now }]
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Every exit path funnels through here: all fields back to their
    /// initial values, and the generation moves on so in-flight window
    /// computations die quietly.
    fn reset(&mut self) {
        self.state = AlarmState::default();
        self.generation += 1;
    }
}
