//! Sleep monitor state machine.
//!
//! Wall-clock-driven and caller-ticked: the engine holds no timers and
//! never blocks. A runtime (or a test) calls `tick()` on a 10 s
//! cadence and `observe_environment()` whenever a sensor reading
//! lands. Advice lookups are asynchronous from the engine's point of
//! view -- a tick hands back [`AdviceRequest`]s, the caller resolves
//! them out of band, and the engine applies a resolution only if its
//! stamp is still live.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Phase1 -> Phase2 -> Phase3 -> Completed
//! ```
//!
//! Phases only move forward; the sole way back is stopping and
//! starting a new session.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{EnvironmentSample, MonitorPhase, MonitorState, SleepScore, Warning, WarningLevel};
use crate::advice::EventImportance;
use crate::config::MonitorConfig;
use crate::dispatch::{keys, NotificationDispatcher};
use crate::events::{EnvironmentChannel, Event};
use crate::usage::{AppState, UsageTracker};

/// Cadence at which the owner should call [`SleepMonitor::tick`].
pub const PHASE_TICK_SECS: u64 = 10;

/// Identifies which session and phase produced an advice request, so
/// a response that arrives late can be recognized as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdviceStamp {
    pub generation: u64,
    pub phase: MonitorPhase,
}

/// Work the engine wants done off the tick path.
#[derive(Debug, Clone)]
pub enum AdviceRequest {
    /// Fetch tomorrow's events, judge importance, generate a usage
    /// warning message, then call `resolve_usage_warning`.
    UsageWarning {
        stamp: AdviceStamp,
        usage_minutes: u32,
    },
    /// Generate environment advice for the phase 3 full-screen
    /// warning, then call `resolve_environment_advice`.
    EnvironmentAdvice {
        stamp: AdviceStamp,
        light_lux: Option<f64>,
        noise_db: Option<f64>,
    },
}

/// Result of a tick or an observation: events for consumers plus any
/// asynchronous work for the runtime.
#[derive(Debug, Default)]
pub struct TickOutput {
    pub events: Vec<Event>,
    pub requests: Vec<AdviceRequest>,
}

impl TickOutput {
    fn event(event: Event) -> Self {
        Self {
            events: vec![event],
            requests: Vec::new(),
        }
    }
}

/// The pre-sleep monitoring state machine.
#[derive(Debug)]
pub struct SleepMonitor {
    config: MonitorConfig,
    sleep_time: Option<DateTime<Utc>>,
    phase: MonitorPhase,
    monitoring: bool,
    monitor_start: Option<DateTime<Utc>>,
    environment: EnvironmentSample,
    warnings: Vec<Warning>,
    score: SleepScore,
    usage: UsageTracker,
    dispatcher: NotificationDispatcher,
    /// Bumped on every session start and stop; stale async responses
    /// carry an older value and are discarded.
    generation: u64,
    phase1_requested: bool,
    phase2_requested: bool,
    env_advice_in_flight: bool,
    latest_warning: Option<Warning>,
    active_advice: Option<String>,
}

impl SleepMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            sleep_time: None,
            phase: MonitorPhase::Idle,
            monitoring: false,
            monitor_start: None,
            environment: EnvironmentSample::default(),
            warnings: Vec::new(),
            score: SleepScore::default(),
            usage: UsageTracker::new(),
            dispatcher: NotificationDispatcher::new(),
            generation: 0,
            phase1_requested: false,
            phase2_requested: false,
            env_advice_in_flight: false,
            latest_warning: None,
            active_advice: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn phase(&self) -> MonitorPhase {
        self.phase
    }

    pub fn score(&self) -> SleepScore {
        self.score
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn usage_minutes(&self) -> u32 {
        self.usage.usage_minutes()
    }

    /// Seconds until the current phase ends, or 0 when not monitoring.
    pub fn remaining_in_phase_secs(&self, now: DateTime<Utc>) -> i64 {
        let Some(sleep_time) = self.sleep_time else {
            return 0;
        };
        let phase_end = match self.phase {
            MonitorPhase::Phase1 => sleep_time - Duration::minutes(30),
            MonitorPhase::Phase2 => sleep_time - Duration::minutes(10),
            MonitorPhase::Phase3 => sleep_time,
            _ => return 0,
        };
        (phase_end - now).num_seconds().max(0)
    }

    /// Seconds until the target bedtime, or 0 when not monitoring.
    pub fn total_remaining_secs(&self, now: DateTime<Utc>) -> i64 {
        self.sleep_time
            .map(|t| (t - now).num_seconds().max(0))
            .unwrap_or(0)
    }

    /// Most recent warning, if the consumer has not taken it yet.
    pub fn latest_warning(&self) -> Option<&Warning> {
        self.latest_warning.as_ref()
    }

    /// Take the most recent warning for display.
    pub fn take_latest_warning(&mut self) -> Option<Warning> {
        self.latest_warning.take()
    }

    /// Active phase 3 full-screen environment advice, if any.
    pub fn active_advice(&self) -> Option<&str> {
        self.active_advice.as_deref()
    }

    pub fn dismiss_advice(&mut self) {
        self.active_advice = None;
    }

    /// Build a full state snapshot.
    pub fn snapshot(&self) -> MonitorState {
        MonitorState {
            sleep_time: self.sleep_time,
            current_phase: self.phase,
            is_monitoring: self.monitoring,
            environment: self.environment,
            usage: self.usage.window(),
            usage_minutes: self.usage.usage_minutes(),
            warnings: self.warnings.clone(),
            score: self.score,
            monitor_start_time: self.monitor_start,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin a monitoring session counting down to `sleep_time`.
    ///
    /// Monitoring always begins in phase 1; the first tick will move
    /// the phase forward if the countdown is already shorter.
    pub fn start_monitoring(&mut self, sleep_time: DateTime<Utc>, now: DateTime<Utc>) -> TickOutput {
        self.generation += 1;
        self.sleep_time = Some(sleep_time);
        self.phase = MonitorPhase::Phase1;
        self.monitoring = true;
        self.monitor_start = Some(now);
        self.environment = EnvironmentSample::default();
        self.warnings.clear();
        self.score = SleepScore::default();
        self.phase1_requested = false;
        self.phase2_requested = false;
        self.env_advice_in_flight = false;
        self.latest_warning = None;
        self.active_advice = None;
        self.usage.reset_counter();
        self.usage.start_tracking();
        self.dispatcher.reset_cooldowns();

        TickOutput::event(Event::MonitorStarted {
            sleep_time,
            at: now,
        })
    }

    /// Stop the session. Computes the final score first so a warning
    /// that fired moments ago still counts. Idempotent: stopping an
    /// already-stopped monitor does nothing.
    pub fn stop_monitoring(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        if !self.monitoring {
            return Vec::new();
        }
        self.recalculate_score();
        self.finish_session(now);
        vec![Event::MonitorStopped {
            score: self.score,
            at: now,
        }]
    }

    /// Recompute the phase and run the usage-warning checks.
    /// Call on a [`PHASE_TICK_SECS`] cadence.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutput {
        let mut output = TickOutput::default();
        if !self.monitoring {
            return output;
        }
        let Some(sleep_time) = self.sleep_time else {
            return output;
        };

        let computed = MonitorPhase::for_sleep_time(sleep_time, now);
        // Forward only: a clock hiccup may compute an earlier phase,
        // but a reached phase is never left except through stop.
        if computed > self.phase {
            let from = self.phase;
            self.phase = computed;
            output.events.push(Event::PhaseChanged {
                from,
                to: computed,
                at: now,
            });

            if from == MonitorPhase::Phase1 && computed == MonitorPhase::Phase2 {
                // Each phase gets an independent usage window.
                self.usage.reset_counter();
            }

            if computed == MonitorPhase::Completed {
                self.recalculate_score();
                self.finish_session(now);
                output.events.push(Event::MonitorCompleted {
                    score: self.score,
                    at: now,
                });
                return output;
            }
        }

        self.check_usage_warnings(&mut output);
        output
    }

    /// Feed a foreground/background transition from the host platform.
    pub fn on_app_state(&mut self, state: AppState, now: DateTime<Utc>) {
        self.usage.on_app_state(state, now);
    }

    /// Feed the latest ambient readings. Missing readings are treated
    /// as "not exceeded" and never alert.
    pub fn observe_environment(
        &mut self,
        light_lux: Option<f64>,
        noise_db: Option<f64>,
        now: DateTime<Utc>,
    ) -> TickOutput {
        let mut output = TickOutput::default();
        if !self.monitoring {
            return output;
        }

        let light_exceeded = light_lux.is_some_and(|lux| lux >= self.config.light_ceiling_lux);
        let noise_exceeded = noise_db.is_some_and(|db| db >= self.config.noise_ceiling_db);
        self.environment = EnvironmentSample {
            light_lux,
            noise_db,
            light_exceeded,
            noise_exceeded,
        };

        let cooldown = Duration::seconds(self.config.notification_cooldown_secs as i64);
        if light_exceeded {
            if self.dispatcher.can_send(keys::LIGHT, cooldown, now) {
                output.events.push(Event::EnvironmentAlert {
                    channel: EnvironmentChannel::Light,
                    value: light_lux.unwrap_or_default(),
                    ceiling: self.config.light_ceiling_lux,
                    at: now,
                });
            }
            self.maybe_request_environment_advice(light_lux, noise_db, &mut output);
        }
        if noise_exceeded {
            if self.dispatcher.can_send(keys::NOISE, cooldown, now) {
                output.events.push(Event::EnvironmentAlert {
                    channel: EnvironmentChannel::Noise,
                    value: noise_db.unwrap_or_default(),
                    ceiling: self.config.noise_ceiling_db,
                    at: now,
                });
            }
            self.maybe_request_environment_advice(light_lux, noise_db, &mut output);
        }

        let before = self.score;
        self.recalculate_score();
        if self.score != before {
            output.events.push(Event::ScoreUpdated {
                score: self.score,
                at: now,
            });
        }
        output
    }

    /// Apply a resolved usage-warning lookup.
    ///
    /// Discarded outright when the stamp's generation is no longer
    /// current (the session it belonged to has ended). A response for
    /// a phase the session has since left is still recorded -- the
    /// warning legitimately belongs to that phase -- but the
    /// once-per-phase guard means it can never fire twice.
    pub fn resolve_usage_warning(
        &mut self,
        stamp: AdviceStamp,
        importance: EventImportance,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        if stamp.generation != self.generation || !self.monitoring {
            return Vec::new();
        }
        if self.warnings.iter().any(|w| w.phase == stamp.phase) {
            return Vec::new();
        }

        let level = match stamp.phase {
            MonitorPhase::Phase1 if importance == EventImportance::High => WarningLevel::Strict,
            MonitorPhase::Phase1 => WarningLevel::Normal,
            _ => WarningLevel::Strict,
        };
        // Advice failure degrades to an empty message; the warning and
        // its score penalty still land.
        let message = message.unwrap_or_default();
        let warning = Warning {
            id: Uuid::new_v4(),
            phase: stamp.phase,
            level,
            message: message.clone(),
            triggered_at: now,
        };
        self.warnings.push(warning.clone());
        self.latest_warning = Some(warning);
        self.recalculate_score();

        vec![
            Event::UsageWarning {
                phase: stamp.phase,
                level,
                usage_minutes: self.usage.usage_minutes(),
                message,
                at: now,
            },
            Event::ScoreUpdated {
                score: self.score,
                at: now,
            },
        ]
    }

    /// Apply a resolved environment-advice lookup (phase 3 full-screen
    /// warning). A failed lookup clears the in-flight flag and nothing
    /// else.
    pub fn resolve_environment_advice(
        &mut self,
        stamp: AdviceStamp,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Vec<Event> {
        self.env_advice_in_flight = false;
        if stamp.generation != self.generation || !self.monitoring {
            return Vec::new();
        }
        let Some(message) = message else {
            return Vec::new();
        };
        self.active_advice = Some(message.clone());
        vec![Event::EnvironmentAdvice { message, at: now }]
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn check_usage_warnings(&mut self, output: &mut TickOutput) {
        let minutes = self.usage.usage_minutes();
        match self.phase {
            MonitorPhase::Phase1
                if minutes >= self.config.phase1_warn_minutes && !self.phase1_requested =>
            {
                self.phase1_requested = true;
                output.requests.push(AdviceRequest::UsageWarning {
                    stamp: AdviceStamp {
                        generation: self.generation,
                        phase: MonitorPhase::Phase1,
                    },
                    usage_minutes: minutes,
                });
            }
            MonitorPhase::Phase2
                if minutes >= self.config.phase2_warn_minutes && !self.phase2_requested =>
            {
                self.phase2_requested = true;
                output.requests.push(AdviceRequest::UsageWarning {
                    stamp: AdviceStamp {
                        generation: self.generation,
                        phase: MonitorPhase::Phase2,
                    },
                    usage_minutes: minutes,
                });
            }
            _ => {}
        }
    }

    fn maybe_request_environment_advice(
        &mut self,
        light_lux: Option<f64>,
        noise_db: Option<f64>,
        output: &mut TickOutput,
    ) {
        if self.phase != MonitorPhase::Phase3 || self.env_advice_in_flight {
            return;
        }
        self.env_advice_in_flight = true;
        output.requests.push(AdviceRequest::EnvironmentAdvice {
            stamp: AdviceStamp {
                generation: self.generation,
                phase: MonitorPhase::Phase3,
            },
            light_lux,
            noise_db,
        });
    }

    fn recalculate_score(&mut self) {
        let phase1_warning = self.warnings.iter().any(|w| w.phase == MonitorPhase::Phase1);
        let phase2_warning = self.warnings.iter().any(|w| w.phase == MonitorPhase::Phase2);
        self.score = SleepScore::compute(
            phase1_warning,
            phase2_warning,
            self.environment.light_exceeded,
            self.environment.noise_exceeded,
        );
    }

    /// Shared teardown for stop and auto-completion. Bumps the
    /// generation so any in-flight lookup from this session is
    /// discarded on arrival.
    fn finish_session(&mut self, now: DateTime<Utc>) {
        self.monitoring = false;
        self.phase = MonitorPhase::Completed;
        self.usage.stop_tracking(now);
        self.dispatcher.reset_cooldowns();
        self.generation += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn monitor() -> SleepMonitor {
        SleepMonitor::new(MonitorConfig::default())
    }

    fn monitor_with(config: MonitorConfig) -> SleepMonitor {
        SleepMonitor::new(config)
    }

    #[test]
    fn start_enters_phase1() {
        let mut m = monitor();
        let now = Utc::now();
        let output = m.start_monitoring(now + Duration::minutes(45), now);
        assert!(m.is_monitoring());
        assert_eq!(m.phase(), MonitorPhase::Phase1);
        assert!(matches!(output.events[0], Event::MonitorStarted { .. }));
    }

    #[test]
    fn tick_advances_through_phases() {
        let mut m = monitor();
        let now = Utc::now();
        let sleep_time = now + Duration::minutes(45);
        m.start_monitoring(sleep_time, now);

        let output = m.tick(now + Duration::minutes(20));
        assert_eq!(m.phase(), MonitorPhase::Phase2);
        assert!(matches!(
            output.events[0],
            Event::PhaseChanged {
                from: MonitorPhase::Phase1,
                to: MonitorPhase::Phase2,
                ..
            }
        ));

        m.tick(now + Duration::minutes(40));
        assert_eq!(m.phase(), MonitorPhase::Phase3);
    }

    #[test]
    fn phase_never_moves_backward() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(20), now);
        m.tick(now);
        assert_eq!(m.phase(), MonitorPhase::Phase2);

        // A tick whose clock reads earlier computes phase 1; the
        // reported phase must stay put.
        let output = m.tick(now - Duration::minutes(20));
        assert_eq!(m.phase(), MonitorPhase::Phase2);
        assert!(output.events.is_empty());
    }

    #[test]
    fn completion_stops_monitoring_and_scores() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(5), now);
        assert_eq!(m.phase(), MonitorPhase::Phase1); // explicit start

        let output = m.tick(now + Duration::minutes(6));
        assert_eq!(m.phase(), MonitorPhase::Completed);
        assert!(!m.is_monitoring());
        assert!(output
            .events
            .iter()
            .any(|e| matches!(e, Event::MonitorCompleted { .. })));

        // Further ticks are inert.
        assert!(m.tick(now + Duration::minutes(7)).events.is_empty());
    }

    #[test]
    fn phase1_to_phase2_resets_usage_window() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::minutes(5));
        assert_eq!(m.usage_minutes(), 5);

        m.tick(now + Duration::minutes(20)); // -> phase2
        assert_eq!(m.usage_minutes(), 0);
    }

    #[test]
    fn phase1_warning_requested_once_at_threshold() {
        let mut m = monitor_with(MonitorConfig {
            phase1_warn_minutes: 2,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(90));

        let output = m.tick(now + Duration::minutes(2));
        assert_eq!(output.requests.len(), 1);
        let AdviceRequest::UsageWarning { stamp, usage_minutes } = &output.requests[0] else {
            panic!("expected a usage warning request");
        };
        assert_eq!(stamp.phase, MonitorPhase::Phase1);
        assert_eq!(*usage_minutes, 2);

        // The next tick must not request again.
        let output = m.tick(now + Duration::minutes(3));
        assert!(output.requests.is_empty());
    }

    #[test]
    fn resolved_warning_records_and_penalizes_once() {
        let mut m = monitor_with(MonitorConfig {
            phase1_warn_minutes: 1,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);
        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(70));
        let output = m.tick(now + Duration::minutes(2));
        let AdviceRequest::UsageWarning { stamp, .. } = output.requests[0].clone() else {
            panic!("expected a usage warning request");
        };

        let events = m.resolve_usage_warning(
            stamp,
            EventImportance::High,
            Some("put it down".into()),
            now + Duration::minutes(2),
        );
        assert!(matches!(
            events[0],
            Event::UsageWarning {
                level: WarningLevel::Strict,
                ..
            }
        ));
        assert_eq!(m.score().total, 80);
        assert_eq!(m.latest_warning().unwrap().message, "put it down");

        // Applying the same resolution again is a no-op.
        let events = m.resolve_usage_warning(
            stamp,
            EventImportance::High,
            Some("again".into()),
            now + Duration::minutes(3),
        );
        assert!(events.is_empty());
        assert_eq!(m.snapshot().warnings.len(), 1);
        assert_eq!(m.score().total, 80);
    }

    #[test]
    fn low_importance_phase1_warning_is_normal_level() {
        let mut m = monitor_with(MonitorConfig {
            phase1_warn_minutes: 1,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);
        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(61));
        let output = m.tick(now + Duration::minutes(2));
        let AdviceRequest::UsageWarning { stamp, .. } = output.requests[0].clone() else {
            panic!("expected a usage warning request");
        };

        m.resolve_usage_warning(stamp, EventImportance::Low, Some("wind down".into()), now);
        assert_eq!(m.latest_warning().unwrap().level, WarningLevel::Normal);
    }

    #[test]
    fn stale_generation_response_is_discarded() {
        let mut m = monitor_with(MonitorConfig {
            phase1_warn_minutes: 1,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);
        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(61));
        let output = m.tick(now + Duration::minutes(2));
        let AdviceRequest::UsageWarning { stamp, .. } = output.requests[0].clone() else {
            panic!("expected a usage warning request");
        };

        // The session ends before the lookup lands.
        m.stop_monitoring(now + Duration::minutes(3));
        let events =
            m.resolve_usage_warning(stamp, EventImportance::Low, Some("late".into()), now);
        assert!(events.is_empty());
        assert!(m.snapshot().warnings.is_empty());
    }

    #[test]
    fn late_same_session_response_is_recorded_under_its_phase() {
        let mut m = monitor_with(MonitorConfig {
            phase1_warn_minutes: 1,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);
        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(61));
        let output = m.tick(now + Duration::minutes(2));
        let AdviceRequest::UsageWarning { stamp, .. } = output.requests[0].clone() else {
            panic!("expected a usage warning request");
        };

        // Phase moves on before the advice resolves.
        m.tick(now + Duration::minutes(20));
        assert_eq!(m.phase(), MonitorPhase::Phase2);

        let events = m.resolve_usage_warning(
            stamp,
            EventImportance::Low,
            Some("belated".into()),
            now + Duration::minutes(20),
        );
        assert_eq!(events.len(), 2);
        let warnings = m.snapshot().warnings;
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].phase, MonitorPhase::Phase1);
        assert_eq!(m.phase(), MonitorPhase::Phase2);
        assert_eq!(m.score().usage_penalty, 20);
    }

    #[test]
    fn advice_failure_still_records_the_warning() {
        let mut m = monitor_with(MonitorConfig {
            phase2_warn_minutes: 1,
            ..MonitorConfig::default()
        });
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(20), now);
        m.tick(now); // -> phase2
        m.on_app_state(AppState::Background, now);
        m.on_app_state(AppState::Foreground, now + Duration::seconds(61));
        let output = m.tick(now + Duration::minutes(2));
        let AdviceRequest::UsageWarning { stamp, .. } = output.requests[0].clone() else {
            panic!("expected a usage warning request");
        };

        let events = m.resolve_usage_warning(stamp, EventImportance::Low, None, now);
        assert!(!events.is_empty());
        assert_eq!(m.score().usage_penalty, 40);
        assert_eq!(m.latest_warning().unwrap().message, "");
    }

    #[test]
    fn environment_alert_respects_cooldown() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        let output = m.observe_environment(Some(120.0), None, now);
        assert!(output
            .events
            .iter()
            .any(|e| matches!(e, Event::EnvironmentAlert { channel: EnvironmentChannel::Light, .. })));

        // Within the cooldown: flag still set, no new alert.
        let output = m.observe_environment(Some(120.0), None, now + Duration::seconds(5));
        assert!(!output
            .events
            .iter()
            .any(|e| matches!(e, Event::EnvironmentAlert { .. })));
        assert!(m.snapshot().environment.light_exceeded);

        // After the cooldown it fires again.
        let output = m.observe_environment(Some(120.0), None, now + Duration::seconds(31));
        assert!(output
            .events
            .iter()
            .any(|e| matches!(e, Event::EnvironmentAlert { .. })));
    }

    #[test]
    fn missing_readings_never_alert() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        let output = m.observe_environment(None, None, now);
        assert!(output.events.is_empty());
        assert!(output.requests.is_empty());
        let env = m.snapshot().environment;
        assert!(!env.light_exceeded);
        assert!(!env.noise_exceeded);
        assert_eq!(m.score().total, 100);
    }

    #[test]
    fn environment_advice_only_in_phase3() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        let output = m.observe_environment(Some(120.0), None, now);
        assert!(output.requests.is_empty()); // phase1: notification only

        let mut m = monitor();
        m.start_monitoring(now + Duration::minutes(5), now);
        m.tick(now); // -> phase3
        let output = m.observe_environment(Some(120.0), None, now);
        assert_eq!(output.requests.len(), 1);
        let AdviceRequest::EnvironmentAdvice { stamp, .. } = output.requests[0].clone() else {
            panic!("expected an environment advice request");
        };

        // In-flight guard: no second request until the first resolves.
        let output = m.observe_environment(Some(120.0), None, now + Duration::seconds(1));
        assert!(output.requests.is_empty());

        let events = m.resolve_environment_advice(stamp, Some("dim the lights".into()), now);
        assert!(matches!(events[0], Event::EnvironmentAdvice { .. }));
        assert_eq!(m.active_advice(), Some("dim the lights"));
        m.dismiss_advice();
        assert!(m.active_advice().is_none());
    }

    #[test]
    fn score_reflects_environment_flags() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        m.observe_environment(Some(120.0), Some(60.0), now);
        assert_eq!(m.score().total, 80);
        assert_eq!(m.score().environment_penalty, 20);

        // Readings back under the ceilings: penalty clears.
        m.observe_environment(Some(5.0), Some(30.0), now + Duration::seconds(40));
        assert_eq!(m.score().total, 100);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);

        let events = m.stop_monitoring(now + Duration::minutes(1));
        assert_eq!(events.len(), 1);
        assert!(!m.is_monitoring());

        let events = m.stop_monitoring(now + Duration::minutes(2));
        assert!(events.is_empty());
    }

    #[test]
    fn restart_clears_previous_session() {
        let mut m = monitor();
        let now = Utc::now();
        m.start_monitoring(now + Duration::minutes(45), now);
        m.observe_environment(Some(120.0), None, now);
        m.stop_monitoring(now + Duration::minutes(1));

        let later = now + Duration::hours(1);
        m.start_monitoring(later + Duration::minutes(45), later);
        let snapshot = m.snapshot();
        assert_eq!(snapshot.score.total, 100);
        assert!(snapshot.warnings.is_empty());
        assert_eq!(snapshot.current_phase, MonitorPhase::Phase1);
        assert_eq!(snapshot.usage.usage_seconds, 0);
    }
}
