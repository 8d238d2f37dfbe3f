//! # Nemuri Core Library
//!
//! This library provides the decision core for the Nemuri bedtime
//! companion: a pre-sleep monitor that scores sleep-prep discipline
//! and a wake-up alarm that escalates urgency against calendar
//! deadlines, fed by a sensor-fusion layer and a device-usage tracker.
//!
//! ## Architecture
//!
//! - **State machines**: [`SleepMonitor`] and [`AlarmEngine`] are
//!   wall-clock-based and caller-ticked -- no internal threads. They
//!   take `now` as a parameter, which keeps every transition testable.
//! - **Runtime**: [`MonitorRuntime`] and [`AlarmRuntime`] own the
//!   timers as tokio tasks and drive the engines, with idempotent
//!   teardown and generation-stamped async lookups.
//! - **Collaborators**: calendar, advice generation, notifications,
//!   image verification, audio and raw sensors are traits; the core
//!   ships null objects and a deterministic template advice generator.
//!
//! ## Key Components
//!
//! - [`SleepMonitor`]: countdown phases, usage warnings, scoring
//! - [`AlarmEngine`]: wake trigger, volume ramp, strict escalation
//! - [`sensors`]: orientation debounce, calibration, source selection
//! - [`UsageTracker`]: background-time accounting
//! - [`NotificationDispatcher`]: cooldown-gated one-shot alerting
//! - [`Config`]: TOML settings with explicit per-field defaults

pub mod advice;
pub mod alarm;
pub mod calendar;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod mission;
pub mod monitor;
pub mod runtime;
pub mod sensors;
pub mod usage;

pub use advice::{AdviceGenerator, EventImportance, TemplateAdvice, WarningContext};
pub use alarm::{AlarmEngine, AlarmPhase, AlarmState, StopOutcome};
pub use calendar::{CalendarEvent, CalendarProvider, StaticCalendar};
pub use config::Config;
pub use dispatch::{NotificationDispatcher, Notifier, NullNotifier};
pub use error::{CoreError, Result};
pub use events::Event;
pub use mission::{ImageVerifier, MissionOutcome};
pub use monitor::{MonitorPhase, MonitorState, SleepMonitor, SleepScore, Warning, WarningLevel};
pub use runtime::{AlarmRuntime, AudioSink, MonitorRuntime, MonitorSensors, NullAudio};
pub use usage::{AppState, UsageTracker};
