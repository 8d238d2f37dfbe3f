//! Tokio driver for the alarm.
//!
//! Owns the 1 s clock check, the 10 s volume ramp and the 5 s
//! escalation check. The clock check keeps running after the alarm is
//! dismissed (tomorrow is another day); `shutdown()` tears the whole
//! driver down.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::alarm::{
    adjusted_window_minutes, AlarmEngine, AlarmPhase, AlarmState, StopOutcome,
    CLOCK_CHECK_SECS, ESCALATION_CHECK_SECS, VOLUME_RAMP_SECS,
};
use crate::calendar::CalendarProvider;
use crate::error::MissionError;
use crate::events::Event;
use crate::mission::{ImageVerifier, MissionOutcome};

/// Audio playback collaborator. Looping, volume and codec details are
/// the host's problem; the core only steers it.
pub trait AudioSink: Send + Sync {
    /// Begin (or switch to) the looping sound for a phase.
    fn play(&self, phase: AlarmPhase);
    fn set_volume(&self, volume: f64);
    fn stop(&self);
}

/// Audio sink that plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&self, _phase: AlarmPhase) {}
    fn set_volume(&self, _volume: f64) {}
    fn stop(&self) {}
}

/// Running alarm service: engine plus its timers.
pub struct AlarmRuntime {
    alarm: Arc<Mutex<AlarmEngine>>,
    handles: Vec<JoinHandle<()>>,
    events_rx: Option<UnboundedReceiver<Event>>,
    event_tx: UnboundedSender<Event>,
    audio: Arc<dyn AudioSink>,
    verifier: Arc<dyn ImageVerifier>,
}

impl AlarmRuntime {
    /// Start the clock check against the configured wake time.
    ///
    /// Must be called within a tokio runtime.
    pub fn start(
        engine: AlarmEngine,
        calendar: Arc<dyn CalendarProvider>,
        verifier: Arc<dyn ImageVerifier>,
        audio: Arc<dyn AudioSink>,
        importance_keywords: Vec<String>,
        wake_hour: u32,
        wake_minute: u32,
    ) -> Self {
        let (event_tx, events_rx) = mpsc::unbounded_channel();
        let mut runtime = Self {
            alarm: Arc::new(Mutex::new(engine)),
            handles: Vec::new(),
            events_rx: Some(events_rx),
            event_tx,
            audio,
            verifier,
        };

        runtime.spawn_clock_task(wake_hour, wake_minute);
        runtime.spawn_volume_task();
        runtime.spawn_escalation_task(calendar, Arc::new(importance_keywords));

        runtime
    }

    /// Take the event stream. Can be taken once.
    pub fn events(&mut self) -> Option<UnboundedReceiver<Event>> {
        self.events_rx.take()
    }

    /// Current engine snapshot.
    pub fn snapshot(&self) -> AlarmState {
        self.alarm.lock().expect("alarm lock").snapshot()
    }

    /// Snooze a gentle-phase alarm.
    pub fn snooze(&self) -> bool {
        let event = self.alarm.lock().expect("alarm lock").snooze(Utc::now());
        match event {
            Some(event) => {
                self.audio.stop();
                let _ = self.event_tx.send(event);
                true
            }
            None => false,
        }
    }

    /// Request a stop. May come back demanding the mission photo.
    pub fn stop(&self) -> StopOutcome {
        let outcome = self.alarm.lock().expect("alarm lock").request_stop(Utc::now());
        if let StopOutcome::Stopped(event) = &outcome {
            self.audio.stop();
            let _ = self.event_tx.send(event.clone());
        }
        outcome
    }

    /// Submit a mission photo. On a pass the alarm resets; on a
    /// rejection it keeps ringing and the caller should offer a retry.
    pub async fn submit_mission(&self, image: Vec<u8>) -> Result<MissionOutcome, MissionError> {
        let target = self
            .alarm
            .lock()
            .expect("alarm lock")
            .config()
            .mission_target
            .clone();
        let verifier = self.verifier.clone();
        let passed = tokio::task::spawn_blocking(move || verifier.verify(&image, &target))
            .await
            .map_err(|e| MissionError::VerificationFailed(e.to_string()))??;

        let events = self
            .alarm
            .lock()
            .expect("alarm lock")
            .complete_mission(passed, Utc::now());
        let outcome = if passed {
            self.audio.stop();
            MissionOutcome::Passed
        } else {
            MissionOutcome::Rejected
        };
        for event in events {
            let _ = self.event_tx.send(event);
        }
        Ok(outcome)
    }

    /// Tear the whole driver down, clock check included. Idempotent.
    pub fn shutdown(&mut self) {
        super::abort_all(&mut self.handles);
    }

    // ── Tasks ────────────────────────────────────────────────────────

    fn spawn_clock_task(&mut self, wake_hour: u32, wake_minute: u32) {
        let alarm = self.alarm.clone();
        let audio = self.audio.clone();
        let tx = self.event_tx.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CLOCK_CHECK_SECS));
            loop {
                interval.tick().await;
                let event = alarm
                    .lock()
                    .expect("alarm lock")
                    .check_trigger(Local::now(), wake_hour, wake_minute);
                if let Some(event) = event {
                    if let Event::AlarmTriggered { volume, .. } = &event {
                        audio.play(AlarmPhase::Gentle);
                        audio.set_volume(*volume);
                    }
                    let _ = tx.send(event);
                }
            }
        }));
    }

    fn spawn_volume_task(&mut self) {
        let alarm = self.alarm.clone();
        let audio = self.audio.clone();
        let tx = self.event_tx.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(VOLUME_RAMP_SECS));
            loop {
                interval.tick().await;
                let event = alarm.lock().expect("alarm lock").tick_volume(Utc::now());
                if let Some(event) = event {
                    if let Event::AlarmVolumeChanged { volume, .. } = &event {
                        audio.set_volume(*volume);
                    }
                    let _ = tx.send(event);
                }
            }
        }));
    }

    /// Re-derive the resilience window from the calendar and apply it.
    /// The fetch happens on the blocking pool with the generation
    /// captured up front, so a window derived for an alarm that has
    /// since been dismissed is discarded by the engine.
    fn spawn_escalation_task(
        &mut self,
        calendar: Arc<dyn CalendarProvider>,
        keywords: Arc<Vec<String>>,
    ) {
        let alarm = self.alarm.clone();
        let audio = self.audio.clone();
        let tx = self.event_tx.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(ESCALATION_CHECK_SECS));
            loop {
                interval.tick().await;

                let pending = {
                    let engine = alarm.lock().expect("alarm lock");
                    if engine.is_ringing() && engine.phase() == AlarmPhase::Gentle {
                        engine.state().alarm_start_time.map(|start| {
                            (
                                engine.generation(),
                                start,
                                engine.config().clone(),
                            )
                        })
                    } else {
                        None
                    }
                };
                let Some((generation, alarm_start, config)) = pending else {
                    continue;
                };

                let fetch_calendar = calendar.clone();
                let fetch_keywords = keywords.clone();
                let window = tokio::task::spawn_blocking(move || {
                    match fetch_calendar.events(None, None) {
                        Ok(events) => adjusted_window_minutes(
                            &config,
                            &fetch_keywords,
                            &events,
                            alarm_start,
                        ),
                        Err(error) => {
                            warn!(%error, "calendar fetch failed; using the base window");
                            config.resilience_window_minutes
                        }
                    }
                })
                .await
                .unwrap_or_else(|_| i64::MAX);

                let event = alarm
                    .lock()
                    .expect("alarm lock")
                    .apply_escalation(generation, window, Utc::now());
                if let Some(event) = event {
                    audio.play(AlarmPhase::Strict);
                    audio.set_volume(1.0);
                    let _ = tx.send(event);
                }
            }
        }));
    }
}

impl Drop for AlarmRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
