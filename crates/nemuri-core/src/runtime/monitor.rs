//! Tokio driver for the sleep monitor.
//!
//! Owns the 10 s phase tick, the sensor polls (accelerometer 500 ms,
//! light 500 ms, noise 3 s, camera 5 s when enabled) and the advice
//! resolution loop. The engine itself lives behind a mutex and is
//! only ever touched under it, one callback at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::warn;

use crate::advice::{AdviceGenerator, WarningContext};
use crate::calendar::{importance_of, CalendarProvider};
use crate::dispatch::Notifier;
use crate::error::TaskError;
use crate::events::{EnvironmentChannel, Event};
use crate::monitor::{
    AdviceRequest, AdviceStamp, MonitorState, SleepMonitor, TickOutput, PHASE_TICK_SECS,
};
use crate::sensors::{
    resolve_ambient_light, Accelerometer, CameraBrightnessLoop, CameraCapture, LightSensor,
    NoiseMeter, Orientation, OrientationFilter, CAPTURE_INTERVAL_SECS,
};
use crate::usage::AppState;

const ORIENTATION_POLL_MS: u64 = 500;
const LIGHT_POLL_MS: u64 = 500;
const NOISE_POLL_MS: u64 = 3_000;

/// Raw sensor endpoints the monitor polls.
#[derive(Clone)]
pub struct MonitorSensors {
    pub light: Arc<dyn LightSensor>,
    pub accelerometer: Arc<dyn Accelerometer>,
    pub noise: Arc<dyn NoiseMeter>,
    pub camera: Arc<dyn CameraCapture>,
}

/// Latest readings shared between the sensor tasks.
struct SensorHub {
    filter: OrientationFilter,
    camera_loop: CameraBrightnessLoop,
    sensor_lux: Option<f64>,
    noise_db: Option<f64>,
}

impl SensorHub {
    fn ambient_lux(&self) -> Option<f64> {
        resolve_ambient_light(
            self.filter.orientation(),
            self.sensor_lux,
            self.camera_loop.estimated_lux(),
        )
        .lux
    }
}

/// An advice lookup that came back from the blocking pool.
enum Resolution {
    Usage {
        stamp: AdviceStamp,
        importance: crate::advice::EventImportance,
        message: Option<String>,
    },
    Environment {
        stamp: AdviceStamp,
        message: Option<String>,
    },
}

/// Running sleep-monitor session: engine plus its timers.
pub struct MonitorRuntime {
    monitor: Arc<Mutex<SleepMonitor>>,
    handles: Vec<JoinHandle<()>>,
    events_rx: Option<UnboundedReceiver<Event>>,
    event_tx: UnboundedSender<Event>,
    resolution_tx: UnboundedSender<Resolution>,
    running: Arc<AtomicBool>,
    calendar: Arc<dyn CalendarProvider>,
    advice: Arc<dyn AdviceGenerator>,
    notifier: Arc<dyn Notifier>,
    importance_keywords: Arc<Vec<String>>,
}

impl MonitorRuntime {
    /// Start a monitoring session counting down to `sleep_time`.
    ///
    /// Must be called within a tokio runtime; all timers are spawned
    /// immediately.
    pub fn start(
        monitor: SleepMonitor,
        sensors: MonitorSensors,
        calendar: Arc<dyn CalendarProvider>,
        advice: Arc<dyn AdviceGenerator>,
        notifier: Arc<dyn Notifier>,
        importance_keywords: Vec<String>,
        sleep_time: chrono::DateTime<Utc>,
    ) -> Self {
        let (event_tx, events_rx) = mpsc::unbounded_channel();
        let (resolution_tx, resolution_rx) = mpsc::unbounded_channel();

        let mut runtime = Self {
            monitor: Arc::new(Mutex::new(monitor)),
            handles: Vec::new(),
            events_rx: Some(events_rx),
            event_tx,
            resolution_tx,
            running: Arc::new(AtomicBool::new(true)),
            calendar,
            advice,
            notifier,
            importance_keywords: Arc::new(importance_keywords),
        };

        {
            let mut engine = runtime.monitor.lock().expect("monitor lock");
            let output = engine.start_monitoring(sleep_time, Utc::now());
            drop(engine);
            runtime.handle_output(output);
        }

        let hub = Arc::new(Mutex::new(SensorHub {
            filter: OrientationFilter::new(),
            camera_loop: CameraBrightnessLoop::default(),
            sensor_lux: None,
            noise_db: None,
        }));

        runtime.spawn_tick_task();
        runtime.spawn_orientation_task(hub.clone(), sensors.accelerometer.clone());
        runtime.spawn_camera_task(hub.clone(), sensors.camera.clone());
        runtime.spawn_light_task(hub.clone(), sensors.light.clone());
        runtime.spawn_noise_task(hub, sensors.noise.clone());
        runtime.spawn_resolution_task(resolution_rx);

        runtime
    }

    /// Take the event stream. Yields every event the session produces;
    /// can be taken once.
    pub fn events(&mut self) -> Option<UnboundedReceiver<Event>> {
        self.events_rx.take()
    }

    /// Whether the session is still live (not stopped, not completed).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Current engine snapshot.
    pub fn snapshot(&self) -> MonitorState {
        self.monitor.lock().expect("monitor lock").snapshot()
    }

    /// Forward a foreground/background transition from the host.
    pub fn notify_app_state(&self, state: AppState) {
        self.monitor
            .lock()
            .expect("monitor lock")
            .on_app_state(state, Utc::now());
    }

    /// Take the most recent unread warning for display.
    pub fn take_latest_warning(&self) -> Option<crate::monitor::Warning> {
        self.monitor
            .lock()
            .expect("monitor lock")
            .take_latest_warning()
    }

    /// Stop the session: final score, then synchronous teardown of
    /// every owned timer. Idempotent.
    pub fn stop(&mut self) -> Result<(), TaskError> {
        let events = self
            .monitor
            .lock()
            .expect("monitor lock")
            .stop_monitoring(Utc::now());
        for event in events {
            let _ = self.event_tx.send(event);
        }
        self.teardown();
        Ok(())
    }

    fn teardown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        super::abort_all(&mut self.handles);
    }

    // ── Tasks ────────────────────────────────────────────────────────

    fn spawn_tick_task(&mut self) {
        let monitor = self.monitor.clone();
        let running = self.running.clone();
        let ctx = self.task_context();
        self.handles.push(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(PHASE_TICK_SECS));
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let output = monitor.lock().expect("monitor lock").tick(Utc::now());
                let completed = output
                    .events
                    .iter()
                    .any(|e| matches!(e, Event::MonitorCompleted { .. }));
                ctx.dispatch(output);
                if completed {
                    // The countdown ran out; wind the timers down.
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }));
    }

    fn spawn_orientation_task(
        &mut self,
        hub: Arc<Mutex<SensorHub>>,
        accelerometer: Arc<dyn Accelerometer>,
    ) {
        let running = self.running.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_millis(ORIENTATION_POLL_MS));
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let z = match accelerometer.read_vertical_axis() {
                    Ok(z) => z,
                    Err(error) => {
                        warn!(%error, "accelerometer read failed");
                        None
                    }
                };
                if let Some(z) = z {
                    let mut hub = hub.lock().expect("sensor hub lock");
                    let orientation = hub.filter.push(z);
                    // Face-up means the dedicated sensor covers the
                    // reading; keep the camera off to save power.
                    hub.camera_loop
                        .set_enabled(orientation != Orientation::FaceUp);
                }
            }
        }));
    }

    fn spawn_camera_task(&mut self, hub: Arc<Mutex<SensorHub>>, camera: Arc<dyn CameraCapture>) {
        let running = self.running.clone();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(CAPTURE_INTERVAL_SECS));
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let mut hub = hub.lock().expect("sensor hub lock");
                hub.camera_loop.capture_once(&*camera);
            }
        }));
    }

    fn spawn_light_task(&mut self, hub: Arc<Mutex<SensorHub>>, light: Arc<dyn LightSensor>) {
        let monitor = self.monitor.clone();
        let running = self.running.clone();
        let ctx = self.task_context();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(LIGHT_POLL_MS));
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let (lux, noise) = {
                    let mut hub = hub.lock().expect("sensor hub lock");
                    hub.sensor_lux = if light.available() {
                        match light.read_lux() {
                            Ok(lux) => lux,
                            Err(error) => {
                                warn!(%error, "light sensor read failed");
                                None
                            }
                        }
                    } else {
                        None
                    };
                    (hub.ambient_lux(), hub.noise_db)
                };
                let output = monitor
                    .lock()
                    .expect("monitor lock")
                    .observe_environment(lux, noise, Utc::now());
                ctx.dispatch(output);
            }
        }));
    }

    fn spawn_noise_task(&mut self, hub: Arc<Mutex<SensorHub>>, noise: Arc<dyn NoiseMeter>) {
        let monitor = self.monitor.clone();
        let running = self.running.clone();
        let ctx = self.task_context();
        self.handles.push(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(NOISE_POLL_MS));
            loop {
                interval.tick().await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let (lux, db) = {
                    let mut hub = hub.lock().expect("sensor hub lock");
                    hub.noise_db = match noise.read_db() {
                        Ok(db) => db,
                        Err(error) => {
                            warn!(%error, "noise meter read failed");
                            None
                        }
                    };
                    (hub.ambient_lux(), hub.noise_db)
                };
                let output = monitor
                    .lock()
                    .expect("monitor lock")
                    .observe_environment(lux, db, Utc::now());
                ctx.dispatch(output);
            }
        }));
    }

    /// Applies resolved advice lookups back onto the engine.
    fn spawn_resolution_task(&mut self, mut rx: UnboundedReceiver<Resolution>) {
        let monitor = self.monitor.clone();
        let ctx = self.task_context();
        self.handles.push(tokio::spawn(async move {
            while let Some(resolution) = rx.recv().await {
                let events = {
                    let mut engine = monitor.lock().expect("monitor lock");
                    match resolution {
                        Resolution::Usage {
                            stamp,
                            importance,
                            message,
                        } => engine.resolve_usage_warning(stamp, importance, message, Utc::now()),
                        Resolution::Environment { stamp, message } => {
                            engine.resolve_environment_advice(stamp, message, Utc::now())
                        }
                    }
                };
                ctx.dispatch(TickOutput {
                    events,
                    requests: Vec::new(),
                });
            }
        }));
    }

    // ── Output handling ──────────────────────────────────────────────

    fn task_context(&self) -> TaskContext {
        TaskContext {
            event_tx: self.event_tx.clone(),
            resolution_tx: self.resolution_tx.clone(),
            calendar: self.calendar.clone(),
            advice: self.advice.clone(),
            notifier: self.notifier.clone(),
            importance_keywords: self.importance_keywords.clone(),
        }
    }

    fn handle_output(&self, output: TickOutput) {
        self.task_context().dispatch(output);
    }
}

impl Drop for MonitorRuntime {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Everything a task needs to forward events and launch lookups.
#[derive(Clone)]
struct TaskContext {
    event_tx: UnboundedSender<Event>,
    resolution_tx: UnboundedSender<Resolution>,
    calendar: Arc<dyn CalendarProvider>,
    advice: Arc<dyn AdviceGenerator>,
    notifier: Arc<dyn Notifier>,
    importance_keywords: Arc<Vec<String>>,
}

impl TaskContext {
    fn dispatch(&self, output: TickOutput) {
        for event in &output.events {
            self.notify(event);
            let _ = self.event_tx.send(event.clone());
        }
        for request in output.requests {
            self.launch(request);
        }
    }

    /// Map engine events onto push notifications.
    fn notify(&self, event: &Event) {
        match event {
            Event::UsageWarning { message, .. } => {
                self.notifier.send("Phone usage warning", message);
            }
            Event::EnvironmentAlert {
                channel: EnvironmentChannel::Light,
                value,
                ceiling,
                ..
            } => {
                self.notifier.send(
                    "Environment warning: light",
                    &format!(
                        "Currently {value:.0} lux, above the {ceiling:.0} lux ceiling. \
                         Dim the lights."
                    ),
                );
            }
            Event::EnvironmentAlert {
                channel: EnvironmentChannel::Noise,
                value,
                ceiling,
                ..
            } => {
                self.notifier.send(
                    "Environment warning: noise",
                    &format!(
                        "Currently {value:.0} dB, above the {ceiling:.0} dB ceiling. \
                         Find some quiet."
                    ),
                );
            }
            _ => {}
        }
    }

    /// Run an advice lookup on the blocking pool, fire-and-forget with
    /// respect to the tick loop. The stamped result is applied later
    /// by the resolution task.
    fn launch(&self, request: AdviceRequest) {
        let calendar = self.calendar.clone();
        let advice = self.advice.clone();
        let keywords = self.importance_keywords.clone();
        let tx = self.resolution_tx.clone();

        tokio::task::spawn_blocking(move || {
            let resolution = match request {
                AdviceRequest::UsageWarning {
                    stamp,
                    usage_minutes,
                } => {
                    let events = calendar.events(None, None).unwrap_or_else(|error| {
                        warn!(%error, "calendar fetch failed; judging importance without events");
                        Vec::new()
                    });
                    let importance = importance_of(&events, &keywords);
                    let context = WarningContext {
                        phase: stamp.phase,
                        importance,
                        usage_minutes,
                        tomorrow_events: events.into_iter().map(|e| e.title).collect(),
                    };
                    let message = match advice.usage_warning(&context) {
                        Ok(message) => Some(message),
                        Err(error) => {
                            warn!(%error, "advice generation failed; recording warning without a message");
                            None
                        }
                    };
                    Resolution::Usage {
                        stamp,
                        importance,
                        message,
                    }
                }
                AdviceRequest::EnvironmentAdvice {
                    stamp,
                    light_lux,
                    noise_db,
                } => {
                    let message = match advice.environment_advice(light_lux, noise_db) {
                        Ok(message) => Some(message),
                        Err(error) => {
                            warn!(%error, "environment advice failed");
                            None
                        }
                    };
                    Resolution::Environment { stamp, message }
                }
            };
            let _ = tx.send(resolution);
        });
    }
}
