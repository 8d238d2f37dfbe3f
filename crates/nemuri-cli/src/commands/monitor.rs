use std::sync::Arc;

use chrono::{Duration, Local, Utc};
use clap::Subcommand;
use nemuri_core::config::Config;
use nemuri_core::monitor::{SleepMonitor, SleepScore};
use nemuri_core::sensors::{LightSensor, NoSensor, NoiseMeter, StaticReading};
use nemuri_core::{
    Event, MonitorRuntime, MonitorSensors, Notifier, StaticCalendar, TemplateAdvice,
};

use super::print_json;

#[derive(Subcommand)]
pub enum MonitorAction {
    /// Run a monitoring session in the foreground, printing events as
    /// JSON lines until it completes or Ctrl-C
    Run {
        /// Bedtime as minutes from now (default: derived from the
        /// configured wake-up time and sleep duration)
        #[arg(long)]
        in_minutes: Option<i64>,
        /// Simulate a constant light reading (lux)
        #[arg(long)]
        lux: Option<f64>,
        /// Simulate a constant noise reading (dB)
        #[arg(long)]
        noise: Option<f64>,
        /// Calendar events for importance judgement, as TITLE@HH:MM
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Print the score breakdown for a set of flags
    Score {
        #[arg(long)]
        phase1: bool,
        #[arg(long)]
        phase2: bool,
        #[arg(long)]
        light: bool,
        #[arg(long)]
        noise: bool,
    },
    /// Print tonight's derived bedtime and the active thresholds
    Status,
}

/// Notifier that prints to stderr so notifications stand apart from
/// the JSON event stream on stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn send(&self, title: &str, body: &str) {
        eprintln!("[notify] {title}: {body}");
    }
}

pub fn run(action: MonitorAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        MonitorAction::Run {
            in_minutes,
            lux,
            noise,
            events,
        } => run_session(in_minutes, lux, noise, events),
        MonitorAction::Score {
            phase1,
            phase2,
            light,
            noise,
        } => print_json(&SleepScore::compute(phase1, phase2, light, noise)),
        MonitorAction::Status => {
            let config = Config::load_or_default();
            let sleep_time = config.sleep.sleep_time_after(Local::now());
            print_json(&serde_json::json!({
                "sleep_time": sleep_time.with_timezone(&Utc),
                "phase1_warn_minutes": config.monitor.phase1_warn_minutes,
                "phase2_warn_minutes": config.monitor.phase2_warn_minutes,
                "light_ceiling_lux": config.monitor.light_ceiling_lux,
                "noise_ceiling_db": config.monitor.noise_ceiling_db,
            }))
        }
    }
}

fn run_session(
    in_minutes: Option<i64>,
    lux: Option<f64>,
    noise: Option<f64>,
    events: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let sleep_time = match in_minutes {
        Some(minutes) => Utc::now() + Duration::minutes(minutes),
        None => config
            .sleep
            .sleep_time_after(Local::now())
            .with_timezone(&Utc),
    };

    let calendar_events = events
        .iter()
        .map(|spec| super::parse_event(spec))
        .collect::<Result<Vec<_>, _>>()?;

    let light: Arc<dyn LightSensor> = match lux {
        Some(value) => Arc::new(StaticReading(value)),
        None => Arc::new(NoSensor),
    };
    let noise: Arc<dyn NoiseMeter> = match noise {
        Some(value) => Arc::new(StaticReading(value)),
        None => Arc::new(NoSensor),
    };
    let sensors = MonitorSensors {
        light,
        accelerometer: Arc::new(StaticReading(1.0)), // flat on the table
        noise,
        camera: Arc::new(NoSensor),
    };

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut session = MonitorRuntime::start(
            SleepMonitor::new(config.monitor.clone()),
            sensors,
            Arc::new(StaticCalendar::new(calendar_events)),
            Arc::new(TemplateAdvice),
            Arc::new(ConsoleNotifier),
            config.calendar.importance_keywords.clone(),
            sleep_time,
        );
        let mut events = session.events().expect("fresh session");

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    let done = matches!(
                        event,
                        Event::MonitorCompleted { .. } | Event::MonitorStopped { .. }
                    );
                    print_json(&event)?;
                    if done {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    session.stop()?;
                    while let Ok(event) = events.try_recv() {
                        print_json(&event)?;
                    }
                    break;
                }
            }
        }
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
