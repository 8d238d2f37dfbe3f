use std::sync::Arc;

use chrono::{Local, Timelike, Utc};
use clap::Subcommand;
use nemuri_core::alarm::{adjusted_window_minutes, AlarmEngine};
use nemuri_core::config::Config;
use nemuri_core::mission::{AlwaysPass, AlwaysReject, ImageVerifier};
use nemuri_core::{AlarmRuntime, NullAudio, StaticCalendar, StopOutcome};

use super::{parse_event, parse_hour_minute, print_json};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Run the alarm clock check in the foreground, printing events as
    /// JSON lines. Ctrl-C stops a ringing alarm (or exits).
    Run {
        /// Wake time as HH:MM (default: configured wake-up time)
        #[arg(long)]
        at: Option<String>,
        /// Ring this many seconds from now instead of at a wall-clock
        /// time (demo shortcut)
        #[arg(long)]
        in_seconds: Option<i64>,
        /// Calendar events for window adjustment, as TITLE@HH:MM
        #[arg(long = "event")]
        events: Vec<String>,
        /// Have the mission verifier reject submitted photos
        #[arg(long)]
        reject_mission: bool,
    },
    /// Print the adjusted resilience window for an alarm ringing now
    /// against the given events
    Window {
        /// Calendar events, as TITLE@HH:MM
        #[arg(long = "event")]
        events: Vec<String>,
    },
}

pub fn run(action: AlarmAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AlarmAction::Run {
            at,
            in_seconds,
            events,
            reject_mission,
        } => run_alarm(at, in_seconds, events, reject_mission),
        AlarmAction::Window { events } => {
            let config = Config::load_or_default();
            let events = events
                .iter()
                .map(|spec| parse_event(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let window = adjusted_window_minutes(
                &config.alarm,
                &config.calendar.importance_keywords,
                &events,
                Utc::now(),
            );
            print_json(&serde_json::json!({ "adjusted_window_minutes": window }))
        }
    }
}

fn run_alarm(
    at: Option<String>,
    in_seconds: Option<i64>,
    events: Vec<String>,
    reject_mission: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();

    let (wake_hour, wake_minute) = if let Some(seconds) = in_seconds {
        let target = Local::now() + chrono::Duration::seconds(seconds);
        (target.hour(), target.minute())
    } else if let Some(spec) = &at {
        parse_hour_minute(spec)?
    } else {
        (config.sleep.wake_up_hour, config.sleep.wake_up_minute)
    };

    let calendar_events = events
        .iter()
        .map(|spec| parse_event(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let verifier: Arc<dyn ImageVerifier> = if reject_mission {
        Arc::new(AlwaysReject)
    } else {
        Arc::new(AlwaysPass)
    };

    eprintln!("waiting for {wake_hour:02}:{wake_minute:02} (Ctrl-C to stop)");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut service = AlarmRuntime::start(
            AlarmEngine::new(config.alarm.clone()),
            Arc::new(StaticCalendar::new(calendar_events)),
            verifier,
            Arc::new(NullAudio),
            config.calendar.importance_keywords.clone(),
            wake_hour,
            wake_minute,
        );
        let mut events = service.events().expect("fresh service");

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else { break };
                    print_json(&event)?;
                }
                _ = tokio::signal::ctrl_c() => {
                    match service.stop() {
                        // The stop event arrives on the stream; the
                        // drain below prints it.
                        StopOutcome::Stopped(_) => break,
                        StopOutcome::MissionRequired { target } => {
                            eprintln!("mission required: photograph the {target}");
                            match service.submit_mission(Vec::new()).await {
                                Ok(outcome) => {
                                    print_json(&serde_json::json!({ "mission": outcome }))?;
                                    if matches!(outcome, nemuri_core::MissionOutcome::Passed) {
                                        break;
                                    }
                                }
                                Err(error) => eprintln!("mission verification failed: {error}"),
                            }
                        }
                        StopOutcome::NotRinging => break,
                    }
                }
            }
        }

        // Drain anything the stop produced.
        while let Ok(event) = events.try_recv() {
            print_json(&event)?;
        }
        service.shutdown();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
