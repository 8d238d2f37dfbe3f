//! End-to-end alarm arc: trigger, ramp, calendar-driven escalation,
//! mission-gated dismissal.

use chrono::{Duration, Local, TimeZone, Utc};
use nemuri_core::alarm::{adjusted_window_minutes, AlarmEngine, AlarmPhase, AlarmState, StopOutcome};
use nemuri_core::calendar::CalendarEvent;
use nemuri_core::config::AlarmConfig;
use nemuri_core::Event;

fn keywords() -> Vec<String> {
    vec!["Important".into(), "Test".into()]
}

#[test]
fn tight_calendar_escalates_on_the_very_next_check() {
    let config = AlarmConfig {
        resilience_window_minutes: 30,
        preparation_minutes: 20,
        commute_buffer_minutes: 30,
        ..AlarmConfig::default()
    };
    let mut alarm = AlarmEngine::new(config.clone());

    let alarm_start = Local
        .with_ymd_and_hms(2025, 6, 10, 7, 0, 0)
        .unwrap()
        .with_timezone(&Utc);
    alarm.trigger(alarm_start);

    // First commitment 50 minutes out: 50 - 30 - 20 = 0 minutes to
    // spare, so the adjusted window is zero.
    let event_start = alarm_start + Duration::minutes(50);
    let events = vec![CalendarEvent::new(
        "Client visit",
        event_start,
        event_start + Duration::minutes(60),
    )];
    let window = adjusted_window_minutes(&config, &keywords(), &events, alarm_start);
    assert_eq!(window, 0);

    // The very next 5-second escalation check goes strict.
    let escalated = alarm
        .apply_escalation(alarm.generation(), window, alarm_start + Duration::seconds(5))
        .expect("zero window escalates immediately");
    assert!(matches!(escalated, Event::AlarmEscalated { .. }));
    assert_eq!(alarm.phase(), AlarmPhase::Strict);
    assert_eq!(alarm.state().volume, 1.0);
}

#[test]
fn calm_morning_rides_out_the_gentle_ramp() {
    let config = AlarmConfig::default();
    let mut alarm = AlarmEngine::new(config.clone());
    let t0 = Utc::now();
    alarm.trigger(t0);

    // No calendar pressure: base window applies.
    let window = adjusted_window_minutes(&config, &keywords(), &[], t0);
    assert_eq!(window, config.resilience_window_minutes);

    // Ramp for five minutes; still gentle, volume climbing.
    for i in 1..=30 {
        alarm.tick_volume(t0 + Duration::seconds(10 * i));
        assert!(alarm
            .apply_escalation(alarm.generation(), window, t0 + Duration::seconds(10 * i))
            .is_none());
    }
    assert_eq!(alarm.phase(), AlarmPhase::Gentle);
    assert!(alarm.state().volume > 0.2);

    // Past the window the next check escalates.
    assert!(alarm
        .apply_escalation(alarm.generation(), window, t0 + Duration::minutes(31))
        .is_some());
    assert_eq!(alarm.phase(), AlarmPhase::Strict);
}

#[test]
fn mission_gates_the_strict_dismissal() {
    let mut alarm = AlarmEngine::new(AlarmConfig {
        mission_enabled: true,
        mission_target: "kettle".into(),
        ..AlarmConfig::default()
    });
    let t0 = Utc::now();
    alarm.trigger(t0);
    alarm.apply_escalation(alarm.generation(), 0, t0 + Duration::seconds(5));

    let StopOutcome::MissionRequired { target } = alarm.request_stop(t0 + Duration::minutes(1))
    else {
        panic!("strict stop with a mission must demand the photo");
    };
    assert_eq!(target, "kettle");

    // Two bad photos, then a good one.
    for attempt in 1..=2 {
        let events = alarm.complete_mission(false, t0 + Duration::minutes(1 + attempt));
        assert!(matches!(events[0], Event::MissionFailed { .. }));
        assert!(alarm.is_ringing());
    }
    let events = alarm.complete_mission(true, t0 + Duration::minutes(5));
    assert!(matches!(events[0], Event::MissionPassed { .. }));
    assert_eq!(alarm.snapshot(), AlarmState::default());
}

#[test]
fn every_exit_path_restores_the_initial_state() {
    let t0 = Utc::now();

    // Gentle stop.
    let mut alarm = AlarmEngine::new(AlarmConfig::default());
    alarm.trigger(t0);
    alarm.tick_volume(t0 + Duration::seconds(10));
    alarm.request_stop(t0 + Duration::seconds(20));
    assert_eq!(alarm.snapshot(), AlarmState::default());

    // Strict stop, no mission.
    alarm.trigger(t0 + Duration::minutes(1));
    alarm.apply_escalation(alarm.generation(), 0, t0 + Duration::minutes(1));
    alarm.request_stop(t0 + Duration::minutes(2));
    assert_eq!(alarm.snapshot(), AlarmState::default());

    // Snooze differs only by its marker.
    alarm.trigger(t0 + Duration::minutes(3));
    alarm.snooze(t0 + Duration::minutes(4));
    let snoozed = alarm.snapshot();
    assert!(snoozed.is_snoozed);
    assert_eq!(
        AlarmState {
            is_snoozed: false,
            ..snoozed
        },
        AlarmState::default()
    );
}
