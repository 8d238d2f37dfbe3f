//! Resilience-window arithmetic.
//!
//! The gentle phase lasts at most the configured base window, but a
//! morning commitment can shrink it: the user must be up by the
//! event's start minus the commute buffer minus their preparation
//! time. An important-looking first event halves whatever window is
//! left.

use chrono::{DateTime, Utc};

use crate::calendar::{first_event_after, title_is_important, CalendarEvent};
use crate::config::AlarmConfig;

/// Minutes of gentle ringing allowed before escalation, adjusted for
/// the earliest calendar commitment after `alarm_start` on the same
/// local day. With no such event, the configured base window applies
/// unchanged -- which is also the fallback when the calendar cannot
/// be fetched at all.
pub fn adjusted_window_minutes(
    config: &AlarmConfig,
    keywords: &[String],
    events: &[CalendarEvent],
    alarm_start: DateTime<Utc>,
) -> i64 {
    let mut window = config.resilience_window_minutes;

    if let Some(first) = first_event_after(events, alarm_start) {
        let departure = first.start - chrono::Duration::minutes(config.commute_buffer_minutes);
        let must_wake_up = departure - chrono::Duration::minutes(config.preparation_minutes);
        // Whole minutes, rounded toward negative infinity.
        let time_to_spare = (must_wake_up - alarm_start).num_seconds().div_euclid(60);

        if time_to_spare < window {
            window = time_to_spare.max(0);
        }

        if title_is_important(&first.title, keywords) {
            window /= 2;
        }
    }

    window
}
