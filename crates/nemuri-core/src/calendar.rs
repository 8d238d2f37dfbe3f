//! Calendar collaborator contract and event interpretation.
//!
//! The core never fetches calendar data itself; it consumes a
//! read-only [`CalendarProvider`] and interprets the events it gets:
//! which one is the first commitment after wake-up, and whether a
//! title marks the day as important.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::advice::EventImportance;
use crate::error::CalendarError;

/// A calendar event as seen by the core. Read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
}

impl CalendarEvent {
    pub fn new(
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            all_day: false,
        }
    }
}

/// Read-only calendar access. May be slow or fail; callers degrade to
/// their configured defaults on error and never let a stall block a
/// state machine tick.
pub trait CalendarProvider: Send + Sync {
    /// Events within the optional range, unordered.
    fn events(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, CalendarError>;
}

/// Provider with a fixed event list. Used by the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticCalendar {
    events: Vec<CalendarEvent>,
}

impl StaticCalendar {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }
}

impl CalendarProvider for StaticCalendar {
    fn events(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<CalendarEvent>, CalendarError> {
        Ok(self
            .events
            .iter()
            .filter(|e| start.is_none_or(|s| e.end >= s) && end.is_none_or(|t| e.start <= t))
            .cloned()
            .collect())
    }
}

/// Earliest event on the same local day as `after` that starts
/// strictly after it.
pub fn first_event_after<'a>(
    events: &'a [CalendarEvent],
    after: DateTime<Utc>,
) -> Option<&'a CalendarEvent> {
    let day = after.with_timezone(&Local).date_naive();
    events
        .iter()
        .filter(|e| e.start > after && e.start.with_timezone(&Local).date_naive() == day)
        .min_by_key(|e| e.start)
}

/// Whether a title contains any of the configured importance keywords.
pub fn title_is_important(title: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| title.contains(k.as_str()))
}

/// Importance of a day's schedule, judged from the first event's title.
/// No events, or no keyword match, reads as low importance.
pub fn importance_of(events: &[CalendarEvent], keywords: &[String]) -> EventImportance {
    match events.iter().min_by_key(|e| e.start) {
        Some(first) if title_is_important(&first.title, keywords) => EventImportance::High,
        Some(_) => EventImportance::Low,
        None => EventImportance::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn local_utc(h: u32, m: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2025, 6, 10, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn first_event_after_picks_earliest_same_day() {
        let after = local_utc(7, 0);
        let events = vec![
            CalendarEvent::new("Lunch", local_utc(12, 0), local_utc(13, 0)),
            CalendarEvent::new("Standup", local_utc(9, 30), local_utc(9, 45)),
            CalendarEvent::new("Earlier", local_utc(6, 0), local_utc(6, 30)),
        ];
        let first = first_event_after(&events, after).unwrap();
        assert_eq!(first.title, "Standup");
    }

    #[test]
    fn first_event_after_ignores_other_days() {
        let after = local_utc(7, 0);
        let tomorrow = after + Duration::days(1);
        let events = vec![CalendarEvent::new("Tomorrow", tomorrow, tomorrow)];
        assert!(first_event_after(&events, after).is_none());
    }

    #[test]
    fn keyword_match_raises_importance() {
        let keywords = vec!["Important".to_string(), "Test".to_string()];
        let events = vec![CalendarEvent::new(
            "Final Test",
            local_utc(9, 0),
            local_utc(10, 0),
        )];
        assert_eq!(importance_of(&events, &keywords), EventImportance::High);
        assert!(title_is_important("Important: board meeting", &keywords));
        assert!(!title_is_important("Coffee with Sam", &keywords));
    }

    #[test]
    fn empty_calendar_reads_low() {
        let keywords = vec!["Important".to_string()];
        assert_eq!(importance_of(&[], &keywords), EventImportance::Low);
    }

    #[test]
    fn static_calendar_filters_range() {
        let calendar = StaticCalendar::new(vec![
            CalendarEvent::new("A", local_utc(9, 0), local_utc(10, 0)),
            CalendarEvent::new("B", local_utc(15, 0), local_utc(16, 0)),
        ]);
        let events = calendar
            .events(Some(local_utc(8, 0)), Some(local_utc(11, 0)))
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].title, "A");
    }
}
