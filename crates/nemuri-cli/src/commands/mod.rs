pub mod alarm;
pub mod config;
pub mod light;
pub mod monitor;

use chrono::{Local, NaiveTime, Utc};
use nemuri_core::calendar::CalendarEvent;

/// Parse `"Title@HH:MM"` into a calendar event today at that local
/// time, one hour long.
pub fn parse_event(spec: &str) -> Result<CalendarEvent, Box<dyn std::error::Error>> {
    let (title, time) = spec
        .rsplit_once('@')
        .ok_or_else(|| format!("expected TITLE@HH:MM, got '{spec}'"))?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")?;
    let start = Local::now()
        .date_naive()
        .and_time(time)
        .and_local_timezone(Local)
        .earliest()
        .ok_or("ambiguous local time")?
        .with_timezone(&Utc);
    Ok(CalendarEvent::new(
        title.to_string(),
        start,
        start + chrono::Duration::hours(1),
    ))
}

/// Parse `"HH:MM"` as a local wall-clock time.
pub fn parse_hour_minute(spec: &str) -> Result<(u32, u32), Box<dyn std::error::Error>> {
    let time = NaiveTime::parse_from_str(spec, "%H:%M")?;
    use chrono::Timelike;
    Ok((time.hour(), time.minute()))
}

/// Print a value as one JSON line.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
