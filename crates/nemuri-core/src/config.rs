//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Wake-up time and sleep duration (sleep time is derived, never stored)
//! - Alarm resilience window, preparation time and morning mission
//! - Sleep monitor usage thresholds and environment ceilings
//! - Importance keywords for calendar events
//!
//! Configuration is stored at `~/.config/nemuri/config.toml`. Every
//! field carries an explicit default so a missing or partial file
//! always deserializes to a usable configuration.

use chrono::{DateTime, Duration, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Sleep schedule configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepConfig {
    #[serde(default = "default_wake_up_hour")]
    pub wake_up_hour: u32,
    #[serde(default = "default_wake_up_minute")]
    pub wake_up_minute: u32,
    #[serde(default = "default_sleep_duration_hours")]
    pub sleep_duration_hours: u32,
}

/// Alarm escalation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Grace period after the alarm first rings before escalation,
    /// prior to any calendar adjustment.
    #[serde(default = "default_resilience_window")]
    pub resilience_window_minutes: i64,
    /// Time needed between getting up and leaving.
    #[serde(default = "default_preparation_minutes")]
    pub preparation_minutes: i64,
    /// Travel buffer subtracted from the first event's start.
    #[serde(default = "default_commute_buffer")]
    pub commute_buffer_minutes: i64,
    /// Whether dismissing a strict-phase alarm requires the photo mission.
    #[serde(default)]
    pub mission_enabled: bool,
    /// Object the mission photo must show.
    #[serde(default = "default_mission_target")]
    pub mission_target: String,
}

/// Sleep monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Phone usage minutes that trigger the phase 1 warning.
    #[serde(default = "default_phase1_warn_minutes")]
    pub phase1_warn_minutes: u32,
    /// Phone usage minutes that trigger the phase 2 warning.
    #[serde(default = "default_phase2_warn_minutes")]
    pub phase2_warn_minutes: u32,
    /// Ambient light ceiling in lux.
    #[serde(default = "default_light_ceiling")]
    pub light_ceiling_lux: f64,
    /// Ambient noise ceiling in dB.
    #[serde(default = "default_noise_ceiling")]
    pub noise_ceiling_db: f64,
    /// Per-channel cooldown between environment notifications.
    #[serde(default = "default_notification_cooldown")]
    pub notification_cooldown_secs: u64,
}

/// Calendar interpretation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// An event whose title contains one of these is treated as important:
    /// its warning level is raised and the alarm window is halved.
    #[serde(default = "default_importance_keywords")]
    pub importance_keywords: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/nemuri/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sleep: SleepConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
}

// Default functions
fn default_wake_up_hour() -> u32 {
    7
}
fn default_wake_up_minute() -> u32 {
    0
}
fn default_sleep_duration_hours() -> u32 {
    8
}
fn default_resilience_window() -> i64 {
    30
}
fn default_preparation_minutes() -> i64 {
    20
}
fn default_commute_buffer() -> i64 {
    30
}
fn default_mission_target() -> String {
    "washroom".into()
}
fn default_phase1_warn_minutes() -> u32 {
    20
}
fn default_phase2_warn_minutes() -> u32 {
    15
}
fn default_light_ceiling() -> f64 {
    30.0
}
fn default_noise_ceiling() -> f64 {
    45.0
}
fn default_notification_cooldown() -> u64 {
    30
}
fn default_importance_keywords() -> Vec<String> {
    vec!["Important".into(), "Test".into()]
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            wake_up_hour: default_wake_up_hour(),
            wake_up_minute: default_wake_up_minute(),
            sleep_duration_hours: default_sleep_duration_hours(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            resilience_window_minutes: default_resilience_window(),
            preparation_minutes: default_preparation_minutes(),
            commute_buffer_minutes: default_commute_buffer(),
            mission_enabled: false,
            mission_target: default_mission_target(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            phase1_warn_minutes: default_phase1_warn_minutes(),
            phase2_warn_minutes: default_phase2_warn_minutes(),
            light_ceiling_lux: default_light_ceiling(),
            noise_ceiling_db: default_noise_ceiling(),
            notification_cooldown_secs: default_notification_cooldown(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            importance_keywords: default_importance_keywords(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sleep: SleepConfig::default(),
            alarm: AlarmConfig::default(),
            monitor: MonitorConfig::default(),
            calendar: CalendarConfig::default(),
        }
    }
}

impl SleepConfig {
    /// Target bedtime as hour/minute: wake-up time minus sleep duration,
    /// wrapped around midnight.
    pub fn sleep_hour_minute(&self) -> (u32, u32) {
        let mut total =
            self.wake_up_hour as i64 * 60 + self.wake_up_minute as i64 - self.sleep_duration_hours as i64 * 60;
        if total < 0 {
            total += 24 * 60;
        }
        (((total / 60) % 24) as u32, (total % 60) as u32)
    }

    /// Next occurrence of the target bedtime, local wall clock.
    /// If today's bedtime is already past, rolls to tomorrow.
    pub fn sleep_time_after(&self, now: DateTime<Local>) -> DateTime<Local> {
        let (hour, minute) = self.sleep_hour_minute();
        let today = now
            .with_hour(hour)
            .and_then(|t| t.with_minute(minute))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl Config {
    /// Path of the config file: `~/.config/nemuri/config.toml`.
    pub fn path() -> Result<PathBuf, ConfigError> {
        let base = dirs::home_dir()
            .map(|h| h.join(".config"))
            .ok_or(ConfigError::NoConfigDir)?;
        let dir = base.join("nemuri");
        std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
            path: dir.clone(),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, creating a default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load from disk, falling back to defaults on any failure.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Load from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Persist to disk at the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key, preserving the field's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        {
            let parts: Vec<&str> = key.split('.').collect();
            let (last, parents) = parts.split_last().expect("split always yields one part");
            let mut current = &mut json;
            for part in parents {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown key".into()))?;
                current = obj.get_mut(*part).ok_or_else(|| invalid("unknown key".into()))?;
            }
            {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| invalid("unknown key".into()))?;
                {
                    let part = last;
                    let existing = obj.get(*part).ok_or_else(|| invalid("unknown key".into()))?;
                    let new_value = match existing {
                        serde_json::Value::Bool(_) => serde_json::Value::Bool(
                            value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                        ),
                        serde_json::Value::Number(_) => {
                            if let Ok(n) = value.parse::<u64>() {
                                serde_json::Value::Number(n.into())
                            } else if let Ok(n) = value.parse::<i64>() {
                                serde_json::Value::Number(n.into())
                            } else {
                                let f = value.parse::<f64>().map_err(|e| invalid(e.to_string()))?;
                                serde_json::Number::from_f64(f)
                                    .map(serde_json::Value::Number)
                                    .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                            }
                        }
                        serde_json::Value::String(_) => serde_json::Value::String(value.to_string()),
                        serde_json::Value::Array(_) => serde_json::Value::Array(
                            value
                                .split(',')
                                .map(|s| serde_json::Value::String(s.trim().to_string()))
                                .collect(),
                        ),
                        _ => return Err(invalid("unsupported value type".into())),
                    };
                    obj.insert(part.to_string(), new_value);
                }
            }
        }
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};

    #[test]
    fn sleep_time_wraps_past_midnight() {
        let sleep = SleepConfig {
            wake_up_hour: 7,
            wake_up_minute: 0,
            sleep_duration_hours: 8,
        };
        assert_eq!(sleep.sleep_hour_minute(), (23, 0));

        let early = SleepConfig {
            wake_up_hour: 6,
            wake_up_minute: 30,
            sleep_duration_hours: 8,
        };
        assert_eq!(early.sleep_hour_minute(), (22, 30));
    }

    #[test]
    fn sleep_time_after_rolls_to_tomorrow() {
        let sleep = SleepConfig::default(); // bedtime 23:00
        let now = Local.with_ymd_and_hms(2025, 6, 10, 23, 30, 0).unwrap();
        let next = sleep.sleep_time_after(now);
        assert_eq!(next.day(), 11);
        assert_eq!(next.hour(), 23);
        assert_eq!(next.minute(), 0);
    }

    #[test]
    fn get_and_set_by_dot_path() {
        let mut config = Config::default();
        assert_eq!(config.get("monitor.phase1_warn_minutes").as_deref(), Some("20"));

        config.set("monitor.phase1_warn_minutes", "25").unwrap();
        assert_eq!(config.monitor.phase1_warn_minutes, 25);

        config.set("alarm.mission_enabled", "true").unwrap();
        assert!(config.alarm.mission_enabled);

        assert!(config.set("monitor.no_such_key", "1").is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[alarm]\nresilience_window_minutes = 10\n").unwrap();
        assert_eq!(config.alarm.resilience_window_minutes, 10);
        assert_eq!(config.alarm.preparation_minutes, 20);
        assert_eq!(config.monitor.light_ceiling_lux, 30.0);
        assert_eq!(config.calendar.importance_keywords, vec!["Important", "Test"]);
    }
}
