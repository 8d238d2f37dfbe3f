//! Advice generator collaborator contract.
//!
//! Warning and advice text is opaque to the core: only the contract
//! matters. Implementations may call out to an LLM and may be slow or
//! fail; the state machines treat any error as "no message" and move
//! on. [`TemplateAdvice`] is the built-in deterministic fallback.

use serde::{Deserialize, Serialize};

use crate::error::AdviceError;
use crate::monitor::MonitorPhase;

/// Importance of the user's upcoming schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventImportance {
    Low,
    Medium,
    High,
}

/// Context handed to the generator when a usage warning fires.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarningContext {
    /// Phase that triggered the warning.
    pub phase: MonitorPhase,
    /// Importance of tomorrow's first event.
    pub importance: EventImportance,
    /// Phone usage minutes accumulated in the triggering phase.
    pub usage_minutes: u32,
    /// Titles of tomorrow's events.
    pub tomorrow_events: Vec<String>,
}

/// Text generation for warnings and environment advice.
pub trait AdviceGenerator: Send + Sync {
    /// Message for a phone-usage warning.
    fn usage_warning(&self, context: &WarningContext) -> Result<String, AdviceError>;

    /// Message suggesting how to fix the sleep environment.
    fn environment_advice(
        &self,
        light_lux: Option<f64>,
        noise_db: Option<f64>,
    ) -> Result<String, AdviceError>;
}

/// Deterministic template-based generator. Default for the CLI and
/// the fallback when no external generator is wired up.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateAdvice;

impl AdviceGenerator for TemplateAdvice {
    fn usage_warning(&self, context: &WarningContext) -> Result<String, AdviceError> {
        let minutes = context.usage_minutes;
        let message = match (context.phase, context.importance) {
            (MonitorPhase::Phase1, EventImportance::High) => {
                let event = context
                    .tomorrow_events
                    .first()
                    .map(String::as_str)
                    .unwrap_or("an important event");
                format!(
                    "Tomorrow you have \"{event}\" and you've already been on your phone \
                     for {minutes} minutes. Put the screen down now and get ready for it."
                )
            }
            (MonitorPhase::Phase1, _) => format!(
                "Bedtime is 30 minutes away and you've spent {minutes} minutes on your \
                 phone. Time to set it aside and wind down."
            ),
            (_, EventImportance::High) => {
                let event = context
                    .tomorrow_events
                    .first()
                    .map(String::as_str)
                    .unwrap_or("an important event");
                format!(
                    "Warning: you're over the limit. Tomorrow's \"{event}\" will suffer \
                     for it. Start your bedtime routine immediately."
                )
            }
            _ => "Warning: you're over the limit. Keep this up and tomorrow will be a \
                  rough day. Start your bedtime routine immediately."
                .to_string(),
        };
        Ok(message)
    }

    fn environment_advice(
        &self,
        light_lux: Option<f64>,
        noise_db: Option<f64>,
    ) -> Result<String, AdviceError> {
        let mut lines = Vec::new();
        if let Some(lux) = light_lux {
            if lux >= 30.0 {
                lines.push("The room is still too bright. Turn off the remaining lights.");
            }
        }
        if let Some(db) = noise_db {
            if db >= 45.0 {
                lines.push("It's noisy around you. Try to quiet things down.");
            }
        }
        if lines.is_empty() {
            Ok("Your sleep environment looks good. Good night.".to_string())
        } else {
            Ok(lines.join("\n"))
        }
    }
}
