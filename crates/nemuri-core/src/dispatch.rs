//! Cooldown-gated notification dispatch.
//!
//! Both state machines alert through the same primitive: a per-key
//! check-and-set cooldown map. `can_send` either consumes the send
//! slot for a key (recording "now" as its last-sent time) or refuses
//! without side effects. Cooldowns are cleared whenever a monitoring
//! or alarm session starts or stops so a stale timestamp never
//! suppresses the first alert of a new session.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// Well-known dispatch keys.
pub mod keys {
    pub const LIGHT: &str = "light";
    pub const NOISE: &str = "noise";
}

/// Delivery side of notifications. Fire-and-forget: the core requires
/// no delivery guarantee and never inspects the outcome.
pub trait Notifier: Send + Sync {
    fn send(&self, title: &str, body: &str);
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn send(&self, _title: &str, _body: &str) {}
}

/// Per-key cooldown bookkeeping for one-shot alerting.
#[derive(Debug, Clone, Default)]
pub struct NotificationDispatcher {
    last_sent: HashMap<String, DateTime<Utc>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check-and-set in one call: returns `false` without side effects
    /// if the last successful send for `key` was less than `cooldown`
    /// ago; otherwise records `now` as the last-sent time and returns
    /// `true`.
    pub fn can_send(&mut self, key: &str, cooldown: Duration, now: DateTime<Utc>) -> bool {
        if let Some(last) = self.last_sent.get(key) {
            if now - *last < cooldown {
                return false;
            }
        }
        self.last_sent.insert(key.to_string(), now);
        true
    }

    /// Clear all cooldowns. Called on session start and stop.
    pub fn reset_cooldowns(&mut self) {
        self.last_sent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_gates_repeat_sends() {
        let mut dispatcher = NotificationDispatcher::new();
        let t0 = Utc::now();
        let cooldown = Duration::milliseconds(30_000);

        assert!(dispatcher.can_send(keys::LIGHT, cooldown, t0));
        assert!(!dispatcher.can_send(keys::LIGHT, cooldown, t0 + Duration::seconds(1)));
        assert!(!dispatcher.can_send(keys::LIGHT, cooldown, t0 + Duration::seconds(29)));
        assert!(dispatcher.can_send(keys::LIGHT, cooldown, t0 + Duration::seconds(30)));
    }

    #[test]
    fn keys_are_independent() {
        let mut dispatcher = NotificationDispatcher::new();
        let t0 = Utc::now();
        let cooldown = Duration::seconds(30);

        assert!(dispatcher.can_send(keys::LIGHT, cooldown, t0));
        assert!(dispatcher.can_send(keys::NOISE, cooldown, t0));
        assert!(!dispatcher.can_send(keys::LIGHT, cooldown, t0));
    }

    #[test]
    fn refused_send_leaves_no_trace() {
        let mut dispatcher = NotificationDispatcher::new();
        let t0 = Utc::now();
        let cooldown = Duration::seconds(30);

        assert!(dispatcher.can_send(keys::NOISE, cooldown, t0));
        // A refused attempt must not push the window forward.
        assert!(!dispatcher.can_send(keys::NOISE, cooldown, t0 + Duration::seconds(29)));
        assert!(dispatcher.can_send(keys::NOISE, cooldown, t0 + Duration::seconds(30)));
    }

    #[test]
    fn reset_clears_all_keys() {
        let mut dispatcher = NotificationDispatcher::new();
        let t0 = Utc::now();
        let cooldown = Duration::seconds(30);

        assert!(dispatcher.can_send(keys::LIGHT, cooldown, t0));
        assert!(dispatcher.can_send(keys::NOISE, cooldown, t0));
        dispatcher.reset_cooldowns();
        assert!(dispatcher.can_send(keys::LIGHT, cooldown, t0));
        assert!(dispatcher.can_send(keys::NOISE, cooldown, t0));
    }
}
