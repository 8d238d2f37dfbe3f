//! Timer-driven runtime over the pure state machines.
//!
//! The engines in [`crate::monitor`] and [`crate::alarm`] hold no
//! timers; these drivers own them as tokio tasks. Each driver keeps
//! every `JoinHandle` it spawns and aborts all of them exactly once
//! on teardown, so stopping twice is a no-op and no orphaned callback
//! can mutate an engine its owner believes is inert.
//!
//! Collaborator calls (calendar, advice, image verification) run on
//! the blocking pool, never on a tick task; their results come back
//! stamped and are applied by the engine only while the stamp is
//! still live.

mod alarm;
mod monitor;

pub use alarm::{AlarmRuntime, AudioSink, NullAudio};
pub use monitor::{MonitorRuntime, MonitorSensors};

use tokio::task::JoinHandle;

/// Abort a drained set of task handles. Draining first is what makes
/// the teardown idempotent.
fn abort_all(handles: &mut Vec<JoinHandle<()>>) {
    for handle in handles.drain(..) {
        handle.abort();
    }
}
