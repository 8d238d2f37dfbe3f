mod engine;
mod window;

pub use engine::{
    AlarmEngine, AlarmPhase, AlarmState, StopOutcome, CLOCK_CHECK_SECS, ESCALATION_CHECK_SECS,
    INITIAL_VOLUME, VOLUME_RAMP_SECS, VOLUME_STEP,
};
pub use window::adjusted_window_minutes;
