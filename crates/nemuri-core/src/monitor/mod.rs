mod engine;
mod score;
mod state;

pub use engine::{AdviceRequest, AdviceStamp, SleepMonitor, TickOutput, PHASE_TICK_SECS};
pub use score::SleepScore;
pub use state::{EnvironmentSample, MonitorPhase, MonitorState, Warning, WarningLevel};
