//! Camera-brightness estimation loop state.
//!
//! Captures a single frame at fixed exposure on a 5 s cadence, but
//! only while enabled -- orientation gates the flag so the camera is
//! never running when the dedicated sensor covers the reading. The
//! caller owns the timing; this type owns the gating, the conversion
//! and the last value.

use tracing::debug;

use super::{CalibrationTable, CameraCapture};

/// Capture cadence while enabled.
pub const CAPTURE_INTERVAL_SECS: u64 = 5;

/// Gated camera estimator state.
#[derive(Debug, Clone)]
pub struct CameraBrightnessLoop {
    table: CalibrationTable,
    enabled: bool,
    last_lux: Option<f64>,
}

impl Default for CameraBrightnessLoop {
    fn default() -> Self {
        Self::new(CalibrationTable::default())
    }
}

impl CameraBrightnessLoop {
    pub fn new(table: CalibrationTable) -> Self {
        Self {
            table,
            enabled: false,
            last_lux: None,
        }
    }

    /// Gate the loop. Disabling clears the last estimate so a stale
    /// frame can never masquerade as a live reading.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.last_lux = None;
        }
        self.enabled = enabled;
    }

    /// Whether captures are currently allowed.
    pub fn active(&self) -> bool {
        self.enabled
    }

    /// Latest lux estimate, if the loop is active and has captured.
    pub fn estimated_lux(&self) -> Option<f64> {
        self.last_lux
    }

    /// Perform one capture. A no-op while disabled; a capture failure
    /// degrades to "no estimate" and is only logged.
    pub fn capture_once(&mut self, camera: &dyn CameraCapture) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        match camera.capture_indicator() {
            Ok(indicator) => {
                let lux = self.table.lux_for(indicator);
                debug!(indicator, lux, "camera brightness captured");
                self.last_lux = Some(lux);
                self.last_lux
            }
            Err(error) => {
                debug!(%error, "camera capture failed");
                self.last_lux = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{NoSensor, StaticReading};

    #[test]
    fn disabled_loop_never_captures() {
        let mut camera_loop = CameraBrightnessLoop::default();
        assert_eq!(camera_loop.capture_once(&StaticReading(0.1330)), None);
        assert!(!camera_loop.active());
    }

    #[test]
    fn enabled_loop_converts_indicator_to_lux() {
        let mut camera_loop = CameraBrightnessLoop::default();
        camera_loop.set_enabled(true);
        let lux = camera_loop.capture_once(&StaticReading(0.1330)).unwrap();
        assert!((lux - 392.0).abs() < 1e-9);
        assert_eq!(camera_loop.estimated_lux(), Some(lux));
    }

    #[test]
    fn disabling_clears_the_last_estimate() {
        let mut camera_loop = CameraBrightnessLoop::default();
        camera_loop.set_enabled(true);
        camera_loop.capture_once(&StaticReading(0.1330));
        camera_loop.set_enabled(false);
        assert_eq!(camera_loop.estimated_lux(), None);
    }

    #[test]
    fn capture_failure_degrades_to_none() {
        let mut camera_loop = CameraBrightnessLoop::default();
        camera_loop.set_enabled(true);
        assert_eq!(camera_loop.capture_once(&NoSensor), None);
        assert_eq!(camera_loop.estimated_lux(), None);
    }
}
