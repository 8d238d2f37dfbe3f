//! Sensor primitives and the fusion layer on top of them.
//!
//! Raw hardware access lives behind small poll-driven traits so the
//! decision core stays platform-agnostic. A reading of `Ok(None)`
//! means "no data right now"; an `Err` means the source itself is
//! unusable. Either way the consumer degrades to a missing reading --
//! sensors never abort a tick.

mod camera;
mod fusion;
mod luminance;
mod orientation;

pub use camera::{CameraBrightnessLoop, CAPTURE_INTERVAL_SECS};
pub use fusion::{resolve_ambient_light, AmbientLight, LightSource};
pub use luminance::CalibrationTable;
pub use orientation::{classify_vertical_axis, Orientation, OrientationFilter};

use crate::error::SensorError;

/// Ambient light sensor, reporting illuminance in lux.
pub trait LightSensor: Send + Sync {
    fn available(&self) -> bool;
    fn read_lux(&self) -> Result<Option<f64>, SensorError>;
}

/// Accelerometer, reporting the vertical-axis component in g.
pub trait Accelerometer: Send + Sync {
    fn read_vertical_axis(&self) -> Result<Option<f64>, SensorError>;
}

/// Microphone metering, reporting sound pressure in dB.
pub trait NoiseMeter: Send + Sync {
    fn read_db(&self) -> Result<Option<f64>, SensorError>;
}

/// Single-frame capture at fixed exposure, producing the scalar AE
/// indicator the calibration table converts to lux.
pub trait CameraCapture: Send + Sync {
    fn capture_indicator(&self) -> Result<f64, SensorError>;
}

/// Null object for hosts without a given sensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSensor;

impl LightSensor for NoSensor {
    fn available(&self) -> bool {
        false
    }

    fn read_lux(&self) -> Result<Option<f64>, SensorError> {
        Ok(None)
    }
}

impl Accelerometer for NoSensor {
    fn read_vertical_axis(&self) -> Result<Option<f64>, SensorError> {
        Ok(None)
    }
}

impl NoiseMeter for NoSensor {
    fn read_db(&self) -> Result<Option<f64>, SensorError> {
        Ok(None)
    }
}

impl CameraCapture for NoSensor {
    fn capture_indicator(&self) -> Result<f64, SensorError> {
        Err(SensorError::Unavailable {
            kind: crate::error::SensorKind::Camera,
        })
    }
}

/// Sensor that returns one fixed value forever. Used by the CLI's
/// simulation mode and by tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticReading(pub f64);

impl LightSensor for StaticReading {
    fn available(&self) -> bool {
        true
    }

    fn read_lux(&self) -> Result<Option<f64>, SensorError> {
        Ok(Some(self.0))
    }
}

impl Accelerometer for StaticReading {
    fn read_vertical_axis(&self) -> Result<Option<f64>, SensorError> {
        Ok(Some(self.0))
    }
}

impl NoiseMeter for StaticReading {
    fn read_db(&self) -> Result<Option<f64>, SensorError> {
        Ok(Some(self.0))
    }
}

impl CameraCapture for StaticReading {
    fn capture_indicator(&self) -> Result<f64, SensorError> {
        Ok(self.0)
    }
}
