//! Ambient-light source selection.
//!
//! The dedicated light sensor faces the same way as the screen, so a
//! face-down device blinds it; the camera estimator works face-down
//! but burns battery. Orientation picks the source:
//!
//! - face-up: dedicated sensor, camera deliberately off
//! - face-down: camera estimator
//! - other: sensor preferred, camera as fallback

use serde::{Deserialize, Serialize};

use super::Orientation;

/// Where an ambient-light value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightSource {
    Sensor,
    Camera,
    Unavailable,
}

/// A resolved ambient-light reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub lux: Option<f64>,
    pub source: LightSource,
}

impl AmbientLight {
    pub const UNAVAILABLE: AmbientLight = AmbientLight {
        lux: None,
        source: LightSource::Unavailable,
    };
}

/// Choose the ambient-light reading for the current orientation.
///
/// `sensor_lux` must be `None` when the dedicated sensor is absent or
/// has produced no data; `camera_lux` must be `None` unless the camera
/// loop is active and has captured a frame.
pub fn resolve_ambient_light(
    orientation: Orientation,
    sensor_lux: Option<f64>,
    camera_lux: Option<f64>,
) -> AmbientLight {
    let from_sensor = |lux| AmbientLight {
        lux: Some(lux),
        source: LightSource::Sensor,
    };
    let from_camera = |lux| AmbientLight {
        lux: Some(lux),
        source: LightSource::Camera,
    };

    match orientation {
        Orientation::FaceUp => sensor_lux.map_or(AmbientLight::UNAVAILABLE, from_sensor),
        Orientation::FaceDown => camera_lux.map_or(AmbientLight::UNAVAILABLE, from_camera),
        Orientation::Other => sensor_lux
            .map(from_sensor)
            .or_else(|| camera_lux.map(from_camera))
            .unwrap_or(AmbientLight::UNAVAILABLE),
    }
}
