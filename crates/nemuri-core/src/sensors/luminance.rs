//! AE-indicator to lux conversion.
//!
//! The camera path does not measure lux directly; it produces a scalar
//! auto-exposure indicator from a fixed-exposure frame. A measured
//! calibration table maps indicator values to approximate lux by
//! piecewise-linear interpolation. Adding calibration points improves
//! accuracy.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Measured (indicator, lux) calibration points, indicator ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationTable {
    points: Vec<(f64, f64)>,
}

impl Default for CalibrationTable {
    fn default() -> Self {
        // Measured on the reference handset.
        Self {
            points: vec![(0.0, 0.0), (0.0161, 4.0), (0.1330, 392.0), (0.3472, 915.0)],
        }
    }
}

impl CalibrationTable {
    /// Build a table from measured points. Indicators must be strictly
    /// increasing and at least two points are required.
    pub fn new(points: Vec<(f64, f64)>) -> Result<Self, ConfigError> {
        if points.len() < 2 {
            return Err(ConfigError::InvalidValue {
                key: "calibration".into(),
                message: "at least two calibration points required".into(),
            });
        }
        if points.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(ConfigError::InvalidValue {
                key: "calibration".into(),
                message: "calibration indicators must be strictly increasing".into(),
            });
        }
        Ok(Self { points })
    }

    /// Approximate lux for an AE indicator value.
    ///
    /// Inside the table the two bracketing points are interpolated
    /// linearly; beyond the last point the final segment's slope is
    /// extrapolated. An indicator of zero or below maps to 0 lux.
    pub fn lux_for(&self, indicator: f64) -> f64 {
        if indicator <= 0.0 {
            return 0.0;
        }

        for window in self.points.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            if indicator <= x1 {
                let t = (indicator - x0) / (x1 - x0);
                return y0 + t * (y1 - y0);
            }
        }

        let (x0, y0) = self.points[self.points.len() - 2];
        let (x1, y1) = self.points[self.points.len() - 1];
        let slope = (y1 - y0) / (x1 - x0);
        y1 + slope * (indicator - x1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_and_negative_map_to_zero() {
        let table = CalibrationTable::default();
        assert_eq!(table.lux_for(0.0), 0.0);
        assert_eq!(table.lux_for(-1.0), 0.0);
    }

    #[test]
    fn table_points_map_to_themselves() {
        let table = CalibrationTable::default();
        assert!((table.lux_for(0.0161) - 4.0).abs() < 1e-9);
        assert!((table.lux_for(0.1330) - 392.0).abs() < 1e-9);
        assert!((table.lux_for(0.3472) - 915.0).abs() < 1e-9);
    }

    #[test]
    fn interpolates_between_points() {
        let table = CalibrationTable::new(vec![(0.0, 0.0), (1.0, 100.0)]).unwrap();
        assert!((table.lux_for(0.5) - 50.0).abs() < 1e-9);
        assert!((table.lux_for(0.25) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn extrapolates_past_last_point() {
        let table = CalibrationTable::new(vec![(0.0, 0.0), (1.0, 100.0), (2.0, 300.0)]).unwrap();
        // Final segment slope is 200 lux per indicator unit.
        assert!((table.lux_for(3.0) - 500.0).abs() < 1e-9);
    }

    #[test]
    fn rejects_unsorted_points() {
        assert!(CalibrationTable::new(vec![(0.0, 0.0), (0.5, 10.0), (0.5, 20.0)]).is_err());
        assert!(CalibrationTable::new(vec![(1.0, 0.0), (0.5, 10.0)]).is_err());
        assert!(CalibrationTable::new(vec![(0.0, 0.0)]).is_err());
    }

    proptest! {
        #[test]
        fn default_table_is_monotonic(a in 0.0f64..2.0, b in 0.0f64..2.0) {
            let table = CalibrationTable::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(table.lux_for(lo) <= table.lux_for(hi) + 1e-9);
        }

        #[test]
        fn lux_is_finite_and_non_negative(indicator in -1.0f64..10.0) {
            let lux = CalibrationTable::default().lux_for(indicator);
            prop_assert!(lux.is_finite());
            prop_assert!(lux >= 0.0);
        }
    }
}
