use clap::Subcommand;
use nemuri_core::sensors::{classify_vertical_axis, CalibrationTable};

use super::print_json;

#[derive(Subcommand)]
pub enum LightAction {
    /// Convert a camera AE indicator to approximate lux
    Estimate {
        /// AE indicator from a fixed-exposure frame
        #[arg(long)]
        indicator: f64,
    },
    /// Classify an accelerometer vertical-axis sample
    Orientation {
        /// Vertical-axis component in g
        #[arg(long)]
        z: f64,
    },
}

pub fn run(action: LightAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        LightAction::Estimate { indicator } => {
            let lux = CalibrationTable::default().lux_for(indicator);
            print_json(&serde_json::json!({ "indicator": indicator, "lux": lux }))
        }
        LightAction::Orientation { z } => {
            print_json(&serde_json::json!({ "z": z, "orientation": classify_vertical_axis(z) }))
        }
    }
}
