// src/ranging/calibration.rs
//
// Depth-scale calibration. The depth raster is relative inverse depth; one
// ground-truth measurement against a target at a known distance turns it into
// absolute meters: distance = scale_factor / inverse_depth.

use anyhow::Result;
use tracing::info;

/// Holds the scale factor between relative inverse depth and meters.
/// Survives across frames until the next calibration or process restart;
/// persisting it beyond that is the caller's concern.
#[derive(Debug, Clone)]
pub struct DepthCalibration {
    scale_factor: f32,
}

impl DepthCalibration {
    pub fn new(initial_scale_factor: f32) -> Self {
        Self {
            scale_factor: initial_scale_factor,
        }
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    /// Derive a new scale factor from one ground-truth measurement.
    ///
    /// # Arguments
    /// * `known_distance_m` - measured true distance to the calibration target
    /// * `measured_inverse_depth` - median inverse-depth value sampled at that
    ///   target
    ///
    /// Non-positive inputs leave the current scale factor untouched and are
    /// reported back so a guided calibration flow can tell the user to retry.
    pub fn calibrate(&mut self, known_distance_m: f32, measured_inverse_depth: f32) -> Result<f32> {
        if known_distance_m <= 0.0 {
            anyhow::bail!(
                "calibration distance must be positive, got {}",
                known_distance_m
            );
        }
        if measured_inverse_depth <= 0.0 {
            anyhow::bail!(
                "calibration depth sample must be positive, got {}",
                measured_inverse_depth
            );
        }

        self.scale_factor = known_distance_m * measured_inverse_depth;
        info!(
            "Depth scale calibrated: {:.1} m at inverse depth {:.4} → scale {:.3}",
            known_distance_m, measured_inverse_depth, self.scale_factor
        );
        Ok(self.scale_factor)
    }
}
