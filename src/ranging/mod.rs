// src/ranging/mod.rs
//
// The ranging core. Signal flow per frame:
//
//   FrameResult ─┬→ size_ranger (every detection with a catalog hit) ─┐
//                └→ depth_ranger (at the primary detection / center) ─┼→ fusion
//                                                                     │
//                                   kalman (temporal smoothing) ←─────┘
//
// Orchestrated by RangingEngine::process_frame(). The engine is pure and
// synchronous: no I/O, no spawning, no blocking. Filter state and the depth
// scale factor are the only things that outlive a frame, and both live here
// under single-writer ownership.

pub mod calibration;
pub mod depth_ranger;
pub mod fusion;
pub mod kalman;
pub mod primary_selector;
pub mod size_ranger;

pub use calibration::DepthCalibration;
pub use kalman::DistanceKalmanFilter;
pub use primary_selector::select_primary;

use crate::size_catalog::SizeLookup;
use crate::types::{DistanceUnit, FrameResult, RangeEstimate, RangingSettings};
use anyhow::Result;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct RangingConfig {
    pub display_unit: DistanceUnit,
    /// Temporal smoothing of the fused distance. Disable for single-shot use.
    pub smoothing: bool,
    pub process_noise: f32,
    pub measurement_noise: f32,
    pub initial_scale_factor: f32,
    /// Consecutive estimate-less frames before the smoothed prior is dropped.
    /// 0 keeps the prior forever (the owner must reset manually).
    pub max_coast_frames: u32,
}

impl Default for RangingConfig {
    fn default() -> Self {
        Self {
            display_unit: DistanceUnit::Meters,
            smoothing: true,
            process_noise: 0.5,
            measurement_noise: 2.0,
            initial_scale_factor: 10.0,
            max_coast_frames: 90,
        }
    }
}

impl From<&RangingSettings> for RangingConfig {
    fn from(settings: &RangingSettings) -> Self {
        Self {
            display_unit: settings.display_unit,
            smoothing: settings.smoothing,
            process_noise: settings.process_noise,
            measurement_noise: settings.measurement_noise,
            initial_scale_factor: settings.scale_factor,
            max_coast_frames: settings.max_coast_frames,
        }
    }
}

pub struct RangingEngine {
    config: RangingConfig,
    catalog: Box<dyn SizeLookup>,
    filter: DistanceKalmanFilter,
    calibration: DepthCalibration,
    frames_without_estimate: u32,
    frame_count: u64,
}

impl RangingEngine {
    pub fn new(catalog: Box<dyn SizeLookup>) -> Self {
        Self::with_config(RangingConfig::default(), catalog)
    }

    pub fn with_config(config: RangingConfig, catalog: Box<dyn SizeLookup>) -> Self {
        Self {
            filter: DistanceKalmanFilter::new(config.process_noise, config.measurement_noise),
            calibration: DepthCalibration::new(config.initial_scale_factor),
            config,
            catalog,
            frames_without_estimate: 0,
            frame_count: 0,
        }
    }

    /// Run one full ranging cycle. `None` means no method produced a usable
    /// candidate this frame, as distinct from a low-confidence estimate.
    pub fn process_frame(&mut self, frame: &FrameResult) -> Option<RangeEstimate> {
        self.frame_count += 1;

        let primary = select_primary(&frame.detections, frame.frame_width, frame.frame_height);

        // Size candidates from every detection the catalog recognizes.
        let mut components = Vec::new();
        for detection in &frame.detections {
            let Some(record) = self.catalog.lookup(&detection.label) else {
                debug!("No size record for label '{}'", detection.label);
                continue;
            };
            if let Some(component) =
                size_ranger::range_from_size(detection, &record, &frame.intrinsics)
            {
                components.push(component);
            }
        }

        // One depth candidate at the aim point.
        if let Some(depth) = frame.depth.as_ref() {
            if let Some(component) = depth_ranger::range_from_depth(
                depth,
                primary,
                frame.frame_width,
                frame.frame_height,
                self.calibration.scale_factor(),
            ) {
                components.push(component);
            }
        }

        let Some(mut estimate) = fusion::fuse(components, frame.timestamp_ms) else {
            self.note_empty_frame();
            return None;
        };
        self.frames_without_estimate = 0;

        if self.config.smoothing {
            // The fused uncertainty doubles as the per-frame measurement
            // noise; a zero uncertainty falls back to the default.
            let noise = if estimate.uncertainty > 0.0 {
                Some(estimate.uncertainty)
            } else {
                None
            };
            estimate.distance = self.filter.update(estimate.distance, noise);
        }

        if self.frame_count % 150 == 0 {
            debug!(
                "F{}: {} components → {:.1} {} ±{:.1} ({})",
                self.frame_count,
                estimate.components.len(),
                estimate.distance,
                estimate.unit.as_str(),
                estimate.uncertainty,
                estimate.quality().as_str(),
            );
        }

        Some(estimate.into_unit(self.config.display_unit))
    }

    /// Zero-component frame: the filter keeps its prior so a brief dropout
    /// doesn't unlock the target, but a long one does.
    fn note_empty_frame(&mut self) {
        self.frames_without_estimate += 1;
        if self.config.max_coast_frames > 0
            && self.frames_without_estimate == self.config.max_coast_frames
        {
            info!(
                "No estimate for {} frames, dropping smoothed prior",
                self.frames_without_estimate
            );
            self.filter.reset();
        }
    }

    /// Establish the depth scale from one ground-truth measurement. Returns
    /// the new scale factor; non-positive inputs are rejected and reported.
    pub fn calibrate(&mut self, known_distance_m: f32, measured_inverse_depth: f32) -> Result<f32> {
        self.calibration
            .calibrate(known_distance_m, measured_inverse_depth)
    }

    pub fn scale_factor(&self) -> f32 {
        self.calibration.scale_factor()
    }

    /// Current smoothed distance and its spread, for diagnostics.
    pub fn filter_state(&self) -> (f32, f32) {
        (self.filter.estimate(), self.filter.uncertainty())
    }

    /// Call when the tracked target or scene changes; the engine has no
    /// change detection of its own.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.frames_without_estimate = 0;
        self.frame_count = 0;
    }
}
