// src/ranging/depth_ranger.rs
//
// Depth-based ranging: sample the relative inverse-depth raster in a window
// around the aim point, take the median, and convert through the calibrated
// scale factor. The raster rarely matches the frame resolution, so the
// window is rescaled per axis before sampling.

use crate::types::{Detection, DepthMap, RangeComponent, RangeMethod};

/// Window side when sampling at a detection's center, frame pixels.
const TARGET_WINDOW_PX: f32 = 50.0;
/// Wider window when falling back to the frame center, where no box anchors it.
const CENTER_WINDOW_PX: f32 = 100.0;
/// Sample every Nth raster pixel in both axes.
const SAMPLE_STRIDE: usize = 4;

/// Monocular depth carries approximate absolute scale at best, and degrades
/// with range; keep it subordinate to a well-conditioned size estimate.
const DEPTH_CONFIDENCE: f32 = 0.5;
const DEPTH_FUSION_WEIGHT: f32 = 0.3;

const MIN_DISTANCE_M: f32 = 0.5;
const MAX_DISTANCE_M: f32 = 2000.0;

/// Convert the raster region around the target (or the frame center) into a
/// distance candidate. `None` when the window yields no usable samples or
/// the converted distance is implausible.
pub fn range_from_depth(
    depth: &DepthMap,
    target: Option<&Detection>,
    frame_width: u32,
    frame_height: u32,
    scale_factor: f32,
) -> Option<RangeComponent> {
    let median = median_inverse_depth(depth, target, frame_width, frame_height)?;

    // Raster stores inverse depth: larger values are closer.
    let distance_m = scale_factor / median;
    if !(MIN_DISTANCE_M..=MAX_DISTANCE_M).contains(&distance_m) {
        return None;
    }

    Some(RangeComponent {
        method: RangeMethod::Depth,
        distance_m,
        confidence: DEPTH_CONFIDENCE,
        weight: DEPTH_FUSION_WEIGHT,
        source_label: target.map(|t| t.label.clone()),
        rationale: format!("median inverse depth {:.4}, scale {:.2}", median, scale_factor),
    })
}

/// Median of the valid inverse-depth samples in the aim window. Also used by
/// the guided calibration flow, which needs the raw raster value rather than
/// a converted distance.
pub fn median_inverse_depth(
    depth: &DepthMap,
    target: Option<&Detection>,
    frame_width: u32,
    frame_height: u32,
) -> Option<f32> {
    if depth.width == 0 || depth.height == 0 || frame_width == 0 || frame_height == 0 {
        return None;
    }

    let (center_x, center_y, window) = match target {
        Some(detection) => {
            let (cx, cy) = detection.center();
            (cx, cy, TARGET_WINDOW_PX)
        }
        None => (
            frame_width as f32 / 2.0,
            frame_height as f32 / 2.0,
            CENTER_WINDOW_PX,
        ),
    };

    // Frame coordinates → raster coordinates, per axis.
    let scale_x = depth.width as f32 / frame_width as f32;
    let scale_y = depth.height as f32 / frame_height as f32;

    let x0 = (((center_x - window / 2.0) * scale_x).floor().max(0.0)) as usize;
    let y0 = (((center_y - window / 2.0) * scale_y).floor().max(0.0)) as usize;
    let x1 = ((((center_x + window / 2.0) * scale_x).ceil()) as usize).min(depth.width);
    let y1 = ((((center_y + window / 2.0) * scale_y).ceil()) as usize).min(depth.height);

    if x0 >= x1 || y0 >= y1 {
        return None;
    }

    let mut samples = Vec::new();
    for y in (y0..y1).step_by(SAMPLE_STRIDE) {
        for x in (x0..x1).step_by(SAMPLE_STRIDE) {
            if let Some(value) = depth.value_at(x, y) {
                if value.is_finite() && value > 0.0 {
                    samples.push(value);
                }
            }
        }
    }

    if samples.is_empty() {
        return None;
    }

    // Median is robust against holes and edge artifacts in the raster.
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(samples[samples.len() / 2])
}
