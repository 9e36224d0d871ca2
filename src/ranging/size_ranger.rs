// src/ranging/size_ranger.rs
//
// Size-based ranging: a recognized object of known real-world size subtends
// a pixel size that shrinks linearly with distance (pinhole model), so
// distance = real_size × focal / pixel_size.

use crate::types::{
    CameraIntrinsics, Detection, KnownObjectSize, MeasurementAxis, RangeComponent, RangeMethod,
};

/// Below this many pixels the measurement is quantization-dominated.
const MIN_PIXEL_SIZE: f32 = 5.0;

/// Plausible output range; anything outside is a degenerate box or a bad
/// catalog match, not a measurement.
const MIN_DISTANCE_M: f32 = 1.0;
const MAX_DISTANCE_M: f32 = 2000.0;

/// Beyond this distance confidence decays as 500/distance.
const FAR_PENALTY_START_M: f32 = 500.0;

/// Convert one detection with a known real-world size into a distance
/// candidate. Returns `None` when any guard fails: the box is too small to
/// measure, or the implied distance is implausible.
pub fn range_from_size(
    detection: &Detection,
    record: &KnownObjectSize,
    intrinsics: &CameraIntrinsics,
) -> Option<RangeComponent> {
    let pixel_size = pixel_measurement(detection, record.axis);
    if pixel_size < MIN_PIXEL_SIZE {
        return None;
    }

    let focal = focal_for_axis(intrinsics, record.axis);
    let distance_m = record.size_m * focal / pixel_size;

    if !(MIN_DISTANCE_M..=MAX_DISTANCE_M).contains(&distance_m) {
        return None;
    }

    let confidence = score_confidence(detection, record, pixel_size, distance_m);
    let weight = (confidence * record.reliability).clamp(0.0, 1.0);

    Some(RangeComponent {
        method: RangeMethod::from_category(record.category),
        distance_m,
        confidence,
        weight,
        source_label: Some(detection.label.clone()),
        rationale: format!(
            "{:.2} m {} at {:.0} px, focal {:.0} px",
            record.size_m,
            axis_name(record.axis),
            pixel_size,
            focal
        ),
    })
}

fn pixel_measurement(detection: &Detection, axis: MeasurementAxis) -> f32 {
    match axis {
        // Shoulder height is still measured off the box height: the box of a
        // standing animal is dominated by the body, not the head.
        MeasurementAxis::Height | MeasurementAxis::ShoulderHeight => detection.pixel_height(),
        MeasurementAxis::Width => detection.pixel_width(),
        MeasurementAxis::Diagonal => detection.bbox.diagonal(),
    }
}

fn focal_for_axis(intrinsics: &CameraIntrinsics, axis: MeasurementAxis) -> f32 {
    match axis {
        MeasurementAxis::Height | MeasurementAxis::ShoulderHeight => intrinsics.focal_px_y,
        MeasurementAxis::Width => intrinsics.focal_px_x,
        MeasurementAxis::Diagonal => (intrinsics.focal_px_x + intrinsics.focal_px_y) / 2.0,
    }
}

fn axis_name(axis: MeasurementAxis) -> &'static str {
    match axis {
        MeasurementAxis::Height => "height",
        MeasurementAxis::ShoulderHeight => "shoulder height",
        MeasurementAxis::Width => "width",
        MeasurementAxis::Diagonal => "diagonal",
    }
}

/// Detector confidence degraded by everything that makes the pinhole
/// conversion less trustworthy: small boxes, variable-sized species, boxes
/// whose shape doesn't match the expected silhouette, extreme range.
fn score_confidence(
    detection: &Detection,
    record: &KnownObjectSize,
    pixel_size: f32,
    distance_m: f32,
) -> f32 {
    let size_penalty = if pixel_size < 50.0 {
        pixel_size / 50.0
    } else if pixel_size < 100.0 {
        0.8 + (pixel_size - 50.0) / 250.0
    } else {
        1.0
    };

    let variability_penalty = 1.0 - record.variability * 0.5;

    let actual_aspect = detection.pixel_width() / detection.pixel_height();
    let aspect_deviation =
        (actual_aspect - record.expected_aspect).abs() / record.expected_aspect.max(0.1);
    let aspect_penalty = if aspect_deviation > 0.5 {
        0.6
    } else if aspect_deviation > 0.3 {
        0.8
    } else {
        1.0
    };

    let distance_penalty = if distance_m > FAR_PENALTY_START_M {
        FAR_PENALTY_START_M / distance_m
    } else {
        1.0
    };

    (detection.confidence * size_penalty * variability_penalty * aspect_penalty * distance_penalty)
        .clamp(0.0, 1.0)
}
