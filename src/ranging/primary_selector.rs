// src/ranging/primary_selector.rs
//
// Picks the one detection most relevant to where the user is aiming: high
// confidence AND close to the frame center, with no hard cutoff on either.

use crate::types::Detection;

/// Softens the center-distance divisor so a dead-center detection doesn't
/// get an unbounded score.
const CENTER_BIAS: f32 = 0.1;

/// Select the primary detection for display and depth sampling.
///
/// Score = confidence / (distance from frame center in normalized image
/// coordinates + 0.1). Ties keep the earliest detection in the list: the
/// scan only replaces the champion on a strictly greater score, so the
/// result is deterministic regardless of how the detector orders equals.
pub fn select_primary<'a>(
    detections: &'a [Detection],
    frame_width: u32,
    frame_height: u32,
) -> Option<&'a Detection> {
    if frame_width == 0 || frame_height == 0 {
        return None;
    }

    let mut best: Option<(&Detection, f32)> = None;

    for detection in detections {
        let score = aim_score(detection, frame_width as f32, frame_height as f32);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((detection, score)),
        }
    }

    best.map(|(detection, _)| detection)
}

fn aim_score(detection: &Detection, frame_w: f32, frame_h: f32) -> f32 {
    let (cx, cy) = detection.center();
    let nx = cx / frame_w - 0.5;
    let ny = cy / frame_h - 0.5;
    let center_distance = (nx * nx + ny * ny).sqrt();

    detection.confidence / (center_distance + CENTER_BIAS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BoundingBox;

    fn detection(label: &str, confidence: f32, cx: f32, cy: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox {
                x: cx - 20.0,
                y: cy - 40.0,
                width: 40.0,
                height: 80.0,
            },
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_empty_list_gives_none() {
        assert!(select_primary(&[], 1280, 720).is_none());
    }

    #[test]
    fn test_prefers_centered_detection() {
        let detections = vec![
            detection("person", 0.9, 100.0, 100.0), // corner
            detection("deer", 0.9, 640.0, 360.0),   // dead center
        ];
        let primary = select_primary(&detections, 1280, 720).unwrap();
        assert_eq!(primary.label, "deer");
    }

    #[test]
    fn test_confidence_can_outweigh_offset() {
        // A much more confident detection slightly off-center should beat a
        // barely-confident one at center.
        let detections = vec![
            detection("car", 0.95, 800.0, 360.0),
            detection("person", 0.2, 640.0, 360.0),
        ];
        let primary = select_primary(&detections, 1280, 720).unwrap();
        assert_eq!(primary.label, "car");
    }

    #[test]
    fn test_tie_keeps_earliest() {
        // Two identical detections at mirrored offsets score identically;
        // the first in the list must win.
        let detections = vec![
            detection("first", 0.8, 540.0, 360.0),
            detection("second", 0.8, 740.0, 360.0),
        ];
        let primary = select_primary(&detections, 1280, 720).unwrap();
        assert_eq!(primary.label, "first");
    }

    #[test]
    fn test_single_detection_selected_regardless_of_position() {
        let detections = vec![detection("dog", 0.35, 50.0, 50.0)];
        assert!(select_primary(&detections, 1280, 720).is_some());
    }
}
