// src/object_detection.rs

use crate::preprocessing::{letterbox, normalize_unit};
use crate::types::{BoundingBox, Detection, DetectionConfig};
use anyhow::Result;
use ort::session::Session;
use tracing::debug;

const YOLO_PREDICTIONS: usize = 8400;
const YOLO_CLASSES: usize = 80;

// COCO class names, index-aligned with the model's class logits. Open
// namespace downstream: the ranging core matches labels against its own
// catalog and ignores the rest.
const COCO_NAMES: [&str; 80] = [
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich",
    "orange", "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
    "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote",
    "keyboard", "cell phone", "microwave", "oven", "toaster", "sink", "refrigerator", "book",
    "clock", "vase", "scissors", "teddy bear", "hair drier", "toothbrush",
];

pub struct YoloDetector {
    session: Session,
    input_size: usize,
    config: DetectionConfig,
}

impl YoloDetector {
    pub fn new(session: Session, input_size: usize, config: DetectionConfig) -> Self {
        Self {
            session,
            input_size,
            config,
        }
    }

    /// Detect objects in one RGB frame. Boxes come back in original frame
    /// coordinates, top-left origin.
    pub fn detect(
        &mut self,
        frame: &[u8],
        width: usize,
        height: usize,
        timestamp_ms: f64,
    ) -> Result<Vec<Detection>> {
        let (canvas, scale, pad_x, pad_y) = letterbox(frame, width, height, self.input_size);
        let input = normalize_unit(&canvas, self.input_size, self.input_size);

        let output = self.infer(&input)?;

        let detections = self.postprocess(&output, scale, pad_x, pad_y, timestamp_ms);
        debug!("Detected {} objects", detections.len());
        Ok(detections)
    }

    fn infer(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        let shape = [1usize, 3, self.input_size, self.input_size];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.to_vec().into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs!["images" => input_value])?;
        let (_, data) = outputs[0].try_extract_tensor::<f32>()?;

        Ok(data.to_vec())
    }

    fn postprocess(
        &self,
        output: &[f32],
        scale: f32,
        pad_x: f32,
        pad_y: f32,
        timestamp_ms: f64,
    ) -> Vec<Detection> {
        let mut detections = Vec::new();

        // Output layout: [1, 84, 8400]: 4 box coords then 80 class scores,
        // transposed so each field is a contiguous run of 8400.
        for i in 0..YOLO_PREDICTIONS {
            let cx = output[i];
            let cy = output[YOLO_PREDICTIONS + i];
            let w = output[YOLO_PREDICTIONS * 2 + i];
            let h = output[YOLO_PREDICTIONS * 3 + i];

            let mut max_conf = 0.0f32;
            let mut best_class = 0;
            for c in 0..YOLO_CLASSES {
                let conf = output[YOLO_PREDICTIONS * (4 + c) + i];
                if conf > max_conf {
                    max_conf = conf;
                    best_class = c;
                }
            }

            if max_conf < self.config.confidence_threshold {
                continue;
            }

            // Center format → top-left, then undo the letterbox
            let x = (cx - w / 2.0 - pad_x) / scale;
            let y = (cy - h / 2.0 - pad_y) / scale;
            let box_w = w / scale;
            let box_h = h / scale;

            if box_w <= 0.0 || box_h <= 0.0 {
                continue;
            }

            detections.push(Detection {
                label: COCO_NAMES[best_class].to_string(),
                confidence: max_conf,
                bbox: BoundingBox {
                    x,
                    y,
                    width: box_w,
                    height: box_h,
                },
                timestamp_ms,
            });
        }

        nms(detections, self.config.nms_iou_threshold)
    }
}

fn nms(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    if detections.is_empty() {
        return detections;
    }

    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Detection> = Vec::new();

    while !detections.is_empty() {
        let current = detections.remove(0);

        detections.retain(|det| calculate_iou(&current.bbox, &det.bbox) < iou_threshold);
        keep.push(current);
    }

    keep
}

fn calculate_iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - intersection;

    if union > 0.0 {
        intersection / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(x: f32, y: f32, w: f32, h: f32, confidence: f32) -> Detection {
        Detection {
            label: "person".to_string(),
            confidence,
            bbox: BoundingBox {
                x,
                y,
                width: w,
                height: h,
            },
            timestamp_ms: 0.0,
        }
    }

    #[test]
    fn test_iou_disjoint_is_zero() {
        let a = BoundingBox {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = BoundingBox {
            x: 20.0,
            y: 20.0,
            width: 10.0,
            height: 10.0,
        };
        assert_eq!(calculate_iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_identical_is_one() {
        let a = BoundingBox {
            x: 5.0,
            y: 5.0,
            width: 10.0,
            height: 10.0,
        };
        assert!((calculate_iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_suppresses_overlaps() {
        let detections = vec![
            boxed(0.0, 0.0, 100.0, 100.0, 0.9),
            boxed(5.0, 5.0, 100.0, 100.0, 0.7), // heavy overlap, lower score
            boxed(300.0, 300.0, 50.0, 50.0, 0.8),
        ];
        let kept = nms(detections, 0.45);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].confidence, 0.9);
    }

    #[test]
    fn test_nms_keeps_disjoint() {
        let detections = vec![
            boxed(0.0, 0.0, 50.0, 50.0, 0.9),
            boxed(200.0, 0.0, 50.0, 50.0, 0.85),
            boxed(0.0, 200.0, 50.0, 50.0, 0.8),
        ];
        assert_eq!(nms(detections, 0.45).len(), 3);
    }

    #[test]
    fn test_coco_table_covers_all_classes() {
        assert_eq!(COCO_NAMES.len(), YOLO_CLASSES);
        assert_eq!(COCO_NAMES[0], "person");
        assert_eq!(COCO_NAMES[11], "stop sign");
    }
}
