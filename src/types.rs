use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
    pub depth: DepthConfig,
    pub inference: InferenceConfig,
    pub detection: DetectionConfig,
    pub camera: CameraConfig,
    pub ranging: RangingSettings,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub detector_path: String,
    pub input_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    pub model_path: String,
    pub input_width: usize,
    pub input_height: usize,
    /// Run depth inference every Nth frame. Detections still come every frame.
    pub frame_stride: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub use_tensorrt: bool,
    pub use_fp16: bool,
    pub enable_engine_cache: bool,
    pub engine_cache_path: String,
    pub num_threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
    pub nms_iou_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub horizontal_fov_deg: f32,
    pub vertical_fov_deg: f32,
    pub focal_px_x: Option<f32>,
    pub focal_px_y: Option<f32>,
}

impl CameraConfig {
    /// Intrinsics for a frame of the given pixel dimensions. Explicit focal
    /// lengths win over the FOV-derived ones.
    pub fn intrinsics_for(&self, frame_width: u32, frame_height: u32) -> CameraIntrinsics {
        let fx = self.focal_px_x.unwrap_or_else(|| {
            CameraIntrinsics::focal_from_fov(self.horizontal_fov_deg, frame_width as f32)
        });
        let fy = self.focal_px_y.unwrap_or_else(|| {
            CameraIntrinsics::focal_from_fov(self.vertical_fov_deg, frame_height as f32)
        });
        CameraIntrinsics {
            focal_px_x: fx,
            focal_px_y: fy,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangingSettings {
    pub display_unit: DistanceUnit,
    pub smoothing: bool,
    pub process_noise: f32,
    pub measurement_noise: f32,
    pub scale_factor: f32,
    pub max_coast_frames: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    pub input_dir: String,
    pub target_fps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// One decoded RGB frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub timestamp_ms: f64,
}

// ============================================================================
// RANGING DATA MODEL
// ============================================================================

/// Pixel bounding box, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn diagonal(&self) -> f32 {
        (self.width * self.width + self.height * self.height).sqrt()
    }
}

/// One labeled detection from the object detector.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Open namespace; whatever label set the detector emits.
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
    pub timestamp_ms: f64,
}

impl Detection {
    pub fn pixel_width(&self) -> f32 {
        self.bbox.width
    }

    pub fn pixel_height(&self) -> f32 {
        self.bbox.height
    }

    pub fn center(&self) -> (f32, f32) {
        self.bbox.center()
    }
}

/// Focal lengths in pixel units.
#[derive(Debug, Clone, Copy)]
pub struct CameraIntrinsics {
    pub focal_px_x: f32,
    pub focal_px_y: f32,
}

impl CameraIntrinsics {
    pub fn new(focal_px_x: f32, focal_px_y: f32) -> Self {
        Self {
            focal_px_x,
            focal_px_y,
        }
    }

    /// Pinhole focal length from a field of view and the matching image span.
    pub fn focal_from_fov(fov_deg: f32, span_px: f32) -> f32 {
        let half = (fov_deg.to_radians() / 2.0).tan();
        if half > 0.0 {
            span_px / (2.0 * half)
        } else {
            span_px
        }
    }
}

/// Single-channel relative inverse-depth raster (larger = closer).
/// Co-registered with the frame but usually at a lower resolution.
#[derive(Debug, Clone)]
pub struct DepthMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl DepthMap {
    pub fn value_at(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }
}

/// Everything one camera frame contributes to a ranging cycle. Transient:
/// produced by the collaborators, consumed by the engine, dropped.
#[derive(Debug, Clone)]
pub struct FrameResult {
    pub detections: Vec<Detection>,
    pub depth: Option<DepthMap>,
    pub intrinsics: CameraIntrinsics,
    pub frame_width: u32,
    pub frame_height: u32,
    pub timestamp_ms: f64,
}

/// Closed category set for the size knowledge base. New categories are a
/// compile-time change, not a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectCategory {
    Human,
    Vehicle,
    Wildlife,
    Structure,
    Sign,
}

/// Which real-world dimension a catalog entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementAxis {
    Height,
    ShoulderHeight,
    Width,
    Diagonal,
}

/// Known real-world size record for one label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownObjectSize {
    pub label: String,
    pub category: ObjectCategory,
    pub axis: MeasurementAxis,
    /// Expected real size in meters along `axis`.
    pub size_m: f32,
    /// Relative spread of the real size across individuals [0, 1].
    pub variability: f32,
    /// How much to trust this entry when fusing [0, 1].
    pub reliability: f32,
    /// Expected width/height ratio of the bounding box.
    pub expected_aspect: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RangeMethod {
    HumanSize,
    VehicleSize,
    WildlifeSize,
    StructureSize,
    SignSize,
    Depth,
    Fused,
}

impl RangeMethod {
    pub fn from_category(category: ObjectCategory) -> Self {
        match category {
            ObjectCategory::Human => RangeMethod::HumanSize,
            ObjectCategory::Vehicle => RangeMethod::VehicleSize,
            ObjectCategory::Wildlife => RangeMethod::WildlifeSize,
            ObjectCategory::Structure => RangeMethod::StructureSize,
            ObjectCategory::Sign => RangeMethod::SignSize,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeMethod::HumanSize => "human_size",
            RangeMethod::VehicleSize => "vehicle_size",
            RangeMethod::WildlifeSize => "wildlife_size",
            RangeMethod::StructureSize => "structure_size",
            RangeMethod::SignSize => "sign_size",
            RangeMethod::Depth => "depth",
            RangeMethod::Fused => "fused",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    Meters,
    Yards,
}

const YARDS_PER_METER: f32 = 1.093_613_3;

impl DistanceUnit {
    pub fn from_meters(&self, meters: f32) -> f32 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Yards => meters * YARDS_PER_METER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceUnit::Meters => "m",
            DistanceUnit::Yards => "yd",
        }
    }
}

/// One candidate distance from a single method.
#[derive(Debug, Clone, Serialize)]
pub struct RangeComponent {
    pub method: RangeMethod,
    /// Always meters, regardless of the display unit.
    pub distance_m: f32,
    pub confidence: f32,
    /// Fusion weight: confidence blended with source reliability.
    pub weight: f32,
    pub source_label: Option<String>,
    pub rationale: String,
}

/// Coarse user-facing quality label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Excellent => "excellent",
            QualityTier::Good => "good",
            QualityTier::Fair => "fair",
            QualityTier::Poor => "poor",
        }
    }
}

/// Published per-frame estimate. Absence of an estimate is `None` at the
/// engine boundary; there is no zero-distance sentinel.
#[derive(Debug, Clone, Serialize)]
pub struct RangeEstimate {
    pub distance: f32,
    pub unit: DistanceUnit,
    pub confidence: f32,
    pub method: RangeMethod,
    /// One standard deviation, same unit as `distance`.
    pub uncertainty: f32,
    pub components: Vec<RangeComponent>,
    pub timestamp_ms: f64,
}

impl RangeEstimate {
    pub fn uncertainty_percent(&self) -> f32 {
        if self.distance > 0.0 {
            self.uncertainty / self.distance * 100.0
        } else {
            0.0
        }
    }

    pub fn quality(&self) -> QualityTier {
        let pct = self.uncertainty_percent();
        if self.confidence > 0.8 && pct < 5.0 {
            QualityTier::Excellent
        } else if self.confidence > 0.6 && pct < 10.0 {
            QualityTier::Good
        } else if self.confidence > 0.4 && pct < 20.0 {
            QualityTier::Fair
        } else {
            QualityTier::Poor
        }
    }

    /// Lock indicator consumed by the presentation layer.
    pub fn is_locked(&self) -> bool {
        self.confidence > 0.5
    }

    /// Convert distance and uncertainty for display. Components stay in
    /// meters.
    pub fn into_unit(mut self, unit: DistanceUnit) -> Self {
        if self.unit == unit {
            return self;
        }
        debug_assert_eq!(self.unit, DistanceUnit::Meters);
        self.distance = unit.from_meters(self.distance);
        self.uncertainty = unit.from_meters(self.uncertainty);
        self.unit = unit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_center_and_diagonal() {
        let bbox = BoundingBox {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
        };
        assert_eq!(bbox.center(), (25.0, 40.0));
        assert!((bbox.diagonal() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_focal_from_fov() {
        // 90° FOV: focal equals half the span
        let f = CameraIntrinsics::focal_from_fov(90.0, 1000.0);
        assert!((f - 500.0).abs() < 0.5);
    }

    #[test]
    fn test_quality_tiers() {
        let mut estimate = RangeEstimate {
            distance: 100.0,
            unit: DistanceUnit::Meters,
            confidence: 0.9,
            method: RangeMethod::HumanSize,
            uncertainty: 3.0,
            components: Vec::new(),
            timestamp_ms: 0.0,
        };
        assert_eq!(estimate.quality(), QualityTier::Excellent);

        estimate.confidence = 0.7;
        estimate.uncertainty = 8.0;
        assert_eq!(estimate.quality(), QualityTier::Good);

        estimate.confidence = 0.5;
        estimate.uncertainty = 15.0;
        assert_eq!(estimate.quality(), QualityTier::Fair);

        estimate.confidence = 0.3;
        assert_eq!(estimate.quality(), QualityTier::Poor);
    }

    #[test]
    fn test_uncertainty_percent_zero_distance() {
        let estimate = RangeEstimate {
            distance: 0.0,
            unit: DistanceUnit::Meters,
            confidence: 0.0,
            method: RangeMethod::Depth,
            uncertainty: 0.0,
            components: Vec::new(),
            timestamp_ms: 0.0,
        };
        assert_eq!(estimate.uncertainty_percent(), 0.0);
    }

    #[test]
    fn test_yard_conversion() {
        let estimate = RangeEstimate {
            distance: 100.0,
            unit: DistanceUnit::Meters,
            confidence: 0.8,
            method: RangeMethod::Fused,
            uncertainty: 5.0,
            components: Vec::new(),
            timestamp_ms: 0.0,
        };
        let yards = estimate.into_unit(DistanceUnit::Yards);
        assert!((yards.distance - 109.361).abs() < 0.01);
        assert!((yards.uncertainty - 5.468).abs() < 0.01);
        assert_eq!(yards.unit, DistanceUnit::Yards);
    }

    #[test]
    fn test_lock_threshold() {
        let mut estimate = RangeEstimate {
            distance: 50.0,
            unit: DistanceUnit::Meters,
            confidence: 0.51,
            method: RangeMethod::Fused,
            uncertainty: 2.0,
            components: Vec::new(),
            timestamp_ms: 0.0,
        };
        assert!(estimate.is_locked());
        estimate.confidence = 0.5;
        assert!(!estimate.is_locked());
    }
}
