// src/pipeline/metrics.rs
//
// Production observability. Tracks counts and timings for every stage of
// the ranging pipeline. Dumped as JSON at end of run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_with_detections: Arc<AtomicU64>,
    pub frames_with_depth: Arc<AtomicU64>,
    pub frames_with_estimate: Arc<AtomicU64>,
    pub locked_frames: Arc<AtomicU64>,
    pub size_components: Arc<AtomicU64>,
    pub depth_components: Arc<AtomicU64>,
    pub fused_estimates: Arc<AtomicU64>,
    pub detect_time_us: Arc<AtomicU64>,
    pub depth_time_us: Arc<AtomicU64>,
    pub ranging_time_us: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_with_detections: Arc::new(AtomicU64::new(0)),
            frames_with_depth: Arc::new(AtomicU64::new(0)),
            frames_with_estimate: Arc::new(AtomicU64::new(0)),
            locked_frames: Arc::new(AtomicU64::new(0)),
            size_components: Arc::new(AtomicU64::new(0)),
            depth_components: Arc::new(AtomicU64::new(0)),
            fused_estimates: Arc::new(AtomicU64::new(0)),
            detect_time_us: Arc::new(AtomicU64::new(0)),
            depth_time_us: Arc::new(AtomicU64::new(0)),
            ranging_time_us: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, amount: u64) {
        counter.fetch_add(amount, Ordering::Relaxed);
    }

    pub fn set_timing(&self, counter: &AtomicU64, duration_us: u64) {
        counter.store(duration_us, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        let total = self.total_frames.load(Ordering::Relaxed);
        let with_estimate = self.frames_with_estimate.load(Ordering::Relaxed);
        MetricsSummary {
            total_frames: total,
            fps: self.fps(),
            frames_with_detections: self.frames_with_detections.load(Ordering::Relaxed),
            frames_with_depth: self.frames_with_depth.load(Ordering::Relaxed),
            frames_with_estimate: with_estimate,
            estimate_coverage: if total > 0 {
                with_estimate as f64 / total as f64
            } else {
                0.0
            },
            locked_frames: self.locked_frames.load(Ordering::Relaxed),
            size_components: self.size_components.load(Ordering::Relaxed),
            depth_components: self.depth_components.load(Ordering::Relaxed),
            fused_estimates: self.fused_estimates.load(Ordering::Relaxed),
            last_detect_us: self.detect_time_us.load(Ordering::Relaxed),
            last_depth_us: self.depth_time_us.load(Ordering::Relaxed),
            last_ranging_us: self.ranging_time_us.load(Ordering::Relaxed),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub fps: f64,
    pub frames_with_detections: u64,
    pub frames_with_depth: u64,
    pub frames_with_estimate: u64,
    pub estimate_coverage: f64,
    pub locked_frames: u64,
    pub size_components: u64,
    pub depth_components: u64,
    pub fused_estimates: u64,
    pub last_detect_us: u64,
    pub last_depth_us: u64,
    pub last_ranging_us: u64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = PipelineMetrics::new();
        metrics.inc(&metrics.total_frames);
        metrics.inc(&metrics.total_frames);
        metrics.inc(&metrics.frames_with_estimate);
        metrics.add(&metrics.size_components, 3);

        let summary = metrics.summary();
        assert_eq!(summary.total_frames, 2);
        assert_eq!(summary.frames_with_estimate, 1);
        assert_eq!(summary.size_components, 3);
        assert!((summary.estimate_coverage - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary_serializes() {
        let metrics = PipelineMetrics::new();
        let json = serde_json::to_string(&metrics.summary()).unwrap();
        assert!(json.contains("\"total_frames\":0"));
    }
}
