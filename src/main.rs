// src/main.rs

mod config;
mod depth_estimation;
mod inference;
mod object_detection;
mod pipeline;
mod preprocessing;
mod ranging;
mod size_catalog;
mod types;
mod video_processor;

use anyhow::Result;
use depth_estimation::DepthEstimator;
use object_detection::YoloDetector;
use pipeline::{EventBus, LockTracker, PipelineMetrics, RangeEvent};
use ranging::RangingEngine;
use size_catalog::ObjectSizeCatalog;
use std::path::Path;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use types::{Config, DepthMap, FrameResult, RangeEstimate, RangeMethod};
use video_processor::VideoProcessor;

#[derive(Debug, Default)]
struct VideoStats {
    total_frames: u64,
    frames_with_estimate: u64,
    lock_transitions: u64,
    confidence_sum: f64,
}

impl VideoStats {
    fn estimate_percentage(&self) -> f64 {
        if self.total_frames > 0 {
            self.frames_with_estimate as f64 / self.total_frames as f64 * 100.0
        } else {
            0.0
        }
    }

    fn mean_confidence(&self) -> f64 {
        if self.frames_with_estimate > 0 {
            self.confidence_sum / self.frames_with_estimate as f64
        } else {
            0.0
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load("config.yaml")?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("rangefinder={},ort=warn", config.logging.level))
        .init();

    info!("🎯 Passive Rangefinder Starting");
    info!("✓ Configuration loaded");
    info!(
        "Display unit: {}, smoothing: {}, depth stride: {}",
        config.ranging.display_unit.as_str(),
        config.ranging.smoothing,
        config.depth.frame_stride
    );

    let detector_session = inference::build_session(&config.model.detector_path, &config.inference)?;
    let mut detector = YoloDetector::new(
        detector_session,
        config.model.input_size,
        config.detection.clone(),
    );
    info!("✓ Object detector ready");

    let depth_session = inference::build_session(&config.depth.model_path, &config.inference)?;
    let mut depth_estimator = DepthEstimator::new(depth_session, &config.depth);
    info!("✓ Depth estimator ready");

    let catalog = ObjectSizeCatalog::with_defaults();
    info!("✓ Size catalog loaded ({} entries)", catalog.len());

    let mut engine = RangingEngine::with_config((&config.ranging).into(), Box::new(catalog));

    // Estimates cross to the consumer side over a channel so the computing
    // loop never blocks on whoever renders them.
    let (estimate_tx, mut estimate_rx) = mpsc::channel::<RangeEstimate>(32);
    let reporter = tokio::spawn(async move {
        while let Some(estimate) = estimate_rx.recv().await {
            info!(
                "📏 {:.1} {} ±{:.1} ({}, conf {:.2}, {}{})",
                estimate.distance,
                estimate.unit.as_str(),
                estimate.uncertainty,
                estimate.method.as_str(),
                estimate.confidence,
                estimate.quality().as_str(),
                if estimate.is_locked() { ", locked" } else { "" },
            );
        }
    });

    let video_processor = VideoProcessor::new(config.clone());
    let video_files = video_processor.find_video_files()?;

    if video_files.is_empty() {
        error!("No video files found in {}", config.video.input_dir);
        return Ok(());
    }

    info!("Found {} video file(s) to process", video_files.len());

    let metrics = PipelineMetrics::new();

    for (idx, video_path) in video_files.iter().enumerate() {
        info!("\n========================================");
        info!(
            "Processing video {}/{}: {}",
            idx + 1,
            video_files.len(),
            video_path.display()
        );
        info!("========================================\n");

        match process_video(
            video_path,
            &mut detector,
            &mut depth_estimator,
            &mut engine,
            &video_processor,
            &config,
            &metrics,
            &estimate_tx,
        ) {
            Ok(stats) => {
                info!("\n✓ Video processed successfully!");
                info!("  Total frames: {}", stats.total_frames);
                info!(
                    "  Frames with estimate: {} ({:.1}%)",
                    stats.frames_with_estimate,
                    stats.estimate_percentage()
                );
                info!("  Lock transitions: {}", stats.lock_transitions);
                info!("  Mean confidence: {:.2}", stats.mean_confidence());
            }
            Err(e) => {
                error!("Failed to process {}: {:#}", video_path.display(), e);
            }
        }

        // Next video is a new scene: drop the smoothed prior
        engine.reset();
    }

    drop(estimate_tx);
    let _ = reporter.await;

    info!(
        "Session metrics: {}",
        serde_json::to_string_pretty(&metrics.summary())?
    );

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn process_video(
    path: &Path,
    detector: &mut YoloDetector,
    depth_estimator: &mut DepthEstimator,
    engine: &mut RangingEngine,
    video_processor: &VideoProcessor,
    config: &Config,
    metrics: &PipelineMetrics,
    estimate_tx: &mpsc::Sender<RangeEstimate>,
) -> Result<VideoStats> {
    let mut reader = video_processor.open_video(path)?;
    let intrinsics = config
        .camera
        .intrinsics_for(reader.width as u32, reader.height as u32);
    info!(
        "Intrinsics: fx={:.0} px, fy={:.0} px",
        intrinsics.focal_px_x, intrinsics.focal_px_y
    );

    let mut bus = EventBus::new(64);
    let mut lock_tracker = LockTracker::new();
    let mut last_depth: Option<DepthMap> = None;
    let mut stats = VideoStats::default();
    let mut frame_id: u64 = 0;

    while let Some(frame) = reader.read_frame()? {
        frame_id += 1;
        stats.total_frames += 1;
        metrics.inc(&metrics.total_frames);

        let t_detect = Instant::now();
        let detections =
            detector.detect(&frame.data, frame.width, frame.height, frame.timestamp_ms)?;
        metrics.set_timing(&metrics.detect_time_us, t_detect.elapsed().as_micros() as u64);

        if !detections.is_empty() {
            metrics.inc(&metrics.frames_with_detections);
        }

        // Depth is the expensive model; refresh every Nth frame and reuse
        // the latest raster in between.
        if (frame_id - 1) % config.depth.frame_stride as u64 == 0 {
            let t_depth = Instant::now();
            match depth_estimator.estimate(&frame.data, frame.width, frame.height) {
                Ok(raster) => last_depth = Some(raster),
                Err(e) => {
                    warn!("Depth inference failed on frame {}: {:#}", frame_id, e);
                    last_depth = None;
                }
            }
            metrics.set_timing(&metrics.depth_time_us, t_depth.elapsed().as_micros() as u64);
        }
        if last_depth.is_some() {
            metrics.inc(&metrics.frames_with_depth);
        }

        let frame_result = FrameResult {
            detections,
            depth: last_depth.clone(),
            intrinsics,
            frame_width: frame.width as u32,
            frame_height: frame.height as u32,
            timestamp_ms: frame.timestamp_ms,
        };

        let t_ranging = Instant::now();
        let estimate = engine.process_frame(&frame_result);
        metrics.set_timing(
            &metrics.ranging_time_us,
            t_ranging.elapsed().as_micros() as u64,
        );

        if let Some(estimate) = &estimate {
            stats.frames_with_estimate += 1;
            stats.confidence_sum += estimate.confidence as f64;
            metrics.inc(&metrics.frames_with_estimate);
            if estimate.is_locked() {
                metrics.inc(&metrics.locked_frames);
            }
            if estimate.method == RangeMethod::Fused {
                metrics.inc(&metrics.fused_estimates);
            }
            for component in &estimate.components {
                match component.method {
                    RangeMethod::Depth => metrics.inc(&metrics.depth_components),
                    _ => metrics.inc(&metrics.size_components),
                }
            }

            if estimate_tx.try_send(estimate.clone()).is_err() {
                debug!("Estimate channel full, dropping frame {}", frame_id);
            }
            bus.publish(RangeEvent::EstimatePublished(estimate.clone()));
        }

        if let Some(event) = lock_tracker.update(estimate.as_ref(), frame_id) {
            stats.lock_transitions += 1;
            bus.publish(event);
        }

        for event in bus.drain() {
            log_event(&event);
        }
    }

    Ok(stats)
}

fn log_event(event: &RangeEvent) {
    match event {
        RangeEvent::EstimatePublished(estimate) => {
            debug!(
                "Estimate: {:.1} {} ({})",
                estimate.distance,
                estimate.unit.as_str(),
                estimate.method.as_str()
            );
        }
        RangeEvent::TargetLocked {
            label,
            distance,
            frame_id,
        } => {
            info!(
                "🔒 F{}: Target locked{} at {:.1}",
                frame_id,
                label
                    .as_deref()
                    .map(|l| format!(" ({})", l))
                    .unwrap_or_default(),
                distance
            );
        }
        RangeEvent::TargetLost { frame_id } => {
            info!("🔓 F{}: Target lost", frame_id);
        }
        RangeEvent::CalibrationApplied { scale_factor } => {
            info!("Calibration applied: scale {:.3}", scale_factor);
        }
    }
}
