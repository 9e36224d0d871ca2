// src/inference.rs
//
// ONNX Runtime session construction shared by the object detector and the
// depth estimator.

use crate::types::InferenceConfig;
use anyhow::{Context, Result};
use ort::execution_providers::{
    CUDAExecutionProvider, ExecutionProviderDispatch, TensorRTExecutionProvider,
};
use ort::session::{builder::GraphOptimizationLevel, Session};
use tracing::info;

pub fn build_session(model_path: &str, config: &InferenceConfig) -> Result<Session> {
    info!("Loading model: {}", model_path);

    let mut providers: Vec<ExecutionProviderDispatch> = Vec::new();

    if config.use_tensorrt {
        info!("Enabling TensorRT execution provider");
        let mut trt_provider = TensorRTExecutionProvider::default();

        if config.use_fp16 {
            trt_provider = trt_provider.with_fp16(true);
            info!("FP16 precision enabled");
        }

        if config.enable_engine_cache {
            trt_provider = trt_provider.with_engine_cache(true).with_timing_cache(true);
            info!("Engine cache enabled at: {}", config.engine_cache_path);
        }

        providers.push(trt_provider.build());
    }

    // CUDA as fallback; ort falls through to CPU when neither is available
    providers.push(CUDAExecutionProvider::default().build());

    let session = Session::builder()?
        .with_execution_providers(providers)?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(config.num_threads)?
        .with_inter_threads(1)?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load model: {}", model_path))?;

    info!("✓ Session ready: {}", model_path);
    Ok(session)
}
