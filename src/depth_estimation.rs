// src/depth_estimation.rs
//
// Monocular relative-depth collaborator. The model emits inverse depth
// (larger = closer) at its own resolution; the raster stays at model
// resolution and the ranging core rescales coordinates when sampling.

use crate::preprocessing::{normalize_imagenet, resize_bilinear};
use crate::types::{DepthConfig, DepthMap};
use anyhow::{Context, Result};
use ndarray::Array2;
use ort::session::Session;
use tracing::debug;

pub struct DepthEstimator {
    session: Session,
    input_width: usize,
    input_height: usize,
}

impl DepthEstimator {
    pub fn new(session: Session, config: &DepthConfig) -> Self {
        Self {
            session,
            input_width: config.input_width,
            input_height: config.input_height,
        }
    }

    /// Produce an inverse-depth raster for one RGB frame.
    pub fn estimate(&mut self, frame: &[u8], width: usize, height: usize) -> Result<DepthMap> {
        let resized = resize_bilinear(frame, width, height, self.input_width, self.input_height);
        let input = normalize_imagenet(&resized, self.input_width, self.input_height);

        let shape = [1usize, 3, self.input_height, self.input_width];
        let input_value =
            ort::value::Value::from_array((shape.as_slice(), input.into_boxed_slice()))?;

        let outputs = self.session.run(ort::inputs![input_value])?;
        let (out_shape, data) = outputs[0].try_extract_tensor::<f32>()?;

        // Output is [1, H, W] or [H, W] depending on the export
        let dims: Vec<usize> = out_shape.iter().map(|d| *d as usize).collect();
        let (raster_h, raster_w) = match dims.as_slice() {
            [_, h, w] => (*h, *w),
            [h, w] => (*h, *w),
            other => anyhow::bail!("Unexpected depth output shape: {:?}", other),
        };

        let raster = Array2::from_shape_vec((raster_h, raster_w), data.to_vec())
            .context("Depth output size does not match its declared shape")?;

        debug!("Depth raster {}×{}", raster_w, raster_h);

        Ok(DepthMap {
            width: raster_w,
            height: raster_h,
            data: raster.into_raw_vec_and_offset().0,
        })
    }
}
