use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Sanity limits the rest of the system assumes. Fails fast at startup
    /// instead of producing silent nonsense mid-session.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.detection.confidence_threshold) {
            anyhow::bail!(
                "detection.confidence_threshold must be in [0, 1], got {}",
                self.detection.confidence_threshold
            );
        }
        if self.camera.horizontal_fov_deg <= 0.0 || self.camera.horizontal_fov_deg >= 180.0 {
            anyhow::bail!(
                "camera.horizontal_fov_deg must be in (0, 180), got {}",
                self.camera.horizontal_fov_deg
            );
        }
        if self.camera.vertical_fov_deg <= 0.0 || self.camera.vertical_fov_deg >= 180.0 {
            anyhow::bail!(
                "camera.vertical_fov_deg must be in (0, 180), got {}",
                self.camera.vertical_fov_deg
            );
        }
        if self.ranging.process_noise <= 0.0 {
            anyhow::bail!("ranging.process_noise must be positive");
        }
        if self.ranging.measurement_noise <= 0.0 {
            anyhow::bail!("ranging.measurement_noise must be positive");
        }
        if self.ranging.scale_factor <= 0.0 {
            anyhow::bail!("ranging.scale_factor must be positive");
        }
        if self.depth.frame_stride == 0 {
            anyhow::bail!("depth.frame_stride must be at least 1");
        }
        Ok(())
    }
}
