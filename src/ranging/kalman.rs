// src/ranging/kalman.rs

/// Uninformative prior: the first measurement dominates regardless of the
/// measurement noise passed with it.
const INITIAL_VARIANCE: f32 = 100.0;

/// 1-D Kalman filter over the fused distance. Smooths frame-to-frame jitter
/// while still tracking genuine approach/retreat.
///
/// Owned by one `RangingEngine`; never serialized. The filter has no change
/// detection of its own; the owner decides when a scene change warrants
/// `reset()`.
#[derive(Debug, Clone)]
pub struct DistanceKalmanFilter {
    estimate: f32,
    variance: f32,
    process_noise: f32,
    measurement_noise: f32,
}

impl DistanceKalmanFilter {
    pub fn new(process_noise: f32, measurement_noise: f32) -> Self {
        Self {
            estimate: 0.0,
            variance: INITIAL_VARIANCE,
            process_noise,
            measurement_noise,
        }
    }

    /// Fold one measurement into the estimate.
    ///
    /// # Arguments
    /// * `measurement` - fused distance for this frame, meters
    /// * `noise_override` - per-call measurement noise (the fusion layer
    ///   passes its uncertainty here); `None` uses the configured default
    pub fn update(&mut self, measurement: f32, noise_override: Option<f32>) -> f32 {
        let r = noise_override.unwrap_or(self.measurement_noise);

        let predicted_variance = self.variance + self.process_noise;
        let gain = predicted_variance / (predicted_variance + r);

        self.estimate += gain * (measurement - self.estimate);
        self.variance = (1.0 - gain) * predicted_variance;

        self.estimate
    }

    pub fn estimate(&self) -> f32 {
        self.estimate
    }

    /// One standard deviation of the current estimate, meters.
    pub fn uncertainty(&self) -> f32 {
        self.variance.sqrt()
    }

    pub fn reset(&mut self) {
        self.estimate = 0.0;
        self.variance = INITIAL_VARIANCE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_to_constant_input() {
        let mut filter = DistanceKalmanFilter::new(0.5, 2.0);

        let target = 120.0;
        let mut estimate = 0.0;
        for _ in 0..50 {
            estimate = filter.update(target, None);
        }

        // Within 1% after at most 50 updates
        assert!((estimate - target).abs() / target < 0.01);
    }

    #[test]
    fn test_first_update_dominated_by_measurement() {
        let mut filter = DistanceKalmanFilter::new(0.5, 2.0);
        let estimate = filter.update(100.0, None);
        // Prior variance 100 vs noise 2: gain ≈ 0.98
        assert!(estimate > 95.0);
    }

    #[test]
    fn test_smooths_spikes() {
        let mut filter = DistanceKalmanFilter::new(0.5, 2.0);
        for _ in 0..20 {
            filter.update(50.0, None);
        }
        let spiked = filter.update(80.0, None);
        assert!(spiked < 65.0, "spike should be dampened, got {}", spiked);
        assert!(spiked > 50.0);
    }

    #[test]
    fn test_noise_override_changes_trust() {
        let mut trusting = DistanceKalmanFilter::new(0.5, 2.0);
        let mut sceptical = DistanceKalmanFilter::new(0.5, 2.0);
        for _ in 0..20 {
            trusting.update(50.0, None);
            sceptical.update(50.0, None);
        }
        let a = trusting.update(70.0, Some(0.1));
        let b = sceptical.update(70.0, Some(50.0));
        assert!(a > b, "low noise should follow the measurement more closely");
    }

    #[test]
    fn test_reset_restores_prior() {
        let mut filter = DistanceKalmanFilter::new(0.5, 2.0);
        for _ in 0..10 {
            filter.update(42.0, None);
        }
        filter.reset();
        assert_eq!(filter.estimate(), 0.0);
        assert_eq!(filter.uncertainty(), 10.0);
    }

    #[test]
    fn test_variance_shrinks_with_updates() {
        let mut filter = DistanceKalmanFilter::new(0.5, 2.0);
        let before = filter.uncertainty();
        filter.update(30.0, None);
        let after = filter.uncertainty();
        assert!(after < before);
    }
}
