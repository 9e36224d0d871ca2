// src/ranging/fusion.rs
//
// Combines the per-method distance candidates into one estimate. With one
// component the estimate passes through; with several, a fusion-weighted
// mean with propagated spread. No components means no estimate: the caller
// gets `None`, never a zero-distance placeholder.

use crate::types::{DistanceUnit, RangeComponent, RangeEstimate, RangeMethod};

/// Even perfectly agreeing methods share systematic error; never report
/// better than ±3% of the fused distance.
const MIN_UNCERTAINTY_RATIO: f32 = 0.03;

/// Spread assumed for a lone component, scaled by how unsure it is.
const SINGLE_SOURCE_SPREAD: f32 = 0.2;

pub fn fuse(components: Vec<RangeComponent>, timestamp_ms: f64) -> Option<RangeEstimate> {
    match components.len() {
        0 => None,
        1 => {
            let (distance, confidence, method) = {
                let c = &components[0];
                (c.distance_m, c.confidence, c.method)
            };
            Some(RangeEstimate {
                distance,
                unit: DistanceUnit::Meters,
                confidence,
                method,
                uncertainty: distance * (1.0 - confidence) * SINGLE_SOURCE_SPREAD,
                components,
                timestamp_ms,
            })
        }
        _ => fuse_weighted(components, timestamp_ms),
    }
}

fn fuse_weighted(components: Vec<RangeComponent>, timestamp_ms: f64) -> Option<RangeEstimate> {
    let total_weight: f32 = components.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        // All candidates weightless: nothing to average
        return None;
    }

    let mean = components
        .iter()
        .map(|c| c.distance_m * c.weight)
        .sum::<f32>()
        / total_weight;

    let variance = components
        .iter()
        .map(|c| c.weight * (c.distance_m - mean).powi(2))
        .sum::<f32>()
        / total_weight;

    let uncertainty = variance.sqrt().max(mean * MIN_UNCERTAINTY_RATIO);

    // Balance the best single method against the weight-typical one: a lone
    // strong method shouldn't be drowned by weak corroborators, nor fully
    // trusted against them.
    let best_confidence = components
        .iter()
        .map(|c| c.confidence)
        .fold(0.0f32, f32::max);
    let typical_confidence = components
        .iter()
        .map(|c| c.confidence * c.weight)
        .sum::<f32>()
        / total_weight;
    let confidence = ((best_confidence + typical_confidence) / 2.0).clamp(0.0, 1.0);

    Some(RangeEstimate {
        distance: mean,
        unit: DistanceUnit::Meters,
        confidence,
        method: RangeMethod::Fused,
        uncertainty,
        components,
        timestamp_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(method: RangeMethod, distance_m: f32, confidence: f32, weight: f32) -> RangeComponent {
        RangeComponent {
            method,
            distance_m,
            confidence,
            weight,
            source_label: None,
            rationale: String::new(),
        }
    }

    #[test]
    fn test_no_components_no_estimate() {
        assert!(fuse(Vec::new(), 0.0).is_none());
    }

    #[test]
    fn test_single_component_passthrough() {
        let c = component(RangeMethod::HumanSize, 42.0, 0.8, 0.7);
        let estimate = fuse(vec![c], 123.0).unwrap();
        assert_eq!(estimate.distance, 42.0);
        assert_eq!(estimate.confidence, 0.8);
        assert_eq!(estimate.method, RangeMethod::HumanSize);
        // 42 × 0.2 × 0.2 = 1.68
        assert!((estimate.uncertainty - 1.68).abs() < 1e-4);
        assert_eq!(estimate.components.len(), 1);
        assert_eq!(estimate.timestamp_ms, 123.0);
    }

    #[test]
    fn test_two_component_weighted_mean() {
        // (100 × 0.8 + 120 × 0.2) / 1.0 = 104;
        // variance = 0.8×16 + 0.2×256 = 64 → uncertainty 8 m, above the
        // 3% floor of 3.12 m
        let estimate = fuse(
            vec![
                component(RangeMethod::HumanSize, 100.0, 0.9, 0.8),
                component(RangeMethod::Depth, 120.0, 0.5, 0.2),
            ],
            0.0,
        )
        .unwrap();
        assert!((estimate.distance - 104.0).abs() < 1e-3);
        assert!((estimate.uncertainty - 8.0).abs() < 1e-3);
        assert_eq!(estimate.method, RangeMethod::Fused);
    }

    #[test]
    fn test_fused_confidence_blend() {
        let estimate = fuse(
            vec![
                component(RangeMethod::HumanSize, 100.0, 0.9, 0.8),
                component(RangeMethod::Depth, 120.0, 0.5, 0.2),
            ],
            0.0,
        )
        .unwrap();
        // typical = (0.9×0.8 + 0.5×0.2) / 1.0 = 0.82; (0.9 + 0.82)/2 = 0.86
        assert!((estimate.confidence - 0.86).abs() < 1e-3);
    }

    #[test]
    fn test_uncertainty_floor_on_perfect_agreement() {
        let estimate = fuse(
            vec![
                component(RangeMethod::HumanSize, 200.0, 0.9, 0.5),
                component(RangeMethod::Depth, 200.0, 0.5, 0.3),
            ],
            0.0,
        )
        .unwrap();
        // Zero spread still reports the 3% floor
        assert!((estimate.uncertainty - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_mean_bounded_by_inputs() {
        let cases = [
            (50.0, 0.9, 0.7, 300.0, 0.4, 0.3),
            (10.0, 0.2, 0.1, 12.0, 0.9, 0.9),
            (1500.0, 0.5, 0.5, 2.0, 0.5, 0.5),
        ];
        for (d1, c1, w1, d2, c2, w2) in cases {
            let estimate = fuse(
                vec![
                    component(RangeMethod::VehicleSize, d1, c1, w1),
                    component(RangeMethod::Depth, d2, c2, w2),
                ],
                0.0,
            )
            .unwrap();
            let lo = d1.min(d2);
            let hi = d1.max(d2);
            assert!(estimate.distance >= lo && estimate.distance <= hi);
        }
    }

    #[test]
    fn test_all_zero_weights_treated_as_empty() {
        let result = fuse(
            vec![
                component(RangeMethod::HumanSize, 100.0, 0.0, 0.0),
                component(RangeMethod::Depth, 120.0, 0.0, 0.0),
            ],
            0.0,
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_three_way_fusion_keeps_components() {
        let estimate = fuse(
            vec![
                component(RangeMethod::HumanSize, 98.0, 0.85, 0.75),
                component(RangeMethod::WildlifeSize, 105.0, 0.6, 0.4),
                component(RangeMethod::Depth, 110.0, 0.5, 0.3),
            ],
            0.0,
        )
        .unwrap();
        assert_eq!(estimate.components.len(), 3);
        assert!(estimate.distance > 98.0 && estimate.distance < 110.0);
        assert!(estimate.uncertainty >= estimate.distance * 0.03);
    }
}
