// Integration tests for the closed-form impact field

use approx::assert_abs_diff_eq;
use comet_impact_rust::field::{evaluate, FieldEvaluator};
use comet_impact_rust::zone::DEFAULT_ZONES;
use comet_impact_rust::SimError;
use glam::DVec2;
use libm::erf;
use more_asserts::{assert_ge, assert_gt, assert_le, assert_lt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One sample point per zone, all on the x axis.
const ZONE_SAMPLES: [(f64, f64); 6] = [
    (0.5, 55.0),  // m = 0.25
    (1.5, 40.0),  // m = 2.25
    (2.2, 30.0),  // m = 4.84
    (2.65, 20.0), // m = 7.0225
    (2.78, 0.0),  // m = 7.7284
    (3.5, -2.7),  // m = 12.25
];

#[test]
fn test_origin_point_of_small_grid_matches_closed_form() {
    let axis = [0.0, 1.0, 2.0, 3.0];
    let field = evaluate(&axis, &axis, 1.0).unwrap();
    assert_eq!(field.shape(), (4, 4));

    // (0, 0): inner core, layer 55, diffusivity 1
    let r = (1.93f64 * 1.93 + 1.93 * 1.93).sqrt();
    let s = (4.0f64 * 1.0 * 1.0).sqrt();
    let amplitude = 100f64.powf((-1.0f64 / 10.0).exp());
    let expected = 55.0 + 0.5 * amplitude * (erf((0.3 - r) / s) - erf((-0.3 - r) / s));

    assert_abs_diff_eq!(field.get(0, 0), expected, epsilon = 1e-6);
    println!("T(0,0,1) = {:.6}", field.get(0, 0));
}

#[test]
fn test_every_zone_converges_to_layer_temperature() {
    let evaluator = FieldEvaluator::default();
    for (x, layer_temp) in ZONE_SAMPLES {
        let point = DVec2::new(x, 0.0);
        assert_eq!(evaluator.zone_at(point).layer_temp, layer_temp);

        let late = evaluator.temperature_at(point, 1.0e12).unwrap();
        assert_abs_diff_eq!(late, layer_temp, epsilon = 1e-6);

        let limit = evaluator.temperature_at(point, f64::INFINITY).unwrap();
        assert_eq!(limit, layer_temp);
    }
}

#[test]
fn test_residual_heat_at_one_million_time_units() {
    // the amplitude decays to 1 rather than 0, so the crust still carries ~3e-4 at t = 1e6
    let evaluator = FieldEvaluator::default();
    let point = DVec2::new(2.65, 0.0);
    let residual = evaluator.temperature_at(point, 1.0e6).unwrap() - 20.0;
    assert_gt!(residual, 1e-6);
    assert_lt!(residual, 1e-3);
}

#[test]
fn test_temperature_peaks_at_epicenter_within_zone() {
    let evaluator = FieldEvaluator::default();
    let epicenter = evaluator.impact.epicenter;

    for t in [0.01, 0.5, 1.0, 5.0] {
        let peak = evaluator.temperature_at(epicenter, t).unwrap();
        let mut previous = peak;
        // walk toward the origin while staying inside the crust band
        for k in 1..=12 {
            let d = 0.01 * k as f64;
            let point = epicenter - DVec2::splat(d);
            assert_eq!(evaluator.zone_at(point).name, "crust");
            let value = evaluator.temperature_at(point, t).unwrap();
            assert_le!(value, previous + 1e-12, "t = {}, d = {}", t, d);
            previous = value;
        }
        assert_gt!(peak, previous);
    }
}

#[test]
fn test_field_never_drops_below_layer_temperature() {
    let evaluator = FieldEvaluator::default();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let point = DVec2::new(rng.random_range(0.0..4.0), rng.random_range(0.0..4.0));
        let t = rng.random_range(0.001..50.0);
        let value = evaluator.temperature_at(point, t).unwrap();
        let layer_temp = evaluator.zone_at(point).layer_temp;
        assert_ge!(value, layer_temp - 1e-12);
        assert_le!(value, layer_temp + 100.0);
    }
}

#[test]
fn test_evaluation_is_bit_identical() {
    let axis: Vec<f64> = (0..20).map(|i| i as f64 * 0.2).collect();
    let a = evaluate(&axis, &axis, 0.37).unwrap();
    let b = evaluate(&axis, &axis, 0.37).unwrap();
    let bits_a: Vec<u64> = a.values().iter().map(|v| v.to_bits()).collect();
    let bits_b: Vec<u64> = b.values().iter().map(|v| v.to_bits()).collect();
    assert_eq!(bits_a, bits_b);
}

#[test]
fn test_non_positive_time_is_invalid() {
    let axis = [0.0, 1.0];
    assert!(matches!(evaluate(&axis, &axis, 0.0), Err(SimError::InvalidTime { t }) if t == 0.0));
    assert!(matches!(evaluate(&axis, &axis, -2.5), Err(SimError::InvalidTime { t }) if t == -2.5));
}

#[test]
fn test_zones_are_measured_from_grid_origin_not_epicenter() {
    // Two points at the same distance from the epicentre but different
    // distances from the origin pick up different baselines.
    let evaluator = FieldEvaluator::default();
    let epicenter = evaluator.impact.epicenter;
    let toward_origin = epicenter - DVec2::new(1.0, 0.0); // m ≈ 4.59, mantle
    let away_from_origin = epicenter + DVec2::new(1.0, 0.0); // m ≈ 12.3, space

    assert_eq!(evaluator.zone_at(toward_origin).layer_temp, 30.0);
    assert_eq!(evaluator.zone_at(away_from_origin).layer_temp, -2.7);

    let t = 1.0e12;
    let near = evaluator.temperature_at(toward_origin, t).unwrap();
    let far = evaluator.temperature_at(away_from_origin, t).unwrap();
    assert_abs_diff_eq!(near - far, 32.7, epsilon = 1e-5);
}

#[test]
fn test_zone_boundaries_on_grid() {
    // x²+y² exactly on a band edge takes the lower band
    let field = evaluate(&[1.0, 2.0], &[0.0], 1.0e12).unwrap();
    assert_abs_diff_eq!(field.get(0, 0), DEFAULT_ZONES.bands()[0].layer_temp, epsilon = 1e-6);
    assert_abs_diff_eq!(field.get(1, 0), DEFAULT_ZONES.bands()[1].layer_temp, epsilon = 1e-6);
}
