//! Closed-form temperature field after a comet impact.
//!
//! Each grid point takes the baseline temperature and diffusivity of its
//! zone, then adds the 1D error-function solution for a band-limited
//! source of half-width `radius`, applied along the distance from the
//! epicentre:
//!
//! ```text
//! T = layer_temp + ½ · A(t) · ( erf((R − r)/√(4at)) − erf((−R − r)/√(4at)) )
//! A(t) = u0 ^ exp(−t/τ)
//! ```
//!
//! Zones are picked by `x² + y²` measured from the grid origin, while `r`
//! is measured from the epicentre. The two are kept as separate values.

use crate::constants::{AMPLITUDE_DECAY_TIME, EPICENTER_X, EPICENTER_Y, IMPACT_RADIUS, PEAK_AMPLITUDE};
use crate::error::{Result, SimError};
use crate::grid::SpatialGrid;
use crate::zone::{ZoneBand, ZoneSpec};
use glam::DVec2;
use libm::erf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParameters {
    pub epicenter: DVec2,
    pub radius: f64,
    pub peak_amplitude: f64,
    pub decay_time: f64,
}

impl Default for ImpactParameters {
    fn default() -> Self {
        Self {
            epicenter: DVec2::new(EPICENTER_X, EPICENTER_Y),
            radius: IMPACT_RADIUS,
            peak_amplitude: PEAK_AMPLITUDE,
            decay_time: AMPLITUDE_DECAY_TIME,
        }
    }
}

impl ImpactParameters {
    /// Decayed source amplitude `u0 ^ exp(-t/τ)`; tends to 1, not 0.
    pub fn amplitude_at(&self, t: f64) -> f64 {
        self.peak_amplitude.powf((-t / self.decay_time).exp())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epicenter.is_finite() {
            return Err(SimError::Config("impact epicenter must be finite".to_string()));
        }
        if !(self.radius > 0.0) || !self.radius.is_finite() {
            return Err(SimError::Config(format!("impact radius {} must be positive", self.radius)));
        }
        if !(self.decay_time > 0.0) {
            return Err(SimError::Config(format!(
                "amplitude decay time {} must be positive",
                self.decay_time
            )));
        }
        if !self.peak_amplitude.is_finite() {
            return Err(SimError::Config("peak amplitude must be finite".to_string()));
        }
        Ok(())
    }
}

/// Distance used by the diffusion term.
pub fn epicenter_distance(point: DVec2, epicenter: DVec2) -> f64 {
    point.distance(epicenter)
}

/// Squared magnitude used for zone classification, measured from the grid origin.
pub fn zoning_magnitude(point: DVec2) -> f64 {
    point.length_squared()
}

/// `erf((R − r)/s) − erf((−R − r)/s)` with `s = √(4at)`.
///
/// A non-finite diffusion length spreads the source to nothing and
/// contributes exactly zero.
pub fn diffusion_profile(distance: f64, radius: f64, diffusivity: f64, t: f64) -> f64 {
    let spread = (4.0 * diffusivity * t).sqrt();
    if !spread.is_finite() {
        return 0.0;
    }
    if spread == 0.0 {
        // sharp initial condition
        return if distance < radius {
            2.0
        } else if distance == radius {
            1.0
        } else {
            0.0
        };
    }
    erf((radius - distance) / spread) - erf((-radius - distance) / spread)
}

fn check_time(t: f64) -> Result<()> {
    if t > 0.0 {
        Ok(())
    } else {
        Err(SimError::InvalidTime { t })
    }
}

/// Temperature snapshot with shape `(nx, ny)`; `get(i, j)` is the value at `(x[i], y[j])`.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureField {
    nx: usize,
    ny: usize,
    values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl TemperatureField {
    pub fn shape(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.ny + j]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Row `i`, i.e. every `y` sample at `x[i]`.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.ny..(i + 1) * self.ny]
    }

    pub fn min(&self) -> f64 {
        self.values.iter().fold(f64::INFINITY, |a, &b| a.min(b))
    }

    pub fn max(&self) -> f64 {
        self.values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    }

    pub fn mean(&self) -> f64 {
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    pub fn stats(&self) -> FieldStats {
        FieldStats {
            min: self.min(),
            max: self.max(),
            mean: self.mean(),
        }
    }
}

/// Stateless evaluator bound to one set of impact parameters and zones.
#[derive(Debug, Clone, Default)]
pub struct FieldEvaluator {
    pub impact: ImpactParameters,
    pub zones: ZoneSpec,
}

impl FieldEvaluator {
    pub fn new(impact: ImpactParameters, zones: ZoneSpec) -> Result<Self> {
        impact.validate()?;
        zones.validate()?;
        Ok(Self { impact, zones })
    }

    pub fn zone_at(&self, point: DVec2) -> &ZoneBand {
        self.zones.classify(zoning_magnitude(point))
    }

    /// Temperature at a single point.
    pub fn temperature_at(&self, point: DVec2, t: f64) -> Result<f64> {
        check_time(t)?;
        Ok(self.point_temperature(point, self.impact.amplitude_at(t), t))
    }

    fn point_temperature(&self, point: DVec2, amplitude: f64, t: f64) -> f64 {
        let distance = epicenter_distance(point, self.impact.epicenter);
        let zone = self.zone_at(point);
        let profile = diffusion_profile(distance, self.impact.radius, zone.diffusivity, t);
        zone.layer_temp + 0.5 * amplitude * profile
    }

    /// Evaluate the field over the lattice spanned by `x` and `y` at time `t > 0`.
    pub fn evaluate(&self, x: &[f64], y: &[f64], t: f64) -> Result<TemperatureField> {
        check_time(t)?;
        if x.is_empty() || y.is_empty() {
            return Err(SimError::malformed_grid(format!(
                "cannot evaluate a {}x{} grid",
                x.len(),
                y.len()
            )));
        }

        let amplitude = self.impact.amplitude_at(t);
        let mut values = Vec::with_capacity(x.len() * y.len());
        for &xi in x {
            for &yj in y {
                values.push(self.point_temperature(DVec2::new(xi, yj), amplitude, t));
            }
        }

        Ok(TemperatureField {
            nx: x.len(),
            ny: y.len(),
            values,
        })
    }

    pub fn evaluate_grid(&self, grid: &SpatialGrid, t: f64) -> Result<TemperatureField> {
        self.evaluate(grid.x(), grid.y(), t)
    }
}

/// Evaluate with the default impact parameters and zone table.
pub fn evaluate(x: &[f64], y: &[f64], t: f64) -> Result<TemperatureField> {
    FieldEvaluator::default().evaluate(x, y, t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_gt, assert_le};

    #[test]
    fn test_distance_and_zoning_are_separate() {
        let point = DVec2::new(1.93, 1.93);
        let epicenter = ImpactParameters::default().epicenter;
        assert_eq!(epicenter_distance(point, epicenter), 0.0);
        assert_abs_diff_eq!(zoning_magnitude(point), 2.0 * 1.93 * 1.93, epsilon = 1e-12);
    }

    #[test]
    fn test_amplitude_decays_toward_one() {
        let impact = ImpactParameters::default();
        assert_abs_diff_eq!(impact.amplitude_at(1e-12), 100.0, epsilon = 1e-6);
        assert_abs_diff_eq!(impact.amplitude_at(10.0), 100f64.powf((-1.0f64).exp()), epsilon = 1e-12);
        assert_eq!(impact.amplitude_at(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_profile_vanishes_for_infinite_spread() {
        assert_eq!(diffusion_profile(0.5, 0.3, f64::INFINITY, 1.0), 0.0);
        assert_eq!(diffusion_profile(0.5, 0.3, 1.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_profile_bounded_between_zero_and_two() {
        for distance in [0.0, 0.1, 0.3, 1.0, 5.0] {
            for t in [1e-4, 0.1, 1.0, 100.0] {
                let value = diffusion_profile(distance, 0.3, 1.0, t);
                assert_ge!(value, 0.0);
                assert_le!(value, 2.0);
            }
        }
    }

    #[test]
    fn test_zero_and_negative_time_rejected() {
        let x = [0.0, 1.0];
        for t in [0.0, -0.0, -1.0, f64::NAN] {
            let result = evaluate(&x, &x, t);
            assert!(matches!(result, Err(SimError::InvalidTime { .. })), "t = {}", t);
        }
    }

    #[test]
    fn test_empty_axes_rejected() {
        let result = evaluate(&[], &[1.0], 1.0);
        assert!(matches!(result, Err(SimError::MalformedGrid { .. })));
        let result = evaluate(&[1.0], &[], 1.0);
        assert!(matches!(result, Err(SimError::MalformedGrid { .. })));
    }

    #[test]
    fn test_shape_follows_axes() {
        let field = evaluate(&[0.0, 1.0, 2.0], &[0.5, 1.5], 1.0).unwrap();
        assert_eq!(field.shape(), (3, 2));
        assert_eq!(field.values().len(), 6);
        assert_eq!(field.row(2).len(), 2);
    }

    #[test]
    fn test_epicenter_zone_uses_origin_distance() {
        // the epicentre sits at x²+y² ≈ 7.45, the crust band, even though r = 0 there
        let evaluator = FieldEvaluator::default();
        let zone = evaluator.zone_at(evaluator.impact.epicenter);
        assert_eq!(zone.name, "crust");
        assert_eq!(zone.diffusivity, 0.3);
    }

    #[test]
    fn test_hot_spot_above_baseline() {
        let evaluator = FieldEvaluator::default();
        let epicenter = evaluator.impact.epicenter;
        let t = 0.01;
        let hot = evaluator.temperature_at(epicenter, t).unwrap();
        assert_gt!(hot, 20.0 + 90.0);
        let far = evaluator.temperature_at(DVec2::new(0.0, 0.0), t).unwrap();
        assert_abs_diff_eq!(far, 55.0, epsilon = 1e-9);
    }

    #[test]
    fn test_infinite_time_is_exactly_baseline() {
        let evaluator = FieldEvaluator::default();
        for point in [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.5, 0.0),
            DVec2::new(2.2, 0.0),
            DVec2::new(1.93, 1.93),
            DVec2::new(2.0, 1.95),
            DVec2::new(4.0, 4.0),
        ] {
            let expected = evaluator.zone_at(point).layer_temp;
            assert_eq!(evaluator.temperature_at(point, f64::INFINITY).unwrap(), expected);
        }
    }

    #[test]
    fn test_custom_zones_flow_through() {
        let zones = ZoneSpec::new(vec![ZoneBand::new("all", None, 7.0, 1.0)]).unwrap();
        let evaluator = FieldEvaluator::new(ImpactParameters::default(), zones).unwrap();
        let value = evaluator.temperature_at(DVec2::new(-50.0, -50.0), 1.0).unwrap();
        assert_abs_diff_eq!(value, 7.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_impact_rejected() {
        let impact = ImpactParameters {
            radius: 0.0,
            ..ImpactParameters::default()
        };
        assert!(FieldEvaluator::new(impact, ZoneSpec::default()).is_err());
    }
}
