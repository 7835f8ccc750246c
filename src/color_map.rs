/// Heat map palette for impact temperatures
///
/// Piecewise-linear blend through evenly spaced colour stops, applied to
/// values clamped into a fixed `[vmin, vmax]` range.

use crate::constants::{COLOR_MAX, COLOR_MIN};
use crate::error::{Result, SimError};
use image::Rgb;

/// black, darkblue, blue, yellow, orange, red, darkred
pub const IMPACT_STOPS: [[u8; 3]; 7] = [
    [0, 0, 0],
    [0, 0, 139],
    [0, 0, 255],
    [255, 255, 0],
    [255, 165, 0],
    [255, 0, 0],
    [139, 0, 0],
];

#[derive(Debug, Clone)]
pub struct ColorMap {
    stops: Vec<[u8; 3]>,
    vmin: f64,
    vmax: f64,
}

impl ColorMap {
    pub fn new(stops: &[[u8; 3]], vmin: f64, vmax: f64) -> Result<Self> {
        if stops.len() < 2 {
            return Err(SimError::Config("colour map needs at least two stops".to_string()));
        }
        if !(vmax > vmin) || !vmin.is_finite() || !vmax.is_finite() {
            return Err(SimError::Config(format!(
                "colour range [{}, {}] is empty",
                vmin, vmax
            )));
        }
        Ok(Self {
            stops: stops.to_vec(),
            vmin,
            vmax,
        })
    }

    pub fn impact(vmin: f64, vmax: f64) -> Result<Self> {
        Self::new(&IMPACT_STOPS, vmin, vmax)
    }

    pub fn range(&self) -> (f64, f64) {
        (self.vmin, self.vmax)
    }

    /// Position of `value` in the range, clamped to 0.0-1.0. NaN maps to 0.0.
    pub fn normalize(&self, value: f64) -> f64 {
        let ratio = (value - self.vmin) / (self.vmax - self.vmin);
        if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) }
    }

    pub fn color(&self, value: f64) -> Rgb<u8> {
        self.color_at_ratio(self.normalize(value))
    }

    pub fn color_at_ratio(&self, ratio: f64) -> Rgb<u8> {
        let segments = (self.stops.len() - 1) as f64;
        let scaled = ratio.clamp(0.0, 1.0) * segments;
        let index = (scaled.floor() as usize).min(self.stops.len() - 2);
        let frac = scaled - index as f64;

        let from = self.stops[index];
        let to = self.stops[index + 1];
        let channel = |c: usize| {
            let value = from[c] as f64 + (to[c] as f64 - from[c] as f64) * frac;
            value.round().clamp(0.0, 255.0) as u8
        };
        Rgb([channel(0), channel(1), channel(2)])
    }
}

impl Default for ColorMap {
    fn default() -> Self {
        Self {
            stops: IMPACT_STOPS.to_vec(),
            vmin: COLOR_MIN,
            vmax: COLOR_MAX,
        }
    }
}
