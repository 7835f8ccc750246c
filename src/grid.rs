//! Sampling lattice and time steps for the impact animation.

use crate::error::{Result, SimError};

/// Rectangular lattice defined by two increasing axes.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialGrid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl SpatialGrid {
    pub fn from_axes(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        check_axis("x", &x)?;
        check_axis("y", &y)?;
        Ok(Self { x, y })
    }

    /// Square lattice over `[min, max]` on both axes with `points` samples each.
    pub fn square(min: f64, max: f64, points: usize) -> Result<Self> {
        let axis = linspace(min, max, points);
        Self::from_axes(axis.clone(), axis)
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.x.len(), self.y.len())
    }
}

/// Evenly spaced samples over `[start, stop]`, endpoints included.
pub fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (count - 1) as f64;
            (0..count)
                .map(|i| if i == count - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

fn check_axis(name: &str, axis: &[f64]) -> Result<()> {
    if axis.is_empty() {
        return Err(SimError::malformed_grid(format!("{} axis is empty", name)));
    }
    if let Some(bad) = axis.iter().find(|v| !v.is_finite()) {
        return Err(SimError::malformed_grid(format!(
            "{} axis holds non-finite value {}",
            name, bad
        )));
    }
    if axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(SimError::malformed_grid(format!(
            "{} axis is not strictly increasing",
            name
        )));
    }
    Ok(())
}

/// Strictly increasing, strictly positive simulation times.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSequence {
    times: Vec<f64>,
}

impl TimeSequence {
    pub fn from_values(times: Vec<f64>) -> Result<Self> {
        let Some(&first) = times.first() else {
            return Err(SimError::Config("time sequence is empty".to_string()));
        };
        // checked up front so a run never renders a frame before failing
        if !(first > 0.0) {
            return Err(SimError::InvalidTime { t: first });
        }
        if let Some(w) = times.windows(2).find(|w| !(w[1] > w[0])) {
            return Err(SimError::Config(format!(
                "time sequence is not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        Ok(Self { times })
    }

    /// `count` times starting at `start`, spaced by `step`.
    pub fn arange(start: f64, step: f64, count: usize) -> Result<Self> {
        if !(step > 0.0) {
            return Err(SimError::Config(format!("time step {} must be positive", step)));
        }
        Self::from_values((0..count).map(|i| start + step * i as f64).collect())
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
