//! Errors raised while evaluating or rendering the impact field.
//!
//! Every variant is fatal to a run; nothing is retried or downgraded.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("invalid simulation time {t}: time must be strictly positive")]
    InvalidTime { t: f64 },

    #[error("malformed grid: {reason}")]
    MalformedGrid { reason: String },

    #[error("invalid zone table: {reason}")]
    InvalidZones { reason: String },

    #[error("cannot write {}: {source}", .path.display())]
    OutputIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl SimError {
    pub fn malformed_grid(reason: impl Into<String>) -> Self {
        SimError::MalformedGrid { reason: reason.into() }
    }

    pub fn invalid_zones(reason: impl Into<String>) -> Self {
        SimError::InvalidZones { reason: reason.into() }
    }

    pub fn output_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SimError::OutputIo { path: path.into(), source }
    }
}
