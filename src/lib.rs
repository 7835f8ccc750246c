pub mod constants;
pub mod error;
pub mod zone;
pub mod grid;
pub mod field;
pub mod color_map;
pub mod render;
pub mod animation;
pub mod config;

pub use error::{Result, SimError};
pub use field::{evaluate, FieldEvaluator, ImpactParameters, TemperatureField};
