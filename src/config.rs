/// Run configuration for the comet impact animation
///
/// Every field defaults to the model constants, so a JSON file only needs
/// to name what it overrides.

use crate::animation::{AnimationDriver, OutputStrategy};
use crate::color_map::ColorMap;
use crate::constants::*;
use crate::error::{Result, SimError};
use crate::field::{FieldEvaluator, ImpactParameters};
use crate::grid::{linspace, SpatialGrid, TimeSequence};
use crate::render::{FrameLayout, FrameRenderer};
use crate::zone::ZoneSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_points: usize,
    pub y_points: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            x_min: GRID_MIN,
            x_max: GRID_MAX,
            y_min: GRID_MIN,
            y_max: GRID_MAX,
            x_points: GRID_POINTS,
            y_points: GRID_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    pub start: f64,
    pub step: f64,
    pub frames: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start: TIME_START,
            step: TIME_STEP,
            frames: FRAME_COUNT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub cell_px: u32,
    pub fps: u32,
    pub vmin: f64,
    pub vmax: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cell_px: CELL_PIXELS,
            fps: FRAMES_PER_SECOND,
            vmin: COLOR_MIN,
            vmax: COLOR_MAX,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub impact: ImpactParameters,
    pub grid: GridConfig,
    pub time: TimeConfig,
    pub render: RenderConfig,
    pub zones: ZoneSpec,
    pub output: OutputStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            impact: ImpactParameters::default(),
            grid: GridConfig::default(),
            time: TimeConfig::default(),
            render: RenderConfig::default(),
            zones: ZoneSpec::default(),
            output: OutputStrategy::Save {
                path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            },
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| SimError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| SimError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| SimError::Config(format!("failed to write config: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.impact.validate()?;
        self.zones.validate()?;
        self.build_grid()?;
        self.build_times()?;
        ColorMap::impact(self.render.vmin, self.render.vmax)?;
        if self.render.fps == 0 {
            return Err(SimError::Config("playback rate must be at least 1 fps".to_string()));
        }
        FrameLayout::new(self.render.cell_px, (self.grid.x_points, self.grid.y_points))?;
        Ok(())
    }

    pub fn build_grid(&self) -> Result<SpatialGrid> {
        let g = &self.grid;
        SpatialGrid::from_axes(
            linspace(g.x_min, g.x_max, g.x_points),
            linspace(g.y_min, g.y_max, g.y_points),
        )
    }

    pub fn build_times(&self) -> Result<TimeSequence> {
        TimeSequence::arange(self.time.start, self.time.step, self.time.frames)
    }

    pub fn build_evaluator(&self) -> Result<FieldEvaluator> {
        FieldEvaluator::new(self.impact, self.zones.clone())
    }

    pub fn build_renderer(&self) -> Result<FrameRenderer> {
        let layout = FrameLayout::new(self.render.cell_px, (self.grid.x_points, self.grid.y_points))?;
        let color_map = ColorMap::impact(self.render.vmin, self.render.vmax)?;
        Ok(FrameRenderer::new(layout, color_map))
    }

    pub fn build_driver(&self) -> Result<AnimationDriver> {
        AnimationDriver::new(
            self.build_evaluator()?,
            self.build_grid()?,
            self.build_times()?,
            self.build_renderer()?,
        )
    }
}
