// Startup constants of the comet impact model.
// Length unit is 10^6 m, temperature unit is 10^2 °C.

pub const EPICENTER_X: f64 = 1.93;
pub const EPICENTER_Y: f64 = 1.93;
pub const IMPACT_RADIUS: f64 = 0.3; // 3*10^2 km, twice the Chicxulub crater
pub const PEAK_AMPLITUDE: f64 = 100.0; // temperature at the epicentre on impact
pub const AMPLITUDE_DECAY_TIME: f64 = 10.0;

pub const MAX_ITERATIONS: usize = 50;
pub const RESOLUTION: usize = 1; // integer scaling factor for the grid axes
pub const GRID_POINTS: usize = MAX_ITERATIONS * RESOLUTION;
pub const GRID_MIN: f64 = 0.0;
pub const GRID_MAX: f64 = 4.0;

pub const TIME_STEP: f64 = 0.001;
// the source sequence starts at t = 0, which the evaluator rejects
pub const TIME_START: f64 = TIME_STEP;
pub const FRAME_COUNT: usize = MAX_ITERATIONS * 10;
pub const FRAMES_PER_SECOND: u32 = 10;

pub const COLOR_MIN: f64 = -2.7;
pub const COLOR_MAX: f64 = 100.0;
pub const CELL_PIXELS: u32 = 8;

pub const DEFAULT_OUTPUT_FILE: &str = "comet_simulation.gif";

// Zone table: (name, upper bound on x²+y², layer temperature, diffusivity)
pub const ZONE_TABLE: &[(&str, Option<f64>, f64, f64)] = &[
    ("inner core", Some(1.0), 55.0, 1.0),    // hot iron diffuses slower than cold iron
    ("outer core", Some(4.0), 40.0, 2.0),
    ("mantle", Some(6.5), 30.0, 3.0),
    ("crust", Some(7.5), 20.0, 0.3),         // stone
    ("atmosphere", Some(8.0), 0.0, 2.0),
    ("space", None, -2.7, 10000.0),          // "infinite" diffusivity
];
