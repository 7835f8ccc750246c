//! Frame loop and output strategies for the impact animation.
//!
//! The driver evaluates, renders and emits frames strictly in time order
//! through a single [`FrameSink`]. A failed run never leaves a partial
//! artifact behind.

use crate::error::{Result, SimError};
use crate::field::FieldEvaluator;
use crate::grid::{SpatialGrid, TimeSequence};
use crate::render::{FrameLayout, FrameRenderer};
use colored::Colorize;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, DynamicImage, Frame, ImageDecoder, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs::{self, File};
use std::io::{self, BufReader, Stdout, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Where frames go; chosen once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum OutputStrategy {
    /// Looping GIF written to `path`.
    Save { path: PathBuf },
    /// Frames shown in the terminal as they are produced.
    Live,
}

impl OutputStrategy {
    pub fn sink(&self, fps: u32, frames: usize) -> Box<dyn FrameSink> {
        match self {
            OutputStrategy::Save { path } => Box::new(GifSink::new(path, fps)),
            OutputStrategy::Live => {
                let mut sink = TerminalSink::stdout(fps);
                sink.set_total(frames);
                Box::new(sink)
            }
        }
    }
}

/// Receives rendered frames in order.
pub trait FrameSink {
    fn name(&self) -> &str;

    /// Called once before the first frame.
    fn begin(&mut self, _layout: &FrameLayout) -> Result<()> {
        Ok(())
    }

    fn push_frame(&mut self, index: usize, t: f64, frame: &RgbImage) -> Result<()>;

    /// Called once after the last frame.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called instead of `finish` when the run fails; drops partial output.
    fn abort(&mut self) {}
}

/// Encoder output staged in memory; the sink copies it to disk itself so
/// that every write, trailer included, is checked.
#[derive(Debug, Clone, Default)]
struct StagedBytes(Rc<RefCell<Vec<u8>>>);

impl Write for StagedBytes {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl StagedBytes {
    fn drain_into(&self, out: &mut File) -> io::Result<()> {
        let mut bytes = self.0.borrow_mut();
        if !bytes.is_empty() {
            out.write_all(&bytes)?;
            bytes.clear();
        }
        Ok(())
    }
}

/// Writes frames to a looping GIF at a fixed playback rate.
///
/// Frames go to `<path>.part`, which is renamed into place on `finish`
/// and removed on `abort`.
pub struct GifSink {
    path: PathBuf,
    part_path: PathBuf,
    fps: u32,
    staged: StagedBytes,
    encoder: Option<GifEncoder<StagedBytes>>,
    file: Option<File>,
    frames: usize,
}

impl GifSink {
    pub fn new(path: impl AsRef<Path>, fps: u32) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut part = path.as_os_str().to_owned();
        part.push(".part");
        Self {
            path,
            part_path: PathBuf::from(part),
            fps: fps.max(1),
            staged: StagedBytes::default(),
            encoder: None,
            file: None,
            frames: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn frame_delay(&self) -> Delay {
        Delay::from_numer_denom_ms(1000, self.fps)
    }

    fn flush_staged(&mut self) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SimError::Config("GIF sink used before begin".to_string()))?;
        self.staged
            .drain_into(file)
            .map_err(|e| SimError::output_io(&self.path, e))
    }
}

impl FrameSink for GifSink {
    fn name(&self) -> &str {
        "GifSink"
    }

    fn begin(&mut self, _layout: &FrameLayout) -> Result<()> {
        let file = File::create(&self.part_path).map_err(|e| SimError::output_io(&self.path, e))?;
        self.staged = StagedBytes::default();
        let mut encoder = GifEncoder::new_with_speed(self.staged.clone(), 10);
        encoder.set_repeat(Repeat::Infinite)?;
        self.encoder = Some(encoder);
        self.file = Some(file);
        self.frames = 0;
        Ok(())
    }

    fn push_frame(&mut self, _index: usize, _t: f64, frame: &RgbImage) -> Result<()> {
        let delay = self.frame_delay();
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| SimError::Config("GIF sink received a frame before begin".to_string()))?;
        let rgba = DynamicImage::ImageRgb8(frame.clone()).into_rgba8();
        encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
        self.frames += 1;
        self.flush_staged()
    }

    fn finish(&mut self) -> Result<()> {
        if self.frames == 0 {
            return Err(SimError::Config("refusing to save an animation with no frames".to_string()));
        }
        // dropping the encoder stages the GIF trailer
        drop(self.encoder.take());
        self.flush_staged()?;
        if let Some(file) = self.file.take() {
            file.sync_all().map_err(|e| SimError::output_io(&self.path, e))?;
        }
        fs::rename(&self.part_path, &self.path).map_err(|e| SimError::output_io(&self.path, e))?;
        info!(path = %self.path.display(), frames = self.frames, "animation saved");
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.encoder.take());
        drop(self.file.take());
        self.staged.0.borrow_mut().clear();
        if let Err(e) = fs::remove_file(&self.part_path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(path = %self.part_path.display(), error = %e, "could not remove partial animation");
            }
        }
    }
}

/// Live display: draws each frame in the terminal with truecolour half blocks.
pub struct TerminalSink<W: Write> {
    out: W,
    fps: u32,
    max_columns: u32,
    pace: bool,
    total: Option<usize>,
}

impl TerminalSink<Stdout> {
    pub fn stdout(fps: u32) -> Self {
        Self::new(std::io::stdout(), fps, 100, true)
    }
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W, fps: u32, max_columns: u32, pace: bool) -> Self {
        Self {
            out,
            fps: fps.max(1),
            max_columns: max_columns.max(1),
            pace,
            total: None,
        }
    }

    pub fn set_total(&mut self, total: usize) {
        self.total = Some(total);
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, index: usize, t: f64, frame: &RgbImage) -> std::io::Result<()> {
        let step = frame.width().div_ceil(self.max_columns).max(1);
        write!(self.out, "\x1b[H")?;
        match self.total {
            Some(total) => writeln!(self.out, "Comet impact t = {:.3} units (frame {}/{})", t, index + 1, total)?,
            None => writeln!(self.out, "Comet impact t = {:.3} units (frame {})", t, index + 1)?,
        }

        let mut y = 0;
        while y < frame.height() {
            let mut line = String::new();
            let mut x = 0;
            while x < frame.width() {
                let top = frame.get_pixel(x, y).0;
                let bottom = frame.get_pixel(x, (y + step).min(frame.height() - 1)).0;
                let cell = "▀"
                    .truecolor(top[0], top[1], top[2])
                    .on_truecolor(bottom[0], bottom[1], bottom[2]);
                line.push_str(&cell.to_string());
                x += step;
            }
            writeln!(self.out, "{}", line)?;
            y += 2 * step;
        }
        self.out.flush()
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn name(&self) -> &str {
        "TerminalSink"
    }

    fn begin(&mut self, _layout: &FrameLayout) -> Result<()> {
        write!(self.out, "\x1b[2J").map_err(|e| SimError::output_io("<terminal>", e))
    }

    fn push_frame(&mut self, index: usize, t: f64, frame: &RgbImage) -> Result<()> {
        self.write_frame(index, t, frame)
            .map_err(|e| SimError::output_io("<terminal>", e))?;
        if self.pace {
            thread::sleep(Duration::from_secs_f64(1.0 / self.fps as f64));
        }
        Ok(())
    }
}

/// Keeps every frame in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub frames: Vec<(f64, RgbImage)>,
}

impl FrameSink for MemorySink {
    fn name(&self) -> &str {
        "MemorySink"
    }

    fn begin(&mut self, _layout: &FrameLayout) -> Result<()> {
        self.frames.clear();
        Ok(())
    }

    fn push_frame(&mut self, _index: usize, t: f64, frame: &RgbImage) -> Result<()> {
        self.frames.push((t, frame.clone()));
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub first_time: f64,
    pub last_time: f64,
    pub min_temp: f64,
    pub max_temp: f64,
}

/// Evaluates the field at each time step and feeds rendered frames to a sink.
#[derive(Debug, Clone)]
pub struct AnimationDriver {
    evaluator: FieldEvaluator,
    grid: SpatialGrid,
    times: TimeSequence,
    renderer: FrameRenderer,
}

impl AnimationDriver {
    pub fn new(
        evaluator: FieldEvaluator,
        grid: SpatialGrid,
        times: TimeSequence,
        renderer: FrameRenderer,
    ) -> Result<Self> {
        let (layout_nx, layout_ny) = renderer.layout().grid_shape();
        let (nx, ny) = grid.shape();
        if (nx as u64, ny as u64) != (layout_nx as u64, layout_ny as u64) {
            return Err(SimError::malformed_grid(format!(
                "grid {}x{} does not match frame layout {}x{}",
                nx, ny, layout_nx, layout_ny
            )));
        }
        Ok(Self {
            evaluator,
            grid,
            times,
            renderer,
        })
    }

    pub fn times(&self) -> &TimeSequence {
        &self.times
    }

    pub fn layout(&self) -> &FrameLayout {
        self.renderer.layout()
    }

    pub fn run(&self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        let (width, height) = self.layout().dimensions();
        info!(
            sink = sink.name(),
            frames = self.times.len(),
            width,
            height,
            "starting impact animation"
        );

        match self.drive(sink) {
            Ok(summary) => {
                info!(
                    frames = summary.frames,
                    min = summary.min_temp,
                    max = summary.max_temp,
                    "impact animation complete"
                );
                Ok(summary)
            }
            Err(e) => {
                sink.abort();
                Err(e)
            }
        }
    }

    pub fn run_with_strategy(&self, strategy: &OutputStrategy, fps: u32) -> Result<RunSummary> {
        let mut sink = strategy.sink(fps, self.times.len());
        self.run(sink.as_mut())
    }

    fn drive(&self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        sink.begin(self.layout())?;
        let summary = self.emit_frames(sink)?;
        sink.finish()?;
        Ok(summary)
    }

    fn emit_frames(&self, sink: &mut dyn FrameSink) -> Result<RunSummary> {
        let (width, height) = self.layout().dimensions();
        let times = self.times.times();
        let mut min_temp = f64::INFINITY;
        let mut max_temp = f64::NEG_INFINITY;

        for (index, &t) in times.iter().enumerate() {
            let field = self.evaluator.evaluate_grid(&self.grid, t)?;
            let stats = field.stats();
            debug!(frame = index, t, min = stats.min, max = stats.max, mean = stats.mean, "frame evaluated");
            min_temp = min_temp.min(stats.min);
            max_temp = max_temp.max(stats.max);

            let frame = self.renderer.render(&field, t)?;
            sink.push_frame(index, t, &frame)?;
        }

        Ok(RunSummary {
            frames: times.len(),
            width,
            height,
            first_time: times.first().copied().unwrap_or(f64::NAN),
            last_time: times.last().copied().unwrap_or(f64::NAN),
            min_temp,
            max_temp,
        })
    }
}

/// A GIF read back from disk.
#[derive(Debug, Clone)]
pub struct LoadedAnimation {
    pub width: u32,
    pub height: u32,
    pub frames: Vec<RgbaImage>,
    pub delays_ms: Vec<(u32, u32)>,
}

impl LoadedAnimation {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

pub fn load_animation(path: impl AsRef<Path>) -> Result<LoadedAnimation> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| SimError::output_io(path, e))?;
    let decoder = GifDecoder::new(BufReader::new(file))?;
    let (width, height) = decoder.dimensions();
    let frames = decoder.into_frames().collect_frames()?;

    let delays_ms = frames.iter().map(|f| f.delay().numer_denom_ms()).collect();
    let frames = frames.into_iter().map(|f| f.into_buffer()).collect();
    Ok(LoadedAnimation {
        width,
        height,
        frames,
        delays_ms,
    })
}
