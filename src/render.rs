/// Frame rendering for the impact animation
///
/// Lays out one frame as a title band carrying the simulation time, the
/// heat map itself (y increasing upward) and a vertical colour bar.

use crate::color_map::ColorMap;
use crate::error::{Result, SimError};
use crate::field::TemperatureField;
use image::{ImageBuffer, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

const MARGIN: u32 = 4;
const TITLE_HEIGHT: u32 = 16;
const BAR_GAP: u32 = 6;
const BAR_WIDTH: u32 = 12;
const TICK_LENGTH: u32 = 3;
const TICK_LABEL_GAP: u32 = 1;
const TICK_LABEL_CHARS: u32 = 4;
const TICK_INTERVAL: f64 = 4.0;
const GLYPH_SCALE: u32 = 2;
const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

// GIF screen dimensions are 16-bit
const MAX_FRAME_DIMENSION: u32 = u16::MAX as u32;

/// Pixel geometry of a frame for a given grid shape.
///
/// Dimensions are checked once on construction and never exceed the GIF limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLayout {
    cell_px: u32,
    nx: u32,
    ny: u32,
    width: u32,
    height: u32,
}

impl FrameLayout {
    pub fn new(cell_px: u32, shape: (usize, usize)) -> Result<Self> {
        if cell_px == 0 {
            return Err(SimError::Config("cell pixel size must be at least 1".to_string()));
        }
        if shape.0 == 0 || shape.1 == 0 {
            return Err(SimError::malformed_grid("cannot lay out an empty grid"));
        }
        let nx = u32::try_from(shape.0).map_err(|_| SimError::malformed_grid("grid too wide to render"))?;
        let ny = u32::try_from(shape.1).map_err(|_| SimError::malformed_grid("grid too tall to render"))?;

        let too_large = || {
            SimError::Config(format!(
                "a {}x{} grid at {} px per cell exceeds the {} px frame limit",
                nx, ny, cell_px, MAX_FRAME_DIMENSION
            ))
        };
        let width = nx
            .checked_mul(cell_px)
            .and_then(|w| w.checked_add(MARGIN + BAR_GAP + BAR_WIDTH + TICK_LENGTH + TICK_LABEL_GAP))
            .and_then(|w| w.checked_add(4 * TICK_LABEL_CHARS + MARGIN))
            .filter(|&w| w <= MAX_FRAME_DIMENSION)
            .ok_or_else(too_large)?;
        let height = ny
            .checked_mul(cell_px)
            .and_then(|h| h.checked_add(TITLE_HEIGHT + MARGIN))
            .filter(|&h| h <= MAX_FRAME_DIMENSION)
            .ok_or_else(too_large)?;

        Ok(Self {
            cell_px,
            nx,
            ny,
            width,
            height,
        })
    }

    pub fn cell_px(&self) -> u32 {
        self.cell_px
    }

    pub fn grid_shape(&self) -> (u32, u32) {
        (self.nx, self.ny)
    }

    pub fn map_width(&self) -> u32 {
        self.nx * self.cell_px
    }

    pub fn map_height(&self) -> u32 {
        self.ny * self.cell_px
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bar_left(&self) -> u32 {
        MARGIN + self.map_width() + BAR_GAP
    }
}

/// Draws temperature fields into frame images.
#[derive(Debug, Clone)]
pub struct FrameRenderer {
    layout: FrameLayout,
    color_map: ColorMap,
}

impl FrameRenderer {
    pub fn new(layout: FrameLayout, color_map: ColorMap) -> Self {
        Self { layout, color_map }
    }

    pub fn layout(&self) -> &FrameLayout {
        &self.layout
    }

    pub fn render(&self, field: &TemperatureField, t: f64) -> Result<RgbImage> {
        let (nx, ny) = field.shape();
        if (nx as u64, ny as u64) != (self.layout.nx as u64, self.layout.ny as u64) {
            return Err(SimError::malformed_grid(format!(
                "field shape {}x{} does not match frame layout {}x{}",
                nx, ny, self.layout.nx, self.layout.ny
            )));
        }

        let mut image: RgbImage = ImageBuffer::from_pixel(self.layout.width(), self.layout.height(), BACKGROUND);
        self.draw_heat_map(&mut image, field);
        self.draw_color_bar(&mut image);
        self.draw_color_bar_ticks(&mut image);
        draw_label(
            &mut image,
            MARGIN,
            (TITLE_HEIGHT - 5 * GLYPH_SCALE) / 2,
            GLYPH_SCALE,
            &format!("t={:.3}", t),
        );
        Ok(image)
    }

    fn draw_heat_map(&self, image: &mut RgbImage, field: &TemperatureField) {
        let cell = self.layout.cell_px;
        for i in 0..self.layout.nx {
            for j in 0..self.layout.ny {
                let color = self.color_map.color(field.get(i as usize, j as usize));
                let left = MARGIN + i * cell;
                // flip so that y grows upward
                let top = TITLE_HEIGHT + (self.layout.ny - 1 - j) * cell;
                fill_rect(image, left, top, cell, cell, color);
            }
        }
    }

    fn draw_color_bar(&self, image: &mut RgbImage) {
        let left = self.layout.bar_left();
        let height = self.layout.map_height();
        for row in 0..height {
            let ratio = if height > 1 {
                1.0 - row as f64 / (height - 1) as f64
            } else {
                1.0
            };
            let color = self.color_map.color_at_ratio(ratio);
            fill_rect(image, left, TITLE_HEIGHT + row, BAR_WIDTH, 1, color);
        }
    }

    /// Row offsets inside the bar and values of the ticks, one every 4 units.
    pub fn tick_rows(&self) -> Vec<(u32, f64)> {
        let (vmin, vmax) = self.color_map.range();
        let span = (self.layout.map_height() - 1) as f64;
        let first = (vmin / TICK_INTERVAL).ceil() as i64;
        let last = (vmax / TICK_INTERVAL).floor() as i64;
        (first..=last)
            .map(|k| {
                let value = k as f64 * TICK_INTERVAL;
                let row = ((1.0 - self.color_map.normalize(value)) * span).round() as u32;
                (row, value)
            })
            .collect()
    }

    fn draw_color_bar_ticks(&self, image: &mut RgbImage) {
        let tick_left = self.layout.bar_left() + BAR_WIDTH;
        let label_left = tick_left + TICK_LENGTH + TICK_LABEL_GAP;
        let (vmin, vmax) = self.color_map.range();
        let spacing = self.layout.map_height() as f64 * TICK_INTERVAL / (vmax - vmin);
        // labels need 5 px rows plus a gap
        let labelled = spacing >= 7.0;

        for (row, value) in self.tick_rows() {
            let y = TITLE_HEIGHT + row;
            fill_rect(image, tick_left, y, TICK_LENGTH, 1, INK);
            if labelled {
                draw_label(image, label_left, y.saturating_sub(2), 1, &format!("{:.0}", value + 0.0));
            }
        }
    }
}

fn fill_rect(image: &mut RgbImage, left: u32, top: u32, width: u32, height: u32, color: Rgb<u8>) {
    if width == 0 || height == 0 {
        return;
    }
    draw_filled_rect_mut(image, Rect::at(left as i32, top as i32).of_size(width, height), color);
}

/// 3x5 bitmap glyph, one row per entry, high bit on the left.
fn glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        't' => [0b010, 0b111, 0b010, 0b010, 0b011],
        'e' => [0b111, 0b101, 0b111, 0b100, 0b111],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        _ => [0; 5],
    }
}

/// Draw `text` with the built-in glyphs; anything past the frame edge is clipped.
fn draw_label(image: &mut RgbImage, left: u32, top: u32, scale: u32, text: &str) {
    let advance = 4 * scale;
    for (k, c) in text.chars().enumerate() {
        let origin_x = left + k as u32 * advance;
        for (row, bits) in glyph(c).iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) != 0 {
                    fill_rect(
                        image,
                        origin_x + col * scale,
                        top + row as u32 * scale,
                        scale,
                        scale,
                        INK,
                    );
                }
            }
        }
    }
}
