use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use rusttype::Font;

use crate::config::{
    Background, ImageNumeral, ImageTick, NumeralStyle, TickStyle, VectorNumeral, VectorTick,
    WatchDial,
};
use crate::error::{DialError, DialResult};
use crate::raster::{
    composite, crop_circle, draw_thick_line, fill_circle, open_image, resize,
    rotate_and_composite, save_png, transparent_canvas,
};
use crate::text::{draw_text, fit_scale, load_font, text_bounds};

/// First screen-space angle visited; registered angle 0 is drawn here (12 o'clock).
pub const FIRST_SCREEN_ANGLE: i32 = -90;
/// Offset from screen-space angle to registered angle.
pub const REGISTERED_ANGLE_OFFSET: i32 = 90;
/// Vector numerals are lifted by `height / NUMERAL_VERTICAL_DIVISOR` rather than
/// half their height, which sits them slightly above the true center.
pub const NUMERAL_VERTICAL_DIVISOR: f64 = 1.5;

// ============================================================================
// GEOMETRY
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct Frame {
    size: u32,
    radius: f64,
    center: (f64, f64),
}

impl Frame {
    fn new(size: u32) -> Self {
        let radius = size as f64 / 2.0;
        Self {
            size,
            radius,
            center: (radius, radius),
        }
    }

    /// Point `distance` pixels from the center along `angle`, offsets truncated.
    fn polar(&self, distance: f64, angle: Angle) -> (f64, f64) {
        (
            self.center.0 + (distance * angle.cos).trunc(),
            self.center.1 + (distance * angle.sin).trunc(),
        )
    }

    /// Center as a fraction of the canvas.
    fn center_fraction(&self) -> (f64, f64) {
        (
            self.center.0 / self.size as f64,
            self.center.1 / self.size as f64,
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Angle {
    degrees: i32,
    cos: f64,
    sin: f64,
}

impl Angle {
    fn new(degrees: i32) -> Self {
        let (sin, cos) = (degrees as f64).to_radians().sin_cos();
        Self { degrees, cos, sin }
    }
}

// ============================================================================
// SOURCE CACHE
// ============================================================================

/// Images and fonts decoded during one render, keyed by path.
#[derive(Default)]
struct Sources {
    images: HashMap<PathBuf, RgbaImage>,
    fonts: HashMap<PathBuf, Font<'static>>,
}

impl Sources {
    fn image(&mut self, path: &Path) -> DialResult<&RgbaImage> {
        if !self.images.contains_key(path) {
            let image = open_image(path)?;
            self.images.insert(path.to_path_buf(), image);
        }
        Ok(&self.images[path])
    }

    fn font(&mut self, path: &Path) -> DialResult<&Font<'static>> {
        if !self.fonts.contains_key(path) {
            let font = load_font(path)?;
            self.fonts.insert(path.to_path_buf(), font);
        }
        Ok(&self.fonts[path])
    }
}

// ============================================================================
// RENDERER
// ============================================================================

impl WatchDial {
    /// Renders a `size`×`size` dial. When `destination` is given the result is
    /// also written there as PNG.
    #[tracing::instrument(skip(self), fields(ticks = self.ticks().len(), numerals = self.numerals().len()))]
    pub fn render(&self, size: u32, destination: Option<&Path>) -> DialResult<RgbaImage> {
        if size == 0 {
            return Err(DialError::InvalidSize);
        }
        let frame = Frame::new(size);
        let mut sources = Sources::default();

        let mut disk_layer = self.disk_layer(&frame)?;
        let mut tick_layer = transparent_canvas(size, size);
        let mut numeral_layer = transparent_canvas(size, size);

        for screen_angle in FIRST_SCREEN_ANGLE..FIRST_SCREEN_ANGLE + 360 {
            let registered = screen_angle + REGISTERED_ANGLE_OFFSET;
            let angle = Angle::new(screen_angle);
            if let Some(tick) = self.ticks().get(&registered) {
                match tick {
                    TickStyle::Vector(tick) => draw_vector_tick(&mut tick_layer, &frame, angle, tick),
                    TickStyle::Image(tick) => {
                        draw_image_tick(&mut tick_layer, &frame, angle, tick, &mut sources)?
                    }
                }
            }
            if let Some(numeral) = self.numerals().get(&registered) {
                match numeral {
                    NumeralStyle::Vector(numeral) => {
                        draw_vector_numeral(&mut numeral_layer, &frame, angle, numeral, &mut sources)?
                    }
                    NumeralStyle::Image(numeral) => {
                        draw_image_numeral(&mut numeral_layer, &frame, angle, numeral, &mut sources)?
                    }
                }
            }
        }

        composite(&mut disk_layer, &tick_layer, (0.5, 0.5));
        composite(&mut disk_layer, &numeral_layer, (0.5, 0.5));
        let image = disk_layer;

        if let Some(path) = destination {
            save_png(&image, path)?;
            tracing::info!(path = %path.display(), size, "saved dial");
        }
        Ok(image)
    }

    fn disk_layer(&self, frame: &Frame) -> DialResult<RgbaImage> {
        let mut layer = transparent_canvas(frame.size, frame.size);
        match self.background() {
            Some(Background::Solid(color)) => {
                fill_circle(&mut layer, frame.center, frame.radius, *color);
            }
            Some(Background::Image(bg)) => {
                let disk = crop_circle(&bg.path, bg.center, bg.radius)?;
                let disk = resize(&disk, frame.size, frame.size);
                composite(&mut layer, &disk, (0.5, 0.5));
            }
            None => tracing::warn!("no background configured, disk layer left transparent"),
        }
        tracing::debug!("disk layer ready");
        Ok(layer)
    }
}

// ============================================================================
// PER-ANGLE DRAWING
// ============================================================================

fn draw_vector_tick(layer: &mut RgbaImage, frame: &Frame, angle: Angle, tick: &VectorTick) {
    let start = frame.polar(frame.radius * (1.0 - tick.length), angle);
    let end = frame.polar(frame.radius, angle);
    let width = (frame.radius * tick.width).trunc().max(1.0) as f32;
    draw_thick_line(layer, start, end, width, tick.color);
}

fn draw_image_tick(
    layer: &mut RgbaImage,
    frame: &Frame,
    angle: Angle,
    tick: &ImageTick,
    sources: &mut Sources,
) -> DialResult<()> {
    let source = sources.image(&tick.path)?;
    let factor = frame.size as f64 * tick.scale / source.height() as f64;
    let scaled = resize(
        source,
        (source.width() as f64 * factor) as u32,
        (source.height() as f64 * factor) as u32,
    );
    let (cx, cy) = frame.center_fraction();
    let position = (cx + 0.5 * angle.cos, cy + 0.5 * angle.sin);
    rotate_and_composite(layer, &scaled, angle.degrees as f64, position);
    Ok(())
}

fn draw_vector_numeral(
    layer: &mut RgbaImage,
    frame: &Frame,
    angle: Angle,
    numeral: &VectorNumeral,
    sources: &mut Sources,
) -> DialResult<()> {
    let text = numeral.value.resolve(angle.degrees);
    let font = sources.font(&numeral.font)?;
    let target_width = numeral.size * frame.size as f64;
    let Some(scale) = fit_scale(font, &text, target_width) else {
        tracing::debug!(angle = angle.degrees, "empty numeral skipped");
        return Ok(());
    };
    let Some(bounds) = text_bounds(font, &text, scale) else {
        return Ok(());
    };

    let (ax, ay) = frame.polar(frame.radius * (1.0 - numeral.distance), angle);
    let x = ax - (bounds.width() as f64 / 2.0).floor();
    let y = ay - (bounds.height() as f64 / NUMERAL_VERTICAL_DIVISOR).floor();
    draw_text(layer, (x as i64, y as i64), &text, font, scale, numeral.color);
    Ok(())
}

fn draw_image_numeral(
    layer: &mut RgbaImage,
    frame: &Frame,
    angle: Angle,
    numeral: &ImageNumeral,
    sources: &mut Sources,
) -> DialResult<()> {
    let source = sources.image(&numeral.path)?;
    let side = (frame.size as f64 * numeral.scale) as u32;
    let scaled = resize(source, side, side);
    // Mixes a fractional center with raw unit-circle offsets and truncates, so
    // the position snaps to -1, 0 or 1 on each axis. Existing dial layouts
    // depend on this placement.
    let (cx, cy) = frame.center_fraction();
    let position = (
        (cx + angle.cos - numeral.distance).trunc(),
        (cy + angle.sin - numeral.distance).trunc(),
    );
    composite(layer, &scaled, position);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_zero_points_up() {
        let frame = Frame::new(200);
        let angle = Angle::new(FIRST_SCREEN_ANGLE);
        assert_eq!(frame.polar(frame.radius, angle), (100.0, 0.0));
        let quarter = Angle::new(FIRST_SCREEN_ANGLE + 90);
        assert_eq!(frame.polar(frame.radius, quarter), (200.0, 100.0));
    }

    #[test]
    fn polar_truncates_offsets() {
        let frame = Frame::new(10);
        let (x, y) = frame.polar(3.0, Angle::new(45));
        assert_eq!((x, y), (7.0, 7.0));
    }
}
