use std::path::Path;

use image::RgbaImage;
use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::Color;
use crate::error::{DialError, DialResult};
use crate::raster::blend_pixel;

pub fn load_font(path: &Path) -> DialResult<Font<'static>> {
    let data = std::fs::read(path).map_err(|source| DialError::FontRead {
        path: path.to_path_buf(),
        source,
    })?;
    let font = Font::try_from_vec(data).ok_or_else(|| DialError::FontParse {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(path = %path.display(), glyphs = font.glyph_count(), "loaded font");
    Ok(font)
}

/// Glyphs laid out so that `origin` is the left end of the ascender line.
fn layout(font: &Font<'static>, text: &str, scale: Scale, origin: (f32, f32)) -> Vec<PositionedGlyph<'static>> {
    let v_metrics = font.v_metrics(scale);
    font.layout(text, scale, point(origin.0, origin.1 + v_metrics.ascent))
        .collect()
}

/// Pen advance of the whole string.
pub fn advance_width(font: &Font<'static>, text: &str, scale: Scale) -> f32 {
    let glyphs = layout(font, text, scale, (0.0, 0.0));
    match (glyphs.first(), glyphs.last()) {
        (Some(first), Some(last)) => {
            last.position().x - first.position().x + last.unpositioned().h_metrics().advance_width
        }
        _ => 0.0,
    }
}

/// Whole-pixel scale at which `text` advances `target_width` pixels, measured
/// from its advance at unit scale. Never smaller than one pixel.
pub fn fit_scale(font: &Font<'static>, text: &str, target_width: f64) -> Option<Scale> {
    let unit = advance_width(font, text, Scale::uniform(1.0)) as f64;
    if unit <= 0.0 {
        return None;
    }
    let size = (target_width / unit).trunc().max(1.0);
    Some(Scale::uniform(size as f32))
}

/// Inked pixel box of a string laid out from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TextBounds {
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }
}

pub fn text_bounds(font: &Font<'static>, text: &str, scale: Scale) -> Option<TextBounds> {
    layout(font, text, scale, (0.0, 0.0))
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .fold(None, |acc, bb| {
            Some(match acc {
                None => TextBounds {
                    min_x: bb.min.x,
                    min_y: bb.min.y,
                    max_x: bb.max.x,
                    max_y: bb.max.y,
                },
                Some(b) => TextBounds {
                    min_x: b.min_x.min(bb.min.x),
                    min_y: b.min_y.min(bb.min.y),
                    max_x: b.max_x.max(bb.max.x),
                    max_y: b.max_y.max(bb.max.y),
                },
            })
        })
}

/// Draws `text` with its ascender line starting at `origin`.
pub fn draw_text(
    image: &mut RgbaImage,
    origin: (i64, i64),
    text: &str,
    font: &Font<'static>,
    scale: Scale,
    color: Color,
) {
    for glyph in layout(font, text, scale, (origin.0 as f32, origin.1 as f32)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = bb.min.x as i64 + gx as i64;
                let py = bb.min.y as i64 + gy as i64;
                blend_pixel(image, px, py, color, v);
            });
        }
    }
}
