//! Raster primitives shared by the dial layers.
//!
//! Positions passed as `(f64, f64)` fractions are relative to the base canvas
//! size; pixel offsets are truncated toward zero and anything that lands
//! outside the canvas is clipped.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Pixel, Rgba, RgbaImage};

use crate::config::Color;
use crate::error::{DialError, DialResult};

// ============================================================================
// CANVAS AND COMPOSITING
// ============================================================================

/// New canvas with every pixel fully transparent.
pub fn transparent_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::new(width, height)
}

/// Top-left offset that places `overlay` at `position` within `base`.
pub fn composite_offset(base: (u32, u32), overlay: (u32, u32), position: (f64, f64)) -> (i64, i64) {
    (
        ((base.0 as f64 - overlay.0 as f64) * position.0) as i64,
        ((base.1 as f64 - overlay.1 as f64) * position.1) as i64,
    )
}

/// Alpha-composites `overlay` onto `base`; `(0.5, 0.5)` centers it.
pub fn composite<'a>(
    base: &'a mut RgbaImage,
    overlay: &RgbaImage,
    position: (f64, f64),
) -> &'a mut RgbaImage {
    let (x, y) = composite_offset(base.dimensions(), overlay.dimensions(), position);
    overlay_at(base, overlay, x, y);
    base
}

/// Rotates `foreground` counter-clockwise about its center and composites it so
/// that its center lands on `position * base_size`.
pub fn rotate_and_composite<'a>(
    base: &'a mut RgbaImage,
    foreground: &RgbaImage,
    degrees: f64,
    position: (f64, f64),
) -> &'a mut RgbaImage {
    let rotated = rotate_expanded(foreground, degrees);
    let x = (position.0 * base.width() as f64) as i64 - (rotated.width() / 2) as i64;
    let y = (position.1 * base.height() as f64) as i64 - (rotated.height() / 2) as i64;
    overlay_at(base, &rotated, x, y);
    base
}

/// Source-over composite of `top` with its origin at `(x, y)`, clipped to `base`.
pub fn overlay_at(base: &mut RgbaImage, top: &RgbaImage, x: i64, y: i64) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + top.width() as i64).min(base.width() as i64);
    let y1 = (y + top.height() as i64).min(base.height() as i64);
    for by in y0..y1 {
        for bx in x0..x1 {
            let src = top.get_pixel((bx - x) as u32, (by - y) as u32);
            blend_over(base.get_pixel_mut(bx as u32, by as u32), src);
        }
    }
}

// Transparent sources leave the destination bit-identical.
fn blend_over(dst: &mut Rgba<u8>, src: &Rgba<u8>) {
    match src.0[3] {
        0 => {}
        255 => *dst = *src,
        _ => dst.blend(src),
    }
}

/// Rotation with the canvas grown to fit every rotated corner. Nearest-neighbour
/// sampling; quarter turns are exact.
pub fn rotate_expanded(source: &RgbaImage, degrees: f64) -> RgbaImage {
    let degrees = degrees.rem_euclid(360.0);
    if degrees == 0.0 {
        return source.clone();
    }
    // imageops quarter turns are clockwise
    if degrees == 90.0 {
        return imageops::rotate270(source);
    }
    if degrees == 180.0 {
        return imageops::rotate180(source);
    }
    if degrees == 270.0 {
        return imageops::rotate90(source);
    }

    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (source.width() as f64, source.height() as f64);
    let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
    for (x, y) in [
        (-w / 2.0, -h / 2.0),
        (w / 2.0, -h / 2.0),
        (-w / 2.0, h / 2.0),
        (w / 2.0, h / 2.0),
    ] {
        let rx = x * cos + y * sin;
        let ry = -x * sin + y * cos;
        min_x = min_x.min(rx);
        max_x = max_x.max(rx);
        min_y = min_y.min(ry);
        max_y = max_y.max(ry);
    }
    const SNAP: f64 = 1e-9;
    let out_w = ((max_x - SNAP).ceil() - (min_x + SNAP).floor()).max(1.0) as u32;
    let out_h = ((max_y - SNAP).ceil() - (min_y + SNAP).floor()).max(1.0) as u32;

    let mut out = transparent_canvas(out_w, out_h);
    let (ocx, ocy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - ocx;
        let dy = y as f64 + 0.5 - ocy;
        let sx = dx * cos - dy * sin + w / 2.0;
        let sy = dx * sin + dy * cos + h / 2.0;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *pixel = *source.get_pixel(sx as u32, sy as u32);
        }
    }
    out
}

// ============================================================================
// CIRCULAR CROP
// ============================================================================

/// Opens `path` and cuts out the circle at `center` (fraction of the image
/// size) with `radius` (fraction of the shorter side).
pub fn crop_circle(path: &Path, center: (f64, f64), radius: f64) -> DialResult<RgbaImage> {
    let source = open_image(path)?;
    Ok(crop_circle_image(&source, center, radius))
}

pub fn crop_circle_image(source: &RgbaImage, center: (f64, f64), radius: f64) -> RgbaImage {
    let (w, h) = source.dimensions();
    let cx = (w as f64 * center.0) as i64;
    let cy = (h as f64 * center.1) as i64;
    let r = (w.min(h) as f64 * radius) as i64;

    let mut masked = transparent_canvas(w, h);
    fill_circle(&mut masked, (cx as f64, cy as f64), r as f64, Color::WHITE);
    paste_through_mask(&mut masked, source);

    // Bounding square may extend past the source; the overhang stays transparent.
    let side = (2 * r).max(1) as u32;
    let mut cropped = transparent_canvas(side, side);
    imageops::replace(&mut cropped, &masked, r - cx, r - cy);
    cropped
}

/// Replaces every pixel of `mask` with the matching `source` pixel, keeping only
/// as much of its alpha as the mask covers.
fn paste_through_mask(mask: &mut RgbaImage, source: &RgbaImage) {
    for (dst, src) in mask.pixels_mut().zip(source.pixels()) {
        let coverage = dst.0[3] as f32 / 255.0;
        if coverage == 0.0 {
            continue;
        }
        let mut out = *src;
        out.0[3] = (src.0[3] as f32 * coverage).round() as u8;
        *dst = out;
    }
}

// ============================================================================
// FILE I/O
// ============================================================================

pub fn open_image(path: &Path) -> DialResult<RgbaImage> {
    let image = image::open(path)
        .map_err(|source| DialError::ImageOpen {
            path: path.to_path_buf(),
            source,
        })?
        .to_rgba8();
    tracing::debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "decoded image"
    );
    Ok(image)
}

/// Writes PNG whatever the extension, so the alpha channel survives.
pub fn save_png(image: &RgbaImage, path: &Path) -> DialResult<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| DialError::ImageSave {
            path: path.to_path_buf(),
            source,
        })
}

/// Bicubic resize to exact dimensions, never below one pixel per side.
pub fn resize(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(image, width.max(1), height.max(1), FilterType::CatmullRom)
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

/// Blends `color` into one pixel, scaled by `coverage` in `[0, 1]`.
pub fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Color, coverage: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let alpha = (color.a as f32 * coverage.clamp(0.0, 1.0)).round() as u8;
    if alpha == 0 {
        return;
    }
    let mut src = color.to_rgba();
    src.0[3] = alpha;
    blend_over(image.get_pixel_mut(x as u32, y as u32), &src);
}

/// Anti-aliased filled disk, sampled at pixel centers.
pub fn fill_circle(image: &mut RgbaImage, center: (f64, f64), radius: f64, color: Color) {
    if radius <= 0.0 {
        return;
    }
    let (cx, cy) = center;
    let min_x = ((cx - radius - 1.0).floor() as i64).max(0);
    let max_x = ((cx + radius + 1.0).ceil() as i64).min(image.width() as i64 - 1);
    let min_y = ((cy - radius - 1.0).floor() as i64).max(0);
    let max_y = ((cy + radius + 1.0).ceil() as i64).min(image.height() as i64 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dist = (x as f64 + 0.5 - cx).hypot(y as f64 + 0.5 - cy);
            let aa = (radius + 0.5 - dist).clamp(0.0, 1.0);
            if aa > 0.0 {
                blend_pixel(image, x, y, color, aa as f32);
            }
        }
    }
}

/// Anti-aliased line segment of the given pixel thickness.
pub fn draw_thick_line(
    image: &mut RgbaImage,
    start: (f64, f64),
    end: (f64, f64),
    thickness: f32,
    color: Color,
) {
    let (x0, y0) = (start.0 as f32, start.1 as f32);
    let (x1, y1) = (end.0 as f32, end.1 as f32);
    let pad = thickness.ceil() + 1.0;
    let min_x = (x0.min(x1) - pad).floor() as i64;
    let max_x = (x0.max(x1) + pad).ceil() as i64;
    let min_y = (y0.min(y1) - pad).floor() as i64;
    let max_y = (y0.max(y1) + pad).ceil() as i64;
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = dx * dx + dy * dy;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 - x0;
            let py = y as f32 - y0;
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = x0 + t * dx;
            let ly = y0 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                blend_pixel(image, x, y, color, aa);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: Color) -> RgbaImage {
        RgbaImage::from_pixel(width, height, color.to_rgba())
    }

    /// (min_x, min_y, max_x, max_y) inclusive, of pixels with non-zero alpha.
    fn opaque_bounds(image: &RgbaImage) -> Option<(u32, u32, u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[3] > 0)
            .fold(None, |acc, (x, y, _)| match acc {
                None => Some((x, y, x, y)),
                Some((a, b, c, d)) => Some((a.min(x), b.min(y), c.max(x), d.max(y))),
            })
    }

    #[test]
    fn canvas_starts_transparent() {
        let canvas = transparent_canvas(7, 3);
        assert_eq!(canvas.dimensions(), (7, 3));
        assert!(canvas.pixels().all(|p| *p == Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn centered_composite_offset() {
        for (base, overlay) in [((100, 80), (20, 10)), ((64, 64), (63, 1)), ((9, 9), (9, 9))] {
            let (x, y) = composite_offset(base, overlay, (0.5, 0.5));
            assert_eq!(
                (x, y),
                (
                    ((base.0 - overlay.0) / 2) as i64,
                    ((base.1 - overlay.1) / 2) as i64
                )
            );
        }
    }

    #[test]
    fn offset_truncates_toward_zero_for_oversized_overlay() {
        assert_eq!(composite_offset((10, 10), (15, 15), (0.5, 0.5)), (-2, -2));
    }

    #[test]
    fn composite_places_overlay_and_clips() {
        let mut base = transparent_canvas(10, 10);
        let overlay = solid(4, 2, Color::WHITE);
        composite(&mut base, &overlay, (0.5, 0.5));
        assert_eq!(opaque_bounds(&base), Some((3, 4, 6, 5)));

        let mut base = transparent_canvas(10, 10);
        composite(&mut base, &overlay, (-1.0, 0.0));
        assert_eq!(opaque_bounds(&base), None);
    }

    #[test]
    fn transparent_overlay_is_a_no_op() {
        let mut base = solid(8, 8, Color::new(255, 0, 255, 128));
        let before = base.clone();
        composite(&mut base, &transparent_canvas(8, 8), (0.5, 0.5));
        assert_eq!(base, before);
    }

    #[test]
    fn crop_circle_spans_twice_the_radius() {
        for (side, radius) in [(100u32, 0.5), (100, 0.25), (64, 0.1), (250, 0.3)] {
            let source = solid(side, side, Color::rgb(200, 10, 10));
            let cropped = crop_circle_image(&source, (0.5, 0.5), radius);
            let (min_x, min_y, max_x, max_y) = opaque_bounds(&cropped).unwrap();
            let expected = 2.0 * radius * side as f64;
            let w = (max_x - min_x + 1) as f64;
            let h = (max_y - min_y + 1) as f64;
            assert!((w - expected).abs() <= 1.0, "side {side} r {radius}: width {w}");
            assert!((h - expected).abs() <= 1.0, "side {side} r {radius}: height {h}");
        }
    }

    #[test]
    fn crop_circle_leaves_corners_transparent() {
        let source = solid(50, 50, Color::WHITE);
        let cropped = crop_circle_image(&source, (0.5, 0.5), 0.5);
        assert_eq!(cropped.dimensions(), (50, 50));
        assert_eq!(cropped.get_pixel(0, 0).0[3], 0);
        assert_eq!(*cropped.get_pixel(25, 25), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn crop_circle_near_edge_pads_with_transparency() {
        let source = solid(40, 40, Color::WHITE);
        let cropped = crop_circle_image(&source, (0.0, 0.0), 0.25);
        assert_eq!(cropped.dimensions(), (20, 20));
        assert_eq!(cropped.get_pixel(2, 2).0[3], 0);
        assert_eq!(cropped.get_pixel(15, 15).0[3], 255);
    }

    #[test]
    fn quarter_turn_is_counter_clockwise() {
        let mut source = transparent_canvas(4, 2);
        source.put_pixel(3, 0, Rgba([255, 0, 0, 255]));
        let rotated = rotate_expanded(&source, 90.0);
        assert_eq!(rotated.dimensions(), (2, 4));
        // top-right corner moves to top-left
        assert_eq!(*rotated.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
        assert_eq!(rotate_expanded(&source, -270.0), rotated);
    }

    #[test]
    fn rotation_expands_bounds() {
        let source = solid(10, 10, Color::WHITE);
        let rotated = rotate_expanded(&source, 45.0);
        assert_eq!(rotated.dimensions(), (16, 16));
        assert_eq!(rotated.get_pixel(0, 0).0[3], 0);
        assert_eq!(rotated.get_pixel(7, 7).0[3], 255);
    }

    #[test]
    fn rotate_and_composite_centers_on_position() {
        let mut base = transparent_canvas(20, 20);
        let foreground = solid(4, 2, Color::WHITE);
        rotate_and_composite(&mut base, &foreground, 90.0, (0.5, 0.5));
        // rotated to 2x4, centered on (10, 10)
        assert_eq!(opaque_bounds(&base), Some((9, 8, 10, 11)));
    }

    #[test]
    fn resize_is_bicubic() {
        // a bicubic kernel rings across a hard edge; bilinear stays within the input range
        let mut step = solid(8, 1, Color::rgb(64, 64, 64));
        for x in 4..8 {
            step.put_pixel(x, 0, Color::rgb(192, 192, 192).to_rgba());
        }
        let scaled = resize(&step, 32, 1);
        assert_eq!(scaled.dimensions(), (32, 1));
        let reds: Vec<u8> = scaled.pixels().map(|p| p.0[0]).collect();
        assert!(reds.iter().any(|&r| r < 64 || r > 192), "{reds:?}");
        assert_eq!(resize(&step, 0, 0).dimensions(), (1, 1));
    }

    #[test]
    fn fill_circle_stays_inside_its_square() {
        let mut canvas = transparent_canvas(40, 40);
        fill_circle(&mut canvas, (20.0, 20.0), 20.0, Color::BLACK);
        assert_eq!(opaque_bounds(&canvas), Some((0, 0, 39, 39)));
        assert_eq!(canvas.get_pixel(0, 0).0[3], 0);
        assert_eq!(*canvas.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn thick_line_covers_its_axis() {
        let mut canvas = transparent_canvas(20, 20);
        draw_thick_line(&mut canvas, (10.0, 2.0), (10.0, 15.0), 1.0, Color::WHITE);
        for y in 2..=15 {
            assert_eq!(*canvas.get_pixel(10, y), Rgba([255, 255, 255, 255]));
        }
        assert_eq!(canvas.get_pixel(14, 8).0[3], 0);
    }

    #[test]
    fn degenerate_line_draws_a_dot() {
        let mut canvas = transparent_canvas(5, 5);
        draw_thick_line(&mut canvas, (2.0, 2.0), (2.0, 2.0), 1.0, Color::WHITE);
        assert_eq!(canvas.get_pixel(2, 2).0[3], 255);
    }

    #[test]
    fn blend_pixel_ignores_out_of_bounds() {
        let mut canvas = transparent_canvas(2, 2);
        blend_pixel(&mut canvas, -1, 0, Color::WHITE, 1.0);
        blend_pixel(&mut canvas, 0, 2, Color::WHITE, 1.0);
        assert!(canvas.pixels().all(|p| p.0[3] == 0));
    }
}
