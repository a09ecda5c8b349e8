//! Draws a measured layout plan onto a pixel canvas and encodes it.
//!
//! Drawing happens strictly after layout: every x position and width in the
//! plan was computed by the wrap pass with the same metrics backend, so the
//! composer never re-wraps and decorations reuse measured widths instead of
//! guessing.

use std::io::Cursor;

use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{Error, Result};
use crate::layout::metrics::{GlyphSource, TextMetrics};
use crate::layout::{ColorRole, LayoutPlan, WrappedLine};
use crate::render::Poster;
use crate::{ColorScheme, Rgb};

/// Vertical gap between a header's baseline box and its underline.
const UNDERLINE_MARGIN_PX: f32 = 2.0;

/// Background images are blended over white at this opacity so the listing
/// stays legible on top of photographs.
const BACKGROUND_OPACITY: f32 = 0.5;

fn role_color(scheme: &ColorScheme, role: ColorRole) -> Rgb {
    match role {
        ColorRole::Date => scheme.date,
        ColorRole::Time => scheme.time,
        ColorRole::Place => scheme.place,
        ColorRole::Municipality => scheme.municipality,
        ColorRole::Kind => scheme.kind,
        ColorRole::Body => scheme.body,
    }
}

/// Blend `color` onto an opaque canvas pixel with the given alpha.
fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgb, alpha: f32) {
    if alpha <= 0.0 || x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if x >= canvas.width() || y >= canvas.height() {
        return;
    }
    let dst = canvas.get_pixel_mut(x, y);
    let inv = 1.0 - alpha;
    dst.0[0] = (dst.0[0] as f32 * inv + color.r as f32 * alpha) as u8;
    dst.0[1] = (dst.0[1] as f32 * inv + color.g as f32 * alpha) as u8;
    dst.0[2] = (dst.0[2] as f32 * inv + color.b as f32 * alpha) as u8;
    dst.0[3] = 255;
}

/// Cover-scale `bg` onto the canvas, centered, blended over the white base.
fn draw_cover_background(canvas: &mut RgbaImage, bg: &RgbaImage) {
    let (cw, ch) = (canvas.width() as f32, canvas.height() as f32);
    let (bw, bh) = (bg.width() as f32, bg.height() as f32);
    if bw < 1.0 || bh < 1.0 {
        return;
    }
    let scale = (cw / bw).max(ch / bh);
    let off_x = (bw * scale - cw) / 2.0;
    let off_y = (bh * scale - ch) / 2.0;

    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let sx = ((x as f32 + off_x) / scale).min(bw - 1.0).max(0.0) as u32;
            let sy = ((y as f32 + off_y) / scale).min(bh - 1.0).max(0.0) as u32;
            let src = bg.get_pixel(sx, sy);
            let alpha = (src.0[3] as f32 / 255.0) * BACKGROUND_OPACITY;
            blend(
                canvas,
                x as i64,
                y as i64,
                Rgb::new(src.0[0], src.0[1], src.0[2]),
                alpha,
            );
        }
    }
}

fn draw_text(
    canvas: &mut RgbaImage,
    glyphs: &dyn GlyphSource,
    text: &str,
    x: f32,
    line_top: f32,
    font_px: f32,
    color: Rgb,
) {
    let vm = glyphs.v_metrics(font_px);
    let mut pen_x = x;
    for ch in text.chars() {
        let g = glyphs.rasterize(ch, font_px);
        let glyph_left = pen_x + g.xmin as f32;
        let glyph_top = line_top + vm.ascent - (g.height as f32 + g.ymin as f32);
        for gy in 0..g.height {
            for gx in 0..g.width {
                let coverage = g.coverage[gy * g.width + gx];
                if coverage == 0 {
                    continue;
                }
                blend(
                    canvas,
                    (glyph_left + gx as f32) as i64,
                    (glyph_top + gy as f32) as i64,
                    color,
                    coverage as f32 / 255.0,
                );
            }
        }
        pen_x += g.advance;
    }
}

fn draw_hline(canvas: &mut RgbaImage, y: f32, color: Rgb) {
    let y = y as i64;
    for x in 0..canvas.width() {
        blend(canvas, x as i64, y, color, 1.0);
    }
}

fn first_header(lines: &[WrappedLine]) -> Option<&WrappedLine> {
    lines.iter().find(|l| l.header)
}

/// Draw the plan over the resolved background and encode the result.
///
/// `background` is the decoded candidate image, if any; `None` falls back
/// to the plain white canvas. The attribution string, when present, is
/// appended after the first date header only if it fits the width budget,
/// measured with the same backend that produced the plan.
pub fn compose(
    plan: &LayoutPlan,
    background: Option<&RgbaImage>,
    scheme: &ColorScheme,
    attribution: Option<&str>,
    canvas_width_px: u32,
    glyphs: &dyn GlyphSource,
    file_name: String,
) -> Result<Poster> {
    if plan.lines.is_empty() {
        return Err(Error::RenderError("Layout plan has no lines".into()));
    }
    let width = canvas_width_px;
    let height = plan.total_height_px.ceil().max(1.0) as u32;
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    if let Some(bg) = background {
        draw_cover_background(&mut canvas, bg);
    }

    for line in &plan.lines {
        let line_top = line.index as f32 * plan.line_height_px;
        for seg in &line.segments {
            draw_text(
                &mut canvas,
                glyphs,
                &seg.text,
                seg.x,
                line_top,
                plan.font_px,
                role_color(scheme, seg.role),
            );
        }
        if line.header {
            draw_hline(
                &mut canvas,
                line_top + plan.font_px + UNDERLINE_MARGIN_PX,
                scheme.date,
            );
        }
    }

    if let Some(text) = attribution {
        if let Some(header) = first_header(&plan.lines) {
            let header_width = header.width();
            let attr_width = glyphs.measure(text, plan.font_px);
            if header_width + attr_width <= width as f32 {
                let line_top = header.index as f32 * plan.line_height_px;
                draw_text(
                    &mut canvas,
                    glyphs,
                    text,
                    header_width,
                    line_top,
                    plan.font_px,
                    scheme.attribution,
                );
            }
        }
    }

    let mut png_data = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
        .map_err(|e| Error::EncodingError(format!("PNG encoder refused the canvas: {}", e)))?;

    Ok(Poster {
        width,
        height,
        png_data,
        file_name,
    })
}
