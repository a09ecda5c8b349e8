//! Text measurement and glyph coverage backends.
//!
//! The wrap and fit passes depend on nothing but [`TextMetrics`], so layout
//! is unit-testable without any real font. The composer additionally needs
//! [`GlyphSource`] to obtain coverage bitmaps for drawing.

use fontdue::{Font, FontSettings};

use crate::error::{Error, Result};

/// Measures the advance width of a string at a given font size.
///
/// This is the only capability the layout engine needs from a rendering
/// backend.
pub trait TextMetrics: Send + Sync {
    /// Width in pixels of `text` drawn at `font_px`.
    fn measure(&self, text: &str, font_px: f32) -> f32;
}

/// Ascent/descent of a line box at a given font size.
#[derive(Debug, Clone, Copy)]
pub struct VerticalMetrics {
    pub ascent: f32,
    pub descent: f32,
}

/// Coverage bitmap for a single rasterized glyph.
///
/// `xmin`/`ymin` follow fontdue's conventions: offsets of the bitmap
/// relative to the pen position and baseline.
#[derive(Debug, Clone)]
pub struct GlyphBitmap {
    pub width: usize,
    pub height: usize,
    pub xmin: i32,
    pub ymin: i32,
    pub advance: f32,
    /// Row-major alpha coverage, `width * height` bytes.
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    pub fn empty(advance: f32) -> Self {
        Self {
            width: 0,
            height: 0,
            xmin: 0,
            ymin: 0,
            advance,
            coverage: Vec::new(),
        }
    }
}

/// A measurement backend that can also rasterize glyphs for the composer.
pub trait GlyphSource: TextMetrics {
    fn rasterize(&self, ch: char, font_px: f32) -> GlyphBitmap;
    fn v_metrics(&self, font_px: f32) -> VerticalMetrics;
}

// A boxed glyph source measures through its inner backend, so it can be
// handed straight to the layout passes.
impl TextMetrics for Box<dyn GlyphSource> {
    fn measure(&self, text: &str, font_px: f32) -> f32 {
        (**self).measure(text, font_px)
    }
}

/// Real backend over a caller-supplied TTF/OTF font.
pub struct FontdueFont {
    font: Font,
}

impl FontdueFont {
    /// Parse font bytes supplied by the caller.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = Font::from_bytes(data, FontSettings::default())
            .map_err(|e| Error::ConfigError(format!("Failed to parse font: {}", e)))?;
        Ok(Self { font })
    }
}

impl TextMetrics for FontdueFont {
    fn measure(&self, text: &str, font_px: f32) -> f32 {
        text.chars()
            .map(|ch| self.font.metrics(ch, font_px).advance_width)
            .sum()
    }
}

impl GlyphSource for FontdueFont {
    fn rasterize(&self, ch: char, font_px: f32) -> GlyphBitmap {
        let (metrics, coverage) = self.font.rasterize(ch, font_px);
        GlyphBitmap {
            width: metrics.width,
            height: metrics.height,
            xmin: metrics.xmin,
            ymin: metrics.ymin,
            advance: metrics.advance_width,
            coverage,
        }
    }

    fn v_metrics(&self, font_px: f32) -> VerticalMetrics {
        match self.font.horizontal_line_metrics(font_px) {
            Some(m) => VerticalMetrics {
                ascent: m.ascent,
                descent: -m.descent,
            },
            // Fonts without horizontal metrics: approximate from the size.
            None => VerticalMetrics {
                ascent: font_px * 0.8,
                descent: font_px * 0.2,
            },
        }
    }
}

/// Deterministic fixed-advance backend used by layout tests and the golden
/// rendering tests: every glyph advances `font_px / 2` and rasterizes as a
/// solid box, so output is reproducible on any machine with no font files.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphs;

impl BoxGlyphs {
    fn advance(font_px: f32) -> f32 {
        font_px * 0.5
    }
}

impl TextMetrics for BoxGlyphs {
    fn measure(&self, text: &str, font_px: f32) -> f32 {
        text.chars().count() as f32 * Self::advance(font_px)
    }
}

impl GlyphSource for BoxGlyphs {
    fn rasterize(&self, ch: char, font_px: f32) -> GlyphBitmap {
        let advance = Self::advance(font_px);
        if ch.is_whitespace() {
            return GlyphBitmap::empty(advance);
        }
        let width = (advance * 0.8).max(1.0) as usize;
        let height = (font_px * 0.7).max(1.0) as usize;
        GlyphBitmap {
            width,
            height,
            xmin: 0,
            ymin: 0,
            advance,
            coverage: vec![255; width * height],
        }
    }

    fn v_metrics(&self, font_px: f32) -> VerticalMetrics {
        VerticalMetrics {
            ascent: font_px * 0.8,
            descent: font_px * 0.2,
        }
    }
}
