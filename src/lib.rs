//! Verbena Poster Engine
//!
//! A rendering engine for shareable event-listing posters. It lays out
//! variable-length, multi-colored text segments into fixed-width lines,
//! auto-scales the font so the whole listing fits a target canvas height,
//! discovers a background photo by probing candidate URLs, and enforces
//! per-user and global download quotas.
//!
//! # Features
//!
//! - **Injected capabilities**: text measurement, URL probing and the
//!   shared quota store are traits, so layout and quota logic are fully
//!   testable without a font file or a network.
//! - **Deterministic fallbacks**: a missing background degrades to a solid
//!   canvas; quota-store failures allow rather than block.
//! - **HTTP probe backend** behind the `http-probe` feature for callers
//!   that want a working network probe out of the box.
//!
//! # Example
//!
//! ```no_run
//! use verbena::layout::metrics::BoxGlyphs;
//! use verbena::store::MemoryStore;
//! use verbena::{EventRecord, PosterGenerator, PosterSpec, PosterSubject};
//!
//! # async fn run() -> verbena::Result<()> {
//! let events = vec![EventRecord {
//!     day: "2025-06-20".to_string(),
//!     time: Some("22:00".to_string()),
//!     place: Some("Plaza Mayor".to_string()),
//!     municipality: "La Laguna".to_string(),
//!     orchestra: "Banda X".to_string(),
//!     kind: Some("Baile Normal".to_string()),
//!     cancelled: false,
//! }];
//!
//! let mut generator = PosterGenerator::new(PosterSpec::default())
//!     .with_glyphs(Box::new(BoxGlyphs))
//!     .with_local_store(Box::new(MemoryStore::new()))
//!     .with_atomic_store(Box::new(MemoryStore::new()));
//!
//! let poster = generator
//!     .generate(
//!         &events,
//!         PosterSubject::DateRange {
//!             start_day: "2025-06-19".to_string(),
//!             end_day: "2025-06-25".to_string(),
//!         },
//!     )
//!     .await?;
//! std::fs::write(&poster.file_name, &poster.png_data).ok();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, QuotaScope, Result};

// Background discovery (candidate URLs + sequential probing)
pub mod background;

// Event records and item construction
pub mod event;

// Wrap/fit passes and the measurement seams
pub mod layout;

// Sliding-window quotas over injected stores
pub mod ratelimit;

// Composition of a plan into an encoded poster
pub mod render;

// In-memory store default
pub mod store;

// Orchestration facade
mod generator;
pub use generator::{PosterGenerator, PosterSubject};

// HTTP probe backend (no probe is required for rendering itself)
#[cfg(feature = "http-probe")]
pub mod http_probe;

pub use event::EventRecord;
pub use render::Poster;

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Color assigned to each segment role on the poster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub date: Rgb,
    pub time: Rgb,
    pub place: Rgb,
    pub municipality: Rgb,
    pub kind: Rgb,
    pub body: Rgb,
    pub attribution: Rgb,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            date: Rgb::new(0x5c, 0x40, 0x33),
            time: Rgb::new(0x00, 0x00, 0x8b),
            place: Rgb::new(0x00, 0x64, 0x00),
            municipality: Rgb::new(0x00, 0x64, 0x00),
            kind: Rgb::new(0x94, 0x00, 0xd3),
            body: Rgb::new(0x00, 0x00, 0x00),
            attribution: Rgb::new(0xff, 0x00, 0x00),
        }
    }
}

/// Sliding-window quota sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    /// Downloads allowed per caller per window
    pub local: u32,
    /// Downloads allowed across the whole cluster per window
    pub global: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            local: 20,
            global: 40,
            window_ms: 3_600_000,
        }
    }
}

/// Where background photos are guessed to live.
///
/// The defaults point at the photo collections the published posters have
/// always used; candidate URLs are `{host}{variant}.{ext}` and the shape
/// must stay stable for those collections to keep resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundSources {
    /// Base URLs ending in `/`, in priority order
    pub hosts: Vec<String>,
    /// File extensions without the dot, in priority order
    pub extensions: Vec<String>,
}

impl Default for BackgroundSources {
    fn default() -> Self {
        Self {
            hosts: vec![
                "https://debelingoconangel.web.app/fotos/".to_string(),
                "https://debelingo.webcindario.com/".to_string(),
                "http://debelingoconangel.infy.uk/fotos/".to_string(),
            ],
            extensions: ["jpg", "jpeg", "png", "webp", "JPG", "JPEG", "PNG", "WEBP"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Configuration for the poster engine
///
/// The defaults reproduce the published poster look: a 1200 px wide canvas
/// capped at 1200 px of listing height, fonts between 10 and 24 px, and
/// the classic color scheme.
///
/// # Examples
///
/// ```
/// let spec = verbena::PosterSpec::default();
/// assert_eq!(spec.canvas_width_px, 1200);
/// assert_eq!(spec.limits.global, 40);
/// ```
#[derive(Debug, Clone)]
pub struct PosterSpec {
    /// Canvas width in pixels; lines wrap at this budget
    pub canvas_width_px: u32,
    /// Target listing height the fitter scales toward
    pub canvas_height_px: u32,
    /// Floor font size; the fitter never goes below it
    pub min_font_px: f32,
    /// Ceiling font size
    pub max_font_px: f32,
    /// Line height as a multiple of the font size
    pub line_height_factor: f32,
    /// Bound on each background probe, in milliseconds
    pub probe_timeout_ms: u64,
    pub colors: ColorScheme,
    /// Opaque pre-formatted tail appended after the first date header when
    /// it fits, e.g. `" - https://example.app - Generado 05/08/2026"`
    pub attribution: Option<String>,
    pub limits: RateLimits,
    pub sources: BackgroundSources,
}

impl Default for PosterSpec {
    fn default() -> Self {
        Self {
            canvas_width_px: 1200,
            canvas_height_px: 1200,
            min_font_px: 10.0,
            max_font_px: 24.0,
            line_height_factor: 1.2,
            probe_timeout_ms: 4000,
            colors: ColorScheme::default(),
            attribution: None,
            limits: RateLimits::default(),
            sources: BackgroundSources::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec() {
        let spec = PosterSpec::default();
        assert_eq!(spec.canvas_width_px, 1200);
        assert_eq!(spec.canvas_height_px, 1200);
        assert_eq!(spec.min_font_px, 10.0);
        assert_eq!(spec.max_font_px, 24.0);
        assert_eq!(spec.limits.local, 20);
        assert_eq!(spec.sources.hosts.len(), 3);
        assert_eq!(spec.sources.extensions.len(), 8);
    }

    #[test]
    fn test_default_colors_match_the_published_scheme() {
        let colors = ColorScheme::default();
        assert_eq!(colors.date, Rgb::new(0x5c, 0x40, 0x33));
        assert_eq!(colors.place, colors.municipality);
        assert_eq!(colors.body, Rgb::new(0, 0, 0));
    }
}
