//! Orchestration of a complete poster request.
//!
//! The generator owns the injected capabilities and runs the pipeline in a
//! fixed order: filter events for the subject, consume both quota windows,
//! measure the layout, resolve a background, compose. Layout is always
//! finished before any drawing starts, and the quota windows are the only
//! durable side effect of a request.

use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::background::{self, candidate_urls, resolve_background, NoProbe, UrlProbe};
use crate::error::{Error, QuotaScope, Result};
use crate::event::{at_venue, build_items, in_date_range, EventRecord};
use crate::layout::fit::{fit, FitConstraints};
use crate::layout::metrics::{BoxGlyphs, GlyphSource};
use crate::ratelimit::{check_global, check_local, AtomicStore, LocalStore};
use crate::render::compose::compose;
use crate::render::Poster;
use crate::store::MemoryStore;
use crate::PosterSpec;

/// Key of the per-caller download history in the local store.
const LOCAL_HISTORY_KEY: &str = "user_export_history";

/// Key of the shared download window behind the atomic store.
const GLOBAL_USAGE_KEY: &str = "exportUsage";

/// What the poster is about; decides filtering, background and file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PosterSubject {
    /// Every event inside an inclusive day window; solid background.
    DateRange { start_day: String, end_day: String },
    /// Every event at one venue from `cutoff_day` onward; the background is
    /// discovered from the venue name.
    Festival {
        place: Option<String>,
        municipality: String,
        cutoff_day: String,
    },
}

/// Facade wiring the injected capabilities into the poster pipeline.
///
/// Built with placeholder defaults (box glyphs, no probe, in-memory
/// stores) so it works out of the box; production callers swap in a real
/// font, a network probe and their shared store.
pub struct PosterGenerator {
    spec: PosterSpec,
    glyphs: Box<dyn GlyphSource>,
    probe: Box<dyn UrlProbe>,
    local: Box<dyn LocalStore>,
    global: Box<dyn AtomicStore>,
}

impl PosterGenerator {
    pub fn new(spec: PosterSpec) -> Self {
        Self {
            spec,
            glyphs: Box::new(BoxGlyphs),
            probe: Box::new(NoProbe),
            local: Box::new(MemoryStore::new()),
            global: Box::new(MemoryStore::new()),
        }
    }

    pub fn with_glyphs(mut self, glyphs: Box<dyn GlyphSource>) -> Self {
        self.glyphs = glyphs;
        self
    }

    pub fn with_probe(mut self, probe: Box<dyn UrlProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_local_store(mut self, store: Box<dyn LocalStore>) -> Self {
        self.local = store;
        self
    }

    pub fn with_atomic_store(mut self, store: Box<dyn AtomicStore>) -> Self {
        self.global = store;
        self
    }

    /// Generate a poster for `subject` from the supplied records.
    pub async fn generate(
        &mut self,
        events: &[EventRecord],
        subject: PosterSubject,
    ) -> Result<Poster> {
        let filtered = match &subject {
            PosterSubject::DateRange { start_day, end_day } => {
                in_date_range(events, start_day, end_day)
            }
            PosterSubject::Festival {
                place,
                municipality,
                cutoff_day,
            } => at_venue(events, place.as_deref(), municipality, cutoff_day),
        };
        if filtered.is_empty() {
            return Err(Error::NoEventsInRange);
        }

        self.authorize().await?;

        let items = build_items(&filtered);
        let plan = fit(
            &items,
            FitConstraints {
                max_width_px: self.spec.canvas_width_px as f32,
                max_height_px: self.spec.canvas_height_px as f32,
                min_font_px: self.spec.min_font_px,
                max_font_px: self.spec.max_font_px,
                line_height_factor: self.spec.line_height_factor,
            },
            &self.glyphs,
        );

        let background = match &subject {
            PosterSubject::Festival {
                place,
                municipality,
                ..
            } => {
                self.resolve_venue_background(place.as_deref(), municipality)
                    .await
            }
            PosterSubject::DateRange { .. } => None,
        };

        let file_name = suggest_file_name(&subject, &filtered);

        compose(
            &plan,
            background.as_ref(),
            &self.spec.colors,
            self.spec.attribution.as_deref(),
            self.spec.canvas_width_px,
            self.glyphs.as_ref(),
            file_name,
        )
    }

    /// Consume one slot of each quota window, per-caller first.
    async fn authorize(&mut self) -> Result<()> {
        let limits = self.spec.limits;
        let now = now_ms();

        if !check_local(
            self.local.as_mut(),
            LOCAL_HISTORY_KEY,
            limits.local,
            limits.window_ms,
            now,
        ) {
            return Err(Error::RateLimited {
                scope: QuotaScope::Local,
                limit: limits.local,
            });
        }

        if !check_global(
            self.global.as_ref(),
            GLOBAL_USAGE_KEY,
            limits.global,
            limits.window_ms,
            now,
        )
        .await
        {
            return Err(Error::RateLimited {
                scope: QuotaScope::Global,
                limit: limits.global,
            });
        }

        Ok(())
    }

    /// Probe the venue's candidate URLs and decode the winning image.
    ///
    /// Every failure path degrades to `None` (solid background); a poster is
    /// never refused for a missing photo.
    async fn resolve_venue_background(
        &self,
        place: Option<&str>,
        municipality: &str,
    ) -> Option<RgbaImage> {
        let candidates = candidate_urls(
            place,
            municipality,
            &self.spec.sources.hosts,
            &self.spec.sources.extensions,
        );
        let timeout = std::time::Duration::from_millis(self.spec.probe_timeout_ms);
        let url = resolve_background(&candidates, self.probe.as_ref(), timeout).await?;

        let bytes = match self.probe.fetch(&url).await {
            Some(bytes) => bytes,
            None => {
                log::warn!("background {} probed but could not be fetched", url);
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                log::warn!("background {} is not a decodable image: {}", url, e);
                None
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Filesystem-safe slug: diacritics stripped, whitespace runs collapsed to
/// `_`, anything outside `[a-z0-9._-]` dropped.
fn slug(s: &str) -> String {
    let cleaned: String = background::normalize_name(s)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("_")
}

fn suggest_file_name(subject: &PosterSubject, events: &[EventRecord]) -> String {
    match subject {
        PosterSubject::DateRange { .. } => "eventos.png".to_string(),
        PosterSubject::Festival {
            place,
            municipality,
            ..
        } => {
            let year = events
                .iter()
                .map(|e| e.day.as_str())
                .min()
                .map(|day| day.chars().take(4).collect::<String>())
                .unwrap_or_default();
            let main = place
                .as_deref()
                .filter(|p| !p.is_empty())
                .unwrap_or(municipality);
            format!("{}_{}_{}.png", slug(main), slug(municipality), year)
        }
    }
}
