//! Scale-to-fit pass: pick a font size whose wrapped listing fits the
//! target height.
//!
//! This is a two-pass heuristic, not a fixed-point solver. The listing is
//! measured at an initial size; if it is too tall, the size is rescaled
//! linearly once (clamped to the floor) and the wrap pass runs again at the
//! new size, because wrap points shift with font size and a pure linear
//! scale is only a guess. The final height may still slightly exceed the
//! target for very uneven inputs; that is accepted behavior, and a listing
//! that overflows even at the floor size is rendered anyway rather than
//! refused.

use crate::layout::metrics::TextMetrics;
use crate::layout::wrap::wrap_items;
use crate::layout::{Item, LayoutPlan};

/// Constraints for [`fit`].
#[derive(Debug, Clone, Copy)]
pub struct FitConstraints {
    pub max_width_px: f32,
    pub max_height_px: f32,
    pub min_font_px: f32,
    pub max_font_px: f32,
    pub line_height_factor: f32,
}

impl FitConstraints {
    /// Width-derived starting size, clamped into the allowed range.
    fn initial_font_px(&self) -> f32 {
        (self.max_width_px / 25.0)
            .floor()
            .clamp(self.min_font_px, self.max_font_px)
    }
}

fn measure_pass(
    items: &[Item],
    constraints: &FitConstraints,
    font_px: f32,
    metrics: &dyn TextMetrics,
) -> LayoutPlan {
    let lines = wrap_items(items, constraints.max_width_px, font_px, metrics);
    let line_height_px = font_px * constraints.line_height_factor;
    let total_height_px = lines.len() as f32 * line_height_px;
    LayoutPlan {
        font_px,
        line_height_px,
        lines,
        total_height_px,
    }
}

/// Compute a layout plan whose font size aims to fit `max_height_px`.
///
/// The returned size is always within `min_font_px..=max_font_px`.
pub fn fit(items: &[Item], constraints: FitConstraints, metrics: &dyn TextMetrics) -> LayoutPlan {
    let initial = constraints.initial_font_px();
    let plan = measure_pass(items, &constraints, initial, metrics);

    if plan.total_height_px <= constraints.max_height_px {
        return plan;
    }

    let scale = constraints.max_height_px / plan.total_height_px;
    let rescaled = (initial * scale).floor().max(constraints.min_font_px);
    measure_pass(items, &constraints, rescaled, metrics)
}
