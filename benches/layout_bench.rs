use criterion::{black_box, criterion_group, criterion_main, Criterion};

use verbena::event::{build_items, EventRecord};
use verbena::layout::fit::{fit, FitConstraints};
use verbena::layout::metrics::BoxGlyphs;
use verbena::layout::wrap::wrap_items;

fn synthetic_week() -> Vec<EventRecord> {
    let mut events = Vec::new();
    for day in 16..=22 {
        for slot in 0..6 {
            events.push(EventRecord {
                day: format!("2025-06-{:02}", day),
                time: Some(format!("{:02}:00", 17 + slot)),
                place: Some("Plaza del Cristo".into()),
                municipality: "San Cristóbal de La Laguna".into(),
                orchestra: "Orquesta Revelación, Banda Juvenil de Tejina, Trío Ardiente".into(),
                kind: Some("Baile Normal".into()),
                cancelled: false,
            });
        }
    }
    events
}

fn bench_wrap(c: &mut Criterion) {
    let items = build_items(&synthetic_week());
    c.bench_function("wrap_week_1200px", |b| {
        b.iter(|| {
            let lines = wrap_items(black_box(&items), 1200.0, 24.0, &BoxGlyphs);
            black_box(lines)
        })
    });
}

fn bench_fit(c: &mut Criterion) {
    let items = build_items(&synthetic_week());
    let constraints = FitConstraints {
        max_width_px: 1200.0,
        max_height_px: 1200.0,
        min_font_px: 10.0,
        max_font_px: 24.0,
        line_height_factor: 1.2,
    };
    c.bench_function("fit_week_1200px", |b| {
        b.iter(|| {
            let plan = fit(black_box(&items), constraints, &BoxGlyphs);
            black_box(plan)
        })
    });
}

criterion_group!(benches, bench_wrap, bench_fit);
criterion_main!(benches);
