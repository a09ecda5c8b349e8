use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use verbena::event::{build_items, EventRecord};
use verbena::layout::fit::{fit, FitConstraints};
use verbena::layout::metrics::BoxGlyphs;
use verbena::render::compose::compose;
use verbena::ColorScheme;

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

fn fixture_events() -> Vec<EventRecord> {
    vec![
        EventRecord {
            day: "2025-06-20".into(),
            time: Some("22:00".into()),
            place: Some("Plaza Mayor".into()),
            municipality: "La Laguna".into(),
            orchestra: "Banda X".into(),
            kind: Some("Baile Normal".into()),
            cancelled: false,
        },
        EventRecord {
            day: "2025-06-21".into(),
            time: Some("21:30".into()),
            place: None,
            municipality: "Santa Cruz".into(),
            orchestra: "Orquesta Revelación, Trío Ardiente".into(),
            kind: None,
            cancelled: false,
        },
    ]
}

#[test]
fn golden_poster_matches_fixture() {
    // The box-glyph backend makes the composed bytes identical on every
    // machine, so the golden is a digest of the PNG itself.
    let items = build_items(&fixture_events());
    let plan = fit(
        &items,
        FitConstraints {
            max_width_px: 600.0,
            max_height_px: 600.0,
            min_font_px: 10.0,
            max_font_px: 24.0,
            line_height_factor: 1.2,
        },
        &BoxGlyphs,
    );
    let poster = compose(
        &plan,
        None,
        &ColorScheme::default(),
        Some(" - https://example.app"),
        600,
        &BoxGlyphs,
        "eventos.png".into(),
    )
    .expect("compose fixture poster");

    let digest = hex::encode(Sha256::digest(&poster.png_data));

    let expected_path = golden_path("poster1.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, expected.trim());
}
