//! Background image discovery.
//!
//! Candidate URLs are guessed from the venue name, normalized and expanded
//! into spelling variants, then crossed with the configured hosts and file
//! extensions. Candidates are probed strictly one at a time, never in
//! parallel bursts against the third-party photo hosts, and every probe is
//! bounded by a timeout so one unresponsive host cannot stall the render.
//! Failed sweeps are retried under an explicit round state machine with
//! growing per-probe leniency.

use std::time::Duration;

use futures::future::BoxFuture;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Capability to test and download candidate background URLs.
///
/// `probe` answers whether the URL serves a loadable image. `fetch`
/// downloads the bytes of a URL that probed successfully; backends that can
/// only answer yes/no keep the default, and the poster falls back to the
/// solid background.
pub trait UrlProbe: Send + Sync {
    fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool>;

    fn fetch<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, Option<Vec<u8>>> {
        Box::pin(async { None })
    }
}

/// A probe that never finds anything; posters keep the solid background.
pub struct NoProbe;

impl UrlProbe for NoProbe {
    fn probe<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async { false })
    }
}

/// Lowercase and strip diacritics (NFD + combining-mark removal), so
/// "San Andrés" and "san andres" guess the same file names.
pub(crate) fn normalize_name(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn with_separator(s: &str, sep: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(sep)
}

fn push_variants(out: &mut Vec<String>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let norm = normalize_name(raw);
    out.push(with_separator(&norm, ""));
    if raw.contains(' ') {
        out.push(with_separator(&norm, "-"));
        out.push(with_separator(&norm, "_"));
    }
}

/// Generate the full ordered candidate list for a venue.
///
/// Host-major, then variant, then extension: every extension of the first
/// variant on the first host is tried before moving on. The produced shape
/// is `{host}{variant}.{ext}` and must stay byte-compatible with the photo
/// collections already published under these names.
pub fn candidate_urls(
    place: Option<&str>,
    municipality: &str,
    hosts: &[String],
    extensions: &[String],
) -> Vec<String> {
    let mut variants: Vec<String> = Vec::new();

    if let Some(place) = place.filter(|p| !p.is_empty()) {
        push_variants(&mut variants, place);
        let place_key = with_separator(&normalize_name(place), "");
        let muni_key = with_separator(&normalize_name(municipality), "");
        variants.push(format!("{}_{}", place_key, muni_key));
        variants.push(format!("{}_{}", muni_key, place_key));
    }
    push_variants(&mut variants, municipality);

    let mut unique: Vec<String> = Vec::new();
    for v in variants {
        if !unique.contains(&v) {
            unique.push(v);
        }
    }

    let mut urls = Vec::with_capacity(hosts.len() * unique.len() * extensions.len());
    for host in hosts {
        for variant in &unique {
            for ext in extensions {
                urls.push(format!("{}{}.{}", host, variant, ext));
            }
        }
    }
    urls
}

/// Discovery retry state. Each failed sweep over the candidate list
/// advances the phase; later rounds allow probes more time before giving
/// up on a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    Round1 { attempts: u8 },
    Round2 { attempts: u8 },
    Round3 { attempts: u8 },
    PermanentFailure,
}

impl DiscoveryPhase {
    pub fn start() -> Self {
        DiscoveryPhase::Round1 { attempts: 0 }
    }

    /// Per-probe timeout multiplier for this round.
    pub fn timeout_factor(&self) -> u32 {
        match self {
            DiscoveryPhase::Round1 { .. } => 1,
            DiscoveryPhase::Round2 { .. } => 2,
            DiscoveryPhase::Round3 { .. } => 4,
            DiscoveryPhase::PermanentFailure => 0,
        }
    }

    /// Advance after a sweep in which no candidate loaded.
    pub fn after_failed_sweep(self) -> Self {
        match self {
            DiscoveryPhase::Round1 { attempts } if attempts + 1 < 2 => {
                DiscoveryPhase::Round1 {
                    attempts: attempts + 1,
                }
            }
            DiscoveryPhase::Round1 { .. } => DiscoveryPhase::Round2 { attempts: 0 },
            DiscoveryPhase::Round2 { .. } => DiscoveryPhase::Round3 { attempts: 0 },
            DiscoveryPhase::Round3 { .. } => DiscoveryPhase::PermanentFailure,
            DiscoveryPhase::PermanentFailure => DiscoveryPhase::PermanentFailure,
        }
    }
}

/// Probe candidates in order until one loads or discovery fails for good.
///
/// Returns the winning URL, or `None` for the solid fallback. Within one
/// sweep candidates are tried strictly in list order, one outstanding probe
/// at a time, and a timed-out probe counts as a failure for that candidate.
pub async fn resolve_background(
    candidates: &[String],
    probe: &dyn UrlProbe,
    base_timeout: Duration,
) -> Option<String> {
    if candidates.is_empty() {
        return None;
    }

    let mut phase = DiscoveryPhase::start();
    while phase != DiscoveryPhase::PermanentFailure {
        let per_probe = base_timeout * phase.timeout_factor();
        for url in candidates {
            let hit = match tokio::time::timeout(per_probe, probe.probe(url)).await {
                Ok(hit) => hit,
                Err(_) => {
                    log::debug!("background probe timed out: {}", url);
                    false
                }
            };
            if hit {
                log::debug!("background candidate loaded: {}", url);
                return Some(url.clone());
            }
        }
        phase = phase.after_failed_sweep();
    }

    log::warn!("no background candidate loaded, falling back to solid fill");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn hosts() -> Vec<String> {
        vec!["https://a.example/fotos/".into(), "https://b.example/".into()]
    }

    fn exts() -> Vec<String> {
        vec!["jpg".into(), "PNG".into()]
    }

    #[test]
    fn diacritics_and_case_are_normalized() {
        assert_eq!(normalize_name("San Andrés"), "san andres");
        assert_eq!(normalize_name("Güímar"), "guimar");
        assert_eq!(normalize_name("LA OROTAVA"), "la orotava");
        assert_eq!(normalize_name("Añaza"), "anaza");
    }

    #[test]
    fn variants_cover_all_spellings_before_extensions() {
        let urls = candidate_urls(Some("San Andrés"), "Santa Cruz", &hosts(), &exts());
        let variants: Vec<&str> = urls
            .iter()
            .filter_map(|u| u.strip_prefix("https://a.example/fotos/"))
            .filter_map(|u| u.strip_suffix(".jpg"))
            .collect();
        assert_eq!(
            variants,
            vec![
                "sanandres",
                "san-andres",
                "san_andres",
                "sanandres_santacruz",
                "santacruz_sanandres",
                "santacruz",
                "santa-cruz",
                "santa_cruz",
            ]
        );
    }

    #[test]
    fn ordering_is_host_major_then_variant_then_extension() {
        let urls = candidate_urls(None, "Arona", &hosts(), &exts());
        assert_eq!(
            urls,
            vec![
                "https://a.example/fotos/arona.jpg",
                "https://a.example/fotos/arona.PNG",
                "https://b.example/arona.jpg",
                "https://b.example/arona.PNG",
            ]
        );
    }

    #[test]
    fn candidate_list_is_deterministic() {
        let a = candidate_urls(Some("El Médano"), "Granadilla", &hosts(), &exts());
        let b = candidate_urls(Some("El Médano"), "Granadilla", &hosts(), &exts());
        assert_eq!(a, b);
    }

    #[test]
    fn single_word_place_gets_no_separator_variants() {
        let urls = candidate_urls(Some("Taco"), "La Laguna", &hosts(), &exts());
        assert!(urls.iter().any(|u| u.contains("/taco.")));
        assert!(!urls.iter().any(|u| u.contains("ta-co") || u.contains("ta_co")));
        // Joins are still produced for both orders
        assert!(urls.iter().any(|u| u.contains("/taco_lalaguna.")));
        assert!(urls.iter().any(|u| u.contains("/lalaguna_taco.")));
    }

    #[test]
    fn phase_transitions_follow_the_round_table() {
        let mut phase = DiscoveryPhase::start();
        assert_eq!(phase, DiscoveryPhase::Round1 { attempts: 0 });
        phase = phase.after_failed_sweep();
        assert_eq!(phase, DiscoveryPhase::Round1 { attempts: 1 });
        phase = phase.after_failed_sweep();
        assert_eq!(phase, DiscoveryPhase::Round2 { attempts: 0 });
        assert_eq!(phase.timeout_factor(), 2);
        phase = phase.after_failed_sweep();
        assert_eq!(phase, DiscoveryPhase::Round3 { attempts: 0 });
        assert_eq!(phase.timeout_factor(), 4);
        phase = phase.after_failed_sweep();
        assert_eq!(phase, DiscoveryPhase::PermanentFailure);
        assert_eq!(phase.after_failed_sweep(), DiscoveryPhase::PermanentFailure);
    }

    struct ScriptedProbe {
        calls: Mutex<Vec<String>>,
        succeed_at: Option<usize>,
    }

    impl ScriptedProbe {
        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                succeed_at: None,
            }
        }

        fn succeeding_at(n: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                succeed_at: Some(n),
            }
        }
    }

    impl UrlProbe for ScriptedProbe {
        fn probe<'a>(&'a self, url: &'a str) -> BoxFuture<'a, bool> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(url.to_string());
            let hit = self.succeed_at == Some(calls.len() - 1);
            Box::pin(async move { hit })
        }
    }

    #[tokio::test]
    async fn probing_stops_at_the_first_success() {
        let candidates: Vec<String> = (0..5).map(|i| format!("u{}", i)).collect();
        let probe = ScriptedProbe::succeeding_at(2);
        let won = resolve_background(&candidates, &probe, Duration::from_millis(50)).await;
        assert_eq!(won.as_deref(), Some("u2"));
        assert_eq!(
            *probe.calls.lock().unwrap(),
            vec!["u0".to_string(), "u1".into(), "u2".into()]
        );
    }

    #[tokio::test]
    async fn exhausted_discovery_sweeps_four_times_then_gives_up() {
        let candidates: Vec<String> = (0..3).map(|i| format!("u{}", i)).collect();
        let probe = ScriptedProbe::failing();
        let won = resolve_background(&candidates, &probe, Duration::from_millis(20)).await;
        assert_eq!(won, None);
        // Round1 twice, Round2 once, Round3 once.
        assert_eq!(probe.calls.lock().unwrap().len(), 4 * candidates.len());
    }

    struct HangingProbe;

    impl UrlProbe for HangingProbe {
        fn probe<'a>(&'a self, _url: &'a str) -> BoxFuture<'a, bool> {
            Box::pin(futures::future::pending())
        }
    }

    #[tokio::test]
    async fn unresponsive_probe_times_out_and_discovery_moves_on() {
        let candidates = vec!["u0".to_string()];
        let won =
            resolve_background(&candidates, &HangingProbe, Duration::from_millis(10)).await;
        assert_eq!(won, None);
    }
}
