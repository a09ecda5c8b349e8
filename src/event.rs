//! Event records and their conversion into layout items.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layout::{ColorRole, Item, Segment};

/// One dated event as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// ISO `YYYY-MM-DD`, so lexicographic order is chronological order.
    pub day: String,
    /// Pre-formatted clock time, e.g. `"22:00"`.
    #[serde(default)]
    pub time: Option<String>,
    /// Venue name, when the event has one beyond the municipality.
    #[serde(default)]
    pub place: Option<String>,
    pub municipality: String,
    /// Comma-joined performer names, treated as one display unit.
    pub orchestra: String,
    /// Optional category label, e.g. `"Baile Normal"`.
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}

/// Sort key used when ordering a day's events.
fn time_key(event: &EventRecord) -> &str {
    event.time.as_deref().unwrap_or("00:00")
}

/// Events within an inclusive day window, cancelled ones dropped.
pub fn in_date_range(events: &[EventRecord], start_day: &str, end_day: &str) -> Vec<EventRecord> {
    events
        .iter()
        .filter(|e| !e.cancelled)
        .filter(|e| e.day.as_str() >= start_day && e.day.as_str() <= end_day)
        .cloned()
        .collect()
}

/// Events at one venue from `cutoff_day` onward, cancelled ones dropped.
///
/// A venue is the exact (place, municipality) pair; events without a place
/// match a `None` place.
pub fn at_venue(
    events: &[EventRecord],
    place: Option<&str>,
    municipality: &str,
    cutoff_day: &str,
) -> Vec<EventRecord> {
    let wanted_place = place.unwrap_or("");
    events
        .iter()
        .filter(|e| !e.cancelled)
        .filter(|e| e.place.as_deref().unwrap_or("") == wanted_place)
        .filter(|e| e.municipality == municipality)
        .filter(|e| e.day.as_str() >= cutoff_day)
        .cloned()
        .collect()
}

/// Group events by day in chronological order, each day sorted by time.
pub fn group_by_day(events: &[EventRecord]) -> BTreeMap<String, Vec<EventRecord>> {
    let mut grouped: BTreeMap<String, Vec<EventRecord>> = BTreeMap::new();
    for event in events {
        grouped
            .entry(event.day.clone())
            .or_default()
            .push(event.clone());
    }
    for day_events in grouped.values_mut() {
        day_events.sort_by(|a, b| time_key(a).cmp(time_key(b)));
    }
    grouped
}

/// The colored segment run for one event row.
///
/// Order and roles follow the listing format: performers first, then venue,
/// municipality, time and category, each prefixed with a dash. Absent
/// fields produce no segment at all.
pub fn event_item(event: &EventRecord) -> Item {
    let mut segments = vec![Segment::new(event.orchestra.clone(), ColorRole::Body)];
    if let Some(place) = event.place.as_deref().filter(|s| !s.is_empty()) {
        segments.push(Segment::new(format!("- {}", place), ColorRole::Place));
    }
    if !event.municipality.is_empty() {
        segments.push(Segment::new(
            format!("- {}", event.municipality),
            ColorRole::Municipality,
        ));
    }
    if let Some(time) = event.time.as_deref().filter(|s| !s.is_empty()) {
        segments.push(Segment::new(format!("- {}", time), ColorRole::Time));
    }
    if let Some(kind) = event.kind.as_deref().filter(|s| !s.is_empty()) {
        segments.push(Segment::new(format!("- {}", kind), ColorRole::Kind));
    }
    Item::row(segments)
}

/// Expand events into the full item list: a header per day followed by
/// that day's rows.
pub fn build_items(events: &[EventRecord]) -> Vec<Item> {
    let mut items = Vec::new();
    for (day, day_events) in group_by_day(events) {
        items.push(Item::header(day));
        for event in &day_events {
            items.push(event_item(event));
        }
    }
    items
}
