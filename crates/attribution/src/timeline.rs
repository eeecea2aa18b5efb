//! Timeline assembly — chronological ordering and deal-cutoff partitioning.

use chrono::Duration;

use revlens_core::types::{Deal, Touchpoint};

/// Order touchpoints ascending by timestamp. The sort is stable: upstream
/// platforms do not guarantee sub-second ordering, so ties keep their
/// insertion order.
pub fn build_timeline(mut touchpoints: Vec<Touchpoint>) -> Vec<Touchpoint> {
    touchpoints.sort_by_key(|t| t.timestamp);
    touchpoints
}

/// The ordered subsequence of a timeline eligible to receive credit for a
/// deal: everything at or before the deal's creation instant. A deal created
/// before any touchpoint yields an empty sequence, which every downstream
/// step must accept.
pub fn prior_to_deal(timeline: &[Touchpoint], deal: &Deal) -> Vec<Touchpoint> {
    timeline
        .iter()
        .filter(|t| t.timestamp <= deal.created_at)
        .cloned()
        .collect()
}

/// Span between the first and last touchpoint, `None` for fewer than two.
pub fn timeline_span(timeline: &[Touchpoint]) -> Option<Duration> {
    match (timeline.first(), timeline.last()) {
        (Some(first), Some(last)) if timeline.len() > 1 => {
            Some(last.timestamp - first.timestamp)
        }
        _ => None,
    }
}
