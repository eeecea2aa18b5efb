//! Credit allocation — turns a timeline and an attribution model into a
//! weight per touchpoint. Weights over a non-empty timeline always sum to
//! 1.0; an empty timeline yields an empty map.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use revlens_core::types::{Touchpoint, TouchpointKind};

use crate::classifier::AttributionModel;

/// Default time-decay window for the multi-touch model, in days.
pub const DEFAULT_DECAY_WINDOW_DAYS: i64 = 90;

/// Allocate credit across an ordered timeline using the given model.
/// `cutoff` is the deal's conversion instant; only the multi-touch model's
/// time decay consults it.
pub fn allocate(
    timeline: &[Touchpoint],
    model: AttributionModel,
    cutoff: DateTime<Utc>,
) -> HashMap<String, f64> {
    allocate_with_decay_window(timeline, model, cutoff, DEFAULT_DECAY_WINDOW_DAYS)
}

/// [`allocate`] with an explicit decay window for tuned deployments.
pub fn allocate_with_decay_window(
    timeline: &[Touchpoint],
    model: AttributionModel,
    cutoff: DateTime<Utc>,
    decay_window_days: i64,
) -> HashMap<String, f64> {
    let n = timeline.len();
    if n == 0 {
        return HashMap::new();
    }

    let mut weights = HashMap::with_capacity(n);
    match model {
        AttributionModel::FirstTouch => {
            weights.insert(timeline[0].id.clone(), 1.0);
        }
        AttributionModel::LastTouch => {
            weights.insert(timeline[n - 1].id.clone(), 1.0);
        }
        AttributionModel::Linear => {
            let share = 1.0 / n as f64;
            for touchpoint in timeline {
                weights.insert(touchpoint.id.clone(), share);
            }
        }
        AttributionModel::UShaped => allocate_u_shaped(timeline, &mut weights),
        AttributionModel::WShaped => allocate_w_shaped(timeline, &mut weights),
        AttributionModel::MultiTouch => {
            allocate_multi_touch(timeline, cutoff, decay_window_days, &mut weights)
        }
    }
    weights
}

/// 0.4 to first, 0.4 to last, 0.2 split across the middle. With fewer than
/// three touchpoints the anchors absorb everything so credit is conserved.
fn allocate_u_shaped(timeline: &[Touchpoint], weights: &mut HashMap<String, f64>) {
    let n = timeline.len();
    match n {
        1 => {
            weights.insert(timeline[0].id.clone(), 1.0);
        }
        2 => {
            weights.insert(timeline[0].id.clone(), 0.5);
            weights.insert(timeline[1].id.clone(), 0.5);
        }
        _ => {
            weights.insert(timeline[0].id.clone(), 0.4);
            weights.insert(timeline[n - 1].id.clone(), 0.4);
            let middle_share = 0.2 / (n - 2) as f64;
            for touchpoint in &timeline[1..n - 1] {
                weights.insert(touchpoint.id.clone(), middle_share);
            }
        }
    }
}

/// 0.3 each to first, middle (index n/2), and last; 0.1 split across the
/// rest. At n=3 there is no rest, so the residual folds back evenly into
/// the anchors; n=2 degenerates to 0.5/0.5 and n=1 to 1.0.
fn allocate_w_shaped(timeline: &[Touchpoint], weights: &mut HashMap<String, f64>) {
    let n = timeline.len();
    match n {
        1 => {
            weights.insert(timeline[0].id.clone(), 1.0);
        }
        2 => {
            weights.insert(timeline[0].id.clone(), 0.5);
            weights.insert(timeline[1].id.clone(), 0.5);
        }
        _ => {
            let anchors = [0, n / 2, n - 1];
            let rest = n - 3;
            let anchor_weight = if rest == 0 { 0.3 + 0.1 / 3.0 } else { 0.3 };
            for &idx in &anchors {
                weights.insert(timeline[idx].id.clone(), anchor_weight);
            }
            if rest > 0 {
                let rest_share = 0.1 / rest as f64;
                for (idx, touchpoint) in timeline.iter().enumerate() {
                    if !anchors.contains(&idx) {
                        weights.insert(touchpoint.id.clone(), rest_share);
                    }
                }
            }
        }
    }
}

/// Weight each touchpoint by interaction type and recency relative to the
/// conversion instant, then normalize.
fn allocate_multi_touch(
    timeline: &[Touchpoint],
    cutoff: DateTime<Utc>,
    decay_window_days: i64,
    weights: &mut HashMap<String, f64>,
) {
    let raw: Vec<f64> = timeline
        .iter()
        .map(|t| type_weight(t.kind) * time_decay(t.timestamp, cutoff, decay_window_days))
        .collect();
    let total: f64 = raw.iter().sum();
    // total > 0 always: type weights are >= 1.0 and decay bottoms out at 0.5
    for (touchpoint, weight) in timeline.iter().zip(raw) {
        weights.insert(touchpoint.id.clone(), weight / total);
    }
}

/// Meetings carry the strongest buying signal, forms the second strongest.
fn type_weight(kind: TouchpointKind) -> f64 {
    match kind {
        TouchpointKind::Meeting => 2.0,
        TouchpointKind::FormSubmission => 1.5,
        TouchpointKind::Activity => 1.0,
    }
}

/// Linear decay over the window, bottoming out at a 0.5 multiplier for
/// touchpoints a full window or more from the cutoff.
fn time_decay(timestamp: DateTime<Utc>, cutoff: DateTime<Utc>, window_days: i64) -> f64 {
    let window_secs = (window_days * 86_400) as f64;
    let distance_secs = (cutoff - timestamp).num_seconds().abs() as f64;
    1.0 - (distance_secs / window_secs).min(1.0) * 0.5
}

/// Touchpoints whose weight clears the materiality threshold, highest
/// weight first. Ties order by id so output is deterministic.
pub fn significant_touchpoints(weights: &HashMap<String, f64>, threshold: f64) -> Vec<String> {
    let mut significant: Vec<(&String, f64)> = weights
        .iter()
        .filter(|(_, w)| **w >= threshold)
        .map(|(id, w)| (id, *w))
        .collect();
    significant.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    significant.into_iter().map(|(id, _)| id.clone()).collect()
}
