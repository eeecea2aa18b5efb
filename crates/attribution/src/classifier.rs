//! Journey classification — inspects a timeline's shape and selects the
//! attribution model to credit it with.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use revlens_core::types::Touchpoint;

/// Rule used to split conversion credit across touchpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionModel {
    FirstTouch,
    /// Never selected by the classifier; supported for explicit requests.
    LastTouch,
    Linear,
    UShaped,
    WShaped,
    /// Type-weighted with time decay; explicit requests only.
    MultiTouch,
}

impl AttributionModel {
    pub fn display_name(&self) -> &'static str {
        match self {
            AttributionModel::FirstTouch => "First Touch",
            AttributionModel::LastTouch => "Last Touch",
            AttributionModel::Linear => "Linear",
            AttributionModel::UShaped => "U-Shaped",
            AttributionModel::WShaped => "W-Shaped",
            AttributionModel::MultiTouch => "Multi-Touch",
        }
    }
}

/// Select a model from the journey shape alone. Pure function of the
/// touchpoint count and type mix; the deal is never consulted.
///
/// Richer, more diverse journeys warrant multi-point credit (W/U-shaped);
/// sparse journeys default to single-point attribution. Rules are evaluated
/// in order, first match wins.
pub fn classify(timeline: &[Touchpoint]) -> AttributionModel {
    let count = timeline.len();
    if count <= 1 {
        return AttributionModel::FirstTouch;
    }

    let distinct_kinds: HashSet<_> = timeline.iter().map(|t| t.kind).collect();
    if count >= 5 && distinct_kinds.len() >= 2 {
        return AttributionModel::WShaped;
    }
    if count >= 3 {
        return AttributionModel::UShaped;
    }
    AttributionModel::Linear
}
