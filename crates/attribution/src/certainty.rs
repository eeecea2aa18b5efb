//! Certainty estimation — a calibrated confidence score in [0, 0.98] for an
//! attribution result. Not a probability in the strict statistical sense: a
//! blend of independent evidence-quality signals. Total certainty is
//! disallowed by design; no data source is ever perfectly verifiable.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use revlens_core::types::{Contact, Deal, Touchpoint};

use crate::classifier::AttributionModel;
use crate::influence::ChannelInfluence;
use crate::timeline::timeline_span;

/// Hard ceiling on any certainty score.
pub const CERTAINTY_CAP: f64 = 0.98;

const FACTOR_BASE: f64 = 0.70;

/// The six independent signal factors behind a certainty score. Each is the
/// 0.70 base plus bounded additive bonuses; the score is their arithmetic
/// mean, clamped to the cap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CertaintyBreakdown {
    /// Identity-field coverage on the contact record.
    pub data_completeness: f64,
    /// How many distinct interaction types the journey spans.
    pub channel_diversity: f64,
    /// Touchpoint volume and how much calendar time the journey covers.
    pub timeline_clarity: f64,
    /// High-intent interactions: meetings and form submissions.
    pub touchpoint_signal: f64,
    /// Independent platforms corroborating the same journey.
    pub cross_platform_confirmation: f64,
    /// Outcome evidence: deals on record, plus model richness.
    pub base_certainty: f64,
}

impl CertaintyBreakdown {
    pub fn score(&self) -> f64 {
        self.score_capped(CERTAINTY_CAP)
    }

    pub fn score_capped(&self, cap: f64) -> f64 {
        let mean = (self.data_completeness
            + self.channel_diversity
            + self.timeline_clarity
            + self.touchpoint_signal
            + self.cross_platform_confirmation
            + self.base_certainty)
            / 6.0;
        mean.clamp(0.0, cap)
    }
}

/// Estimate attribution certainty for a contact's (sub-)timeline. Degrades
/// gracefully: zero touchpoints and zero deals still yield a valid baseline
/// score, never an error.
pub fn estimate(
    contact: &Contact,
    timeline: &[Touchpoint],
    influence: &ChannelInfluence,
    model: AttributionModel,
    deals: &[Deal],
) -> f64 {
    breakdown(contact, timeline, influence, model, deals).score()
}

/// Compute the full six-factor breakdown behind a certainty score.
pub fn breakdown(
    contact: &Contact,
    timeline: &[Touchpoint],
    influence: &ChannelInfluence,
    model: AttributionModel,
    deals: &[Deal],
) -> CertaintyBreakdown {
    CertaintyBreakdown {
        data_completeness: data_completeness(contact),
        channel_diversity: channel_diversity(timeline),
        timeline_clarity: timeline_clarity(timeline),
        touchpoint_signal: touchpoint_signal(influence),
        cross_platform_confirmation: cross_platform_confirmation(timeline),
        base_certainty: base_certainty(model, deals),
    }
}

/// +0.03 per identity field present (max +0.15), +0.05 for a known
/// last-activity date.
fn data_completeness(contact: &Contact) -> f64 {
    let fields = [
        &contact.name,
        &contact.email,
        &contact.phone,
        &contact.company,
        &contact.title,
    ];
    let present = fields.iter().filter(|f| f.is_some()).count();
    let mut factor = FACTOR_BASE + (present as f64 * 0.03).min(0.15);
    if contact.last_activity.is_some() {
        factor += 0.05;
    }
    factor
}

/// +0.10 per distinct touchpoint type represented (up to +0.30).
fn channel_diversity(timeline: &[Touchpoint]) -> f64 {
    let kinds: HashSet<_> = timeline.iter().map(|t| t.kind).collect();
    FACTOR_BASE + kinds.len() as f64 * 0.10
}

/// +0.01 per touchpoint up to +0.15, plus span bonuses at the 1-, 7-, and
/// 30-day marks.
fn timeline_clarity(timeline: &[Touchpoint]) -> f64 {
    let mut factor = FACTOR_BASE + (timeline.len() as f64 * 0.01).min(0.15);
    if let Some(span) = timeline_span(timeline) {
        let days = span.num_days();
        if days > 1 {
            factor += 0.05;
        }
        if days > 7 {
            factor += 0.05;
        }
        if days > 30 {
            factor += 0.05;
        }
    }
    factor
}

/// +0.05 per meeting up to +0.15, +0.03 per form submission up to +0.09.
fn touchpoint_signal(influence: &ChannelInfluence) -> f64 {
    FACTOR_BASE
        + (influence.meeting.count as f64 * 0.05).min(0.15)
        + (influence.form.count as f64 * 0.03).min(0.09)
}

/// +0.15 when two independent platforms corroborate the journey, +0.05 more
/// for all three.
fn cross_platform_confirmation(timeline: &[Touchpoint]) -> f64 {
    let sources: HashSet<_> = timeline.iter().map(|t| t.source).collect();
    let mut factor = FACTOR_BASE;
    if sources.len() >= 2 {
        factor += 0.15;
    }
    if sources.len() >= 3 {
        factor += 0.05;
    }
    factor
}

/// Deal evidence (+0.10 for the first, +0.02 per extra up to +0.08) and
/// model richness (+0.05 for W-shaped/multi-touch, +0.03 for U-shaped).
fn base_certainty(model: AttributionModel, deals: &[Deal]) -> f64 {
    let mut factor = FACTOR_BASE;
    if !deals.is_empty() {
        factor += 0.10 + ((deals.len() - 1) as f64 * 0.02).min(0.08);
    }
    factor += match model {
        AttributionModel::WShaped | AttributionModel::MultiTouch => 0.05,
        AttributionModel::UShaped => 0.03,
        _ => 0.0,
    };
    factor
}
