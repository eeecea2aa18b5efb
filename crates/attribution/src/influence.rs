//! Channel influence — per-channel touchpoint counts and normalized
//! influence strength for reporting.

use serde::{Deserialize, Serialize};

use revlens_core::types::{Touchpoint, TouchpointKind};

/// Count and normalized influence strength for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStat {
    pub count: usize,
    pub strength: f64,
}

/// Per-channel breakdown of a timeline's influence mix. Strengths sum to
/// 1.0 for a non-empty timeline and are all zero for an empty one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfluence {
    pub meeting: ChannelStat,
    pub form: ChannelStat,
    pub activity: ChannelStat,
}

impl ChannelInfluence {
    pub fn total_count(&self) -> usize {
        self.meeting.count + self.form.count + self.activity.count
    }

    /// Number of distinct channels present.
    pub fn distinct_channels(&self) -> usize {
        [self.meeting.count, self.form.count, self.activity.count]
            .iter()
            .filter(|c| **c > 0)
            .count()
    }

    /// The channel with the highest normalized strength, `None` when the
    /// timeline was empty.
    pub fn strongest_channel(&self) -> Option<TouchpointKind> {
        let candidates = [
            (TouchpointKind::Meeting, self.meeting),
            (TouchpointKind::FormSubmission, self.form),
            (TouchpointKind::Activity, self.activity),
        ];
        candidates
            .into_iter()
            .filter(|(_, stat)| stat.count > 0)
            .max_by(|a, b| {
                a.1.strength
                    .partial_cmp(&b.1.strength)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(kind, _)| kind)
    }
}

/// Influence factor per channel: meetings weigh heaviest, forms next.
fn channel_factor(kind: TouchpointKind) -> f64 {
    match kind {
        TouchpointKind::Meeting => 1.5,
        TouchpointKind::FormSubmission => 1.2,
        TouchpointKind::Activity => 1.0,
    }
}

/// Compute the per-channel influence mix of a timeline. Each channel's raw
/// weight is its count scaled by the channel factor over the total count;
/// the three raw weights are then normalized to sum to 1.0.
pub fn channel_influence(timeline: &[Touchpoint]) -> ChannelInfluence {
    let total = timeline.len();
    if total == 0 {
        return ChannelInfluence::default();
    }

    let count_of = |kind: TouchpointKind| timeline.iter().filter(|t| t.kind == kind).count();
    let meetings = count_of(TouchpointKind::Meeting);
    let forms = count_of(TouchpointKind::FormSubmission);
    let activities = count_of(TouchpointKind::Activity);

    let raw = |count: usize, kind: TouchpointKind| {
        count as f64 * channel_factor(kind) / total as f64
    };
    let meeting_raw = raw(meetings, TouchpointKind::Meeting);
    let form_raw = raw(forms, TouchpointKind::FormSubmission);
    let activity_raw = raw(activities, TouchpointKind::Activity);
    let raw_total = meeting_raw + form_raw + activity_raw;

    ChannelInfluence {
        meeting: ChannelStat {
            count: meetings,
            strength: meeting_raw / raw_total,
        },
        form: ChannelStat {
            count: forms,
            strength: form_raw / raw_total,
        },
        activity: ChannelStat {
            count: activities,
            strength: activity_raw / raw_total,
        },
    }
}
