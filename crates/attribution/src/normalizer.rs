//! Touchpoint normalization — the one place that turns heterogeneous
//! platform records into typed [`Touchpoint`]s. Downstream components can
//! assume complete records; every "is this field present" branch lives here.

use tracing::debug;

use revlens_core::types::{Touchpoint, TouchpointKind, TouchpointSource, TouchpointSources};

/// Convert a contact's raw platform records into touchpoints.
///
/// Records without a resolvable timestamp are dropped silently; they cannot
/// be ordered and so cannot enter a timeline. No deduplication happens here
/// — duplicates across platforms are the contact store's concern.
pub fn normalize(sources: &TouchpointSources) -> Vec<Touchpoint> {
    let mut touchpoints = Vec::with_capacity(sources.record_count());
    let mut dropped = 0usize;

    for meeting in &sources.meetings {
        match meeting.scheduled_start {
            Some(ts) => touchpoints.push(Touchpoint {
                id: meeting.id.clone(),
                kind: TouchpointKind::Meeting,
                source: TouchpointSource::Scheduler,
                timestamp: ts,
                reference: meeting.title.clone(),
            }),
            None => dropped += 1,
        }
    }

    for activity in &sources.activities {
        match activity.occurred_at {
            Some(ts) => touchpoints.push(Touchpoint {
                id: activity.id.clone(),
                kind: TouchpointKind::Activity,
                source: TouchpointSource::Crm,
                timestamp: ts,
                reference: activity.subject.clone(),
            }),
            None => dropped += 1,
        }
    }

    for form in &sources.forms {
        match form.submitted_at {
            Some(ts) => touchpoints.push(Touchpoint {
                id: form.id.clone(),
                kind: TouchpointKind::FormSubmission,
                source: TouchpointSource::FormTool,
                timestamp: ts,
                reference: form.form_name.clone(),
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped raw records without a resolvable timestamp");
    }
    touchpoints
}
