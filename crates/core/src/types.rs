//! Shared domain types: touchpoints, contacts, deals, and the raw platform
//! records they are normalized from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of customer interaction a touchpoint represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchpointKind {
    Meeting,
    Activity,
    FormSubmission,
}

impl TouchpointKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TouchpointKind::Meeting => "Meeting",
            TouchpointKind::Activity => "Activity",
            TouchpointKind::FormSubmission => "Form Submission",
        }
    }
}

/// Platform a touchpoint originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchpointSource {
    Crm,
    Scheduler,
    FormTool,
}

/// One normalized customer interaction, used as attribution evidence.
///
/// Invariant: `timestamp` is always concrete. Raw records without a
/// resolvable timestamp never become touchpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Touchpoint {
    /// Platform record id, unique within a contact's timeline.
    pub id: String,
    pub kind: TouchpointKind,
    pub source: TouchpointSource,
    /// When the interaction occurred, not when it was recorded.
    pub timestamp: DateTime<Utc>,
    /// Opaque pointer back to the originating record. Display/audit only;
    /// the engine never dereferences it.
    pub reference: String,
}

/// A deduplicated person identity assembled across platforms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    /// Platforms that have contributed data for this contact.
    pub lead_sources: Vec<TouchpointSource>,
    /// Most recent touchpoint timestamp, denormalized for fast filtering.
    pub last_activity: Option<DateTime<Utc>>,
    /// Contacts are never deleted; a deduplicated contact is tombstoned
    /// with the id of the contact it was merged into.
    pub merged_into: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// A bare contact with no profile fields yet.
    pub fn new(id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: None,
            email: None,
            phone: None,
            company: None,
            title: None,
            lead_sources: Vec::new(),
            last_activity: None,
            merged_into: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this identity has been merged away into another contact.
    pub fn is_merged(&self) -> bool {
        self.merged_into.is_some()
    }

    /// Data has arrived from two or more distinct platforms.
    pub fn is_multi_source(&self) -> bool {
        self.lead_sources.len() >= 2
    }
}

/// Platform-defined deal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Open,
    Won,
    Lost,
}

/// A sales outcome to be attributed. `created_at` is the conversion instant
/// used as the attribution cutoff: touchpoints at or before it are eligible
/// for credit, later ones are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub contact_id: Uuid,
    pub value: f64,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
}

// ─── Raw platform records ───────────────────────────────────────────────

/// A meeting as returned by the scheduling platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMeeting {
    pub id: String,
    pub title: String,
    /// Scheduled start. Absent when the platform record is malformed.
    pub scheduled_start: Option<DateTime<Utc>>,
}

/// An activity as returned by the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivity {
    pub id: String,
    pub subject: String,
    pub occurred_at: Option<DateTime<Utc>>,
}

/// A submission as returned by the form platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawFormSubmission {
    pub id: String,
    pub form_name: String,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// The per-contact bundle of raw interaction records the store returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TouchpointSources {
    pub meetings: Vec<RawMeeting>,
    pub activities: Vec<RawActivity>,
    pub forms: Vec<RawFormSubmission>,
}

impl TouchpointSources {
    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty() && self.activities.is_empty() && self.forms.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.meetings.len() + self.activities.len() + self.forms.len()
    }
}
