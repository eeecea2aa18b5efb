use anyhow::Result;
use uuid::Uuid;

use revlens_core::types::{Contact, Deal, TouchpointSources};

/// Read contract the attribution engine depends on. Implementations own all
/// persistence and sync concerns; from the engine's perspective the store is
/// read-only and every call returns pre-fetched, in-memory data.
pub trait ContactStore: Send + Sync {
    /// Look up a contact by id. `None` when no such contact exists.
    fn contact(&self, id: Uuid) -> Result<Option<Contact>>;

    /// Raw interaction records for a contact, bundled per platform.
    fn touchpoint_sources(&self, contact_id: Uuid) -> Result<TouchpointSources>;

    /// Deals owned by a contact.
    fn deals_by_contact(&self, contact_id: Uuid) -> Result<Vec<Deal>>;

    /// A bounded, representative sample of active contacts for bulk runs.
    /// Implementations must sample, never hand back an unbounded scan.
    fn contact_sample(&self, n: usize) -> Result<Vec<Contact>>;
}
