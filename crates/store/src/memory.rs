//! In-memory contact store backed by concurrent maps. Serves as the test
//! double for the attribution engine and as the store for embedded
//! deployments that sync into process memory.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::seq::IteratorRandom;
use tracing::info;
use uuid::Uuid;

use revlens_core::types::{
    Contact, Deal, DealStatus, RawActivity, RawFormSubmission, RawMeeting, TouchpointSource,
    TouchpointSources,
};

use crate::store::ContactStore;

/// DashMap-backed [`ContactStore`] with upsert hooks for the sync layer.
#[derive(Default)]
pub struct MemoryContactStore {
    contacts: DashMap<Uuid, Contact>,
    sources: DashMap<Uuid, TouchpointSources>,
    deals: DashMap<Uuid, Vec<Deal>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a contact record.
    pub fn upsert_contact(&self, contact: Contact) {
        self.contacts.insert(contact.id, contact);
    }

    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    /// Record a meeting from the scheduling platform against a contact.
    pub fn record_meeting(&self, contact_id: Uuid, meeting: RawMeeting) {
        let occurred = meeting.scheduled_start;
        self.sources
            .entry(contact_id)
            .or_default()
            .meetings
            .push(meeting);
        self.note_platform_activity(contact_id, TouchpointSource::Scheduler, occurred);
    }

    /// Record a CRM activity against a contact.
    pub fn record_activity(&self, contact_id: Uuid, activity: RawActivity) {
        let occurred = activity.occurred_at;
        self.sources
            .entry(contact_id)
            .or_default()
            .activities
            .push(activity);
        self.note_platform_activity(contact_id, TouchpointSource::Crm, occurred);
    }

    /// Record a form submission against a contact.
    pub fn record_form(&self, contact_id: Uuid, form: RawFormSubmission) {
        let occurred = form.submitted_at;
        self.sources.entry(contact_id).or_default().forms.push(form);
        self.note_platform_activity(contact_id, TouchpointSource::FormTool, occurred);
    }

    /// Record a deal for its owning contact.
    pub fn record_deal(&self, deal: Deal) {
        self.deals.entry(deal.contact_id).or_default().push(deal);
    }

    /// Tombstone `id` as merged into `into`. The merged contact stays
    /// addressable for audit but drops out of samples and direct
    /// attribution.
    pub fn mark_merged(&self, id: Uuid, into: Uuid) {
        if let Some(mut entry) = self.contacts.get_mut(&id) {
            entry.merged_into = Some(into);
            entry.updated_at = Utc::now();
            info!(contact = %id, into = %into, "contact marked merged");
        }
    }

    /// Register the contributing platform and keep `last_activity`
    /// denormalized as the newest interaction timestamp seen.
    fn note_platform_activity(
        &self,
        contact_id: Uuid,
        source: TouchpointSource,
        occurred: Option<DateTime<Utc>>,
    ) {
        if let Some(mut entry) = self.contacts.get_mut(&contact_id) {
            if !entry.lead_sources.contains(&source) {
                entry.lead_sources.push(source);
            }
            if let Some(ts) = occurred {
                if entry.last_activity.map_or(true, |last| ts > last) {
                    entry.last_activity = Some(ts);
                }
            }
            entry.updated_at = Utc::now();
        }
    }

    /// Seed a small population for demos and integration tests: one rich
    /// multi-platform journey with a won deal, one sparse single-touch
    /// contact, and one empty contact.
    pub fn seed_demo_data(&self) -> Vec<Uuid> {
        let now = Utc::now();

        // Contact 1: full journey across all three platforms.
        let alice = Uuid::new_v4();
        self.upsert_contact(Contact {
            name: Some("Alice Johnson".to_string()),
            email: Some("alice@example.com".to_string()),
            phone: Some("+1-555-0100".to_string()),
            company: Some("Acme Corp".to_string()),
            title: Some("VP Engineering".to_string()),
            ..Contact::new(alice)
        });
        self.record_form(
            alice,
            RawFormSubmission {
                id: "form_9001".to_string(),
                form_name: "Pricing Inquiry".to_string(),
                submitted_at: Some(now - Duration::days(45)),
            },
        );
        self.record_activity(
            alice,
            RawActivity {
                id: "act_3001".to_string(),
                subject: "Intro email".to_string(),
                occurred_at: Some(now - Duration::days(40)),
            },
        );
        self.record_meeting(
            alice,
            RawMeeting {
                id: "meet_1001".to_string(),
                title: "Discovery call".to_string(),
                scheduled_start: Some(now - Duration::days(30)),
            },
        );
        self.record_activity(
            alice,
            RawActivity {
                id: "act_3002".to_string(),
                subject: "Proposal sent".to_string(),
                occurred_at: Some(now - Duration::days(20)),
            },
        );
        self.record_meeting(
            alice,
            RawMeeting {
                id: "meet_1002".to_string(),
                title: "Demo".to_string(),
                scheduled_start: Some(now - Duration::days(12)),
            },
        );
        self.record_deal(Deal {
            id: "deal_501".to_string(),
            contact_id: alice,
            value: 48_000.0,
            status: DealStatus::Won,
            created_at: now - Duration::days(5),
        });

        // Contact 2: single meeting, open deal.
        let bob = Uuid::new_v4();
        self.upsert_contact(Contact {
            name: Some("Bob Smith".to_string()),
            email: Some("bob@example.com".to_string()),
            ..Contact::new(bob)
        });
        self.record_meeting(
            bob,
            RawMeeting {
                id: "meet_2001".to_string(),
                title: "Cold outreach call".to_string(),
                scheduled_start: Some(now - Duration::days(8)),
            },
        );
        self.record_deal(Deal {
            id: "deal_502".to_string(),
            contact_id: bob,
            value: 9_500.0,
            status: DealStatus::Open,
            created_at: now - Duration::days(2),
        });

        // Contact 3: no interactions yet.
        let carol = Uuid::new_v4();
        self.upsert_contact(Contact {
            name: Some("Carol Diaz".to_string()),
            ..Contact::new(carol)
        });

        info!(count = self.contacts.len(), "contact store demo data seeded");
        vec![alice, bob, carol]
    }
}

impl ContactStore for MemoryContactStore {
    fn contact(&self, id: Uuid) -> Result<Option<Contact>> {
        Ok(self.contacts.get(&id).map(|c| c.clone()))
    }

    fn touchpoint_sources(&self, contact_id: Uuid) -> Result<TouchpointSources> {
        Ok(self
            .sources
            .get(&contact_id)
            .map(|s| s.clone())
            .unwrap_or_default())
    }

    fn deals_by_contact(&self, contact_id: Uuid) -> Result<Vec<Deal>> {
        Ok(self
            .deals
            .get(&contact_id)
            .map(|d| d.clone())
            .unwrap_or_default())
    }

    fn contact_sample(&self, n: usize) -> Result<Vec<Contact>> {
        let mut rng = rand::thread_rng();
        Ok(self
            .contacts
            .iter()
            .filter(|entry| !entry.value().is_merged())
            .map(|entry| entry.value().clone())
            .choose_multiple(&mut rng, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_updates_lead_sources_and_last_activity() {
        let store = MemoryContactStore::new();
        let id = Uuid::new_v4();
        store.upsert_contact(Contact::new(id));

        let ts = Utc::now() - Duration::days(3);
        store.record_meeting(
            id,
            RawMeeting {
                id: "m1".to_string(),
                title: "Kickoff".to_string(),
                scheduled_start: Some(ts),
            },
        );

        let contact = store.contact(id).unwrap().unwrap();
        assert_eq!(contact.lead_sources, vec![TouchpointSource::Scheduler]);
        assert_eq!(contact.last_activity, Some(ts));

        // An older record must not move last_activity backwards.
        store.record_activity(
            id,
            RawActivity {
                id: "a1".to_string(),
                subject: "Note".to_string(),
                occurred_at: Some(ts - Duration::days(10)),
            },
        );
        let contact = store.contact(id).unwrap().unwrap();
        assert_eq!(contact.last_activity, Some(ts));
        assert!(contact.is_multi_source());
    }

    #[test]
    fn test_sample_is_bounded_and_skips_merged() {
        let store = MemoryContactStore::new();
        let ids: Vec<Uuid> = (0..10)
            .map(|_| {
                let id = Uuid::new_v4();
                store.upsert_contact(Contact::new(id));
                id
            })
            .collect();
        store.mark_merged(ids[0], ids[1]);

        let sample = store.contact_sample(5).unwrap();
        assert_eq!(sample.len(), 5);
        assert!(sample.iter().all(|c| c.id != ids[0]));

        // Asking for more than exist returns everyone active.
        let all = store.contact_sample(100).unwrap();
        assert_eq!(all.len(), 9);
    }

    #[test]
    fn test_empty_contact_yields_empty_bundles() {
        let store = MemoryContactStore::new();
        let id = Uuid::new_v4();
        store.upsert_contact(Contact::new(id));

        assert!(store.touchpoint_sources(id).unwrap().is_empty());
        assert!(store.deals_by_contact(id).unwrap().is_empty());
    }

    #[test]
    fn test_seed_demo_data() {
        let store = MemoryContactStore::new();
        let ids = store.seed_demo_data();
        assert_eq!(ids.len(), 3);
        assert_eq!(store.contact_count(), 3);

        let sources = store.touchpoint_sources(ids[0]).unwrap();
        assert_eq!(sources.record_count(), 5);
        assert_eq!(store.deals_by_contact(ids[0]).unwrap().len(), 1);
    }
}
