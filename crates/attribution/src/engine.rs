//! Attribution orchestrator — composes normalization, timeline assembly,
//! journey classification, credit allocation, and certainty estimation per
//! contact, and folds bulk runs into aggregate analytics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use revlens_core::config::AttributionConfig;
use revlens_core::error::{RevlensError, RevlensResult};
use revlens_core::types::{Contact, Deal, DealStatus, Touchpoint, TouchpointKind};
use revlens_store::ContactStore;

use crate::allocator::{allocate_with_decay_window, significant_touchpoints};
use crate::certainty::breakdown;
use crate::classifier::{classify, AttributionModel};
use crate::influence::{channel_influence, ChannelInfluence};
use crate::normalizer::normalize;
use crate::timeline::{build_timeline, prior_to_deal};

/// The outcome of running attribution for one (contact, deal) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionChain {
    pub contact_id: Uuid,
    pub deal_id: String,
    pub deal_value: f64,
    pub deal_status: DealStatus,
    pub model: AttributionModel,
    /// Touchpoint id → credit weight over the deal's prior touchpoints.
    /// Sums to 1.0, or empty when nothing preceded the deal.
    pub touchpoint_weights: HashMap<String, f64>,
    /// Touchpoints clearing the materiality threshold, strongest first.
    pub significant_touchpoints: Vec<String>,
    pub channel_influence: ChannelInfluence,
    pub certainty: f64,
    pub total_touchpoints: usize,
}

/// Full attribution output for one contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactAttribution {
    pub contact: Contact,
    pub timeline: Vec<Touchpoint>,
    pub chains: Vec<AttributionChain>,
    /// Channel mix over the full timeline, independent of any one deal.
    pub channel_breakdown: ChannelInfluence,
    /// Max chain certainty, or a direct full-timeline estimate when the
    /// contact has no deals.
    pub certainty: f64,
    pub computed_at: DateTime<Utc>,
}

/// Per-channel touchpoint totals across a bulk run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelTotals {
    pub meetings: u64,
    pub forms: u64,
    pub activities: u64,
    pub meeting_pct: f64,
    pub form_pct: f64,
    pub activity_pct: f64,
}

/// Aggregate analytics from a bulk attribution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAttribution {
    pub contacts_processed: u64,
    /// Contacts whose attribution failed; logged and excluded, never fatal.
    pub contacts_failed: u64,
    pub total_deals: u64,
    pub total_touchpoints: u64,
    pub channel_totals: ChannelTotals,
    pub model_usage: HashMap<AttributionModel, u64>,
    pub avg_certainty: f64,
    /// Share of processed contacts at or above the high-certainty bar.
    pub high_certainty_rate: f64,
    /// Channel with the highest aggregate normalized influence.
    pub most_effective_channel: Option<TouchpointKind>,
    pub computed_at: DateTime<Utc>,
}

/// Stateless attribution engine over a read-only contact store. Every call
/// is independent pure computation over pre-fetched data; concurrent
/// invocations need no locking.
pub struct AttributionEngine<S: ContactStore> {
    pub(crate) store: Arc<S>,
    pub(crate) config: AttributionConfig,
}

impl<S: ContactStore> AttributionEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: AttributionConfig::default(),
        }
    }

    pub fn with_config(store: Arc<S>, config: AttributionConfig) -> Self {
        Self { store, config }
    }

    /// Run attribution for a single contact, selecting the model per deal
    /// via the journey classifier.
    pub fn attribute_contact(&self, id: Uuid) -> RevlensResult<ContactAttribution> {
        self.attribute(id, None)
    }

    /// Run attribution with an explicit model, bypassing the classifier.
    /// This is how last-touch and multi-touch results are requested.
    pub fn attribute_contact_with_model(
        &self,
        id: Uuid,
        model: AttributionModel,
    ) -> RevlensResult<ContactAttribution> {
        self.attribute(id, Some(model))
    }

    fn attribute(
        &self,
        id: Uuid,
        forced_model: Option<AttributionModel>,
    ) -> RevlensResult<ContactAttribution> {
        let contact = self
            .store
            .contact(id)?
            .filter(|c| !c.is_merged())
            .ok_or(RevlensError::ContactNotFound(id))?;

        let sources = self.store.touchpoint_sources(id)?;
        let deals = self.store.deals_by_contact(id)?;

        let timeline = build_timeline(normalize(&sources));
        // Reported at the contact level; each deal's chain re-classifies on
        // its prior-only sub-timeline, since a deal created mid-journey may
        // only be credited by what preceded it.
        let overall_model = forced_model.unwrap_or_else(|| classify(&timeline));

        let chains: Vec<AttributionChain> = deals
            .iter()
            .map(|deal| self.build_chain(&contact, &timeline, deal, &deals, forced_model))
            .collect();

        let channel_breakdown = channel_influence(&timeline);
        let certainty = chains
            .iter()
            .map(|c| c.certainty)
            .fold(None::<f64>, |acc, c| Some(acc.map_or(c, |a| a.max(c))))
            .unwrap_or_else(|| {
                breakdown(&contact, &timeline, &channel_breakdown, overall_model, &deals)
                    .score_capped(self.config.certainty_cap)
            });

        Ok(ContactAttribution {
            contact,
            timeline,
            chains,
            channel_breakdown,
            certainty,
            computed_at: Utc::now(),
        })
    }

    fn build_chain(
        &self,
        contact: &Contact,
        timeline: &[Touchpoint],
        deal: &Deal,
        deals: &[Deal],
        forced_model: Option<AttributionModel>,
    ) -> AttributionChain {
        let prior = prior_to_deal(timeline, deal);
        let model = forced_model.unwrap_or_else(|| classify(&prior));
        let weights = allocate_with_decay_window(
            &prior,
            model,
            deal.created_at,
            self.config.decay_window_days,
        );
        let significant = significant_touchpoints(&weights, self.config.significance_threshold);
        let influence = channel_influence(&prior);
        let certainty = breakdown(contact, &prior, &influence, model, deals)
            .score_capped(self.config.certainty_cap);

        AttributionChain {
            contact_id: contact.id,
            deal_id: deal.id.clone(),
            deal_value: deal.value,
            deal_status: deal.status,
            model,
            touchpoint_weights: weights,
            significant_touchpoints: significant,
            channel_influence: influence,
            certainty,
            total_touchpoints: prior.len(),
        }
    }

    /// Attribute a bounded sample of the contact population and fold the
    /// results into aggregate analytics. A single contact's failure is
    /// logged and excluded; it never aborts the run.
    pub fn attribute_all_contacts(&self, sample_size: usize) -> RevlensResult<BulkAttribution> {
        let bound = sample_size.min(self.config.max_bulk_sample);
        let contacts = self.store.contact_sample(bound)?;
        info!(sample = contacts.len(), "starting bulk attribution run");

        let mut processed = 0u64;
        let mut failed = 0u64;
        let mut total_deals = 0u64;
        let mut channel_totals = ChannelTotals::default();
        let mut model_usage: HashMap<AttributionModel, u64> = HashMap::new();
        let mut certainty_sum = 0.0;
        let mut high_certainty = 0u64;
        // Aggregate normalized influence per channel, for the
        // most-effective-channel pick.
        let mut meeting_strength = 0.0;
        let mut form_strength = 0.0;
        let mut activity_strength = 0.0;

        for contact in &contacts {
            let result = match self.attribute(contact.id, None) {
                Ok(result) => result,
                Err(err) => {
                    warn!(
                        contact = %contact.id,
                        error = %err,
                        "attribution failed; contact excluded from aggregates"
                    );
                    failed += 1;
                    continue;
                }
            };

            processed += 1;
            total_deals += result.chains.len() as u64;
            channel_totals.meetings += result.channel_breakdown.meeting.count as u64;
            channel_totals.forms += result.channel_breakdown.form.count as u64;
            channel_totals.activities += result.channel_breakdown.activity.count as u64;
            meeting_strength += result.channel_breakdown.meeting.strength;
            form_strength += result.channel_breakdown.form.strength;
            activity_strength += result.channel_breakdown.activity.strength;

            for chain in &result.chains {
                *model_usage.entry(chain.model).or_insert(0) += 1;
            }

            certainty_sum += result.certainty;
            if result.certainty >= self.config.high_certainty_threshold {
                high_certainty += 1;
            }
        }

        let total_touchpoints =
            channel_totals.meetings + channel_totals.forms + channel_totals.activities;
        if total_touchpoints > 0 {
            let total = total_touchpoints as f64;
            channel_totals.meeting_pct = channel_totals.meetings as f64 / total * 100.0;
            channel_totals.form_pct = channel_totals.forms as f64 / total * 100.0;
            channel_totals.activity_pct = channel_totals.activities as f64 / total * 100.0;
        }

        let most_effective_channel = [
            (TouchpointKind::Meeting, meeting_strength, channel_totals.meetings),
            (TouchpointKind::FormSubmission, form_strength, channel_totals.forms),
            (TouchpointKind::Activity, activity_strength, channel_totals.activities),
        ]
        .into_iter()
        .filter(|(_, _, count)| *count > 0)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(kind, _, _)| kind);

        let avg_certainty = if processed > 0 {
            certainty_sum / processed as f64
        } else {
            0.0
        };
        let high_certainty_rate = if processed > 0 {
            high_certainty as f64 / processed as f64
        } else {
            0.0
        };

        info!(
            processed,
            failed,
            total_deals,
            avg_certainty,
            "bulk attribution run complete"
        );

        Ok(BulkAttribution {
            contacts_processed: processed,
            contacts_failed: failed,
            total_deals,
            total_touchpoints,
            channel_totals,
            model_usage,
            avg_certainty,
            high_certainty_rate,
            most_effective_channel,
            computed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Duration;
    use revlens_core::types::{RawActivity, RawFormSubmission, RawMeeting, TouchpointSources};
    use revlens_store::MemoryContactStore;

    const EPSILON: f64 = 1e-9;

    fn engine_over(store: MemoryContactStore) -> AttributionEngine<MemoryContactStore> {
        AttributionEngine::new(Arc::new(store))
    }

    fn contact_with_fields(store: &MemoryContactStore) -> Uuid {
        let id = Uuid::new_v4();
        let mut contact = Contact::new(id);
        contact.name = Some("Test Contact".to_string());
        contact.email = Some("test@example.com".to_string());
        store.upsert_contact(contact);
        id
    }

    fn meeting(id: &str, days_ago: i64) -> RawMeeting {
        RawMeeting {
            id: id.to_string(),
            title: "Meeting".to_string(),
            scheduled_start: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    fn activity(id: &str, days_ago: i64) -> RawActivity {
        RawActivity {
            id: id.to_string(),
            subject: "Activity".to_string(),
            occurred_at: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    fn form(id: &str, days_ago: i64) -> RawFormSubmission {
        RawFormSubmission {
            id: id.to_string(),
            form_name: "Form".to_string(),
            submitted_at: Some(Utc::now() - Duration::days(days_ago)),
        }
    }

    fn deal(id: &str, contact_id: Uuid, days_ago: i64) -> Deal {
        Deal {
            id: id.to_string(),
            contact_id,
            value: 10_000.0,
            status: DealStatus::Won,
            created_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_unknown_contact_is_not_found() {
        let engine = engine_over(MemoryContactStore::new());
        let missing = Uuid::new_v4();
        match engine.attribute_contact(missing) {
            Err(RevlensError::ContactNotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected ContactNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_merged_contact_is_not_found() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        let survivor = contact_with_fields(&store);
        store.mark_merged(id, survivor);

        let engine = engine_over(store);
        assert!(matches!(
            engine.attribute_contact(id),
            Err(RevlensError::ContactNotFound(_))
        ));
        assert!(engine.attribute_contact(survivor).is_ok());
    }

    #[test]
    fn test_single_meeting_single_deal_is_first_touch() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_meeting(id, meeting("m1", 10));
        store.record_deal(deal("d1", id, 2));

        let result = engine_over(store).attribute_contact(id).unwrap();
        assert_eq!(result.chains.len(), 1);

        let chain = &result.chains[0];
        assert_eq!(chain.model, AttributionModel::FirstTouch);
        assert_eq!(chain.touchpoint_weights.len(), 1);
        assert_eq!(chain.touchpoint_weights["m1"], 1.0);
        assert_eq!(chain.significant_touchpoints, vec!["m1".to_string()]);
        assert_eq!(chain.total_touchpoints, 1);
    }

    #[test]
    fn test_two_touchpoints_are_linear_half_each() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_activity(id, activity("a1", 15));
        store.record_form(id, form("f1", 8));
        store.record_deal(deal("d1", id, 2));

        let result = engine_over(store).attribute_contact(id).unwrap();
        let chain = &result.chains[0];
        assert_eq!(chain.model, AttributionModel::Linear);
        assert!((chain.touchpoint_weights["a1"] - 0.5).abs() < EPSILON);
        assert!((chain.touchpoint_weights["f1"] - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_five_diverse_touchpoints_are_w_shaped() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_form(id, form("f1", 40));
        store.record_activity(id, activity("a1", 30));
        store.record_meeting(id, meeting("m1", 20));
        store.record_activity(id, activity("a2", 12));
        store.record_meeting(id, meeting("m2", 6));
        store.record_deal(deal("d1", id, 1));

        let result = engine_over(store).attribute_contact(id).unwrap();
        let chain = &result.chains[0];
        assert_eq!(chain.model, AttributionModel::WShaped);

        let sum: f64 = chain.touchpoint_weights.values().sum();
        assert!((sum - 1.0).abs() < EPSILON);
        // First, middle, and last anchors each hold at least 0.3.
        assert!(chain.touchpoint_weights["f1"] >= 0.3);
        assert!(chain.touchpoint_weights["m1"] >= 0.3);
        assert!(chain.touchpoint_weights["m2"] >= 0.3);
    }

    #[test]
    fn test_contact_with_nothing_yields_baseline() {
        let store = MemoryContactStore::new();
        let id = Uuid::new_v4();
        store.upsert_contact(Contact::new(id));

        let result = engine_over(store).attribute_contact(id).unwrap();
        assert!(result.chains.is_empty());
        assert!(result.timeline.is_empty());
        assert!((result.certainty - 0.70).abs() < EPSILON);
    }

    #[test]
    fn test_deal_predating_all_touchpoints_gets_empty_chain() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_activity(id, activity("a1", 10));
        store.record_activity(id, activity("a2", 7));
        store.record_meeting(id, meeting("m1", 4));
        // Deal predates every touchpoint.
        store.record_deal(deal("d1", id, 60));

        let result = engine_over(store).attribute_contact(id).unwrap();
        assert_eq!(result.timeline.len(), 3);

        let chain = &result.chains[0];
        assert!(chain.touchpoint_weights.is_empty());
        assert!(chain.significant_touchpoints.is_empty());
        assert_eq!(chain.total_touchpoints, 0);
        assert_eq!(chain.model, AttributionModel::FirstTouch);
        // Zero-touchpoint certainty path: no timeline-derived bonuses.
        assert!(chain.certainty < result.certainty + EPSILON);
    }

    #[test]
    fn test_attribution_is_idempotent() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_form(id, form("f1", 30));
        store.record_meeting(id, meeting("m1", 20));
        store.record_activity(id, activity("a1", 10));
        store.record_deal(deal("d1", id, 2));

        let engine = engine_over(store);
        let first = engine.attribute_contact(id).unwrap();
        let second = engine.attribute_contact(id).unwrap();
        assert_eq!(first.chains, second.chains);
        assert_eq!(first.certainty, second.certainty);
        assert_eq!(first.timeline, second.timeline);
    }

    #[test]
    fn test_explicit_model_override() {
        let store = MemoryContactStore::new();
        let id = contact_with_fields(&store);
        store.record_activity(id, activity("a1", 20));
        store.record_meeting(id, meeting("m1", 5));
        store.record_deal(deal("d1", id, 1));

        let engine = engine_over(store);
        let last_touch = engine
            .attribute_contact_with_model(id, AttributionModel::LastTouch)
            .unwrap();
        assert_eq!(last_touch.chains[0].model, AttributionModel::LastTouch);
        assert_eq!(last_touch.chains[0].touchpoint_weights["m1"], 1.0);

        let multi = engine
            .attribute_contact_with_model(id, AttributionModel::MultiTouch)
            .unwrap();
        assert_eq!(multi.chains[0].model, AttributionModel::MultiTouch);
        let sum: f64 = multi.chains[0].touchpoint_weights.values().sum();
        assert!((sum - 1.0).abs() < EPSILON);
        // Meeting outweighs activity under type weighting.
        assert!(
            multi.chains[0].touchpoint_weights["m1"]
                > multi.chains[0].touchpoint_weights["a1"]
        );
    }

    #[test]
    fn test_bulk_attribution_aggregates() {
        let store = MemoryContactStore::new();
        store.seed_demo_data();

        let engine = engine_over(store);
        let bulk = engine.attribute_all_contacts(50).unwrap();
        assert_eq!(bulk.contacts_processed, 3);
        assert_eq!(bulk.contacts_failed, 0);
        assert_eq!(bulk.total_deals, 2);
        assert!(bulk.total_touchpoints >= 6);
        assert!(bulk.avg_certainty > 0.0 && bulk.avg_certainty <= 0.98);
        assert!(bulk.most_effective_channel.is_some());

        let pct_sum = bulk.channel_totals.meeting_pct
            + bulk.channel_totals.form_pct
            + bulk.channel_totals.activity_pct;
        assert!((pct_sum - 100.0).abs() < 1e-6);

        let usage_total: u64 = bulk.model_usage.values().sum();
        assert_eq!(usage_total, bulk.total_deals);
    }

    #[test]
    fn test_bulk_sample_respects_configured_bound() {
        let store = MemoryContactStore::new();
        for _ in 0..20 {
            contact_with_fields(&store);
        }
        let config = AttributionConfig {
            max_bulk_sample: 5,
            ..AttributionConfig::default()
        };
        let engine = AttributionEngine::with_config(Arc::new(store), config);

        let bulk = engine.attribute_all_contacts(1000).unwrap();
        assert_eq!(bulk.contacts_processed, 5);
    }

    /// Store whose touchpoint reads fail for one poisoned contact.
    struct FlakyStore {
        inner: MemoryContactStore,
        poisoned: Uuid,
    }

    impl ContactStore for FlakyStore {
        fn contact(&self, id: Uuid) -> anyhow::Result<Option<Contact>> {
            self.inner.contact(id)
        }

        fn touchpoint_sources(&self, contact_id: Uuid) -> anyhow::Result<TouchpointSources> {
            if contact_id == self.poisoned {
                return Err(anyhow!("upstream read failed"));
            }
            self.inner.touchpoint_sources(contact_id)
        }

        fn deals_by_contact(&self, contact_id: Uuid) -> anyhow::Result<Vec<Deal>> {
            self.inner.deals_by_contact(contact_id)
        }

        fn contact_sample(&self, n: usize) -> anyhow::Result<Vec<Contact>> {
            self.inner.contact_sample(n)
        }
    }

    #[test]
    fn test_bulk_run_survives_single_contact_failure() {
        let inner = MemoryContactStore::new();
        let good = contact_with_fields(&inner);
        inner.record_meeting(good, meeting("m1", 5));
        let poisoned = contact_with_fields(&inner);

        let engine = AttributionEngine::new(Arc::new(FlakyStore { inner, poisoned }));
        let bulk = engine.attribute_all_contacts(10).unwrap();
        assert_eq!(bulk.contacts_processed, 1);
        assert_eq!(bulk.contacts_failed, 1);
    }
}
