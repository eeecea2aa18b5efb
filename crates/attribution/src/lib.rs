//! Multi-touch marketing attribution — assembles a contact's cross-platform
//! interaction timeline, classifies the journey shape, distributes deal
//! credit across touchpoints, and scores how certain the result is.

pub mod allocator;
pub mod certainty;
pub mod classifier;
pub mod engine;
pub mod influence;
pub mod normalizer;
pub mod stats;
pub mod timeline;

pub use classifier::AttributionModel;
pub use engine::{AttributionChain, AttributionEngine, BulkAttribution, ContactAttribution};
pub use influence::{ChannelInfluence, ChannelStat};
pub use stats::{AttributionStats, DateRange};
