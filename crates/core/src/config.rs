use serde::Deserialize;

/// Root application configuration. Loaded from environment variables with
/// the prefix `REVLENS__`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub attribution: AttributionConfig,
}

/// Tuning knobs for the attribution engine. The defaults are the values the
/// engine was calibrated with; deployments tuning against a real dataset
/// override them per field.
#[derive(Debug, Clone, Deserialize)]
pub struct AttributionConfig {
    /// Minimum weight for a touchpoint to count as significant in reports.
    #[serde(default = "default_significance_threshold")]
    pub significance_threshold: f64,
    /// Time-decay window for the multi-touch model, in days. Touchpoints
    /// older than this relative to the deal cutoff bottom out at half
    /// weight.
    #[serde(default = "default_decay_window_days")]
    pub decay_window_days: i64,
    /// Hard ceiling on attribution certainty. Total certainty is
    /// disallowed: no data source is ever perfectly verifiable.
    #[serde(default = "default_certainty_cap")]
    pub certainty_cap: f64,
    /// Certainty at or above which a result counts toward the
    /// high-certainty rate in bulk analytics.
    #[serde(default = "default_high_certainty_threshold")]
    pub high_certainty_threshold: f64,
    /// Upper bound on how many contacts a bulk run will sample.
    #[serde(default = "default_max_bulk_sample")]
    pub max_bulk_sample: usize,
    /// Bound on concurrent store reads during a bulk run. A load knob for
    /// the store, not an ordering guarantee.
    #[serde(default = "default_bulk_batch_size")]
    pub bulk_batch_size: usize,
}

fn default_significance_threshold() -> f64 {
    0.1
}
fn default_decay_window_days() -> i64 {
    90
}
fn default_certainty_cap() -> f64 {
    0.98
}
fn default_high_certainty_threshold() -> f64 {
    0.85
}
fn default_max_bulk_sample() -> usize {
    500
}
fn default_bulk_batch_size() -> usize {
    32
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            significance_threshold: default_significance_threshold(),
            decay_window_days: default_decay_window_days(),
            certainty_cap: default_certainty_cap(),
            high_certainty_threshold: default_high_certainty_threshold(),
            max_bulk_sample: default_max_bulk_sample(),
            bulk_batch_size: default_bulk_batch_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("REVLENS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
