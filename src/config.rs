use crate::models::Relay;
use serde::Deserialize;
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub sampling: SamplingConfig,
    pub report: ReportConfig,
    pub monitoring: MonitoringConfig,
    pub relays: Vec<Relay>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Endpoint of the relay that holds the shared record store and the
    /// report outbox.
    pub relay_url: String,
    #[serde(default = "default_records_prefix")]
    pub records_prefix: String,
    #[serde(default = "default_outbox_key")]
    pub outbox_key: String,
    /// Retention cap of each rolling series, in points (hard cap, drop-oldest).
    #[serde(default = "default_rolling_cap")]
    pub rolling_cap: usize,
}

fn default_records_prefix() -> String {
    "records".into()
}

fn default_outbox_key() -> String {
    "reports/arrival-rate".into()
}

fn default_rolling_cap() -> usize {
    1440
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplingConfig {
    /// Cron expression of the per-minute sampling tick. Uses local time.
    #[serde(default = "default_sample_schedule")]
    pub schedule: String,
    /// Event kinds counted toward the arrival rate.
    #[serde(default = "default_event_kinds")]
    pub event_kinds: Vec<u32>,
    /// Key-expression prefix the monitored nodes publish their events under.
    #[serde(default = "default_events_prefix")]
    pub events_prefix: String,
}

fn default_sample_schedule() -> String {
    "0 * * * * *".into()
}

fn default_event_kinds() -> Vec<u32> {
    vec![1]
}

fn default_events_prefix() -> String {
    "events".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Cron expression of the report tick. Uses local time.
    #[serde(default = "default_report_schedule")]
    pub schedule: String,
    pub image_host_url: String,
    /// Extra block appended to the report text, e.g. a site link.
    pub footer: Option<String>,
}

fn default_report_schedule() -> String {
    "0 */10 * * * *".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (samples recorded) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.storage.relay_url.is_empty(),
            "storage.relay_url must be non-empty"
        );
        anyhow::ensure!(
            self.storage.rolling_cap > 0,
            "storage.rolling_cap must be > 0, got {}",
            self.storage.rolling_cap
        );
        anyhow::ensure!(
            !self.storage.outbox_key.is_empty(),
            "storage.outbox_key must be non-empty"
        );
        cron::Schedule::from_str(&self.sampling.schedule).map_err(|e| {
            anyhow::anyhow!(
                "sampling.schedule is not a valid cron expression ({}): {e}",
                self.sampling.schedule
            )
        })?;
        cron::Schedule::from_str(&self.report.schedule).map_err(|e| {
            anyhow::anyhow!(
                "report.schedule is not a valid cron expression ({}): {e}",
                self.report.schedule
            )
        })?;
        anyhow::ensure!(
            !self.sampling.event_kinds.is_empty(),
            "sampling.event_kinds must name at least one kind"
        );
        anyhow::ensure!(
            !self.report.image_host_url.is_empty(),
            "report.image_host_url must be non-empty"
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(!self.relays.is_empty(), "at least one relay is required");
        let mut keys = HashSet::new();
        for relay in &self.relays {
            anyhow::ensure!(!relay.key.is_empty(), "relay key must be non-empty");
            anyhow::ensure!(
                !relay.url.is_empty(),
                "relay {} must have a non-empty url",
                relay.key
            );
            anyhow::ensure!(
                !relay.name.is_empty(),
                "relay {} must have a non-empty name",
                relay.key
            );
            anyhow::ensure!(
                keys.insert(relay.key.as_str()),
                "duplicate relay key {}",
                relay.key
            );
        }
        Ok(())
    }
}
