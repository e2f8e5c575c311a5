// Per-minute ingestion: count the previous minute on every relay and append
// the sample to that relay's rolling and daily series. Relays run as
// independent tasks; one relay failing never blocks another.

use crate::arrival_repo::ArrivalRepo;
use crate::clock::{self, TimeWindow};
use crate::models::{Relay, SamplePoint};
use crate::series_repo::{self, SeriesRepo};
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Sampling span: one whole minute per tick.
pub const SAMPLE_SPAN_MINUTES: u32 = 1;

const REALTIME_TITLE: &str = "arrival rate realtime";
const DAILY_TITLE_PREFIX: &str = "arrival rate";

/// Repos, registry, channels, and shutdown for the worker.
pub struct IngestDeps {
    pub arrival_repo: Arc<ArrivalRepo>,
    pub series_repo: Arc<SeriesRepo>,
    pub relays: Arc<Vec<Relay>>,
    pub tick_rx: mpsc::Receiver<()>,
    pub samples_recorded_total: Arc<AtomicU64>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct IngestConfig {
    /// Retention cap of the rolling series, in points.
    pub rolling_cap: usize,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: IngestDeps, config: IngestConfig) -> tokio::task::JoinHandle<()> {
    let IngestDeps {
        arrival_repo,
        series_repo,
        relays,
        mut tick_rx,
        samples_recorded_total,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        let mut stats_log_tick =
            tokio::time::interval(Duration::from_secs(config.stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                received = tick_rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    run_tick(
                        &arrival_repo,
                        &series_repo,
                        &relays,
                        config.rolling_cap,
                        &samples_recorded_total,
                        Local::now(),
                    );
                }
                _ = &mut shutdown_rx => {
                    debug!("Ingest worker shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    info!(
                        samples_recorded_total =
                            samples_recorded_total.load(Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    })
}

/// Starts one ingestion task per relay and returns without waiting for them.
/// A tick overlapping a slow previous tick can race on the same series key;
/// the store is last-write-wins and the next tick re-reads fresh state.
pub fn run_tick(
    arrival_repo: &Arc<ArrivalRepo>,
    series_repo: &Arc<SeriesRepo>,
    relays: &Arc<Vec<Relay>>,
    rolling_cap: usize,
    samples_recorded_total: &Arc<AtomicU64>,
    now: DateTime<Local>,
) {
    for relay in relays.iter() {
        let arrival_repo = arrival_repo.clone();
        let series_repo = series_repo.clone();
        let relay = relay.clone();
        let samples_recorded_total = samples_recorded_total.clone();
        tokio::spawn(async move {
            match ingest_relay(&arrival_repo, &series_repo, &relay, rolling_cap, now).await {
                Ok(()) => {
                    samples_recorded_total.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!(relay = %relay.key, error = %e, "ingestion tick failed");
                }
            }
        });
    }
}

/// One relay's tick: count the minute preceding `now`, then append the sample
/// to the rolling series (capped) and the daily series (uncapped). Both
/// appends read a fresh snapshot; a store failure ends this relay's tick only
/// and the next schedule fire retries against re-read state.
pub async fn ingest_relay(
    arrival_repo: &ArrivalRepo,
    series_repo: &SeriesRepo,
    relay: &Relay,
    rolling_cap: usize,
    now: DateTime<Local>,
) -> anyhow::Result<()> {
    let window = TimeWindow::ending_at(now, SAMPLE_SPAN_MINUTES);
    let count = arrival_repo.count(relay, &window).await;

    let stamp = window.sample_instant();
    let label = clock::format_label(&stamp);
    let day = clock::format_day(&stamp);
    debug!(relay = %relay.key, label, count = ?count, "sampled");

    let point = SamplePoint { label, count };
    series_repo
        .append(
            &series_repo::rolling_key(&relay.key),
            REALTIME_TITLE,
            point.clone(),
            Some(rolling_cap),
        )
        .await?;
    series_repo
        .append(
            &series_repo::daily_key(&relay.key, &day),
            &format!("{DAILY_TITLE_PREFIX} {day}"),
            point,
            None,
        )
        .await?;
    Ok(())
}
