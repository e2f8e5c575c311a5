use anyhow::Result;
use ratewatch::*;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let store = Arc::new(
        zenoh_client::ZenohStore::connect(
            &app_config.storage.relay_url,
            &app_config.storage.records_prefix,
            &app_config.storage.outbox_key,
        )
        .await?,
    );
    let connector = Arc::new(zenoh_client::ZenohConnector::new(
        app_config.sampling.events_prefix.clone(),
    ));

    let arrival_repo = Arc::new(arrival_repo::ArrivalRepo::new(
        connector,
        app_config.sampling.event_kinds.clone(),
    ));
    let series_repo = Arc::new(series_repo::SeriesRepo::new(store.clone()));
    let relays = Arc::new(app_config.relays.clone());

    // Schedules were validated during config load.
    let sample_schedule = cron::Schedule::from_str(&app_config.sampling.schedule)?;
    let report_schedule = cron::Schedule::from_str(&app_config.report.schedule)?;
    let (sample_tick_tx, sample_tick_rx) = tokio::sync::mpsc::channel(1);
    scheduler::spawn(sample_schedule, sample_tick_tx);
    let (report_tick_tx, report_tick_rx) = tokio::sync::mpsc::channel(1);
    scheduler::spawn(report_schedule, report_tick_tx);

    let samples_recorded_total = Arc::new(AtomicU64::new(0));
    let (ingest_shutdown_tx, ingest_shutdown_rx) = tokio::sync::oneshot::channel();
    let (report_shutdown_tx, report_shutdown_rx) = tokio::sync::oneshot::channel();

    let ingest_handle = ingest_worker::spawn(
        ingest_worker::IngestDeps {
            arrival_repo: arrival_repo.clone(),
            series_repo,
            relays: relays.clone(),
            tick_rx: sample_tick_rx,
            samples_recorded_total,
            shutdown_rx: ingest_shutdown_rx,
        },
        ingest_worker::IngestConfig {
            rolling_cap: app_config.storage.rolling_cap,
            stats_log_interval_secs: app_config.monitoring.stats_log_interval_secs,
        },
    );

    let image_host = Arc::new(upload::HttpImageHost::from_env(
        &app_config.report.image_host_url,
    ));
    let chart = Arc::new(chart::BarChartRenderer);
    let report_handle = report_worker::spawn(
        report_worker::ReportDeps {
            arrival_repo,
            relays,
            chart,
            image_host,
            broadcaster: store,
            tick_rx: report_tick_rx,
            shutdown_rx: report_shutdown_rx,
        },
        report_worker::ReportConfig {
            footer: app_config.report.footer.clone(),
        },
    );

    tracing::info!(relays = app_config.relays.len(), "ratewatch running");

    wait_for_shutdown().await;
    tracing::info!("Received shutdown signal");
    let _ = ingest_shutdown_tx.send(());
    let _ = report_shutdown_tx.send(());
    let _ = ingest_handle.await;
    let _ = report_handle.await;

    Ok(())
}

async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
