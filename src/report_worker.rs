// Ten-minute report: per-relay rates over the last window, a rendered chart,
// and a text broadcast. The chart, image host, and outbound feed are injected
// collaborators; any of them failing degrades the report instead of killing
// the worker.

use crate::arrival_repo::ArrivalRepo;
use crate::chart::ChartRenderer;
use crate::clock::TimeWindow;
use crate::models::{Relay, SampleCount};
use crate::relay_client::Broadcaster;
use crate::upload::ImageHost;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Reporting span: the ten minutes preceding each tick.
pub const REPORT_SPAN_MINUTES: u32 = 10;

/// Marker printed in place of a rate that could not be measured.
const MISSING_MARKER: &str = "missing";

pub struct ReportDeps {
    pub arrival_repo: Arc<ArrivalRepo>,
    pub relays: Arc<Vec<Relay>>,
    pub chart: Arc<dyn ChartRenderer>,
    pub image_host: Arc<dyn ImageHost>,
    pub broadcaster: Arc<dyn Broadcaster>,
    pub tick_rx: mpsc::Receiver<()>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

pub struct ReportConfig {
    /// Extra block appended between the per-relay lines and the image link.
    pub footer: Option<String>,
}

pub fn spawn(deps: ReportDeps, config: ReportConfig) -> tokio::task::JoinHandle<()> {
    let ReportDeps {
        arrival_repo,
        relays,
        chart,
        image_host,
        broadcaster,
        mut tick_rx,
        mut shutdown_rx,
    } = deps;

    tokio::spawn(async move {
        loop {
            tokio::select! {
                received = tick_rx.recv() => {
                    if received.is_none() {
                        break;
                    }
                    if let Err(e) = run_report(
                        &arrival_repo,
                        &relays,
                        &chart,
                        &image_host,
                        &broadcaster,
                        config.footer.as_deref(),
                        Local::now(),
                    )
                    .await
                    {
                        warn!(error = %e, "report tick failed");
                    }
                }
                _ = &mut shutdown_rx => {
                    debug!("Report worker shutting down");
                    break;
                }
            }
        }
    })
}

/// One report pass: sequential counts over the window, chart + upload, then
/// the text broadcast. A failed upload only costs the image link.
pub async fn run_report(
    arrival_repo: &ArrivalRepo,
    relays: &[Relay],
    chart: &Arc<dyn ChartRenderer>,
    image_host: &Arc<dyn ImageHost>,
    broadcaster: &Arc<dyn Broadcaster>,
    footer: Option<&str>,
    now: DateTime<Local>,
) -> anyhow::Result<()> {
    let window = TimeWindow::ending_at(now, REPORT_SPAN_MINUTES);

    let mut entries: Vec<(String, SampleCount)> = Vec::with_capacity(relays.len());
    for relay in relays {
        let count = arrival_repo.count(relay, &window).await;
        entries.push((relay.name.clone(), count));
    }

    let image_url = match render_and_upload(chart, image_host, &window, &entries).await {
        Ok(url) => url,
        Err(e) => {
            warn!(error = %e, "chart upload failed, report goes out without image");
            String::new()
        }
    };

    let text = format_report(&window, &entries, footer, &image_url);
    broadcaster.broadcast(&text).await?;
    Ok(())
}

async fn render_and_upload(
    chart: &Arc<dyn ChartRenderer>,
    image_host: &Arc<dyn ImageHost>,
    window: &TimeWindow,
    entries: &[(String, SampleCount)],
) -> anyhow::Result<String> {
    let title = format!(
        "Arrival rate {} {}-{}",
        window.from.format("%Y/%m/%d"),
        window.from.format("%H:%M"),
        window.to.format("%H:%M"),
    );
    let chart = chart.clone();
    let entries = entries.to_vec();
    let png = tokio::task::spawn_blocking(move || chart.render(&title, &entries)).await??;
    image_host.upload_png(png).await
}

/// Fixed report template: a header naming the window, one line per relay, an
/// optional footer block, and the image link last.
pub fn format_report(
    window: &TimeWindow,
    entries: &[(String, SampleCount)],
    footer: Option<&str>,
    image_url: &str,
) -> String {
    let mut text = format!(
        "[arrival rate]\n  {} {}-{}\n\n",
        window.from.format("%Y/%m/%d"),
        window.from.format("%H:%M"),
        window.to.format("%H:%M"),
    );
    for (name, count) in entries {
        match count {
            SampleCount::Known(n) => text.push_str(&format!("{name}: {n} posts\n")),
            SampleCount::Unknown => text.push_str(&format!("{name}: {MISSING_MARKER}\n")),
        }
    }
    if let Some(footer) = footer {
        text.push_str(&format!("\n{footer}\n"));
    }
    text.push_str(&format!("\n  {image_url}"));
    text
}
