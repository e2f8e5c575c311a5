// Cron tick source. Sends on `tx` at each schedule fire. Uses local time.

use cron::Schedule;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

pub fn spawn(schedule: Schedule, tx: mpsc::Sender<()>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = chrono::Local::now();
            let Some(next) = schedule.after(&now).next() else {
                warn!("schedule has no upcoming fire times");
                return;
            };
            let delay = (next - now).to_std().unwrap_or(Duration::from_secs(1));
            tokio::time::sleep(delay).await;
            if tx.send(()).await.is_err() {
                break;
            }
        }
    })
}
