// Event arrival counting, one subscription per call. The first terminal
// signal wins: an error resolves to missing data even when events were
// already counted. Partial counts are never reported.

use crate::clock::TimeWindow;
use crate::models::{Relay, SampleCount};
use crate::relay_client::{EventFilter, RelayConnector, StreamSignal};
use std::sync::Arc;
use tracing::debug;

pub struct ArrivalRepo {
    connector: Arc<dyn RelayConnector>,
    kinds: Vec<u32>,
}

impl ArrivalRepo {
    pub fn new(connector: Arc<dyn RelayConnector>, kinds: Vec<u32>) -> Self {
        Self { connector, kinds }
    }

    /// Counts events on `relay` inside `window`. Never fails: every
    /// connection or stream problem resolves as `Unknown`.
    pub async fn count(&self, relay: &Relay, window: &TimeWindow) -> SampleCount {
        let filter = EventFilter {
            kinds: self.kinds.clone(),
            since: window.since_unix(),
            until: window.until_unix(),
        };

        let mut conn = match self.connector.open(&relay.url).await {
            Ok(conn) => conn,
            Err(e) => {
                debug!(relay = %relay.key, error = %e, "connect failed");
                return SampleCount::Unknown;
            }
        };
        let mut rx = match conn.subscribe(filter).await {
            Ok(rx) => rx,
            Err(e) => {
                debug!(relay = %relay.key, error = %e, "subscribe failed");
                return SampleCount::Unknown;
            }
        };

        let mut count: u64 = 0;
        while let Some(signal) = rx.recv().await {
            match signal {
                StreamSignal::Event => count += 1,
                StreamSignal::EndOfStream => return SampleCount::Known(count),
                StreamSignal::Error(e) => {
                    debug!(relay = %relay.key, error = %e, "subscription error, sample dropped");
                    return SampleCount::Unknown;
                }
            }
        }

        // Channel closed without a terminal signal: the connection died.
        debug!(relay = %relay.key, "subscription closed without end-of-stream");
        SampleCount::Unknown
    }
}
