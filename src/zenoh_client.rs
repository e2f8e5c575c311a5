// Zenoh implementations of the network boundary. Counting opens a fresh
// client-mode session per call and replays the node's stored events through a
// time-filtered get; records live as replaceable key-value entries on the
// storage relay, one long-lived session for all of them.

use crate::relay_client::{
    Broadcaster, EventFilter, HEADER_TAGS, RecordStore, RelayConnection, RelayConnector,
    StoreError, StoredRecord, StreamSignal,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use zenoh::Session;

const SIGNAL_BUFFER: usize = 256;

fn client_config(endpoint: &str) -> anyhow::Result<zenoh::Config> {
    let mut config = zenoh::Config::default();
    config
        .insert_json5("mode", "\"client\"")
        .map_err(|e| anyhow::anyhow!("zenoh config mode: {e}"))?;
    config
        .insert_json5("connect/endpoints", &serde_json::to_string(&[endpoint])?)
        .map_err(|e| anyhow::anyhow!("zenoh config endpoints: {e}"))?;
    Ok(config)
}

fn rfc3339(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .map(|t| t.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_default()
}

/// Opens one session per counting call. Sessions are not pooled or reused.
pub struct ZenohConnector {
    events_prefix: String,
}

impl ZenohConnector {
    pub fn new(events_prefix: impl Into<String>) -> Self {
        Self {
            events_prefix: events_prefix.into(),
        }
    }
}

#[async_trait]
impl RelayConnector for ZenohConnector {
    async fn open(&self, url: &str) -> anyhow::Result<Box<dyn RelayConnection>> {
        let session = zenoh::open(client_config(url)?)
            .await
            .map_err(|e| anyhow::anyhow!("open {url}: {e}"))?;
        Ok(Box::new(ZenohRelayConnection {
            session: Arc::new(session),
            events_prefix: self.events_prefix.clone(),
        }))
    }
}

struct ZenohRelayConnection {
    session: Arc<Session>,
    events_prefix: String,
}

#[async_trait]
impl RelayConnection for ZenohRelayConnection {
    async fn subscribe(
        &mut self,
        filter: EventFilter,
    ) -> anyhow::Result<mpsc::Receiver<StreamSignal>> {
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        let time_range = format!("_time=[{}..{}]", rfc3339(filter.since), rfc3339(filter.until));
        let selectors: Vec<String> = filter
            .kinds
            .iter()
            .map(|kind| format!("{}/{kind}/**?{time_range}", self.events_prefix))
            .collect();

        // The session clone keeps the connection alive until the replay is
        // drained, even if the caller drops the connection handle early.
        let session = self.session.clone();
        tokio::spawn(async move {
            for selector in selectors {
                let replies = match session.get(selector.as_str()).await {
                    Ok(r) => r,
                    Err(e) => {
                        let _ = tx.send(StreamSignal::Error(e.to_string())).await;
                        return;
                    }
                };
                while let Ok(reply) = replies.recv_async().await {
                    match reply.result() {
                        Ok(_) => {
                            if tx.send(StreamSignal::Event).await.is_err() {
                                return;
                            }
                        }
                        Err(err) => {
                            let reason =
                                String::from_utf8_lossy(&err.payload().to_bytes()).into_owned();
                            let _ = tx.send(StreamSignal::Error(reason)).await;
                            return;
                        }
                    }
                }
            }
            let _ = tx.send(StreamSignal::EndOfStream).await;
        });
        Ok(rx)
    }
}

/// Record store and report outbox on the storage relay. One session for the
/// lifetime of the process.
pub struct ZenohStore {
    session: Session,
    records_prefix: String,
    outbox_key: String,
}

impl ZenohStore {
    pub async fn connect(
        endpoint: &str,
        records_prefix: &str,
        outbox_key: &str,
    ) -> anyhow::Result<Self> {
        let session = zenoh::open(client_config(endpoint)?)
            .await
            .map_err(|e| anyhow::anyhow!("open {endpoint}: {e}"))?;
        Ok(Self {
            session,
            records_prefix: records_prefix.to_string(),
            outbox_key: outbox_key.to_string(),
        })
    }

    fn record_keyexpr(&self, kind: &str, key: &str) -> String {
        format!("{}/{kind}/{key}", self.records_prefix)
    }
}

/// Header region written in front of every stored tag sequence. Readers skip
/// exactly `HEADER_TAGS` positions, so the shape here must not grow without a
/// matching codec change.
fn header_tags(key: &str, title: &str) -> Vec<(String, String)> {
    let published_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    vec![
        ("d".to_string(), key.to_string()),
        ("title".to_string(), title.to_string()),
        ("published_at".to_string(), published_at.to_string()),
    ]
}

#[async_trait]
impl RecordStore for ZenohStore {
    async fn get(&self, kind: &str, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let keyexpr = self.record_keyexpr(kind, key);
        let replies = self
            .session
            .get(keyexpr.as_str())
            .await
            .map_err(|e| StoreError::Read(e.to_string()))?;
        while let Ok(reply) = replies.recv_async().await {
            match reply.result() {
                Ok(sample) => {
                    let bytes = sample.payload().to_bytes();
                    return match serde_json::from_slice::<StoredRecord>(&bytes) {
                        Ok(record) => Ok(Some(record)),
                        Err(e) => {
                            // Unreadable payloads count as absent, same as a
                            // record that was never written.
                            tracing::debug!(key, error = %e, "stored record payload unreadable");
                            Ok(None)
                        }
                    };
                }
                Err(err) => {
                    let reason = String::from_utf8_lossy(&err.payload().to_bytes()).into_owned();
                    return Err(StoreError::Read(reason));
                }
            }
        }
        Ok(None)
    }

    async fn put(
        &self,
        kind: &str,
        key: &str,
        title: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        let mut all_tags = header_tags(key, title);
        all_tags.reserve(tags.len());
        all_tags.extend(tags);
        debug_assert!(all_tags.len() >= HEADER_TAGS);

        let record = StoredRecord {
            title: title.to_string(),
            tags: all_tags,
        };
        let payload = serde_json::to_vec(&record).map_err(|e| StoreError::Write(e.to_string()))?;
        self.session
            .put(self.record_keyexpr(kind, key), payload)
            .await
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}

#[async_trait]
impl Broadcaster for ZenohStore {
    async fn broadcast(&self, text: &str) -> anyhow::Result<()> {
        self.session
            .put(self.outbox_key.as_str(), text.as_bytes().to_vec())
            .await
            .map_err(|e| anyhow::anyhow!("broadcast: {e}"))
    }
}
