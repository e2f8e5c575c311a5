// Network boundary: counting subscriptions, the shared record store, and the
// outbound report feed. Implementations own the wire protocol; everything
// above this line sees only these traits, so tests can substitute fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// One signal from a counting subscription: zero or more `Event`s followed by
/// exactly one terminal signal. A channel that closes without a terminal is a
/// dead connection and must be treated like an error by the consumer.
#[derive(Debug, Clone)]
pub enum StreamSignal {
    Event,
    EndOfStream,
    Error(String),
}

/// Subscription filter: event kinds and a half-open unix-second window.
#[derive(Debug, Clone)]
pub struct EventFilter {
    pub kinds: Vec<u32>,
    pub since: i64,
    pub until: i64,
}

#[async_trait]
pub trait RelayConnection: Send {
    /// Opens one subscription on this connection and returns its signal stream.
    async fn subscribe(&mut self, filter: EventFilter)
    -> anyhow::Result<mpsc::Receiver<StreamSignal>>;
}

#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn open(&self, url: &str) -> anyhow::Result<Box<dyn RelayConnection>>;
}

/// Number of leading tag positions reserved for the store implementation's
/// header. Readers skip them; writers fill them.
pub const HEADER_TAGS: usize = 3;

/// A replaceable record as it travels over the wire: a title plus ordered
/// label/value tag pairs, header region included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub title: String,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record read failed: {0}")]
    Read(String),
    #[error("record write failed: {0}")]
    Write(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Latest record under `(kind, key)`, or `None` when nothing readable is
    /// stored there. Only transport problems are errors.
    async fn get(&self, kind: &str, key: &str) -> Result<Option<StoredRecord>, StoreError>;

    /// Replaces the record under `(kind, key)`. The store is last-write-wins
    /// with no merge, so `tags` must carry the complete point sequence; the
    /// implementation prepends its own header region.
    async fn put(
        &self,
        kind: &str,
        key: &str,
        title: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Publishes a text report onto the network.
    async fn broadcast(&self, text: &str) -> anyhow::Result<()>;
}
