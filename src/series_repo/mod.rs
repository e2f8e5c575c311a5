// Network-stored time series. Each series is one replaceable record; the
// store has no append primitive, so every write re-sends the full history.

mod codec;

use crate::models::{SamplePoint, SeriesRecord};
use crate::relay_client::{RecordStore, StoreError};
use std::sync::Arc;
use tracing::instrument;

/// Record namespace (and key prefix) for every series this app owns.
pub const METRIC: &str = "arrival-rate";

/// Key of the capped rolling series for a relay.
pub fn rolling_key(relay_key: &str) -> String {
    format!("{METRIC}_{relay_key}")
}

/// Key of the per-calendar-day series for a relay. A new key starts at
/// midnight, so daily series never need truncation.
pub fn daily_key(relay_key: &str, day: &str) -> String {
    format!("{METRIC}_{relay_key}_{day}")
}

pub struct SeriesRepo {
    store: Arc<dyn RecordStore>,
}

impl SeriesRepo {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Current history for `key`. A record that does not exist, or whose tag
    /// sequence is unreadable, is an empty series, never an error; only a
    /// transport failure surfaces.
    #[instrument(skip(self), fields(repo = "series", operation = "get"))]
    pub async fn get(&self, key: &str) -> Result<SeriesRecord, StoreError> {
        let Some(stored) = self.store.get(METRIC, key).await? else {
            return Ok(SeriesRecord::empty());
        };
        if !codec::header_matches(&stored.tags, key) {
            tracing::debug!(key, "stored record header mismatch, treating as empty");
            return Ok(SeriesRecord {
                title: stored.title,
                points: Vec::new(),
            });
        }
        Ok(SeriesRecord {
            points: codec::decode_points(&stored.tags),
            title: stored.title,
        })
    }

    /// Appends one point and republishes the full record. With `cap`, only
    /// the newest `cap` points are kept, dropping oldest first. Each call
    /// reads a fresh snapshot; there is no retry here, the next scheduled
    /// tick re-reads whatever state the store ends up with.
    #[instrument(skip(self, point), fields(repo = "series", operation = "append"))]
    pub async fn append(
        &self,
        key: &str,
        title: &str,
        point: SamplePoint,
        cap: Option<usize>,
    ) -> Result<(), StoreError> {
        let mut points = self.get(key).await?.points;
        points.push(point);
        if let Some(cap) = cap
            && points.len() > cap
        {
            points.drain(..points.len() - cap);
        }
        self.store
            .put(METRIC, key, title, codec::encode_points(&points))
            .await
    }
}
