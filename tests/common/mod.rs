// Shared test fakes for the network boundary and report collaborators
#![allow(dead_code)]

use async_trait::async_trait;
use ratewatch::chart::ChartRenderer;
use ratewatch::models::{Relay, SampleCount};
use ratewatch::relay_client::{
    Broadcaster, EventFilter, RecordStore, RelayConnection, RelayConnector, StoreError,
    StoredRecord, StreamSignal,
};
use ratewatch::upload::ImageHost;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

pub fn test_relay(key: &str) -> Relay {
    Relay {
        key: key.to_string(),
        url: format!("tcp/{key}.example:7447"),
        name: format!("Relay {key}"),
    }
}

/// What a scripted connection does once opened.
#[derive(Debug, Clone)]
pub enum Script {
    /// Emit these signals, then drop the channel. A script without a terminal
    /// signal models a connection dying mid-stream.
    Signals(Vec<StreamSignal>),
    FailConnect,
    FailSubscribe,
}

/// Connector replaying per-url scripts; unknown urls get the default script.
pub struct ScriptedConnector {
    pub scripts: HashMap<String, Script>,
    pub default: Script,
}

impl ScriptedConnector {
    pub fn all(default: Script) -> Self {
        Self {
            scripts: HashMap::new(),
            default,
        }
    }
}

#[async_trait]
impl RelayConnector for ScriptedConnector {
    async fn open(&self, url: &str) -> anyhow::Result<Box<dyn RelayConnection>> {
        let script = self
            .scripts
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        if matches!(script, Script::FailConnect) {
            anyhow::bail!("connection refused");
        }
        Ok(Box::new(ScriptedConnection { script }))
    }
}

struct ScriptedConnection {
    script: Script,
}

#[async_trait]
impl RelayConnection for ScriptedConnection {
    async fn subscribe(
        &mut self,
        _filter: EventFilter,
    ) -> anyhow::Result<mpsc::Receiver<StreamSignal>> {
        match &self.script {
            Script::FailConnect | Script::FailSubscribe => anyhow::bail!("subscribe rejected"),
            Script::Signals(signals) => {
                let (tx, rx) = mpsc::channel(16);
                let signals = signals.clone();
                tokio::spawn(async move {
                    for signal in signals {
                        if tx.send(signal).await.is_err() {
                            return;
                        }
                    }
                });
                Ok(rx)
            }
        }
    }
}

/// In-memory record store faithful to the wire convention: every put prepends
/// the 3-slot header, every get returns it.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(String, String), StoredRecord>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn record(&self, kind: &str, key: &str) -> Option<StoredRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&(kind.to_string(), key.to_string()))
            .cloned()
    }

    /// Stored point tags, header skipped.
    pub fn stored_values(&self, kind: &str, key: &str) -> Vec<(String, String)> {
        self.record(kind, key)
            .map(|r| r.tags[3..].to_vec())
            .unwrap_or_default()
    }

    /// Plants a raw record, bypassing put's header handling (for malformed-data cases).
    pub fn inject(&self, kind: &str, key: &str, record: StoredRecord) {
        self.records
            .lock()
            .unwrap()
            .insert((kind.to_string(), key.to_string()), record);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, kind: &str, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StoreError::Read("injected read failure".into()));
        }
        Ok(self.record(kind, key))
    }

    async fn put(
        &self,
        kind: &str,
        key: &str,
        title: &str,
        tags: Vec<(String, String)>,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Write("injected write failure".into()));
        }
        let mut all_tags = vec![
            ("d".to_string(), key.to_string()),
            ("title".to_string(), title.to_string()),
            ("published_at".to_string(), "0".to_string()),
        ];
        all_tags.extend(tags);
        self.inject(
            kind,
            key,
            StoredRecord {
                title: title.to_string(),
                tags: all_tags,
            },
        );
        Ok(())
    }
}

#[derive(Default)]
pub struct CapturingBroadcaster {
    pub messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Broadcaster for CapturingBroadcaster {
    async fn broadcast(&self, text: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub struct FakeChart;

impl ChartRenderer for FakeChart {
    fn render(&self, _title: &str, _entries: &[(String, SampleCount)]) -> anyhow::Result<Vec<u8>> {
        Ok(vec![0x89, 0x50, 0x4e, 0x47])
    }
}

pub struct FakeImageHost {
    pub fail: bool,
}

#[async_trait]
impl ImageHost for FakeImageHost {
    async fn upload_png(&self, _png: Vec<u8>) -> anyhow::Result<String> {
        if self.fail {
            anyhow::bail!("image host rejected upload");
        }
        Ok("https://images.example/abc123.png".to_string())
    }
}
