// Image host upload: JSON POST with a base64 payload, client id from the
// environment. The blocking HTTP client runs off the async runtime.

use async_trait::async_trait;
use base64::Engine;
use serde_json::Value;
use tracing::warn;

pub const CLIENT_ID_ENV: &str = "IMAGE_HOST_CLIENT_ID";

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads a PNG and returns its public link.
    async fn upload_png(&self, png: Vec<u8>) -> anyhow::Result<String>;
}

pub struct HttpImageHost {
    endpoint: String,
    client_id: Option<String>,
}

impl HttpImageHost {
    /// Reads the client id from `IMAGE_HOST_CLIENT_ID`. A missing id is not
    /// fatal at startup; uploads will fail per-report and the report goes out
    /// without an image.
    pub fn from_env(endpoint: &str) -> Self {
        let client_id = std::env::var(CLIENT_ID_ENV).ok();
        if client_id.is_none() {
            warn!("{CLIENT_ID_ENV} is not set; chart uploads will be skipped");
        }
        Self {
            endpoint: endpoint.to_string(),
            client_id,
        }
    }
}

#[async_trait]
impl ImageHost for HttpImageHost {
    async fn upload_png(&self, png: Vec<u8>) -> anyhow::Result<String> {
        let Some(client_id) = self.client_id.clone() else {
            anyhow::bail!("no image host client id configured");
        };
        let endpoint = self.endpoint.clone();

        tokio::task::spawn_blocking(move || {
            let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
            let mut response = ureq::post(&endpoint)
                .header("Authorization", &format!("Client-ID {client_id}"))
                .send_json(serde_json::json!({ "image": encoded }))?;
            let body: Value = response.body_mut().read_json()?;
            body.pointer("/data/link")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("upload response carried no link"))
        })
        .await?
    }
}
