use std::time::Duration;

use galaxy_core::GalaxyError;
use reqwest::blocking::Client;
use tracing::debug;

use crate::interact::Transport;

/// Default request timeout for the alien proxy.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Posts modulated payloads to `{base}/aliens/send?apiKey=...`.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(
        server_url: &str,
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, GalaxyError> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .user_agent(concat!("galaxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GalaxyError::transport(format!("failed to create http client: {e}")))?;
        Ok(HttpTransport {
            client,
            endpoint: endpoint(server_url),
            api_key: api_key.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn endpoint(server_url: &str) -> String {
    format!("{}/aliens/send", server_url.trim_end_matches('/'))
}

impl Transport for HttpTransport {
    fn send(&mut self, bits: &str) -> Result<String, GalaxyError> {
        debug!(endpoint = %self.endpoint, bits, "aliens/send");
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[("apiKey", self.api_key.as_str())])
            .body(bits.to_string())
            .send()
            .map_err(|e| GalaxyError::transport(format!("request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(GalaxyError::transport(format!(
                "aliens/send failed ({status}): {}",
                body.trim()
            )));
        }
        let reply = resp
            .text()
            .map_err(|e| GalaxyError::transport(format!("failed to read response: {e}")))?;
        debug!(reply = %reply.trim(), "aliens/send reply");
        Ok(reply.trim().to_string())
    }
}
