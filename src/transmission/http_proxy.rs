use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{TransmissionResult, TransmissionSink};
use crate::validation::StationIdentity;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Request body understood by the APRS-IS HTTP proxy
#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    callsign: &'a str,
    passcode: &'a str,
    packet: &'a str,
}

// The proxy may answer with a JSON status; anything else is judged by HTTP status alone
#[derive(Debug, Deserialize)]
struct ProxyResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Sink that relays packets through an HTTP proxy, which owns the APRS-IS
/// connection and login on our behalf
pub struct HttpProxySink {
    client: reqwest::Client,
    url: String,
}

impl HttpProxySink {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }

    /// Build a sink with its own HTTP client
    pub fn with_url<S: Into<String>>(url: S) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("aprs-beacon/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self::new(client, url.into()))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post_packet(&self, identity: &StationIdentity, packet: &str) -> Result<()> {
        let body = ProxyRequest {
            callsign: &identity.callsign,
            passcode: &identity.passcode,
            packet,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("Failed to send request to {}: {}", self.url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP error! status: {}", status));
        }

        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read proxy response: {}", e))?;

        if let Ok(reply) = serde_json::from_str::<ProxyResponse>(&text)
            && !reply.success
        {
            return Err(anyhow!(
                "Proxy rejected packet: {}",
                reply.message.unwrap_or_else(|| "no reason given".to_string())
            ));
        }

        debug!("Proxy accepted packet: {}", packet);
        Ok(())
    }
}

#[async_trait]
impl TransmissionSink for HttpProxySink {
    #[tracing::instrument(skip(self, identity, packets), fields(callsign = %identity.callsign, count = packets.len()))]
    async fn transmit(
        &self,
        identity: &StationIdentity,
        packets: &[String],
    ) -> TransmissionResult {
        if packets.is_empty() {
            return TransmissionResult::failure(&identity.callsign, "no packets to send");
        }

        for packet in packets {
            if let Err(e) = self.post_packet(identity, packet).await {
                error!("Transmission via {} failed: {}", self.url, e);
                return TransmissionResult::failure(&identity.callsign, e);
            }
        }

        info!(
            "Transmitted {} packet(s) for {} via {}",
            packets.len(),
            identity.callsign,
            self.url
        );
        TransmissionResult::success(&identity.callsign)
    }

    fn name(&self) -> &'static str {
        "http-proxy"
    }
}
