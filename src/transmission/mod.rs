mod http_proxy;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::validation::StationIdentity;

pub use http_proxy::HttpProxySink;

/// Outcome of handing a packet set to a transmission sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmissionResult {
    pub success: bool,
    /// Human-readable description of what happened
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub callsign: Option<String>,
}

impl TransmissionResult {
    pub fn success(callsign: &str) -> Self {
        Self {
            success: true,
            message: format!("APRS packet transmitted successfully for {}", callsign),
            timestamp: Utc::now(),
            callsign: Some(callsign.to_string()),
        }
    }

    pub fn failure<E: std::fmt::Display>(callsign: &str, reason: E) -> Self {
        Self {
            success: false,
            message: format!("Failed to transmit APRS packet: {}", reason),
            timestamp: Utc::now(),
            callsign: Some(callsign.to_string()),
        }
    }
}

/// Trait for services that deliver packets to the APRS network
///
/// Implementations never return an error; transport failures are reported in the
/// returned [`TransmissionResult`] and retry policy is left to the caller.
#[async_trait]
pub trait TransmissionSink: Send + Sync {
    /// Deliver the packets in order
    async fn transmit(&self, identity: &StationIdentity, packets: &[String])
    -> TransmissionResult;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Dry-run sink that only logs what would have been sent
#[derive(Debug, Default, Clone)]
pub struct LogSink;

#[async_trait]
impl TransmissionSink for LogSink {
    async fn transmit(
        &self,
        identity: &StationIdentity,
        packets: &[String],
    ) -> TransmissionResult {
        for packet in packets {
            info!("[dry-run] {}", packet);
        }
        TransmissionResult::success(&identity.callsign)
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
