//! Scripted collaborators for beacon integration tests
//!
//! `ScriptedSource` hands out a fixed sequence of position results and
//! `RecordingSink` keeps every packet set it was asked to transmit.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use aprs_beacon::position::GeoPosition;
use aprs_beacon::position_source::PositionSource;
use aprs_beacon::transmission::{TransmissionResult, TransmissionSink};
use aprs_beacon::validation::StationIdentity;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

pub struct ScriptedSource {
    script: Mutex<VecDeque<Result<GeoPosition, String>>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<GeoPosition, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl PositionSource for ScriptedSource {
    async fn current_position(&self) -> Result<GeoPosition> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(position)) => Ok(position),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("script exhausted")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<(StationIdentity, Vec<String>)>>,
    pub fail_with: Option<String>,
}

impl RecordingSink {
    pub fn failing(reason: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(reason.to_string()),
        }
    }

    pub fn packets(&self) -> Vec<Vec<String>> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, packets)| packets.clone())
            .collect()
    }
}

#[async_trait]
impl TransmissionSink for RecordingSink {
    async fn transmit(
        &self,
        identity: &StationIdentity,
        packets: &[String],
    ) -> TransmissionResult {
        self.sent
            .lock()
            .unwrap()
            .push((identity.clone(), packets.to_vec()));
        match &self.fail_with {
            Some(reason) => TransmissionResult::failure(&identity.callsign, reason),
            None => TransmissionResult::success(&identity.callsign),
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Degrees of latitude spanning `meters` along a meridian
pub fn lat_offset(meters: f64) -> f64 {
    (meters / 6_371_000.0_f64).to_degrees()
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
