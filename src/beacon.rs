use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::activity::{ActivityLevel, ActivityLog};
use crate::packet::{AprsPath, PacketEncoder, PacketFormat};
use crate::position::{DEFAULT_MAX_POSITION_AGE_MS, GeoPosition};
use crate::position_source::PositionSource;
use crate::settings::DEFAULT_SCHEDULE_INTERVAL;
use crate::speed::backfill_speed;
use crate::transmission::{TransmissionResult, TransmissionSink};
use crate::validation::StationIdentity;
use crate::wake_lock::WakeLock;

/// Configuration for the beacon service
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    pub identity: StationIdentity,
    /// Free text appended to each position report
    pub comment: Option<String>,
    /// When set, a status report follows each position report
    pub status: Option<String>,
    pub interval: Duration,
    pub path: AprsPath,
    /// Use the `@DDHHMMz` position form, stamped with the fix time
    pub timestamped: bool,
    /// Fixes older than this are not transmitted
    pub max_position_age_ms: i64,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            identity: StationIdentity::new("N0CALL", ""),
            comment: None,
            status: None,
            interval: Duration::from_secs(DEFAULT_SCHEDULE_INTERVAL),
            path: AprsPath::default(),
            timestamped: false,
            max_position_age_ms: DEFAULT_MAX_POSITION_AGE_MS,
        }
    }
}

/// Builder pattern for creating beacon configurations
pub struct BeaconConfigBuilder {
    config: BeaconConfig,
}

impl BeaconConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: BeaconConfig::default(),
        }
    }

    pub fn identity(mut self, identity: StationIdentity) -> Self {
        self.config.identity = identity;
        self
    }

    pub fn comment<S: Into<String>>(mut self, comment: Option<S>) -> Self {
        self.config.comment = comment.map(|c| c.into());
        self
    }

    pub fn status<S: Into<String>>(mut self, status: Option<S>) -> Self {
        self.config.status = status.map(|s| s.into());
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn path(mut self, path: AprsPath) -> Self {
        self.config.path = path;
        self
    }

    pub fn timestamped(mut self, timestamped: bool) -> Self {
        self.config.timestamped = timestamped;
        self
    }

    pub fn max_position_age_ms(mut self, max_age_ms: i64) -> Self {
        self.config.max_position_age_ms = max_age_ms;
        self
    }

    pub fn build(self) -> BeaconConfig {
        self.config
    }
}

impl Default for BeaconConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened during one beacon cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Packets were handed to the sink and it reported success
    Transmitted {
        packets: Vec<String>,
        result: TransmissionResult,
    },
    /// Packets were built but the sink reported failure
    TransmitFailed {
        packets: Vec<String>,
        result: TransmissionResult,
    },
    /// The position source failed; nothing was sent
    NoPosition { message: String },
    /// The fix was too old to beacon
    StalePosition { position: GeoPosition },
}

impl CycleOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CycleOutcome::Transmitted { .. })
    }
}

/// Periodically acquires a position, encodes it, and hands it to a sink
pub struct Beacon {
    config: BeaconConfig,
    source: Arc<dyn PositionSource>,
    sink: Arc<dyn TransmissionSink>,
    wake_lock: Option<WakeLock>,
    last_position: Option<GeoPosition>,
    activity: ActivityLog,
}

impl Beacon {
    pub fn new(
        config: BeaconConfig,
        source: Arc<dyn PositionSource>,
        sink: Arc<dyn TransmissionSink>,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            wake_lock: None,
            last_position: None,
            activity: ActivityLog::default(),
        }
    }

    /// Hold this lock while the beacon runs
    pub fn with_wake_lock(mut self, wake_lock: WakeLock) -> Self {
        self.wake_lock = Some(wake_lock);
        self
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// The most recent fix, used as the reference for speed estimation
    pub fn last_position(&self) -> Option<&GeoPosition> {
        self.last_position.as_ref()
    }

    fn encoder_for(&self, position: &GeoPosition) -> PacketEncoder {
        let timestamp = if self.config.timestamped {
            position
                .timestamp
                .and_then(DateTime::from_timestamp_millis)
                .or_else(|| Some(Utc::now()))
        } else {
            None
        };

        PacketEncoder::new(PacketFormat {
            path: self.config.path,
            timestamp,
        })
    }

    fn ensure_valid_identity(&mut self) -> Result<()> {
        if !self.config.identity.is_valid() {
            self.activity.record(
                ActivityLevel::Error,
                "Callsign and passcode are required before beaconing",
            );
            anyhow::bail!(
                "Invalid station identity: callsign and passcode must both be non-empty"
            );
        }
        Ok(())
    }

    fn acquire_wake_lock(&mut self) -> Result<()> {
        if let Some(lock) = self.wake_lock.as_mut() {
            lock.acquire()?;
        }
        Ok(())
    }

    fn release_wake_lock(&mut self) {
        if let Some(lock) = self.wake_lock.as_mut()
            && let Err(e) = lock.release()
        {
            warn!("Failed to release wake lock: {:#}", e);
        }
    }

    /// Run a single acquire/encode/transmit cycle
    #[tracing::instrument(skip(self), fields(callsign = %self.config.identity.callsign))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        metrics::counter!("beacon.cycle_total").increment(1);

        let position = match self.source.current_position().await {
            Ok(position) => position,
            Err(e) => {
                metrics::counter!("beacon.position.error_total").increment(1);
                let message = format!("Failed to get position from {}: {:#}", self.source.name(), e);
                self.activity.record(ActivityLevel::Error, message.clone());
                return CycleOutcome::NoPosition { message };
            }
        };

        let now_ms = Utc::now().timestamp_millis();
        if position.is_stale(now_ms, self.config.max_position_age_ms) {
            metrics::counter!("beacon.position.stale_total").increment(1);
            self.activity.record(
                ActivityLevel::Warning,
                "Position fix is stale, skipping this beacon",
            );
            return CycleOutcome::StalePosition { position };
        }

        let reported_speed = position.speed.is_some();
        let position = backfill_speed(self.last_position.as_ref(), position);
        if !reported_speed && position.speed.is_some() {
            metrics::counter!("beacon.speed.estimated_total").increment(1);
            debug!("Estimated speed {:.2} m/s", position.speed.unwrap_or_default());
        }
        self.last_position = Some(position);

        let packets = self.encoder_for(&position).encode_position(
            &self.config.identity.callsign,
            &position,
            self.config.comment.as_deref(),
            self.config.status.as_deref(),
        );
        for packet in &packets {
            debug!("Packet: {}", packet);
        }

        let result = self.sink.transmit(&self.config.identity, &packets).await;
        if result.success {
            metrics::counter!("beacon.transmit.success_total").increment(1);
            self.activity.record(ActivityLevel::Success, result.message.clone());
            CycleOutcome::Transmitted { packets, result }
        } else {
            metrics::counter!("beacon.transmit.failure_total").increment(1);
            self.activity.record(ActivityLevel::Error, result.message.clone());
            CycleOutcome::TransmitFailed { packets, result }
        }
    }

    /// Beacon exactly once
    pub async fn run_once(&mut self) -> Result<CycleOutcome> {
        self.ensure_valid_identity()?;
        self.acquire_wake_lock()?;

        let outcome = self.run_cycle().await;

        self.release_wake_lock();
        Ok(outcome)
    }

    /// Beacon on the configured interval until `shutdown` fires
    ///
    /// The first beacon is sent immediately. Failed cycles are recorded and the
    /// schedule continues; there is no retry within a cycle.
    #[tracing::instrument(skip(self, shutdown), fields(callsign = %self.config.identity.callsign))]
    pub async fn run(&mut self, mut shutdown: oneshot::Receiver<()>) -> Result<()> {
        self.ensure_valid_identity()?;
        self.acquire_wake_lock()?;

        info!(
            "Starting beacon every {}s using {} source and {} sink",
            self.config.interval.as_secs(),
            self.source.name(),
            self.sink.name()
        );
        metrics::gauge!("beacon.running").set(1.0);

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping beacon");
                    break;
                }
                _ = ticker.tick() => {
                    let outcome = self.run_cycle().await;
                    if !outcome.is_success() {
                        debug!("Cycle did not transmit: {:?}", outcome);
                    }
                }
            }
        }

        metrics::gauge!("beacon.running").set(0.0);
        self.release_wake_lock();
        Ok(())
    }
}
