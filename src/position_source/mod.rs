mod nmea;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::position::GeoPosition;

pub use nmea::NmeaPositionSource;

/// Trait for anything that can produce the device's current position
///
/// A failed acquisition (timeout, no fix, device error) is returned as an error;
/// callers treat it as "no position this cycle" and do not retry.
///
/// # Example
///
/// ```rust,ignore
/// let source = StaticPositionSource::new(39.9, 116.4);
/// let position = source.current_position().await?;
/// println!("{}, {}", position.latitude, position.longitude);
/// ```
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Acquire a fresh position sample
    async fn current_position(&self) -> Result<GeoPosition>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Fixed-location source for stations that never move
///
/// Each call returns the configured coordinates stamped with the current time.
#[derive(Debug, Clone)]
pub struct StaticPositionSource {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
}

impl StaticPositionSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
        }
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude = Some(altitude_m);
        self
    }
}

#[async_trait]
impl PositionSource for StaticPositionSource {
    async fn current_position(&self) -> Result<GeoPosition> {
        let mut position = GeoPosition::now(self.latitude, self.longitude);
        position.altitude = self.altitude;

        if !position.has_valid_coordinates() {
            anyhow::bail!(
                "Configured position ({}, {}) is out of range",
                self.latitude,
                self.longitude
            );
        }

        debug!(
            "Static position: ({}, {})",
            position.latitude, position.longitude
        );
        Ok(position)
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
