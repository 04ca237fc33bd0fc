use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Default maximum age for a fix before it is considered too old to beacon
pub const DEFAULT_MAX_POSITION_AGE_MS: i64 = 60_000;

/// A single position sample from a positioning source
/// Immutable once produced; every call to a source yields a new value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPosition {
    /// Latitude in degrees (-90 to +90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to +180)
    pub longitude: f64,

    /// Horizontal accuracy in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Altitude in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    /// Ground speed in meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// Epoch milliseconds when the fix was taken
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl GeoPosition {
    /// Create a bare position with no optional fields
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy: None,
            altitude: None,
            speed: None,
            timestamp: None,
        }
    }

    /// Create a position stamped with the current wall-clock time
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude).with_timestamp(Utc::now().timestamp_millis())
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = Some(timestamp_ms);
        self
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed = Some(speed_mps);
        self
    }

    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude = Some(altitude_m);
        self
    }

    pub fn with_accuracy(mut self, accuracy_m: f64) -> Self {
        self.accuracy = Some(accuracy_m);
        self
    }

    /// Whether the coordinates are finite and inside the WGS84 ranges
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// A position without a timestamp is always stale
    pub fn is_stale(&self, now_ms: i64, max_age_ms: i64) -> bool {
        match self.timestamp {
            Some(ts) => now_ms.checked_sub(ts).is_none_or(|age| age > max_age_ms),
            None => true,
        }
    }
}
