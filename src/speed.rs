//! Ground speed inference from consecutive position fixes.
//!
//! Only consulted when the positioning source does not report a speed of its own.
//! Every "can't tell" outcome (missing timestamp, stale reference, interval too
//! short, implausible result) is reported as `None`.

use crate::position::GeoPosition;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Reference fixes older than this are not used for velocity inference
pub const MAX_ELAPSED_MS: i64 = 300_000;

/// Shorter intervals amplify GPS jitter into nonsense speeds
pub const MIN_ELAPSED_MS: i64 = 1_000;

/// ~720 km/h; anything faster is treated as a coordinate jump
pub const MAX_PLAUSIBLE_SPEED_MPS: f64 = 200.0;

/// Calculate the distance between two points using the Haversine formula
/// Returns distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Average ground speed in m/s between two fixes
pub fn estimate_speed(previous: &GeoPosition, current: &GeoPosition) -> Option<f64> {
    let (Some(prev_ts), Some(curr_ts)) = (previous.timestamp, current.timestamp) else {
        return None;
    };

    let elapsed_ms = curr_ts.checked_sub(prev_ts)?;
    if !(MIN_ELAPSED_MS..=MAX_ELAPSED_MS).contains(&elapsed_ms) {
        return None;
    }

    let distance_m = haversine_distance(
        previous.latitude,
        previous.longitude,
        current.latitude,
        current.longitude,
    );
    let speed_mps = distance_m / (elapsed_ms as f64 / 1000.0);

    if !speed_mps.is_finite() || speed_mps > MAX_PLAUSIBLE_SPEED_MPS {
        return None;
    }

    Some(speed_mps)
}

/// Attach an estimated speed to `current` if, and only if, it has none
pub fn backfill_speed(previous: Option<&GeoPosition>, current: GeoPosition) -> GeoPosition {
    if current.speed.is_some() {
        return current;
    }

    match previous.and_then(|prev| estimate_speed(prev, &current)) {
        Some(speed) => current.with_speed(speed),
        None => current,
    }
}
