use anyhow::Result;
use aprs_beacon::packet::{AprsPath, PacketEncoder, PacketFormat};
use aprs_beacon::position::GeoPosition;
use chrono::Utc;
use tracing::warn;

#[allow(clippy::too_many_arguments)]
pub fn handle_encode(
    callsign: &str,
    latitude: f64,
    longitude: f64,
    comment: Option<&str>,
    status: Option<&str>,
    speed_mps: Option<f64>,
    path: AprsPath,
    timestamped: bool,
) -> Result<()> {
    if !GeoPosition::new(latitude, longitude).has_valid_coordinates() {
        anyhow::bail!(
            "Coordinates ({}, {}) are outside [-90, 90] / [-180, 180]",
            latitude,
            longitude
        );
    }
    if let Some(speed) = speed_mps
        && speed < 0.0
    {
        warn!("Negative speed {} m/s ignored", speed);
    }

    let encoder = PacketEncoder::new(PacketFormat {
        path,
        timestamp: timestamped.then(Utc::now),
    });

    for packet in encoder.generate(callsign, latitude, longitude, comment, status, speed_mps) {
        println!("{}", packet);
    }
    Ok(())
}
