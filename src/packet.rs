//! APRS position/status packet encoding.
//!
//! Position report grammar:
//!
//! ```text
//! CALLSIGN>PATH:!DDMM.mmN/DDDMM.mmE[/SSS][comment
//! CALLSIGN>PATH:@DDHHMMzDDMM.mmN/DDDMM.mmE[/SSS][comment   (timestamped)
//! ```
//!
//! Status report grammar:
//!
//! ```text
//! CALLSIGN>PATH:>status
//! ```
//!
//! The coordinate fields are fixed width because APRS-IS consumers parse them by
//! column. `SSS` is ground speed in knots and is only present when known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::position::GeoPosition;

/// m/s to knots
pub const MPS_TO_KNOTS: f64 = 1.94384;

/// Largest value that still fits the 3-digit speed field
const MAX_SPEED_KNOTS: u64 = 999;

/// Primary symbol table with the "jogger" symbol
const SYMBOL_TABLE: char = '/';
const SYMBOL_CODE: char = '[';

/// Digipeater path written after the destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AprsPath {
    /// Injected directly by an internet client
    #[default]
    TcpIp,
    /// Generic relay path
    Relay,
}

impl AprsPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            AprsPath::TcpIp => "APRS,TCPIP*",
            AprsPath::Relay => "APRS,RELAY",
        }
    }
}

impl std::fmt::Display for AprsPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AprsPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcpip" => Ok(AprsPath::TcpIp),
            "relay" => Ok(AprsPath::Relay),
            other => anyhow::bail!("Unknown APRS path '{}' (expected tcpip or relay)", other),
        }
    }
}

/// Selects between the packet variants the encoder can produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketFormat {
    pub path: AprsPath,
    /// When set, the position report uses the `@DDHHMMz` timestamped form
    pub timestamp: Option<DateTime<Utc>>,
}

/// Configurable APRS packet encoder
///
/// Encoding is pure: the same inputs always produce the same packets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketEncoder {
    format: PacketFormat,
}

impl PacketEncoder {
    pub fn new(format: PacketFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> &PacketFormat {
        &self.format
    }

    /// Build the position report and, if `status` is given, a status report
    ///
    /// The position report is always first.
    pub fn generate(
        &self,
        callsign: &str,
        latitude: f64,
        longitude: f64,
        comment: Option<&str>,
        status: Option<&str>,
        speed_mps: Option<f64>,
    ) -> Vec<String> {
        let header = format!("{}>{}:", callsign.to_uppercase(), self.format.path);

        let mut position = header.clone();
        match self.format.timestamp {
            Some(ts) => {
                position.push('@');
                position.push_str(&ts.format("%d%H%Mz").to_string());
            }
            None => position.push('!'),
        }
        position.push_str(&format_latitude(latitude));
        position.push(SYMBOL_TABLE);
        position.push_str(&format_longitude(longitude));
        if let Some(knots) = speed_mps.and_then(speed_field) {
            position.push('/');
            position.push_str(&knots);
        }
        position.push(SYMBOL_CODE);
        if let Some(comment) = comment {
            position.push_str(&sanitize_text(comment));
        }

        let mut packets = vec![position];

        if let Some(status) = status.map(sanitize_text).filter(|s| !s.trim().is_empty()) {
            packets.push(format!("{}>{}", header, status));
        }

        packets
    }

    /// Encode a position sample, using its own speed if it carries one
    pub fn encode_position(
        &self,
        callsign: &str,
        position: &GeoPosition,
        comment: Option<&str>,
        status: Option<&str>,
    ) -> Vec<String> {
        self.generate(
            callsign,
            position.latitude,
            position.longitude,
            comment,
            status,
            position.speed,
        )
    }
}

/// Encode with the default format (`TCPIP*` path, no timestamp)
pub fn generate_packets(
    callsign: &str,
    latitude: f64,
    longitude: f64,
    comment: Option<&str>,
    status: Option<&str>,
    speed_mps: Option<f64>,
) -> Vec<String> {
    PacketEncoder::default().generate(callsign, latitude, longitude, comment, status, speed_mps)
}

/// `DDMM.mmN` / `DDMM.mmS`
pub fn format_latitude(latitude: f64) -> String {
    format_coordinate(latitude, 90.0, 2, 'N', 'S')
}

/// `DDDMM.mmE` / `DDDMM.mmW`
pub fn format_longitude(longitude: f64) -> String {
    format_coordinate(longitude, 180.0, 3, 'E', 'W')
}

fn format_coordinate(
    value: f64,
    limit: f64,
    degree_width: usize,
    positive: char,
    negative: char,
) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let hemisphere = if value >= 0.0 { positive } else { negative };

    // Round on hundredths of a minute so 59.999' carries into the degrees
    let hundredths = (value.abs().min(limit) * 6000.0).round() as u64;
    let degrees = hundredths / 6000;
    let minutes = hundredths % 6000;

    format!(
        "{:0width$}{:02}.{:02}{}",
        degrees,
        minutes / 100,
        minutes % 100,
        hemisphere,
        width = degree_width
    )
}

/// Zero-padded knots, or `None` when the speed is unknown or negative
pub fn speed_field(speed_mps: f64) -> Option<String> {
    if !speed_mps.is_finite() || speed_mps < 0.0 {
        return None;
    }
    let knots = ((speed_mps * MPS_TO_KNOTS).round() as u64).min(MAX_SPEED_KNOTS);
    Some(format!("{:03}", knots))
}

/// Strip ASCII control characters (CR/LF included) from free text
///
/// Everything else passes through unescaped.
pub fn sanitize_text(text: &str) -> Cow<'_, str> {
    if text.chars().any(|c| c.is_control()) {
        Cow::Owned(text.chars().filter(|c| !c.is_control()).collect())
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn is_latitude_field(field: &str) -> bool {
        let b = field.as_bytes();
        b.len() == 8
            && b[..4].iter().all(u8::is_ascii_digit)
            && b[4] == b'.'
            && b[5..7].iter().all(u8::is_ascii_digit)
            && (b[7] == b'N' || b[7] == b'S')
    }

    fn is_longitude_field(field: &str) -> bool {
        let b = field.as_bytes();
        b.len() == 9
            && b[..5].iter().all(u8::is_ascii_digit)
            && b[5] == b'.'
            && b[6..8].iter().all(u8::is_ascii_digit)
            && (b[8] == b'E' || b[8] == b'W')
    }

    #[test]
    fn test_basic_position_packet() {
        let packets = generate_packets("bg5xyz", 39.9, 116.4, None, None, None);
        assert_eq!(packets, vec!["BG5XYZ>APRS,TCPIP*:!3954.00N/11624.00E[".to_string()]);
    }

    #[test]
    fn test_comment_is_appended() {
        let packets = generate_packets("bg5xyz", 39.9, 116.4, Some("Hello APRS"), None, None);
        assert_eq!(packets[0], "BG5XYZ>APRS,TCPIP*:!3954.00N/11624.00E[Hello APRS");
    }

    #[test]
    fn test_speed_field() {
        let packets = generate_packets("BG5XYZ", 39.9, 116.4, None, None, Some(5.0));
        assert_eq!(packets[0], "BG5XYZ>APRS,TCPIP*:!3954.00N/11624.00E/010[");

        assert_eq!(speed_field(0.0).as_deref(), Some("000"));
        assert_eq!(speed_field(-1.0), None);
        assert_eq!(speed_field(f64::NAN), None);
        assert_eq!(speed_field(1000.0).as_deref(), Some("999"));
    }

    #[test]
    fn test_negative_speed_uses_plain_grammar() {
        let with_negative = generate_packets("BG5XYZ", 39.9, 116.4, Some("x"), None, Some(-3.0));
        let without = generate_packets("BG5XYZ", 39.9, 116.4, Some("x"), None, None);
        assert_eq!(with_negative, without);
    }

    #[test]
    fn test_southern_western_hemispheres() {
        assert_eq!(format_latitude(-33.8688), "3352.13S");
        assert_eq!(format_longitude(-70.5), "07030.00W");
        assert_eq!(format_longitude(-0.1275), "00007.65W");
        assert_eq!(format_latitude(0.0), "0000.00N");
    }

    #[test]
    fn test_minutes_carry_into_degrees() {
        assert_eq!(format_latitude(39.99999), "4000.00N");
        assert_eq!(format_longitude(179.999999), "18000.00E");
    }

    #[test]
    fn test_field_widths_across_range() {
        let mut lat = -90.0;
        while lat <= 90.0 {
            let field = format_latitude(lat);
            assert!(is_latitude_field(&field), "{lat} -> {field}");
            lat += 0.37;
        }

        let mut lon = -180.0;
        while lon <= 180.0 {
            let field = format_longitude(lon);
            assert!(is_longitude_field(&field), "{lon} -> {field}");
            lon += 0.73;
        }

        assert!(is_latitude_field(&format_latitude(90.0)));
        assert!(is_longitude_field(&format_longitude(-180.0)));
    }

    #[test]
    fn test_status_packet_follows_position() {
        let packets = generate_packets("n0call", 1.0, 2.0, None, Some("On the air"), None);
        assert_eq!(packets.len(), 2);
        assert!(packets[0].starts_with("N0CALL>APRS,TCPIP*:!"));
        assert_eq!(packets[1], "N0CALL>APRS,TCPIP*:>On the air");
    }

    #[test]
    fn test_blank_status_is_omitted() {
        assert_eq!(generate_packets("N0CALL", 1.0, 2.0, None, Some(""), None).len(), 1);
        assert_eq!(generate_packets("N0CALL", 1.0, 2.0, None, Some("  "), None).len(), 1);
    }

    #[test]
    fn test_control_characters_are_stripped() {
        let packets = generate_packets(
            "N0CALL",
            1.0,
            2.0,
            Some("line one\r\nN0CALL>APRS:fake"),
            Some("ok\n"),
            None,
        );
        assert!(packets[0].ends_with("[line oneN0CALL>APRS:fake"));
        assert_eq!(packets[1], "N0CALL>APRS,TCPIP*:>ok");
        assert!(matches!(sanitize_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_relay_path_and_timestamp() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 59).unwrap();
        let encoder = PacketEncoder::new(PacketFormat {
            path: AprsPath::Relay,
            timestamp: Some(ts),
        });

        let packets = encoder.generate("bg5xyz", 39.9, 116.4, None, Some("hi"), Some(5.0));
        assert_eq!(packets[0], "BG5XYZ>APRS,RELAY:@090705z3954.00N/11624.00E/010[");
        assert_eq!(packets[1], "BG5XYZ>APRS,RELAY:>hi");
    }

    #[test]
    fn test_encode_position_uses_position_speed() {
        let pos = GeoPosition::new(39.9, 116.4).with_speed(5.0);
        let packets = PacketEncoder::default().encode_position("bg5xyz", &pos, None, None);
        assert_eq!(packets[0], "BG5XYZ>APRS,TCPIP*:!3954.00N/11624.00E/010[");
    }

    #[test]
    fn test_path_parsing() {
        assert_eq!("TCPIP".parse::<AprsPath>().unwrap(), AprsPath::TcpIp);
        assert_eq!("relay".parse::<AprsPath>().unwrap(), AprsPath::Relay);
        assert!("wide2-1".parse::<AprsPath>().is_err());
    }

    #[test]
    fn test_deterministic() {
        let a = generate_packets("k1abc", 51.4779, -0.0015, Some("c"), Some("s"), Some(2.5));
        let b = generate_packets("k1abc", 51.4779, -0.0015, Some("c"), Some("s"), Some(2.5));
        assert_eq!(a, b);
    }
}
