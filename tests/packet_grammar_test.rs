// Wire-level checks on the packets downstream APRS-IS consumers parse by column

use aprs_beacon::packet::{format_latitude, format_longitude};
use aprs_beacon::{GeoPosition, derive_passcode, estimate_speed, generate_packets, is_valid_station_identity};

/// Split `CALL>PATH:!LAT/LON...` into its latitude and longitude fields
fn coordinate_fields(packet: &str) -> (&str, &str) {
    let body = &packet[packet.find(":!").unwrap() + 2..];
    (&body[..8], &body[9..18])
}

#[test]
fn test_position_packet_columns() {
    let samples = [
        (39.9, 116.4),
        (-89.999, -179.999),
        (0.0001, 0.0001),
        (-0.5, 179.5),
        (51.4779, -0.0015),
        (90.0, 180.0),
    ];

    for (lat, lon) in samples {
        let packets = generate_packets("k1abc-9", lat, lon, Some("test"), None, None);
        let (lat_field, lon_field) = coordinate_fields(&packets[0]);

        assert_eq!(lat_field, format_latitude(lat));
        assert_eq!(lon_field, format_longitude(lon));
        assert_eq!(&packets[0][..packets[0].find(':').unwrap()], "K1ABC-9>APRS,TCPIP*");
        assert!(packets[0].ends_with("[test"));
    }
}

#[test]
fn test_reference_packet() {
    let packets = generate_packets("bg5xyz", 39.9, 116.4, None, None, None);
    assert!(packets[0].starts_with("BG5XYZ>APRS,TCPIP*:!3954.00N/11624.00E["));

    let with_speed = generate_packets("bg5xyz", 39.9, 116.4, None, None, Some(5.0));
    assert!(with_speed[0].contains("11624.00E/010["));
}

#[test]
fn test_estimator_window_edges() {
    let prev = GeoPosition::new(30.0, 120.0).with_timestamp(0);
    let near = |ts| GeoPosition::new(30.0005, 120.0).with_timestamp(ts);

    assert_eq!(estimate_speed(&prev, &near(500)), None);
    assert_eq!(estimate_speed(&prev, &near(301_000)), None);
    assert!(estimate_speed(&prev, &near(60_000)).is_some());
}

#[test]
fn test_identity_helpers() {
    assert_eq!(derive_passcode("bg5xyz"), derive_passcode("BG5XYZ"));
    assert!(!is_valid_station_identity("", "1234"));
    assert!(is_valid_station_identity(" BG5XYZ ", "1234"));
}
