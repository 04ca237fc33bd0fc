//! APRS beacon - encodes device positions into APRS packets
//!
//! This library formats position and status reports in the fixed-width APRS
//! packet grammar, estimates ground speed from consecutive fixes when the
//! positioning source has none, and drives a scheduled beacon that hands the
//! packets to a transmission sink.

pub mod activity;
pub mod beacon;
pub mod log_format;
pub mod packet;
pub mod position;
pub mod position_source;
pub mod settings;
pub mod speed;
pub mod transmission;
pub mod validation;
pub mod wake_lock;

pub use beacon::{Beacon, BeaconConfig, BeaconConfigBuilder, CycleOutcome};
pub use packet::{AprsPath, PacketEncoder, PacketFormat, generate_packets};
pub use position::GeoPosition;
pub use position_source::{NmeaPositionSource, PositionSource, StaticPositionSource};
pub use speed::{estimate_speed, haversine_distance};
pub use transmission::{HttpProxySink, LogSink, TransmissionResult, TransmissionSink};
pub use validation::{StationIdentity, derive_passcode, is_valid_station_identity};
pub use wake_lock::WakeLock;
