//! NMEA-0183 position source (serial GPS receivers, gpspipe output, log replay).
//!
//! Combines data from two sentence types:
//! - **GGA**: position, altitude, satellite count
//! - **RMC**: speed over ground (knots)
//!
//! A position is produced each time a GGA sentence with a valid fix arrives. Speed
//! from an RMC sentence seen since the previous position is attached to it; when
//! no RMC arrived, the position has no speed and the beacon falls back to the
//! speed estimator.

use anyhow::{Context, Result};
use async_trait::async_trait;
use nmea0183::{ParseResult, Parser};
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::PositionSource;
use crate::position::GeoPosition;

/// 1 knot = 0.514444 m/s
const KNOTS_TO_MPS: f64 = 0.514_444;

const DEFAULT_FIX_TIMEOUT: Duration = Duration::from_secs(10);

/// Internal state for combining GGA and RMC data
#[derive(Debug, Default)]
struct NmeaState {
    /// Speed from the most recent RMC sentence (m/s)
    pending_speed: Option<f64>,
}

impl NmeaState {
    fn update_from_rmc(&mut self, rmc: &nmea0183::RMC) {
        self.pending_speed = Some(f64::from(rmc.speed.as_knots()) * KNOTS_TO_MPS);
    }

    /// Build a position from a GGA fix, consuming any pending RMC speed
    fn position_from_gga(&mut self, gga: &nmea0183::GGA) -> GeoPosition {
        let mut position = GeoPosition::now(gga.latitude.as_f64(), gga.longitude.as_f64());
        position.altitude = Some(f64::from(gga.altitude.meters));
        position.speed = self.pending_speed.take();
        position
    }
}

struct NmeaReader<R> {
    reader: R,
    parser: Parser,
    state: NmeaState,
    line: String,
}

impl<R: AsyncBufRead + Unpin + Send> NmeaReader<R> {
    /// Read sentences until a GGA fix is available
    async fn next_fix(&mut self) -> Result<GeoPosition> {
        loop {
            self.line.clear();
            let read = self
                .reader
                .read_line(&mut self.line)
                .await
                .context("Failed to read NMEA stream")?;
            if read == 0 {
                anyhow::bail!("NMEA stream ended before a position fix was received");
            }

            let sentence = self.line.trim();
            if !sentence.starts_with('$') {
                continue;
            }
            trace!("NMEA: {}", sentence);

            // The parser needs the line terminator to complete a sentence
            let framed = format!("{}\r\n", sentence);
            let mut fix = None;
            for result in self.parser.parse_from_bytes(framed.as_bytes()) {
                match result {
                    Ok(ParseResult::GGA(Some(gga))) => {
                        fix = Some(self.state.position_from_gga(&gga));
                    }
                    Ok(ParseResult::GGA(None)) => {
                        debug!("GGA sentence without a fix");
                    }
                    Ok(ParseResult::RMC(Some(rmc))) => {
                        self.state.update_from_rmc(&rmc);
                    }
                    // Other sentence types, or RMC without a valid fix
                    Ok(_) => {}
                    Err(e) => {
                        debug!("Ignoring malformed NMEA sentence ({}): {}", e, sentence);
                    }
                }
            }

            if let Some(position) = fix {
                return Ok(position);
            }
        }
    }
}

/// Position source backed by a stream of NMEA-0183 sentences
pub struct NmeaPositionSource<R> {
    inner: Mutex<NmeaReader<R>>,
    fix_timeout: Duration,
}

impl<R: AsyncBufRead + Unpin + Send> NmeaPositionSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: Mutex::new(NmeaReader {
                reader,
                parser: Parser::new(),
                state: NmeaState::default(),
                line: String::new(),
            }),
            fix_timeout: DEFAULT_FIX_TIMEOUT,
        }
    }

    /// How long to wait for a fix before reporting a timeout
    pub fn with_timeout(mut self, fix_timeout: Duration) -> Self {
        self.fix_timeout = fix_timeout;
        self
    }
}

impl NmeaPositionSource<BufReader<tokio::fs::File>> {
    /// Open a serial device, FIFO, or log file
    pub async fn open(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open NMEA source {:?}", path))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> PositionSource for NmeaPositionSource<R> {
    async fn current_position(&self) -> Result<GeoPosition> {
        let mut inner = self.inner.lock().await;
        let position = tokio::time::timeout(self.fix_timeout, inner.next_fix())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Timed out after {:?} waiting for an NMEA position fix",
                    self.fix_timeout
                )
            })??;

        debug!(
            "NMEA fix: ({:.5}, {:.5}) speed={:?}",
            position.latitude, position.longitude, position.speed
        );
        Ok(position)
    }

    fn name(&self) -> &'static str {
        "nmea"
    }
}
