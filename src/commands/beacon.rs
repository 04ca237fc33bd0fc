use anyhow::{Context, Result};
use aprs_beacon::beacon::{Beacon, BeaconConfigBuilder, CycleOutcome};
use aprs_beacon::packet::AprsPath;
use aprs_beacon::position_source::{NmeaPositionSource, PositionSource, StaticPositionSource};
use aprs_beacon::settings::{MIN_SCHEDULE_INTERVAL, Settings};
use aprs_beacon::transmission::{HttpProxySink, LogSink, TransmissionSink};
use aprs_beacon::validation::StationIdentity;
use aprs_beacon::wake_lock::WakeLock;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Command-line options for `beacon`; anything unset falls back to the settings file
pub struct BeaconArgs {
    pub settings_file: PathBuf,
    pub callsign: Option<String>,
    pub passcode: Option<String>,
    pub comment: Option<String>,
    pub status: Option<String>,
    pub fixed_position: Option<(f64, f64)>,
    pub nmea: Option<PathBuf>,
    pub interval: Option<u64>,
    pub proxy_url: Option<String>,
    pub path: Option<AprsPath>,
    pub timestamped: bool,
    pub dry_run: bool,
    pub once: bool,
    pub wake_lock: bool,
}

pub async fn handle_beacon(args: BeaconArgs) -> Result<()> {
    let settings = Settings::load(&args.settings_file)?;

    let callsign = args
        .callsign
        .or(settings.callsign.clone())
        .unwrap_or_default();
    let passcode = args
        .passcode
        .or(settings.passcode.clone())
        .unwrap_or_default();
    let identity = StationIdentity::new(callsign.trim(), passcode.trim());

    let interval = args
        .interval
        .map(|secs| Duration::from_secs(secs.max(MIN_SCHEDULE_INTERVAL)))
        .unwrap_or_else(|| settings.interval());

    let config = BeaconConfigBuilder::new()
        .identity(identity.clone())
        .comment(args.comment.or(settings.comment_text.clone()))
        .status(args.status.or(settings.status_text.clone()))
        .interval(interval)
        .path(args.path.unwrap_or(settings.path))
        .timestamped(args.timestamped || settings.timestamped)
        .build();

    let source: Arc<dyn PositionSource> = match (args.nmea, args.fixed_position) {
        (Some(device), _) => Arc::new(NmeaPositionSource::open(&device).await?),
        (None, Some((lat, lon))) => Arc::new(StaticPositionSource::new(lat, lon)),
        (None, None) => anyhow::bail!("No position source: pass --nmea <path> or --lat/--lon"),
    };

    let sink: Arc<dyn TransmissionSink> = if args.dry_run {
        Arc::new(LogSink)
    } else {
        let url = args
            .proxy_url
            .or(settings.proxy_url.clone())
            .context("No proxy URL configured: pass --proxy-url, set proxy_url, or use --dry-run")?;
        Arc::new(HttpProxySink::with_url(url)?)
    };

    let mut beacon = Beacon::new(config, source, sink);
    if args.wake_lock {
        beacon = beacon.with_wake_lock(WakeLock::for_callsign(&identity.callsign));
    }

    if args.once {
        return match beacon.run_once().await? {
            CycleOutcome::Transmitted { .. } => Ok(()),
            CycleOutcome::TransmitFailed { result, .. } => anyhow::bail!(result.message),
            CycleOutcome::NoPosition { message } => anyhow::bail!(message),
            CycleOutcome::StalePosition { .. } => anyhow::bail!("Position fix was stale"),
        };
    }

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal (Ctrl+C)");
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                // Dropping the sender would stop the beacon, so keep it alive
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    beacon.run(shutdown_rx).await?;

    let successes = beacon
        .activity()
        .entries()
        .filter(|e| e.level == aprs_beacon::activity::ActivityLevel::Success)
        .count();
    info!(
        "Beacon stopped after {} successful transmission(s) in recent history",
        successes
    );
    Ok(())
}
