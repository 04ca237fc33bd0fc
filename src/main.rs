mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;

use aprs_beacon::log_format::init_logging;
use aprs_beacon::packet::AprsPath;
use aprs_beacon::settings::settings_path;

#[derive(Parser)]
#[command(name = "aprs-beacon")]
#[command(version, about = "Beacon device positions to the APRS network", long_about = None)]
struct Cli {
    /// Settings file (defaults to $APRS_BEACON_SETTINGS or ./aprs-beacon.toml)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduled beacon
    Beacon {
        #[arg(long)]
        callsign: Option<String>,
        #[arg(long)]
        passcode: Option<String>,
        /// Free text appended to the position report
        #[arg(long)]
        comment: Option<String>,
        /// Send a status report after each position report
        #[arg(long)]
        status: Option<String>,
        /// Fixed latitude (use with --lon instead of a GPS)
        #[arg(long, allow_negative_numbers = true, requires = "lon", conflicts_with = "nmea")]
        lat: Option<f64>,
        /// Fixed longitude
        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lon: Option<f64>,
        /// NMEA-0183 source: serial device, FIFO, or log file
        #[arg(long)]
        nmea: Option<PathBuf>,
        /// Seconds between beacons
        #[arg(long)]
        interval: Option<u64>,
        /// HTTP proxy that relays packets to APRS-IS
        #[arg(long)]
        proxy_url: Option<String>,
        /// APRS path: tcpip or relay
        #[arg(long)]
        path: Option<AprsPath>,
        /// Use the timestamped position report form
        #[arg(long)]
        timestamped: bool,
        /// Log packets instead of sending them
        #[arg(long)]
        dry_run: bool,
        /// Beacon once and exit
        #[arg(long)]
        once: bool,
        /// Allow several beacons for the same callsign
        #[arg(long)]
        no_wake_lock: bool,
    },
    /// Print the packets for a position without sending them
    Encode {
        callsign: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lon: f64,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        status: Option<String>,
        /// Ground speed in m/s
        #[arg(long)]
        speed: Option<f64>,
        #[arg(long, default_value = "tcpip")]
        path: AprsPath,
        /// Stamp the position report with the current UTC time
        #[arg(long)]
        timestamped: bool,
    },
    /// Print the APRS-IS passcode derived from a callsign
    Passcode { callsign: String },
    /// Show or change the saved settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings
    Show,
    /// Update one or more settings
    Set {
        #[arg(long)]
        callsign: Option<String>,
        #[arg(long)]
        passcode: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        interval: Option<u64>,
        #[arg(long)]
        proxy_url: Option<String>,
        #[arg(long)]
        path: Option<AprsPath>,
        #[arg(long)]
        timestamped: Option<bool>,
        /// Fill the passcode from the callsign
        #[arg(long)]
        derive_passcode: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging(std::io::stderr().is_terminal());

    let cli = Cli::parse();
    let settings_file = cli.settings.unwrap_or_else(settings_path);

    match cli.command {
        Commands::Beacon {
            callsign,
            passcode,
            comment,
            status,
            lat,
            lon,
            nmea,
            interval,
            proxy_url,
            path,
            timestamped,
            dry_run,
            once,
            no_wake_lock,
        } => {
            commands::handle_beacon(commands::BeaconArgs {
                settings_file,
                callsign,
                passcode,
                comment,
                status,
                fixed_position: lat.zip(lon),
                nmea,
                interval,
                proxy_url,
                path,
                timestamped,
                dry_run,
                once,
                wake_lock: !no_wake_lock,
            })
            .await
        }
        Commands::Encode {
            callsign,
            lat,
            lon,
            comment,
            status,
            speed,
            path,
            timestamped,
        } => commands::handle_encode(
            &callsign,
            lat,
            lon,
            comment.as_deref(),
            status.as_deref(),
            speed,
            path,
            timestamped,
        ),
        Commands::Passcode { callsign } => commands::handle_passcode(&callsign),
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::handle_settings_show(&settings_file),
            SettingsAction::Set {
                callsign,
                passcode,
                comment,
                status,
                interval,
                proxy_url,
                path,
                timestamped,
                derive_passcode,
            } => commands::handle_settings_set(
                &settings_file,
                commands::SettingsUpdate {
                    callsign,
                    passcode,
                    comment_text: comment,
                    status_text: status,
                    schedule_interval: interval,
                    proxy_url,
                    path,
                    timestamped,
                    derive_passcode,
                },
            ),
        },
    }
}
