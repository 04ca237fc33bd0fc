use anyhow::{Context, Result};
use aprs_beacon::packet::AprsPath;
use aprs_beacon::settings::Settings;
use aprs_beacon::validation::derive_passcode;
use std::path::Path;
use tracing::info;

/// Fields to change; `None` leaves the stored value alone
pub struct SettingsUpdate {
    pub callsign: Option<String>,
    pub passcode: Option<String>,
    pub comment_text: Option<String>,
    pub status_text: Option<String>,
    pub schedule_interval: Option<u64>,
    pub proxy_url: Option<String>,
    pub path: Option<AprsPath>,
    pub timestamped: Option<bool>,
    pub derive_passcode: bool,
}

pub fn handle_settings_show(path: &Path) -> Result<()> {
    let mut settings = Settings::load(path)?;
    if settings.passcode.is_some() {
        settings.passcode = Some("<hidden>".to_string());
    }

    println!("# {}", path.display());
    print!(
        "{}",
        toml::to_string_pretty(&settings).context("Failed to render settings")?
    );
    Ok(())
}

pub fn handle_settings_set(path: &Path, update: SettingsUpdate) -> Result<()> {
    let mut settings = Settings::load(path)?;

    if let Some(callsign) = update.callsign {
        settings.callsign = Some(callsign.trim().to_uppercase());
    }
    if let Some(passcode) = update.passcode {
        settings.passcode = Some(passcode);
    }
    if update.derive_passcode {
        let Some(callsign) = settings.callsign.as_deref() else {
            anyhow::bail!("Set a callsign before deriving its passcode");
        };
        settings.passcode = Some(derive_passcode(callsign));
    }
    if let Some(comment) = update.comment_text {
        settings.comment_text = Some(comment).filter(|c| !c.is_empty());
    }
    if let Some(status) = update.status_text {
        settings.status_text = Some(status).filter(|s| !s.is_empty());
    }
    if let Some(interval) = update.schedule_interval {
        settings.schedule_interval = interval;
    }
    if let Some(url) = update.proxy_url {
        settings.proxy_url = Some(url).filter(|u| !u.is_empty());
    }
    if let Some(aprs_path) = update.path {
        settings.path = aprs_path;
    }
    if let Some(timestamped) = update.timestamped {
        settings.timestamped = timestamped;
    }

    settings.save(path)?;
    info!("Saved settings to {}", path.display());
    Ok(())
}
