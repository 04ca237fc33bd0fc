use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::packet::AprsPath;
use crate::validation::StationIdentity;

/// Default beacon interval in seconds
pub const DEFAULT_SCHEDULE_INTERVAL: u64 = 60;

/// Shortest interval accepted, to stay polite with the APRS network
pub const MIN_SCHEDULE_INTERVAL: u64 = 10;

/// Persisted operator settings (TOML)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Seconds between beacons
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval: u64,
    /// HTTP proxy that relays packets to APRS-IS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub path: AprsPath,
    /// Use the timestamped position report form
    #[serde(default)]
    pub timestamped: bool,
}

fn default_schedule_interval() -> u64 {
    DEFAULT_SCHEDULE_INTERVAL
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            callsign: None,
            passcode: None,
            comment_text: None,
            status_text: None,
            schedule_interval: DEFAULT_SCHEDULE_INTERVAL,
            proxy_url: None,
            path: AprsPath::default(),
            timestamped: false,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let settings: Settings =
            toml::from_str(&contents).with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(settings)
    }

    /// Save settings to a TOML file (atomic: write to .tmp then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        let contents =
            toml::to_string_pretty(self).context("Failed to serialize settings to TOML")?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, &contents)
            .with_context(|| format!("Failed to write {:?}", tmp_path))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to rename {:?} to {:?}", tmp_path, path))?;
        Ok(())
    }

    /// Station identity, if both callsign and passcode are present
    pub fn identity(&self) -> Option<StationIdentity> {
        match (&self.callsign, &self.passcode) {
            (Some(callsign), Some(passcode)) => {
                Some(StationIdentity::new(callsign.trim(), passcode.trim()))
            }
            _ => None,
        }
    }

    /// Beacon interval, never shorter than the minimum
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval.max(MIN_SCHEDULE_INTERVAL))
    }
}

/// Resolve the settings file path.
///
/// Priority:
/// 1. `APRS_BEACON_SETTINGS` env var
/// 2. `./aprs-beacon.toml`
pub fn settings_path() -> PathBuf {
    match std::env::var("APRS_BEACON_SETTINGS") {
        Ok(path) => PathBuf::from(path),
        Err(_) => PathBuf::from("./aprs-beacon.toml"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_settings_roundtrip() {
        let settings = Settings {
            callsign: Some("BG5XYZ".to_string()),
            passcode: Some("16546".to_string()),
            comment_text: Some("Mobile".to_string()),
            status_text: None,
            schedule_interval: 120,
            proxy_url: Some("https://proxy.example/".to_string()),
            path: AprsPath::Relay,
            timestamped: true,
        };

        let toml_str = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, settings);
        assert!(!toml_str.contains("status_text"));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.schedule_interval, DEFAULT_SCHEDULE_INTERVAL);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "callsign = \"N0CALL\"\npath = \"relay\"\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.callsign.as_deref(), Some("N0CALL"));
        assert_eq!(settings.path, AprsPath::Relay);
        assert_eq!(settings.schedule_interval, DEFAULT_SCHEDULE_INTERVAL);
        assert!(settings.identity().is_none());
    }

    #[test]
    fn test_load_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let settings = Settings {
            callsign: Some(" bg5xyz ".to_string()),
            passcode: Some("16546".to_string()),
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.identity().unwrap().callsign, "bg5xyz");
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "schedule_interval = \"soon\"").unwrap();

        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_interval_has_floor() {
        let settings = Settings {
            schedule_interval: 1,
            ..Settings::default()
        };
        assert_eq!(settings.interval(), Duration::from_secs(MIN_SCHEDULE_INTERVAL));
    }

    #[test]
    #[serial]
    fn test_settings_path_from_env() {
        unsafe { std::env::set_var("APRS_BEACON_SETTINGS", "/tmp/custom.toml") };
        assert_eq!(settings_path(), PathBuf::from("/tmp/custom.toml"));

        unsafe { std::env::remove_var("APRS_BEACON_SETTINGS") };
        assert_eq!(settings_path(), PathBuf::from("./aprs-beacon.toml"));
    }
}
