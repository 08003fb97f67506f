//! Settings management for emcatcher.
//!
//! Handles locating, loading and verifying the JSON settings file that
//! names the reader device, the frequency band and the sampling interval.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};
use thiserror::Error;

/// Environment variable consulted when no `--settings` path is given.
pub const SETTINGS_ENV: &str = "EMCATCHER_SETTINGS";

/// Settings file used when neither the CLI nor the environment names one.
pub const DEFAULT_SETTINGS_FILE: &str = "settings.conf";

/// RFID frequency band searched on every sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Low frequency, 125/134 kHz.
    Lf,
    /// High frequency, 13.56 MHz.
    Hf,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Lf => "lf",
            Frequency::Hf => "hf",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lf" => Ok(Frequency::Lf),
            "hf" => Ok(Frequency::Hf),
            other => Err(SettingsError::InvalidFrequency(other.to_string())),
        }
    }
}

/// Problems found while verifying a settings file.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("No comport (device) specified")]
    MissingDevice,

    #[error("No frequency (freq) specified")]
    MissingFrequency,

    #[error("Invalid frequency '{0}' specified. Valid frequencies: lf, hf.")]
    InvalidFrequency(String),

    #[error("Invalid sample_rate {0}: must be a finite, non-negative number of seconds")]
    InvalidSampleRate(f64),
}

/// Settings exactly as they appear in the JSON file.
///
/// Nothing is checked at this stage; call [`RawSettings::verify`] to get
/// usable [`Settings`].
///
/// # Example
///
/// ```json
/// {
///     "device": "/dev/ttyACM0",
///     "freq": "lf",
///     "sample_rate": 2,
///     "custom_command": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSettings {
    /// Serial port of the reader.
    #[serde(default)]
    pub device: Option<String>,

    /// Frequency band, `lf` or `hf`.
    #[serde(default)]
    pub freq: Option<String>,

    /// Seconds to sleep between samples.
    #[serde(default = "defaults::sample_rate")]
    pub sample_rate: f64,

    /// Reader command run instead of `<freq> search`.
    #[serde(default)]
    pub custom_command: Option<String>,

    /// Reader utility, either a bare name looked up on `PATH` or a path.
    #[serde(default = "defaults::binary")]
    pub binary: PathBuf,

    /// Where capture files are written.
    #[serde(default = "defaults::cards_dir")]
    pub cards_dir: PathBuf,

    /// Where run logs are written.
    #[serde(default = "defaults::logs_dir")]
    pub logs_dir: PathBuf,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            device: None,
            freq: None,
            sample_rate: defaults::sample_rate(),
            custom_command: None,
            binary: defaults::binary(),
            cards_dir: defaults::cards_dir(),
            logs_dir: defaults::logs_dir(),
        }
    }
}

impl RawSettings {
    /// Reads and parses a settings file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse JSON in: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Checks the settings and turns them into [`Settings`].
    ///
    /// Reports the first problem found, in file order: device, frequency,
    /// sample rate.
    pub fn verify(&self) -> Result<Settings, SettingsError> {
        let device = self
            .device
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(SettingsError::MissingDevice)?;

        let freq: Frequency = self
            .freq
            .as_deref()
            .ok_or(SettingsError::MissingFrequency)?
            .parse()?;

        let sample_rate = Duration::try_from_secs_f64(self.sample_rate)
            .map_err(|_| SettingsError::InvalidSampleRate(self.sample_rate))?;

        let custom_command = self
            .custom_command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(str::to_string);

        Ok(Settings {
            device: device.to_string(),
            freq,
            sample_rate,
            custom_command,
            binary: self.binary.clone(),
            cards_dir: self.cards_dir.clone(),
            logs_dir: self.logs_dir.clone(),
        })
    }
}

/// Verified settings. Only [`RawSettings::verify`] produces these.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    device: String,
    freq: Frequency,
    sample_rate: Duration,
    custom_command: Option<String>,
    binary: PathBuf,
    cards_dir: PathBuf,
    logs_dir: PathBuf,
}

impl Settings {
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn freq(&self) -> Frequency {
        self.freq
    }

    pub fn sample_rate(&self) -> Duration {
        self.sample_rate
    }

    pub fn custom_command(&self) -> Option<&str> {
        self.custom_command.as_deref()
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn cards_dir(&self) -> &Path {
        &self.cards_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Command handed to the reader on every sample.
    pub fn reader_command(&self) -> String {
        match &self.custom_command {
            Some(command) => command.clone(),
            None => format!("{} search", self.freq),
        }
    }
}

pub(crate) mod defaults {
    use std::path::PathBuf;

    /// Default sample interval in seconds.
    pub fn sample_rate() -> f64 {
        1.0
    }

    pub fn binary() -> PathBuf {
        PathBuf::from("proxmark3")
    }

    pub fn cards_dir() -> PathBuf {
        PathBuf::from("cards")
    }

    pub fn logs_dir() -> PathBuf {
        PathBuf::from("logs")
    }
}

/// Picks the settings file to load.
///
/// Searches in the following order:
/// 1. Path given on the command line
/// 2. `EMCATCHER_SETTINGS` environment variable
/// 3. `settings.conf` in the working directory
pub fn locate_settings(cli_path: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli_path {
        return path;
    }

    match env::var_os(SETTINGS_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_SETTINGS_FILE),
    }
}

/// Directory the run log goes to, falling back to the default when the
/// settings could not be loaded.
pub fn logs_dir_or_default(raw: Option<&RawSettings>) -> PathBuf {
    raw.map(|r| r.logs_dir.clone())
        .unwrap_or_else(defaults::logs_dir)
}
