use crate::presets::PresetId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("No video file selected")]
    NoSourceSelected,
    #[error("Please set an output folder in settings.")]
    MissingOutputFolder,
    #[error("Invalid file type: {path}")]
    UnsupportedSource { path: String },
    #[error("Invalid source path: {path}")]
    InvalidSource { path: String },
    #[error("Unknown setting: {key}")]
    UnknownField { key: String },
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Output frame rate cap. `Uncapped` keeps the source frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameLimit {
    #[serde(rename = "None")]
    Uncapped,
    #[serde(rename = "30")]
    Fps30,
    #[serde(rename = "60")]
    Fps60,
    #[serde(rename = "120")]
    Fps120,
}

impl FrameLimit {
    pub const ALL: [FrameLimit; 4] = [
        FrameLimit::Uncapped,
        FrameLimit::Fps30,
        FrameLimit::Fps60,
        FrameLimit::Fps120,
    ];

    pub fn fps(&self) -> Option<u32> {
        match self {
            FrameLimit::Uncapped => None,
            FrameLimit::Fps30 => Some(30),
            FrameLimit::Fps60 => Some(60),
            FrameLimit::Fps120 => Some(120),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameLimit::Uncapped => "None",
            FrameLimit::Fps30 => "30",
            FrameLimit::Fps60 => "60",
            FrameLimit::Fps120 => "120",
        }
    }
}

impl fmt::Display for FrameLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FrameLimit {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|limit| limit.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "1080p")]
    R1080,
    #[serde(rename = "720p")]
    R720,
    #[serde(rename = "480p")]
    R480,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::R1080, Resolution::R720, Resolution::R480];

    pub fn to_height(&self) -> u32 {
        match self {
            Resolution::R1080 => 1080,
            Resolution::R720 => 720,
            Resolution::R480 => 480,
        }
    }

    /// Height to scale down to, or `None` when the source is left unscaled.
    pub fn scale_height(&self) -> Option<u32> {
        match self {
            Resolution::R1080 => None,
            other => Some(other.to_height()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::R1080 => "1080p",
            Resolution::R720 => "720p",
            Resolution::R480 => "480p",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resolution {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|res| res.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

// Advisory only; the encoder speed preset stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionLevel {
    Fast,
    Balanced,
    #[serde(rename = "High Quality")]
    HighQuality,
}

impl CompressionLevel {
    pub const ALL: [CompressionLevel; 3] = [
        CompressionLevel::Fast,
        CompressionLevel::Balanced,
        CompressionLevel::HighQuality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionLevel::Fast => "Fast",
            CompressionLevel::Balanced => "Balanced",
            CompressionLevel::HighQuality => "High Quality",
        }
    }
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or(())
    }
}

fn bitrate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(\.\d+)?[kKmM]?$").expect("bitrate pattern compiles"))
}

/// A video bitrate in encoder rate syntax, e.g. `2000k` or `2.5M`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Bitrate(String);

impl Bitrate {
    pub fn new(value: impl Into<String>) -> Result<Self, ConfigurationError> {
        let value = value.into();
        if bitrate_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(ConfigurationError::InvalidValue {
                key: SettingField::Bitrate.key().to_string(),
                value,
            })
        }
    }

    // For built-in literals that are known to match the rate syntax.
    pub(crate) fn trusted(value: &str) -> Self {
        Self(value.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Bitrate {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Bitrate::new(value)
    }
}

impl From<Bitrate> for String {
    fn from(bitrate: Bitrate) -> Self {
        bitrate.0
    }
}

impl fmt::Display for Bitrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted configuration document.
///
/// Missing keys take their default individually; unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub frame_limit: FrameLimit,
    pub bitrate: Bitrate,
    pub audio_enabled: bool,
    pub resolution: Resolution,
    pub two_pass: bool,
    pub output_folder: PathBuf,
    pub compression_level: CompressionLevel,
    pub preset: PresetId,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frame_limit: FrameLimit::Fps60,
            bitrate: Bitrate::trusted("2000k"),
            audio_enabled: true,
            resolution: Resolution::R1080,
            two_pass: false,
            output_folder: PathBuf::new(),
            compression_level: CompressionLevel::Balanced,
            preset: PresetId::Medium,
        }
    }
}

impl Settings {
    pub fn output_folder(&self) -> Option<&Path> {
        if self.output_folder.as_os_str().is_empty() {
            None
        } else {
            Some(&self.output_folder)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    FrameLimit,
    Bitrate,
    AudioEnabled,
    Resolution,
    TwoPass,
    OutputFolder,
    CompressionLevel,
}

impl SettingField {
    pub fn key(&self) -> &'static str {
        match self {
            SettingField::FrameLimit => "frame_limit",
            SettingField::Bitrate => "bitrate",
            SettingField::AudioEnabled => "audio_enabled",
            SettingField::Resolution => "resolution",
            SettingField::TwoPass => "two_pass",
            SettingField::OutputFolder => "output_folder",
            SettingField::CompressionLevel => "compression_level",
        }
    }

    /// Whether a preset bundle controls this field.
    pub fn is_preset_governed(&self) -> bool {
        !matches!(self, SettingField::OutputFolder)
    }
}

impl FromStr for SettingField {
    type Err = ConfigurationError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "frame_limit" => Ok(SettingField::FrameLimit),
            "bitrate" => Ok(SettingField::Bitrate),
            "audio_enabled" => Ok(SettingField::AudioEnabled),
            "resolution" => Ok(SettingField::Resolution),
            "two_pass" => Ok(SettingField::TwoPass),
            "output_folder" => Ok(SettingField::OutputFolder),
            "compression_level" => Ok(SettingField::CompressionLevel),
            other => Err(ConfigurationError::UnknownField {
                key: other.to_string(),
            }),
        }
    }
}

/// A single typed edit to the live settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingUpdate {
    FrameLimit(FrameLimit),
    Bitrate(Bitrate),
    AudioEnabled(bool),
    Resolution(Resolution),
    TwoPass(bool),
    OutputFolder(PathBuf),
    CompressionLevel(CompressionLevel),
}

impl SettingUpdate {
    /// Parses a `key`/`value` pair spelled the way the settings document spells it.
    pub fn parse(key: &str, value: &str) -> Result<Self, ConfigurationError> {
        let field: SettingField = key.parse()?;
        let invalid = || ConfigurationError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        let update = match field {
            SettingField::FrameLimit => {
                SettingUpdate::FrameLimit(value.parse().map_err(|_| invalid())?)
            }
            SettingField::Bitrate => SettingUpdate::Bitrate(Bitrate::new(value.trim())?),
            SettingField::AudioEnabled => {
                SettingUpdate::AudioEnabled(parse_bool(value).ok_or_else(invalid)?)
            }
            SettingField::Resolution => {
                SettingUpdate::Resolution(value.parse().map_err(|_| invalid())?)
            }
            SettingField::TwoPass => SettingUpdate::TwoPass(parse_bool(value).ok_or_else(invalid)?),
            SettingField::OutputFolder => SettingUpdate::OutputFolder(PathBuf::from(value)),
            SettingField::CompressionLevel => {
                SettingUpdate::CompressionLevel(value.parse().map_err(|_| invalid())?)
            }
        };
        Ok(update)
    }

    pub fn field(&self) -> SettingField {
        match self {
            SettingUpdate::FrameLimit(_) => SettingField::FrameLimit,
            SettingUpdate::Bitrate(_) => SettingField::Bitrate,
            SettingUpdate::AudioEnabled(_) => SettingField::AudioEnabled,
            SettingUpdate::Resolution(_) => SettingField::Resolution,
            SettingUpdate::TwoPass(_) => SettingField::TwoPass,
            SettingUpdate::OutputFolder(_) => SettingField::OutputFolder,
            SettingUpdate::CompressionLevel(_) => SettingField::CompressionLevel,
        }
    }

    /// Writes the value only; provenance is handled by the caller.
    pub fn write_to(self, settings: &mut Settings) {
        match self {
            SettingUpdate::FrameLimit(v) => settings.frame_limit = v,
            SettingUpdate::Bitrate(v) => settings.bitrate = v,
            SettingUpdate::AudioEnabled(v) => settings.audio_enabled = v,
            SettingUpdate::Resolution(v) => settings.resolution = v,
            SettingUpdate::TwoPass(v) => settings.two_pass = v,
            SettingUpdate::OutputFolder(v) => settings.output_folder = v,
            SettingUpdate::CompressionLevel(v) => settings.compression_level = v,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
