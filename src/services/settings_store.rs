use crate::config::{SettingField, Settings};
use crate::constants::{CONFIG_DIR_NAME, SETTINGS_FILE_NAME};
use crate::presets;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine the configuration directory")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Reads and writes the settings document.
///
/// Loading never fails: an absent, unreadable or malformed document yields
/// the defaults, and missing keys fall back one by one.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: Option<PathBuf>,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(SETTINGS_FILE_NAME))
    }

    pub fn load(&self) -> Settings {
        let Some(path) = &self.path else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Settings::default();
        };

        if !path.exists() {
            tracing::info!("Settings file doesn't exist, using defaults");
            return Settings::default();
        }

        let mut settings = match std::fs::read_to_string(path) {
            Ok(data) => match parse_document(&data) {
                Ok(settings) => {
                    tracing::info!("Settings loaded from: {:?}", path);
                    settings
                }
                Err(e) => {
                    tracing::warn!("Failed to parse settings file, using defaults: {}", e);
                    Settings::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read settings file, using defaults: {}", e);
                Settings::default()
            }
        };

        presets::enforce_provenance(&mut settings);
        settings
    }

    /// Overwrites the whole document with `settings`.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let path = self.path.as_ref().ok_or(SettingsError::NoConfigDir)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let data = serde_json::to_string_pretty(settings)?;
        std::fs::write(path, data)?;

        tracing::info!("Settings saved to: {:?}", path);
        Ok(())
    }
}

fn parse_document(data: &str) -> Result<Settings, serde_json::Error> {
    let document: serde_json::Value = serde_json::from_str(data)?;
    let has_level = document
        .get(SettingField::CompressionLevel.key())
        .is_some();
    let mut settings: Settings = serde_json::from_value(document)?;

    // Documents written before compression levels existed take their preset's level
    if !has_level {
        if let Some(preset) = presets::bundle(settings.preset) {
            settings.compression_level = preset.compression_level;
        }
    }
    Ok(settings)
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bitrate, CompressionLevel, FrameLimit, Resolution};
    use crate::presets::PresetId;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("condense_settings.json"));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_corrupted_document_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("condense_settings.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = SettingsStore::with_path(&path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_invalid_value_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("condense_settings.json");
        std::fs::write(&path, r#"{"bitrate": "lots", "two_pass": true}"#).unwrap();

        let store = SettingsStore::with_path(&path);
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::with_path(dir.path().join("nested").join("settings.json"));

        let mut settings = presets::apply(Settings::default(), "Ultra");
        settings.output_folder = PathBuf::from("/videos/out");
        store.save(&settings).unwrap();

        assert_eq!(store.load(), settings);
    }

    #[test]
    fn test_save_overwrites_previous_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"stale_key": 1, "bitrate": "100k"}"#).unwrap();

        let store = SettingsStore::with_path(&path);
        store.save(&Settings::default()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("stale_key"));
        assert!(written.contains("\"2000k\""));
    }

    #[test]
    fn test_document_field_spellings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::with_path(&path);
        store.save(&presets::apply(Settings::default(), "Ultra")).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["frame_limit"], "60");
        assert_eq!(value["resolution"], "1080p");
        assert_eq!(value["compression_level"], "High Quality");
        assert_eq!(value["preset"], "Ultra");
        assert_eq!(value["two_pass"], true);
    }

    #[test]
    fn test_missing_keys_fall_back_individually() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"frame_limit": "30", "output_folder": "/videos/out", "preset": "Custom", "future_key": [1, 2]}"#,
        )
        .unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.frame_limit, FrameLimit::Fps30);
        assert_eq!(settings.output_folder, PathBuf::from("/videos/out"));
        assert_eq!(settings.bitrate, Bitrate::new("2000k").unwrap());
        assert_eq!(settings.resolution, Resolution::R1080);
        assert_eq!(settings.compression_level, CompressionLevel::Balanced);
        assert!(settings.audio_enabled);
        assert_eq!(settings.preset, PresetId::Custom);
    }

    #[test]
    fn test_mismatched_provenance_is_repaired() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"preset": "Ultra", "bitrate": "500k"}"#).unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.preset, PresetId::Custom);
        assert_eq!(settings.bitrate, Bitrate::new("500k").unwrap());
    }

    #[test]
    fn test_document_without_compression_level_keeps_its_preset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("condense_settings.json");
        std::fs::write(
            &path,
            r##"{"frame_limit": "60", "bitrate": "2000k", "audio_enabled": true,
                "resolution": "720p", "two_pass": false, "output_folder": "",
                "theme_color": "#1f6aa5", "preset": "High"}"##,
        )
        .unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.preset, PresetId::High);
        assert_eq!(settings.resolution, Resolution::R720);
        assert_eq!(settings.bitrate, Bitrate::new("2000k").unwrap());
        assert_eq!(settings.compression_level, CompressionLevel::HighQuality);
    }

    #[test]
    fn test_legacy_discord_document_keeps_low_preset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("condense_settings.json");
        std::fs::write(
            &path,
            r#"{"frame_limit": "30", "bitrate": "1000k", "audio_enabled": true,
                "resolution": "480p", "two_pass": false, "output_folder": "/videos",
                "preset": "Low (Discord)"}"#,
        )
        .unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.preset, PresetId::Low);
        assert_eq!(settings.output_folder, PathBuf::from("/videos"));
    }

    #[test]
    fn test_explicit_compression_level_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("condense_settings.json");
        let mut document =
            serde_json::to_value(presets::apply(Settings::default(), "High")).unwrap();
        document["compression_level"] = serde_json::Value::from("Fast");
        std::fs::write(&path, document.to_string()).unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.compression_level, CompressionLevel::Fast);
        assert_eq!(settings.preset, PresetId::Custom);
    }

    #[test]
    fn test_legacy_low_preset_label() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut document =
            serde_json::to_value(presets::apply(Settings::default(), "Low")).unwrap();
        document["preset"] = serde_json::Value::from("Low (Discord)");
        std::fs::write(&path, document.to_string()).unwrap();

        let settings = SettingsStore::with_path(&path).load();
        assert_eq!(settings.preset, PresetId::Low);
    }
}
