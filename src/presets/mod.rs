use crate::config::{Bitrate, CompressionLevel, FrameLimit, Resolution, SettingField, Settings};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Provenance marker stored in the settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresetId {
    Ultra,
    High,
    Medium,
    #[serde(alias = "Low (Discord)")]
    Low,
    Custom,
}

impl PresetId {
    pub const ALL: [PresetId; 5] = [
        PresetId::Ultra,
        PresetId::High,
        PresetId::Medium,
        PresetId::Low,
        PresetId::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PresetId::Ultra => "Ultra",
            PresetId::High => "High",
            PresetId::Medium => "Medium",
            PresetId::Low => "Low",
            PresetId::Custom => "Custom",
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        // Older settings files used the Discord label for the low preset
        if name.eq_ignore_ascii_case("Low (Discord)") {
            return Ok(PresetId::Low);
        }
        Self::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(name))
            .ok_or(())
    }
}

/// The governed values of a named preset.
#[derive(Debug, Clone, PartialEq)]
pub struct PresetBundle {
    pub id: PresetId,
    pub description: &'static str,
    pub frame_limit: FrameLimit,
    pub bitrate: Bitrate,
    pub resolution: Resolution,
    pub compression_level: CompressionLevel,
    pub two_pass: bool,
    pub audio_enabled: bool,
}

impl PresetBundle {
    fn write_to(&self, settings: &mut Settings) {
        settings.frame_limit = self.frame_limit;
        settings.bitrate = self.bitrate.clone();
        settings.resolution = self.resolution;
        settings.compression_level = self.compression_level;
        settings.two_pass = self.two_pass;
        settings.audio_enabled = self.audio_enabled;
    }

    pub fn matches(&self, settings: &Settings) -> bool {
        settings.frame_limit == self.frame_limit
            && settings.bitrate == self.bitrate
            && settings.resolution == self.resolution
            && settings.compression_level == self.compression_level
            && settings.two_pass == self.two_pass
            && settings.audio_enabled == self.audio_enabled
    }
}

fn builtin_presets() -> Vec<PresetBundle> {
    let rate = Bitrate::trusted;

    vec![
        PresetBundle {
            id: PresetId::Ultra,
            description: "Full resolution, highest bitrate, two-pass rate control",
            frame_limit: FrameLimit::Fps60,
            bitrate: rate("3000k"),
            resolution: Resolution::R1080,
            compression_level: CompressionLevel::HighQuality,
            two_pass: true,
            audio_enabled: true,
        },
        PresetBundle {
            id: PresetId::High,
            description: "720p at a generous bitrate",
            frame_limit: FrameLimit::Fps60,
            bitrate: rate("2000k"),
            resolution: Resolution::R720,
            compression_level: CompressionLevel::HighQuality,
            two_pass: false,
            audio_enabled: true,
        },
        PresetBundle {
            id: PresetId::Medium,
            description: "Balanced size and quality",
            frame_limit: FrameLimit::Fps60,
            bitrate: rate("2000k"),
            resolution: Resolution::R1080,
            compression_level: CompressionLevel::Balanced,
            two_pass: false,
            audio_enabled: true,
        },
        PresetBundle {
            id: PresetId::Low,
            description: "Small files for chat uploads",
            frame_limit: FrameLimit::Fps30,
            bitrate: rate("1000k"),
            resolution: Resolution::R480,
            compression_level: CompressionLevel::Fast,
            two_pass: false,
            audio_enabled: true,
        },
    ]
}

/// All preset bundles, in display order.
pub fn all_presets() -> &'static [PresetBundle] {
    static PRESETS: OnceLock<Vec<PresetBundle>> = OnceLock::new();
    PRESETS.get_or_init(builtin_presets)
}

pub fn bundle(id: PresetId) -> Option<&'static PresetBundle> {
    all_presets().iter().find(|preset| preset.id == id)
}

/// Applies the named preset onto `settings` and returns the result.
///
/// Unknown names (and `Custom`) only switch provenance to `Custom`.
pub fn apply(mut settings: Settings, preset_name: &str) -> Settings {
    apply_in_place(&mut settings, preset_name);
    settings
}

pub fn apply_in_place(settings: &mut Settings, preset_name: &str) -> PresetId {
    let found = preset_name.parse::<PresetId>().ok().and_then(bundle);

    match found {
        Some(preset) => {
            preset.write_to(settings);
            settings.preset = preset.id;
            tracing::debug!("Applied preset {}", preset.id);
        }
        None => {
            settings.preset = PresetId::Custom;
            tracing::debug!("No bundle for preset '{}', marking settings custom", preset_name);
        }
    }
    settings.preset
}

pub fn mark_custom_on_edit(settings: &mut Settings, changed_field: SettingField) {
    if changed_field.is_preset_governed() {
        settings.preset = PresetId::Custom;
    }
}

pub fn provenance_holds(settings: &Settings) -> bool {
    match settings.preset {
        PresetId::Custom => true,
        id => bundle(id).map_or(false, |preset| preset.matches(settings)),
    }
}

/// Resets provenance to `Custom` when the governed values disagree with the
/// claimed preset. Returns `true` when a repair happened.
pub fn enforce_provenance(settings: &mut Settings) -> bool {
    if provenance_holds(settings) {
        return false;
    }
    tracing::warn!(
        "Settings claim preset {} but differ from its bundle, marking custom",
        settings.preset
    );
    settings.preset = PresetId::Custom;
    true
}
