// App Constants
pub const APP_NAME: &str = "Condense";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// Settings document
pub const CONFIG_DIR_NAME: &str = "condense";
pub const SETTINGS_FILE_NAME: &str = "condense_settings.json";

// Encoder binary, looked up next to the running executable
#[cfg(windows)]
pub const ENCODER_BINARY: &str = "ffmpeg.exe";
#[cfg(not(windows))]
pub const ENCODER_BINARY: &str = "ffmpeg";

// File handling
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi"];
pub const OUTPUT_SUFFIX: &str = "_compressed";
pub const OUTPUT_EXTENSION: &str = "mp4";
pub const PASS_LOG_SUFFIX: &str = "_passlog";

// Encoder arguments
pub const VIDEO_CODEC: &str = "libx264";
pub const ENCODER_SPEED_PRESET: &str = "medium";
pub const AUDIO_CODEC: &str = "aac";
pub const AUDIO_BITRATE: &str = "192k";
pub const AUDIO_SAMPLE_RATE: &str = "44100";

#[cfg(windows)]
pub const NULL_DEVICE: &str = "NUL";
#[cfg(not(windows))]
pub const NULL_DEVICE: &str = "/dev/null";

pub const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

// UI
pub const STATUS_REFRESH_INTERVAL_MS: u64 = 100;
