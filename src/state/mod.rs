use crate::config::{SettingUpdate, Settings};
use crate::constants::BYTES_PER_MIB;
use crate::presets::{self, PresetId};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// Why a job ended without a usable output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("FFmpeg not found!")]
    EncoderMissing { path: PathBuf },
    #[error("Compression failed.")]
    EncodeFailed { code: Option<i32> },
    #[error("Could not start FFmpeg: {message}")]
    LaunchFailed { message: String },
    #[error("Compressed file is missing: {}", .path.display())]
    OutputMissing { path: PathBuf },
    #[error("Compression cancelled.")]
    Cancelled,
}

/// Success payload: sizes before and after, in MiB rounded to two decimals.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionReport {
    pub job_id: Uuid,
    pub output_path: PathBuf,
    pub original_mb: f64,
    pub compressed_mb: f64,
}

impl CompressionReport {
    pub fn new(job_id: Uuid, output_path: PathBuf, original_bytes: u64, compressed_bytes: u64) -> Self {
        Self {
            job_id,
            output_path,
            original_mb: mebibytes(original_bytes),
            compressed_mb: mebibytes(compressed_bytes),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Compressed to: {}MB from: {}MB",
            format_mb(self.compressed_mb),
            format_mb(self.original_mb)
        )
    }
}

// Whole numbers keep one decimal: 10.0, 2.5, 3.46
fn format_mb(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

pub fn mebibytes(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MIB * 100.0).round() / 100.0
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running {
        job_id: Uuid,
        source_path: PathBuf,
        output_path: PathBuf,
    },
    Succeeded(CompressionReport),
    Failed {
        job_id: Uuid,
        reason: FailureReason,
    },
}

impl JobStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running { .. })
    }

    pub fn job_id(&self) -> Option<Uuid> {
        match self {
            JobStatus::Running { job_id, .. } | JobStatus::Failed { job_id, .. } => Some(*job_id),
            JobStatus::Succeeded(report) => Some(report.job_id),
            JobStatus::Idle => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            JobStatus::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// One line for the status label.
    pub fn message(&self) -> String {
        match self {
            JobStatus::Idle => String::new(),
            JobStatus::Running { .. } => "Compressing...".to_string(),
            JobStatus::Succeeded(report) => report.summary(),
            JobStatus::Failed { reason, .. } => reason.to_string(),
        }
    }
}

/// The live, caller-owned configuration: settings plus the selected source.
///
/// Every mutation goes through this type so the provenance rule holds after
/// each call.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationSession {
    settings: Settings,
    source: Option<PathBuf>,
}

impl ConfigurationSession {
    pub fn new(settings: Settings) -> Self {
        let mut session = Self {
            settings,
            source: None,
        };
        session.check_provenance();
        session
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// An owned copy for a job; later edits never reach it.
    pub fn snapshot(&self) -> Settings {
        self.settings.clone()
    }

    pub fn replace_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.check_provenance();
    }

    pub fn selected_source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, path: PathBuf) {
        self.source = Some(path);
    }

    pub fn apply_preset(&mut self, name: &str) -> PresetId {
        let id = presets::apply_in_place(&mut self.settings, name);
        self.check_provenance();
        id
    }

    pub fn update(&mut self, update: SettingUpdate) {
        let field = update.field();
        update.write_to(&mut self.settings);
        presets::mark_custom_on_edit(&mut self.settings, field);
        self.check_provenance();
    }

    fn check_provenance(&mut self) {
        if presets::enforce_provenance(&mut self.settings) {
            tracing::debug!("Provenance reset to {}", self.settings.preset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bitrate, Resolution};

    #[test]
    fn test_mebibytes_rounding() {
        assert_eq!(mebibytes(10_485_760), 10.0);
        assert_eq!(mebibytes(0), 0.0);
        assert_eq!(mebibytes(1_572_864), 1.5);
        // 3.456 MiB
        assert_eq!(mebibytes(3_623_878), 3.46);
    }

    #[test]
    fn test_report_summary() {
        let report = CompressionReport::new(Uuid::new_v4(), PathBuf::from("/out/a.mp4"), 10_485_760, 2_621_440);
        assert_eq!(report.original_mb, 10.0);
        assert_eq!(report.compressed_mb, 2.5);
        assert_eq!(report.summary(), "Compressed to: 2.5MB from: 10.0MB");

        let uneven = CompressionReport::new(Uuid::new_v4(), PathBuf::from("/out/b.mp4"), 3_623_878, 1_048_576);
        assert_eq!(uneven.summary(), "Compressed to: 1.0MB from: 3.46MB");
    }

    #[test]
    fn test_status_queries() {
        let id = Uuid::new_v4();
        let failed = JobStatus::Failed {
            job_id: id,
            reason: FailureReason::EncodeFailed { code: Some(1) },
        };
        assert!(!failed.is_running());
        assert_eq!(failed.job_id(), Some(id));
        assert_eq!(failed.message(), "Compression failed.");
        assert_eq!(JobStatus::default(), JobStatus::Idle);
        assert_eq!(JobStatus::default().job_id(), None);
    }

    #[test]
    fn test_session_edit_marks_custom() {
        let mut session = ConfigurationSession::new(Settings::default());
        session.apply_preset("Low");
        assert_eq!(session.settings().preset, PresetId::Low);

        session.update(SettingUpdate::Resolution(Resolution::R480));
        assert_eq!(session.settings().preset, PresetId::Custom);
    }

    #[test]
    fn test_session_output_folder_edit_keeps_preset() {
        let mut session = ConfigurationSession::new(Settings::default());
        session.apply_preset("Ultra");
        session.update(SettingUpdate::OutputFolder(PathBuf::from("/videos/out")));

        assert_eq!(session.settings().preset, PresetId::Ultra);
        assert_eq!(session.settings().output_folder(), Some(Path::new("/videos/out")));
    }

    #[test]
    fn test_session_repairs_inconsistent_settings() {
        let mut settings = Settings::default();
        settings.bitrate = Bitrate::new("900k").unwrap();
        let session = ConfigurationSession::new(settings);
        assert_eq!(session.settings().preset, PresetId::Custom);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut session = ConfigurationSession::new(Settings::default());
        let snapshot = session.snapshot();
        session.update(SettingUpdate::TwoPass(true));

        assert!(!snapshot.two_pass);
        assert_eq!(snapshot.preset, PresetId::Medium);
    }
}
