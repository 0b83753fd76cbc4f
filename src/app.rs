use crate::config::SettingUpdate;
use crate::constants::VIDEO_EXTENSIONS;
use crate::events::{create_event_channel, AppEvent, EventReceiver};
use crate::services::ServiceManager;
use std::path::PathBuf;

pub struct CondenseApp {
    pub services: ServiceManager,
    pub events: EventReceiver,
    pub message: Option<String>,
    pub show_settings: bool,
    pub bitrate_input: String,
}

impl CondenseApp {
    pub fn new() -> Self {
        let (sender, events) = create_event_channel();
        Self::with_services(ServiceManager::new(sender), events)
    }

    pub fn with_services(services: ServiceManager, events: EventReceiver) -> Self {
        let bitrate_input = services.settings().bitrate.to_string();
        let mut app = Self {
            services,
            events,
            message: None,
            show_settings: false,
            bitrate_input,
        };

        if !app.services.encoder_path().is_file() {
            tracing::warn!("Encoder missing at {:?}", app.services.encoder_path());
        }
        app.update_status();
        app
    }

    pub fn select_input(&mut self) {
        let dialog = rfd::FileDialog::new().add_filter("Video Files", VIDEO_EXTENSIONS);
        if let Some(path) = dialog.pick_file() {
            self.services.select_source(path);
        }
    }

    pub fn handle_dropped(&mut self, paths: Vec<PathBuf>) {
        // Only the first dropped file is used
        if let Some(path) = paths.into_iter().next() {
            self.services.select_source(path);
        }
    }

    pub fn select_output_folder(&mut self) {
        let mut dialog = rfd::FileDialog::new();
        if let Some(current) = self.services.settings().output_folder() {
            dialog = dialog.set_directory(current);
        }

        if let Some(folder) = dialog.pick_folder() {
            self.set_output_folder(folder);
        }
    }

    pub fn set_output_folder(&mut self, folder: PathBuf) {
        self.services.update(SettingUpdate::OutputFolder(folder));
    }

    pub fn start_compression(&mut self) {
        match self.services.start_compression() {
            Ok(job_id) => tracing::info!("Compression job {} started", job_id),
            Err(e) => {
                tracing::warn!("Compression not started: {}", e);
                self.message = Some(e.to_string());
            }
        }
    }

    pub fn cancel_compression(&mut self) {
        self.services.cancel_compression();
    }

    pub fn apply_preset(&mut self, name: &str) {
        self.services.apply_preset(name);
        self.bitrate_input = self.services.settings().bitrate.to_string();
    }

    pub fn commit_bitrate(&mut self) {
        if self.bitrate_input.trim() == self.services.settings().bitrate.as_str() {
            return;
        }
        let value = self.bitrate_input.clone();
        if let Err(e) = self.services.update_field("bitrate", &value) {
            self.message = Some(e.to_string());
            self.bitrate_input = self.services.settings().bitrate.to_string();
        }
    }

    pub fn save_settings(&mut self) {
        self.commit_bitrate();
        // Failures arrive as an ErrorOccurred event
        let _ = self.services.save_settings();
    }

    pub fn update_status(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::SourceSelected(_) | AppEvent::CompressionStarted { .. } => {
                self.message = None;
            }
            AppEvent::SourceRejected(_) => {
                self.message = Some("Invalid file type".to_string());
            }
            AppEvent::CompressionSucceeded(report) => {
                tracing::info!("{}", report.summary());
                self.message = None;
            }
            AppEvent::CompressionFailed { reason, .. } => {
                tracing::warn!("Compression failed: {}", reason);
                self.message = None;
            }
            AppEvent::ConfigSaved => {
                self.message = Some("Settings saved.".to_string());
            }
            AppEvent::ConfigLoaded => {
                self.bitrate_input = self.services.settings().bitrate.to_string();
            }
            AppEvent::ErrorOccurred(message) => {
                self.message = Some(message);
            }
            AppEvent::PresetApplied(_) | AppEvent::SettingsChanged => {}
        }
    }

    /// The text under the Compress button.
    pub fn status_text(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.services.query_status().message(),
        }
    }

    pub fn source_label(&self) -> String {
        match self.services.selected_source() {
            Some(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
            None => "No video selected".to_string(),
        }
    }
}

impl Default for CondenseApp {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CondenseApp {
    fn drop(&mut self) {
        self.services.shutdown();
    }
}
