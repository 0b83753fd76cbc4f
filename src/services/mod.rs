use crate::config::{ConfigurationError, SettingUpdate, Settings};
use crate::conversion::process::{default_encoder_path, ProcessLauncher, SystemLauncher};
use crate::conversion::Job;
use crate::events::{publish, AppEvent, EventSender};
use crate::presets::PresetId;
use crate::state::{ConfigurationSession, JobStatus};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

pub mod conversion_service;
pub mod settings_store;
pub mod validation_service;

pub use conversion_service::{InvocationRunner, StartError};
pub use settings_store::{SettingsError, SettingsStore};
pub use validation_service::ValidationService;

/// The operations the window calls. Owns the live configuration and the
/// runner; everything else is reached through here.
pub struct ServiceManager {
    session: ConfigurationSession,
    store: SettingsStore,
    validation: ValidationService,
    runner: InvocationRunner,
    event_sender: EventSender,
}

impl ServiceManager {
    pub fn new(event_sender: EventSender) -> Self {
        Self::with_parts(
            SettingsStore::new(),
            Arc::new(SystemLauncher),
            default_encoder_path(),
            event_sender,
        )
    }

    pub fn with_parts(
        store: SettingsStore,
        launcher: Arc<dyn ProcessLauncher + Send + Sync>,
        encoder_path: PathBuf,
        event_sender: EventSender,
    ) -> Self {
        let session = ConfigurationSession::new(store.load());
        publish(&event_sender, AppEvent::ConfigLoaded);

        Self {
            session,
            store,
            validation: ValidationService::new(),
            runner: InvocationRunner::new(launcher, encoder_path, event_sender.clone()),
            event_sender,
        }
    }

    pub fn settings(&self) -> &Settings {
        self.session.settings()
    }

    pub fn selected_source(&self) -> Option<&Path> {
        self.session.selected_source()
    }

    pub fn encoder_path(&self) -> &Path {
        self.runner.encoder_path()
    }

    /// Accepts `path` as the source when it is an existing video file.
    pub fn select_source(&mut self, path: PathBuf) -> bool {
        match self.validation.validate_source(&path) {
            Ok(()) => {
                tracing::info!("Selected source: {:?}", path);
                self.session.set_source(path.clone());
                publish(&self.event_sender, AppEvent::SourceSelected(path));
                true
            }
            Err(e) => {
                tracing::warn!("Rejected source {:?}: {}", path, e);
                publish(&self.event_sender, AppEvent::SourceRejected(path));
                false
            }
        }
    }

    pub fn start_compression(&self) -> Result<Uuid, StartError> {
        if self.runner.is_running() {
            return Err(StartError::AlreadyRunning);
        }

        let settings = self.session.snapshot();
        let source = self
            .validation
            .validate_request(self.session.selected_source(), settings.output_folder())?;
        self.validation.validate_source(source)?;

        let job = Job::new(&settings, source)?;
        self.runner.start(job)
    }

    pub fn query_status(&self) -> JobStatus {
        self.runner.status()
    }

    pub fn is_running(&self) -> bool {
        self.runner.is_running()
    }

    pub fn cancel_compression(&self) -> bool {
        self.runner.cancel()
    }

    pub fn apply_preset(&mut self, name: &str) -> PresetId {
        let id = self.session.apply_preset(name);
        publish(&self.event_sender, AppEvent::PresetApplied(id.to_string()));
        id
    }

    /// Applies one edit given as document key and value. The `preset` key
    /// selects a preset; any other governed key switches provenance to Custom.
    pub fn update_field(&mut self, key: &str, value: &str) -> Result<(), ConfigurationError> {
        if key == "preset" {
            self.apply_preset(value);
            return Ok(());
        }

        let update = SettingUpdate::parse(key, value)?;
        self.update(update);
        Ok(())
    }

    pub fn update(&mut self, update: SettingUpdate) {
        tracing::debug!("Setting update: {:?}", update);
        self.session.update(update);
        publish(&self.event_sender, AppEvent::SettingsChanged);
    }

    pub fn save_settings(&self) -> Result<(), SettingsError> {
        match self.store.save(self.session.settings()) {
            Ok(()) => {
                publish(&self.event_sender, AppEvent::ConfigSaved);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to save settings: {}", e);
                publish(
                    &self.event_sender,
                    AppEvent::ErrorOccurred(format!("Failed to save settings: {}", e)),
                );
                Err(e)
            }
        }
    }

    pub fn load_settings(&mut self) {
        let settings = self.store.load();
        self.session.replace_settings(settings);
        publish(&self.event_sender, AppEvent::ConfigLoaded);
    }

    /// Stops a running job and waits for its worker.
    pub fn shutdown(&self) {
        if self.runner.cancel() {
            tracing::info!("Cancelled running compression on shutdown");
        }
        self.runner.join();
    }

    /// Blocks until the current job's worker has finished.
    pub fn wait_for_completion(&self) {
        self.runner.join();
    }
}
