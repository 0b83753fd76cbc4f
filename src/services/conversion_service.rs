use crate::config::ConfigurationError;
use crate::conversion::process::{terminate_process, ProcessLauncher};
use crate::conversion::Job;
use crate::events::{publish, AppEvent, EventSender};
use crate::state::{CompressionReport, FailureReason, JobStatus};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StartError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("FFmpeg not found!")]
    EncoderMissing { path: PathBuf },
    #[error("A compression is already running")]
    AlreadyRunning,
    #[error("Could not start the encoder worker: {0}")]
    Worker(#[from] std::io::Error),
}

/// Runs at most one encoder job at a time on a background thread.
///
/// `start` returns as soon as the job is launched; callers poll `status` or
/// listen for events. The terminal status is stored before the slot is
/// released, so a caller that sees `is_running() == false` always reads the
/// final outcome.
pub struct InvocationRunner {
    launcher: Arc<dyn ProcessLauncher + Send + Sync>,
    encoder_path: PathBuf,
    event_sender: EventSender,
    running: Arc<AtomicBool>,
    cancel_requested: Arc<AtomicBool>,
    status: Arc<Mutex<JobStatus>>,
    active_pid: Arc<Mutex<Option<u32>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl InvocationRunner {
    pub fn new(
        launcher: Arc<dyn ProcessLauncher + Send + Sync>,
        encoder_path: PathBuf,
        event_sender: EventSender,
    ) -> Self {
        Self {
            launcher,
            encoder_path,
            event_sender,
            running: Arc::new(AtomicBool::new(false)),
            cancel_requested: Arc::new(AtomicBool::new(false)),
            status: Arc::new(Mutex::new(JobStatus::Idle)),
            active_pid: Arc::new(Mutex::new(None)),
            worker: Mutex::new(None),
        }
    }

    pub fn encoder_path(&self) -> &Path {
        &self.encoder_path
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> JobStatus {
        lock(&self.status).clone()
    }

    /// Claims the single job slot.
    fn try_start(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    fn finish(&self, status: JobStatus) {
        *lock(&self.status) = status;
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn start(&self, job: Job) -> Result<Uuid, StartError> {
        if !self.try_start() {
            tracing::warn!(
                "Rejected job {}: job {:?} is still running",
                job.id,
                self.status().job_id()
            );
            return Err(StartError::AlreadyRunning);
        }

        if !self.encoder_path.is_file() {
            tracing::error!("Encoder not found at {:?}", self.encoder_path);
            let reason = FailureReason::EncoderMissing {
                path: self.encoder_path.clone(),
            };
            self.finish(JobStatus::Failed {
                job_id: job.id,
                reason: reason.clone(),
            });
            publish(
                &self.event_sender,
                AppEvent::CompressionFailed {
                    job_id: job.id,
                    reason,
                },
            );
            return Err(StartError::EncoderMissing {
                path: self.encoder_path.clone(),
            });
        }

        let original_bytes = match std::fs::metadata(&job.source_path) {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                tracing::error!("Cannot read source {:?}: {}", job.source_path, e);
                self.running.store(false, Ordering::SeqCst);
                return Err(ConfigurationError::InvalidSource {
                    path: job.source_path.display().to_string(),
                }
                .into());
            }
        };

        self.reap_previous_worker();
        self.cancel_requested.store(false, Ordering::SeqCst);

        let job_id = job.id;
        *lock(&self.status) = JobStatus::Running {
            job_id,
            source_path: job.source_path.clone(),
            output_path: job.output_path().to_path_buf(),
        };
        publish(
            &self.event_sender,
            AppEvent::CompressionStarted {
                job_id,
                source: job.source_path.clone(),
                output: job.output_path().to_path_buf(),
            },
        );
        tracing::info!(
            "Starting job {}: {:?} -> {:?} ({} pass(es))",
            job_id,
            job.source_path,
            job.output_path(),
            job.command.passes.len()
        );

        let worker = Worker {
            launcher: Arc::clone(&self.launcher),
            encoder_path: self.encoder_path.clone(),
            event_sender: self.event_sender.clone(),
            running: Arc::clone(&self.running),
            cancel_requested: Arc::clone(&self.cancel_requested),
            status: Arc::clone(&self.status),
            active_pid: Arc::clone(&self.active_pid),
        };

        let spawned = std::thread::Builder::new()
            .name(format!("encoder-{}", job_id))
            .spawn(move || worker.run(job, original_bytes));

        match spawned {
            Ok(handle) => {
                *lock(&self.worker) = Some(handle);
                Ok(job_id)
            }
            Err(e) => {
                tracing::error!("Failed to spawn encoder worker: {}", e);
                let reason = FailureReason::LaunchFailed {
                    message: e.to_string(),
                };
                self.finish(JobStatus::Failed {
                    job_id,
                    reason: reason.clone(),
                });
                publish(
                    &self.event_sender,
                    AppEvent::CompressionFailed { job_id, reason },
                );
                Err(StartError::Worker(e))
            }
        }
    }

    /// Asks the running encoder to stop. Returns `false` when nothing runs.
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }

        self.cancel_requested.store(true, Ordering::SeqCst);
        if let Some(pid) = *lock(&self.active_pid) {
            tracing::info!("Terminating encoder process {}", pid);
            if let Err(e) = terminate_process(pid) {
                tracing::warn!("Failed to terminate encoder process {}: {}", pid, e);
            }
        }
        true
    }

    /// Blocks until the current worker, if any, has finished.
    pub fn join(&self) {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Encoder worker panicked");
            }
        }
    }

    fn reap_previous_worker(&self) {
        // The slot is free, so any stored handle belongs to a finished worker
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }
}

struct Worker {
    launcher: Arc<dyn ProcessLauncher + Send + Sync>,
    encoder_path: PathBuf,
    event_sender: EventSender,
    running: Arc<AtomicBool>,
    cancel_requested: Arc<AtomicBool>,
    status: Arc<Mutex<JobStatus>>,
    active_pid: Arc<Mutex<Option<u32>>>,
}

impl Worker {
    fn run(self, job: Job, original_bytes: u64) {
        let job_id = job.id;
        let outcome = self.execute(&job, original_bytes);
        cleanup_pass_logs(&job);

        let (status, event) = match outcome {
            Ok(report) => {
                tracing::info!("Job {} finished: {}", job_id, report.summary());
                (
                    JobStatus::Succeeded(report.clone()),
                    AppEvent::CompressionSucceeded(report),
                )
            }
            Err(reason) => {
                tracing::error!("Job {} failed: {:?}", job_id, reason);
                (
                    JobStatus::Failed {
                        job_id,
                        reason: reason.clone(),
                    },
                    AppEvent::CompressionFailed { job_id, reason },
                )
            }
        };

        *lock(&self.status) = status;
        self.running.store(false, Ordering::SeqCst);
        publish(&self.event_sender, event);
    }

    fn execute(&self, job: &Job, original_bytes: u64) -> Result<CompressionReport, FailureReason> {
        let total = job.command.passes.len();

        for (index, pass) in job.command.passes.iter().enumerate() {
            if self.cancelled() {
                return Err(FailureReason::Cancelled);
            }

            tracing::debug!("Job {}: pass {}/{}", job.id, index + 1, total);
            let mut process = self
                .launcher
                .launch(&self.encoder_path, &pass.args)
                .map_err(|e| FailureReason::LaunchFailed {
                    message: e.to_string(),
                })?;

            *lock(&self.active_pid) = process.id();
            if self.cancelled() {
                if let Some(pid) = process.id() {
                    let _ = terminate_process(pid);
                }
            }

            let exit = process.wait();
            *lock(&self.active_pid) = None;

            if self.cancelled() {
                return Err(FailureReason::Cancelled);
            }

            let exit = exit.map_err(|e| FailureReason::LaunchFailed {
                message: e.to_string(),
            })?;
            if !exit.success() {
                return Err(FailureReason::EncodeFailed { code: exit.code });
            }
        }

        let output_path = job.output_path().to_path_buf();
        let compressed_bytes = std::fs::metadata(&output_path)
            .map(|metadata| metadata.len())
            .map_err(|_| FailureReason::OutputMissing {
                path: output_path.clone(),
            })?;

        Ok(CompressionReport::new(
            job.id,
            output_path,
            original_bytes,
            compressed_bytes,
        ))
    }

    fn cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }
}

fn cleanup_pass_logs(job: &Job) {
    for file in job.command.pass_log_files() {
        match std::fs::remove_file(&file) {
            Ok(()) => tracing::debug!("Removed pass log {:?}", file),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not remove pass log {:?}: {}", file, e),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
