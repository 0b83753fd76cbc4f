use crate::constants::ENCODER_BINARY;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// How an encoder process ended. `code` is `None` when it was killed by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    pub code: Option<i32>,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A spawned encoder the runner can wait on.
pub trait EncoderProcess: Send {
    fn id(&self) -> Option<u32>;
    fn wait(&mut self) -> io::Result<ProcessExit>;
}

// Seam between the runner and the OS, swapped for a spy in tests
#[cfg_attr(test, mockall::automock)]
pub trait ProcessLauncher {
    fn launch(&self, program: &Path, args: &[OsString]) -> io::Result<Box<dyn EncoderProcess>>;
}

pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, program: &Path, args: &[OsString]) -> io::Result<Box<dyn EncoderProcess>> {
        tracing::debug!("Spawning {:?} {:?}", program, args);

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        let child = command.spawn()?;

        Ok(Box::new(ChildProcess { child }))
    }
}

struct ChildProcess {
    child: Child,
}

impl EncoderProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        Some(self.child.id())
    }

    fn wait(&mut self) -> io::Result<ProcessExit> {
        let status = self.child.wait()?;
        Ok(ProcessExit {
            code: status.code(),
        })
    }
}

/// The encoder binary expected next to the running executable.
pub fn default_encoder_path() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(ENCODER_BINARY))
            .unwrap_or_else(|| PathBuf::from(ENCODER_BINARY)),
        Err(e) => {
            tracing::warn!("Could not resolve the executable location: {}", e);
            PathBuf::from(ENCODER_BINARY)
        }
    }
}

/// Forcibly ends a running encoder.
pub fn terminate_process(pid: u32) -> io::Result<()> {
    #[cfg(windows)]
    let status = Command::new("taskkill")
        .args(["/F", "/PID", &pid.to_string()])
        .status()?;

    #[cfg(not(windows))]
    let status = Command::new("kill")
        .arg("-TERM")
        .arg(pid.to_string())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Other,
            format!("could not terminate process {}", pid),
        ))
    }
}
