use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::workspace::{ServiceCommand, ServicesConfig, WorkspaceError, write_bytes_atomic};

const STOP_GRACE: Duration = Duration::from_secs(3);
const STOP_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to write pid file: {0}")]
    PidFile(#[from] WorkspaceError),
    #[error("failed to start {service}: {source}")]
    Spawn {
        service: Service,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to signal {service} (pid {pid}): {reason}")]
    Signal {
        service: Service,
        pid: u32,
        reason: String,
    },
}

/// Background processes orchestrating the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Scheduler,
    Dashboard,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Scheduler, Service::Dashboard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Scheduler => "scheduler",
            Service::Dashboard => "dashboard",
        }
    }

    fn command<'a>(&self, config: &'a ServicesConfig) -> Option<&'a ServiceCommand> {
        match self {
            Service::Scheduler => config.scheduler.as_ref(),
            Service::Dashboard => config.dashboard.as_ref(),
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running(u32),
    Stopped,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Running(pid) => write!(f, "Running (pid {pid})"),
            ServiceStatus::Stopped => f.write_str("Stopped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(u32),
    AlreadyRunning(u32),
    NotConfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped(u32),
    NotRunning,
}

/// Starts and stops services, tracking them through PID files.
#[derive(Debug, Clone)]
pub struct ServiceManager {
    state_dir: PathBuf,
    log_dir: PathBuf,
}

impl ServiceManager {
    pub fn new(state_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self { state_dir, log_dir }
    }

    pub fn pid_path(&self, service: Service) -> PathBuf {
        self.state_dir.join(format!("{service}.pid"))
    }

    pub fn log_path(&self, service: Service) -> PathBuf {
        self.log_dir.join(format!("{service}.log"))
    }

    /// Spawn the configured command detached, with output appended to its log.
    pub fn start(
        &self,
        service: Service,
        config: &ServicesConfig,
    ) -> Result<StartOutcome, ServiceError> {
        let Some(command) = service.command(config) else {
            warn!(service = %service, "service not configured, skipping");
            return Ok(StartOutcome::NotConfigured);
        };
        if let ServiceStatus::Running(pid) = self.status(service) {
            return Ok(StartOutcome::AlreadyRunning(pid));
        }

        std::fs::create_dir_all(&self.log_dir)?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(service))?;
        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log)
            .spawn()
            .map_err(|source| ServiceError::Spawn { service, source })?;

        let pid = child.id();
        write_bytes_atomic(&self.pid_path(service), pid.to_string().as_bytes())?;
        info!(event = "service_started", service = %service, pid, program = %command.program);
        Ok(StartOutcome::Started(pid))
    }

    /// SIGTERM, then SIGKILL if the process outlives the grace period.
    pub fn stop(&self, service: Service) -> Result<StopOutcome, ServiceError> {
        let Some(pid) = read_pid(&self.pid_path(service)) else {
            return Ok(StopOutcome::NotRunning);
        };
        let outcome = if is_alive(pid) {
            terminate(service, pid)?;
            StopOutcome::Stopped(pid)
        } else {
            StopOutcome::NotRunning
        };
        remove_if_exists(&self.pid_path(service))?;
        info!(event = "service_stopped", service = %service, pid);
        Ok(outcome)
    }

    pub fn status(&self, service: Service) -> ServiceStatus {
        match read_pid(&self.pid_path(service)) {
            Some(pid) if is_alive(pid) => ServiceStatus::Running(pid),
            _ => ServiceStatus::Stopped,
        }
    }
}

/// Positive pid from a PID file. Anything that would not address exactly one
/// process (zero, negative, beyond `i32`) reads as no pid.
fn read_pid(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|content| content.trim().parse::<i32>().ok())
        .filter(|pid| *pid > 0)
        .and_then(|pid| u32::try_from(pid).ok())
}

fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn is_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::sys::wait::{WaitPidFlag, waitpid};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    let pid = Pid::from_raw(raw);
    // Reap our own exited children so they do not linger as zombies.
    let _ = waitpid(pid, Some(WaitPidFlag::WNOHANG));
    kill(pid, None).is_ok()
}

#[cfg(not(unix))]
fn is_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn terminate(service: Service, pid: u32) -> Result<(), ServiceError> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let signal_error = |err: Errno| ServiceError::Signal {
        service,
        pid,
        reason: err.to_string(),
    };
    let target = Pid::from_raw(i32::try_from(pid).map_err(|_| signal_error(Errno::EINVAL))?);

    match kill(target, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return Ok(()),
        Err(err) => return Err(signal_error(err)),
    }

    let deadline = Instant::now() + STOP_GRACE;
    while Instant::now() < deadline {
        if !is_alive(pid) {
            return Ok(());
        }
        std::thread::sleep(STOP_POLL);
    }

    warn!(service = %service, pid, "service ignored SIGTERM, sending SIGKILL");
    match kill(target, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(err) => Err(signal_error(err)),
    }
}

#[cfg(not(unix))]
fn terminate(service: Service, pid: u32) -> Result<(), ServiceError> {
    Err(ServiceError::Signal {
        service,
        pid,
        reason: "process signals are only supported on unix".to_string(),
    })
}
