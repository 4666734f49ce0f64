//! Blocking execution of the external catalog command.

use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::error::{CatalogError, CatalogResult};

/// How long a cancelled process may take to exit after SIGTERM.
pub const CANCEL_GRACE: Duration = Duration::from_secs(1);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A fully resolved catalog invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory for the child; the simulator expects its project root.
    pub cwd: PathBuf,
}

impl CatalogCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.into(),
        }
    }
}

impl fmt::Display for CatalogCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured output of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` to completion, or until `cancel` is raised.
///
/// A non-zero exit becomes [`CatalogError::ProcessFailure`]. When `cancel`
/// is observed the child is terminated, whatever it printed is dropped and
/// [`CatalogError::Cancelled`] is returned.
pub fn run_catalog_command(command: &CatalogCommand, cancel: &AtomicBool) -> CatalogResult<FetchResult> {
    log::info!("Running catalog command: {}", command);

    let mut child = spawn(command)?;
    let stdout_reader = child.stdout.take().map(spawn_reader);
    let stderr_reader = child.stderr.take().map(spawn_reader);

    let status = loop {
        if cancel.load(Ordering::SeqCst) {
            terminate(&mut child);
            let _ = join_reader(stdout_reader);
            let _ = join_reader(stderr_reader);
            log::info!("Catalog command cancelled");
            return Err(CatalogError::Cancelled);
        }
        match child.try_wait()? {
            Some(status) => break status,
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    let stdout = join_reader(stdout_reader)?;
    let stderr = join_reader(stderr_reader)?;
    log::debug!(
        "Catalog command exited with {:?}: {} bytes stdout, {} bytes stderr",
        status.code(),
        stdout.len(),
        stderr.len()
    );

    if cancel.load(Ordering::SeqCst) {
        return Err(CatalogError::Cancelled);
    }
    if status.success() {
        Ok(FetchResult { stdout, stderr })
    } else {
        Err(CatalogError::process_failure(exit_code(&status), &stdout, &stderr))
    }
}

fn spawn(command: &CatalogCommand) -> CatalogResult<Child> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group, so cancellation reaches anything the script forks.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    cmd.spawn().map_err(|e| CatalogError::ProcessFailure {
        message: format!("Unable to launch {}: {}", command.program, e),
        stdout_preview: String::new(),
        stderr: String::new(),
    })
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

fn join_reader(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) -> CatalogResult<String> {
    let Some(handle) = reader else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "output reader panicked"))??;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn exit_code(status: &ExitStatus) -> Option<i32> {
    status.code()
}

/// SIGTERM the process group, then SIGKILL once the grace period is over.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let pid = child.id() as i32;
    unsafe {
        libc::kill(-pid, libc::SIGTERM);
    }
    let deadline = Instant::now() + CANCEL_GRACE;
    while Instant::now() < deadline {
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    log::warn!("Catalog process {} ignored SIGTERM; killing", pid);
    unsafe {
        libc::killpg(pid, libc::SIGKILL);
    }
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    let deadline = Instant::now() + CANCEL_GRACE;
    let _ = child.kill();
    while Instant::now() < deadline {
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    let _ = child.wait();
}
