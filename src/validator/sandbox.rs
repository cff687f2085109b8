//! Sandboxed interpreter processes
//!
//! Every check runs the interpreter out of process, inside a fresh [`Workspace`]:
//! - a `tempfile::TempDir` removed when the workspace is dropped (on every exit path),
//! - a private guard directory holding `sitecustomize.py`, which applies the CPU/memory rlimits and the network
//!   stub before any snippet code is imported,
//! - a wall-clock deadline enforced here: the child is killed once it expires.

use std::ffi::OsStr;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tempfile::TempDir;

use super::config::SandboxLimits;
use super::error::{ValidatorError, ValidatorResult};

const GUARD_DIR_NAME: &str = ".coursecheck-guard";
const GUARD_SOURCE: &str = include_str!("scripts/sitecustomize.py");
const REPORT_FILE_NAME: &str = "report.json";

const POLL_INTERVAL: Duration = Duration::from_millis(10);
/// How long to wait for output pipes after the child is gone (grandchildren may still hold them).
const PIPE_GRACE: Duration = Duration::from_secs(1);

/// Scratch directory for one interpreter run.
pub struct Workspace {
    dir: TempDir,
    guard_dir: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace with the resource guard installed.
    pub fn new() -> ValidatorResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("coursecheck-")
            .tempdir()
            .map_err(ValidatorError::Workspace)?;
        let guard_dir = dir.path().join(GUARD_DIR_NAME);
        fs::create_dir(&guard_dir).map_err(ValidatorError::Workspace)?;

        let workspace = Self { dir, guard_dir };
        workspace.write_to(&workspace.guard_dir, "sitecustomize.py", GUARD_SOURCE)?;
        Ok(workspace)
    }

    /// Root of the workspace (the interpreter's working directory).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory put on `PYTHONPATH` ahead of anything else.
    pub fn guard_dir(&self) -> &Path {
        &self.guard_dir
    }

    /// Write a file into the workspace root.
    pub fn write(&self, name: &str, contents: &str) -> ValidatorResult<PathBuf> {
        self.write_to(self.dir.path(), name, contents)
    }

    /// Write a helper script into the guard directory.
    pub fn write_helper(&self, name: &str, contents: &str) -> ValidatorResult<PathBuf> {
        self.write_to(&self.guard_dir, name, contents)
    }

    /// Where helper scripts write their JSON report.
    pub fn report_path(&self) -> PathBuf {
        self.guard_dir.join(REPORT_FILE_NAME)
    }

    /// Read the helper's JSON report, if it got as far as writing one.
    pub fn read_report<T: DeserializeOwned>(&self) -> ValidatorResult<Option<T>> {
        let path = self.report_path();
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(ValidatorError::Workspace)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write_to(&self, dir: &Path, name: &str, contents: &str) -> ValidatorResult<PathBuf> {
        let path = dir.join(name);
        fs::write(&path, contents).map_err(|source| ValidatorError::WriteFile {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Captured result of one interpreter process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    /// `None` when the process was killed on timeout
    pub status: Option<ExitStatus>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.is_some_and(|s| s.success())
    }

    /// Human-readable description of how the process ended.
    pub fn describe_exit(&self) -> String {
        match self.status {
            _ if self.timed_out => "killed on timeout".to_string(),
            Some(status) => match status.code() {
                Some(code) => format!("exit status {}", code),
                None => "terminated by a signal (resource limit?)".to_string(),
            },
            None => "unknown exit status".to_string(),
        }
    }
}

/// Interpreter launcher bound to a set of sandbox limits.
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: PathBuf,
    limits: SandboxLimits,
}

impl Interpreter {
    pub fn new(program: impl Into<PathBuf>, limits: SandboxLimits) -> Self {
        Self {
            program: program.into(),
            limits,
        }
    }

    /// Run the interpreter in `workspace` with `args`, capturing stdout and stderr in full.
    ///
    /// Blocks until the process exits or `timeout` elapses. A timed-out process is killed and reported with
    /// `timed_out = true`; that is not an error.
    ///
    /// ## Errors
    ///
    /// Returns an error only if the process cannot be launched or waited on.
    pub fn run<I, S>(&self, workspace: &Workspace, args: I, timeout: Duration) -> ValidatorResult<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = self.command(workspace);
        command.args(args);
        tracing::debug!(program = %self.program.display(), ?command, "launching interpreter");

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| ValidatorError::Spawn {
            program: self.program.to_string_lossy().to_string(),
            source,
        })?;

        let stdout_rx = spawn_reader(child.stdout.take());
        let stderr_rx = spawn_reader(child.stderr.take());

        let (status, timed_out) = wait_with_deadline(&mut child, start + timeout)?;
        if timed_out {
            tracing::warn!(
                program = %self.program.display(),
                timeout_secs = timeout.as_secs_f64(),
                "interpreter killed after timeout"
            );
        }

        Ok(ProcessOutput {
            status,
            stdout: stdout_rx.recv_timeout(PIPE_GRACE).unwrap_or_default(),
            stderr: stderr_rx.recv_timeout(PIPE_GRACE).unwrap_or_default(),
            timed_out,
            elapsed: start.elapsed(),
        })
    }

    fn command(&self, workspace: &Workspace) -> Command {
        let mut command = Command::new(&self.program);
        command
            .current_dir(workspace.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("PYTHONPATH", workspace.guard_dir())
            .env("PYTHONDONTWRITEBYTECODE", "1")
            .env("PYTHONIOENCODING", "utf-8")
            .env_remove("PYTHONSTARTUP")
            .env_remove("PYTHONHOME");

        if let Some(cpu) = self.limits.cpu_seconds {
            command.env("COURSECHECK_CPU_SECONDS", cpu.to_string());
        }
        if let Some(memory) = self.limits.memory_bytes {
            command.env("COURSECHECK_MEMORY_BYTES", memory.to_string());
        }
        if !self.limits.allow_network {
            command.env("COURSECHECK_BLOCK_NETWORK", "1");
        }
        command
    }
}

fn spawn_reader<R>(pipe: Option<R>) -> mpsc::Receiver<String>
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).to_string());
    });
    rx
}

fn wait_with_deadline(child: &mut Child, deadline: Instant) -> ValidatorResult<(Option<ExitStatus>, bool)> {
    loop {
        if let Some(status) = child.try_wait().map_err(ValidatorError::Wait)? {
            return Ok((Some(status), false));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok((None, true));
        }
        thread::sleep(POLL_INTERVAL);
    }
}
