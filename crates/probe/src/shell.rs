//! Command execution boundary.
//!
//! Everything in this workspace that touches an external program goes
//! through the [`Shell`] trait, so probes and configuration items can be
//! exercised against a scripted fake in tests.

use crate::error::{Error, Result};
use log::{debug, trace};
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Default bounded wait for a single external command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A program plus its arguments, optionally with its own bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Overrides the shell's default timeout when set
    pub timeout: Option<Duration>,
}

impl Invocation {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Render as a single command line for messages.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// stdout followed by stderr
    pub output: String,
    pub success: bool,
}

impl CommandOutput {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: false,
        }
    }

    /// Output trimmed of surrounding whitespace.
    pub fn trimmed(&self) -> &str {
        self.output.trim()
    }
}

/// Abstract access to the host's programs.
pub trait Shell: Send + Sync {
    /// Whether `program` resolves on PATH.
    fn which(&self, program: &str) -> bool;

    /// Run an invocation to completion (or until its bounded wait expires).
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput>;

    /// Run and require a zero exit status.
    fn run_checked(&self, invocation: &Invocation) -> anyhow::Result<String> {
        let output = self.run(invocation)?;
        if !output.success {
            anyhow::bail!("{} failed: {}", invocation.display(), output.trimmed());
        }
        Ok(output.output)
    }
}

/// [`Shell`] backed by real processes.
#[derive(Debug, Clone)]
pub struct SystemShell {
    timeout: Duration,
}

impl SystemShell {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemShell {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Shell for SystemShell {
    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        let command = invocation.display();
        let timeout = invocation.timeout.unwrap_or(self.timeout);
        trace!("running `{command}` (timeout {}s)", timeout.as_secs());

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound {
                        program: invocation.program.clone(),
                    }
                } else {
                    Error::Spawn {
                        command: command.clone(),
                        source,
                    }
                }
            })?;

        // Drain pipes on their own threads so a chatty child cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    debug!("`{command}` exceeded {}s, killing", timeout.as_secs());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(Error::Timeout { command, timeout });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(source) => return Err(Error::Spawn { command, source }),
            }
        };

        let mut output = stdout.map(join_drain).unwrap_or_default();
        output.push_str(&stderr.map(join_drain).unwrap_or_default());

        Ok(CommandOutput {
            output,
            success: status.success(),
        })
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

fn join_drain(handle: thread::JoinHandle<String>) -> String {
    handle.join().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_display() {
        let inv = Invocation::new("brew", ["list", "--formula", "-1"]);
        assert_eq!(inv.display(), "brew list --formula -1");
        assert_eq!(Invocation::new("uptime", Vec::<String>::new()).display(), "uptime");
    }

    #[test]
    fn test_invocation_timeout_override() {
        let inv = Invocation::new("aws", ["sts"]).with_timeout(Duration::from_secs(3));
        assert_eq!(inv.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_which_missing_program() {
        let shell = SystemShell::default();
        assert!(!shell.which("definitely-not-a-real-program-hearth"));
    }

    #[cfg(unix)]
    #[test]
    fn test_which_finds_program_on_path() {
        let shell = SystemShell::default();
        assert!(shell.which("sh"));
    }

    #[test]
    fn test_run_missing_program_is_not_found() {
        let shell = SystemShell::default();
        let err = shell
            .run(&Invocation::new("definitely-not-a-real-program-hearth", ["x"]))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_and_status() {
        let shell = SystemShell::default();
        let ok = shell.run(&Invocation::new("sh", ["-c", "echo out; echo err >&2"])).unwrap();
        assert!(ok.success);
        assert!(ok.output.contains("out"));
        assert!(ok.output.contains("err"));

        let failed = shell.run(&Invocation::new("sh", ["-c", "exit 3"])).unwrap();
        assert!(!failed.success);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_times_out() {
        let shell = SystemShell::new(Duration::from_millis(100));
        let err = shell.run(&Invocation::new("sleep", ["5"])).unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_checked_reports_failure() {
        let shell = SystemShell::default();
        let err = shell
            .run_checked(&Invocation::new("sh", ["-c", "echo nope; exit 1"]))
            .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
