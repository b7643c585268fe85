//! Subprocess execution for help probing.
//!
//! Every interaction with the target CLI goes through [`CommandRunner`], so
//! crawling, extraction and validation can be exercised against a scripted
//! runner in tests. [`ProcessRunner`] is the real implementation and
//! [`HelpProbe`] builds the argv for the three invocations the crate needs.

use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use cmdgen_core::{ReleaseTrack, tool_name};
use tracing::debug;
use wait_timeout::ChildExt;

/// Default timeout for `meta list-commands`.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(45);
/// Default timeout for a single `--help` invocation.
pub const HELP_TIMEOUT: Duration = Duration::from_secs(60);

/// Captured result of one subprocess invocation.
///
/// Failures to spawn or wait are folded into the output (exit code 1 and
/// `error` set) so callers only branch on [`RunOutput::success`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    /// The executable does not exist.
    pub not_found: bool,
    pub error: Option<String>,
}

impl RunOutput {
    /// A successful run with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// A failed run (exit code 1) with the given stderr.
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            exit_code: 1,
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out && self.error.is_none()
    }

    /// Help text: stdout, or stderr when stdout is empty.
    pub fn text(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }

    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs an argv with a timeout.
pub trait CommandRunner: Send + Sync {
    fn run(&self, argv: &[String], timeout: Duration) -> RunOutput;
}

impl<T: CommandRunner + ?Sized> CommandRunner for &T {
    fn run(&self, argv: &[String], timeout: Duration) -> RunOutput {
        (**self).run(argv, timeout)
    }
}

impl<T: CommandRunner + ?Sized> CommandRunner for Box<T> {
    fn run(&self, argv: &[String], timeout: Duration) -> RunOutput {
        (**self).run(argv, timeout)
    }
}

/// Spawns real processes with null stdin and captured output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, argv: &[String], timeout: Duration) -> RunOutput {
        let Some((program, args)) = argv.split_first() else {
            return RunOutput {
                error: Some("empty argv".to_string()),
                ..RunOutput::failed("")
            };
        };

        let spawn_result = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawn_result {
            Ok(child) => child,
            Err(e) => {
                debug!(command = ?argv, error = %e, "Failed to spawn");
                return RunOutput {
                    not_found: e.kind() == ErrorKind::NotFound,
                    error: Some(format!("spawn failed: {e}")),
                    ..RunOutput::failed(e.to_string())
                };
            }
        };

        // Drain both pipes while waiting so a chatty child cannot block on
        // a full pipe buffer.
        let stdout_thread = child.stdout.take().map(drain);
        let stderr_thread = child.stderr.take().map(drain);

        // The reader threads are only joined after a normal exit: a killed
        // child's own subprocesses may hold the pipes open indefinitely.
        match child.wait_timeout(timeout) {
            Ok(Some(status)) => RunOutput {
                exit_code: status.code().unwrap_or(1),
                stdout: join_drained(stdout_thread),
                stderr: join_drained(stderr_thread),
                ..RunOutput::default()
            },
            Ok(None) => {
                debug!(command = ?argv, timeout_secs = timeout.as_secs(), "Timed out, killing process");
                let _ = child.kill();
                let _ = child.wait();
                RunOutput {
                    timed_out: true,
                    ..RunOutput::failed("")
                }
            }
            Err(e) => {
                debug!(command = ?argv, error = %e, "Failed to wait on process");
                let _ = child.kill();
                let _ = child.wait();
                RunOutput {
                    error: Some(format!("wait failed: {e}")),
                    ..RunOutput::failed("")
                }
            }
        }
    }
}

fn drain<P: Read + Send + 'static>(mut pipe: P) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_drained(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// The target CLI plus a runner.
///
/// `tool` may be a bare name or a path; [`HelpProbe::name`] is what the
/// tool calls itself in help and listing output.
///
/// # Examples
///
/// ```
/// use cmdgen_core::ReleaseTrack;
/// use cmdgen_discovery::runner::HelpProbe;
///
/// let probe = HelpProbe::new("gcloud");
/// assert_eq!(
///     probe.help_argv("run services", ReleaseTrack::Beta),
///     vec!["gcloud", "beta", "run", "services", "--help"]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct HelpProbe<R = ProcessRunner> {
    runner: R,
    tool: String,
    name: String,
    help_timeout: Duration,
    list_timeout: Duration,
}

impl HelpProbe<ProcessRunner> {
    /// Probe that spawns real processes of `tool`.
    pub fn new(tool: &str) -> Self {
        Self::with_runner(tool, ProcessRunner)
    }
}

impl<R: CommandRunner> HelpProbe<R> {
    pub fn with_runner(tool: &str, runner: R) -> Self {
        Self {
            runner,
            tool: tool.to_string(),
            name: tool_name(tool).to_string(),
            help_timeout: HELP_TIMEOUT,
            list_timeout: LIST_TIMEOUT,
        }
    }

    pub fn with_help_timeout(mut self, timeout: Duration) -> Self {
        self.help_timeout = timeout;
        self
    }

    pub fn with_list_timeout(mut self, timeout: Duration) -> Self {
        self.list_timeout = timeout;
        self
    }

    /// The binary as configured (name or path), used in argv.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// The binary's file name, used to match help and listing text.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// `<tool> [release] <path…> --help`.
    pub fn help_argv(&self, path: &str, release: ReleaseTrack) -> Vec<String> {
        let mut argv = vec![self.tool.clone()];
        if let Some(prefix) = release.prefix() {
            argv.push(prefix.to_string());
        }
        argv.extend(path.split_whitespace().map(str::to_string));
        argv.push("--help".to_string());
        argv
    }

    /// Runs help for a command path (empty path = root help).
    pub fn help(&self, path: &str, release: ReleaseTrack) -> RunOutput {
        let argv = self.help_argv(path, release);
        debug!(command = ?argv, "Probing help");
        self.runner.run(&argv, self.help_timeout)
    }

    /// `<tool> meta list-commands`.
    pub fn list_commands(&self) -> RunOutput {
        let argv = vec![
            self.tool.clone(),
            "meta".to_string(),
            "list-commands".to_string(),
        ];
        debug!(command = ?argv, "Listing commands");
        self.runner.run(&argv, self.list_timeout)
    }

    /// Installation root reported by `<tool> info`, if any.
    pub fn sdk_root(&self) -> Option<String> {
        let argv = vec![
            self.tool.clone(),
            "--format=value(installation.sdk_root)".to_string(),
            "info".to_string(),
        ];
        let output = self.runner.run(&argv, self.list_timeout);
        if !output.success() {
            return None;
        }
        let root = output.stdout.trim();
        (!root.is_empty()).then(|| root.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_executable_is_captured() {
        let argv = vec!["__cmdgen_missing_tool__".to_string(), "--help".to_string()];
        let output = ProcessRunner.run(&argv, Duration::from_secs(5));
        assert!(!output.success());
        assert!(output.not_found);
        assert_eq!(output.exit_code, 1);
    }

    #[test]
    fn test_empty_argv() {
        let output = ProcessRunner.run(&[], Duration::from_secs(1));
        assert!(!output.success());
        assert!(output.error.is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_exit_code() {
        let argv: Vec<String> = ["sh", "-c", "echo hello; echo oops >&2; exit 3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let output = ProcessRunner.run(&argv, Duration::from_secs(10));
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.trim(), "hello");
        assert_eq!(output.stderr.trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_child() {
        let argv: Vec<String> = ["sh", "-c", "sleep 5"].iter().map(|s| s.to_string()).collect();
        let started = std::time::Instant::now();
        let output = ProcessRunner.run(&argv, Duration::from_millis(200));
        assert!(output.timed_out);
        assert!(!output.success());
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_returns_while_grandchild_holds_pipes() {
        // `sh` forks `sleep`, which keeps stdout open after `sh` is killed.
        let argv: Vec<String> = ["sh", "-c", "sleep 3; echo done"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let started = std::time::Instant::now();
        let output = ProcessRunner.run(&argv, Duration::from_millis(200));
        let elapsed = started.elapsed();

        assert!(output.timed_out);
        assert_eq!(output.exit_code, 1);
        assert!(output.stdout.is_empty());
        assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    }

    #[test]
    fn test_text_prefers_stdout() {
        let mut output = RunOutput::ok("stdout help");
        output.stderr = "warning".to_string();
        assert_eq!(output.text(), "stdout help");
        assert_eq!(RunOutput::failed("usage error").text(), "usage error");
    }

    #[test]
    fn test_name_is_file_name_of_tool_path() {
        let probe = HelpProbe::new("/opt/sdk/bin/gcloud");
        assert_eq!(probe.tool(), "/opt/sdk/bin/gcloud");
        assert_eq!(probe.name(), "gcloud");
        assert_eq!(
            probe.help_argv("", ReleaseTrack::Ga),
            vec!["/opt/sdk/bin/gcloud", "--help"]
        );
    }

    #[test]
    fn test_help_argv_root_and_ga() {
        let probe = HelpProbe::new("gcloud");
        assert_eq!(probe.help_argv("", ReleaseTrack::Ga), vec!["gcloud", "--help"]);
        assert_eq!(
            probe.help_argv("compute instances list", ReleaseTrack::Ga),
            vec!["gcloud", "compute", "instances", "list", "--help"]
        );
    }
}
