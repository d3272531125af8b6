use crate::error::{BenchError, Result};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::debug;

/// Outcome of running one external command to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub exit_code: Option<i32>,     // None if the child was killed by a signal
    pub elapsed_time: f64,          // Wall clock seconds
    pub cpu_time: f64,              // User + system seconds of the child
    pub max_rss: u64,               // Peak resident set size in KiB
    pub stdout: String,
    pub stderr: String,
}

impl RunOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    #[cfg(test)]
    pub(crate) fn with_output(stdout: &str, stderr: &str) -> Self {
        RunOutcome {
            exit_code: Some(0),
            elapsed_time: 0.0,
            cpu_time: 0.0,
            max_rss: 0,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    /// Converts an unsuccessful outcome into a `ToolFailed` error.
    pub fn check(self, command: &[String]) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            Err(BenchError::ToolFailed {
                command: display_command(command),
                exit_code: self.exit_code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}

/// Joins an argument vector for messages and logs.
pub fn display_command(command: &[String]) -> String {
    command.join(" ")
}

/// Runs `command` (program followed by its arguments) with stdin closed and
/// stdout/stderr captured, and reports the child's resource usage as seen by
/// the kernel.
///
/// A nonzero exit status is not an error here; callers decide via
/// [`RunOutcome::check`].
pub fn run(command: &[String]) -> Result<RunOutcome> {
    let (program, args) = command.split_first().ok_or_else(|| BenchError::Spawn {
        command: String::new(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "empty command"),
    })?;
    let spawn_error = |source: io::Error| BenchError::Spawn {
        command: display_command(command),
        source,
    };

    // Capture into files rather than pipes so a chatty tool cannot block on a full pipe
    let mut stdout_file = tempfile::tempfile().map_err(|e| BenchError::io("creating stdout capture", e))?;
    let mut stderr_file = tempfile::tempfile().map_err(|e| BenchError::io("creating stderr capture", e))?;

    let start = Instant::now();
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(stdout_file.try_clone().map_err(spawn_error)?)
        .stderr(stderr_file.try_clone().map_err(spawn_error)?)
        .spawn()
        .map_err(spawn_error)?;

    let (status, usage) = wait_with_usage(child.id() as libc::pid_t)
        .map_err(|e| BenchError::io(format!("waiting for {}", display_command(command)), e))?;
    let elapsed_time = start.elapsed().as_secs_f64();

    let outcome = RunOutcome {
        exit_code: exit_code(status),
        elapsed_time,
        cpu_time: timeval_seconds(&usage.ru_utime) + timeval_seconds(&usage.ru_stime),
        max_rss: max_rss_kib(&usage),
        stdout: read_capture(&mut stdout_file)?,
        stderr: read_capture(&mut stderr_file)?,
    };

    debug!(
        command = %display_command(command),
        exit_code = ?outcome.exit_code,
        elapsed = outcome.elapsed_time,
        cpu = outcome.cpu_time,
        max_rss = outcome.max_rss,
        "command finished"
    );

    Ok(outcome)
}

/// Reaps `pid` and returns its wait status together with its own rusage.
fn wait_with_usage(pid: libc::pid_t) -> io::Result<(libc::c_int, libc::rusage)> {
    let mut status: libc::c_int = 0;
    loop {
        // SAFETY: rusage is a plain C struct for which all-zero is a valid value,
        // and both out-pointers are valid for the duration of the call.
        let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
        let ret = unsafe { libc::wait4(pid, &mut status, 0, &mut usage) };
        if ret == pid {
            return Ok((status, usage));
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

fn exit_code(status: libc::c_int) -> Option<i32> {
    if libc::WIFEXITED(status) {
        Some(libc::WEXITSTATUS(status))
    } else {
        None
    }
}

fn timeval_seconds(tv: &libc::timeval) -> f64 {
    tv.tv_sec as f64 + tv.tv_usec as f64 / 1_000_000.0
}

#[cfg(target_os = "macos")]
fn max_rss_kib(usage: &libc::rusage) -> u64 {
    // Darwin reports bytes
    usage.ru_maxrss as u64 / 1024
}

#[cfg(not(target_os = "macos"))]
fn max_rss_kib(usage: &libc::rusage) -> u64 {
    usage.ru_maxrss as u64
}

fn read_capture(file: &mut File) -> Result<String> {
    let mut bytes = Vec::new();
    file.seek(SeekFrom::Start(0))
        .and_then(|_| file.read_to_end(&mut bytes))
        .map_err(|e| BenchError::io("reading captured output", e))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let outcome = run(&sh("echo out; echo err >&2")).unwrap();
        assert!(outcome.success());
        assert_eq!(outcome.stdout, "out\n");
        assert_eq!(outcome.stderr, "err\n");
        assert!(outcome.elapsed_time >= 0.0);
        assert!(outcome.cpu_time >= 0.0);
    }

    #[test]
    fn reports_nonzero_exit_code() {
        let command = sh("echo broken >&2; exit 3");
        let outcome = run(&command).unwrap();
        assert_eq!(outcome.exit_code, Some(3));

        match outcome.check(&command) {
            Err(BenchError::ToolFailed { exit_code, stderr, .. }) => {
                assert_eq!(exit_code, Some(3));
                assert_eq!(stderr, "broken\n");
            }
            other => panic!("expected ToolFailed, got {:?}", other),
        }
    }

    #[test]
    fn signal_death_has_no_exit_code() {
        let outcome = run(&sh("kill -9 $$")).unwrap();
        assert_eq!(outcome.exit_code, None);
        assert!(!outcome.success());
    }

    #[test]
    fn stdin_is_closed() {
        // cat would hang forever on an inherited terminal
        let outcome = run(&["cat".to_string()]).unwrap();
        assert!(outcome.success());
        assert!(outcome.stdout.is_empty());
    }

    #[test]
    fn peak_memory_is_reported() {
        let outcome = run(&sh("true")).unwrap();
        assert!(outcome.max_rss > 0);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let result = run(&["definitely-not-a-real-compressor-binary".to_string()]);
        assert!(matches!(result, Err(BenchError::Spawn { .. })));
    }

    #[test]
    fn empty_command_is_rejected() {
        assert!(matches!(run(&[]), Err(BenchError::Spawn { .. })));
    }
}
