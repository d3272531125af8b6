use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while benchmarking compressors or reducing their results.
///
/// Every variant except `Io`/`Csv`/`Json` maps to one of the failure modes of
/// a benchmark run: a corrupted work copy, a failing tool, or an unreadable
/// results file. All of them are fatal for the run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The work copy no longer matches the digest of its target.
    #[error("digest mismatch: {compressor} level {level} on {target}")]
    Integrity {
        compressor: String,
        level: i32,
        target: String,
    },

    /// A tool exited with a nonzero status or was killed by a signal.
    #[error(
        "command failed ({}): {command}\nstdout:\n{stdout}\nstderr:\n{stderr}",
        describe_exit(.exit_code)
    )]
    ToolFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// Compression claimed success but left no output file behind.
    #[error("{compressor} level {level} produced no output at {}", .path.display())]
    MissingOutput {
        compressor: String,
        level: i32,
        path: PathBuf,
    },

    /// The tool could not be started at all.
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// A persisted result row could not be turned back into a record.
    #[error("malformed result record at line {line}: {message}")]
    MalformedRecord { line: u64, message: String },

    #[error("unknown compressor: {0}")]
    UnknownCompressor(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl BenchError {
    /// Wraps an I/O error with a short description of what was being done.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        BenchError::Io {
            context: context.into(),
            source,
        }
    }
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match *exit_code {
        Some(code) => format!("exit code {}", code),
        None => "killed by signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrity_error_names_compressor_level_and_target() {
        let err = BenchError::Integrity {
            compressor: "gzip".to_string(),
            level: 7,
            target: "samples/a.json".to_string(),
        };
        assert_eq!(err.to_string(), "digest mismatch: gzip level 7 on samples/a.json");
    }

    #[test]
    fn tool_failure_includes_captured_output() {
        let err = BenchError::ToolFailed {
            command: "xz -9 data".to_string(),
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "xz: data: No such file or directory".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("exit code 1"));
        assert!(message.contains("xz -9 data"));
        assert!(message.contains("No such file or directory"));
    }

    #[test]
    fn signal_death_is_described() {
        let err = BenchError::ToolFailed {
            command: "zstd -19 data".to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(err.to_string().contains("killed by signal"));
    }
}
