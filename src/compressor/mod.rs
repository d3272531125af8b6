pub mod brotli;
pub mod bzip2;
pub mod gzip;
pub mod seven_zip;
pub mod xz;
pub mod zstd;

use crate::error::{BenchError, Result};
use crate::runner::{self, RunOutcome};
use regex::Regex;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;

/// Version reported when a tool cannot tell us its version.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Represents an external compression tool driven through its command line.
///
/// Implementations only describe the tool; running and measuring the commands
/// is done by [`crate::runner`]. A compression command reads the work copy and
/// must leave its output at [`Compressor::output_path`]; a decompression command
/// reads that output and must recreate the work copy.
pub trait Compressor {
    /// Returns the stable, unique name of this compressor.
    fn name(&self) -> &str;

    /// Returns the label used in reports.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Returns the file extension the tool appends to its output.
    fn extension(&self) -> &str;

    /// Returns the valid compression levels, in the order they are benchmarked.
    fn levels(&self) -> &[i32];

    /// Returns the command that prints the tool's version, if it has one.
    fn version_command(&self) -> Option<Vec<String>> {
        None
    }

    /// Extracts the version from the output of [`Compressor::version_command`].
    fn parse_version(&self, _outcome: &RunOutcome) -> Option<String> {
        None
    }

    /// Probes the installed tool's version. Never fails: anything unexpected
    /// yields [`UNKNOWN_VERSION`].
    fn version(&self) -> String {
        let Some(command) = self.version_command() else {
            return UNKNOWN_VERSION.to_string();
        };
        match runner::run(&command) {
            Ok(outcome) if outcome.success() => self.parse_version(&outcome).unwrap_or_else(|| {
                warn!(compressor = self.name(), "unrecognized version output");
                UNKNOWN_VERSION.to_string()
            }),
            Ok(outcome) => {
                warn!(compressor = self.name(), exit_code = ?outcome.exit_code, "version probe failed");
                UNKNOWN_VERSION.to_string()
            }
            Err(e) => {
                warn!(compressor = self.name(), error = %e, "version probe failed");
                UNKNOWN_VERSION.to_string()
            }
        }
    }

    /// Returns the command that compresses `target` at `level`.
    fn compression_command(&self, target: &Path, level: i32) -> Vec<String>;

    /// Returns the command that restores `target` from its compressed output.
    fn decompression_command(&self, target: &Path) -> Vec<String>;

    /// Returns where the compressed output of `target` ends up.
    fn output_path(&self, target: &Path) -> PathBuf {
        let mut path = OsString::from(target.as_os_str());
        path.push(".");
        path.push(self.extension());
        PathBuf::from(path)
    }
}

/// Turns a path into a command argument.
pub(crate) fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Returns the first line of `text`, without its line terminator.
pub(crate) fn first_line(text: &str) -> Option<&str> {
    text.lines().next().map(str::trim_end).filter(|line| !line.is_empty())
}

/// Returns the first capture group of `pattern` in `text`.
///
/// The pattern is compiled once into `cell`; a pattern that fails to compile
/// never matches.
pub(crate) fn capture_version(cell: &OnceLock<Option<Regex>>, pattern: &str, text: &str) -> Option<String> {
    let re = cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()?;
    re.captures(text).map(|caps| caps[1].to_string())
}

/// Fixed, ordered set of compressors known to a run.
///
/// Built once at startup and passed to whatever needs to resolve a compressor
/// name, such as the comparer and the plot writers.
pub struct CompressorRegistry {
    compressors: Vec<Box<dyn Compressor>>,
}

impl CompressorRegistry {
    pub fn new(compressors: Vec<Box<dyn Compressor>>) -> Self {
        CompressorRegistry { compressors }
    }

    /// All supported tools, in their canonical order.
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(brotli::BrotliCompressor),
            Box::new(bzip2::Bzip2Compressor),
            Box::new(gzip::GzipCompressor),
            Box::new(seven_zip::SevenZipCompressor),
            Box::new(xz::XzCompressor),
            Box::new(zstd::ZstdCompressor),
        ])
    }

    /// Keeps only the named compressors, in the order given.
    pub fn select<S: AsRef<str>>(self, names: &[S]) -> Result<Self> {
        let mut pool: Vec<Option<Box<dyn Compressor>>> = self.compressors.into_iter().map(Some).collect();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let slot = pool
                .iter_mut()
                .find(|slot| slot.as_ref().map_or(false, |c| c.name() == name))
                .ok_or_else(|| BenchError::UnknownCompressor(name.to_string()))?;
            if let Some(compressor) = slot.take() {
                selected.push(compressor);
            }
        }
        Ok(Self::new(selected))
    }

    pub fn compressors(&self) -> &[Box<dyn Compressor>] {
        &self.compressors
    }

    pub fn get(&self, name: &str) -> Option<&dyn Compressor> {
        self.compressors.iter().find(|c| c.name() == name).map(|c| c.as_ref())
    }

    /// Resolves the display name, falling back to `name` for unregistered tools.
    pub fn display_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map_or(name, |c| c.display_name())
    }

    /// Returns the 1-based position of `name`, used to pick plot styles.
    pub fn number(&self, name: &str) -> Option<usize> {
        self.compressors.iter().position(|c| c.name() == name).map(|i| i + 1)
    }

    pub fn len(&self) -> usize {
        self.compressors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compressors.is_empty()
    }
}
