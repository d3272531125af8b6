use super::{arg, capture_version, first_line, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

pub struct GzipCompressor;

impl Compressor for GzipCompressor {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extension(&self) -> &str {
        "gz"
    }

    fn levels(&self) -> &[i32] {
        &[1, 2, 3, 4, 5, 6, 7, 8, 9]
    }

    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["gzip".to_string(), "--version".to_string()])
    }

    /// Parses "gzip 1.12" (GNU) or "Apple gzip 430.100.5" (BSD).
    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        let line = first_line(&outcome.stdout)?;
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"gzip ([0-9][0-9.]*)", line)
    }

    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec!["gzip".to_string(), format!("-{}", level), arg(target)]
    }

    fn decompression_command(&self, target: &Path) -> Vec<String> {
        vec!["gzip".to_string(), "--decompress".to_string(), arg(&self.output_path(target))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands() {
        let target = Path::new("/tmp/w/data");
        assert_eq!(GzipCompressor.compression_command(target, 6), vec!["gzip", "-6", "/tmp/w/data"]);
        assert_eq!(GzipCompressor.decompression_command(target), vec!["gzip", "--decompress", "/tmp/w/data.gz"]);
    }

    #[test]
    fn parses_gnu_version() {
        let outcome = RunOutcome::with_output("gzip 1.12\nCopyright (C) 2018 Free Software Foundation, Inc.\n", "");
        assert_eq!(GzipCompressor.parse_version(&outcome).as_deref(), Some("1.12"));
    }

    #[test]
    fn garbage_version_is_none() {
        let outcome = RunOutcome::with_output("something else entirely\n", "");
        assert_eq!(GzipCompressor.parse_version(&outcome), None);
    }
}
