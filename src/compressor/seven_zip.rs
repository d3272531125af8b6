use super::{arg, capture_version, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

/// LZMA through the standalone `7zr` archiver.
pub struct SevenZipCompressor;

impl Compressor for SevenZipCompressor {
    fn name(&self) -> &str {
        "seven_zip"
    }

    fn display_name(&self) -> &str {
        "7z"
    }

    fn extension(&self) -> &str {
        "7z"
    }

    /// Level 0 stores without compression, so it is skipped.
    fn levels(&self) -> &[i32] {
        &[1, 3, 5, 7, 9]
    }

    // 7zr without arguments prints its banner and usage
    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["7zr".to_string()])
    }

    /// Matches "7-Zip (a) [64] 16.02 : Copyright" and "7-Zip (r) 23.01 (x64) : Copyright".
    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"([0-9]+\.[0-9.]+)(?: \([^)]*\))? : Copyright", &outcome.stdout)
    }

    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec![
            "7zr".to_string(),
            "a".to_string(),
            format!("-mx={}", level),
            arg(&self.output_path(target)),
            arg(target),
        ]
    }

    /// Extracts next to the archive, which recreates the work copy under its own name.
    fn decompression_command(&self, target: &Path) -> Vec<String> {
        let directory = target.parent().unwrap_or_else(|| Path::new("."));
        vec![
            "7zr".to_string(),
            "e".to_string(),
            "-y".to_string(),
            format!("-o{}", arg(directory)),
            arg(&self.output_path(target)),
        ]
    }
}
