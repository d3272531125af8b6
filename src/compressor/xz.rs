use super::{arg, capture_version, first_line, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

/// LZMA2 through `xz`.
pub struct XzCompressor;

impl Compressor for XzCompressor {
    fn name(&self) -> &str {
        "xz"
    }

    fn extension(&self) -> &str {
        "xz"
    }

    fn levels(&self) -> &[i32] {
        &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]
    }

    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["xz".to_string(), "--version".to_string()])
    }

    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        let line = first_line(&outcome.stdout)?;
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"([0-9][0-9.]*)$", line)
    }

    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec!["xz".to_string(), format!("-{}", level), arg(target)]
    }

    fn decompression_command(&self, target: &Path) -> Vec<String> {
        vec!["xz".to_string(), "--decompress".to_string(), arg(&self.output_path(target))]
    }
}
