use super::{arg, capture_version, first_line, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

pub struct ZstdCompressor;

impl Compressor for ZstdCompressor {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extension(&self) -> &str {
        "zst"
    }

    /// Levels 20+ need --ultra and are left out.
    fn levels(&self) -> &[i32] {
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19]
    }

    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["zstd".to_string(), "-V".to_string()])
    }

    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        let line = first_line(&outcome.stdout)?;
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"(v[0-9][0-9.]*),", line)
    }

    // zstd keeps its input; the comparer removes the leftover work copy
    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec!["zstd".to_string(), "--quiet".to_string(), format!("-{}", level), arg(target)]
    }

    fn decompression_command(&self, target: &Path) -> Vec<String> {
        vec![
            "zstd".to_string(),
            "--quiet".to_string(),
            "--decompress".to_string(),
            arg(&self.output_path(target)),
            "-o".to_string(),
            arg(target),
        ]
    }
}
