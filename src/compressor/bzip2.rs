use super::{arg, capture_version, first_line, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

pub struct Bzip2Compressor;

impl Compressor for Bzip2Compressor {
    fn name(&self) -> &str {
        "bzip2"
    }

    fn extension(&self) -> &str {
        "bz2"
    }

    fn levels(&self) -> &[i32] {
        &[1, 2, 3, 4, 5, 6, 7, 8, 9]
    }

    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["bzip2".to_string(), "--version".to_string()])
    }

    // bzip2 prints its banner on stderr
    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        let line = first_line(&outcome.stderr)?;
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"Version ([^,]+),", line)
    }

    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec!["bzip2".to_string(), format!("-{}", level), arg(target)]
    }

    fn decompression_command(&self, target: &Path) -> Vec<String> {
        vec!["bzip2".to_string(), "--decompress".to_string(), arg(&self.output_path(target))]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_banner_from_stderr() {
        let outcome = RunOutcome::with_output(
            "",
            "bzip2, a block-sorting file compressor.  Version 1.0.8, 13-Jul-2019.\n   \n   Copyright (C) 1996-2019 by Julian Seward.\n",
        );
        assert_eq!(Bzip2Compressor.parse_version(&outcome).as_deref(), Some("1.0.8"));
    }

    #[test]
    fn decompresses_from_output_path() {
        let command = Bzip2Compressor.decompression_command(Path::new("w/data"));
        assert_eq!(command, vec!["bzip2", "--decompress", "w/data.bz2"]);
    }
}
