use super::{arg, capture_version, first_line, Compressor};
use crate::runner::RunOutcome;
use regex::Regex;
use std::sync::OnceLock;
use std::path::Path;

pub struct BrotliCompressor;

impl Compressor for BrotliCompressor {
    fn name(&self) -> &str {
        "brotli"
    }

    fn extension(&self) -> &str {
        "br"
    }

    fn levels(&self) -> &[i32] {
        &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]
    }

    /// Only brotli 1.x prints a version; older builds fail the probe.
    fn version_command(&self) -> Option<Vec<String>> {
        Some(vec!["brotli".to_string(), "--version".to_string()])
    }

    fn parse_version(&self, outcome: &RunOutcome) -> Option<String> {
        let line = first_line(&outcome.stdout)?;
        static VERSION: OnceLock<Option<Regex>> = OnceLock::new();
        capture_version(&VERSION, r"brotli ([0-9][0-9.]*)", line)
    }

    // brotli 1.x rejects "--quality N"; its long options only take --key=value
    fn compression_command(&self, target: &Path, level: i32) -> Vec<String> {
        vec![
            "brotli".to_string(),
            "-q".to_string(),
            level.to_string(),
            "-o".to_string(),
            arg(&self.output_path(target)),
            arg(target),
        ]
    }

    fn decompression_command(&self, target: &Path) -> Vec<String> {
        vec![
            "brotli".to_string(),
            "-d".to_string(),
            "-o".to_string(),
            arg(target),
            arg(&self.output_path(target)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compression_writes_to_output_path() {
        let command = BrotliCompressor.compression_command(Path::new("w/data"), 11);
        assert_eq!(command, vec!["brotli", "-q", "11", "-o", "w/data.br", "w/data"]);
    }

    #[test]
    fn decompression_restores_work_copy() {
        let command = BrotliCompressor.decompression_command(Path::new("w/data"));
        assert_eq!(command, vec!["brotli", "-d", "-o", "w/data", "w/data.br"]);
    }

    #[test]
    fn long_options_are_never_split_from_values() {
        let target = Path::new("w/data");
        let commands = [
            BrotliCompressor.compression_command(target, 5),
            BrotliCompressor.decompression_command(target),
        ];
        for command in &commands {
            assert!(command.iter().all(|a| !a.starts_with("--") || a.contains('=')), "{:?}", command);
        }
    }

    #[test]
    fn parses_version() {
        let outcome = RunOutcome::with_output("brotli 1.0.9\n", "");
        assert_eq!(BrotliCompressor.parse_version(&outcome).as_deref(), Some("1.0.9"));
    }
}
