use crate::compressor::{Compressor, CompressorRegistry};
use crate::error::{BenchError, Result};
use crate::results::{BenchmarkResult, ResultSink};
use crate::runner;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Name of the work copy inside each per-target temporary directory.
const WORK_COPY_NAME: &str = "data";

/// Runs every compressor at every level on every target.
///
/// For each target:
///
/// 1. Copy the (read only) target into a fresh temporary directory; the copy
///    is the work copy.
/// 2. Hash the work copy.
/// 3. For each compressor and level, check the work copy still has that hash,
///    compress it, then decompress it back into place and check it again.
/// 4. Drop the temporary directory, whatever happened.
///
/// Any tool failure or hash mismatch stops the whole run. Results already
/// handed to the sink stay there.
#[derive(Debug, Default, Clone)]
pub struct Comparer {
    temp_root: Option<PathBuf>,
}

impl Comparer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates work copies under `dir` instead of the system temporary directory.
    pub fn with_temp_root<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.temp_root = Some(dir.into());
        self
    }

    /// Benchmarks all registered compressors, handing each result to `sink`
    /// as soon as it is measured.
    pub fn run<S: ResultSink, P: AsRef<Path>>(
        &self,
        sink: &mut S,
        registry: &CompressorRegistry,
        targets: &[P],
    ) -> Result<()> {
        for (i, target) in targets.iter().enumerate() {
            let target = target.as_ref();
            info!("({}/{}) Evaluating target {}", i + 1, targets.len(), target.display());

            let work_dir = self.create_work_dir()?;
            let work_copy = stage_target(work_dir.path(), target)?;
            evaluate_target(sink, registry.compressors(), target, &work_copy)?;

            work_dir
                .close()
                .map_err(|e| BenchError::io("removing work directory", e))?;
        }
        Ok(())
    }

    /// Like [`Comparer::run`], collecting the results in memory.
    pub fn collect<P: AsRef<Path>>(
        &self,
        registry: &CompressorRegistry,
        targets: &[P],
    ) -> Result<Vec<BenchmarkResult>> {
        let mut results = Vec::new();
        self.run(&mut results, registry, targets)?;
        Ok(results)
    }

    fn create_work_dir(&self) -> Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("compression-cost-");
        let dir = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        dir.map_err(|e| BenchError::io("creating work directory", e))
    }
}

/// Copies `target` into `dir`; the original is only ever read.
fn stage_target(dir: &Path, target: &Path) -> Result<PathBuf> {
    let work_copy = dir.join(WORK_COPY_NAME);
    fs::copy(target, &work_copy)
        .map_err(|e| BenchError::io(format!("copying {} to work directory", target.display()), e))?;
    Ok(work_copy)
}

fn evaluate_target<S: ResultSink>(
    sink: &mut S,
    compressors: &[Box<dyn Compressor>],
    target: &Path,
    work_copy: &Path,
) -> Result<()> {
    let target_digest = find_digest(work_copy)?;
    let target_size = file_size(work_copy)?;
    let target_name = target.to_string_lossy().into_owned();

    for compressor in compressors {
        info!(
            compressor = compressor.name(),
            levels = compressor.levels().len(),
            "Running compressor"
        );

        for &level in compressor.levels() {
            let cycle = Cycle {
                compressor: compressor.as_ref(),
                level,
                target: &target_name,
                work_copy,
                target_digest: &target_digest,
            };

            cycle.verify()?;
            let result = cycle.run(target_size)?;
            sink.record(&result)?;
        }
    }

    Ok(())
}

/// One compress/decompress round trip of the work copy.
struct Cycle<'a> {
    compressor: &'a dyn Compressor,
    level: i32,
    target: &'a str,
    work_copy: &'a Path,
    target_digest: &'a str,
}

impl Cycle<'_> {
    /// Fails unless the work copy exists and still hashes to the target digest.
    fn verify(&self) -> Result<()> {
        let intact = match find_digest(self.work_copy) {
            Ok(digest) => digest == self.target_digest,
            Err(BenchError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(e),
        };
        if intact {
            Ok(())
        } else {
            Err(BenchError::Integrity {
                compressor: self.compressor.name().to_string(),
                level: self.level,
                target: self.target.to_string(),
            })
        }
    }

    fn run(&self, target_size: u64) -> Result<BenchmarkResult> {
        let output = self.compressor.output_path(self.work_copy);
        remove_if_exists(&output)?;

        // === Compression ===
        let command = self.compressor.compression_command(self.work_copy, self.level);
        let compression = runner::run(&command)?.check(&command)?;
        let size = match fs::metadata(&output) {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BenchError::MissingOutput {
                    compressor: self.compressor.name().to_string(),
                    level: self.level,
                    path: output,
                })
            }
            Err(e) => {
                return Err(BenchError::io(format!("reading size of {}", output.display()), e))
            }
        };

        // Some tools keep their input; decompression has to recreate it
        remove_if_exists(self.work_copy)?;

        // === Decompression ===
        let command = self.compressor.decompression_command(self.work_copy);
        let decompression = runner::run(&command)?.check(&command)?;
        self.verify()?;

        // Cleanup is not part of the decompression time
        remove_if_exists(&output)?;

        debug!(
            compressor = self.compressor.name(),
            level = self.level,
            size,
            compression_elapsed = compression.elapsed_time,
            decompression_elapsed = decompression.elapsed_time,
            "cycle complete"
        );

        Ok(BenchmarkResult {
            target: self.target.to_string(),
            target_size,
            compressor_name: self.compressor.name().to_string(),
            compressor_level: self.level,
            compression_elapsed_time: compression.elapsed_time,
            compression_cpu_time: compression.cpu_time,
            compression_max_rss: compression.max_rss,
            size,
            decompression_elapsed_time: decompression.elapsed_time,
            decompression_cpu_time: decompression.cpu_time,
            decompression_max_rss: decompression.max_rss,
        })
    }
}

/// SHA-256 of the file contents, hex encoded.
fn find_digest(path: &Path) -> Result<String> {
    let context = || format!("hashing {}", path.display());
    let mut file = File::open(path).map_err(|e| BenchError::io(context(), e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| BenchError::io(context(), e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn file_size(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| BenchError::io(format!("reading size of {}", path.display()), e))
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(BenchError::io(format!("removing {}", path.display()), e)),
    }
}
