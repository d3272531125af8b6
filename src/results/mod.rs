use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One compressor-level run on one target.
///
/// Field names double as the CSV header, so renaming a field changes the
/// results file format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BenchmarkResult {
    pub target: String,
    pub target_size: u64,                   // Original size in bytes
    pub compressor_name: String,
    pub compressor_level: i32,
    pub compression_elapsed_time: f64,      // Seconds
    pub compression_cpu_time: f64,          // User + system seconds
    pub compression_max_rss: u64,           // KiB
    pub size: u64,                          // Compressed size in bytes
    pub decompression_elapsed_time: f64,
    pub decompression_cpu_time: f64,
    pub decompression_max_rss: u64,
}

impl BenchmarkResult {
    /// Results with the same key are the same tool and level on different targets.
    pub fn group_key(&self) -> (&str, i32) {
        (&self.compressor_name, self.compressor_level)
    }

    pub fn compression_ratio(&self) -> f64 {
        self.target_size as f64 / self.size as f64
    }

    /// Bytes saved; negative when the output is larger than the input.
    pub fn compression_delta(&self) -> f64 {
        self.target_size as f64 - self.size as f64
    }
}

/// Receives results as the comparer produces them.
pub trait ResultSink {
    fn record(&mut self, result: &BenchmarkResult) -> Result<()>;
}

impl ResultSink for Vec<BenchmarkResult> {
    fn record(&mut self, result: &BenchmarkResult) -> Result<()> {
        self.push(result.clone());
        Ok(())
    }
}

/// Writes results as CSV rows, flushing after each so rows survive a later failure.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(inner: W) -> Self {
        ResultWriter {
            writer: csv::WriterBuilder::new().has_headers(false).from_writer(inner),
        }
    }

    /// Writes the header row on its own, so an empty run still yields a valid file.
    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_record(HEADER)?;
        self.writer.flush().map_err(|e| BenchError::io("flushing results", e))?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| BenchError::io("flushing results", e.into_error()))
    }
}

impl<W: Write> ResultSink for ResultWriter<W> {
    fn record(&mut self, result: &BenchmarkResult) -> Result<()> {
        self.writer.serialize(result)?;
        self.writer.flush().map_err(|e| BenchError::io("flushing results", e))?;
        Ok(())
    }
}

/// Column names, in file order.
pub const HEADER: [&str; 11] = [
    "target",
    "target_size",
    "compressor_name",
    "compressor_level",
    "compression_elapsed_time",
    "compression_cpu_time",
    "compression_max_rss",
    "size",
    "decompression_elapsed_time",
    "decompression_cpu_time",
    "decompression_max_rss",
];

/// Writes a complete results file: header and one row per result.
pub fn write_results<W: Write>(results: &[BenchmarkResult], inner: W) -> Result<W> {
    let mut writer = ResultWriter::new(inner);
    writer.write_header()?;
    for result in results {
        writer.record(result)?;
    }
    writer.into_inner()
}

/// Reads results written by [`ResultWriter`]. Any bad row fails the whole read.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<BenchmarkResult>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers().map_err(malformed)?.clone();
    let mut results = Vec::new();

    for row in reader.records() {
        let record = row.map_err(malformed)?;
        let line = record.position().map_or(0, |p| p.line());
        let result: BenchmarkResult = record
            .deserialize(Some(&headers))
            .map_err(|e| BenchError::MalformedRecord { line, message: e.to_string() })?;
        validate(&result).map_err(|message| BenchError::MalformedRecord { line, message })?;
        results.push(result);
    }

    Ok(results)
}

pub fn read_results_file<P: AsRef<Path>>(path: P) -> Result<Vec<BenchmarkResult>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| BenchError::io(format!("opening {}", path.display()), e))?;
    read_results(file)
}

fn malformed(err: csv::Error) -> BenchError {
    BenchError::MalformedRecord {
        line: err.position().map_or(0, |p| p.line()),
        message: err.to_string(),
    }
}

/// Rejects rows that parse but cannot come from a real run.
fn validate(result: &BenchmarkResult) -> std::result::Result<(), String> {
    let times = [
        result.compression_elapsed_time,
        result.compression_cpu_time,
        result.decompression_elapsed_time,
        result.decompression_cpu_time,
    ];
    if result.target_size == 0 {
        return Err("target size must be positive".to_string());
    }
    if result.size == 0 {
        return Err("compressed size must be positive".to_string());
    }
    if times.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err("times must be finite and non-negative".to_string());
    }
    Ok(())
}
