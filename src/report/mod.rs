//! Rendering of grouped results: text summaries, gnuplot scripts and JSON.
//!
//! Renderers only see summaries through [`Summary`], so they can pick any
//! numeric column by name.

pub mod plot;
pub mod summary;

use crate::cost::CostedGroupResult;
use crate::error::Result;
use crate::group::GroupResult;
use serde::Serialize;
use std::io::Write;

/// A per-compressor-level summary with named numeric columns.
pub trait Summary {
    fn compressor_name(&self) -> &str;

    /// Numeric columns, in the order they are written to plot data blocks.
    fn field_names() -> &'static [&'static str];

    fn field(&self, name: &str) -> Option<f64>;

    /// 1-based column of `name` in a plot data block.
    fn column(name: &str) -> Option<usize> {
        Self::field_names().iter().position(|n| *n == name).map(|i| i + 1)
    }
}

const GROUP_FIELDS: &[&str] = &[
    "compressor_level",
    "mean_compression_elapsed_hours",
    "mean_compression_cpu_hours",
    "max_compression_max_rss",
    "mean_compressed_gibytes",
    "mean_compression_delta_gibytes",
    "geomean_compression_ratio",
    "mean_decompression_elapsed_hours",
    "mean_decompression_cpu_hours",
    "max_decompression_max_rss",
];

const COSTED_FIELDS: &[&str] = &[
    "compressor_level",
    "mean_compression_elapsed_hours",
    "mean_compression_cpu_hours",
    "max_compression_max_rss",
    "mean_compressed_gibytes",
    "mean_compression_delta_gibytes",
    "geomean_compression_ratio",
    "mean_decompression_elapsed_hours",
    "mean_decompression_cpu_hours",
    "max_decompression_max_rss",
    "compression_hour_cost",
    "decompression_hour_cost",
    "hour_cost",
    "gibyte_cost",
    "total_cost",
];

impl Summary for GroupResult {
    fn compressor_name(&self) -> &str {
        &self.compressor_name
    }

    fn field_names() -> &'static [&'static str] {
        GROUP_FIELDS
    }

    fn field(&self, name: &str) -> Option<f64> {
        let value = match name {
            "compressor_level" => self.compressor_level as f64,
            "mean_compression_elapsed_hours" => self.mean_compression_elapsed_hours,
            "mean_compression_cpu_hours" => self.mean_compression_cpu_hours,
            "max_compression_max_rss" => self.max_compression_max_rss as f64,
            "mean_compressed_gibytes" => self.mean_compressed_gibytes,
            "mean_compression_delta_gibytes" => self.mean_compression_delta_gibytes,
            "geomean_compression_ratio" => self.geomean_compression_ratio,
            "mean_decompression_elapsed_hours" => self.mean_decompression_elapsed_hours,
            "mean_decompression_cpu_hours" => self.mean_decompression_cpu_hours,
            "max_decompression_max_rss" => self.max_decompression_max_rss as f64,
            _ => return None,
        };
        Some(value)
    }
}

impl Summary for CostedGroupResult {
    fn compressor_name(&self) -> &str {
        &self.group.compressor_name
    }

    fn field_names() -> &'static [&'static str] {
        COSTED_FIELDS
    }

    fn field(&self, name: &str) -> Option<f64> {
        match name {
            "compression_hour_cost" => Some(self.compression_hour_cost),
            "decompression_hour_cost" => Some(self.decompression_hour_cost),
            "hour_cost" => Some(self.hour_cost),
            "gibyte_cost" => Some(self.gibyte_cost),
            "total_cost" => Some(self.total_cost),
            _ => self.group.field(name),
        }
    }
}

/// Writes summaries as a pretty-printed JSON array.
pub fn write_json<T: Serialize, W: Write>(items: &[T], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, items)?;
    Ok(())
}
