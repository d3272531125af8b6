use crate::results::BenchmarkResult;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Scale factor applied when the sample is the whole dataset.
pub const DEFAULT_SCALE: f64 = 1.0;

pub const HOUR: f64 = 3600.0;                               // Seconds
pub const GIBIBYTE: f64 = 1024.0 * 1024.0 * 1024.0;         // Bytes

/// Results for one compressor and level, summarised over all targets.
///
/// Times are in hours and sizes in GiB, already multiplied by the scale
/// factor. The compression ratio is a geometric mean and is not scaled.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub compressor_name: String,
    pub compressor_level: i32,
    pub mean_compression_elapsed_hours: f64,
    pub mean_compression_cpu_hours: f64,
    pub max_compression_max_rss: u64,
    pub mean_compressed_gibytes: f64,
    pub mean_compression_delta_gibytes: f64,
    pub geomean_compression_ratio: f64,
    pub mean_decompression_elapsed_hours: f64,
    pub mean_decompression_cpu_hours: f64,
    pub max_decompression_max_rss: u64,
}

impl GroupResult {
    /// Summarises results that all share one compressor and level.
    ///
    /// Returns `None` for an empty slice, which has nothing to summarise.
    pub fn from_results(results: &[&BenchmarkResult], scale: f64) -> Option<Self> {
        let first = results.first()?;
        let field_mean = |field: fn(&BenchmarkResult) -> f64| mean(results.iter().map(|r| field(r)));

        Some(GroupResult {
            compressor_name: first.compressor_name.clone(),
            compressor_level: first.compressor_level,
            mean_compression_elapsed_hours: scale * field_mean(|r| r.compression_elapsed_time) / HOUR,
            mean_compression_cpu_hours: scale * field_mean(|r| r.compression_cpu_time) / HOUR,
            max_compression_max_rss: results.iter().map(|r| r.compression_max_rss).max().unwrap_or(0),
            mean_compressed_gibytes: scale * field_mean(|r| r.size as f64) / GIBIBYTE,
            mean_compression_delta_gibytes: scale * field_mean(BenchmarkResult::compression_delta) / GIBIBYTE,
            geomean_compression_ratio: geomean(results.iter().map(|r| r.compression_ratio())),
            mean_decompression_elapsed_hours: scale * field_mean(|r| r.decompression_elapsed_time) / HOUR,
            mean_decompression_cpu_hours: scale * field_mean(|r| r.decompression_cpu_time) / HOUR,
            max_decompression_max_rss: results.iter().map(|r| r.decompression_max_rss).max().unwrap_or(0),
        })
    }

    pub fn compression_hours(&self, use_cpu_time: bool) -> f64 {
        if use_cpu_time {
            self.mean_compression_cpu_hours
        } else {
            self.mean_compression_elapsed_hours
        }
    }

    pub fn decompression_hours(&self, use_cpu_time: bool) -> f64 {
        if use_cpu_time {
            self.mean_decompression_cpu_hours
        } else {
            self.mean_decompression_elapsed_hours
        }
    }

    /// Compression plus decompression time on the chosen basis.
    pub fn total_hours(&self, use_cpu_time: bool) -> f64 {
        self.compression_hours(use_cpu_time) + self.decompression_hours(use_cpu_time)
    }
}

/// Groups results by compressor and level and summarises each group.
///
/// Groups come out in the order their first result appears.
pub fn group(results: &[BenchmarkResult], scale: f64) -> Vec<GroupResult> {
    let mut index: FxHashMap<(&str, i32), usize> = FxHashMap::default();
    let mut groups: Vec<Vec<&BenchmarkResult>> = Vec::new();

    for result in results {
        let slot = *index.entry(result.group_key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(result);
    }

    groups
        .iter()
        .filter_map(|group| GroupResult::from_results(group, scale))
        .collect()
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    sum / n as f64
}

/// Geometric mean, computed in log space so long products cannot overflow.
fn geomean<I: Iterator<Item = f64>>(values: I) -> f64 {
    mean(values.map(f64::ln)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(target: &str, level: i32, cpu: f64, rss: u64, size: u64, decompression_cpu: f64, decompression_rss: u64) -> BenchmarkResult {
        BenchmarkResult {
            target: target.to_string(),
            target_size: 10_000,
            compressor_name: "fooz".to_string(),
            compressor_level: level,
            compression_elapsed_time: cpu / 10.0,
            compression_cpu_time: cpu,
            compression_max_rss: rss,
            size,
            decompression_elapsed_time: decompression_cpu / 10.0,
            decompression_cpu_time: decompression_cpu,
            decompression_max_rss: decompression_rss,
        }
    }

    fn fooz_results() -> Vec<BenchmarkResult> {
        vec![
            result("test_0", 1, 10.1, 1000, 5000, 2.1, 2000),
            result("test_0", 2, 20.2, 1001, 2500, 4.2, 2001),
            result("test_1", 1, 10.3, 1002, 4000, 2.3, 2002),
            result("test_1", 2, 20.4, 1003, 2000, 4.4, 2003),
        ]
    }

    fn assert_close(expected: f64, actual: f64) {
        assert!((expected - actual).abs() <= 1e-9 * expected.abs().max(1.0), "expected {}, got {}", expected, actual);
    }

    #[test]
    fn groups_over_targets() {
        let groups = group(&fooz_results(), 10_000.0);
        assert_eq!(groups.len(), 2);

        let level1 = &groups[0];
        assert_eq!(level1.compressor_name, "fooz");
        assert_eq!(level1.compressor_level, 1);
        assert_close(10_000.0 * (10.1 + 10.3) / 2.0 / 3600.0, level1.mean_compression_cpu_hours);
        assert_close(10_000.0 * (1.01 + 1.03) / 2.0 / 3600.0, level1.mean_compression_elapsed_hours);
        assert_eq!(level1.max_compression_max_rss, 1002);
        assert_close(10_000.0 * (5000.0 + 4000.0) / 2.0 / GIBIBYTE, level1.mean_compressed_gibytes);
        assert_close(10_000.0 * (5000.0 + 6000.0) / 2.0 / GIBIBYTE, level1.mean_compression_delta_gibytes);
        assert_close(5.0_f64.sqrt(), level1.geomean_compression_ratio);
        assert_close(10_000.0 * (2.1 + 2.3) / 2.0 / 3600.0, level1.mean_decompression_cpu_hours);
        assert_eq!(level1.max_decompression_max_rss, 2002);

        assert_eq!(groups[1].compressor_level, 2);
        assert_close(20.0_f64.sqrt(), groups[1].geomean_compression_ratio);
    }

    #[test]
    fn ratio_is_geometric_not_ratio_of_means() {
        let groups = group(&fooz_results(), 1.0);
        let ratio_of_means = 10_000.0 / ((5000.0 + 4000.0) / 2.0);
        assert!((groups[0].geomean_compression_ratio - ratio_of_means).abs() > 1e-3);
    }

    #[test]
    fn scale_doubles_additive_fields_only() {
        let once = group(&fooz_results(), 3.0);
        let twice = group(&fooz_results(), 6.0);
        for (a, b) in once.iter().zip(&twice) {
            assert_close(2.0 * a.mean_compression_elapsed_hours, b.mean_compression_elapsed_hours);
            assert_close(2.0 * a.mean_compression_cpu_hours, b.mean_compression_cpu_hours);
            assert_close(2.0 * a.mean_compressed_gibytes, b.mean_compressed_gibytes);
            assert_close(2.0 * a.mean_compression_delta_gibytes, b.mean_compression_delta_gibytes);
            assert_close(2.0 * a.mean_decompression_elapsed_hours, b.mean_decompression_elapsed_hours);
            assert_close(2.0 * a.mean_decompression_cpu_hours, b.mean_decompression_cpu_hours);
            assert_eq!(a.geomean_compression_ratio, b.geomean_compression_ratio);
            assert_eq!(a.max_compression_max_rss, b.max_compression_max_rss);
        }
    }

    #[test]
    fn keeps_first_seen_order() {
        let mut results = fooz_results();
        results.reverse();
        let levels: Vec<i32> = group(&results, DEFAULT_SCALE).iter().map(|g| g.compressor_level).collect();
        assert_eq!(levels, vec![2, 1]);
    }

    #[test]
    fn empty_input_gives_no_groups() {
        assert!(group(&[], DEFAULT_SCALE).is_empty());
        assert!(GroupResult::from_results(&[], DEFAULT_SCALE).is_none());
    }

    #[test]
    fn time_basis_selects_fields() {
        let g = &group(&fooz_results(), 1.0)[0];
        assert_eq!(g.compression_hours(true), g.mean_compression_cpu_hours);
        assert_eq!(g.decompression_hours(false), g.mean_decompression_elapsed_hours);
        assert_close(g.mean_compression_cpu_hours + g.mean_decompression_cpu_hours, g.total_hours(true));
    }
}
