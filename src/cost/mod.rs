use crate::group::GroupResult;
use serde::{Deserialize, Serialize};

/// Amazon S3 standard storage, $ per GiB-month.
pub const DEFAULT_GIBYTE_COST: f64 = 0.023;

/// On-demand Amazon EC2 m3.medium, $ per hour.
pub const DEFAULT_HOUR_COST: f64 = 0.073;

pub const DEFAULT_USE_CPU_TIME: bool = false;

pub const DEFAULT_CURRENCY: &str = "$";

/// Number of candidates [`CostModel::summarize`] returns by default.
pub const DEFAULT_SUMMARIZE_TOP: usize = 5;

/// Prices for storing compressed output and for the compute spent producing
/// and reading it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CostModel {
    pub gibyte_cost: f64,
    pub compression_hour_cost: f64,
    pub decompression_hour_cost: f64,
    pub use_cpu_time: bool,     // Bill CPU time instead of elapsed time
    pub currency: String,
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel {
            gibyte_cost: DEFAULT_GIBYTE_COST,
            compression_hour_cost: DEFAULT_HOUR_COST,
            decompression_hour_cost: DEFAULT_HOUR_COST,
            use_cpu_time: DEFAULT_USE_CPU_TIME,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl CostModel {
    pub fn cost(&self, group_results: &[GroupResult]) -> Vec<CostedGroupResult> {
        group_results
            .iter()
            .map(|group_result| CostedGroupResult::new(self, group_result.clone()))
            .collect()
    }

    /// Returns the `top` cheapest results by total cost, cheapest first.
    pub fn summarize<'a>(&self, costed: &'a [CostedGroupResult], top: usize) -> Vec<&'a CostedGroupResult> {
        let mut sorted: Vec<&CostedGroupResult> = costed.iter().collect();
        sorted.sort_by(|a, b| a.total_cost.total_cmp(&b.total_cost));
        sorted.truncate(top);
        sorted
    }
}

/// A [`GroupResult`] priced under a [`CostModel`].
///
/// Costs are not rounded; rounding is left to whoever prints them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CostedGroupResult {
    #[serde(flatten)]
    pub group: GroupResult,
    pub use_cpu_time: bool,
    pub compression_hour_cost: f64,
    pub decompression_hour_cost: f64,
    pub hour_cost: f64,
    pub gibyte_cost: f64,
    pub total_cost: f64,
}

impl CostedGroupResult {
    pub fn new(model: &CostModel, group: GroupResult) -> Self {
        let compression_hour_cost = model.compression_hour_cost * group.compression_hours(model.use_cpu_time);
        let decompression_hour_cost = model.decompression_hour_cost * group.decompression_hours(model.use_cpu_time);
        let hour_cost = compression_hour_cost + decompression_hour_cost;
        let gibyte_cost = model.gibyte_cost * group.mean_compressed_gibytes;

        CostedGroupResult {
            group,
            use_cpu_time: model.use_cpu_time,
            compression_hour_cost,
            decompression_hour_cost,
            hour_cost,
            gibyte_cost,
            total_cost: hour_cost + gibyte_cost,
        }
    }

    /// Compression hours on the basis the costs were computed with.
    pub fn compression_hours(&self) -> f64 {
        self.group.compression_hours(self.use_cpu_time)
    }

    pub fn decompression_hours(&self) -> f64 {
        self.group.decompression_hours(self.use_cpu_time)
    }
}
