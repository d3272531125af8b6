//! Multi-objective filtering of summaries on a time axis and a space axis.
//!
//! An element dominates another only when it is strictly smaller on both
//! axes; ties never dominate. The filter is a pairwise O(n^2) scan, which is
//! plenty for the few hundred compressor-level pairs a run produces.

use crate::cost::CostedGroupResult;
use crate::group::GroupResult;

/// A summary that can be compared on two axes, both to be minimised.
pub trait Dominance {
    /// Returns (time axis, space axis).
    fn objectives(&self) -> (f64, f64);

    fn dominates(&self, other: &Self) -> bool {
        strictly_better(self.objectives(), other.objectives())
    }
}

/// Total CPU hours against compressed size.
impl Dominance for GroupResult {
    fn objectives(&self) -> (f64, f64) {
        (self.total_hours(true), self.mean_compressed_gibytes)
    }
}

/// Compute cost against storage cost.
impl Dominance for CostedGroupResult {
    fn objectives(&self) -> (f64, f64) {
        (self.hour_cost, self.gibyte_cost)
    }
}

fn strictly_better(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0 < b.0 && a.1 < b.1
}

/// Keeps the elements no other element dominates, in their original order.
pub fn find_non_dominated<T: Dominance + Clone>(items: &[T]) -> Vec<T> {
    find_non_dominated_by(items, T::objectives)
}

/// Like [`find_non_dominated`] with caller-chosen axes.
pub fn find_non_dominated_by<T, F>(items: &[T], objectives: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> (f64, f64),
{
    let points: Vec<(f64, f64)> = items.iter().map(&objectives).collect();
    items
        .iter()
        .zip(&points)
        .filter(|(_, point)| !points.iter().any(|other| strictly_better(*other, **point)))
        .map(|(item, _)| item.clone())
        .collect()
}
