use compression_cost_rs::cost::CostModel;
use compression_cost_rs::group::{group, GroupResult};
use compression_cost_rs::pareto::find_non_dominated_by;
use compression_cost_rs::results::BenchmarkResult;
use proptest::prelude::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-300)
}

fn point() -> impl Strategy<Value = (f64, f64)> {
    // Coarse values so ties are common
    (0u8..20, 0u8..20).prop_map(|(x, y)| (x as f64, y as f64))
}

fn benchmark_result() -> impl Strategy<Value = BenchmarkResult> {
    (
        0usize..3,
        1i32..4,
        1u64..1_000_000,
        1u64..1_000_000,
        0.0f64..100.0,
        0.0f64..100.0,
        0.0f64..100.0,
        0.0f64..100.0,
        1u64..100_000,
    )
        .prop_map(|(target, level, target_size, size, ce, cc, de, dc, rss)| BenchmarkResult {
            target: format!("target_{}", target),
            target_size,
            compressor_name: "fooz".to_string(),
            compressor_level: level,
            compression_elapsed_time: ce,
            compression_cpu_time: cc,
            compression_max_rss: rss,
            size,
            decompression_elapsed_time: de,
            decompression_cpu_time: dc,
            decompression_max_rss: rss / 2,
        })
}

fn additive_fields(g: &GroupResult) -> [f64; 6] {
    [
        g.mean_compression_elapsed_hours,
        g.mean_compression_cpu_hours,
        g.mean_compressed_gibytes,
        g.mean_compression_delta_gibytes,
        g.mean_decompression_elapsed_hours,
        g.mean_decompression_cpu_hours,
    ]
}

proptest! {
    #[test]
    fn pareto_filter_is_idempotent(points in prop::collection::vec(point(), 0..40)) {
        let once = find_non_dominated_by(&points, |p| *p);
        let twice = find_non_dominated_by(&once, |p| *p);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn pareto_filter_keeps_axis_minima(points in prop::collection::vec(point(), 1..40)) {
        let kept = find_non_dominated_by(&points, |p| *p);
        let min_x = points.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);

        for p in &points {
            if p.0 == min_x || p.1 == min_y {
                prop_assert!(kept.contains(p));
            }
        }
        for p in &kept {
            prop_assert!(!points.iter().any(|q| q.0 < p.0 && q.1 < p.1));
        }
    }

    #[test]
    fn scale_multiplies_additive_fields_only(
        results in prop::collection::vec(benchmark_result(), 1..30),
        scale in 0.5f64..1000.0,
    ) {
        let unscaled = group(&results, 1.0);
        let scaled = group(&results, scale);
        prop_assert_eq!(unscaled.len(), scaled.len());

        for (u, s) in unscaled.iter().zip(&scaled) {
            for (a, b) in additive_fields(u).iter().zip(additive_fields(s).iter()) {
                prop_assert!(close(a * scale, *b), "{} * {} != {}", a, scale, b);
            }
            prop_assert_eq!(u.geomean_compression_ratio, s.geomean_compression_ratio);
            prop_assert_eq!(u.max_compression_max_rss, s.max_compression_max_rss);
            prop_assert_eq!(u.max_decompression_max_rss, s.max_decompression_max_rss);
        }
    }

    #[test]
    fn total_cost_is_linear_in_prices(
        results in prop::collection::vec(benchmark_result(), 1..30),
        factor in 0.1f64..50.0,
        use_cpu_time in any::<bool>(),
    ) {
        let groups = group(&results, 1.0);
        let base = CostModel { use_cpu_time, ..CostModel::default() };
        let scaled = CostModel {
            gibyte_cost: base.gibyte_cost * factor,
            compression_hour_cost: base.compression_hour_cost * factor,
            decompression_hour_cost: base.decompression_hour_cost * factor,
            ..base.clone()
        };

        for (a, b) in base.cost(&groups).iter().zip(&scaled.cost(&groups)) {
            prop_assert!(close(a.total_cost * factor, b.total_cost));
            prop_assert!(close(a.gibyte_cost * factor, b.gibyte_cost));
            prop_assert!(close(a.total_cost, a.hour_cost + a.gibyte_cost));
        }
    }
}
