use crate::compressor::CompressorRegistry;
use crate::cost::{CostModel, CostedGroupResult};
use crate::group::GroupResult;
use prettytable::{row, Table};

fn time_basis(use_cpu_time: bool) -> &'static str {
    if use_cpu_time {
        "CPU"
    } else {
        "elapsed"
    }
}

/// Describes one costed result as an indented block.
pub fn describe(result: &CostedGroupResult, registry: &CompressorRegistry, currency: &str) -> String {
    let group = &result.group;
    let basis = time_basis(result.use_cpu_time);
    let lines = [
        format!("{} level {}:", registry.display_name(&group.compressor_name), group.compressor_level),
        format!("  compression ratio           : {:.2}", group.geomean_compression_ratio),
        format!("  compression {:<7} hours    : {:.1}", basis, result.compression_hours()),
        format!("  compression max RSS (KiB)   : {}", group.max_compression_max_rss),
        format!("  compressed GiB              : {:.1}", group.mean_compressed_gibytes),
        format!("  GiB saved                   : {:.1}", group.mean_compression_delta_gibytes),
        format!("  decompression {:<7} hours  : {:.1}", basis, result.decompression_hours()),
        format!("  decompression max RSS (KiB) : {}", group.max_decompression_max_rss),
        "  ------------------".to_string(),
        format!("  storage cost                : {}{:.2}", currency, result.gibyte_cost),
        format!("  compute cost                : {}{:.2}", currency, result.hour_cost),
        format!("  total cost                  : {}{:.2}", currency, result.total_cost),
    ];
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Describes the `top` cheapest results under `model`, cheapest first.
pub fn summarize(model: &CostModel, costed: &[CostedGroupResult], top: usize, registry: &CompressorRegistry) -> Vec<String> {
    model
        .summarize(costed, top)
        .into_iter()
        .map(|result| describe(result, registry, &model.currency))
        .collect()
}

/// Tabulates group results, sorted by compressor and level.
pub fn results_table(group_results: &[GroupResult], registry: &CompressorRegistry, use_cpu_time: bool) -> Table {
    let mut sorted: Vec<&GroupResult> = group_results.iter().collect();
    sorted.sort_by(|a, b| {
        a.compressor_name
            .cmp(&b.compressor_name)
            .then(a.compressor_level.cmp(&b.compressor_level))
    });

    let basis = time_basis(use_cpu_time);
    let mut table = Table::new();
    table.add_row(row![
        "Compressor",
        "Level",
        "Ratio",
        "Size (GiB)",
        format!("Comp Time ({} h)", basis),
        "Comp Max RSS (KiB)",
        format!("Decomp Time ({} h)", basis),
        "Decomp Max RSS (KiB)"
    ]);

    for result in sorted {
        table.add_row(row![
            registry.display_name(&result.compressor_name),
            result.compressor_level,
            format!("{:.3}", result.geomean_compression_ratio),
            format!("{:.4}", result.mean_compressed_gibytes),
            format!("{:.4}", result.compression_hours(use_cpu_time)),
            result.max_compression_max_rss,
            format!("{:.4}", result.decompression_hours(use_cpu_time)),
            result.max_decompression_max_rss
        ]);
    }

    table
}
