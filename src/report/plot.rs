use super::Summary;
use crate::compressor::CompressorRegistry;
use crate::cost::{CostModel, CostedGroupResult};
use crate::error::{BenchError, Result};
use crate::group::GroupResult;
use std::collections::BTreeMap;
use std::io::Write;

pub const DEFAULT_TERMINAL: &str = "png size 640, 480";
pub const DEFAULT_OUTPUT: &str = "compression_cost.png";
pub const DEFAULT_VIEW_ROT_X: i32 = 30;
pub const DEFAULT_VIEW_ROT_Z: i32 = 350;

/// Settings shared by every kind of plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotOptions {
    pub terminal: String,
    pub output: String,
    pub logscale_size: bool,
    pub autoscale_fix: bool,
    pub show_labels: bool,
    pub lmargin: Option<f64>,   // Workaround for a clipped y label on png
    pub title: Option<String>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            terminal: DEFAULT_TERMINAL.to_string(),
            output: DEFAULT_OUTPUT.to_string(),
            logscale_size: false,
            autoscale_fix: false,
            show_labels: true,
            lmargin: None,
            title: None,
        }
    }
}

/// Writes gnuplot scripts with one inline data block per compressor.
pub struct Plotter<'a> {
    registry: &'a CompressorRegistry,
    options: PlotOptions,
}

impl<'a> Plotter<'a> {
    pub fn new(registry: &'a CompressorRegistry, options: PlotOptions) -> Self {
        Plotter { registry, options }
    }

    /// 3D plot of compression time, compressed size and decompression time.
    pub fn plot_raw<W: Write>(
        &self,
        results: &[GroupResult],
        use_cpu_time: bool,
        out: W,
    ) -> Result<()> {
        let unit = time_unit(use_cpu_time);
        let columns = if use_cpu_time {
            ["mean_compression_cpu_hours", "mean_compressed_gibytes", "mean_decompression_cpu_hours"]
        } else {
            [
                "mean_compression_elapsed_hours",
                "mean_compressed_gibytes",
                "mean_decompression_elapsed_hours",
            ]
        };
        let using = using::<GroupResult>(&columns);

        let mut script = self.begin(results);
        script.push(format!("set xlabel 'Compression Time {}' rotate parallel", unit));
        script.push("set ylabel \"Compressed Size (GiB)\" rotate parallel".to_string());
        script.push(format!("set zlabel 'Decompression Time {}' rotate parallel", unit));
        self.write_style(&mut script);
        script.push(format!("set view {}, {}", DEFAULT_VIEW_ROT_X, DEFAULT_VIEW_ROT_Z));
        script.push("set grid xtics ytics ztics".to_string());

        let plots: Vec<String> = compressor_names(results)
            .into_iter()
            .map(|name| self.points(name, &using, ""))
            .collect();
        script.push(format!("splot {}", plots.join(", \\\n  ")));

        emit(script, out)
    }

    /// 2D plot of compression (or decompression) time against compressed size.
    pub fn plot_size<W: Write>(
        &self,
        results: &[GroupResult],
        use_cpu_time: bool,
        decompression: bool,
        out: W,
    ) -> Result<()> {
        let unit = time_unit(use_cpu_time);
        let time_column = match (decompression, use_cpu_time) {
            (true, true) => "mean_decompression_cpu_hours",
            (true, false) => "mean_decompression_elapsed_hours",
            (false, true) => "mean_compression_cpu_hours",
            (false, false) => "mean_compression_elapsed_hours",
        };
        let columns = [time_column, "mean_compressed_gibytes"];
        let using_points = using::<GroupResult>(&columns);
        let using_labels =
            using::<GroupResult>(&[time_column, "mean_compressed_gibytes", "compressor_level"]);

        let mut script = self.begin(results);
        script.push("set ylabel \"Compressed Size (GiB)\"".to_string());
        if decompression {
            script.push(format!("set xlabel 'Decompression Time {}'", unit));
        } else {
            script.push(format!("set xlabel 'Compression Time {}'", unit));
        }
        self.write_style(&mut script);

        let names = compressor_names(results);
        let mut plots: Vec<String> = names
            .iter()
            .map(|name| self.points(name, &using_points, ""))
            .collect();
        if self.options.show_labels {
            plots.extend(names.iter().map(|name| {
                format!(
                    "'${}' using {} with labels left offset 0, character 0.5 notitle",
                    block_name(name),
                    using_labels
                )
            }));
        }
        script.push(format!("plot {}", plots.join(", \\\n  ")));

        emit(script, out)
    }

    /// 2D plot in cost space: compute cost against storage cost, optionally
    /// with contours of total cost.
    pub fn plot_costs<W: Write>(
        &self,
        results: &[CostedGroupResult],
        model: &CostModel,
        show_cost_contours: bool,
        out: W,
    ) -> Result<()> {
        let columns = ["hour_cost", "gibyte_cost"];
        let axes = using::<CostedGroupResult>(&columns);
        let level = using::<CostedGroupResult>(&["compressor_level"]);
        let using_points = format!("{}:(0)", axes);
        let using_labels = format!("{}:(0):{}", axes, level);

        let mut script = self.begin(results);
        script.push(format!("set xlabel 'Time Cost ({})'", model.currency));
        script.push(format!("set ylabel 'Size Cost ({})'", model.currency));
        self.write_style(&mut script);
        script.push("set view map".to_string());
        script.push("set contour".to_string());
        script.push("set palette gray".to_string());
        script.push("set cntrlabel font \",10\"".to_string());
        script.push("set style textbox opaque noborder".to_string());
        let (low, high) = palette_range(results, &columns);
        script.push(format!("set cbrange [{}:{}]", low, high));
        script.push("unset colorbox".to_string());

        let names = compressor_names(results);
        let mut plots = Vec::new();
        if show_cost_contours {
            plots.push("x + y with lines palette notitle nosurface".to_string());
            plots.push("x + y with labels boxed notitle nosurface".to_string());
        }
        plots.extend(names.iter().map(|name| self.points(name, &using_points, "nocontour ")));
        if self.options.show_labels {
            plots.extend(names.iter().map(|name| {
                let block = block_name(name);
                format!("'${}' using {} with labels left nocontour notitle", block, using_labels)
            }));
        }
        script.push(format!("splot {}", plots.join(", \\\n  ")));

        emit(script, out)
    }

    /// Terminal settings and data blocks.
    fn begin<T: Summary>(&self, results: &[T]) -> Vec<String> {
        let mut script = vec![
            format!("set terminal {}", self.options.terminal),
            format!("set output '{}'", self.options.output),
        ];

        let mut by_name: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
        for result in results {
            by_name.entry(result.compressor_name()).or_default().push(result);
        }
        for (name, rows) in by_name {
            script.push(format!("${} << EOD", block_name(name)));
            for row in rows {
                let values: Vec<String> = T::field_names()
                    .iter()
                    .map(|field| row.field(field).unwrap_or(f64::NAN).to_string())
                    .collect();
                script.push(values.join(" "));
            }
            script.push("EOD".to_string());
        }

        script
    }

    fn write_style(&self, script: &mut Vec<String>) {
        if let Some(title) = &self.options.title {
            script.push(format!("set title {:?}", title));
        }
        script.push("set key outside".to_string());
        if let Some(lmargin) = self.options.lmargin {
            script.push(format!("set lmargin {}", lmargin));
        }
        if self.options.logscale_size {
            script.push("set logscale y".to_string());
        }
        if self.options.autoscale_fix {
            script.push("set autoscale fix".to_string());
        }
    }

    /// One legend entry: the compressor's data block in its registry style.
    fn points(&self, name: &str, using: &str, modifiers: &str) -> String {
        format!(
            "'${}' using {} with points {}{} title '{}'",
            block_name(name),
            using,
            modifiers,
            self.point_style(name),
            self.registry.display_name(name)
        )
    }

    fn point_style(&self, name: &str) -> String {
        // Unregistered compressors share the style after the registered ones
        let number = self.registry.number(name).unwrap_or(self.registry.len() + 1);
        format!("linecolor {} pointtype {}", number, number)
    }
}

fn time_unit(use_cpu_time: bool) -> &'static str {
    if use_cpu_time {
        "(CPU Hours)"
    } else {
        "(Elapsed Hours)"
    }
}

/// Sorted, distinct compressor names.
fn compressor_names<T: Summary>(results: &[T]) -> Vec<&str> {
    let mut names: Vec<&str> = results.iter().map(|r| r.compressor_name()).collect();
    names.sort_unstable();
    names.dedup();
    names
}

/// gnuplot data block names must be identifiers.
fn block_name(name: &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() { c } else { '_' }).collect()
}

/// The `using` clause selecting `columns` from a data block.
fn using<T: Summary>(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|name| T::column(name).map_or_else(|| "0".to_string(), |c| c.to_string()))
        .collect::<Vec<_>>()
        .join(":")
}

/// Colour range for the cost contours: from half the cheapest corner to the dearest.
fn palette_range<T: Summary>(results: &[T], columns: &[&str]) -> (f64, f64) {
    let mut low = 0.0;
    let mut high = 0.0;
    for column in columns {
        let values = results.iter().filter_map(|r| r.field(column));
        let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
            (min.min(v), max.max(v))
        });
        if min.is_finite() {
            low += min;
            high += max;
        }
    }
    (low / 2.0, high)
}

fn emit<W: Write>(script: Vec<String>, mut out: W) -> Result<()> {
    let mut text = script.join("\n");
    text.push('\n');
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| BenchError::io("writing plot script", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::group_result;

    fn options() -> PlotOptions {
        PlotOptions {
            logscale_size: true,
            autoscale_fix: true,
            lmargin: Some(5.0),
            title: Some("Test Plot".to_string()),
            ..PlotOptions::default()
        }
    }

    fn render<F: FnOnce(&Plotter, &mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let registry = CompressorRegistry::standard();
        let plotter = Plotter::new(&registry, options());
        let mut out = Vec::new();
        f(&plotter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn groups() -> Vec<GroupResult> {
        vec![
            group_result("gzip", 1, 1.0, 3.0),
            group_result("gzip", 9, 2.0, 2.5),
            group_result("seven_zip", 5, 4.0, 1.5),
        ]
    }

    #[test]
    fn raw_plot_has_preamble_style_and_blocks() {
        let script = render(|p, out| p.plot_raw(&groups(), false, out));
        assert!(script.starts_with("set terminal png size 640, 480\nset output 'compression_cost.png'\n"));
        assert!(script.contains("$gzip << EOD\n1 1 2 1024 3 7 3.3333333333333335 0.25 0.5 512\n9 "));
        assert!(script.contains("$seven_zip << EOD"));
        assert!(script.contains("set title \"Test Plot\""));
        assert!(script.contains("set lmargin 5"));
        assert!(script.contains("set logscale y"));
        assert!(script.contains("set autoscale fix"));
        assert!(script.contains("set view 30, 350"));
        assert!(script.contains("'$gzip' using 2:5:8 with points linecolor 3 pointtype 3 title 'gzip'"));
        assert!(script.contains("title '7z'"));
    }

    #[test]
    fn size_plot_picks_time_column() {
        let script = render(|p, out| p.plot_size(&groups(), true, true, out));
        assert!(script.contains("set xlabel 'Decompression Time (CPU Hours)'"));
        assert!(script.contains("'$gzip' using 9:5 with points"));
        assert!(script.contains("'$gzip' using 9:5:1 with labels"));
        assert!(script.contains("\nplot "));
    }

    #[test]
    fn cost_plot_has_contours_and_currency() {
        let model = CostModel::default();
        let costed = model.cost(&groups());
        let script = render(|p, out| p.plot_costs(&costed, &model, true, out));
        assert!(script.contains("set xlabel 'Time Cost ($)'"));
        assert!(script.contains("x + y with lines palette notitle nosurface"));
        assert!(script.contains("'$gzip' using 13:14:(0) with points nocontour"));
        assert!(script.contains("'$gzip' using 13:14:(0):1 with labels"));
        assert!(script.contains("set cbrange ["));
    }

    #[test]
    fn cost_plot_without_contours() {
        let model = CostModel::default();
        let costed = model.cost(&groups());
        let script = render(|p, out| p.plot_costs(&costed, &model, false, out));
        assert!(!script.contains("x + y"));
    }

    #[test]
    fn block_names_are_identifiers() {
        assert_eq!(block_name("seven_zip"), "seven_zip");
        assert_eq!(block_name("lz4-hc"), "lz4_hc");
    }

    #[test]
    fn unregistered_compressor_gets_spare_style() {
        let registry = CompressorRegistry::standard();
        let plotter = Plotter::new(&registry, PlotOptions::default());
        assert_eq!(plotter.point_style("fooz"), "linecolor 7 pointtype 7");
    }
}
