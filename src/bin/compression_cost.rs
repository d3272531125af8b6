use clap::{Args, Parser, Subcommand};
use compression_cost_rs::benchmark::Comparer;
use compression_cost_rs::compressor::CompressorRegistry;
use compression_cost_rs::cost::{self, CostModel, CostedGroupResult};
use compression_cost_rs::error::{BenchError, Result};
use compression_cost_rs::group::{self, GroupResult};
use compression_cost_rs::pareto::{find_non_dominated, find_non_dominated_by};
use compression_cost_rs::report::plot::{self, PlotOptions, Plotter};
use compression_cost_rs::report::{summary, write_json};
use compression_cost_rs::results::{self, BenchmarkResult, ResultWriter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Measures compression tools on sample data and prices the results.
///
/// `compare` writes one CSV row per target, compressor and level. The other
/// commands read that CSV (from a file or stdin) and write summaries, gnuplot
/// scripts or JSON to stdout.
#[derive(Parser)]
#[command(name = "compression_cost")]
#[command(version, about = "Compare compression tools by what they cost to run", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run compression tools on targets and write a CSV
    Compare(CompareArgs),
    /// Read CSV from compare and write out the cheapest options
    Summarize(SummarizeArgs),
    /// Write a gnuplot script for a 3D plot of times and size
    PlotRaw(PlotRawArgs),
    /// Write a gnuplot script for a 2D plot of time against size
    PlotSize(PlotSizeArgs),
    /// Write a gnuplot script for a 2D cost plot
    PlotCosts(PlotCostsArgs),
    /// Write grouped (or costed) results as JSON
    Export(ExportArgs),
    /// Print the version of each compression tool
    Versions,
}

#[derive(Args)]
struct CompareArgs {
    /// Files to compress; they are copied and never modified
    #[arg(required = true)]
    targets: Vec<PathBuf>,

    /// Only run these compressors, comma separated
    #[arg(long, value_delimiter = ',')]
    compressors: Vec<String>,

    /// Directory for work copies
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Write the CSV here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct InputArgs {
    /// CSV file from compare (default: stdin)
    csv: Option<PathBuf>,

    /// Scale factor from sample targets to the full dataset
    #[arg(long, default_value_t = group::DEFAULT_SCALE)]
    scale: f64,
}

#[derive(Args)]
struct CostArgs {
    /// Storage cost per GiB of compressed output
    #[arg(long, default_value_t = cost::DEFAULT_GIBYTE_COST)]
    gibyte_cost: f64,

    /// Compute cost per hour of compression
    #[arg(long, default_value_t = cost::DEFAULT_HOUR_COST)]
    compression_hour_cost: f64,

    /// Compute cost per hour of decompression
    #[arg(long, default_value_t = cost::DEFAULT_HOUR_COST)]
    decompression_hour_cost: f64,

    /// Bill CPU time instead of elapsed time
    #[arg(long, default_value_t = cost::DEFAULT_USE_CPU_TIME)]
    use_cpu_time: bool,

    /// Currency symbol for printed costs
    #[arg(long, default_value = cost::DEFAULT_CURRENCY)]
    currency: String,
}

impl CostArgs {
    fn model(&self) -> CostModel {
        CostModel {
            gibyte_cost: self.gibyte_cost,
            compression_hour_cost: self.compression_hour_cost,
            decompression_hour_cost: self.decompression_hour_cost,
            use_cpu_time: self.use_cpu_time,
            currency: self.currency.clone(),
        }
    }
}

#[derive(Args)]
struct PlotArgs {
    /// The terminal line for gnuplot
    #[arg(long, default_value = plot::DEFAULT_TERMINAL)]
    terminal: String,

    /// The output name for gnuplot
    #[arg(long, default_value = plot::DEFAULT_OUTPUT)]
    output: String,

    /// Plot only non-dominated compressor-level pairs
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pareto_only: bool,

    /// Use a log scale for the size axis
    #[arg(long)]
    logscale_size: bool,

    /// Zoom axes to fit the points tightly
    #[arg(long)]
    autoscale_fix: bool,

    /// Show compression level labels on the plot
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    show_labels: bool,

    /// Left margin (if the y label is cut off on png)
    #[arg(long)]
    lmargin: Option<f64>,

    /// Main title
    #[arg(long)]
    title: Option<String>,
}

impl PlotArgs {
    fn options(&self) -> PlotOptions {
        PlotOptions {
            terminal: self.terminal.clone(),
            output: self.output.clone(),
            logscale_size: self.logscale_size,
            autoscale_fix: self.autoscale_fix,
            show_labels: self.show_labels,
            lmargin: self.lmargin,
            title: self.title.clone(),
        }
    }
}

#[derive(Args)]
struct SummarizeArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    cost: CostArgs,

    /// Number of cheapest options to show
    #[arg(long, default_value_t = cost::DEFAULT_SUMMARIZE_TOP)]
    top: usize,

    /// Also print a table of every compressor and level
    #[arg(long)]
    table: bool,
}

#[derive(Args)]
struct PlotRawArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Plot CPU time instead of elapsed time
    #[arg(long)]
    use_cpu_time: bool,
}

#[derive(Args)]
struct PlotSizeArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Plot CPU time instead of elapsed time
    #[arg(long)]
    use_cpu_time: bool,

    /// Plot decompression time instead of compression time
    #[arg(long)]
    decompression: bool,
}

#[derive(Args)]
struct PlotCostsArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    cost: CostArgs,

    #[command(flatten)]
    plot: PlotArgs,

    /// Show contours of total cost
    #[arg(long)]
    show_cost_contours: bool,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    input: InputArgs,

    #[command(flatten)]
    cost: CostArgs,

    /// Export costed results instead of plain group results
    #[arg(long)]
    costed: bool,
}

const DEFAULT_LOG_FILTER: &str = "compression_cost_rs=info,compression_cost=info";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(command: Command) -> Result<()> {
    match command {
        Command::Compare(args) => compare(args),
        Command::Summarize(args) => summarize(args),
        Command::PlotRaw(args) => plot_raw(args),
        Command::PlotSize(args) => plot_size(args),
        Command::PlotCosts(args) => plot_costs(args),
        Command::Export(args) => export(args),
        Command::Versions => versions(),
    }
}

// === Measurement ===

fn compare(args: CompareArgs) -> Result<()> {
    let mut registry = CompressorRegistry::standard();
    if !args.compressors.is_empty() {
        registry = registry.select(&args.compressors)?;
    }

    let mut comparer = Comparer::new();
    if let Some(dir) = args.tmp_dir {
        comparer = comparer.with_temp_root(dir);
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| BenchError::io(format!("creating {}", path.display()), e))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };

    let mut writer = ResultWriter::new(out);
    writer.write_header()?;
    comparer.run(&mut writer, &registry, &args.targets)?;
    writer.into_inner()?;
    Ok(())
}

fn versions() -> Result<()> {
    let mut stdout = io::stdout().lock();
    let registry = CompressorRegistry::standard();
    let lines = std::iter::once(format!("compression_cost-{}", env!("CARGO_PKG_VERSION"))).chain(
        registry
            .compressors()
            .iter()
            .map(|c| format!("{:>10}: {}", c.name(), c.version())),
    );
    for line in lines {
        writeln!(stdout, "{}", line).map_err(|e| BenchError::io("writing versions", e))?;
    }
    Ok(())
}

// === Reporting ===

fn read_input(input: &InputArgs) -> Result<Vec<BenchmarkResult>> {
    match &input.csv {
        Some(path) => results::read_results_file(path),
        None => results::read_results(io::stdin().lock()),
    }
}

fn read_groups(input: &InputArgs) -> Result<Vec<GroupResult>> {
    let results = read_input(input)?;
    Ok(group::group(&results, input.scale))
}

fn summarize(args: SummarizeArgs) -> Result<()> {
    let registry = CompressorRegistry::standard();
    let model = args.cost.model();
    let groups = read_groups(&args.input)?;
    let costed = model.cost(&groups);

    let mut stdout = io::stdout().lock();
    let mut text = summary::summarize(&model, &costed, args.top, &registry).concat();
    if args.table {
        text.push('\n');
        text.push_str(&summary::results_table(&groups, &registry, model.use_cpu_time).to_string());
    }
    stdout
        .write_all(text.as_bytes())
        .map_err(|e| BenchError::io("writing summary", e))
}

/// Pareto filter on the time basis being plotted.
fn plotted_groups(groups: Vec<GroupResult>, pareto_only: bool, use_cpu_time: bool) -> Vec<GroupResult> {
    match (pareto_only, use_cpu_time) {
        (false, _) => groups,
        (true, true) => find_non_dominated(&groups),
        (true, false) => {
            find_non_dominated_by(&groups, |g| (g.total_hours(false), g.mean_compressed_gibytes))
        }
    }
}

fn plot_raw(args: PlotRawArgs) -> Result<()> {
    let registry = CompressorRegistry::standard();
    let groups = plotted_groups(read_groups(&args.input)?, args.plot.pareto_only, args.use_cpu_time);
    let plotter = Plotter::new(&registry, args.plot.options());
    plotter.plot_raw(&groups, args.use_cpu_time, io::stdout().lock())
}

fn plot_size(args: PlotSizeArgs) -> Result<()> {
    let registry = CompressorRegistry::standard();
    let groups = plotted_groups(read_groups(&args.input)?, args.plot.pareto_only, args.use_cpu_time);
    let plotter = Plotter::new(&registry, args.plot.options());
    plotter.plot_size(&groups, args.use_cpu_time, args.decompression, io::stdout().lock())
}

fn plot_costs(args: PlotCostsArgs) -> Result<()> {
    let registry = CompressorRegistry::standard();
    let model = args.cost.model();
    let mut costed: Vec<CostedGroupResult> = model.cost(&read_groups(&args.input)?);
    if args.plot.pareto_only {
        costed = find_non_dominated(&costed);
    }
    let plotter = Plotter::new(&registry, args.plot.options());
    plotter.plot_costs(&costed, &model, args.show_cost_contours, io::stdout().lock())
}

fn export(args: ExportArgs) -> Result<()> {
    let groups = read_groups(&args.input)?;
    let mut stdout = io::stdout().lock();
    if args.costed {
        write_json(&args.cost.model().cost(&groups), &mut stdout)?;
    } else {
        write_json(&groups, &mut stdout)?;
    }
    writeln!(stdout).map_err(|e| BenchError::io("writing JSON", e))
}
