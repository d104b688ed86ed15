use clap::{Parser, Subcommand};
use graphbench_report::config::Config;
use graphbench_report::{Result, data, diagnostics, model, render};

#[derive(Parser)]
#[command(name = "graphbench-viz")]
#[command(about = "Graph benchmark results visualizer", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an HTML report with line charts and heatmaps.
    Report {
        /// Benchmark results CSV.
        #[arg(short, long)]
        input: String,

        #[arg(short = 'o', long)]
        out: String,

        /// Optional config.json.
        #[arg(long)]
        config: Option<String>,

        /// Runs per group the benchmark performed (overrides config).
        #[arg(long)]
        expected_runs: Option<u32>,
    },
    /// Print the aggregated report data as JSON.
    Summary {
        #[arg(short, long)]
        input: String,

        #[arg(long)]
        config: Option<String>,

        #[arg(long)]
        expected_runs: Option<u32>,
    },
}

fn build(
    input: &str,
    config: Option<&str>,
    expected_runs: Option<u32>,
) -> Result<model::ReportData> {
    let config = Config::resolve(config, expected_runs)?;

    // 1) Parse; malformed rows are skipped and reported.
    let parsed = data::parse_results_file(input)?;
    diagnostics::info(format!(
        "parsed {} rows from {} ({} skipped)",
        parsed.dataset.len(),
        input,
        parsed.skipped.len()
    ));

    // 2) Aggregate.
    Ok(model::build_report_data(input, &parsed, &config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    diagnostics::init(cli.verbose);

    match cli.cmd {
        Commands::Report {
            input,
            out,
            config,
            expected_runs,
        } => {
            let data = build(&input, config.as_deref(), expected_runs)?;

            // 3) Render HTML.
            let html = render::render_html_report(&data)?;
            std::fs::write(&out, html)?;
            println!("Wrote {}", out);
        }
        Commands::Summary {
            input,
            config,
            expected_runs,
        } => {
            let data = build(&input, config.as_deref(), expected_runs)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
    }

    Ok(())
}
