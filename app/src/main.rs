use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmd::Cmd;
use common::{
    bench::BenchError,
    config::Config,
    plot::{CHART_KIND_HINT, ChartData, ChartKind, GroupSelection},
    result::read_results,
    stats::Summary,
    util::{default_plot_path, list_result_files, plot_data_path},
};
use console::style;
use eyre::{Context, Result};
use tokio::fs::{create_dir_all, write};
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod bench;

const MODULES: &[&str] = &["frame_bench", "common", "cmd", "frame_plots"];

#[derive(Parser)]
#[command(version, about = "Run frame time benchmarks and plot their results")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(long, default_value_t = false, global = true)]
    no_progress: bool,
    /// Extra tracing directives, ie. `common=debug`
    #[arg(short, long, global = true)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every example from the examples file, repeatedly
    Bench {
        /// How many times the whole example list is run
        repeat_count: usize,
        /// Frame count passed to each example
        frame_count: u64,
        #[arg(short, long)]
        config_file: Option<PathBuf>,
    },
    /// Render a chart from a results file
    Plot {
        results_file: PathBuf,
        /// box, scatter, hist or line
        chart_kind: Option<String>,
        /// Group to plot, -1 for all groups
        #[arg(allow_negative_numbers = true)]
        group_index: Option<i64>,
        /// Where to write the SVG, defaults to a `plots` folder next to the results file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print per group statistics of a results file
    Summary {
        results_file: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List result files
    Ls {
        #[arg(short, long)]
        config_file: Option<PathBuf>,
    },
    /// Print the commands a bench run would execute
    Print {
        frame_count: u64,
        #[arg(short, long)]
        config_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage problems are reported, not failed on
            err.print()?;
            return Ok(());
        }
    };

    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new("");
    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }
    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let result = match args.command {
        Commands::Bench {
            repeat_count,
            frame_count,
            config_file,
        } => run_bench(config_file, repeat_count, frame_count, args.no_progress).await,
        Commands::Plot {
            results_file,
            chart_kind,
            group_index,
            output,
        } => plot(results_file, chart_kind, group_index, output).await,
        Commands::Summary { results_file, json } => summary(results_file, json).await,
        Commands::Ls { config_file } => list_results(config_file).await,
        Commands::Print {
            frame_count,
            config_file,
        } => print_commands(config_file, frame_count).await,
    };

    if let Err(err) = result {
        if let Some(bench_err) = err.downcast_ref::<BenchError>() {
            let code = bench_err.exit_code();
            eprintln!("{} {bench_err}", style("ERROR:").for_stderr().red().bold());
            drop(guard);
            std::process::exit(code);
        }
        error!("{err:#}");
        return Err(err);
    }
    Ok(())
}

async fn run_bench(
    config_file: Option<PathBuf>,
    repeat: usize,
    frames: u64,
    no_progress: bool,
) -> Result<()> {
    let config = Config::load(config_file.as_deref()).await?;
    debug!("Config: {config:?}");
    let bench = Cmd::new(config.command.clone());
    bench::run_benchmark(&config, &bench, repeat, frames, no_progress).await?;
    Ok(())
}

async fn print_commands(config_file: Option<PathBuf>, frames: u64) -> Result<()> {
    let config = Config::load(config_file.as_deref()).await?;
    bench::print_commands(&config, &Cmd::new(config.command.clone()), frames).await
}

async fn plot(
    results_file: PathBuf,
    chart_kind: Option<String>,
    group_index: Option<i64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let kind = match chart_kind.as_deref().map(str::parse::<ChartKind>) {
        None => ChartKind::default(),
        Some(Ok(kind)) => kind,
        Some(Err(_)) => {
            println!("{CHART_KIND_HINT}");
            return Ok(());
        }
    };
    let selection = match group_index {
        Some(index) => GroupSelection::from_index(index)?,
        None => GroupSelection::All,
    };

    let results = read_results(&results_file).await?;
    let chart = ChartData::prepare(&results, kind, selection)?;

    let suffix = match selection {
        GroupSelection::All => kind.to_string(),
        GroupSelection::Index(i) => format!("{kind}-{i}"),
    };
    let plot_path = output.unwrap_or_else(|| default_plot_path(&results_file, &suffix));

    let data_path = plot_data_path(&plot_path);
    if let Some(parent) = data_path.parent() {
        create_dir_all(parent).await?;
    }
    write(&data_path, serde_json::to_string(&chart)?)
        .await
        .wrap_err_with(|| format!("Write plot data {}", data_path.display()))?;

    let title = results_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    frame_plots::render(&chart, title, &plot_path)?;
    println!("Plot written to {}", plot_path.display());
    Ok(())
}

async fn summary(results_file: PathBuf, json: bool) -> Result<()> {
    let results = read_results(&results_file).await?;
    let summaries = results.groups().iter().map(Summary::of).collect::<Vec<_>>();
    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!(
        "{:<3} {:<24} {:>10} {:>8} {:>16} {:>16} {:>8}",
        "#", "name", "replicates", "samples", "mean", "std dev", "cv"
    );
    for (idx, s) in summaries.iter().enumerate() {
        println!(
            "{:<3} {:<24} {:>10} {:>8} {:>16.1} {:>16.1} {:>8.4}",
            idx, s.name, s.replicates, s.samples, s.mean, s.std_dev, s.mean_cv
        );
    }
    Ok(())
}

async fn list_results(config_file: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_file.as_deref()).await?;
    for path in list_result_files(&config.results_dir).await? {
        let groups = match read_results(&path).await {
            Ok(results) => results.len().to_string(),
            Err(err) => {
                debug!("{err:#}");
                "unreadable".to_owned()
            }
        };
        println!("{} -> {groups} groups", path.display());
    }
    Ok(())
}
