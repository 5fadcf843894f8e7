use std::path::PathBuf;

use chrono::Local;
use common::{
    bench::Bench,
    config::{Config, read_examples},
    result::ResultWriter,
    util::result_filename,
};
use eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::fs::create_dir_all;
use tracing::{debug, error};

/// Runs every example `repeat` times and writes all output into one timestamped results file.
/// Stops at the first failing example; sections written so far stay on disk.
pub async fn run_benchmark(
    config: &Config,
    bench: &dyn Bench,
    repeat: usize,
    frames: u64,
    no_progress: bool,
) -> Result<PathBuf> {
    let examples = read_examples(&config.examples_file).await?;
    let queue = schedule(&examples, repeat);
    debug!(
        "Loaded {} examples, {} runs with bench {}",
        examples.len(),
        queue.len(),
        bench.name()
    );

    create_dir_all(&config.results_dir)
        .await
        .wrap_err_with(|| format!("Create results dir {}", config.results_dir.display()))?;
    let results_path = config.results_dir.join(result_filename(&Local::now()));
    println!("Results written to {}", results_path.display());
    let mut writer = ResultWriter::create(&results_path).await?;

    let progress = if no_progress {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(queue.len() as u64)
    };
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    for example in queue {
        let message = format!("Processing {example} ({frames} frames)");
        if no_progress {
            println!("{message}");
        }
        progress.set_message(message);

        let output = match bench.run(example, frames).await {
            Ok(output) => output,
            Err(err) => {
                progress.abandon();
                error!("Failed to run benchmark: {err}");
                return Err(err.into());
            }
        };
        writer.write_section(example, &output).await?;
        debug!("Done with {example}");
        progress.inc(1);
    }
    progress.finish_with_message("Done");

    Ok(results_path)
}

/// The full example list, `repeat` times over
fn schedule(examples: &[String], repeat: usize) -> Vec<&str> {
    std::iter::repeat_n(examples, repeat)
        .flatten()
        .map(String::as_str)
        .collect()
}

/// Every command [`run_benchmark`] would launch, in order
pub async fn print_commands(config: &Config, bench: &dyn Bench, frames: u64) -> Result<()> {
    for example in read_examples(&config.examples_file).await? {
        println!("{}", bench.cmd(&example, frames));
    }
    Ok(())
}
