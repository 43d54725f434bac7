//! Batch processing: progress reporting around the core batch runner.

use tilesmith_core::{BatchRunner, Config, DiscoveredFile, FileDiscovery, FileOutcome};

/// Run every discovered file through the pipeline, then write the indexes.
pub fn process_batch(
    runner: BatchRunner,
    config: &Config,
    files: Vec<DiscoveredFile>,
) -> anyhow::Result<()> {
    let output_root = runner.output_root().to_path_buf();
    let total_input = FileDiscovery::total_size(&files);
    tracing::debug!(
        "Batch of {} files, {:.1} MB, ignore_errors = {}",
        files.len(),
        total_input as f64 / 1_000_000.0,
        config.processing.ignore_errors
    );

    let progress = create_progress_bar(files.len() as u64);
    let start_time = std::time::Instant::now();
    let mut done: u64 = 0;

    let result = runner.run(&files, |file, outcome| {
        done += 1;
        progress.inc(1);
        if let FileOutcome::Failed(_) = outcome {
            progress.println(format!("  failed: {}", file.path.display()));
        }
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            progress.set_message(format!("{:.1} img/sec", done as f64 / elapsed));
        }
    });
    progress.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Batch stopped after {} of {} files", done, files.len());
            return Err(e.into());
        }
    };

    let stats = &report.stats;
    print_summary(
        stats.succeeded,
        stats.failed,
        stats.skipped,
        stats.total_bytes,
        stats.tiles_written,
        report.indexes.tags.len(),
        start_time.elapsed(),
    );
    tracing::info!("Output written to {:?}", output_root);

    Ok(())
}

/// Create a progress bar for batch processing.
fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a formatted summary table after batch processing.
fn print_summary(
    succeeded: u64,
    failed: u64,
    skipped: u64,
    total_bytes: u64,
    tiles: u64,
    tags: usize,
    elapsed: std::time::Duration,
) {
    let total = succeeded + failed + skipped;
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { succeeded as f64 / secs } else { 0.0 };
    let throughput = if secs > 0.0 {
        total_bytes as f64 / 1_000_000.0 / secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", succeeded);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    if skipped > 0 {
        eprintln!("    Reused:       {:>8}", skipped);
    }
    eprintln!("    Tiles:        {:>8}", tiles);
    eprintln!("    Tags:         {:>8}", tags);
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", total);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("    Throughput:   {:>7.1} MB/sec", throughput);
    eprintln!("  ====================================");
}
