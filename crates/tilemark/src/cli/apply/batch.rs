//! Batch processing: directory traversal with progress, skip-existing, and a summary.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tilemark_core::{DiscoveredFile, FileDiscovery, ProcessingStats};

use super::setup::batch_output_path;
use super::{ApplyArgs, ApplyContext, Manifest};

/// Watermark every supported file in the source directory.
///
/// Per-file failures are logged and counted; the command fails at the end if
/// any file failed.
pub async fn process_batch(
    ctx: ApplyContext,
    args: &ApplyArgs,
    output_dir: PathBuf,
    mut manifest: Option<Manifest>,
) -> anyhow::Result<()> {
    let files = ctx.processor.discover(&args.source);
    if files.is_empty() {
        tracing::warn!("No supported image files found in {:?}", args.source);
        return Ok(());
    }
    tracing::info!(
        "Found {} image(s) ({:.1} MB) to watermark into {:?}",
        files.len(),
        FileDiscovery::total_size(&files) as f64 / 1_000_000.0,
        output_dir
    );

    let targets = plan_outputs(&args.source, &output_dir, &files);

    let progress = create_progress_bar(files.len() as u64);
    let mut stats = ProcessingStats::default();
    let start_time = std::time::Instant::now();

    for (file, output) in files.iter().zip(&targets) {
        if output.exists() && !args.overwrite {
            tracing::debug!("Skipping {:?}: {:?} exists", file.path, output);
            stats.skipped += 1;
            progress.inc(1);
            continue;
        }

        match ctx.processor.process(&file.path, output, &ctx.options).await {
            Ok(result) => {
                stats.record(&result);
                if let Some(manifest) = manifest.as_mut() {
                    manifest.push(result)?;
                }
            }
            Err(e) => {
                stats.failed += 1;
                progress.suspend(|| tracing::error!("Failed: {:?} - {}", file.path, e));
            }
        }

        progress.inc(1);
        let elapsed = start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            let rate = (stats.succeeded + stats.failed) as f64 / elapsed;
            progress.set_message(format!("{:.1} img/sec", rate));
        }
    }

    if let Some(manifest) = manifest {
        let count = manifest.len();
        manifest.finish()?;
        if let Some(path) = &args.manifest {
            tracing::info!("Manifest with {} record(s) written to {:?}", count, path);
        }
    }

    let elapsed = start_time.elapsed();
    progress.finish_and_clear();
    print_summary(&stats, elapsed);

    if stats.skipped > 0 && !args.overwrite {
        tracing::info!("Pass --overwrite to regenerate skipped images");
    }
    if stats.failed > 0 {
        anyhow::bail!("{} of {} image(s) failed", stats.failed, stats.total());
    }
    Ok(())
}

/// Assign each file its output path.
///
/// Sources sharing a stem (`a.png`, `a.jpg`) would collide on `a.jpg`; later
/// ones keep their extension in the name instead (`a.png.jpg`).
fn plan_outputs(source_dir: &Path, output_dir: &Path, files: &[DiscoveredFile]) -> Vec<PathBuf> {
    let mut taken = HashSet::new();
    files
        .iter()
        .map(|file| {
            let mut output = batch_output_path(source_dir, output_dir, &file.path);
            if !taken.insert(output.clone()) {
                let name = file
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                output.set_file_name(format!("{name}.jpg"));
                tracing::warn!(
                    "{:?} shares its name with another source, writing {:?}",
                    file.path,
                    output
                );
                taken.insert(output.clone());
            }
            output
        })
        .collect()
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
fn print_summary(stats: &ProcessingStats, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        stats.succeeded as f64 / secs
    } else {
        0.0
    };
    let mb_written = stats.bytes_written as f64 / 1_000_000.0;

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Succeeded:    {:>8}", stats.succeeded);
    if stats.failed > 0 {
        eprintln!("    Failed:       {:>8}", stats.failed);
    }
    if stats.skipped > 0 {
        eprintln!("    Skipped:      {:>8}", stats.skipped);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", stats.total());
    eprintln!("    Written:      {:>7.1} MB", mb_written);
    eprintln!("    Duration:     {:>7.1}s", secs);
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
