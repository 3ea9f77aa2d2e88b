//! `encode`: PNG files to containers, in parallel for batches.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use zenloop::{BitstreamFormat, ImageMetadata};

use crate::EncodeArgs;
use crate::batch::{self, BatchSummary, FileResult, InputKind};
use crate::output::{self, OutputConfig};
use crate::pngio;

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.files, InputKind::Png, true)?;
    if files.is_empty() {
        anyhow::bail!("no PNG files found");
    }

    let output_config = OutputConfig::new(
        args.output.as_deref(),
        &args.suffix,
        args.force,
        args.dry_run,
        zenloop::FILE_EXTENSION,
    );
    let input_count = files.len();
    let summary = Mutex::new(BatchSummary::default());

    if let [path] = files.as_slice() {
        let result = encode_one(path, &args, &output_config, input_count);
        if let Some(err) = &result.error {
            eprintln!("error: {}: {}", path.display(), err);
        } else if result.skipped {
            eprintln!("skipped (output would be larger)");
        } else if let (Some(out_size), Some(out_path)) = (result.output_size, &result.output_path) {
            eprintln!(
                "{} -> {} ({}, {:?})",
                batch::format_size(result.input_size),
                batch::format_size(out_size),
                out_path.display(),
                result.format.unwrap_or(BitstreamFormat::Lossless),
            );
        }
        lock(&summary).push(result);
    } else {
        let jobs = args
            .jobs
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        pool.install(|| {
            files.par_iter().for_each(|path| {
                let result = encode_one(path, &args, &output_config, input_count);
                if let Some(err) = &result.error {
                    pb.println(format!("error: {}: {}", path.display(), err));
                }
                lock(&summary).push(result);
                pb.inc(1);
            });
        });
        pb.finish_and_clear();
    }

    let summary = summary.into_inner().unwrap_or_else(|e| e.into_inner());
    if args.report {
        summary.print_report();
    }
    if let Some(csv_path) = &args.csv {
        summary.write_csv(csv_path)?;
        eprintln!("CSV report written to {}", csv_path.display());
    }
    if summary.error_count() > 0 {
        anyhow::bail!("{} of {} files had errors", summary.error_count(), summary.results.len());
    }
    Ok(())
}

fn lock(summary: &Mutex<BatchSummary>) -> std::sync::MutexGuard<'_, BatchSummary> {
    summary.lock().unwrap_or_else(|e| e.into_inner())
}

fn encode_one(
    input: &Path,
    args: &EncodeArgs,
    output_config: &OutputConfig,
    input_count: usize,
) -> FileResult {
    let start = Instant::now();
    let input_size = input.metadata().map(|m| m.len()).unwrap_or(0);
    let mut result = FileResult {
        input_path: input.to_path_buf(),
        input_size,
        output_size: None,
        output_path: None,
        format: None,
        skipped: false,
        error: None,
        duration: start.elapsed(),
    };
    match encode_inner(input, args, output_config, input_count) {
        Ok((path, size, format, skipped)) => {
            result.output_path = Some(path);
            result.output_size = Some(size);
            result.format = Some(format);
            result.skipped = skipped;
        }
        Err(e) => result.error = Some(format!("{e:#}")),
    }
    result.duration = start.elapsed();
    result
}

/// Returns (output path, output size, bitstream, skipped).
fn encode_inner(
    input: &Path,
    args: &EncodeArgs,
    output_config: &OutputConfig,
    input_count: usize,
) -> anyhow::Result<(PathBuf, u64, BitstreamFormat, bool)> {
    let input_size = input.metadata().map(|m| m.len()).unwrap_or(0);
    let image = pngio::read_png(input)?;

    let icc = image.icc_profile.as_deref().filter(|_| !args.strip_icc);
    let metadata =
        icc.map_or(ImageMetadata::none(), |icc| ImageMetadata::none().with_icc_profile(icc));
    let encoded = args
        .quality
        .request()
        .with_metadata(&metadata)
        .encode_rgba8(image.pixels.as_ref())
        .with_context(|| format!("encoding {}", input.display()))?;
    let output_size = encoded.data.len() as u64;

    if args.skip_if_larger && output_size >= input_size {
        return Ok((input.to_path_buf(), output_size, encoded.format, true));
    }

    let output_path = output_config.resolve(input, input_count)?;
    output_config.check_writable(input, &output_path)?;
    if output_config.dry_run {
        eprintln!(
            "dry-run: {} -> {} ({})",
            input.display(),
            output_path.display(),
            batch::format_size(output_size),
        );
    } else {
        output::write_file(&output_path, &encoded.data)?;
    }
    Ok((output_path, output_size, encoded.format, false))
}
