//! `anim`: PNG frames to an animation.

use indicatif::{ProgressBar, ProgressStyle};
use zenloop::{AnimationEncoder, AnimationParams, FrameSettings, LossyConfig};

use crate::AnimArgs;
use crate::batch::{self, InputKind};
use crate::output::{check_writable, write_file};
use crate::pngio;

pub fn run(args: AnimArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.frames, InputKind::Png, false)?;
    let Some(first) = files.first() else {
        anyhow::bail!("no PNG frames found");
    };
    if args.delay == 0 {
        anyhow::bail!("--delay must be at least 1ms");
    }
    check_writable(first, &args.output, args.force)?;

    let first_image = pngio::read_png(first)?;
    let (width, height) = (first_image.pixels.width() as u32, first_image.pixels.height() as u32);

    let mode = args.quality.mode();
    let mut settings = FrameSettings {
        mode,
        ..FrameSettings::default()
    };
    if let zenloop::EncodeMode::Lossy { quality } = mode {
        settings.lossy = LossyConfig::new().with_quality(quality);
    }
    if let Some(effort) = args.quality.effort {
        settings.lossless = settings.lossless.with_effort(effort);
    }

    let params = AnimationParams {
        loop_count: args.loops,
        ..AnimationParams::default()
    };
    let mut encoder = AnimationEncoder::new(width, height, settings)?.with_animation(params);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} frames")?,
    );

    let mut timestamp = 0u64;
    encoder.add_frame(first_image.pixels.as_ref(), timestamp)?;
    pb.inc(1);
    for path in &files[1..] {
        let image = pngio::read_png(path)?;
        timestamp += args.delay;
        encoder.add_frame(image.pixels.as_ref(), timestamp)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    let out = encoder.finish(timestamp + args.delay)?;
    write_file(&args.output, &out)?;
    eprintln!(
        "{} frames, {}x{} -> {} ({})",
        files.len(),
        width,
        height,
        args.output.display(),
        batch::format_size(out.len() as u64)
    );
    Ok(())
}
