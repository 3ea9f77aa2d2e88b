//! `decode`: container to PNG.

use std::path::{Path, PathBuf};

use anyhow::Context;
use zenloop::{AnimationDecoder, CodecConfig, DecodeConfig, DecodeRequest, Limits};

use crate::DecodeArgs;
use crate::output::check_writable;
use crate::pngio;

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let output = args.output.clone().unwrap_or_else(|| args.file.with_extension("png"));
    let config = DecodeConfig::new().with_background_color(args.use_background);

    if args.all_frames {
        return decode_all(&data, &args, &output, config);
    }

    let codec_config = CodecConfig::default().with_decoder(config);
    let decoded = DecodeRequest::new(&data)
        .with_codec_config(&codec_config)
        .with_frame_index(args.frame)
        .decode()
        .with_context(|| format!("decoding {}", args.file.display()))?;

    check_writable(&args.file, &output, args.force)?;
    pngio::write_png(&output, decoded.pixels.to_rgba8().as_ref())?;
    eprintln!("{}x{} -> {}", decoded.width(), decoded.height(), output.display());
    Ok(())
}

fn decode_all(
    data: &[u8],
    args: &DecodeArgs,
    output: &Path,
    config: DecodeConfig,
) -> anyhow::Result<()> {
    let mut decoder = AnimationDecoder::new(data, &Limits::none())?.with_config(config);
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("frame").to_string();
    let dir = output.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let count = decoder.info().frame_count;
    let width = count.to_string().len();

    while let Some(frame) = decoder.next_frame()? {
        let path = dir.join(format!("{stem}.{:0width$}.png", frame.index));
        check_writable(&args.file, &path, args.force)?;
        pngio::write_png(&path, frame.image.as_ref())?;
        eprintln!(
            "frame {} @ {}ms ({}ms) -> {}",
            frame.index,
            frame.timestamp_ms,
            frame.duration_ms,
            path.display()
        );
    }
    Ok(())
}
