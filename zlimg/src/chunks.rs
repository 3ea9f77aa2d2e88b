//! `chunks`: list or extract top-level chunks.

use std::io::Write;

use anyhow::{Context, bail};
use zenloop::{Demuxer, FourCc};

use crate::ChunksArgs;
use crate::info::chunk_list;
use crate::output::write_file;

pub fn run(args: ChunksArgs) -> anyhow::Result<()> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    let demux = Demuxer::new_partial(&data)
        .with_context(|| format!("parsing {}", args.file.display()))?;

    let Some(name) = &args.extract else {
        for c in chunk_list(&demux) {
            let mark = if c.complete { "" } else { " (truncated)" };
            println!("{:<4} {:>10} {:>10}{mark}", c.fourcc, c.offset, c.size);
        }
        return Ok(());
    };

    let fourcc = parse_fourcc(name)?;
    let Some(chunk) = demux.chunk(fourcc, args.nth) else {
        bail!(
            "{} has {} {fourcc} chunk(s), no #{}",
            args.file.display(),
            demux.chunk_count(fourcc),
            args.nth
        );
    };
    if !chunk.complete {
        eprintln!("warning: {fourcc} chunk is truncated");
    }
    match &args.output {
        Some(path) => write_file(path, chunk.data)?,
        None => std::io::stdout().lock().write_all(chunk.data)?,
    }
    Ok(())
}

/// Accepts identifiers shorter than four characters, padded with spaces.
fn parse_fourcc(name: &str) -> anyhow::Result<FourCc> {
    let bytes = name.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 || !name.is_ascii() {
        bail!("chunk identifier must be 1-4 ASCII characters, got {name:?}");
    }
    let mut id = [b' '; 4];
    id[..bytes.len()].copy_from_slice(bytes);
    Ok(FourCc(id))
}
