//! `info`: probe and display container facts without decoding.

use std::path::Path;

use serde::Serialize;
use zenloop::{BlendMethod, Demuxer, DisposeMethod, LoopMode};

use crate::InfoArgs;
use crate::batch::{self, InputKind};

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.files, InputKind::Container, false)?;
    if files.is_empty() {
        anyhow::bail!("no container files found");
    }
    let multi = files.len() > 1;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }
        match inspect_file(path, args.chunks) {
            Ok(info) if args.json => println!("{}", serde_json::to_string_pretty(&info)?),
            Ok(info) => print_info(&info),
            Err(e) => eprintln!("  error: {e}"),
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InfoDisplay {
    path: String,
    bitstream: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    has_alpha: Option<bool>,
    has_animation: Option<bool>,
    frame_count: Option<u32>,
    /// Whether WebP decoders can read every frame.
    webp_compatible: Option<bool>,
    /// Set when the file is cut short.
    truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    animation: Option<AnimationDisplay>,
    icc_profile_size: Option<usize>,
    exif_size: Option<usize>,
    xmp_size: Option<usize>,
    file_size: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    chunks: Vec<ChunkDisplay>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    frames: Vec<FrameDisplay>,
}

#[derive(Debug, Serialize)]
struct AnimationDisplay {
    loop_count: u16,
    background: [u8; 4],
    total_duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ChunkDisplay {
    pub fourcc: String,
    pub offset: usize,
    pub size: usize,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
struct FrameDisplay {
    index: usize,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
    duration_ms: u32,
    bitstream: String,
    has_alpha: bool,
    dispose_to_background: bool,
    blend: bool,
}

pub fn chunk_list(demux: &Demuxer<'_>) -> Vec<ChunkDisplay> {
    demux
        .chunks()
        .iter()
        .map(|c| ChunkDisplay {
            fourcc: c.fourcc.to_string(),
            offset: c.offset,
            size: c.data.len(),
            complete: c.complete,
        })
        .collect()
}

fn inspect_file(path: &Path, with_chunks: bool) -> anyhow::Result<InfoDisplay> {
    let data = std::fs::read(path)?;
    let probe = zenloop::probe(&data)?;
    let demux = Demuxer::new_partial(&data).ok();

    let mut info = InfoDisplay {
        path: path.display().to_string(),
        bitstream: probe.format.map(|f| format!("{f:?}")),
        width: probe.width,
        height: probe.height,
        has_alpha: probe.has_alpha,
        has_animation: probe.has_animation,
        frame_count: probe.frame_count,
        webp_compatible: None,
        truncated: probe.frame_count.is_none(),
        animation: None,
        icc_profile_size: None,
        exif_size: None,
        xmp_size: None,
        file_size: data.len() as u64,
        chunks: Vec::new(),
        frames: Vec::new(),
    };
    let Some(demux) = demux else {
        return Ok(info);
    };

    info.webp_compatible = Some(demux.is_webp_compatible());
    info.animation = demux.animation().map(|params| AnimationDisplay {
        loop_count: params.loop_count,
        background: [
            params.background.r,
            params.background.g,
            params.background.b,
            params.background.a,
        ],
        total_duration_ms: demux.total_duration_ms(),
    });
    info.icc_profile_size = demux.icc_profile().map(<[u8]>::len);
    info.exif_size = demux.exif().map(<[u8]>::len);
    info.xmp_size = demux.xmp().map(<[u8]>::len);
    if with_chunks {
        info.chunks = chunk_list(&demux);
        info.frames = demux
            .frames()
            .iter()
            .map(|f| FrameDisplay {
                index: f.index,
                x: f.x_offset,
                y: f.y_offset,
                width: f.width,
                height: f.height,
                duration_ms: f.display_duration_ms(),
                bitstream: format!("{:?}", f.format),
                has_alpha: f.has_alpha,
                dispose_to_background: f.dispose == DisposeMethod::Background,
                blend: f.blend == BlendMethod::AlphaBlend,
            })
            .collect();
    }
    Ok(info)
}

fn show<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

fn print_info(info: &InfoDisplay) {
    println!("  Bitstream:    {}", info.bitstream.as_deref().unwrap_or("?"));
    println!("  Dimensions:   {}x{}", show(info.width), show(info.height));
    println!("  Alpha:        {}", info.has_alpha.map_or("?", |a| if a { "yes" } else { "no" }));
    if info.webp_compatible == Some(false) {
        println!("  WebP:         not readable by WebP decoders (lossy ZDCT frames)");
    }
    if let Some(anim) = &info.animation {
        let loops = match LoopMode::from_loop_count(anim.loop_count) {
            LoopMode::Infinite => "forever".to_string(),
            LoopMode::Once => "once".to_string(),
            LoopMode::Repeat(n) => format!("{n} times"),
        };
        println!(
            "  Animation:    {} frames, {}ms, plays {loops}",
            show(info.frame_count),
            anim.total_duration_ms
        );
        let [r, g, b, a] = anim.background;
        println!("  Background:   #{r:02x}{g:02x}{b:02x}{a:02x}");
    }
    if info.truncated {
        println!("  Truncated:    yes");
    }

    if info.icc_profile_size.is_some() || info.exif_size.is_some() || info.xmp_size.is_some() {
        println!("  Metadata:");
        if let Some(size) = info.icc_profile_size {
            println!("    ICC profile: {size} bytes");
        }
        if let Some(size) = info.exif_size {
            println!("    EXIF:        {size} bytes");
        }
        if let Some(size) = info.xmp_size {
            println!("    XMP:         {size} bytes");
        }
    }

    if !info.chunks.is_empty() {
        println!("  Chunks:");
        for c in &info.chunks {
            let mark = if c.complete { "" } else { " (truncated)" };
            println!("    {:<4} @ {:>8}  {:>8} bytes{mark}", c.fourcc, c.offset, c.size);
        }
    }
    if !info.frames.is_empty() {
        println!("  Frames:");
        for f in &info.frames {
            println!(
                "    #{:<3} {}x{} at ({}, {})  {}ms  {}{}{}",
                f.index,
                f.width,
                f.height,
                f.x,
                f.y,
                f.duration_ms,
                f.bitstream,
                if f.has_alpha { " alpha" } else { "" },
                match (f.dispose_to_background, f.blend) {
                    (true, true) => " dispose blend",
                    (true, false) => " dispose",
                    (false, true) => " blend",
                    (false, false) => "",
                },
            );
        }
    }
    println!("  File size:    {}", batch::format_size(info.file_size));
}
