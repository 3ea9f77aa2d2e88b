//! zlimg - encode, decode, inspect and remux zenloop container files.
//!
//! PNG is the interchange format on the pixel side: `encode` and `anim`
//! read PNG, `decode` writes PNG. `info`, `chunks` and `meta` work on the
//! container without touching pixels.

mod anim;
mod batch;
mod chunks;
mod decode;
mod encode;
mod info;
mod meta;
mod output;
mod pngio;

use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use zenloop::{EncodeMode, EncodeRequest, QualityPreset};

/// Arguments for the `encode` subcommand.
#[derive(Parser, Debug)]
pub struct EncodeArgs {
    /// Input PNG files, directories or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    // --- Output ---
    /// Output file or directory (dir/ with trailing slash for batch).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Filename suffix before extension (default: none).
    #[arg(long, default_value = "")]
    pub suffix: String,

    /// Allow overwriting existing files.
    #[arg(long)]
    pub force: bool,

    /// Show what would be done without writing files.
    #[arg(long)]
    pub dry_run: bool,

    // --- Quality ---
    #[command(flatten)]
    pub quality: QualityArgs,

    // --- Metadata ---
    /// Do not carry the PNG's ICC profile over.
    #[arg(long)]
    pub strip_icc: bool,

    // --- Batch ---
    /// Number of parallel workers (default: CPU count).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Print summary report after batch processing.
    #[arg(long)]
    pub report: bool,

    /// Write CSV report to file.
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Skip writing output if it would be larger than input.
    #[arg(long)]
    pub skip_if_larger: bool,
}

/// Encoder knobs shared by `encode` and `anim`.
#[derive(Args, Debug, Clone)]
pub struct QualityArgs {
    /// Lossy quality (0-100). Overrides --preset.
    #[arg(short, long)]
    pub quality: Option<f32>,

    /// Quality preset.
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Shorthand for --preset lossless.
    #[arg(long)]
    pub lossless: bool,

    /// Encoding effort (0-9).
    #[arg(long)]
    pub effort: Option<u8>,
}

impl QualityArgs {
    fn preset(&self) -> QualityPreset {
        if let Some(q) = self.quality {
            return QualityPreset::Custom(q);
        }
        if self.lossless {
            return QualityPreset::Lossless;
        }
        self.preset.map(PresetArg::to_preset).unwrap_or(QualityPreset::Balanced)
    }

    /// Encoder mode after applying --quality, --lossless and --preset.
    pub fn mode(&self) -> EncodeMode {
        self.preset().mode()
    }

    pub fn request<'a>(&self) -> EncodeRequest<'a> {
        let mut request = EncodeRequest::auto().with_preset(self.preset());
        if let Some(effort) = self.effort {
            request = request.with_effort(effort);
        }
        request
    }
}

/// Quality preset.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PresetArg {
    Lossless,
    NearLossless,
    High,
    Balanced,
    Small,
}

impl PresetArg {
    fn to_preset(self) -> QualityPreset {
        match self {
            PresetArg::Lossless => QualityPreset::Lossless,
            PresetArg::NearLossless => QualityPreset::NearLossless,
            PresetArg::High => QualityPreset::HighQuality,
            PresetArg::Balanced => QualityPreset::Balanced,
            PresetArg::Small => QualityPreset::SmallFile,
        }
    }
}

/// Arguments for the `decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Input container file.
    pub file: PathBuf,

    /// Output PNG path (default: input with .png extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Animation frame to decode.
    #[arg(long, default_value_t = 0)]
    pub frame: usize,

    /// Write every animation frame as <stem>.<index>.png.
    #[arg(long, conflicts_with = "frame")]
    pub all_frames: bool,

    /// Composite animations over the stored background color.
    #[arg(long)]
    pub use_background: bool,

    /// Allow overwriting existing files.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Also list every chunk and frame.
    #[arg(long)]
    pub chunks: bool,
}

/// Arguments for the `chunks` subcommand.
#[derive(Parser, Debug)]
pub struct ChunksArgs {
    /// Input container file.
    pub file: PathBuf,

    /// Write the payload of this chunk (e.g. ICCP, EXIF, "XMP ") to --output.
    #[arg(long)]
    pub extract: Option<String>,

    /// Which occurrence of the chunk to extract.
    #[arg(long, default_value_t = 0)]
    pub nth: usize,

    /// Destination for --extract (default: stdout).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the `meta` subcommand.
#[derive(Parser, Debug)]
pub struct MetaArgs {
    /// Input container file.
    pub file: PathBuf,

    /// Output file (default: rewrite the input, requires --force).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Set the ICC profile from a file.
    #[arg(long)]
    pub icc: Option<PathBuf>,

    /// Set the EXIF block from a file.
    #[arg(long)]
    pub exif: Option<PathBuf>,

    /// Set the XMP packet from a file.
    #[arg(long)]
    pub xmp: Option<PathBuf>,

    /// Strip all metadata (ICC, EXIF, XMP).
    #[arg(long)]
    pub strip_all: bool,

    /// Strip ICC profile only.
    #[arg(long)]
    pub strip_icc: bool,

    /// Strip EXIF only.
    #[arg(long)]
    pub strip_exif: bool,

    /// Strip XMP only.
    #[arg(long)]
    pub strip_xmp: bool,

    /// Allow overwriting existing files.
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the `anim` subcommand.
#[derive(Parser, Debug)]
pub struct AnimArgs {
    /// PNG frames in display order (glob patterns are sorted by name).
    #[arg(required = true)]
    pub frames: Vec<String>,

    /// Output container file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Delay between frames in milliseconds.
    #[arg(long, default_value_t = 100)]
    pub delay: u64,

    /// Loop count (0 = forever).
    #[arg(long, default_value_t = 0)]
    pub loops: u16,

    #[command(flatten)]
    pub quality: QualityArgs,

    /// Allow overwriting existing files.
    #[arg(long)]
    pub force: bool,
}

/// Dispatch CLI arguments.
///
/// Bare files default to `encode`.
fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let first_arg = args.get(1).map(|s| s.as_str());
    match first_arg {
        Some("encode") => encode::run(EncodeArgs::parse_from(&args[1..])),
        Some("decode") => decode::run(DecodeArgs::parse_from(&args[1..])),
        Some("info") => info::run(InfoArgs::parse_from(&args[1..])),
        Some("chunks") => chunks::run(ChunksArgs::parse_from(&args[1..])),
        Some("meta") => meta::run(MetaArgs::parse_from(&args[1..])),
        Some("anim") => anim::run(AnimArgs::parse_from(&args[1..])),
        Some("help" | "--help" | "-h") | None => {
            print_help();
            Ok(())
        }
        Some("--version" | "-V") => {
            println!("zlimg {} (zenloop {})", env!("CARGO_PKG_VERSION"), zenloop::VERSION);
            Ok(())
        }
        Some(_) => {
            let argv = std::iter::once("encode".to_string()).chain(args[1..].iter().cloned());
            let cmd = EncodeArgs::parse_from(argv);
            encode::run(cmd)
        }
    }
}

fn print_help() {
    eprintln!(
        "\
zlimg {} - zenloop container tool

USAGE:
    zlimg [COMMAND] [OPTIONS] <FILES>...

COMMANDS:
    encode     PNG -> container (default for bare files)
    decode     Container -> PNG
    info       Probe and display image facts
    chunks     List or extract chunks
    meta       Set or strip ICC/EXIF/XMP
    anim       PNG frames -> animation

EXAMPLES:
    zlimg photo.png                              Encode with balanced quality
    zlimg encode *.png -q 80 -o out/ --report
    zlimg decode clip.webp --frame 3 -o f3.png
    zlimg chunks photo.webp --extract EXIF -o exif.bin
    zlimg meta photo.webp --strip-all -o clean.webp
    zlimg anim frames/*.png --delay 40 -o clip.webp

Output keeps the .webp extension. Only lossless files (--lossless) can be
read by WebP decoders; lossy frames use zenloop's own ZDCT bitstream.

Run `zlimg <COMMAND> --help` for full options.",
        env!("CARGO_PKG_VERSION")
    );
}
