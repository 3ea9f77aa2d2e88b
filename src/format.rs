//! Container and bitstream constants, chunk identifiers and format detection.

use core::fmt;

/// Size of the `RIFF <size> WEBP` file header.
pub const RIFF_HEADER_SIZE: usize = 12;
/// Size of a chunk header (fourcc + little-endian payload size).
pub const CHUNK_HEADER_SIZE: usize = 8;
/// Payload size of the `VP8X` chunk.
pub const VP8X_CHUNK_SIZE: usize = 10;
/// Payload size of the `ANIM` chunk.
pub const ANIM_CHUNK_SIZE: usize = 6;
/// Size of the fixed `ANMF` frame header preceding the frame's sub-chunks.
pub const ANMF_HEADER_SIZE: usize = 16;
/// Size of the `ALPH` header byte.
pub const ALPHA_HEADER_SIZE: usize = 1;
/// Size of the lossless bitstream header (signature + packed dimensions).
pub const LOSSLESS_HEADER_SIZE: usize = 5;
/// Size of the lossy bitstream's byte-aligned header.
pub const LOSSY_HEADER_SIZE: usize = 7;

/// First byte of every lossless bitstream.
pub const LOSSLESS_SIGNATURE: u8 = 0x2f;
/// Version number carried in the lossless header.
pub const LOSSLESS_VERSION: u32 = 0;
/// Version byte carried in the lossy header.
pub const LOSSY_VERSION: u8 = 0;

/// Largest width or height a single frame bitstream can carry.
pub const MAX_IMAGE_DIMENSION: u32 = 1 << 14;
/// Largest canvas width or height (24-bit field).
pub const MAX_CANVAS_DIMENSION: u32 = 1 << 24;
/// Largest canvas area.
pub const MAX_CANVAS_PIXELS: u64 = (1 << 32) - 1;
/// Largest frame duration in milliseconds (24-bit field).
pub const MAX_DURATION_MS: u32 = (1 << 24) - 1;
/// Display time of a frame whose stored duration is 0.
pub const DEFAULT_FRAME_DURATION_MS: u32 = 100;
/// Largest frame offset (stored halved in a 24-bit field).
pub const MAX_FRAME_OFFSET: u32 = ((1 << 24) - 1) * 2;
/// Largest chunk payload the RIFF size fields can describe.
pub const MAX_CHUNK_PAYLOAD: u32 = u32::MAX - CHUNK_HEADER_SIZE as u32 - 1;

/// `VP8X` flag: animation.
pub const ANIMATION_FLAG: u8 = 0x02;
/// `VP8X` flag: XMP chunk present.
pub const XMP_FLAG: u8 = 0x04;
/// `VP8X` flag: EXIF chunk present.
pub const EXIF_FLAG: u8 = 0x08;
/// `VP8X` flag: some frame carries alpha.
pub const ALPHA_FLAG: u8 = 0x10;
/// `VP8X` flag: ICC profile present.
pub const ICC_FLAG: u8 = 0x20;
/// Mask of all defined `VP8X` flags.
pub const ALL_VALID_FLAGS: u8 = ANIMATION_FLAG | XMP_FLAG | EXIF_FLAG | ALPHA_FLAG | ICC_FLAG;

/// `ANMF` flag bit: dispose frame rectangle to background after display.
pub const ANMF_DISPOSE_BACKGROUND: u8 = 0x01;
/// `ANMF` flag bit: do not alpha-blend with the previous canvas.
pub const ANMF_NO_BLEND: u8 = 0x02;

/// Literal symbols in the green/red/blue/alpha alphabets.
pub const NUM_LITERAL_CODES: usize = 256;
/// Backward-reference length prefix symbols.
pub const NUM_LENGTH_CODES: usize = 24;
/// Backward-reference distance prefix symbols.
pub const NUM_DISTANCE_CODES: usize = 40;
/// Largest color cache, in bits.
pub const MAX_COLOR_CACHE_BITS: u32 = 11;
/// Size of the code-length code alphabet.
pub const NUM_CODE_LENGTH_CODES: usize = 19;
/// Longest prefix code length in any image alphabet.
pub const MAX_CODE_LENGTH: u8 = 15;
/// Longest code length in the code-length code.
pub const MAX_CODE_LENGTH_CODE_LENGTH: u8 = 7;
/// Longest backward reference.
pub const MAX_COPY_LENGTH: usize = 4096;

/// MIME type of the container.
///
/// Only files whose frames are all lossless (`VP8L`) can be read by WebP
/// decoders. Files with lossy `ZDCT` frames share the container, MIME type
/// and extension but need this crate to decode.
pub const MIME_TYPE: &str = "image/webp";
/// File extension of the container. See [`MIME_TYPE`] for lossy files.
pub const FILE_EXTENSION: &str = "webp";

/// Four-character chunk identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    pub const RIFF: Self = Self(*b"RIFF");
    pub const WEBP: Self = Self(*b"WEBP");
    pub const VP8X: Self = Self(*b"VP8X");
    pub const VP8L: Self = Self(*b"VP8L");
    pub const ZDCT: Self = Self(*b"ZDCT");
    pub const ALPH: Self = Self(*b"ALPH");
    pub const ANIM: Self = Self(*b"ANIM");
    pub const ANMF: Self = Self(*b"ANMF");
    pub const ICCP: Self = Self(*b"ICCP");
    pub const EXIF: Self = Self(*b"EXIF");
    pub const XMP: Self = Self(*b"XMP ");

    /// Builds an identifier from a byte slice of length 4.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self(arr))
    }

    /// Identifier as raw bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// True for identifiers this crate interprets (anything else is carried as unknown).
    pub fn is_known(self) -> bool {
        matches!(
            self,
            Self::VP8X
                | Self::VP8L
                | Self::ZDCT
                | Self::ALPH
                | Self::ANIM
                | Self::ANMF
                | Self::ICCP
                | Self::EXIF
                | Self::XMP
        )
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc({self})")
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Encoding of a single frame's pixel data.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BitstreamFormat {
    /// Block-DCT lossy coding in a `ZDCT` chunk. Alpha travels in `ALPH`.
    Lossy,
    /// Lossless coding in a `VP8L` chunk, alpha included.
    Lossless,
}

impl BitstreamFormat {
    /// Chunk identifier holding this bitstream.
    pub fn fourcc(self) -> FourCc {
        match self {
            BitstreamFormat::Lossy => FourCc::ZDCT,
            BitstreamFormat::Lossless => FourCc::VP8L,
        }
    }

    /// Maps a chunk identifier to a bitstream format.
    pub fn from_fourcc(id: FourCc) -> Option<Self> {
        match id {
            FourCc::ZDCT => Some(BitstreamFormat::Lossy),
            FourCc::VP8L => Some(BitstreamFormat::Lossless),
            _ => None,
        }
    }

    /// Whether this bitstream is lossless.
    pub fn is_lossless(self) -> bool {
        matches!(self, BitstreamFormat::Lossless)
    }

    /// Whether the bitstream itself can carry alpha.
    pub fn supports_embedded_alpha(self) -> bool {
        self.is_lossless()
    }

    /// Whether WebP decoders can read this bitstream. `ZDCT` is specific to
    /// this crate.
    pub fn is_webp_compatible(self) -> bool {
        self.is_lossless()
    }
}

/// The `VP8X` feature flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureFlags(pub u8);

impl FeatureFlags {
    pub fn has_animation(self) -> bool {
        self.0 & ANIMATION_FLAG != 0
    }

    pub fn has_xmp(self) -> bool {
        self.0 & XMP_FLAG != 0
    }

    pub fn has_exif(self) -> bool {
        self.0 & EXIF_FLAG != 0
    }

    pub fn has_alpha(self) -> bool {
        self.0 & ALPHA_FLAG != 0
    }

    pub fn has_icc(self) -> bool {
        self.0 & ICC_FLAG != 0
    }

    /// Sets or clears `flag`.
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Checks for the `RIFF....WEBP` signature.
///
/// Only the first twelve bytes are examined.
pub fn is_supported(data: &[u8]) -> bool {
    data.len() >= RIFF_HEADER_SIZE && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Detect the bitstream of a simple or extended file from its leading chunks.
///
/// Returns `None` when the data is not a container, is animated, or is too
/// short to contain the first image chunk.
pub fn detect(data: &[u8]) -> Option<BitstreamFormat> {
    if !is_supported(data) {
        return None;
    }
    let mut pos = RIFF_HEADER_SIZE;
    while pos + CHUNK_HEADER_SIZE <= data.len() {
        let id = FourCc::from_slice(&data[pos..])?;
        if let Some(format) = BitstreamFormat::from_fourcc(id) {
            return Some(format);
        }
        if id == FourCc::ANMF {
            return None;
        }
        let size = u32::from_le_bytes(data[pos + 4..pos + 8].try_into().ok()?) as usize;
        pos = pos
            .checked_add(CHUNK_HEADER_SIZE)?
            .checked_add(size)?
            .checked_add(size & 1)?;
    }
    None
}

/// Detect from a file extension (case-insensitive).
pub fn is_supported_extension(ext: &str) -> bool {
    ext.eq_ignore_ascii_case(FILE_EXTENSION)
}
