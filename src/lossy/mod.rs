//! Lossy frame bitstream (`ZDCT` chunk): YCbCr planes coded as quantised
//! 8×8 DCT blocks with per-image prefix codes.
//!
//! Layout: a 7-byte header (version, flags, width−1 and height−1 as
//! little-endian u16, quality), then an LSB-first bitstream holding the luma
//! and chroma quantisation tables in zig-zag order, four prefix codes (luma
//! DC/AC, chroma DC/AC) and the Y, Cb and Cr planes in block raster order.

mod color;
mod dct;
mod decode;
mod encode;
mod quant;

pub(crate) use decode::decode;
pub(crate) use encode::encode;

use crate::config::Subsampling;
use crate::error::BitstreamError;
use crate::format::{LOSSY_HEADER_SIZE, LOSSY_VERSION, MAX_IMAGE_DIMENSION};

/// Alphabet of the DC category codes.
const DC_ALPHABET: usize = 16;
/// Alphabet of the AC run/size codes.
const AC_ALPHABET: usize = 256;
const EOB: usize = 0x00;
const ZRL: usize = 0xf0;

const SUBSAMPLING_MASK: u8 = 0b11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LossyHeader {
    pub width: u32,
    pub height: u32,
    pub subsampling: Subsampling,
    /// Quality the encoder was asked for; informational only.
    pub quality: u8,
}

pub(crate) fn read_header(data: &[u8]) -> Result<LossyHeader, BitstreamError> {
    let header: &[u8; LOSSY_HEADER_SIZE] = data
        .get(..LOSSY_HEADER_SIZE)
        .and_then(|h| h.try_into().ok())
        .ok_or(BitstreamError::UnexpectedEof)?;
    if header[0] != LOSSY_VERSION {
        return Err(BitstreamError::InvalidHeader("unsupported lossy version"));
    }
    let flags = header[1];
    if flags & !SUBSAMPLING_MASK != 0 {
        return Err(BitstreamError::InvalidHeader("reserved lossy flags set"));
    }
    let subsampling = match flags & SUBSAMPLING_MASK {
        0 => Subsampling::Yuv444,
        1 => Subsampling::Yuv420,
        _ => return Err(BitstreamError::InvalidHeader("unknown chroma subsampling")),
    };
    let width = u32::from(u16::from_le_bytes([header[2], header[3]])) + 1;
    let height = u32::from(u16::from_le_bytes([header[4], header[5]])) + 1;
    if width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(BitstreamError::InvalidDimensions { width, height });
    }
    Ok(LossyHeader {
        width,
        height,
        subsampling,
        quality: header[6],
    })
}

pub(crate) fn write_header(
    header: &LossyHeader,
) -> Result<[u8; LOSSY_HEADER_SIZE], BitstreamError> {
    let LossyHeader { width, height, .. } = *header;
    if !(1..=MAX_IMAGE_DIMENSION).contains(&width) || !(1..=MAX_IMAGE_DIMENSION).contains(&height) {
        return Err(BitstreamError::InvalidDimensions { width, height });
    }
    let flags = match header.subsampling {
        Subsampling::Yuv444 => 0,
        Subsampling::Yuv420 => 1,
    };
    let w = ((width - 1) as u16).to_le_bytes();
    let h = ((height - 1) as u16).to_le_bytes();
    Ok([LOSSY_VERSION, flags, w[0], w[1], h[0], h[1], header.quality])
}
