//! `ALPH` chunk payloads: an alpha plane for lossy frames.
//!
//! The first byte packs compression (bits 0-1), filter (bits 2-3) and
//! pre-processing (bits 4-5). Compressed planes are a headerless lossless
//! image stream with alpha in the green channel.

use alloc::vec::Vec;

use crate::Stop;
use crate::bitstream::{BitReader, BitWriter};
use crate::config::{AlphaFilter, LosslessConfig};
use crate::error::{BitstreamError, CodecError, check_stop};
use crate::format::ALPHA_HEADER_SIZE;
use crate::lossless;

const COMPRESSION_NONE: u8 = 0;
const COMPRESSION_LOSSLESS: u8 = 1;
const PREPROCESSING_LEVELS: u8 = 1;

/// Filter applied before compression, as written in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterMode {
    None = 0,
    Horizontal = 1,
    Vertical = 2,
    Gradient = 3,
}

impl FilterMode {
    const ALL: [FilterMode; 4] = [
        FilterMode::None,
        FilterMode::Horizontal,
        FilterMode::Vertical,
        FilterMode::Gradient,
    ];

    fn from_bits(bits: u8) -> Self {
        Self::ALL[usize::from(bits & 3)]
    }
}

#[inline]
fn predict(mode: FilterMode, plane: &[u8], width: usize, x: usize, y: usize) -> u8 {
    let pos = y * width + x;
    match (x, y) {
        (0, 0) => 0,
        (_, 0) => plane[pos - 1],
        (0, _) => plane[pos - width],
        _ => match mode {
            FilterMode::None => 0,
            FilterMode::Horizontal => plane[pos - 1],
            FilterMode::Vertical => plane[pos - width],
            FilterMode::Gradient => {
                let g = i32::from(plane[pos - 1]) + i32::from(plane[pos - width])
                    - i32::from(plane[pos - width - 1]);
                g.clamp(0, 255) as u8
            }
        },
    }
}

fn apply_filter(mode: FilterMode, plane: &[u8], width: usize, height: usize) -> Vec<u8> {
    if mode == FilterMode::None {
        return plane.to_vec();
    }
    let mut out = Vec::with_capacity(plane.len());
    for y in 0..height {
        for x in 0..width {
            out.push(plane[y * width + x].wrapping_sub(predict(mode, plane, width, x, y)));
        }
    }
    out
}

fn unfilter(mode: FilterMode, plane: &mut [u8], width: usize, height: usize) {
    if mode == FilterMode::None {
        return;
    }
    for y in 0..height {
        for x in 0..width {
            let prediction = predict(mode, plane, width, x, y);
            let pos = y * width + x;
            plane[pos] = plane[pos].wrapping_add(prediction);
        }
    }
}

fn residual_energy(residuals: &[u8]) -> u64 {
    residuals.iter().map(|&r| u64::from((r as i8).unsigned_abs())).sum()
}

/// Quantises alpha to fewer levels, keeping 0 and 255 exact.
fn reduce_levels(plane: &mut [u8], quality: u8) {
    let quality = u32::from(quality.min(100));
    let levels = if quality <= 70 { 2 + quality / 5 } else { 16 + (quality - 70) * 8 };
    if levels >= 256 {
        return;
    }
    let steps = levels - 1;
    for a in plane.iter_mut() {
        let q = (u32::from(*a) * steps + 127) / 255;
        *a = ((q * 255 + steps / 2) / steps) as u8;
    }
}

/// True when every value is 255.
pub(crate) fn is_opaque(alpha: &[u8]) -> bool {
    alpha.iter().all(|&a| a == 255)
}

/// Encodes an alpha plane into an `ALPH` payload.
pub(crate) fn encode_alpha(
    alpha: &[u8],
    width: usize,
    height: usize,
    quality: u8,
    filter: AlphaFilter,
    effort: u8,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u8>, CodecError> {
    if alpha.len() != width * height {
        return Err(CodecError::InvalidInput("alpha plane size does not match dimensions".into()));
    }
    let mut plane = alpha.to_vec();
    let preprocessing = if quality < 100 {
        reduce_levels(&mut plane, quality);
        PREPROCESSING_LEVELS
    } else {
        0
    };

    let (mode, filtered) = match filter {
        AlphaFilter::None => (FilterMode::None, plane),
        AlphaFilter::Horizontal => {
            let mode = FilterMode::Horizontal;
            (mode, apply_filter(mode, &plane, width, height))
        }
        AlphaFilter::Vertical => {
            let mode = FilterMode::Vertical;
            (mode, apply_filter(mode, &plane, width, height))
        }
        AlphaFilter::Gradient => {
            let mode = FilterMode::Gradient;
            (mode, apply_filter(mode, &plane, width, height))
        }
        AlphaFilter::Auto => FilterMode::ALL
            .iter()
            .map(|&mode| (mode, apply_filter(mode, &plane, width, height)))
            .min_by_key(|(_, residuals)| residual_energy(residuals))
            .unwrap_or((FilterMode::None, plane)),
    };
    check_stop(stop)?;

    let argb: Vec<u32> = filtered.iter().map(|&a| 0xff00_0000 | u32::from(a) << 8).collect();
    let mut writer = BitWriter::with_capacity(filtered.len() / 4);
    let config = LosslessConfig::new().with_effort(effort).with_exact(true);
    lossless::encode_image_stream(&mut writer, &argb, width, height, &config, stop)?;
    let compressed = writer.into_bytes();

    let header = |compression: u8| compression | (mode as u8) << 2 | preprocessing << 4;
    let mut out = Vec::with_capacity(ALPHA_HEADER_SIZE + compressed.len().min(filtered.len()));
    if compressed.len() < filtered.len() {
        out.push(header(COMPRESSION_LOSSLESS));
        out.extend_from_slice(&compressed);
    } else {
        out.push(header(COMPRESSION_NONE));
        out.extend_from_slice(&filtered);
    }
    Ok(out)
}

/// Decodes an `ALPH` payload to a `width × height` alpha plane.
pub(crate) fn decode_alpha(
    data: &[u8],
    width: usize,
    height: usize,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u8>, CodecError> {
    let (&header, payload) = data.split_first().ok_or(BitstreamError::UnexpectedEof)?;
    let compression = header & 3;
    let mode = FilterMode::from_bits(header >> 2);
    let preprocessing = (header >> 4) & 3;
    if header >> 6 != 0 || preprocessing > PREPROCESSING_LEVELS {
        return Err(BitstreamError::InvalidAlphaHeader.into());
    }

    let total = width * height;
    let mut plane = match compression {
        COMPRESSION_NONE => payload.get(..total).ok_or(BitstreamError::UnexpectedEof)?.to_vec(),
        COMPRESSION_LOSSLESS => {
            let mut reader = BitReader::new(payload);
            let pixels = lossless::decode_image_stream(&mut reader, width, height, stop)?;
            pixels.iter().map(|&p| (p >> 8) as u8).collect()
        }
        _ => return Err(BitstreamError::InvalidAlphaHeader.into()),
    };
    unfilter(mode, &mut plane, width, height);
    Ok(plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn ramp(width: usize, height: usize) -> Vec<u8> {
        (0..width * height).map(|i| ((i % width) * 255 / (width - 1)) as u8).collect()
    }

    #[test]
    fn filters_invert() {
        let (w, h) = (13, 7);
        let plane: Vec<u8> = (0..w * h).map(|i| (i * 37 % 251) as u8).collect();
        for mode in FilterMode::ALL {
            let mut filtered = apply_filter(mode, &plane, w, h);
            unfilter(mode, &mut filtered, w, h);
            assert_eq!(filtered, plane, "{mode:?}");
        }
    }

    #[test]
    fn lossless_alpha_roundtrip_every_filter() {
        let (w, h) = (31, 9);
        let plane = ramp(w, h);
        let filters = [
            AlphaFilter::None,
            AlphaFilter::Horizontal,
            AlphaFilter::Vertical,
            AlphaFilter::Gradient,
            AlphaFilter::Auto,
        ];
        for filter in filters {
            let payload = encode_alpha(&plane, w, h, 100, filter, 4, None).unwrap();
            assert_eq!(payload[0] >> 4, 0);
            assert_eq!(decode_alpha(&payload, w, h, None).unwrap(), plane, "{filter:?}");
        }
    }

    #[test]
    fn reduced_levels_keep_extremes() {
        let mut plane: Vec<u8> = (0..=255).collect();
        reduce_levels(&mut plane, 10);
        assert_eq!(plane[0], 0);
        assert_eq!(plane[255], 255);
        let mut distinct = plane.clone();
        distinct.dedup();
        assert_eq!(distinct.len(), 4);
    }

    #[test]
    fn lossy_alpha_sets_preprocessing() {
        let plane = ramp(16, 16);
        let payload = encode_alpha(&plane, 16, 16, 50, AlphaFilter::Auto, 4, None).unwrap();
        assert_eq!((payload[0] >> 4) & 3, 1);
        let decoded = decode_alpha(&payload, 16, 16, None).unwrap();
        assert!(decoded.iter().zip(&plane).all(|(a, b)| a.abs_diff(*b) <= 20));
    }

    #[test]
    fn raw_payload_and_bad_headers() {
        let mut payload = vec![0u8];
        payload.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(decode_alpha(&payload, 2, 2, None).unwrap(), [1, 2, 3, 4]);
        assert!(decode_alpha(&payload[..3], 2, 2, None).is_err());
        assert!(decode_alpha(&[0x03, 0, 0, 0, 0], 2, 2, None).is_err());
        assert!(decode_alpha(&[0x40, 0, 0, 0, 0], 2, 2, None).is_err());
        assert!(decode_alpha(&[], 2, 2, None).is_err());
    }
}
