//! Lossless frame bitstream (VP8L layout).
//!
//! A stream is a 5-byte header followed by an image stream: an optional
//! chain of transforms, then an entropy-coded ARGB image. The same image
//! stream, without the header, carries compressed alpha planes.

mod backward_refs;
mod decode;
mod encode;
mod histogram;
mod prefix;
mod transform;

pub(crate) use decode::{decode, decode_image_stream};
pub(crate) use encode::{encode, encode_image_stream};

use crate::bitstream::{BitReader, BitWriter};
use crate::error::BitstreamError;
use crate::format::{
    LOSSLESS_HEADER_SIZE, LOSSLESS_SIGNATURE, LOSSLESS_VERSION, MAX_IMAGE_DIMENSION,
};

/// Number of `1 << bits` tiles covering `size` pixels.
#[inline]
pub(crate) fn subsample_size(size: usize, bits: u32) -> usize {
    (size + (1 << bits) - 1) >> bits
}

/// Contents of the lossless bitstream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LosslessHeader {
    pub width: u32,
    pub height: u32,
    /// Encoder hint that some pixel is not opaque.
    pub has_alpha: bool,
}

pub(crate) fn read_header(data: &[u8]) -> Result<LosslessHeader, BitstreamError> {
    if data.len() < LOSSLESS_HEADER_SIZE {
        return Err(BitstreamError::UnexpectedEof);
    }
    if data[0] != LOSSLESS_SIGNATURE {
        return Err(BitstreamError::InvalidSignature);
    }
    let mut reader = BitReader::new(&data[1..LOSSLESS_HEADER_SIZE]);
    let width = reader.read_bits(14)? + 1;
    let height = reader.read_bits(14)? + 1;
    let has_alpha = reader.read_bit()?;
    if reader.read_bits(3)? != LOSSLESS_VERSION {
        return Err(BitstreamError::InvalidSignature);
    }
    Ok(LosslessHeader {
        width,
        height,
        has_alpha,
    })
}

pub(crate) fn write_header(
    writer: &mut BitWriter,
    header: LosslessHeader,
) -> Result<(), BitstreamError> {
    let LosslessHeader { width, height, .. } = header;
    if !(1..=MAX_IMAGE_DIMENSION).contains(&width) || !(1..=MAX_IMAGE_DIMENSION).contains(&height) {
        return Err(BitstreamError::InvalidDimensions { width, height });
    }
    writer.write_bits(u32::from(LOSSLESS_SIGNATURE), 8);
    writer.write_bits(width - 1, 14);
    writer.write_bits(height - 1, 14);
    writer.write_bit(header.has_alpha);
    writer.write_bits(LOSSLESS_VERSION, 3);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LosslessConfig;
    use alloc::vec::Vec;

    #[test]
    fn header_roundtrip() {
        let header = LosslessHeader {
            width: 16384,
            height: 3,
            has_alpha: true,
        };
        let mut writer = BitWriter::new();
        write_header(&mut writer, header).unwrap();
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), LOSSLESS_HEADER_SIZE);
        assert_eq!(read_header(&bytes).unwrap(), header);
    }

    #[test]
    fn header_rejects_bad_signature_and_size() {
        assert_eq!(read_header(&[0x2e, 0, 0, 0, 0]), Err(BitstreamError::InvalidSignature));
        assert_eq!(read_header(&[0x2f, 0]), Err(BitstreamError::UnexpectedEof));
        let mut writer = BitWriter::new();
        let too_wide = LosslessHeader {
            width: 16385,
            height: 1,
            has_alpha: false,
        };
        assert!(write_header(&mut writer, too_wide).is_err());
    }

    fn gradient(width: usize, height: usize, alpha: bool) -> Vec<u32> {
        (0..width * height)
            .map(|i| {
                let (x, y) = ((i % width) as u32, (i / width) as u32);
                let a = if alpha { (x * 255 / width as u32) & 0xff } else { 0xff };
                (a << 24) | ((x * 3) & 0xff) << 16 | ((y * 5) & 0xff) << 8 | ((x + y) & 0xff)
            })
            .collect()
    }

    fn roundtrip(argb: &[u32], width: u32, height: u32, config: &LosslessConfig) {
        let encoded = encode(argb, width, height, config, None).unwrap();
        let (header, decoded) = decode(&encoded, None).unwrap();
        assert_eq!((header.width, header.height), (width, height));
        assert_eq!(decoded.as_slice(), argb, "effort {}", config.effort);
    }

    #[test]
    fn gradient_roundtrip_all_efforts() {
        let (w, h) = (45, 31);
        let image = gradient(w, h, false);
        for effort in 0..=10 {
            let config = LosslessConfig::new().with_effort(effort).with_exact(true);
            roundtrip(&image, w as u32, h as u32, &config);
        }
    }

    #[test]
    fn alpha_roundtrip_exact() {
        let (w, h) = (33, 17);
        let image = gradient(w, h, true);
        roundtrip(&image, w as u32, h as u32, &LosslessConfig::new().with_exact(true));
    }

    #[test]
    fn palette_images_roundtrip() {
        for colors in [1u32, 2, 4, 11, 200] {
            let (w, h) = (29, 13);
            let image: Vec<u32> = (0..(w * h) as u32)
                .map(|i| 0xff00_0000 | ((i * 7) % colors) * 0x0001_0103)
                .collect();
            roundtrip(&image, w as u32, h as u32, &LosslessConfig::new());
        }
    }

    #[test]
    fn one_pixel_image() {
        roundtrip(&[0x1234_5678], 1, 1, &LosslessConfig::new().with_exact(true));
    }

    #[test]
    fn forced_color_cache() {
        let image = gradient(40, 40, false);
        roundtrip(&image, 40, 40, &LosslessConfig::new().with_cache_bits(Some(7)).with_exact(true));
    }

    #[test]
    fn transparent_pixels_cleared_unless_exact() {
        let image = [0x00ff_ffffu32, 0xff00_0000, 0x0012_3456, 0x8000_00ff];
        let encoded = encode(&image, 2, 2, &LosslessConfig::new(), None).unwrap();
        let (header, decoded) = decode(&encoded, None).unwrap();
        assert!(header.has_alpha);
        assert_eq!(decoded, [0, 0xff00_0000, 0, 0x8000_00ff]);
    }

    #[test]
    fn truncated_stream_fails_cleanly() {
        let image = gradient(64, 64, false);
        let config = LosslessConfig::new().with_exact(true);
        let encoded = encode(&image, 64, 64, &config, None).unwrap();
        for len in [5, 6, encoded.len() / 3, encoded.len() - 1] {
            assert!(decode(&encoded[..len], None).is_err(), "len {len}");
        }
    }
}
