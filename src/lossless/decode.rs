use alloc::vec::Vec;

use super::histogram::green_alphabet_size;
use super::prefix::{ColorCache, plane_code_to_distance, prefix_decode};
use super::transform::{
    TransformType, color_indexing_bits, inverse_color_indexing, inverse_cross_color,
    inverse_predictor, inverse_subtract_green, undelta_palette,
};
use super::{LosslessHeader, read_header, subsample_size};
use crate::Stop;
use crate::bitstream::BitReader;
use crate::entropy::{HuffmanTree, read_code};
use crate::error::{BitstreamError, CodecError, check_stop};
use crate::format::{
    LOSSLESS_HEADER_SIZE, MAX_COLOR_CACHE_BITS, NUM_DISTANCE_CODES, NUM_LENGTH_CODES,
    NUM_LITERAL_CODES,
};

/// Rows decoded between stop-token polls.
const STOP_CHECK_ROWS: usize = 16;

/// Green, red, blue, alpha and distance codes for one meta group.
struct TreeGroup {
    green: HuffmanTree,
    red: HuffmanTree,
    blue: HuffmanTree,
    alpha: HuffmanTree,
    distance: HuffmanTree,
}

impl TreeGroup {
    fn read(reader: &mut BitReader<'_>, cache_bits: u32) -> Result<Self, BitstreamError> {
        Ok(Self {
            green: read_code(reader, green_alphabet_size(cache_bits))?,
            red: read_code(reader, NUM_LITERAL_CODES)?,
            blue: read_code(reader, NUM_LITERAL_CODES)?,
            alpha: read_code(reader, NUM_LITERAL_CODES)?,
            distance: read_code(reader, NUM_DISTANCE_CODES)?,
        })
    }
}

enum Transform {
    Predictor { bits: u32, xsize: usize, modes: Vec<u32> },
    CrossColor { bits: u32, xsize: usize, codes: Vec<u32> },
    SubtractGreen,
    ColorIndexing { bits: u32, xsize: usize, palette: Vec<u32> },
}

/// Decodes a complete lossless frame bitstream into ARGB pixels.
pub(crate) fn decode(
    data: &[u8],
    stop: Option<&dyn Stop>,
) -> Result<(LosslessHeader, Vec<u32>), CodecError> {
    let header = read_header(data)?;
    let mut reader = BitReader::new(&data[LOSSLESS_HEADER_SIZE..]);
    let (width, height) = (header.width as usize, header.height as usize);
    let pixels = decode_image_stream(&mut reader, width, height, stop)?;
    Ok((header, pixels))
}

/// Decodes a headerless image stream: transforms, then the main image.
pub(crate) fn decode_image_stream(
    reader: &mut BitReader<'_>,
    width: usize,
    height: usize,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u32>, CodecError> {
    let mut xsize = width;
    let mut transforms = Vec::new();
    let mut seen = 0u8;

    while reader.read_bit()? {
        let kind = TransformType::from_bits(reader.read_bits(2)?);
        let mask = 1u8 << kind as u8;
        if seen & mask != 0 {
            return Err(BitstreamError::InvalidTransform("transform used twice").into());
        }
        seen |= mask;

        let transform = match kind {
            TransformType::Predictor | TransformType::CrossColor => {
                let bits = reader.read_bits(3)? + 2;
                let sub = decode_entropy_image(
                    reader,
                    subsample_size(xsize, bits),
                    subsample_size(height, bits),
                    false,
                    stop,
                )?;
                if kind == TransformType::Predictor {
                    Transform::Predictor { bits, xsize, modes: sub }
                } else {
                    Transform::CrossColor { bits, xsize, codes: sub }
                }
            }
            TransformType::SubtractGreen => Transform::SubtractGreen,
            TransformType::ColorIndexing => {
                let size = reader.read_bits(8)? as usize + 1;
                let mut palette = decode_entropy_image(reader, size, 1, false, stop)?;
                undelta_palette(&mut palette);
                let bits = color_indexing_bits(size);
                let transform = Transform::ColorIndexing { bits, xsize, palette };
                xsize = subsample_size(xsize, bits);
                transform
            }
        };
        transforms.push(transform);
    }

    let mut data = decode_entropy_image(reader, xsize, height, true, stop)?;

    for transform in transforms.iter().rev() {
        check_stop(stop)?;
        match transform {
            Transform::Predictor { bits, xsize, modes } => {
                inverse_predictor(&mut data, *xsize, height, *bits, modes)
            }
            Transform::CrossColor { bits, xsize, codes } => {
                inverse_cross_color(&mut data, *xsize, height, *bits, codes)
            }
            Transform::SubtractGreen => inverse_subtract_green(&mut data),
            Transform::ColorIndexing { bits, xsize, palette } => {
                data = inverse_color_indexing(&data, *xsize, height, *bits, palette);
            }
        }
    }
    Ok(data)
}

/// Decodes one entropy-coded image. Only the main image may carry meta
/// prefix codes.
fn decode_entropy_image(
    reader: &mut BitReader<'_>,
    xsize: usize,
    ysize: usize,
    is_main: bool,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u32>, CodecError> {
    let cache_bits = if reader.read_bit()? {
        let bits = reader.read_bits(4)?;
        if !(1..=MAX_COLOR_CACHE_BITS).contains(&bits) {
            return Err(BitstreamError::InvalidColorCacheBits(bits).into());
        }
        bits
    } else {
        0
    };

    let meta = if is_main && reader.read_bit()? {
        let bits = reader.read_bits(3)? + 2;
        let tiles_per_row = subsample_size(xsize, bits);
        let tile_rows = subsample_size(ysize, bits);
        let image = decode_entropy_image(reader, tiles_per_row, tile_rows, false, stop)?;
        Some(MetaImage {
            bits,
            tiles_per_row,
            groups: image.into_iter().map(|p| ((p >> 8) & 0xffff) as usize).collect(),
        })
    } else {
        None
    };

    let num_groups = meta
        .as_ref()
        .and_then(|m| m.groups.iter().copied().max())
        .map_or(1, |max| max + 1);
    let mut groups = Vec::with_capacity(num_groups);
    for _ in 0..num_groups {
        groups.push(TreeGroup::read(reader, cache_bits)?);
    }

    decode_pixels(reader, xsize, ysize, cache_bits, &groups, meta.as_ref(), stop)
}

struct MetaImage {
    bits: u32,
    tiles_per_row: usize,
    groups: Vec<usize>,
}

impl MetaImage {
    #[inline]
    fn group_at(&self, pos: usize, xsize: usize) -> usize {
        let (x, y) = (pos % xsize, pos / xsize);
        self.groups[(y >> self.bits) * self.tiles_per_row + (x >> self.bits)]
    }
}

fn decode_pixels(
    reader: &mut BitReader<'_>,
    xsize: usize,
    ysize: usize,
    cache_bits: u32,
    groups: &[TreeGroup],
    meta: Option<&MetaImage>,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u32>, CodecError> {
    let total = xsize * ysize;
    let mut data: Vec<u32> = Vec::with_capacity(total);
    let mut cache = (cache_bits > 0).then(|| ColorCache::new(cache_bits));
    let check_interval = xsize * STOP_CHECK_ROWS;
    let mut next_check = check_interval;

    while data.len() < total {
        let pos = data.len();
        let group = &groups[meta.map_or(0, |m| m.group_at(pos, xsize))];
        let green = u32::from(group.green.read_symbol(reader)?);

        if green < NUM_LITERAL_CODES as u32 {
            let red = u32::from(group.red.read_symbol(reader)?);
            let blue = u32::from(group.blue.read_symbol(reader)?);
            let alpha = u32::from(group.alpha.read_symbol(reader)?);
            let argb = (alpha << 24) | (red << 16) | (green << 8) | blue;
            data.push(argb);
            if let Some(cache) = cache.as_mut() {
                cache.insert(argb);
            }
        } else if green < (NUM_LITERAL_CODES + NUM_LENGTH_CODES) as u32 {
            let len = prefix_decode(green - NUM_LITERAL_CODES as u32, reader)? as usize;
            let dist_symbol = u32::from(group.distance.read_symbol(reader)?);
            let dist_code = prefix_decode(dist_symbol, reader)?;
            let dist = plane_code_to_distance(xsize, dist_code);
            if dist > pos || len > total - pos {
                return Err(BitstreamError::InvalidBackwardReference.into());
            }
            for i in pos..pos + len {
                let argb = data[i - dist];
                data.push(argb);
                if let Some(cache) = cache.as_mut() {
                    cache.insert(argb);
                }
            }
        } else {
            let key = (green - (NUM_LITERAL_CODES + NUM_LENGTH_CODES) as u32) as usize;
            let argb = cache
                .as_ref()
                .and_then(|c| c.lookup(key))
                .ok_or(BitstreamError::InvalidBackwardReference)?;
            data.push(argb);
            if let Some(cache) = cache.as_mut() {
                cache.insert(argb);
            }
        }

        if data.len() >= next_check {
            check_stop(stop)?;
            next_check = data.len() + check_interval;
        }
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitWriter;
    use crate::lossless::{LosslessHeader, write_header};
    use crate::error::Cancel;

    fn header_bytes(width: u32, height: u32) -> BitWriter {
        let mut writer = BitWriter::new();
        write_header(&mut writer, LosslessHeader { width, height, has_alpha: false }).unwrap();
        writer
    }

    /// Simple code with a single symbol `s` (8-bit form).
    fn single_symbol_code(writer: &mut BitWriter, s: u32) {
        writer.write_bit(true);
        writer.write_bits(0, 1);
        writer.write_bit(true);
        writer.write_bits(s, 8);
    }

    #[test]
    fn hand_built_solid_image() {
        let mut w = header_bytes(3, 2);
        w.write_bit(false); // no transform
        w.write_bit(false); // no cache
        w.write_bit(false); // no meta codes
        single_symbol_code(&mut w, 0x20); // green
        single_symbol_code(&mut w, 0x10); // red
        single_symbol_code(&mut w, 0x30); // blue
        single_symbol_code(&mut w, 0xff); // alpha
        single_symbol_code(&mut w, 0); // distance
        let bytes = w.into_bytes();
        let (header, pixels) = decode(&bytes, None).unwrap();
        assert_eq!((header.width, header.height), (3, 2));
        assert_eq!(pixels, [0xff10_2030; 6]);
    }

    #[test]
    fn repeated_transform_is_rejected() {
        let mut w = header_bytes(2, 2);
        w.write_bit(true);
        w.write_bits(TransformType::SubtractGreen as u32, 2);
        w.write_bit(true);
        w.write_bits(TransformType::SubtractGreen as u32, 2);
        let bytes = w.into_bytes();
        assert!(matches!(
            decode(&bytes, None),
            Err(CodecError::Bitstream(BitstreamError::InvalidTransform(_)))
        ));
    }

    #[test]
    fn bad_cache_bits_are_rejected() {
        let mut w = header_bytes(2, 2);
        w.write_bit(false);
        w.write_bit(true);
        w.write_bits(12, 4);
        let bytes = w.into_bytes();
        assert!(matches!(
            decode(&bytes, None),
            Err(CodecError::Bitstream(BitstreamError::InvalidColorCacheBits(12)))
        ));
    }

    #[test]
    fn stop_token_cancels() {
        let mut w = header_bytes(64, 64);
        w.write_bit(false);
        w.write_bit(false);
        w.write_bit(false);
        for s in [0, 0, 0, 0xff, 0] {
            single_symbol_code(&mut w, s);
        }
        let bytes = w.into_bytes();
        assert!(matches!(decode(&bytes, Some(&Cancel)), Err(CodecError::Cancelled)));
    }
}
