use alloc::vec;
use alloc::vec::Vec;

use imgref::ImgRef;
use rgb::Rgba;

use super::color::{Plane, to_planes};
use super::quant::{ZIGZAG, category, quant_table, quantize, value_bits};
use super::{AC_ALPHABET, DC_ALPHABET, EOB, LossyHeader, ZRL, dct, write_header};
use crate::Stop;
use crate::bitstream::BitWriter;
use crate::config::LossyConfig;
use crate::entropy::{HuffmanCode, build_code_lengths, write_code};
use crate::error::{CodecError, check_stop};
use crate::format::MAX_CODE_LENGTH;

/// Quantised coefficients of one block, natural order.
type Block = [i32; 64];

#[derive(Clone, Copy)]
enum Class {
    Dc,
    Ac,
}

/// Walks the symbols of a plane: `(class, symbol, extra value, extra length)`.
fn for_each_symbol(blocks: &[Block], mut emit: impl FnMut(Class, usize, u32, u32)) {
    let mut prev_dc = 0;
    for block in blocks {
        let diff = block[0] - prev_dc;
        prev_dc = block[0];
        let cat = category(diff);
        emit(Class::Dc, cat as usize, value_bits(diff, cat), cat);

        let mut run = 0;
        for &natural in &ZIGZAG[1..] {
            let ac = block[natural];
            if ac == 0 {
                run += 1;
                continue;
            }
            while run >= 16 {
                emit(Class::Ac, ZRL, 0, 0);
                run -= 16;
            }
            let size = category(ac);
            emit(Class::Ac, (run << 4) | size as usize, value_bits(ac, size), size);
            run = 0;
        }
        if run > 0 {
            emit(Class::Ac, EOB, 0, 0);
        }
    }
}

fn quantize_plane(
    plane: &Plane,
    table: &[u16; 64],
    stop: Option<&dyn Stop>,
) -> Result<Vec<Block>, CodecError> {
    let mut blocks = Vec::with_capacity(plane.blocks_x() * plane.blocks_y());
    for by in 0..plane.blocks_y() {
        check_stop(stop)?;
        for bx in 0..plane.blocks_x() {
            let mut samples = [0i32; 64];
            for (i, s) in samples.iter_mut().enumerate() {
                *s = i32::from(plane.at(bx * 8 + i % 8, by * 8 + i / 8)) - 128;
            }
            let coefficients = dct::forward(&samples);
            let mut block = [0i32; 64];
            for i in 0..64 {
                block[i] = quantize(coefficients[i], table[i]);
            }
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Encodes the RGB channels of `image`; alpha travels separately.
pub(crate) fn encode(
    image: ImgRef<'_, Rgba<u8>>,
    config: &LossyConfig,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u8>, CodecError> {
    let (width, height) = (image.width(), image.height());
    let quality = config.quality_percent();
    let header = write_header(&LossyHeader {
        width: u32::try_from(width).unwrap_or(u32::MAX),
        height: u32::try_from(height).unwrap_or(u32::MAX),
        subsampling: config.subsampling,
        quality,
    })?;

    let tables = [quant_table(quality, false), quant_table(quality, true)];
    let planes = to_planes(image, config.subsampling);
    let mut coded: Vec<Vec<Block>> = Vec::with_capacity(3);
    for (i, plane) in planes.iter().enumerate() {
        coded.push(quantize_plane(plane, &tables[usize::from(i > 0)], stop)?);
    }
    drop(planes);

    // Index 0 is luma, 1 is chroma.
    let mut dc_hist = [vec![0u32; DC_ALPHABET], vec![0u32; DC_ALPHABET]];
    let mut ac_hist = [vec![0u32; AC_ALPHABET], vec![0u32; AC_ALPHABET]];
    for (i, blocks) in coded.iter().enumerate() {
        let c = usize::from(i > 0);
        for_each_symbol(blocks, |class, symbol, _, _| match class {
            Class::Dc => dc_hist[c][symbol] += 1,
            Class::Ac => ac_hist[c][symbol] += 1,
        });
    }

    let mut writer = BitWriter::with_capacity(width * height / 2);
    for table in &tables {
        for &natural in &ZIGZAG {
            writer.write_bits(u32::from(table[natural]), 8);
        }
    }
    let mut write_histogram = |histogram: &[u32]| {
        let lengths = build_code_lengths(histogram, MAX_CODE_LENGTH);
        write_code(&mut writer, &lengths);
        HuffmanCode::from_lengths(lengths)
    };
    let luma_dc = write_histogram(&dc_hist[0]);
    let luma_ac = write_histogram(&ac_hist[0]);
    let chroma_dc = write_histogram(&dc_hist[1]);
    let chroma_ac = write_histogram(&ac_hist[1]);

    for (i, blocks) in coded.iter().enumerate() {
        check_stop(stop)?;
        let (dc, ac) = if i == 0 { (&luma_dc, &luma_ac) } else { (&chroma_dc, &chroma_ac) };
        for_each_symbol(blocks, |class, symbol, value, len| {
            let code = match class {
                Class::Dc => dc,
                Class::Ac => ac,
            };
            code.write_symbol(&mut writer, symbol);
            writer.write_bits(value, len);
        });
    }

    let body = writer.into_bytes();
    let mut out = Vec::with_capacity(header.len() + body.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref::Img;

    #[test]
    fn flat_image_codes_single_symbols() {
        let img = Img::new(vec![Rgba::new(128u8, 128, 128, 255); 64], 8, 8);
        let encoded = encode(img.as_ref(), &LossyConfig::new(), None).unwrap();
        // Header, two tables and tiny codes; the planes themselves cost nothing.
        assert!(encoded.len() < 7 + 128 + 16, "{}", encoded.len());
    }

    #[test]
    fn symbol_walk_emits_zrl_and_eob() {
        let mut block = [0i32; 64];
        block[0] = 5;
        block[ZIGZAG[20]] = -3;
        let mut symbols = Vec::new();
        for_each_symbol(&[block], |class, symbol, _, _| {
            symbols.push((matches!(class, Class::Dc), symbol))
        });
        assert_eq!(symbols, [(true, 3), (false, ZRL), (false, (3 << 4) | 2), (false, EOB)]);
    }

    #[test]
    fn lower_quality_is_smaller() {
        let pixels: Vec<Rgba<u8>> = (0..64 * 64u32)
            .map(|i| Rgba::new((i % 64 * 4) as u8, (i / 64 * 4) as u8, (i * 13 % 251) as u8, 255))
            .collect();
        let img = Img::new(pixels, 64, 64);
        let small = encode(img.as_ref(), &LossyConfig::new().with_quality(30.0), None).unwrap();
        let large = encode(img.as_ref(), &LossyConfig::new().with_quality(95.0), None).unwrap();
        assert!(small.len() < large.len());
    }
}
