use alloc::vec::Vec;

use imgref::ImgVec;
use rgb::Rgba;

use super::color::{Plane, chroma_size, from_planes};
use super::quant::{MAX_QUANTIZED, ZIGZAG, extend};
use super::{AC_ALPHABET, DC_ALPHABET, EOB, LossyHeader, ZRL, dct, read_header};
use crate::Stop;
use crate::bitstream::BitReader;
use crate::config::Upsampling;
use crate::entropy::{HuffmanTree, read_code};
use crate::error::{BitstreamError, CodecError, check_stop};
use crate::format::LOSSY_HEADER_SIZE;

fn read_table(reader: &mut BitReader<'_>) -> Result<[u16; 64], BitstreamError> {
    let mut table = [0u16; 64];
    for &natural in &ZIGZAG {
        let q = reader.read_bits(8)? as u16;
        if q == 0 {
            return Err(BitstreamError::InvalidHeader("zero quantizer"));
        }
        table[natural] = q;
    }
    Ok(table)
}

/// Reads one block's quantised coefficients into natural order.
fn read_block(
    reader: &mut BitReader<'_>,
    dc: &HuffmanTree,
    ac: &HuffmanTree,
    prev_dc: &mut i32,
) -> Result<[i32; 64], BitstreamError> {
    let mut block = [0i32; 64];
    let cat = u32::from(dc.read_symbol(reader)?);
    let diff = extend(reader.read_bits(cat)?, cat);
    *prev_dc = (*prev_dc + diff).clamp(-MAX_QUANTIZED, MAX_QUANTIZED);
    block[0] = *prev_dc;

    let mut k = 1;
    while k < 64 {
        let rs = usize::from(ac.read_symbol(reader)?);
        let (run, size) = (rs >> 4, (rs & 0xf) as u32);
        if size == 0 {
            match rs {
                EOB => break,
                ZRL => {
                    k += 16;
                    continue;
                }
                _ => return Err(BitstreamError::InvalidCoefficients),
            }
        }
        k += run;
        if k >= 64 {
            return Err(BitstreamError::InvalidCoefficients);
        }
        block[ZIGZAG[k]] = extend(reader.read_bits(size)?, size);
        k += 1;
    }
    Ok(block)
}

fn decode_plane(
    reader: &mut BitReader<'_>,
    plane: &mut Plane,
    table: &[u16; 64],
    dc: &HuffmanTree,
    ac: &HuffmanTree,
    stop: Option<&dyn Stop>,
) -> Result<(), CodecError> {
    let mut prev_dc = 0;
    for by in 0..plane.blocks_y() {
        check_stop(stop)?;
        for bx in 0..plane.blocks_x() {
            let quantized = read_block(reader, dc, ac, &mut prev_dc)?;
            let mut coefficients = [0i32; 64];
            for i in 0..64 {
                coefficients[i] = quantized[i] * i32::from(table[i]);
            }
            let samples = dct::inverse(&coefficients);
            for (i, &s) in samples.iter().enumerate() {
                let (x, y) = (bx * 8 + i % 8, by * 8 + i / 8);
                if x < plane.width && y < plane.height {
                    plane.data[y * plane.width + x] = (s + 128).clamp(0, 255) as u8;
                }
            }
        }
    }
    Ok(())
}

/// Decodes a `ZDCT` payload to opaque RGBA.
pub(crate) fn decode(
    data: &[u8],
    upsampling: Upsampling,
    stop: Option<&dyn Stop>,
) -> Result<(LossyHeader, ImgVec<Rgba<u8>>), CodecError> {
    let header = read_header(data)?;
    let mut reader = BitReader::new(&data[LOSSY_HEADER_SIZE..]);
    let luma_table = read_table(&mut reader)?;
    let chroma_table = read_table(&mut reader)?;
    let luma_dc = read_code(&mut reader, DC_ALPHABET)?;
    let luma_ac = read_code(&mut reader, AC_ALPHABET)?;
    let chroma_dc = read_code(&mut reader, DC_ALPHABET)?;
    let chroma_ac = read_code(&mut reader, AC_ALPHABET)?;

    let (width, height) = (header.width as usize, header.height as usize);
    let (cw, ch) = chroma_size(width, height, header.subsampling);
    let mut planes = [Plane::new(width, height), Plane::new(cw, ch), Plane::new(cw, ch)];
    for (i, plane) in planes.iter_mut().enumerate() {
        if i == 0 {
            decode_plane(&mut reader, plane, &luma_table, &luma_dc, &luma_ac, stop)?;
        } else {
            decode_plane(&mut reader, plane, &chroma_table, &chroma_dc, &chroma_ac, stop)?;
        }
    }

    let pixels: Vec<Rgba<u8>> = from_planes(&planes, width, height, header.subsampling, upsampling);
    Ok((header, ImgVec::new(pixels, width, height)))
}
