use alloc::vec;
use alloc::vec::Vec;

use super::backward_refs::{Token, apply_color_cache, compute_references};
use super::histogram::{Histogram, cluster};
use super::prefix::{DistanceCoder, prefix_encode, write_prefix_extra};
use super::transform::{
    TransformType, bundle_indices, choose_cross_color, choose_predictors, delta_palette,
    find_palette, forward_cross_color, forward_predictor, forward_subtract_green,
};
use super::{LosslessHeader, subsample_size, write_header};
use crate::Stop;
use crate::bitstream::BitWriter;
use crate::config::LosslessConfig;
use crate::entropy::{HuffmanCode, write_code};
use crate::error::{BitstreamError, CodecError, check_stop};
use crate::format::{MAX_COLOR_CACHE_BITS, MAX_IMAGE_DIMENSION, NUM_LENGTH_CODES, NUM_LITERAL_CODES};

const CROSS_COLOR_BITS: u32 = 5;
const TOKENS_PER_STOP_CHECK: usize = 1 << 14;

fn predictor_bits(effort: u8) -> u32 {
    match effort {
        8.. => 3,
        4..=7 => 4,
        _ => 5,
    }
}

/// Tile size for meta prefix codes: small enough to adapt, capped so the
/// entropy image stays cheap.
fn histogram_bits(xsize: usize, ysize: usize, effort: u8) -> u32 {
    let mut bits = if effort >= 9 { 4 } else { 5 };
    while bits < 9 && subsample_size(xsize, bits) * subsample_size(ysize, bits) > 2048 {
        bits += 1;
    }
    bits
}

fn max_groups(effort: u8) -> usize {
    if effort >= 9 { 32 } else { 16 }
}

#[derive(Debug, Clone, Copy)]
struct StreamOptions {
    effort: u8,
    is_main: bool,
    cache_bits: Option<u32>,
}

/// Encodes `argb` as a complete lossless frame bitstream.
pub(crate) fn encode(
    argb: &[u32],
    width: u32,
    height: u32,
    config: &LosslessConfig,
    stop: Option<&dyn Stop>,
) -> Result<Vec<u8>, CodecError> {
    if width == 0 || height == 0 || width > MAX_IMAGE_DIMENSION || height > MAX_IMAGE_DIMENSION {
        return Err(BitstreamError::InvalidDimensions { width, height }.into());
    }
    if argb.len() != width as usize * height as usize {
        return Err(CodecError::InvalidInput("pixel count does not match dimensions".into()));
    }
    let has_alpha = argb.iter().any(|&p| p >> 24 != 0xff);
    let mut writer = BitWriter::with_capacity(argb.len());
    write_header(&mut writer, LosslessHeader { width, height, has_alpha })?;
    encode_image_stream(&mut writer, argb, width as usize, height as usize, config, stop)?;
    Ok(writer.into_bytes())
}

/// Writes a headerless image stream: transforms, then the main image.
pub(crate) fn encode_image_stream(
    writer: &mut BitWriter,
    argb: &[u32],
    width: usize,
    height: usize,
    config: &LosslessConfig,
    stop: Option<&dyn Stop>,
) -> Result<(), CodecError> {
    let effort = config.effort.min(10);
    let mut image: Vec<u32> = if config.exact {
        argb.to_vec()
    } else {
        argb.iter().map(|&p| if p >> 24 == 0 { 0 } else { p }).collect()
    };
    let mut xsize = width;
    let sub_options = StreamOptions {
        effort,
        is_main: false,
        cache_bits: None,
    };

    if let Some(palette) = find_palette(&image, 256) {
        writer.write_bit(true);
        writer.write_bits(TransformType::ColorIndexing as u32, 2);
        writer.write_bits(palette.len() as u32 - 1, 8);
        write_entropy_image(writer, &delta_palette(&palette), palette.len(), 1, sub_options, stop)?;
        let (packed, packed_width) = bundle_indices(&image, width, height, &palette);
        image = packed;
        xsize = packed_width;
    } else if effort > 0 {
        writer.write_bit(true);
        writer.write_bits(TransformType::SubtractGreen as u32, 2);
        forward_subtract_green(&mut image);
        check_stop(stop)?;

        let bits = predictor_bits(effort);
        let modes = choose_predictors(&image, width, height, bits, effort);
        writer.write_bit(true);
        writer.write_bits(TransformType::Predictor as u32, 2);
        writer.write_bits(bits - 2, 3);
        let (tiles_x, tiles_y) = (subsample_size(width, bits), subsample_size(height, bits));
        write_entropy_image(writer, &modes, tiles_x, tiles_y, sub_options, stop)?;
        image = forward_predictor(&image, width, height, bits, &modes);
        check_stop(stop)?;

        if effort >= 5 {
            let bits = CROSS_COLOR_BITS;
            let codes = choose_cross_color(&image, width, height, bits, effort);
            writer.write_bit(true);
            writer.write_bits(TransformType::CrossColor as u32, 2);
            writer.write_bits(bits - 2, 3);
            let (tiles_x, tiles_y) = (subsample_size(width, bits), subsample_size(height, bits));
            write_entropy_image(writer, &codes, tiles_x, tiles_y, sub_options, stop)?;
            forward_cross_color(&mut image, width, height, bits, &codes);
            check_stop(stop)?;
        }
    }
    writer.write_bit(false);

    let main_options = StreamOptions {
        effort,
        is_main: true,
        cache_bits: config.cache_bits.map(|b| u32::from(b).min(MAX_COLOR_CACHE_BITS)),
    };
    write_entropy_image(writer, &image, xsize, height, main_options, stop)
}

/// Histogram of a token stream with copy distances already turned into
/// plane codes.
fn token_histogram(tokens: &[Token], cache_bits: u32) -> Histogram {
    let mut histogram = Histogram::new(cache_bits);
    for &token in tokens {
        histogram.add(token);
    }
    histogram
}

fn choose_cache_bits(
    refs: &[Token],
    data: &[u32],
    coder: &DistanceCoder,
    options: StreamOptions,
) -> u32 {
    if let Some(bits) = options.cache_bits {
        return bits;
    }
    let candidates: &[u32] = match options.effort {
        0..=1 => return 0,
        2..=5 => &[0, 6, 10],
        _ => &[0, 3, 5, 7, 8, 9, 10],
    };
    let mut best = (u64::MAX, 0);
    for &bits in candidates {
        let tokens = to_plane_codes(apply_color_cache(refs, data, bits), coder);
        let cost = token_histogram(&tokens, bits).cost();
        if cost < best.0 {
            best = (cost, bits);
        }
    }
    best.1
}

fn to_plane_codes(tokens: Vec<Token>, coder: &DistanceCoder) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| match token {
            Token::Copy { len, dist } => Token::Copy {
                len,
                dist: coder.code(dist as usize),
            },
            other => other,
        })
        .collect()
}

/// Group assignment of every pixel tile of the main image.
struct EntropyImage {
    bits: u32,
    tiles_per_row: usize,
    groups: Vec<u32>,
}

impl EntropyImage {
    #[inline]
    fn group_at(&self, pos: usize, xsize: usize) -> usize {
        let (x, y) = (pos % xsize, pos / xsize);
        self.groups[(y >> self.bits) * self.tiles_per_row + (x >> self.bits)] as usize
    }
}

fn write_entropy_image(
    writer: &mut BitWriter,
    data: &[u32],
    xsize: usize,
    ysize: usize,
    options: StreamOptions,
    stop: Option<&dyn Stop>,
) -> Result<(), CodecError> {
    let coder = DistanceCoder::new(xsize);
    let refs = compute_references(data, xsize, options.effort);
    check_stop(stop)?;
    let cache_bits = choose_cache_bits(&refs, data, &coder, options);
    let tokens = to_plane_codes(apply_color_cache(&refs, data, cache_bits), &coder);
    drop(refs);

    if cache_bits > 0 {
        writer.write_bit(true);
        writer.write_bits(cache_bits, 4);
    } else {
        writer.write_bit(false);
    }

    let mut entropy_image = None;
    let histograms = if options.is_main && options.effort >= 7 {
        let bits = histogram_bits(xsize, ysize, options.effort);
        let tiles_per_row = subsample_size(xsize, bits);
        let tile_rows = subsample_size(ysize, bits);
        let mut tiles = vec![Histogram::new(cache_bits); tiles_per_row * tile_rows];
        let mut pos = 0;
        for &token in &tokens {
            let (x, y) = (pos % xsize, pos / xsize);
            tiles[(y >> bits) * tiles_per_row + (x >> bits)].add(token);
            pos += token.pixel_count();
        }
        let (groups, assignment) = cluster(&tiles, max_groups(options.effort));
        check_stop(stop)?;
        if groups.len() > 1 {
            writer.write_bit(true);
            writer.write_bits(bits - 2, 3);
            let pixels: Vec<u32> = assignment.iter().map(|&g| g << 8).collect();
            let sub_options = StreamOptions {
                is_main: false,
                cache_bits: None,
                ..options
            };
            write_entropy_image(writer, &pixels, tiles_per_row, tile_rows, sub_options, stop)?;
            entropy_image = Some(EntropyImage {
                bits,
                tiles_per_row,
                groups: assignment,
            });
            groups
        } else {
            writer.write_bit(false);
            vec![token_histogram(&tokens, cache_bits)]
        }
    } else {
        if options.is_main {
            writer.write_bit(false);
        }
        vec![token_histogram(&tokens, cache_bits)]
    };

    let codes: Vec<[HuffmanCode; 5]> = histograms
        .iter()
        .map(|histogram| {
            histogram.code_lengths().map(|lengths| {
                write_code(writer, &lengths);
                HuffmanCode::from_lengths(lengths)
            })
        })
        .collect();

    let mut pos = 0;
    for (i, &token) in tokens.iter().enumerate() {
        let group = entropy_image.as_ref().map_or(0, |e| e.group_at(pos, xsize));
        let [green, red, blue, alpha, distance] = &codes[group];
        match token {
            Token::Literal(argb) => {
                green.write_symbol(writer, ((argb >> 8) & 0xff) as usize);
                red.write_symbol(writer, ((argb >> 16) & 0xff) as usize);
                blue.write_symbol(writer, (argb & 0xff) as usize);
                alpha.write_symbol(writer, (argb >> 24) as usize);
            }
            Token::CacheIndex(key) => {
                green.write_symbol(writer, NUM_LITERAL_CODES + NUM_LENGTH_CODES + key as usize);
            }
            Token::Copy { len, dist } => {
                let len_code = prefix_encode(len);
                green.write_symbol(writer, NUM_LITERAL_CODES + len_code.symbol as usize);
                write_prefix_extra(writer, len_code);
                let dist_code = prefix_encode(dist);
                distance.write_symbol(writer, dist_code.symbol as usize);
                write_prefix_extra(writer, dist_code);
            }
        }
        pos += token.pixel_count();
        if i % TOKENS_PER_STOP_CHECK == TOKENS_PER_STOP_CHECK - 1 {
            check_stop(stop)?;
        }
    }
    Ok(())
}
