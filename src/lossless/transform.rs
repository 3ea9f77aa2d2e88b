//! Lossless image transforms and their inverses.
//!
//! Pixels are packed ARGB (`a << 24 | r << 16 | g << 8 | b`). All channel
//! arithmetic is modulo 256.

use alloc::vec;
use alloc::vec::Vec;

use super::subsample_size;

/// Transform type identifiers as written in the bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransformType {
    Predictor = 0,
    CrossColor = 1,
    SubtractGreen = 2,
    ColorIndexing = 3,
}

impl TransformType {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => TransformType::Predictor,
            1 => TransformType::CrossColor,
            2 => TransformType::SubtractGreen,
            _ => TransformType::ColorIndexing,
        }
    }
}

/// Number of distinct predictor modes.
pub(crate) const NUM_PREDICTORS: u32 = 14;

const BLACK: u32 = 0xff00_0000;

#[inline]
pub(crate) fn add_pixels(a: u32, b: u32) -> u32 {
    let alpha_green = (a & 0xff00_ff00).wrapping_add(b & 0xff00_ff00);
    let red_blue = (a & 0x00ff_00ff).wrapping_add(b & 0x00ff_00ff);
    (alpha_green & 0xff00_ff00) | (red_blue & 0x00ff_00ff)
}

#[inline]
pub(crate) fn sub_pixels(a: u32, b: u32) -> u32 {
    let alpha_green = 0x00ff_00ffu32
        .wrapping_add(a & 0xff00_ff00)
        .wrapping_sub(b & 0xff00_ff00);
    let red_blue = 0xff00_ff00u32
        .wrapping_add(a & 0x00ff_00ff)
        .wrapping_sub(b & 0x00ff_00ff);
    (alpha_green & 0xff00_ff00) | (red_blue & 0x00ff_00ff)
}

#[inline]
fn average2(a: u32, b: u32) -> u32 {
    (((a ^ b) & 0xfefe_fefe) >> 1) + (a & b)
}

#[inline]
fn channel(p: u32, shift: u32) -> i32 {
    ((p >> shift) & 0xff) as i32
}

#[inline]
fn select(top: u32, left: u32, top_left: u32) -> u32 {
    let mut pa_minus_pb = 0;
    for shift in [24, 16, 8, 0] {
        let t = channel(top, shift);
        let l = channel(left, shift);
        let tl = channel(top_left, shift);
        pa_minus_pb += (l - tl).abs() - (t - tl).abs();
    }
    if pa_minus_pb <= 0 { top } else { left }
}

#[inline]
fn clamp_add_subtract_full(a: u32, b: u32, c: u32) -> u32 {
    let mut out = 0;
    for shift in [24, 16, 8, 0] {
        let v = (channel(a, shift) + channel(b, shift) - channel(c, shift)).clamp(0, 255);
        out |= (v as u32) << shift;
    }
    out
}

#[inline]
fn clamp_add_subtract_half(a: u32, b: u32) -> u32 {
    let mut out = 0;
    for shift in [24, 16, 8, 0] {
        let ca = channel(a, shift);
        let v = (ca + (ca - channel(b, shift)) / 2).clamp(0, 255);
        out |= (v as u32) << shift;
    }
    out
}

/// Prediction for `data[pos]` with `mode`, for pixels not on the top row or left column.
#[inline]
fn predict(mode: u32, data: &[u32], pos: usize, width: usize) -> u32 {
    let left = data[pos - 1];
    let top = data[pos - width];
    let top_left = data[pos - width - 1];
    let top_right = data[pos - width + 1];
    match mode {
        1 => left,
        2 => top,
        3 => top_right,
        4 => top_left,
        5 => average2(average2(left, top_right), top),
        6 => average2(left, top_left),
        7 => average2(left, top),
        8 => average2(top_left, top),
        9 => average2(top, top_right),
        10 => average2(average2(left, top_left), average2(top, top_right)),
        11 => select(top, left, top_left),
        12 => clamp_add_subtract_full(left, top, top_left),
        13 => clamp_add_subtract_half(average2(left, top), top_left),
        _ => BLACK,
    }
}

/// Prediction honouring the edge rules: black at the origin, left on the
/// top row, top on the left column, the tile's mode elsewhere.
#[inline]
fn predict_at(data: &[u32], x: usize, y: usize, width: usize, mode: u32) -> u32 {
    let pos = y * width + x;
    match (x, y) {
        (0, 0) => BLACK,
        (_, 0) => data[pos - 1],
        (0, _) => data[pos - width],
        _ => predict(mode, data, pos, width),
    }
}

#[inline]
fn tile_mode(modes: &[u32], bits: u32, tiles_per_row: usize, x: usize, y: usize) -> u32 {
    (modes[(y >> bits) * tiles_per_row + (x >> bits)] >> 8) & 0xf
}

/// Undoes the predictor transform in place.
pub(crate) fn inverse_predictor(
    data: &mut [u32],
    width: usize,
    height: usize,
    bits: u32,
    modes: &[u32],
) {
    let tiles_per_row = subsample_size(width, bits);
    for y in 0..height {
        for x in 0..width {
            let mode = if x > 0 && y > 0 { tile_mode(modes, bits, tiles_per_row, x, y) } else { 0 };
            let prediction = predict_at(data, x, y, width, mode);
            let pos = y * width + x;
            data[pos] = add_pixels(data[pos], prediction);
        }
    }
}

/// Residuals of `data` under the per-tile `modes`.
pub(crate) fn forward_predictor(
    data: &[u32],
    width: usize,
    height: usize,
    bits: u32,
    modes: &[u32],
) -> Vec<u32> {
    let tiles_per_row = subsample_size(width, bits);
    let mut residuals = vec![0u32; data.len()];
    for y in 0..height {
        for x in 0..width {
            let mode = if x > 0 && y > 0 { tile_mode(modes, bits, tiles_per_row, x, y) } else { 0 };
            let pos = y * width + x;
            residuals[pos] = sub_pixels(data[pos], predict_at(data, x, y, width, mode));
        }
    }
    residuals
}

#[inline]
fn residual_cost(residual: u32) -> u32 {
    [24, 16, 8, 0]
        .iter()
        .map(|&s| u32::from(((residual >> s) as u8 as i8).unsigned_abs()))
        .sum()
}

/// Picks a predictor mode per tile, returned as sub-image pixels (`mode << 8`).
pub(crate) fn choose_predictors(
    data: &[u32],
    width: usize,
    height: usize,
    bits: u32,
    effort: u8,
) -> Vec<u32> {
    const FAST_MODES: [u32; 4] = [1, 2, 11, 12];
    let all_modes: Vec<u32> = (0..NUM_PREDICTORS).collect();
    let candidates: &[u32] = if effort < 3 { &FAST_MODES } else { &all_modes };

    let tiles_x = subsample_size(width, bits);
    let tiles_y = subsample_size(height, bits);
    let tile = 1usize << bits;
    let mut modes = Vec::with_capacity(tiles_x * tiles_y);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let (x0, y0) = (tx * tile, ty * tile);
            let (x1, y1) = ((x0 + tile).min(width), (y0 + tile).min(height));
            let mut best = (u64::MAX, 1u32);
            for &mode in candidates {
                let mut cost = 0u64;
                for y in y0.max(1)..y1 {
                    for x in x0.max(1)..x1 {
                        let pos = y * width + x;
                        let residual = sub_pixels(data[pos], predict(mode, data, pos, width));
                        cost += u64::from(residual_cost(residual));
                    }
                }
                if cost < best.0 {
                    best = (cost, mode);
                }
            }
            modes.push(BLACK | (best.1 << 8));
        }
    }
    modes
}

/// Multipliers of the cross-color transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ColorMultipliers {
    pub green_to_red: i8,
    pub green_to_blue: i8,
    pub red_to_blue: i8,
}

impl ColorMultipliers {
    pub fn from_code(code: u32) -> Self {
        Self {
            green_to_red: code as u8 as i8,
            green_to_blue: (code >> 8) as u8 as i8,
            red_to_blue: (code >> 16) as u8 as i8,
        }
    }

    pub fn to_code(self) -> u32 {
        BLACK
            | (u32::from(self.red_to_blue as u8) << 16)
            | (u32::from(self.green_to_blue as u8) << 8)
            | u32::from(self.green_to_red as u8)
    }
}

#[inline]
fn color_delta(multiplier: i8, color: u8) -> i32 {
    (i32::from(multiplier) * i32::from(color as i8)) >> 5
}

#[inline]
fn apply_cross_color(p: u32, m: ColorMultipliers, forward: bool) -> u32 {
    let green = (p >> 8) as u8;
    let red = (p >> 16) as u8;
    let blue = p as u8;
    let (new_red, new_blue) = if forward {
        let r = i32::from(red) - color_delta(m.green_to_red, green);
        let b = i32::from(blue)
            - color_delta(m.green_to_blue, green)
            - color_delta(m.red_to_blue, red);
        (r as u8, b as u8)
    } else {
        let r = (i32::from(red) + color_delta(m.green_to_red, green)) as u8;
        let b = i32::from(blue)
            + color_delta(m.green_to_blue, green)
            + color_delta(m.red_to_blue, r);
        (r, b as u8)
    };
    (p & 0xff00_ff00) | (u32::from(new_red) << 16) | u32::from(new_blue)
}

fn for_each_tile_pixel(
    data: &mut [u32],
    width: usize,
    height: usize,
    bits: u32,
    codes: &[u32],
    forward: bool,
) {
    let tiles_per_row = subsample_size(width, bits);
    for y in 0..height {
        for x in 0..width {
            let m = ColorMultipliers::from_code(codes[(y >> bits) * tiles_per_row + (x >> bits)]);
            let pos = y * width + x;
            data[pos] = apply_cross_color(data[pos], m, forward);
        }
    }
}

pub(crate) fn inverse_cross_color(
    data: &mut [u32],
    width: usize,
    height: usize,
    bits: u32,
    codes: &[u32],
) {
    for_each_tile_pixel(data, width, height, bits, codes, false);
}

pub(crate) fn forward_cross_color(
    data: &mut [u32],
    width: usize,
    height: usize,
    bits: u32,
    codes: &[u32],
) {
    for_each_tile_pixel(data, width, height, bits, codes, true);
}

/// Searches cross-color multipliers per tile, returned as sub-image pixels.
pub(crate) fn choose_cross_color(
    data: &[u32],
    width: usize,
    height: usize,
    bits: u32,
    effort: u8,
) -> Vec<u32> {
    let step: usize = if effort >= 8 { 1 } else { 4 };
    let candidates: Vec<i8> = (-64i32..=64).step_by(step).map(|v| v as i8).collect();

    let tiles_x = subsample_size(width, bits);
    let tiles_y = subsample_size(height, bits);
    let tile = 1usize << bits;
    let mut codes = Vec::with_capacity(tiles_x * tiles_y);
    let mut tile_pixels = Vec::with_capacity(tile * tile);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            tile_pixels.clear();
            let (x0, y0) = (tx * tile, ty * tile);
            for y in y0..(y0 + tile).min(height) {
                let row = y * width;
                tile_pixels.extend_from_slice(&data[row + x0..row + (x0 + tile).min(width)]);
            }

            let cost = |f: &dyn Fn(u32) -> u8| -> u64 {
                tile_pixels.iter().map(|&p| u64::from((f(p) as i8).unsigned_abs())).sum()
            };
            let best = |eval: &dyn Fn(i8) -> u64| -> i8 {
                let mut best = (eval(0), 0i8);
                for &c in &candidates {
                    let e = eval(c);
                    if e < best.0 {
                        best = (e, c);
                    }
                }
                best.1
            };

            let green_to_red = best(&|m| {
                cost(&|p| ((p >> 16) as u8 as i32 - color_delta(m, (p >> 8) as u8)) as u8)
            });
            let green_to_blue = best(&|m| {
                cost(&|p| (p as u8 as i32 - color_delta(m, (p >> 8) as u8)) as u8)
            });
            let red_to_blue = best(&|m| {
                cost(&|p| {
                    (p as u8 as i32
                        - color_delta(green_to_blue, (p >> 8) as u8)
                        - color_delta(m, (p >> 16) as u8)) as u8
                })
            });
            codes.push(
                ColorMultipliers {
                    green_to_red,
                    green_to_blue,
                    red_to_blue,
                }
                .to_code(),
            );
        }
    }
    codes
}

pub(crate) fn forward_subtract_green(data: &mut [u32]) {
    for p in data {
        let green = (*p >> 8) & 0xff;
        let red_blue = (*p & 0x00ff_00ff)
            .wrapping_add(0x0100_0100)
            .wrapping_sub((green << 16) | green);
        *p = (*p & 0xff00_ff00) | (red_blue & 0x00ff_00ff);
    }
}

pub(crate) fn inverse_subtract_green(data: &mut [u32]) {
    for p in data {
        let green = (*p >> 8) & 0xff;
        let red_blue = (*p & 0x00ff_00ff).wrapping_add((green << 16) | green);
        *p = (*p & 0xff00_ff00) | (red_blue & 0x00ff_00ff);
    }
}

/// Pixels per packed pixel exponent for a palette of `size` colors.
pub(crate) fn color_indexing_bits(size: usize) -> u32 {
    match size {
        0..=2 => 3,
        3..=4 => 2,
        5..=16 => 1,
        _ => 0,
    }
}

/// Collects the sorted palette when the image has at most `max` colors.
pub(crate) fn find_palette(data: &[u32], max: usize) -> Option<Vec<u32>> {
    let mut palette: Vec<u32> = Vec::with_capacity(max + 1);
    let mut last = None;
    for &p in data {
        if last == Some(p) {
            continue;
        }
        last = Some(p);
        if let Err(i) = palette.binary_search(&p) {
            if palette.len() == max {
                return None;
            }
            palette.insert(i, p);
        }
    }
    Some(palette)
}

/// Replaces pixels by palette indices and bundles them; returns the packed
/// image and its width.
pub(crate) fn bundle_indices(
    data: &[u32],
    width: usize,
    height: usize,
    palette: &[u32],
) -> (Vec<u32>, usize) {
    let bits = color_indexing_bits(palette.len());
    let packed_width = subsample_size(width, bits);
    let bits_per_index = 8 >> bits;
    let mask = (1usize << bits) - 1;
    let mut packed = vec![0u32; packed_width * height];
    for y in 0..height {
        for x in 0..width {
            let p = data[y * width + x];
            let index = palette.binary_search(&p).unwrap_or(0) as u32;
            let slot = &mut packed[y * packed_width + (x >> bits)];
            *slot |= index << (8 + (x & mask) as u32 * bits_per_index);
        }
    }
    for p in &mut packed {
        *p |= BLACK;
    }
    (packed, packed_width)
}

/// Expands bundled palette indices back to ARGB.
pub(crate) fn inverse_color_indexing(
    packed: &[u32],
    width: usize,
    height: usize,
    bits: u32,
    palette: &[u32],
) -> Vec<u32> {
    let packed_width = subsample_size(width, bits);
    let bits_per_index = 8 >> bits;
    let index_mask = (1u32 << bits_per_index) - 1;
    let mask = (1usize << bits) - 1;
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let byte = (packed[y * packed_width + (x >> bits)] >> 8) & 0xff;
            let index = (byte >> ((x & mask) as u32 * bits_per_index)) & index_mask;
            out.push(palette.get(index as usize).copied().unwrap_or(0));
        }
    }
    out
}

/// Delta-codes a palette for transmission.
pub(crate) fn delta_palette(palette: &[u32]) -> Vec<u32> {
    let mut out = Vec::with_capacity(palette.len());
    let mut prev = 0;
    for &p in palette {
        out.push(sub_pixels(p, prev));
        prev = p;
    }
    out
}

/// Undoes [`delta_palette`] in place.
pub(crate) fn undelta_palette(palette: &mut [u32]) {
    for i in 1..palette.len() {
        palette[i] = add_pixels(palette[i], palette[i - 1]);
    }
}
