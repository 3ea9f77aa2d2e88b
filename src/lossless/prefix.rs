//! Length/distance prefix coding, the 2-D distance map and the color cache.

use alloc::vec;
use alloc::vec::Vec;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::BitstreamError;

/// Short distances expressed as (dx, dy) offsets, indexed by plane code − 1.
const DISTANCE_MAP: [(i8, i8); 120] = [
    (0, 1), (1, 0), (1, 1), (-1, 1), (0, 2), (2, 0), (1, 2),
    (-1, 2), (2, 1), (-2, 1), (2, 2), (-2, 2), (0, 3), (3, 0),
    (1, 3), (-1, 3), (3, 1), (-3, 1), (2, 3), (-2, 3), (3, 2),
    (-3, 2), (0, 4), (4, 0), (1, 4), (-1, 4), (4, 1), (-4, 1),
    (3, 3), (-3, 3), (2, 4), (-2, 4), (4, 2), (-4, 2), (0, 5),
    (3, 4), (-3, 4), (4, 3), (-4, 3), (5, 0), (1, 5), (-1, 5),
    (5, 1), (-5, 1), (2, 5), (-2, 5), (5, 2), (-5, 2), (4, 4),
    (-4, 4), (3, 5), (-3, 5), (5, 3), (-5, 3), (0, 6), (6, 0),
    (1, 6), (-1, 6), (6, 1), (-6, 1), (2, 6), (-2, 6), (6, 2),
    (-6, 2), (4, 5), (-4, 5), (5, 4), (-5, 4), (3, 6), (-3, 6),
    (6, 3), (-6, 3), (0, 7), (7, 0), (1, 7), (-1, 7), (5, 5),
    (-5, 5), (7, 1), (-7, 1), (4, 6), (-4, 6), (6, 4), (-6, 4),
    (2, 7), (-2, 7), (7, 2), (-7, 2), (3, 7), (-3, 7), (7, 3),
    (-7, 3), (5, 6), (-5, 6), (6, 5), (-6, 5), (8, 0), (4, 7),
    (-4, 7), (7, 4), (-7, 4), (8, 1), (8, 2), (6, 6), (-6, 6),
    (8, 3), (5, 7), (-5, 7), (7, 5), (-7, 5), (8, 4), (6, 7),
    (-6, 7), (7, 6), (-7, 6), (8, 5), (7, 7), (-7, 7), (8, 6),
    (8, 7),
];

/// Number of plane codes reserved for [`DISTANCE_MAP`].
pub(crate) const NUM_PLANE_CODES: u32 = DISTANCE_MAP.len() as u32;

/// Prefix symbol and extra bits for a length or distance value (≥ 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PrefixCode {
    pub symbol: u32,
    pub extra_bits: u32,
    pub extra_value: u32,
}

pub(crate) fn prefix_encode(value: u32) -> PrefixCode {
    debug_assert!(value >= 1);
    let d = value - 1;
    if d < 4 {
        return PrefixCode {
            symbol: d,
            extra_bits: 0,
            extra_value: 0,
        };
    }
    let highest = 31 - d.leading_zeros();
    let second = (d >> (highest - 1)) & 1;
    let extra_bits = highest - 1;
    PrefixCode {
        symbol: 2 * highest + second,
        extra_bits,
        extra_value: d & ((1 << extra_bits) - 1),
    }
}

/// Reads the extra bits following a prefix symbol and returns the value.
pub(crate) fn prefix_decode(
    symbol: u32,
    reader: &mut BitReader<'_>,
) -> Result<u32, BitstreamError> {
    if symbol < 4 {
        return Ok(symbol + 1);
    }
    let extra_bits = (symbol - 2) >> 1;
    let offset = (2 + (symbol & 1)) << extra_bits;
    Ok(offset + reader.read_bits(extra_bits)? + 1)
}

pub(crate) fn write_prefix_extra(writer: &mut BitWriter, code: PrefixCode) {
    writer.write_bits(code.extra_value, code.extra_bits);
}

/// Converts a decoded plane code to a linear pixel distance.
pub(crate) fn plane_code_to_distance(xsize: usize, plane_code: u32) -> usize {
    if plane_code > NUM_PLANE_CODES {
        return (plane_code - NUM_PLANE_CODES) as usize;
    }
    let (dx, dy) = DISTANCE_MAP[(plane_code - 1) as usize];
    let dist = i64::from(dx) + i64::from(dy) * xsize as i64;
    dist.max(1) as usize
}

/// Encoder-side inverse of [`plane_code_to_distance`] for one image width.
pub(crate) struct DistanceCoder {
    /// (distance, plane code) pairs, sorted by distance, smallest code per distance.
    short: Vec<(usize, u32)>,
}

impl DistanceCoder {
    pub fn new(xsize: usize) -> Self {
        let mut short: Vec<(usize, u32)> = DISTANCE_MAP
            .iter()
            .enumerate()
            .filter_map(|(i, &(dx, dy))| {
                let dist = i64::from(dx) + i64::from(dy) * xsize as i64;
                (dist >= 1).then_some((dist as usize, i as u32 + 1))
            })
            .collect();
        short.sort_unstable();
        short.dedup_by_key(|entry| entry.0);
        Self { short }
    }

    /// Plane code to transmit for a backward distance.
    pub fn code(&self, dist: usize) -> u32 {
        match self.short.binary_search_by_key(&dist, |entry| entry.0) {
            Ok(i) => self.short[i].1,
            Err(_) => dist as u32 + NUM_PLANE_CODES,
        }
    }
}

const COLOR_CACHE_MULTIPLIER: u32 = 0x1e35_a7bd;

/// Hash-indexed cache of recently seen ARGB values.
#[derive(Debug, Clone)]
pub(crate) struct ColorCache {
    shift: u32,
    colors: Vec<u32>,
}

impl ColorCache {
    pub fn new(bits: u32) -> Self {
        debug_assert!((1..=11).contains(&bits));
        Self {
            shift: 32 - bits,
            colors: vec![0; 1 << bits],
        }
    }

    #[inline]
    pub fn key(&self, argb: u32) -> usize {
        (argb.wrapping_mul(COLOR_CACHE_MULTIPLIER) >> self.shift) as usize
    }

    #[inline]
    pub fn insert(&mut self, argb: u32) {
        let key = self.key(argb);
        self.colors[key] = argb;
    }

    #[inline]
    pub fn lookup(&self, key: usize) -> Option<u32> {
        self.colors.get(key).copied()
    }

    /// Cache slot holding `argb`, if present.
    #[inline]
    pub fn find(&self, argb: u32) -> Option<usize> {
        let key = self.key(argb);
        (self.colors[key] == argb).then_some(key)
    }
}
