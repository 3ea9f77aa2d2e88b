//! Symbol statistics for the five prefix codes of a group, and clustering
//! of per-tile statistics into meta prefix code groups.

use alloc::vec;
use alloc::vec::Vec;

use super::backward_refs::Token;
use super::prefix::prefix_encode;
use crate::entropy::{build_code_lengths, population_cost};
use crate::format::{MAX_CODE_LENGTH, NUM_DISTANCE_CODES, NUM_LENGTH_CODES, NUM_LITERAL_CODES};

/// Alphabet size of the green/length/cache code.
pub(crate) fn green_alphabet_size(cache_bits: u32) -> usize {
    NUM_LITERAL_CODES + NUM_LENGTH_CODES + if cache_bits > 0 { 1 << cache_bits } else { 0 }
}

#[derive(Debug, Clone)]
pub(crate) struct Histogram {
    pub green: Vec<u32>,
    pub red: Vec<u32>,
    pub blue: Vec<u32>,
    pub alpha: Vec<u32>,
    pub distance: Vec<u32>,
    /// Raw extra bits following length and distance symbols.
    pub extra_bits: u64,
}

impl Histogram {
    pub fn new(cache_bits: u32) -> Self {
        Self {
            green: vec![0; green_alphabet_size(cache_bits)],
            red: vec![0; NUM_LITERAL_CODES],
            blue: vec![0; NUM_LITERAL_CODES],
            alpha: vec![0; NUM_LITERAL_CODES],
            distance: vec![0; NUM_DISTANCE_CODES],
            extra_bits: 0,
        }
    }

    /// Counts one token. Copy distances must already be plane codes.
    pub fn add(&mut self, token: Token) {
        match token {
            Token::Literal(argb) => {
                self.alpha[(argb >> 24) as usize] += 1;
                self.red[((argb >> 16) & 0xff) as usize] += 1;
                self.green[((argb >> 8) & 0xff) as usize] += 1;
                self.blue[(argb & 0xff) as usize] += 1;
            }
            Token::CacheIndex(key) => {
                self.green[NUM_LITERAL_CODES + NUM_LENGTH_CODES + key as usize] += 1;
            }
            Token::Copy { len, dist } => {
                let len_code = prefix_encode(len);
                let dist_code = prefix_encode(dist);
                self.green[NUM_LITERAL_CODES + len_code.symbol as usize] += 1;
                self.distance[dist_code.symbol as usize] += 1;
                self.extra_bits += u64::from(len_code.extra_bits + dist_code.extra_bits);
            }
        }
    }

    pub fn merge(&mut self, other: &Histogram) {
        for (dst, src) in [
            (&mut self.green, &other.green),
            (&mut self.red, &other.red),
            (&mut self.blue, &other.blue),
            (&mut self.alpha, &other.alpha),
            (&mut self.distance, &other.distance),
        ] {
            for (d, s) in dst.iter_mut().zip(src) {
                *d += s;
            }
        }
        self.extra_bits += other.extra_bits;
    }

    pub fn is_empty(&self) -> bool {
        self.green.iter().all(|&c| c == 0)
    }

    /// Estimated coded size in Q16 bits.
    pub fn cost(&self) -> u64 {
        population_cost(&self.green)
            + population_cost(&self.red)
            + population_cost(&self.blue)
            + population_cost(&self.alpha)
            + population_cost(&self.distance)
            + (self.extra_bits << 16)
    }

    /// Code lengths for green, red, blue, alpha and distance, in that order.
    pub fn code_lengths(&self) -> [Vec<u8>; 5] {
        [
            build_code_lengths(&self.green, MAX_CODE_LENGTH),
            build_code_lengths(&self.red, MAX_CODE_LENGTH),
            build_code_lengths(&self.blue, MAX_CODE_LENGTH),
            build_code_lengths(&self.alpha, MAX_CODE_LENGTH),
            build_code_lengths(&self.distance, MAX_CODE_LENGTH),
        ]
    }
}

/// Greedily assigns tiles to at most `max_groups` merged histograms.
///
/// Each non-empty tile joins the group whose cost grows least, or opens a
/// new group when that is cheaper and room remains. Returns the group
/// histograms and the group index of every tile.
pub(crate) fn cluster(tiles: &[Histogram], max_groups: usize) -> (Vec<Histogram>, Vec<u32>) {
    let mut groups: Vec<Histogram> = Vec::new();
    let mut group_costs: Vec<u64> = Vec::new();
    let mut assignment = vec![0u32; tiles.len()];

    for (tile_index, tile) in tiles.iter().enumerate() {
        if tile.is_empty() {
            continue;
        }
        let alone = tile.cost();
        let mut best: Option<(u64, usize)> = None;
        for (g, group) in groups.iter().enumerate() {
            let mut merged = group.clone();
            merged.merge(tile);
            let delta = merged.cost().saturating_sub(group_costs[g]);
            if best.is_none_or(|(b, _)| delta < b) {
                best = Some((delta, g));
            }
        }
        match best {
            Some((delta, g)) if delta <= alone || groups.len() >= max_groups => {
                groups[g].merge(tile);
                group_costs[g] = groups[g].cost();
                assignment[tile_index] = g as u32;
            }
            _ => {
                assignment[tile_index] = groups.len() as u32;
                groups.push(tile.clone());
                group_costs.push(alone);
            }
        }
    }

    if groups.is_empty() {
        groups.push(tiles.first().cloned().unwrap_or_else(|| Histogram::new(0)));
    }
    (groups, assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal_histogram(colors: &[u32], repeats: usize) -> Histogram {
        let mut h = Histogram::new(0);
        for _ in 0..repeats {
            for &c in colors {
                h.add(Token::Literal(c));
            }
        }
        h
    }

    #[test]
    fn copy_tokens_count_length_and_distance() {
        let mut h = Histogram::new(4);
        h.add(Token::Copy { len: 10, dist: 130 });
        h.add(Token::CacheIndex(3));
        assert_eq!(h.green.len(), 256 + 24 + 16);
        assert_eq!(h.green[256 + prefix_encode(10).symbol as usize], 1);
        assert_eq!(h.green[256 + 24 + 3], 1);
        assert_eq!(h.distance.iter().sum::<u32>(), 1);
        assert!(h.extra_bits > 0);
    }

    #[test]
    fn dissimilar_tiles_form_separate_groups() {
        let reds = literal_histogram(&[0xffff_0000, 0xfffe_0000], 50);
        let blues = literal_histogram(&[0xff00_00ff, 0xff00_00fe, 0xff00_00fd, 0xff00_00fc], 50);
        let tiles = [reds.clone(), blues.clone(), reds, blues, Histogram::new(0)];
        let (groups, assignment) = cluster(&tiles, 8);
        assert_eq!(groups.len(), 2);
        assert_eq!(assignment[0], assignment[2]);
        assert_eq!(assignment[1], assignment[3]);
        assert_ne!(assignment[0], assignment[1]);
    }

    #[test]
    fn group_limit_is_respected() {
        let tiles: Vec<Histogram> = (0..20u32)
            .map(|i| {
                let base = 0xff00_0000 | (i * 1000);
                literal_histogram(&[base, base + 1], 100)
            })
            .collect();
        let (groups, assignment) = cluster(&tiles, 3);
        assert!(groups.len() <= 3);
        assert!(assignment.iter().all(|&g| (g as usize) < groups.len()));
    }
}
