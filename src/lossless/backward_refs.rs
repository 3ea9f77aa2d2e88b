//! LZ77 backward references and color-cache substitution for the encoder.

use alloc::vec;
use alloc::vec::Vec;

use super::prefix::{ColorCache, NUM_PLANE_CODES};
use crate::format::MAX_COPY_LENGTH;

/// Shortest copy worth emitting.
const MIN_MATCH: usize = 3;
const HASH_BITS: u32 = 16;
/// Largest distance representable by the 40-symbol distance alphabet.
const MAX_DISTANCE: usize = (1 << 20) - NUM_PLANE_CODES as usize;

/// One coded element of the pixel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(u32),
    CacheIndex(u32),
    Copy { len: u32, dist: u32 },
}

impl Token {
    /// Number of pixels this token produces.
    pub fn pixel_count(self) -> usize {
        match self {
            Token::Copy { len, .. } => len as usize,
            _ => 1,
        }
    }
}

fn chain_depth(effort: u8) -> usize {
    const DEPTHS: [usize; 11] = [0, 8, 16, 24, 32, 48, 64, 128, 256, 512, 1024];
    DEPTHS[usize::from(effort.min(10))]
}

#[inline]
fn hash_pair(a: u32, b: u32) -> usize {
    let h = a.wrapping_mul(0x1e35_a7bd) ^ b.wrapping_mul(0x9e37_79b1).rotate_left(13);
    (h >> (32 - HASH_BITS)) as usize
}

#[inline]
fn match_length(data: &[u32], a: usize, b: usize, max: usize) -> usize {
    let mut len = 0;
    while len < max && data[a + len] == data[b + len] {
        len += 1;
    }
    len
}

/// Greedy hash-chain LZ77 over `data`.
///
/// Distance 1 and distance `width` (the pixel above) are always tried, so
/// flat areas compress even at effort 0.
pub(crate) fn compute_references(data: &[u32], width: usize, effort: u8) -> Vec<Token> {
    let n = data.len();
    let depth = chain_depth(effort);
    let mut head = vec![usize::MAX; if depth > 0 { 1 << HASH_BITS } else { 0 }];
    let mut chain = vec![usize::MAX; if depth > 0 { n } else { 0 }];
    let mut tokens = Vec::with_capacity(n / 2 + 1);

    let insert = |head: &mut Vec<usize>, chain: &mut Vec<usize>, pos: usize| {
        if depth > 0 && pos + 1 < n {
            let h = hash_pair(data[pos], data[pos + 1]);
            chain[pos] = head[h];
            head[h] = pos;
        }
    };

    let mut pos = 0;
    while pos < n {
        let max_len = (n - pos).min(MAX_COPY_LENGTH);
        let mut best_len = 0;
        let mut best_dist = 0;

        if max_len >= MIN_MATCH {
            for dist in [1, width] {
                if dist >= 1 && dist <= pos {
                    let len = match_length(data, pos - dist, pos, max_len);
                    if len > best_len {
                        best_len = len;
                        best_dist = dist;
                    }
                }
            }
            if depth > 0 && pos + 1 < n {
                let mut candidate = head[hash_pair(data[pos], data[pos + 1])];
                let mut steps = 0;
                while candidate != usize::MAX && steps < depth && best_len < max_len {
                    let dist = pos - candidate;
                    if dist > MAX_DISTANCE {
                        break;
                    }
                    let len = match_length(data, candidate, pos, max_len);
                    if len > best_len {
                        best_len = len;
                        best_dist = dist;
                    }
                    candidate = chain[candidate];
                    steps += 1;
                }
            }
        }

        if best_len >= MIN_MATCH {
            tokens.push(Token::Copy {
                len: best_len as u32,
                dist: best_dist as u32,
            });
            for p in pos..pos + best_len {
                insert(&mut head, &mut chain, p);
            }
            pos += best_len;
        } else {
            tokens.push(Token::Literal(data[pos]));
            insert(&mut head, &mut chain, pos);
            pos += 1;
        }
    }
    tokens
}

/// Rewrites literals found in a `cache_bits` color cache as cache hits.
pub(crate) fn apply_color_cache(tokens: &[Token], data: &[u32], cache_bits: u32) -> Vec<Token> {
    if cache_bits == 0 {
        return tokens.to_vec();
    }
    let mut cache = ColorCache::new(cache_bits);
    let mut out = Vec::with_capacity(tokens.len());
    let mut pos = 0;
    for &token in tokens {
        match token {
            Token::Literal(argb) => {
                match cache.find(argb) {
                    Some(key) => out.push(Token::CacheIndex(key as u32)),
                    None => out.push(token),
                }
                cache.insert(argb);
            }
            Token::Copy { len, .. } => {
                for &argb in &data[pos..pos + len as usize] {
                    cache.insert(argb);
                }
                out.push(token);
            }
            Token::CacheIndex(_) => {
                cache.insert(data[pos]);
                out.push(token);
            }
        }
        pos += token.pixel_count();
    }
    out
}
