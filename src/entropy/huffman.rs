//! Length-limited Huffman construction and canonical prefix codes.

use alloc::vec;
use alloc::vec::Vec;

use crate::bitstream::{BitReader, BitWriter};
use crate::error::BitstreamError;
use crate::format::MAX_CODE_LENGTH;

/// Bits resolved by a single table lookup when decoding.
const TABLE_BITS: u32 = 8;

/// Builds Huffman code lengths for `histogram`, limited to `max_len` bits.
///
/// Unused symbols get length 0. A lone used symbol gets length 1, which
/// every reader treats as a zero-bit code. With two or more used symbols
/// the lengths always form a complete code.
///
/// When the optimal tree is too deep, small counts are raised to a floor
/// that doubles until the tree fits.
pub fn build_code_lengths(histogram: &[u32], max_len: u8) -> Vec<u8> {
    let mut lengths = vec![0u8; histogram.len()];
    let used: Vec<usize> = (0..histogram.len()).filter(|&s| histogram[s] > 0).collect();

    match used.len() {
        0 => return lengths,
        1 => {
            lengths[used[0]] = 1;
            return lengths;
        }
        _ => {}
    }

    let mut count_min = 1u64;
    loop {
        let mut leaves: Vec<(u64, usize)> = used
            .iter()
            .map(|&s| (u64::from(histogram[s]).max(count_min), s))
            .collect();
        leaves.sort_unstable();

        let depths = tree_depths(&leaves);
        if depths.iter().all(|&d| d <= max_len) {
            for (&(_, symbol), &depth) in leaves.iter().zip(&depths) {
                lengths[symbol] = depth;
            }
            return lengths;
        }
        count_min *= 2;
    }
}

/// Depth of each leaf in a Huffman tree built over `leaves` (sorted by weight).
fn tree_depths(leaves: &[(u64, usize)]) -> Vec<u8> {
    let n = leaves.len();
    let mut weights: Vec<u64> = leaves.iter().map(|&(w, _)| w).collect();
    let mut parent = vec![usize::MAX; n];
    weights.reserve(n - 1);
    parent.reserve(n - 1);

    // Two-queue merge: leaves are sorted, and internal nodes are created in
    // non-decreasing weight order.
    let (mut next_leaf, mut next_node) = (0usize, n);
    let mut pick = |weights: &Vec<u64>| {
        if next_leaf < n
            && (next_node >= weights.len() || weights[next_leaf] <= weights[next_node])
        {
            next_leaf += 1;
            next_leaf - 1
        } else {
            next_node += 1;
            next_node - 1
        }
    };
    for _ in 0..n - 1 {
        let a = pick(&weights);
        let b = pick(&weights);
        weights.push(weights[a] + weights[b]);
        parent.push(usize::MAX);
        let node = weights.len() - 1;
        parent[a] = node;
        parent[b] = node;
    }

    let root = weights.len() - 1;
    let mut depth = vec![0u8; weights.len()];
    for node in (0..root).rev() {
        depth[node] = depth[parent[node]].saturating_add(1);
    }
    depth.truncate(n);
    depth
}

/// Canonical code values for `lengths`, bit-reversed for LSB-first output.
pub fn canonical_codes(lengths: &[u8]) -> Vec<u16> {
    let mut bl_count = [0u32; MAX_CODE_LENGTH as usize + 1];
    for &len in lengths {
        if len > 0 {
            bl_count[len as usize] += 1;
        }
    }
    let mut next_code = [0u32; MAX_CODE_LENGTH as usize + 1];
    let mut code = 0u32;
    for bits in 1..=MAX_CODE_LENGTH as usize {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
    }

    lengths
        .iter()
        .map(|&len| {
            if len == 0 {
                return 0;
            }
            let c = next_code[len as usize];
            next_code[len as usize] += 1;
            reverse_bits(c, len) as u16
        })
        .collect()
}

#[inline]
fn reverse_bits(code: u32, len: u8) -> u32 {
    code.reverse_bits() >> (32 - u32::from(len))
}

/// Encoder-side prefix code.
#[derive(Debug, Clone)]
pub struct HuffmanCode {
    lengths: Vec<u8>,
    codes: Vec<u16>,
    /// True when at most one symbol is used; such codes emit no bits.
    trivial: bool,
}

impl HuffmanCode {
    /// Builds an optimal code for `histogram`.
    pub fn from_histogram(histogram: &[u32], max_len: u8) -> Self {
        Self::from_lengths(build_code_lengths(histogram, max_len))
    }

    /// Wraps precomputed code lengths.
    pub fn from_lengths(lengths: Vec<u8>) -> Self {
        let codes = canonical_codes(&lengths);
        let trivial = lengths.iter().filter(|&&l| l > 0).count() <= 1;
        Self {
            lengths,
            codes,
            trivial,
        }
    }

    /// Code lengths indexed by symbol.
    pub fn lengths(&self) -> &[u8] {
        &self.lengths
    }

    /// Bits spent on `symbol`.
    #[inline]
    pub fn symbol_bits(&self, symbol: usize) -> u32 {
        if self.trivial { 0 } else { u32::from(self.lengths[symbol]) }
    }

    /// Emits `symbol`.
    #[inline]
    pub fn write_symbol(&self, writer: &mut BitWriter, symbol: usize) {
        if self.trivial {
            return;
        }
        debug_assert!(self.lengths[symbol] > 0, "symbol {symbol} has no code");
        writer.write_bits(
            u32::from(self.codes[symbol]),
            u32::from(self.lengths[symbol]),
        );
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TableEntry {
    symbol: u16,
    /// Code length; 0 means the code is longer than `TABLE_BITS`.
    len: u8,
}

/// Decoder-side prefix code.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    single: Option<u16>,
    table: Vec<TableEntry>,
    /// Number of codes per length.
    counts: [u16; MAX_CODE_LENGTH as usize + 1],
    /// Symbols ordered by (length, symbol).
    sorted: Vec<u16>,
}

impl HuffmanTree {
    /// Builds a decoder from code lengths.
    ///
    /// Fails when no symbol is used, or when two or more symbols are used
    /// and the lengths do not form a complete prefix code.
    pub fn from_lengths(lengths: &[u8]) -> Result<Self, BitstreamError> {
        let mut counts = [0u16; MAX_CODE_LENGTH as usize + 1];
        let mut used = 0usize;
        let mut last = 0usize;
        for (symbol, &len) in lengths.iter().enumerate() {
            if len > MAX_CODE_LENGTH {
                return Err(BitstreamError::InvalidPrefixCode);
            }
            if len > 0 {
                counts[len as usize] += 1;
                used += 1;
                last = symbol;
            }
        }

        match used {
            0 => return Err(BitstreamError::InvalidPrefixCode),
            1 => {
                return Ok(Self {
                    single: Some(last as u16),
                    table: Vec::new(),
                    counts,
                    sorted: Vec::new(),
                });
            }
            _ => {}
        }

        let mut space = 0u32;
        for (len, &count) in counts.iter().enumerate().skip(1) {
            space += u32::from(count) << (MAX_CODE_LENGTH as usize - len);
        }
        if space != 1 << MAX_CODE_LENGTH {
            return Err(BitstreamError::InvalidPrefixCode);
        }

        let mut sorted = Vec::with_capacity(used);
        for len in 1..=MAX_CODE_LENGTH {
            sorted.extend(
                lengths
                    .iter()
                    .enumerate()
                    .filter(|&(_, &l)| l == len)
                    .map(|(s, _)| s as u16),
            );
        }

        let codes = canonical_codes(lengths);
        let mut table = vec![TableEntry::default(); 1 << TABLE_BITS];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len == 0 || u32::from(len) > TABLE_BITS {
                continue;
            }
            let step = 1usize << len;
            let mut index = codes[symbol] as usize;
            while index < table.len() {
                table[index] = TableEntry {
                    symbol: symbol as u16,
                    len,
                };
                index += step;
            }
        }

        Ok(Self {
            single: None,
            table,
            counts,
            sorted,
        })
    }

    /// Decodes one symbol.
    #[inline]
    pub fn read_symbol(&self, reader: &mut BitReader<'_>) -> Result<u16, BitstreamError> {
        if let Some(symbol) = self.single {
            return Ok(symbol);
        }
        let bits = reader.peek_bits(u32::from(MAX_CODE_LENGTH));
        let entry = self.table[(bits & ((1 << TABLE_BITS) - 1)) as usize];
        if entry.len > 0 {
            reader.consume(u32::from(entry.len))?;
            return Ok(entry.symbol);
        }
        self.read_slow(reader, bits)
    }

    /// Canonical bit-by-bit decode for codes longer than the table.
    fn read_slow(&self, reader: &mut BitReader<'_>, bits: u32) -> Result<u16, BitstreamError> {
        let (mut code, mut first, mut index) = (0i32, 0i32, 0i32);
        for len in 1..=u32::from(MAX_CODE_LENGTH) {
            code |= ((bits >> (len - 1)) & 1) as i32;
            let count = i32::from(self.counts[len as usize]);
            if code - count < first {
                reader.consume(len)?;
                return Ok(self.sorted[(index + code - first) as usize]);
            }
            index += count;
            first = (first + count) << 1;
            code <<= 1;
        }
        Err(BitstreamError::InvalidPrefixCode)
    }

    /// The symbol of a zero-bit code, if this is one.
    pub fn single_symbol(&self) -> Option<u16> {
        self.single
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kraft_complete(lengths: &[u8]) -> bool {
        let sum: u32 = lengths
            .iter()
            .filter(|&&l| l > 0)
            .map(|&l| 1u32 << (15 - l))
            .sum();
        sum == 1 << 15
    }

    #[test]
    fn lengths_respect_limit_and_are_complete() {
        // Fibonacci counts force a deep optimal tree.
        let mut histogram = [0u32; 30];
        let (mut a, mut b) = (1u32, 1u32);
        for h in histogram.iter_mut() {
            *h = a;
            let next = a.saturating_add(b);
            a = b;
            b = next;
        }
        for max_len in [7u8, 9, 15] {
            let lengths = build_code_lengths(&histogram, max_len);
            assert!(lengths.iter().all(|&l| l >= 1 && l <= max_len));
            assert!(kraft_complete(&lengths));
        }
    }

    #[test]
    fn single_and_empty_histograms() {
        assert_eq!(build_code_lengths(&[0, 0, 0], 15), [0, 0, 0]);
        assert_eq!(build_code_lengths(&[0, 9, 0], 15), [0, 1, 0]);
    }

    #[test]
    fn canonical_assignment_matches_deflate_example() {
        // RFC 1951 section 3.2.2 example, before bit reversal.
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        let codes = canonical_codes(&lengths);
        let expected = [0b010u32, 0b011, 0b100, 0b101, 0b110, 0b00, 0b1110, 0b1111];
        for ((&code, &want), &len) in codes.iter().zip(&expected).zip(&lengths) {
            assert_eq!(u32::from(code), reverse_bits(want, len));
        }
    }

    #[test]
    fn encode_decode_symbols() {
        let histogram: Vec<u32> = (0..300u32).map(|i| (i * 7919) % 97).collect();
        let code = HuffmanCode::from_histogram(&histogram, 15);
        let tree = HuffmanTree::from_lengths(code.lengths()).unwrap();

        let symbols: Vec<usize> = (0..300).filter(|&s| histogram[s] > 0).rev().collect();
        let mut writer = BitWriter::new();
        for &s in &symbols {
            code.write_symbol(&mut writer, s);
        }
        let bytes = writer.into_bytes();
        let mut reader = BitReader::new(&bytes);
        for &s in &symbols {
            assert_eq!(tree.read_symbol(&mut reader).unwrap() as usize, s);
        }
    }

    #[test]
    fn incomplete_code_rejected() {
        assert!(HuffmanTree::from_lengths(&[1, 2, 0]).is_err());
        assert!(HuffmanTree::from_lengths(&[1, 1, 1]).is_err());
        assert!(HuffmanTree::from_lengths(&[0, 0]).is_err());
    }

    #[test]
    fn single_symbol_reads_no_bits() {
        let tree = HuffmanTree::from_lengths(&[0, 0, 5, 0]).unwrap();
        let mut reader = BitReader::new(&[]);
        assert_eq!(tree.read_symbol(&mut reader).unwrap(), 2);
    }
}
