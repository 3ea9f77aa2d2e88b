//! Prefix-code serialisation.
//!
//! A code is either *simple* (one or two symbols below 256, written
//! directly) or *normal*: its code lengths are run-length tokenised, and the
//! tokens are coded with a second, 19-symbol code whose own lengths are sent
//! as 3-bit fields in [`CODE_LENGTH_ORDER`].

use alloc::vec;
use alloc::vec::Vec;

use super::huffman::{HuffmanCode, HuffmanTree, build_code_lengths};
use crate::bitstream::{BitReader, BitWriter};
use crate::error::BitstreamError;
use crate::format::{MAX_CODE_LENGTH_CODE_LENGTH, NUM_CODE_LENGTH_CODES};

/// Transmission order of the code-length code lengths.
pub const CODE_LENGTH_ORDER: [usize; NUM_CODE_LENGTH_CODES] = [
    17, 18, 0, 1, 2, 3, 4, 5, 16, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

/// Code length assumed for a leading repeat token.
const INITIAL_REPEAT_LENGTH: u8 = 8;

const REPEAT_PREVIOUS: u8 = 16;
const REPEAT_ZEROS_SHORT: u8 = 17;
const REPEAT_ZEROS_LONG: u8 = 18;

#[derive(Debug, Clone, Copy)]
struct LengthToken {
    code: u8,
    extra: u8,
}

impl LengthToken {
    fn extra_bits(self) -> u32 {
        match self.code {
            REPEAT_PREVIOUS => 2,
            REPEAT_ZEROS_SHORT => 3,
            REPEAT_ZEROS_LONG => 7,
            _ => 0,
        }
    }

    fn is_zero(self) -> bool {
        matches!(self.code, 0 | REPEAT_ZEROS_SHORT | REPEAT_ZEROS_LONG)
    }
}

/// Reads a prefix code over an alphabet of `alphabet_size` symbols.
pub fn read_code(
    reader: &mut BitReader<'_>,
    alphabet_size: usize,
) -> Result<HuffmanTree, BitstreamError> {
    let mut lengths = vec![0u8; alphabet_size];

    if reader.read_bit()? {
        let num_symbols = reader.read_bits(1)? + 1;
        let first_is_8bits = reader.read_bit()?;
        let s0 = reader.read_bits(if first_is_8bits { 8 } else { 1 })? as usize;
        *lengths.get_mut(s0).ok_or(BitstreamError::InvalidPrefixCode)? = 1;
        if num_symbols == 2 {
            let s1 = reader.read_bits(8)? as usize;
            *lengths.get_mut(s1).ok_or(BitstreamError::InvalidPrefixCode)? = 1;
        }
    } else {
        let num_codes = reader.read_bits(4)? as usize + 4;
        let mut code_length_lengths = [0u8; NUM_CODE_LENGTH_CODES];
        for &symbol in &CODE_LENGTH_ORDER[..num_codes] {
            code_length_lengths[symbol] = reader.read_bits(3)? as u8;
        }
        let length_tree = HuffmanTree::from_lengths(&code_length_lengths)?;
        read_code_lengths(reader, &length_tree, &mut lengths)?;
    }

    HuffmanTree::from_lengths(&lengths)
}

fn read_code_lengths(
    reader: &mut BitReader<'_>,
    length_tree: &HuffmanTree,
    lengths: &mut [u8],
) -> Result<(), BitstreamError> {
    let mut max_tokens = if reader.read_bit()? {
        let nbits = 2 + 2 * reader.read_bits(3)?;
        let max = 2 + reader.read_bits(nbits)? as usize;
        if max > lengths.len() {
            return Err(BitstreamError::InvalidPrefixCode);
        }
        max
    } else {
        lengths.len()
    };

    let mut prev = INITIAL_REPEAT_LENGTH;
    let mut symbol = 0usize;
    while symbol < lengths.len() && max_tokens > 0 {
        max_tokens -= 1;
        let code = length_tree.read_symbol(reader)? as u8;
        if code < REPEAT_PREVIOUS {
            lengths[symbol] = code;
            symbol += 1;
            if code != 0 {
                prev = code;
            }
            continue;
        }
        let (extra_bits, offset, value) = match code {
            REPEAT_PREVIOUS => (2, 3, prev),
            REPEAT_ZEROS_SHORT => (3, 3, 0),
            _ => (7, 11, 0),
        };
        let repeat = reader.read_bits(extra_bits)? as usize + offset;
        let end = symbol + repeat;
        if end > lengths.len() {
            return Err(BitstreamError::InvalidPrefixCode);
        }
        lengths[symbol..end].fill(value);
        symbol = end;
    }
    Ok(())
}

/// Writes the prefix code described by `lengths`.
///
/// `lengths` must come from [`build_code_lengths`] (or be otherwise complete).
pub fn write_code(writer: &mut BitWriter, lengths: &[u8]) {
    let used: Vec<usize> = (0..lengths.len()).filter(|&s| lengths[s] > 0).collect();

    if used.len() <= 2 && used.iter().all(|&s| s < 256) {
        writer.write_bit(true);
        let s0 = used.first().copied().unwrap_or(0);
        writer.write_bits(used.len().saturating_sub(1) as u32, 1);
        if s0 < 2 {
            writer.write_bit(false);
            writer.write_bits(s0 as u32, 1);
        } else {
            writer.write_bit(true);
            writer.write_bits(s0 as u32, 8);
        }
        if let Some(&s1) = used.get(1) {
            writer.write_bits(s1 as u32, 8);
        }
        return;
    }

    writer.write_bit(false);
    let tokens = tokenize(lengths);

    let mut histogram = [0u32; NUM_CODE_LENGTH_CODES];
    for token in &tokens {
        histogram[token.code as usize] += 1;
    }
    let length_code = HuffmanCode::from_lengths(build_code_lengths(
        &histogram,
        MAX_CODE_LENGTH_CODE_LENGTH,
    ));

    let mut num_codes = NUM_CODE_LENGTH_CODES;
    while num_codes > 4 && length_code.lengths()[CODE_LENGTH_ORDER[num_codes - 1]] == 0 {
        num_codes -= 1;
    }
    writer.write_bits((num_codes - 4) as u32, 4);
    for &symbol in &CODE_LENGTH_ORDER[..num_codes] {
        writer.write_bits(u32::from(length_code.lengths()[symbol]), 3);
    }

    let mut written = tokens.len();
    while written > 0 && tokens[written - 1].is_zero() {
        written -= 1;
    }
    if written >= 2 && written < tokens.len() {
        writer.write_bit(true);
        let mut nbits_code = 0u32;
        while (written - 2) >> (2 + 2 * nbits_code) != 0 {
            nbits_code += 1;
        }
        writer.write_bits(nbits_code, 3);
        writer.write_bits((written - 2) as u32, 2 + 2 * nbits_code);
    } else {
        writer.write_bit(false);
        written = tokens.len();
    }

    for token in &tokens[..written] {
        length_code.write_symbol(writer, token.code as usize);
        writer.write_bits(u32::from(token.extra), token.extra_bits());
    }
}

fn tokenize(lengths: &[u8]) -> Vec<LengthToken> {
    let mut tokens = Vec::new();
    let mut prev = INITIAL_REPEAT_LENGTH;
    let mut i = 0;
    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }
        i += run;

        if value == 0 {
            while run > 0 {
                if run >= 11 {
                    let take = run.min(138);
                    tokens.push(LengthToken { code: REPEAT_ZEROS_LONG, extra: (take - 11) as u8 });
                    run -= take;
                } else if run >= 3 {
                    tokens.push(LengthToken { code: REPEAT_ZEROS_SHORT, extra: (run - 3) as u8 });
                    run = 0;
                } else {
                    tokens.push(LengthToken { code: 0, extra: 0 });
                    run -= 1;
                }
            }
            continue;
        }

        if value != prev {
            tokens.push(LengthToken { code: value, extra: 0 });
            prev = value;
            run -= 1;
        }
        while run > 0 {
            if run >= 3 {
                let take = run.min(6);
                tokens.push(LengthToken { code: REPEAT_PREVIOUS, extra: (take - 3) as u8 });
                run -= take;
            } else {
                tokens.push(LengthToken { code: value, extra: 0 });
                run -= 1;
            }
        }
    }
    tokens
}
