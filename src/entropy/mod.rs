//! Entropy coding: Huffman construction, prefix-code serialisation and
//! bit-cost estimation.
//!
//! Both frame bitstreams store their prefix codes in the same serialised
//! form, so the lossy coefficient coder reuses everything here.

mod codes;
mod cost;
mod huffman;

pub use codes::{CODE_LENGTH_ORDER, read_code, write_code};
pub use cost::{log2_q16, population_cost};
pub use huffman::{HuffmanCode, HuffmanTree, build_code_lengths, canonical_codes};
