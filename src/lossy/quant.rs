//! Quantisation tables and coefficient categories.

/// Zig-zag position to natural (row-major) position.
pub(crate) const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// ITU-T T.81 Annex K.1 luminance table, natural order.
const STD_LUMA_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// ITU-T T.81 Annex K.2 chrominance table, natural order.
const STD_CHROMA_QUANT: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Largest quantised magnitude, keeping every category (and DC difference) within 4 bits.
pub(crate) const MAX_QUANTIZED: i32 = (1 << 14) - 1;

/// Scales the standard table for `quality` (clamped to 1..=100) the IJG way.
pub(crate) fn quant_table(quality: u8, chroma: bool) -> [u16; 64] {
    let base = if chroma { &STD_CHROMA_QUANT } else { &STD_LUMA_QUANT };
    let quality = u32::from(quality.clamp(1, 100));
    let scale = if quality < 50 { 5000 / quality } else { 200 - quality * 2 };
    let mut table = [0u16; 64];
    for (out, &b) in table.iter_mut().zip(base) {
        *out = ((u32::from(b) * scale + 50) / 100).clamp(1, 255) as u16;
    }
    table
}

/// Divides with rounding to nearest, ties away from zero.
#[inline]
pub(crate) fn quantize(coefficient: i32, q: u16) -> i32 {
    let q = i32::from(q);
    let magnitude = (coefficient.abs() + q / 2) / q;
    (if coefficient < 0 { -magnitude } else { magnitude }).clamp(-MAX_QUANTIZED, MAX_QUANTIZED)
}

/// Number of bits needed for `|value|`.
#[inline]
pub(crate) fn category(value: i32) -> u32 {
    32 - value.unsigned_abs().leading_zeros()
}

/// Bits written after a category symbol; negatives are stored one's-complement style.
#[inline]
pub(crate) fn value_bits(value: i32, category: u32) -> u32 {
    if value < 0 { (value + (1 << category) - 1) as u32 } else { value as u32 }
}

/// Inverse of [`value_bits`].
#[inline]
pub(crate) fn extend(bits: u32, category: u32) -> i32 {
    if category == 0 {
        return 0;
    }
    let bits = bits as i32;
    if bits < 1 << (category - 1) { bits - (1 << category) + 1 } else { bits }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_scaling_matches_ijg() {
        assert_eq!(quant_table(50, false), STD_LUMA_QUANT);
        assert!(quant_table(100, false).iter().all(|&q| q == 1));
        let q10 = quant_table(10, true);
        assert_eq!(q10[0], 85);
        assert!(q10.iter().all(|&q| q <= 255));
        assert_eq!(quant_table(0, false), quant_table(1, false));
    }

    #[test]
    fn quantize_rounds_symmetrically() {
        assert_eq!(quantize(15, 10), 2);
        assert_eq!(quantize(-15, 10), -2);
        assert_eq!(quantize(14, 10), 1);
        assert_eq!(quantize(-4, 10), 0);
        assert_eq!(quantize(1 << 20, 1), MAX_QUANTIZED);
    }

    #[test]
    fn category_and_value_bits_invert() {
        for v in [-2047, -256, -3, -1, 1, 2, 7, 8, 1000] {
            let c = category(v);
            assert_eq!(extend(value_bits(v, c), c), v);
        }
        assert_eq!(category(0), 0);
        assert_eq!(category(-1), 1);
        assert_eq!(category(MAX_QUANTIZED * 2), 15);
    }

    #[test]
    fn zigzag_is_a_permutation() {
        let mut seen = [false; 64];
        for &i in &ZIGZAG {
            assert!(!seen[i]);
            seen[i] = true;
        }
    }
}
