//! Fixed-point bit-cost estimates used by encoder heuristics.

/// `log2(x)` in Q16 fixed point. `x` must be non-zero.
pub fn log2_q16(x: u64) -> u64 {
    debug_assert!(x > 0);
    let int = 63 - x.leading_zeros();
    // Mantissa normalised to [1, 2) in Q31.
    let mut y = if int >= 31 { x >> (int - 31) } else { x << (31 - int) };
    let mut frac = 0u64;
    for bit in (0..16).rev() {
        y = (y * y) >> 31;
        if y >= 1 << 32 {
            y >>= 1;
            frac |= 1 << bit;
        }
    }
    (u64::from(int) << 16) | frac
}

/// Approximate cost of storing a header entry per used symbol, in Q16 bits.
const SYMBOL_HEADER_COST_Q16: u64 = 4 << 16;

/// Estimated cost in Q16 bits of entropy-coding `histogram`, header included.
pub fn population_cost(histogram: &[u32]) -> u64 {
    let total: u64 = histogram.iter().map(|&c| u64::from(c)).sum();
    if total == 0 {
        return 0;
    }
    let log_total = log2_q16(total);
    let mut bits = 0u64;
    let mut used = 0u64;
    for &count in histogram.iter().filter(|&&c| c > 0) {
        let count = u64::from(count);
        bits += count * (log_total - log2_q16(count));
        used += 1;
    }
    if used <= 1 {
        return SYMBOL_HEADER_COST_Q16;
    }
    bits + used * SYMBOL_HEADER_COST_Q16
}
