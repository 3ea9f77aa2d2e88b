//! Separable 8×8 DCT-II / DCT-III in fixed point.
//!
//! Basis values are `c(u)·cos((2x+1)uπ/16)` scaled by 2048, so both
//! directions divide the double sum by `4·2048²` (a shift of 24).

/// `cos(kπ/16) · 2048` for `k` in `0..=8`.
const COS_BASE: [i32; 9] = [2048, 2009, 1892, 1703, 1448, 1138, 784, 400, 0];
const SHIFT: u32 = 24;

const fn basis() -> [[i32; 8]; 8] {
    let mut table = [[0i32; 8]; 8];
    let mut u = 0;
    while u < 8 {
        let mut x = 0;
        while x < 8 {
            table[u][x] = if u == 0 {
                COS_BASE[4]
            } else {
                let k = ((2 * x + 1) * u) % 32;
                if k <= 8 {
                    COS_BASE[k]
                } else if k <= 16 {
                    -COS_BASE[16 - k]
                } else if k <= 24 {
                    -COS_BASE[k - 16]
                } else {
                    COS_BASE[32 - k]
                }
            };
            x += 1;
        }
        u += 1;
    }
    table
}

static BASIS: [[i32; 8]; 8] = basis();

#[inline]
fn descale(sum: i64) -> i32 {
    ((sum + (1 << (SHIFT - 1))) >> SHIFT) as i32
}

/// Forward transform of level-shifted samples (`pixel - 128`), natural order.
pub(crate) fn forward(block: &[i32; 64]) -> [i32; 64] {
    let mut rows = [0i64; 64];
    for y in 0..8 {
        for u in 0..8 {
            rows[y * 8 + u] = (0..8)
                .map(|x| i64::from(BASIS[u][x]) * i64::from(block[y * 8 + x]))
                .sum();
        }
    }
    let mut out = [0i32; 64];
    for v in 0..8 {
        for u in 0..8 {
            let sum: i64 = (0..8).map(|y| i64::from(BASIS[v][y]) * rows[y * 8 + u]).sum();
            out[v * 8 + u] = descale(sum);
        }
    }
    out
}

/// Inverse transform back to level-shifted samples, natural order.
pub(crate) fn inverse(coefficients: &[i32; 64]) -> [i32; 64] {
    let mut cols = [0i64; 64];
    for y in 0..8 {
        for u in 0..8 {
            cols[y * 8 + u] = (0..8)
                .map(|v| i64::from(BASIS[v][y]) * i64::from(coefficients[v * 8 + u]))
                .sum();
        }
    }
    let mut out = [0i32; 64];
    for y in 0..8 {
        for x in 0..8 {
            let sum: i64 = (0..8).map(|u| i64::from(BASIS[u][x]) * cols[y * 8 + u]).sum();
            out[y * 8 + x] = descale(sum);
        }
    }
    out
}
