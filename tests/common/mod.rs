//! Synthetic test images and comparison helpers.

#![allow(dead_code)]

use zenloop::pixel::{ImgVec, Rgba};

/// Smooth diagonal gradient, opaque.
pub fn gradient(width: usize, height: usize) -> ImgVec<Rgba<u8>> {
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            Rgba::new(
                (x * 255 / (width - 1).max(1)) as u8,
                (y * 255 / (height - 1).max(1)) as u8,
                ((x + y) * 127 / (width + height)) as u8,
                255,
            )
        })
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Deterministic pseudo-random pixels (xorshift), so there are no long runs
/// or repeated colors.
pub fn noise(width: usize, height: usize, seed: u32, with_alpha: bool) -> ImgVec<Rgba<u8>> {
    let mut state = seed.max(1);
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        state
    };
    let pixels = (0..width * height)
        .map(|_| {
            let [r, g, b, a] = next().to_le_bytes();
            Rgba::new(r, g, b, if with_alpha { a } else { 255 })
        })
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Blocky image drawn from a small palette.
pub fn palette(width: usize, height: usize, colors: usize) -> ImgVec<Rgba<u8>> {
    let table: Vec<Rgba<u8>> = (0..colors)
        .map(|i| {
            let alpha = if i % 5 == 0 { 128 } else { 255 };
            Rgba::new((i * 37) as u8, (i * 91) as u8, (i * 13 + 50) as u8, alpha)
        })
        .collect();
    let pixels = (0..width * height)
        .map(|i| {
            let (x, y) = (i % width, i / width);
            table[(x / 3 + y / 2 * 7) % colors]
        })
        .collect();
    ImgVec::new(pixels, width, height)
}

/// Opaque gradient with a radial alpha falloff.
pub fn soft_alpha(width: usize, height: usize) -> ImgVec<Rgba<u8>> {
    let mut image = gradient(width, height);
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let radius = cx.min(cy).max(1.0);
    for (i, p) in image.buf_mut().iter_mut().enumerate() {
        let (x, y) = ((i % width) as f32 + 0.5, (i / width) as f32 + 0.5);
        let d = ((x - cx).powi(2) + (y - cy).powi(2)).sqrt() / radius;
        p.a = (255.0 * (1.0 - d).clamp(0.0, 1.0)) as u8;
    }
    image
}

pub fn solid(width: usize, height: usize, color: Rgba<u8>) -> ImgVec<Rgba<u8>> {
    ImgVec::new(vec![color; width * height], width, height)
}

/// Mean absolute error over R, G and B.
pub fn mean_abs_error(a: &ImgVec<Rgba<u8>>, b: &ImgVec<Rgba<u8>>) -> f64 {
    assert_eq!((a.width(), a.height()), (b.width(), b.height()));
    let total: u64 = a
        .pixels()
        .zip(b.pixels())
        .map(|(p, q)| {
            let channel = |a: u8, b: u8| u64::from(a.abs_diff(b));
            channel(p.r, q.r) + channel(p.g, q.g) + channel(p.b, q.b)
        })
        .sum();
    total as f64 / (a.width() * a.height() * 3) as f64
}
