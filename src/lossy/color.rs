//! Fixed-point RGB ↔ YCbCr (BT.601 full range) and chroma resampling.

use alloc::vec::Vec;

use imgref::ImgRef;
use rgb::Rgba;

use crate::config::{Subsampling, Upsampling};

const HALF: i32 = 1 << 15;

#[inline]
fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

#[inline]
pub(crate) fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (i32::from(r), i32::from(g), i32::from(b));
    let y = (19595 * r + 38470 * g + 7471 * b + HALF) >> 16;
    let cb = (-11059 * r - 21709 * g + 32768 * b + (128 << 16) + HALF - 1) >> 16;
    let cr = (32768 * r - 27439 * g - 5329 * b + (128 << 16) + HALF - 1) >> 16;
    (clamp_u8(y), clamp_u8(cb), clamp_u8(cr))
}

#[inline]
pub(crate) fn ycbcr_to_rgb(y: u8, cb: u8, cr: u8) -> (u8, u8, u8) {
    let y = i32::from(y);
    let cb = i32::from(cb) - 128;
    let cr = i32::from(cr) - 128;
    let r = y + ((91881 * cr + HALF) >> 16);
    let g = y + ((-22554 * cb - 46802 * cr + HALF) >> 16);
    let b = y + ((116130 * cb + HALF) >> 16);
    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// One 8-bit sample plane.
#[derive(Debug, Clone)]
pub(crate) struct Plane {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl Plane {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: alloc::vec![0; width * height],
        }
    }

    /// Sample with coordinates clamped to the plane.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.data[y.min(self.height - 1) * self.width + x.min(self.width - 1)]
    }

    pub fn blocks_x(&self) -> usize {
        self.width.div_ceil(8)
    }

    pub fn blocks_y(&self) -> usize {
        self.height.div_ceil(8)
    }
}

/// Chroma plane size for a luma size.
pub(crate) fn chroma_size(width: usize, height: usize, subsampling: Subsampling) -> (usize, usize) {
    match subsampling {
        Subsampling::Yuv444 => (width, height),
        Subsampling::Yuv420 => (width.div_ceil(2), height.div_ceil(2)),
    }
}

/// Splits an image into Y, Cb and Cr planes. Alpha is ignored.
pub(crate) fn to_planes(image: ImgRef<'_, Rgba<u8>>, subsampling: Subsampling) -> [Plane; 3] {
    let (width, height) = (image.width(), image.height());
    let mut y_plane = Plane::new(width, height);
    let mut cb_full = Plane::new(width, height);
    let mut cr_full = Plane::new(width, height);
    for (row_index, row) in image.rows().enumerate() {
        for (x, px) in row.iter().enumerate() {
            let (y, cb, cr) = rgb_to_ycbcr(px.r, px.g, px.b);
            let i = row_index * width + x;
            y_plane.data[i] = y;
            cb_full.data[i] = cb;
            cr_full.data[i] = cr;
        }
    }
    match subsampling {
        Subsampling::Yuv444 => [y_plane, cb_full, cr_full],
        Subsampling::Yuv420 => [y_plane, downsample(&cb_full), downsample(&cr_full)],
    }
}

/// 2×2 box average, replicating the last row and column at odd sizes.
fn downsample(plane: &Plane) -> Plane {
    let (w, h) = chroma_size(plane.width, plane.height, Subsampling::Yuv420);
    let mut out = Plane::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let sum = u32::from(plane.at(2 * x, 2 * y))
                + u32::from(plane.at(2 * x + 1, 2 * y))
                + u32::from(plane.at(2 * x, 2 * y + 1))
                + u32::from(plane.at(2 * x + 1, 2 * y + 1));
            out.data[y * w + x] = ((sum + 2) >> 2) as u8;
        }
    }
    out
}

/// Chroma sample for luma position (`x`, `y`).
#[inline]
fn upsampled(plane: &Plane, x: usize, y: usize, upsampling: Upsampling) -> u8 {
    let (cx, cy) = (x / 2, y / 2);
    match upsampling {
        Upsampling::Nearest => plane.at(cx, cy),
        Upsampling::Bilinear => {
            // The nearer neighbour lies on the side of the sample this pixel sits on.
            let nx = if x % 2 == 0 { cx.saturating_sub(1) } else { cx + 1 };
            let ny = if y % 2 == 0 { cy.saturating_sub(1) } else { cy + 1 };
            let sum = 9 * u32::from(plane.at(cx, cy))
                + 3 * u32::from(plane.at(nx, cy))
                + 3 * u32::from(plane.at(cx, ny))
                + u32::from(plane.at(nx, ny));
            ((sum + 8) >> 4) as u8
        }
    }
}

/// Recombines planes into opaque RGBA pixels.
pub(crate) fn from_planes(
    planes: &[Plane; 3],
    width: usize,
    height: usize,
    subsampling: Subsampling,
    upsampling: Upsampling,
) -> Vec<Rgba<u8>> {
    let [y_plane, cb, cr] = planes;
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let (cb, cr) = match subsampling {
                Subsampling::Yuv444 => (cb.at(x, y), cr.at(x, y)),
                Subsampling::Yuv420 => {
                    (upsampled(cb, x, y, upsampling), upsampled(cr, x, y, upsampling))
                }
            };
            let (r, g, b) = ycbcr_to_rgb(y_plane.at(x, y), cb, cr);
            out.push(Rgba::new(r, g, b, 255));
        }
    }
    out
}
