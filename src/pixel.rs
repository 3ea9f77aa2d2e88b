//! Typed pixel buffers.
//!
//! Uses `imgref::ImgVec` for 2D pixel data with typed pixels from the `rgb` crate.

use alloc::vec::Vec;

pub use imgref::{Img, ImgRef, ImgRefMut, ImgVec};
pub use rgb::alt::BGRA as Bgra;
pub use rgb::{Rgb, Rgba};

/// Byte order of interleaved 8-bit pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    Rgb8,
    #[default]
    Rgba8,
    Bgra8,
}

impl PixelLayout {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgb8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        !matches!(self, PixelLayout::Rgb8)
    }
}

/// Decoded pixels in one of the supported layouts.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum PixelData {
    Rgb8(ImgVec<Rgb<u8>>),
    Rgba8(ImgVec<Rgba<u8>>),
    Bgra8(ImgVec<Bgra<u8>>),
}

impl PixelData {
    /// Converts RGBA pixels to `layout`. Alpha is dropped for `Rgb8`.
    pub fn from_rgba(image: ImgVec<Rgba<u8>>, layout: PixelLayout) -> Self {
        let (width, height) = (image.width(), image.height());
        match layout {
            PixelLayout::Rgba8 => PixelData::Rgba8(image),
            PixelLayout::Rgb8 => PixelData::Rgb8(Img::new(
                image.pixels().map(|p| Rgb::new(p.r, p.g, p.b)).collect(),
                width,
                height,
            )),
            PixelLayout::Bgra8 => PixelData::Bgra8(Img::new(
                image.pixels().map(|p| Bgra { b: p.b, g: p.g, r: p.r, a: p.a }).collect(),
                width,
                height,
            )),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            PixelData::Rgb8(img) => img.width(),
            PixelData::Rgba8(img) => img.width(),
            PixelData::Bgra8(img) => img.width(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            PixelData::Rgb8(img) => img.height(),
            PixelData::Rgba8(img) => img.height(),
            PixelData::Bgra8(img) => img.height(),
        }
    }

    pub fn layout(&self) -> PixelLayout {
        match self {
            PixelData::Rgb8(_) => PixelLayout::Rgb8,
            PixelData::Rgba8(_) => PixelLayout::Rgba8,
            PixelData::Bgra8(_) => PixelLayout::Bgra8,
        }
    }

    /// Copies the pixels to RGBA, with opaque alpha for `Rgb8`.
    pub fn to_rgba8(&self) -> ImgVec<Rgba<u8>> {
        let (width, height) = (self.width(), self.height());
        let pixels: Vec<Rgba<u8>> = match self {
            PixelData::Rgb8(img) => img.pixels().map(|p| Rgba::new(p.r, p.g, p.b, 255)).collect(),
            PixelData::Rgba8(img) => img.pixels().collect(),
            PixelData::Bgra8(img) => img.pixels().map(|p| Rgba::new(p.r, p.g, p.b, p.a)).collect(),
        };
        Img::new(pixels, width, height)
    }

    /// Tightly packed bytes in the buffer's layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        fn pack<T: bytemuck::Pod>(img: &ImgVec<T>) -> Vec<u8> {
            let mut out =
                Vec::with_capacity(img.width() * img.height() * core::mem::size_of::<T>());
            for row in img.rows() {
                out.extend_from_slice(bytemuck::cast_slice(row));
            }
            out
        }
        match self {
            PixelData::Rgb8(img) => pack(img),
            PixelData::Rgba8(img) => pack(img),
            PixelData::Bgra8(img) => pack(img),
        }
    }
}

/// Reinterprets packed bytes as RGBA pixels of `layout`.
pub(crate) fn rgba_from_bytes(
    bytes: &[u8],
    layout: PixelLayout,
    width: usize,
    height: usize,
) -> Option<ImgVec<Rgba<u8>>> {
    let expected = width.checked_mul(height)?.checked_mul(layout.bytes_per_pixel())?;
    let bytes = bytes.get(..expected)?;
    let pixels: Vec<Rgba<u8>> = match layout {
        PixelLayout::Rgb8 => bytemuck::try_cast_slice::<u8, Rgb<u8>>(bytes)
            .ok()?
            .iter()
            .map(|p| Rgba::new(p.r, p.g, p.b, 255))
            .collect(),
        PixelLayout::Rgba8 => bytemuck::try_cast_slice::<u8, Rgba<u8>>(bytes).ok()?.to_vec(),
        PixelLayout::Bgra8 => bytemuck::try_cast_slice::<u8, Bgra<u8>>(bytes)
            .ok()?
            .iter()
            .map(|p| Rgba::new(p.r, p.g, p.b, p.a))
            .collect(),
    };
    Some(Img::new(pixels, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn layout_conversions_preserve_channels() {
        let img = Img::new(vec![Rgba::new(1u8, 2, 3, 4), Rgba::new(5, 6, 7, 8)], 2, 1);
        let bgra = PixelData::from_rgba(img.clone(), PixelLayout::Bgra8);
        assert_eq!(bgra.to_bytes(), [3, 2, 1, 4, 7, 6, 5, 8]);
        assert_eq!(bgra.to_rgba8().buf(), img.buf());
        let rgb = PixelData::from_rgba(img, PixelLayout::Rgb8);
        assert_eq!(rgb.to_bytes(), [1, 2, 3, 5, 6, 7]);
        assert_eq!((rgb.width(), rgb.height(), rgb.layout()), (2, 1, PixelLayout::Rgb8));
        assert!(rgb.to_rgba8().pixels().all(|p| p.a == 255));
    }

    #[test]
    fn bytes_to_rgba() {
        let bytes = [10u8, 20, 30, 40, 50, 60];
        let img = rgba_from_bytes(&bytes, PixelLayout::Rgb8, 2, 1).unwrap();
        assert_eq!(img.buf(), &[Rgba::new(10, 20, 30, 255), Rgba::new(40, 50, 60, 255)]);
        assert!(rgba_from_bytes(&bytes, PixelLayout::Rgba8, 2, 1).is_none());
        let bgra = rgba_from_bytes(&[3, 2, 1, 9], PixelLayout::Bgra8, 1, 1).unwrap();
        assert_eq!(bgra.buf()[0], Rgba::new(1, 2, 3, 9));
    }
}
