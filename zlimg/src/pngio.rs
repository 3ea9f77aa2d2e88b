//! PNG reading and writing through the `png` crate.

use std::io::{BufReader, BufWriter, Cursor};
use std::path::Path;

use anyhow::{Context, bail};
use zenloop::pixel::{ImgRef, ImgVec, Rgba};

/// A decoded PNG, expanded to 8-bit RGBA.
pub struct PngImage {
    pub pixels: ImgVec<Rgba<u8>>,
    pub icc_profile: Option<Vec<u8>>,
}

pub fn read_png(path: &Path) -> anyhow::Result<PngImage> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    decode_png(&data).with_context(|| format!("decoding {}", path.display()))
}

pub fn decode_png(data: &[u8]) -> anyhow::Result<PngImage> {
    let mut decoder = png::Decoder::new(BufReader::new(Cursor::new(data)));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;

    let icc_profile = reader.info().icc_profile.as_ref().map(|p| p.to_vec());
    let buffer_size = reader
        .output_buffer_size()
        .ok_or_else(|| anyhow::anyhow!("cannot determine PNG output buffer size"))?;
    let mut raw = vec![0u8; buffer_size];
    let frame = reader.next_frame(&mut raw)?;
    raw.truncate(frame.buffer_size());

    let (width, height) = (frame.width as usize, frame.height as usize);
    let pixels: Vec<Rgba<u8>> = match frame.color_type {
        png::ColorType::Rgba => {
            raw.chunks_exact(4).map(|p| Rgba::new(p[0], p[1], p[2], p[3])).collect()
        }
        png::ColorType::Rgb => {
            raw.chunks_exact(3).map(|p| Rgba::new(p[0], p[1], p[2], 255)).collect()
        }
        png::ColorType::GrayscaleAlpha => {
            raw.chunks_exact(2).map(|p| Rgba::new(p[0], p[0], p[0], p[1])).collect()
        }
        png::ColorType::Grayscale => raw.iter().map(|&g| Rgba::new(g, g, g, 255)).collect(),
        png::ColorType::Indexed => bail!("indexed PNG was not expanded"),
    };
    if pixels.len() != width * height {
        bail!("PNG pixel count does not match its header");
    }
    Ok(PngImage {
        pixels: ImgVec::new(pixels, width, height),
        icc_profile,
    })
}

/// Writes RGBA, or RGB when every pixel is opaque.
pub fn write_png(path: &Path, image: ImgRef<'_, Rgba<u8>>) -> anyhow::Result<()> {
    let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let opaque = image.pixels().all(|p| p.a == 255);
    let mut encoder =
        png::Encoder::new(BufWriter::new(file), image.width() as u32, image.height() as u32);
    encoder.set_depth(png::BitDepth::Eight);
    let data: Vec<u8> = if opaque {
        encoder.set_color(png::ColorType::Rgb);
        image.pixels().flat_map(|p| [p.r, p.g, p.b]).collect()
    } else {
        encoder.set_color(png::ColorType::Rgba);
        image.pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect()
    };
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;
    Ok(())
}
