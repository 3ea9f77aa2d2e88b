//! Single-frame encode and decode, independent of the container.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::alpha::{decode_alpha, encode_alpha, is_opaque};
use crate::config::{DecodeConfig, LosslessConfig, LossyConfig};
use crate::encode::EncodeMode;
use crate::error::{BitstreamError, CodecError};
use crate::format::BitstreamFormat;
use crate::pixel::{ImgRef, ImgVec, Rgba};
use crate::{Stop, lossless, lossy};

/// One encoded frame: the image chunk payload plus an optional `ALPH` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBitstream {
    pub format: BitstreamFormat,
    /// `VP8L` or `ZDCT` chunk payload.
    pub data: Vec<u8>,
    /// `ALPH` chunk payload; only lossy frames carry one.
    pub alpha: Option<Vec<u8>>,
}

/// Dimensions and alpha hint read from a frame bitstream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

/// Encoder inputs for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameSettings {
    pub mode: EncodeMode,
    pub lossy: LossyConfig,
    pub lossless: LosslessConfig,
}

/// Reads a frame's size without decoding it.
pub fn bitstream_header(format: BitstreamFormat, data: &[u8]) -> Result<FrameHeader, CodecError> {
    Ok(read_frame_header(format, data)?)
}

pub(crate) fn read_frame_header(
    format: BitstreamFormat,
    data: &[u8],
) -> Result<FrameHeader, BitstreamError> {
    Ok(match format {
        BitstreamFormat::Lossless => {
            let h = lossless::read_header(data)?;
            FrameHeader {
                width: h.width,
                height: h.height,
                has_alpha: h.has_alpha,
            }
        }
        BitstreamFormat::Lossy => {
            let h = lossy::read_header(data)?;
            FrameHeader {
                width: h.width,
                height: h.height,
                has_alpha: false,
            }
        }
    })
}

#[inline]
pub(crate) fn rgba_to_argb(p: Rgba<u8>) -> u32 {
    u32::from(p.a) << 24 | u32::from(p.r) << 16 | u32::from(p.g) << 8 | u32::from(p.b)
}

#[inline]
pub(crate) fn argb_to_rgba(argb: u32) -> Rgba<u8> {
    Rgba::new((argb >> 16) as u8, (argb >> 8) as u8, argb as u8, (argb >> 24) as u8)
}

/// True when the image has at most 256 distinct colors.
fn has_small_palette(image: ImgRef<'_, Rgba<u8>>) -> bool {
    let mut colors = BTreeSet::new();
    for p in image.pixels() {
        colors.insert(rgba_to_argb(p));
        if colors.len() > 256 {
            return false;
        }
    }
    true
}

/// Resolves the bitstream an [`EncodeMode`] produces for `image`.
pub(crate) fn select_format(
    mode: EncodeMode,
    lossy: &LossyConfig,
    image: ImgRef<'_, Rgba<u8>>,
) -> BitstreamFormat {
    match mode {
        EncodeMode::Lossless => BitstreamFormat::Lossless,
        EncodeMode::Lossy { .. } => BitstreamFormat::Lossy,
        EncodeMode::Auto => {
            if lossy.quality_percent() >= 100 || has_small_palette(image) {
                BitstreamFormat::Lossless
            } else {
                BitstreamFormat::Lossy
            }
        }
    }
}

/// Encodes one RGBA frame.
pub fn encode_frame(
    image: ImgRef<'_, Rgba<u8>>,
    settings: &FrameSettings,
    stop: Option<&dyn Stop>,
) -> Result<FrameBitstream, CodecError> {
    let (width, height) = (image.width(), image.height());
    let mut lossy_config = settings.lossy;
    if let EncodeMode::Lossy { quality } = settings.mode {
        lossy_config.quality = quality;
    }

    match select_format(settings.mode, &lossy_config, image) {
        BitstreamFormat::Lossless => {
            let argb: Vec<u32> = image.pixels().map(rgba_to_argb).collect();
            let data = lossless::encode(
                &argb,
                u32::try_from(width).unwrap_or(u32::MAX),
                u32::try_from(height).unwrap_or(u32::MAX),
                &settings.lossless,
                stop,
            )?;
            Ok(FrameBitstream {
                format: BitstreamFormat::Lossless,
                data,
                alpha: None,
            })
        }
        BitstreamFormat::Lossy => {
            let data = lossy::encode(image, &lossy_config, stop)?;
            let plane: Vec<u8> = image.pixels().map(|p| p.a).collect();
            let alpha = if is_opaque(&plane) {
                None
            } else {
                Some(encode_alpha(
                    &plane,
                    width,
                    height,
                    lossy_config.alpha_quality,
                    lossy_config.alpha_filter,
                    settings.lossless.effort,
                    stop,
                )?)
            };
            Ok(FrameBitstream {
                format: BitstreamFormat::Lossy,
                data,
                alpha,
            })
        }
    }
}

/// Decodes one frame bitstream to RGBA. `alpha` is the frame's `ALPH`
/// payload and is ignored for lossless frames.
pub fn decode_frame(
    format: BitstreamFormat,
    data: &[u8],
    alpha: Option<&[u8]>,
    config: &DecodeConfig,
    stop: Option<&dyn Stop>,
) -> Result<ImgVec<Rgba<u8>>, CodecError> {
    match format {
        BitstreamFormat::Lossless => {
            let (header, argb) = lossless::decode(data, stop)?;
            let pixels = argb.into_iter().map(argb_to_rgba).collect();
            Ok(ImgVec::new(pixels, header.width as usize, header.height as usize))
        }
        BitstreamFormat::Lossy => {
            let (header, mut image) = lossy::decode(data, config.upsampling, stop)?;
            if let Some(alpha) = alpha {
                let (width, height) = (header.width as usize, header.height as usize);
                let plane = decode_alpha(alpha, width, height, stop)?;
                if plane.len() != image.buf().len() {
                    return Err(BitstreamError::InvalidAlphaHeader.into());
                }
                for (p, a) in image.buf_mut().iter_mut().zip(plane) {
                    p.a = a;
                }
            }
            Ok(image)
        }
    }
}
