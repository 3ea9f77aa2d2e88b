//! Image encoding.

use alloc::vec::Vec;

use crate::config::{CodecConfig, LosslessConfig, LossyConfig};
use crate::frame::{FrameSettings, encode_frame, select_format};
use crate::mux::Mux;
use crate::pixel::{Bgra, ImgRef, ImgVec, PixelLayout, Rgb, Rgba, rgba_from_bytes};
use crate::preset::QualityPreset;
use crate::{BitstreamFormat, CodecError, CodecRegistry, ImageMetadata, Limits, Stop};

/// Which bitstream an encode produces.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum EncodeMode {
    /// Block-DCT lossy coding at `quality` (0-100).
    Lossy { quality: f32 },
    Lossless,
    /// Lossless for images with at most 256 colors or quality 100, lossy
    /// otherwise.
    #[default]
    Auto,
}

/// Encoded image output.
#[derive(Clone, Debug)]
pub struct EncodeOutput {
    /// Complete container file.
    pub data: Vec<u8>,
    /// Bitstream used (useful with [`EncodeMode::Auto`]).
    pub format: BitstreamFormat,
}

/// Image encode request builder.
///
/// # Example
///
/// ```
/// use zenloop::EncodeRequest;
/// use zenloop::pixel::{ImgVec, Rgba};
///
/// let pixels = ImgVec::new(vec![Rgba { r: 0u8, g: 0, b: 0, a: 255 }; 16 * 16], 16, 16);
/// let output = EncodeRequest::lossy(85.0).encode_rgba8(pixels.as_ref())?;
/// assert!(zenloop::is_supported(&output.data));
/// # Ok::<(), zenloop::CodecError>(())
/// ```
pub struct EncodeRequest<'a> {
    mode: EncodeMode,
    quality: Option<f32>,
    effort: Option<u8>,
    limits: Option<&'a Limits>,
    stop: Option<&'a dyn Stop>,
    metadata: Option<&'a ImageMetadata<'a>>,
    registry: Option<&'a CodecRegistry>,
    codec_config: Option<&'a CodecConfig>,
}

impl<'a> EncodeRequest<'a> {
    pub fn new(mode: EncodeMode) -> Self {
        Self {
            mode,
            quality: None,
            effort: None,
            limits: None,
            stop: None,
            metadata: None,
            registry: None,
            codec_config: None,
        }
    }

    /// Lossy encoding at `quality` (0-100).
    pub fn lossy(quality: f32) -> Self {
        Self::new(EncodeMode::Lossy { quality })
    }

    pub fn lossless() -> Self {
        Self::new(EncodeMode::Lossless)
    }

    /// Pick the bitstream from image statistics.
    pub fn auto() -> Self {
        Self::new(EncodeMode::Auto)
    }

    /// Set quality (0-100). Applies to lossy mode and to `Auto` when it
    /// falls back to lossy.
    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = Some(quality);
        if let EncodeMode::Lossy { quality: q } = &mut self.mode {
            *q = quality;
        }
        self
    }

    /// Set lossless compression effort (0-10).
    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = Some(effort);
        self
    }

    /// Request lossless encoding, or drop back to `Auto` when false.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        if lossless {
            self.mode = EncodeMode::Lossless;
        } else if self.mode == EncodeMode::Lossless {
            self.mode = EncodeMode::Auto;
        }
        self
    }

    /// Take mode and quality from a preset.
    pub fn with_preset(mut self, preset: QualityPreset) -> Self {
        self.mode = preset.mode();
        self.quality = preset.quality();
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set a cancellation token.
    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Set metadata to embed in the output.
    pub fn with_metadata(mut self, metadata: &'a ImageMetadata<'a>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Set a codec registry to control which bitstreams are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set bitstream-specific configuration overrides.
    pub fn with_codec_config(mut self, config: &'a CodecConfig) -> Self {
        self.codec_config = Some(config);
        self
    }

    /// Encode RGB8 pixels.
    pub fn encode_rgb8(self, img: ImgRef<'_, Rgb<u8>>) -> Result<EncodeOutput, CodecError> {
        let pixels = img.pixels().map(|p| Rgba::new(p.r, p.g, p.b, 255)).collect();
        let rgba = ImgVec::new(pixels, img.width(), img.height());
        self.encode_rgba8(rgba.as_ref())
    }

    /// Encode BGRA8 pixels.
    pub fn encode_bgra8(self, img: ImgRef<'_, Bgra<u8>>) -> Result<EncodeOutput, CodecError> {
        let pixels = img.pixels().map(|p| Rgba::new(p.r, p.g, p.b, p.a)).collect();
        let rgba = ImgVec::new(pixels, img.width(), img.height());
        self.encode_rgba8(rgba.as_ref())
    }

    /// Encode tightly packed bytes in `layout`.
    pub fn encode(
        self,
        bytes: &[u8],
        layout: PixelLayout,
        width: u32,
        height: u32,
    ) -> Result<EncodeOutput, CodecError> {
        let rgba = rgba_from_bytes(bytes, layout, width as usize, height as usize).ok_or_else(|| {
            CodecError::InvalidInput("pixel buffer is smaller than width × height".into())
        })?;
        self.encode_rgba8(rgba.as_ref())
    }

    /// Encode RGBA8 pixels.
    pub fn encode_rgba8(self, img: ImgRef<'_, Rgba<u8>>) -> Result<EncodeOutput, CodecError> {
        let width = u32::try_from(img.width()).map_err(|_| CodecError::LimitExceeded("width"))?;
        let height = u32::try_from(img.height()).map_err(|_| CodecError::LimitExceeded("height"))?;
        if let Some(limits) = self.limits {
            limits.validate(width, height, 4)?;
        }
        let default_registry = CodecRegistry::all();
        let registry = self.registry.unwrap_or(&default_registry);

        let mut settings = self.frame_settings();
        let format = self.resolve_format(&settings, img, registry)?;
        settings.mode = match format {
            BitstreamFormat::Lossless => EncodeMode::Lossless,
            BitstreamFormat::Lossy => EncodeMode::Lossy {
                quality: settings.lossy.quality,
            },
        };

        let frame = encode_frame(img, &settings, self.stop)?;
        let mut mux = Mux::new();
        mux.set_image(frame);
        if let Some(metadata) = self.metadata {
            if let Some(icc) = metadata.icc_profile {
                mux.set_icc_profile(icc.to_vec());
            }
            if let Some(exif) = metadata.exif {
                mux.set_exif(exif.to_vec());
            }
            if let Some(xmp) = metadata.xmp {
                mux.set_xmp(xmp.to_vec());
            }
        }
        Ok(EncodeOutput {
            data: mux.assemble()?,
            format,
        })
    }

    /// Bitstream configs after applying overrides, quality and effort.
    fn frame_settings(&self) -> FrameSettings {
        let config = self.codec_config;
        let lossy = match config.and_then(|c| c.lossy.as_deref()) {
            Some(lossy) => *lossy,
            None => {
                let quality = match self.mode {
                    EncodeMode::Lossy { quality } => Some(quality),
                    _ => self.quality,
                };
                let base = LossyConfig::new();
                quality.map_or(base, |q| base.with_quality(q))
            }
        };
        let lossless = match config.and_then(|c| c.lossless.as_deref()) {
            Some(lossless) => *lossless,
            None => {
                let base = LosslessConfig::new();
                self.effort.map_or(base, |e| base.with_effort(e))
            }
        };
        FrameSettings {
            mode: self.mode,
            lossy,
            lossless,
        }
    }

    /// Chosen bitstream, honoring the registry. `Auto` falls back to the other
    /// bitstream when its first choice is disabled.
    fn resolve_format(
        &self,
        settings: &FrameSettings,
        img: ImgRef<'_, Rgba<u8>>,
        registry: &CodecRegistry,
    ) -> Result<BitstreamFormat, CodecError> {
        let preferred = select_format(self.mode, &settings.lossy, img);
        if registry.can_encode(preferred) {
            return Ok(preferred);
        }
        if self.mode == EncodeMode::Auto {
            if let Some(other) = registry.encodable_formats().next() {
                return Ok(other);
            }
        }
        Err(CodecError::DisabledFormat(preferred))
    }
}
