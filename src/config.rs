//! Encoder and decoder configuration.
//!
//! [`LossyConfig`], [`LosslessConfig`] and [`DecodeConfig`] hold the knobs of
//! each bitstream. The [`CodecConfig`] struct bundles optional overrides into
//! a single value that can be passed to encode/decode requests.

use alloc::boxed::Box;

/// Chroma resolution of the lossy bitstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Subsampling {
    /// Full-resolution chroma.
    Yuv444,
    /// Chroma halved in both directions.
    #[default]
    Yuv420,
}

/// How the decoder restores 4:2:0 chroma.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Upsampling {
    /// Replicate each chroma sample over its 2×2 block.
    Nearest,
    /// Weighted 9:3:3:1 interpolation between the nearest four samples.
    #[default]
    Bilinear,
}

/// Prediction filter for `ALPH` planes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum AlphaFilter {
    None,
    Horizontal,
    Vertical,
    Gradient,
    /// Try every filter and keep the one with the smallest residuals.
    #[default]
    Auto,
}

/// Lossy bitstream settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct LossyConfig {
    /// Quality 0-100; higher keeps more detail.
    pub quality: f32,
    pub subsampling: Subsampling,
    /// Alpha plane quality 0-100. Below 100, alpha levels are reduced.
    pub alpha_quality: u8,
    pub alpha_filter: AlphaFilter,
}

impl Default for LossyConfig {
    fn default() -> Self {
        Self {
            quality: 75.0,
            subsampling: Subsampling::Yuv420,
            alpha_quality: 100,
            alpha_filter: AlphaFilter::Auto,
        }
    }
}

impl LossyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_subsampling(mut self, subsampling: Subsampling) -> Self {
        self.subsampling = subsampling;
        self
    }

    pub fn with_alpha_quality(mut self, quality: u8) -> Self {
        self.alpha_quality = quality.min(100);
        self
    }

    pub fn with_alpha_filter(mut self, filter: AlphaFilter) -> Self {
        self.alpha_filter = filter;
        self
    }

    /// Quality as a whole number in `0..=100`. NaN maps to 0.
    pub(crate) fn quality_percent(&self) -> u8 {
        if self.quality.is_nan() { 0 } else { self.quality.clamp(0.0, 100.0) as u8 }
    }
}

/// Lossless bitstream settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct LosslessConfig {
    /// Compression effort 0-10. Higher is slower and smaller.
    pub effort: u8,
    /// Color cache size in bits (0-11). `None` picks it by cost estimate.
    pub cache_bits: Option<u8>,
    /// Keep the RGB values of fully transparent pixels.
    pub exact: bool,
}

impl Default for LosslessConfig {
    fn default() -> Self {
        Self {
            effort: 6,
            cache_bits: None,
            exact: false,
        }
    }
}

impl LosslessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_effort(mut self, effort: u8) -> Self {
        self.effort = effort.min(10);
        self
    }

    pub fn with_cache_bits(mut self, bits: Option<u8>) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct DecodeConfig {
    pub upsampling: Upsampling,
    /// Composite animations over the container's background color instead
    /// of transparent black.
    pub use_background_color: bool,
}

impl DecodeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_upsampling(mut self, upsampling: Upsampling) -> Self {
        self.upsampling = upsampling;
        self
    }

    pub fn with_background_color(mut self, enabled: bool) -> Self {
        self.use_background_color = enabled;
        self
    }
}

/// Bitstream-specific configuration overrides.
///
/// When a config is `Some`, it is used instead of the settings derived from
/// the generic quality/effort parameters on `EncodeRequest`/`DecodeRequest`.
///
/// # Example
///
/// ```
/// use zenloop::{CodecConfig, EncodeRequest, LossyConfig, Subsampling};
///
/// let lossy = LossyConfig::new().with_quality(92.0).with_subsampling(Subsampling::Yuv444);
/// let config = CodecConfig::default().with_lossy(lossy);
/// let request = EncodeRequest::lossy(92.0).with_codec_config(&config);
/// # let _ = request;
/// ```
#[derive(Default, Clone)]
#[non_exhaustive]
pub struct CodecConfig {
    /// Lossy encoder configuration (overrides quality).
    pub lossy: Option<Box<LossyConfig>>,
    /// Lossless encoder configuration (overrides effort).
    pub lossless: Option<Box<LosslessConfig>>,
    /// Decoder configuration.
    pub decoder: Option<Box<DecodeConfig>>,
}

impl CodecConfig {
    /// Set lossy encoder configuration.
    pub fn with_lossy(mut self, config: LossyConfig) -> Self {
        self.lossy = Some(Box::new(config));
        self
    }

    /// Set lossless encoder configuration.
    pub fn with_lossless(mut self, config: LosslessConfig) -> Self {
        self.lossless = Some(Box::new(config));
        self
    }

    /// Set decoder configuration (upsampling, background handling).
    pub fn with_decoder(mut self, config: DecodeConfig) -> Self {
        self.decoder = Some(Box::new(config));
        self
    }
}

impl core::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("lossy", &self.lossy.is_some())
            .field("lossless", &self.lossless.is_some())
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}
