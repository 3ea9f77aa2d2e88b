//! Image decoding.

use crate::config::{CodecConfig, DecodeConfig};
use crate::format::is_supported;
use crate::frame::decode_frame;
use crate::mux::{AnimationDecoder, Demuxer, MuxError};
use crate::pixel::{PixelData, PixelLayout};
use crate::{CodecError, CodecRegistry, ImageInfo, Limits, Stop};

/// Decoded image output.
#[derive(Debug)]
pub struct DecodeOutput {
    /// Decoded pixel data in the requested layout.
    pub pixels: PixelData,
    /// Container facts and metadata.
    pub info: ImageInfo,
}

impl DecodeOutput {
    /// Image width in pixels (convenience accessor).
    pub fn width(&self) -> u32 {
        self.pixels.width() as u32
    }

    /// Image height in pixels (convenience accessor).
    pub fn height(&self) -> u32 {
        self.pixels.height() as u32
    }
}

/// Image decode request builder.
///
/// Still images decode their single frame. Animations decode the
/// composited canvas of the selected frame, the first by default.
///
/// # Example
///
/// ```no_run
/// use zenloop::DecodeRequest;
///
/// let data: &[u8] = &[]; // your image bytes
/// let output = DecodeRequest::new(data).decode()?;
/// println!("{}x{}", output.width(), output.height());
/// # Ok::<(), zenloop::CodecError>(())
/// ```
pub struct DecodeRequest<'a> {
    data: &'a [u8],
    limits: Option<&'a Limits>,
    stop: Option<&'a dyn Stop>,
    registry: Option<&'a CodecRegistry>,
    codec_config: Option<&'a CodecConfig>,
    layout: PixelLayout,
    frame_index: usize,
}

impl<'a> DecodeRequest<'a> {
    /// Create a new decode request producing RGBA pixels.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            limits: None,
            stop: None,
            registry: None,
            codec_config: None,
            layout: PixelLayout::Rgba8,
            frame_index: 0,
        }
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

    /// Set a codec registry to control which bitstreams are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set decoder configuration (upsampling, background handling).
    pub fn with_codec_config(mut self, config: &'a CodecConfig) -> Self {
        self.codec_config = Some(config);
        self
    }

    pub fn with_output_layout(mut self, layout: PixelLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Animation frame to decode. The index wraps around the frame count,
    /// and still images always decode their single frame.
    pub fn with_frame_index(mut self, index: usize) -> Self {
        self.frame_index = index;
        self
    }

    /// Decode the image to pixels.
    pub fn decode(self) -> Result<DecodeOutput, CodecError> {
        if !is_supported(self.data) {
            return Err(CodecError::UnrecognizedFormat);
        }
        let default_registry = CodecRegistry::all();
        let registry = self.registry.unwrap_or(&default_registry);
        let default_limits = Limits::none();
        let limits = self.limits.unwrap_or(&default_limits);
        let config = self
            .codec_config
            .and_then(|c| c.decoder.as_deref())
            .copied()
            .unwrap_or_else(DecodeConfig::default);

        let demux = Demuxer::new(self.data)?;
        if let Some(frame) = demux.frames().iter().find(|f| !registry.can_decode(f.format)) {
            return Err(CodecError::DisabledFormat(frame.format));
        }
        limits.validate(demux.canvas_width(), demux.canvas_height(), 4)?;
        let frames = u32::try_from(demux.frame_count()).unwrap_or(u32::MAX);
        limits.check_frames(frames).map_err(CodecError::LimitExceeded)?;
        let info = ImageInfo::from_demuxer(&demux)?;

        let image = if demux.is_animated() {
            let mut decoder = AnimationDecoder::from_demuxer(demux).with_config(config);
            if let Some(stop) = self.stop {
                decoder = decoder.with_stop(stop);
            }
            decoder.frame_at(self.frame_index)?.image
        } else {
            let frame = demux.frame(0).ok_or(MuxError::NoImage)?;
            decode_frame(frame.format, frame.bitstream, frame.alpha, &config, self.stop)?
        };

        Ok(DecodeOutput {
            pixels: PixelData::from_rgba(image, self.layout),
            info,
        })
    }
}
