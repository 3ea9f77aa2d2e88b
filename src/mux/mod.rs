//! RIFF container: demux, mux and animation.
//!
//! - [`Demuxer`] parses a file at the chunk level and hands out borrowed
//!   frame bitstreams and metadata without decoding pixels.
//! - [`Mux`] assembles a container from encoded frames and metadata.
//! - [`AnimationEncoder`] and [`AnimationDecoder`] turn full-canvas RGBA
//!   frames into an animated file and back.

mod anim;
mod anim_decode;
mod assemble;
mod demux;
mod error;
mod riff;

pub use anim::AnimationEncoder;
pub use anim_decode::{AnimFrame, AnimationDecoder, AnimationInfo, LoopMode};
pub use assemble::{Mux, MuxFrame};
pub use demux::{ChunkRef, DemuxFrame, DemuxState, Demuxer};
pub use error::MuxError;

use crate::pixel::Rgba;

/// What happens to a frame's rectangle after it has been shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisposeMethod {
    /// Leave the canvas as it is.
    #[default]
    None,
    /// Clear the rectangle to the background color.
    Background,
}

/// How a frame is combined with the canvas below it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlendMethod {
    /// Non-premultiplied alpha blending.
    #[default]
    AlphaBlend,
    /// Overwrite the rectangle.
    NoBlend,
}

/// Global animation parameters from the `ANIM` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationParams {
    /// Suggested background. Decoders may ignore it.
    pub background: Rgba<u8>,
    /// Number of loops, 0 meaning forever.
    pub loop_count: u16,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            background: Rgba::new(0, 0, 0, 0),
            loop_count: 0,
        }
    }
}

impl AnimationParams {
    /// Parses the six-byte `ANIM` payload. The color is stored as B, G, R, A.
    pub(crate) fn from_payload(payload: &[u8]) -> Option<Self> {
        let p = payload.get(..crate::format::ANIM_CHUNK_SIZE)?;
        Some(Self {
            background: Rgba::new(p[2], p[1], p[0], p[3]),
            loop_count: u16::from_le_bytes([p[4], p[5]]),
        })
    }

    pub(crate) fn to_payload(self) -> [u8; 6] {
        let c = self.background;
        let [lo, hi] = self.loop_count.to_le_bytes();
        [c.b, c.g, c.r, c.a, lo, hi]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anim_payload_is_bgra() {
        let params = AnimationParams {
            background: Rgba::new(1, 2, 3, 4),
            loop_count: 0x0102,
        };
        let payload = params.to_payload();
        assert_eq!(payload, [3, 2, 1, 4, 2, 1]);
        assert_eq!(AnimationParams::from_payload(&payload), Some(params));
        assert_eq!(AnimationParams::from_payload(&payload[..5]), None);
    }
}
