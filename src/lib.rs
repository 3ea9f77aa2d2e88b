//! # zenloop
//!
//! Still and animated images in a RIFF container: a VP8L-compatible
//! lossless bitstream, a block-DCT lossy bitstream with a separate alpha
//! plane, and a muxer/demuxer for the simple and extended layouts.
//!
//! Every public item is re-exported at the crate root.
//!
//! ## Usage
//!
//! ```rust
//! use zenloop::pixel::{ImgVec, Rgba};
//! use zenloop::{DecodeRequest, EncodeRequest, PixelLayout};
//!
//! let image = ImgVec::new(vec![Rgba::new(200u8, 40, 40, 255); 64], 8, 8);
//! let encoded = EncodeRequest::lossless().encode_rgba8(image.as_ref())?;
//!
//! let decoded = DecodeRequest::new(&encoded.data)
//!     .with_output_layout(PixelLayout::Rgba8)
//!     .decode()?;
//! assert_eq!(decoded.pixels.to_rgba8().buf(), image.buf());
//! # Ok::<(), zenloop::CodecError>(())
//! ```
//!
//! Animations are written with [`AnimationEncoder`] and played back with
//! [`AnimationDecoder`]. [`Mux`] and [`Demuxer`] work on the chunk level.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod alpha;
pub mod bitstream;
mod config;
mod decode;
mod encode;
pub mod entropy;
mod error;
pub mod format;
mod frame;
mod info;
mod limits;
mod lossless;
mod lossy;
pub mod mux;
pub mod pixel;
mod preset;
mod probe;
mod registry;

use core::ffi::CStr;

pub use bitstream::{BitReader, BitWriter};
pub use config::{
    AlphaFilter, CodecConfig, DecodeConfig, LosslessConfig, LossyConfig, Subsampling, Upsampling,
};
pub use decode::{DecodeOutput, DecodeRequest};
pub use encode::{EncodeMode, EncodeOutput, EncodeRequest};
pub use enough::{Stop, StopReason, Unstoppable};
pub use entropy::{HuffmanCode, HuffmanTree, build_code_lengths, canonical_codes};
pub use error::{BitstreamError, CodecError};
pub use format::*;
pub use frame::{
    FrameBitstream, FrameHeader, FrameSettings, bitstream_header, decode_frame, encode_frame,
};
pub use info::{ImageInfo, from_bytes, from_bytes_with_registry, probe, probe_with_registry};
pub use limits::{ImageMetadata, Limits};
pub use mux::{
    AnimFrame, AnimationDecoder, AnimationEncoder, AnimationInfo, AnimationParams, BlendMethod,
    ChunkRef, DemuxFrame, DemuxState, Demuxer, DisposeMethod, LoopMode, Mux, MuxError, MuxFrame,
};
pub use pixel::{PixelData, PixelLayout};
pub use preset::QualityPreset;
pub use probe::ProbeResult;
pub use registry::CodecRegistry;

/// Crate version, e.g. `"0.1.0"`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// `major.minor` of [`VERSION`] as a number.
pub const VERSION_NUMBER: f64 = 0.1;

/// [`VERSION`] as a null-terminated string.
pub const VERSION_STRING: &CStr = c"0.1.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_constants_agree() {
        assert!(VERSION_NUMBER.is_finite());
        let mut parts = VERSION.split('.');
        let major: f64 = parts.next().unwrap().parse().unwrap();
        let minor: f64 = parts.next().unwrap().parse().unwrap();
        assert_eq!(VERSION_NUMBER, major + minor / 10.0);
        assert_eq!(VERSION_STRING.to_str().unwrap(), VERSION);
        assert_eq!(VERSION_STRING.to_bytes_with_nul().last(), Some(&0));
    }

    #[test]
    fn root_reexports_are_module_items() {
        assert_eq!(MIME_TYPE, format::MIME_TYPE);
        assert_eq!(FourCc::VP8L, format::FourCc::VP8L);
        let _: mux::Mux = Mux::new();
        let _: pixel::PixelLayout = PixelLayout::default();
    }
}
