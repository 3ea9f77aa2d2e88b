use crate::error::BitstreamError;
use crate::format::FourCc;

/// Errors raised while parsing or assembling a container.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum MuxError {
    /// Missing `RIFF....WEBP` header.
    #[error("not a RIFF/WEBP container")]
    NotRiff,
    /// Data ends before the sizes in the headers say it should.
    #[error("truncated container")]
    Truncated,
    #[error("invalid size for {0} chunk")]
    InvalidChunkSize(FourCc),
    /// Chunk present where the layout does not allow it.
    #[error("unexpected {0} chunk")]
    UnexpectedChunk(FourCc),
    #[error("duplicate {0} chunk")]
    DuplicateChunk(FourCc),
    #[error("missing {0} chunk")]
    MissingChunk(FourCc),
    #[error("container holds no image")]
    NoImage,
    /// `VP8X` flags disagree with the chunks present.
    #[error("feature flags disagree with chunks: {0}")]
    FlagMismatch(&'static str),
    #[error("canvas {width}x{height} out of range")]
    InvalidCanvas { width: u32, height: u32 },
    #[error("frame {index} lies outside the canvas")]
    FrameOutOfBounds { index: usize },
    /// Declared frame size differs from the bitstream header.
    #[error("frame {index} size does not match its bitstream")]
    FrameSizeMismatch { index: usize },
    #[error("frame {index} has an odd offset")]
    OddOffset { index: usize },
    #[error("a still image and animation frames cannot be combined")]
    ImageAndFrames,
    #[error("value out of range: {0}")]
    OutOfRange(&'static str),
    #[error("timestamps must increase")]
    NonIncreasingTimestamp,
    #[error("frame index {0} out of range")]
    FrameIndex(usize),
    /// A frame bitstream header could not be read.
    #[error("invalid frame bitstream: {0}")]
    Bitstream(#[from] BitstreamError),
}
