//! Unified error types for codec operations.

use alloc::string::String;

use crate::format::BitstreamFormat;
use crate::mux::MuxError;

/// Unified error type for codec operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Input does not start with a `RIFF....WEBP` header.
    #[error("unrecognized image format")]
    UnrecognizedFormat,
    /// Bitstream recognized but not enabled in the registry.
    #[error("bitstream format {0:?} is disabled in the codec registry")]
    DisabledFormat(BitstreamFormat),
    /// Operation not supported for this input or configuration.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    /// Input validation failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    /// Operation cancelled via Stop token.
    #[error("operation cancelled")]
    Cancelled,
    /// Malformed or truncated frame bitstream.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitstreamError),
    /// Malformed container or invalid mux request.
    #[error("container error: {0}")]
    Container(#[from] MuxError),
}

/// Errors raised while reading or writing a frame bitstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BitstreamError {
    /// Ran out of input bits.
    #[error("unexpected end of bitstream")]
    UnexpectedEof,
    /// Signature byte or version field did not match.
    #[error("invalid bitstream signature")]
    InvalidSignature,
    /// Header field out of range.
    #[error("invalid header: {0}")]
    InvalidHeader(&'static str),
    /// Prefix code lengths are incomplete or over-subscribed.
    #[error("invalid prefix code")]
    InvalidPrefixCode,
    /// Transform appears twice or carries bad parameters.
    #[error("invalid transform: {0}")]
    InvalidTransform(&'static str),
    /// Color cache bit count outside 1..=11.
    #[error("invalid color cache size: {0} bits")]
    InvalidColorCacheBits(u32),
    /// Backward reference points before the start of the image.
    #[error("backward reference out of bounds")]
    InvalidBackwardReference,
    /// Coefficient or symbol outside the legal range.
    #[error("invalid coefficient data")]
    InvalidCoefficients,
    /// Alpha chunk header is malformed.
    #[error("invalid alpha header")]
    InvalidAlphaHeader,
    /// Image too large for the bitstream's 14-bit size fields.
    #[error("dimensions {width}x{height} out of range")]
    InvalidDimensions { width: u32, height: u32 },
}

/// Polls an optional stop token. Codecs call this once per row, block row
/// or frame.
#[inline]
pub(crate) fn check_stop(stop: Option<&dyn crate::Stop>) -> Result<(), CodecError> {
    match stop {
        Some(stop) => stop.check().map_err(|_| CodecError::Cancelled),
        None => Ok(()),
    }
}

/// Token that is always cancelled.
#[cfg(test)]
pub(crate) struct Cancel;

#[cfg(test)]
impl crate::Stop for Cancel {
    fn check(&self) -> Result<(), crate::StopReason> {
        Err(crate::StopReason::Cancelled)
    }
}
