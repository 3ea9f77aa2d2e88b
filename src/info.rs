//! Image metadata probing without full decode.

use alloc::vec::Vec;

use crate::format::is_supported;
use crate::mux::Demuxer;
use crate::{BitstreamFormat, CodecError, CodecRegistry, ProbeResult};

/// Facts about a container file, with owned metadata copies.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ImageInfo {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Bitstream of the first frame.
    pub format: BitstreamFormat,
    pub has_alpha: bool,
    pub has_animation: bool,
    pub frame_count: u32,
    /// Animation loop count, 0 meaning forever.
    pub loop_count: u16,
    pub icc_profile: Option<Vec<u8>>,
    pub exif: Option<Vec<u8>>,
    pub xmp: Option<Vec<u8>>,
}

impl ImageInfo {
    /// Parses the container headers of a complete file.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CodecError> {
        from_bytes_with_registry(data, &CodecRegistry::all())
    }

    pub(crate) fn from_demuxer(demux: &Demuxer<'_>) -> Result<Self, CodecError> {
        let first = demux.frame(0).ok_or(crate::MuxError::NoImage)?;
        Ok(ImageInfo {
            width: demux.canvas_width(),
            height: demux.canvas_height(),
            format: first.format,
            has_alpha: demux.features().has_alpha() || demux.frames().iter().any(|f| f.has_alpha),
            has_animation: demux.is_animated(),
            frame_count: u32::try_from(demux.frame_count()).unwrap_or(u32::MAX),
            loop_count: demux.loop_count(),
            icc_profile: demux.icc_profile().map(<[u8]>::to_vec),
            exif: demux.exif().map(<[u8]>::to_vec),
            xmp: demux.xmp().map(<[u8]>::to_vec),
        })
    }
}

/// Probe partial image data for metadata without decoding pixels.
///
/// Unlike [`from_bytes`], this works with truncated data (e.g., first N bytes
/// from an HTTP range request). Missing facts result in `None` fields
/// rather than an error.
pub fn probe(data: &[u8]) -> Result<ProbeResult, CodecError> {
    if !is_supported(data) {
        return Err(CodecError::UnrecognizedFormat);
    }
    Ok(ProbeResult::from_data(data))
}

/// Probe partial image data with a specific registry.
///
/// Fails when the first frame's bitstream is known and disabled.
pub fn probe_with_registry(
    data: &[u8],
    registry: &CodecRegistry,
) -> Result<ProbeResult, CodecError> {
    let result = probe(data)?;
    match result.format {
        Some(format) if !registry.can_decode(format) => Err(CodecError::DisabledFormat(format)),
        _ => Ok(result),
    }
}

/// Probe image metadata without decoding pixels.
pub fn from_bytes(data: &[u8]) -> Result<ImageInfo, CodecError> {
    ImageInfo::from_bytes(data)
}

/// Probe image metadata with a specific registry.
///
/// Fails when any frame uses a bitstream the registry disables.
pub fn from_bytes_with_registry(
    data: &[u8],
    registry: &CodecRegistry,
) -> Result<ImageInfo, CodecError> {
    if !is_supported(data) {
        return Err(CodecError::UnrecognizedFormat);
    }
    let demux = Demuxer::new(data)?;
    if let Some(frame) = demux.frames().iter().find(|f| !registry.can_decode(f.format)) {
        return Err(CodecError::DisabledFormat(frame.format));
    }
    ImageInfo::from_demuxer(&demux)
}
