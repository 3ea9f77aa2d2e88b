//! Partial-data image probing.
//!
//! Extracts bitstream, dimensions, alpha, animation and frame count from a
//! leading slice of a file without requiring the full file. The simple
//! layout needs the first 5 (lossless) or 7 (lossy) bitstream bytes after
//! the 20-byte RIFF and chunk headers; the extended layout needs the 30
//! bytes up to the end of `VP8X`.

use crate::format::BitstreamFormat;
use crate::info::ImageInfo;
use crate::mux::{DemuxState, Demuxer};

/// Result of probing partial image data.
///
/// All fields are `Option`, since partial data may not contain enough
/// bytes for them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct ProbeResult {
    /// Bitstream of the first frame, once its chunk has been seen.
    pub format: Option<BitstreamFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub has_alpha: Option<bool>,
    pub has_animation: Option<bool>,
    /// Number of frames; only known once the whole file is present.
    pub frame_count: Option<u32>,
    /// Number of bytes examined from the input.
    pub bytes_examined: usize,
}

impl ProbeResult {
    /// Convert to `ImageInfo` when format, width and height are present.
    ///
    /// Metadata blocks are not carried over.
    pub fn into_image_info(self) -> Option<ImageInfo> {
        Some(ImageInfo {
            width: self.width?,
            height: self.height?,
            format: self.format?,
            has_alpha: self.has_alpha.unwrap_or(false),
            has_animation: self.has_animation.unwrap_or(false),
            frame_count: self.frame_count.unwrap_or(1),
            loop_count: 0,
            icc_profile: None,
            exif: None,
            xmp: None,
        })
    }

    /// Probe `data`, which must start with a RIFF header.
    pub(crate) fn from_data(data: &[u8]) -> Self {
        let mut result = ProbeResult {
            format: None,
            width: None,
            height: None,
            has_alpha: None,
            has_animation: None,
            frame_count: None,
            bytes_examined: 0,
        };
        let Ok(demux) = Demuxer::new_partial(data) else {
            result.bytes_examined = data.len().min(crate::format::RIFF_HEADER_SIZE);
            return result;
        };
        let done = demux.state() == DemuxState::Done;
        result.bytes_examined = data.len();
        result.width = Some(demux.canvas_width());
        result.height = Some(demux.canvas_height());
        result.format = demux.frame(0).map(|f| f.format);
        if demux.is_extended() {
            let features = demux.features();
            result.has_animation = Some(features.has_animation());
            let any_frame_alpha = demux.frames().iter().any(|f| f.has_alpha);
            result.has_alpha = Some(features.has_alpha() || any_frame_alpha);
        } else {
            result.has_animation = Some(false);
            result.has_alpha = demux.frame(0).map(|f| f.has_alpha);
        }
        if done {
            result.frame_count = u32::try_from(demux.frame_count()).ok();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::probe;
    use crate::pixel::{ImgVec, Rgba};
    use crate::{AnimationEncoder, EncodeRequest, FrameSettings};
    use alloc::vec;

    #[test]
    fn probe_simple_header_only() {
        let img = ImgVec::new(vec![Rgba::new(9u8, 8, 7, 255); 40 * 30], 40, 30);
        let file = EncodeRequest::lossless().encode_rgba8(img.as_ref()).unwrap().data;
        let result = probe(&file[..25]).unwrap();
        assert_eq!((result.width, result.height), (Some(40), Some(30)));
        assert_eq!(result.format, Some(BitstreamFormat::Lossless));
        assert_eq!(result.has_alpha, Some(false));

        let info = probe(&file).unwrap().into_image_info().unwrap();
        assert_eq!((info.width, info.frame_count), (40, 1));
    }

    #[test]
    fn probe_animation_prefix() {
        let a = ImgVec::new(vec![Rgba::new(0u8, 0, 0, 255); 16], 4, 4);
        let b = ImgVec::new(vec![Rgba::new(255u8, 0, 0, 255); 16], 4, 4);
        let mut encoder = AnimationEncoder::new(4, 4, FrameSettings::default()).unwrap();
        encoder.add_frame(a.as_ref(), 0).unwrap();
        encoder.add_frame(b.as_ref(), 10).unwrap();
        let file = encoder.finish(20).unwrap();

        let head = probe(&file[..30]).unwrap();
        assert_eq!((head.width, head.height, head.has_animation), (Some(4), Some(4), Some(true)));
        assert_eq!(head.frame_count, None);
        assert_eq!(probe(&file).unwrap().frame_count, Some(2));
    }

    #[test]
    fn probe_too_short() {
        let result = probe(b"RIFF\x10\x00\x00\x00WEBPVP8").unwrap();
        assert_eq!(result.width, None);
        assert!(result.into_image_info().is_none());
    }
}
