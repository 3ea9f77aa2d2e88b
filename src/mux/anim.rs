//! Frame-by-frame animation encoding.

use alloc::vec::Vec;

use super::{AnimationParams, BlendMethod, DisposeMethod, Mux, MuxError, MuxFrame};
use crate::error::{CodecError, check_stop};
use crate::format::{MAX_CANVAS_DIMENSION, MAX_DURATION_MS};
use crate::frame::{FrameSettings, encode_frame};
use crate::limits::ImageMetadata;
use crate::pixel::{ImgRef, ImgVec, Rgba};
use crate::{Limits, Stop};

/// Encodes full-canvas RGBA frames into an animated container.
///
/// Each frame is compared with the previous one and only the changed
/// rectangle is stored, snapped to even offsets. Frames are written without
/// blending or disposal so every stored rectangle replaces what was there.
/// A frame identical to its predecessor extends the previous duration.
///
/// ```
/// use zenloop::pixel::{ImgVec, Rgba};
/// use zenloop::{AnimationEncoder, Demuxer, FrameSettings};
///
/// let red = ImgVec::new(vec![Rgba::new(255u8, 0, 0, 255); 16], 4, 4);
/// let blue = ImgVec::new(vec![Rgba::new(0u8, 0, 255, 255); 16], 4, 4);
/// let mut encoder = AnimationEncoder::new(4, 4, FrameSettings::default())?;
/// encoder.add_frame(red.as_ref(), 0)?;
/// encoder.add_frame(blue.as_ref(), 100)?;
/// let file = encoder.finish(250)?;
/// assert_eq!(Demuxer::new(&file)?.frame_count(), 2);
/// # Ok::<(), zenloop::CodecError>(())
/// ```
pub struct AnimationEncoder<'a> {
    width: usize,
    height: usize,
    settings: FrameSettings,
    mux: Mux,
    limits: Option<&'a Limits>,
    stop: Option<&'a dyn Stop>,
    previous: Option<ImgVec<Rgba<u8>>>,
    /// Last encoded frame and its start time; its duration is known once
    /// the next distinct frame (or the end time) arrives.
    pending: Option<(MuxFrame, u64)>,
    last_timestamp: Option<u64>,
    frame_count: u32,
}

/// Smallest rectangle holding every differing pixel, as `(x, y, w, h)`.
fn changed_rect(
    previous: ImgRef<'_, Rgba<u8>>,
    current: ImgRef<'_, Rgba<u8>>,
) -> Option<(usize, usize, usize, usize)> {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
    for (y, (a, b)) in previous.rows().zip(current.rows()).enumerate() {
        let Some(first) = a.iter().zip(b).position(|(p, q)| p != q) else {
            continue;
        };
        let last = a.iter().zip(b).rposition(|(p, q)| p != q).unwrap_or(first);
        min_x = min_x.min(first);
        max_x = max_x.max(last);
        min_y = min_y.min(y);
        max_y = y;
    }
    if min_y == usize::MAX {
        return None;
    }
    let (x, y) = (min_x & !1, min_y & !1);
    Some((x, y, max_x + 1 - x, max_y + 1 - y))
}

impl<'a> AnimationEncoder<'a> {
    /// Starts an animation on a `width × height` canvas.
    pub fn new(width: u32, height: u32, settings: FrameSettings) -> Result<Self, CodecError> {
        let in_range = |v: u32| (1..=MAX_CANVAS_DIMENSION).contains(&v);
        if !in_range(width) || !in_range(height) {
            return Err(MuxError::InvalidCanvas { width, height }.into());
        }
        let mut mux = Mux::new();
        mux.set_canvas_size(width, height)?;
        mux.set_animation(AnimationParams::default());
        Ok(Self {
            width: width as usize,
            height: height as usize,
            settings,
            mux,
            limits: None,
            stop: None,
            previous: None,
            pending: None,
            last_timestamp: None,
            frame_count: 0,
        })
    }

    pub fn with_animation(mut self, params: AnimationParams) -> Self {
        self.mux.set_animation(params);
        self
    }

    /// Copies ICC, EXIF and XMP blocks into the output.
    pub fn with_metadata(mut self, metadata: &ImageMetadata<'_>) -> Self {
        if let Some(icc) = metadata.icc_profile {
            self.mux.set_icc_profile(icc.to_vec());
        }
        if let Some(exif) = metadata.exif {
            self.mux.set_exif(exif.to_vec());
        }
        if let Some(xmp) = metadata.xmp {
            self.mux.set_xmp(xmp.to_vec());
        }
        self
    }

    /// Frame count and canvas limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Adds a frame shown from `timestamp_ms` on. Timestamps must increase.
    pub fn add_frame(
        &mut self,
        image: ImgRef<'_, Rgba<u8>>,
        timestamp_ms: u64,
    ) -> Result<(), CodecError> {
        check_stop(self.stop)?;
        if (image.width(), image.height()) != (self.width, self.height) {
            return Err(CodecError::InvalidInput("frame size differs from the canvas".into()));
        }
        if self.last_timestamp.is_some_and(|last| timestamp_ms <= last) {
            return Err(MuxError::NonIncreasingTimestamp.into());
        }
        if let Some(limits) = self.limits {
            limits.validate(self.width as u32, self.height as u32, 4)?;
        }
        self.last_timestamp = Some(timestamp_ms);

        let rect = match &self.previous {
            None => Some((0, 0, self.width, self.height)),
            Some(previous) => changed_rect(previous.as_ref(), image),
        };
        let Some((x, y, w, h)) = rect else {
            return Ok(());
        };

        self.frame_count += 1;
        if let Some(limits) = self.limits {
            limits.check_frames(self.frame_count).map_err(CodecError::LimitExceeded)?;
        }
        let bitstream = encode_frame(image.sub_image(x, y, w, h), &self.settings, self.stop)?;
        let frame = MuxFrame::new(bitstream)
            .with_offset(x as u32, y as u32)
            .with_dispose(DisposeMethod::None)
            .with_blend(BlendMethod::NoBlend);
        self.flush(timestamp_ms)?;
        self.pending = Some((frame, timestamp_ms));
        let pixels: Vec<_> = image.pixels().collect();
        self.previous = Some(ImgVec::new(pixels, self.width, self.height));
        Ok(())
    }

    fn flush(&mut self, end_ms: u64) -> Result<(), MuxError> {
        if let Some((frame, start)) = self.pending.take() {
            let duration = u32::try_from(end_ms - start)
                .ok()
                .filter(|&d| d <= MAX_DURATION_MS)
                .ok_or(MuxError::OutOfRange("frame duration"))?;
            self.mux.push_frame(frame.with_duration(duration));
        }
        Ok(())
    }

    /// Ends the animation at `end_timestamp_ms` and returns the file.
    pub fn finish(mut self, end_timestamp_ms: u64) -> Result<Vec<u8>, CodecError> {
        match self.last_timestamp {
            None => return Err(MuxError::NoImage.into()),
            Some(last) if end_timestamp_ms <= last => {
                return Err(MuxError::NonIncreasingTimestamp.into());
            }
            Some(_) => {}
        }
        self.flush(end_timestamp_ms)?;
        Ok(self.mux.assemble()?)
    }
}
