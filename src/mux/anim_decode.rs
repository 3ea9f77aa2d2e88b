//! Animation playback: frame compositing onto a canvas.

use super::{BlendMethod, DemuxFrame, Demuxer, DisposeMethod, MuxError};
use crate::config::DecodeConfig;
use crate::error::{CodecError, check_stop};
use crate::frame::decode_frame;
use crate::pixel::{ImgVec, Rgba};
use crate::{Limits, Stop};

/// How often an animation repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopMode {
    Infinite,
    Once,
    /// Play this many times in total.
    Repeat(u16),
}

impl LoopMode {
    /// Maps the `ANIM` loop count, where 0 means forever.
    pub fn from_loop_count(count: u16) -> Self {
        match count {
            0 => LoopMode::Infinite,
            1 => LoopMode::Once,
            n => LoopMode::Repeat(n),
        }
    }

    pub fn loop_count(self) -> u16 {
        match self {
            LoopMode::Infinite => 0,
            LoopMode::Once => 1,
            LoopMode::Repeat(n) => n,
        }
    }
}

/// Global facts about an animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationInfo {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub frame_count: usize,
    pub loop_mode: LoopMode,
    pub background: Rgba<u8>,
    pub total_duration_ms: u64,
    pub has_alpha: bool,
}

/// A fully composited canvas.
#[derive(Debug, Clone)]
pub struct AnimFrame {
    pub image: ImgVec<Rgba<u8>>,
    pub index: usize,
    /// Time at which this frame is shown.
    pub timestamp_ms: u64,
    pub duration_ms: u32,
}

/// Decodes and composites the frames of a container in display order.
///
/// Still images play as a single frame.
pub struct AnimationDecoder<'a> {
    demuxer: Demuxer<'a>,
    config: DecodeConfig,
    stop: Option<&'a dyn Stop>,
    canvas: Option<ImgVec<Rgba<u8>>>,
    next_index: usize,
    timestamp_ms: u64,
    /// Rectangle of the previous frame, to clear before the next one.
    dispose_rect: Option<(usize, usize, usize, usize)>,
}

/// Non-premultiplied "source over" for one pixel.
fn blend(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    match src.a {
        0 => return dst,
        255 => return src,
        _ => {}
    }
    let src_a = u32::from(src.a);
    let dst_factor = (u32::from(dst.a) * (256 - src_a)) >> 8;
    let out_a = src_a + dst_factor;
    let scale = (1u32 << 24) / out_a;
    let channel =
        |s: u8, d: u8| (((u32::from(s) * src_a + u32::from(d) * dst_factor) * scale) >> 24) as u8;
    Rgba::new(channel(src.r, dst.r), channel(src.g, dst.g), channel(src.b, dst.b), out_a as u8)
}

fn fill(
    canvas: &mut ImgVec<Rgba<u8>>,
    (x, y, w, h): (usize, usize, usize, usize),
    color: Rgba<u8>,
) {
    for row in canvas.rows_mut().skip(y).take(h) {
        for p in row.iter_mut().skip(x).take(w) {
            *p = color;
        }
    }
}

impl<'a> AnimationDecoder<'a> {
    /// Parses `data` and checks the canvas and frame count against `limits`.
    pub fn new(data: &'a [u8], limits: &Limits) -> Result<Self, CodecError> {
        let demuxer = Demuxer::new(data)?;
        limits.validate(demuxer.canvas_width(), demuxer.canvas_height(), 4)?;
        let frames = u32::try_from(demuxer.frame_count()).unwrap_or(u32::MAX);
        limits.check_frames(frames).map_err(CodecError::LimitExceeded)?;
        Ok(Self::from_demuxer(demuxer))
    }

    /// Wraps an already validated demuxer.
    pub(crate) fn from_demuxer(demuxer: Demuxer<'a>) -> Self {
        Self {
            demuxer,
            config: DecodeConfig::default(),
            stop: None,
            canvas: None,
            next_index: 0,
            timestamp_ms: 0,
            dispose_rect: None,
        }
    }

    pub fn with_config(mut self, config: DecodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_stop(mut self, stop: &'a dyn Stop) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn demuxer(&self) -> &Demuxer<'a> {
        &self.demuxer
    }

    pub fn info(&self) -> AnimationInfo {
        let demux = &self.demuxer;
        AnimationInfo {
            canvas_width: demux.canvas_width(),
            canvas_height: demux.canvas_height(),
            frame_count: demux.frame_count(),
            loop_mode: LoopMode::from_loop_count(demux.loop_count()),
            background: demux.background(),
            total_duration_ms: demux.total_duration_ms(),
            has_alpha: demux.features().has_alpha() || demux.frames().iter().any(|f| f.has_alpha),
        }
    }

    pub fn has_more_frames(&self) -> bool {
        self.next_index < self.demuxer.frame_count()
    }

    /// Rewinds to the first frame.
    pub fn reset(&mut self) {
        self.canvas = None;
        self.next_index = 0;
        self.timestamp_ms = 0;
        self.dispose_rect = None;
    }

    fn background_fill(&self) -> Rgba<u8> {
        if self.config.use_background_color {
            self.demuxer.background()
        } else {
            Rgba::new(0, 0, 0, 0)
        }
    }

    /// Decodes the next frame, or `None` after the last one.
    pub fn next_frame(&mut self) -> Result<Option<AnimFrame>, CodecError> {
        let Some(frame) = self.demuxer.frame(self.next_index).copied() else {
            return Ok(None);
        };
        check_stop(self.stop)?;
        let background = self.background_fill();
        let width = self.demuxer.canvas_width() as usize;
        let height = self.demuxer.canvas_height() as usize;
        let dispose_rect = self.dispose_rect.take();
        let canvas = self
            .canvas
            .get_or_insert_with(|| {
                ImgVec::new(alloc::vec![background; width * height], width, height)
            });
        if let Some(rect) = dispose_rect {
            fill(canvas, rect, background);
        }

        let pixels =
            decode_frame(frame.format, frame.bitstream, frame.alpha, &self.config, self.stop)?;
        composite(canvas, &frame, &pixels)?;

        let rect = (
            frame.x_offset as usize,
            frame.y_offset as usize,
            frame.width as usize,
            frame.height as usize,
        );
        if frame.dispose == DisposeMethod::Background {
            self.dispose_rect = Some(rect);
        }
        let out = AnimFrame {
            image: canvas.clone(),
            index: self.next_index,
            timestamp_ms: self.timestamp_ms,
            duration_ms: frame.display_duration_ms(),
        };
        self.next_index += 1;
        self.timestamp_ms += u64::from(frame.display_duration_ms());
        Ok(Some(out))
    }

    /// Composited canvas of frame `index`, replaying from the start when
    /// seeking backwards.
    ///
    /// `index` wraps around the frame count, so a looping player can pass
    /// its running frame counter.
    pub fn frame_at(&mut self, index: usize) -> Result<AnimFrame, CodecError> {
        let count = self.demuxer.frame_count();
        if count == 0 {
            return Err(MuxError::FrameIndex(index).into());
        }
        let index = index % count;
        if index < self.next_index {
            self.reset();
        }
        loop {
            match self.next_frame()? {
                Some(frame) if frame.index == index => return Ok(frame),
                Some(_) => {}
                None => return Err(MuxError::FrameIndex(index).into()),
            }
        }
    }
}

fn composite(
    canvas: &mut ImgVec<Rgba<u8>>,
    frame: &DemuxFrame<'_>,
    pixels: &ImgVec<Rgba<u8>>,
) -> Result<(), MuxError> {
    if (pixels.width(), pixels.height()) != (frame.width as usize, frame.height as usize) {
        return Err(MuxError::FrameSizeMismatch { index: frame.index });
    }
    let (x, y) = (frame.x_offset as usize, frame.y_offset as usize);
    for (dst_row, src_row) in canvas.rows_mut().skip(y).zip(pixels.rows()) {
        let Some(dst_row) = dst_row.get_mut(x..x + src_row.len()) else {
            return Err(MuxError::FrameOutOfBounds { index: frame.index });
        };
        match frame.blend {
            BlendMethod::NoBlend => dst_row.copy_from_slice(src_row),
            BlendMethod::AlphaBlend => {
                for (d, &s) in dst_row.iter_mut().zip(src_row) {
                    *d = blend(s, *d);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::EncodeMode;
    use crate::frame::{FrameSettings, encode_frame};
    use crate::mux::{AnimationParams, Mux, MuxFrame};
    use alloc::vec;
    use alloc::vec::Vec;

    fn lossless_frame(
        width: usize,
        height: usize,
        color: Rgba<u8>,
    ) -> crate::frame::FrameBitstream {
        let image = ImgVec::new(vec![color; width * height], width, height);
        let settings = FrameSettings {
            mode: EncodeMode::Lossless,
            ..FrameSettings::default()
        };
        encode_frame(image.as_ref(), &settings, None).unwrap()
    }

    fn two_frame_file() -> Vec<u8> {
        let mut mux = Mux::new();
        mux.set_animation(AnimationParams {
            background: Rgba::new(9, 9, 9, 255),
            loop_count: 4,
        });
        mux.push_frame(
            MuxFrame::new(lossless_frame(4, 4, Rgba::new(200, 0, 0, 255))).with_duration(30),
        );
        mux.push_frame(
            MuxFrame::new(lossless_frame(2, 2, Rgba::new(0, 0, 200, 128)))
                .with_offset(2, 2)
                .with_duration(70)
                .with_dispose(DisposeMethod::Background),
        );
        mux.push_frame(
            MuxFrame::new(lossless_frame(2, 2, Rgba::new(0, 0, 0, 0))).with_duration(10),
        );
        mux.assemble().unwrap()
    }

    #[test]
    fn blend_math() {
        let opaque = Rgba::new(10, 20, 30, 255);
        assert_eq!(blend(opaque, Rgba::new(1, 2, 3, 4)), opaque);
        let under = Rgba::new(100, 100, 100, 255);
        assert_eq!(blend(Rgba::new(0, 0, 0, 0), under), under);
        let half = blend(Rgba::new(200, 0, 0, 128), Rgba::new(0, 0, 200, 255));
        assert_eq!(half.a, 255);
        assert!(half.r.abs_diff(100) <= 2 && half.b.abs_diff(100) <= 2);
    }

    #[test]
    fn composites_and_disposes() {
        let data = two_frame_file();
        let mut decoder = AnimationDecoder::new(&data, &Limits::none()).unwrap();
        let info = decoder.info();
        assert_eq!(info.loop_mode, LoopMode::Repeat(4));
        assert_eq!(info.total_duration_ms, 110);
        assert_eq!(info.frame_count, 3);

        let first = decoder.next_frame().unwrap().unwrap();
        assert!(first.image.pixels().all(|p| p == Rgba::new(200, 0, 0, 255)));

        let second = decoder.next_frame().unwrap().unwrap();
        assert_eq!(second.timestamp_ms, 30);
        let blended = second.image.buf()[3 * 4 + 3];
        assert_eq!(blended.a, 255);
        assert!(blended.b > 90 && blended.r > 90);
        assert_eq!(second.image.buf()[0], Rgba::new(200, 0, 0, 255));

        // Disposal clears the second frame's rectangle to transparent.
        let third = decoder.next_frame().unwrap().unwrap();
        assert_eq!(third.image.buf()[3 * 4 + 3], Rgba::new(0, 0, 0, 0));
        assert!(decoder.next_frame().unwrap().is_none());
        assert!(!decoder.has_more_frames());
    }

    #[test]
    fn background_color_option() {
        let data = two_frame_file();
        let config = DecodeConfig::new().with_background_color(true);
        let mut decoder = AnimationDecoder::new(&data, &Limits::none())
            .unwrap()
            .with_config(config);
        let third = decoder.frame_at(2).unwrap();
        assert_eq!(third.image.buf()[3 * 4 + 3], Rgba::new(9, 9, 9, 255));
    }

    #[test]
    fn random_access_replays() {
        let data = two_frame_file();
        let mut decoder = AnimationDecoder::new(&data, &Limits::none()).unwrap();
        let late = decoder.frame_at(1).unwrap();
        let early = decoder.frame_at(0).unwrap();
        assert_eq!(early.index, 0);
        assert_eq!(decoder.frame_at(1).unwrap().image.buf(), late.image.buf());
        let wrapped = decoder.frame_at(4).unwrap();
        assert_eq!(wrapped.index, 1);
        assert_eq!(wrapped.image.buf(), late.image.buf());
    }

    #[test]
    fn limits_are_checked() {
        let data = two_frame_file();
        let limits = Limits {
            max_frames: Some(2),
            ..Limits::default()
        };
        assert!(matches!(AnimationDecoder::new(&data, &limits), Err(CodecError::LimitExceeded(_))));
    }

    #[test]
    fn loop_mode_mapping() {
        assert_eq!(LoopMode::from_loop_count(0), LoopMode::Infinite);
        assert_eq!(LoopMode::from_loop_count(1), LoopMode::Once);
        assert_eq!(LoopMode::Repeat(7).loop_count(), 7);
    }
}
