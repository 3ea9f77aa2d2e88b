//! Zero-copy container parsing.

use alloc::vec::Vec;

use super::riff::{RawChunk, le, read_chunk, riff_extent};
use super::{AnimationParams, BlendMethod, DisposeMethod, MuxError};
use crate::format::{
    ANMF_DISPOSE_BACKGROUND, ANMF_HEADER_SIZE, ANMF_NO_BLEND, BitstreamFormat,
    DEFAULT_FRAME_DURATION_MS, FeatureFlags, FourCc, MAX_CANVAS_PIXELS, RIFF_HEADER_SIZE,
    VP8X_CHUNK_SIZE,
};
use crate::frame::read_frame_header;
use crate::pixel::Rgba;

/// How much of the input has been parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemuxState {
    /// Headers are known but the data ends early. Later frames may be missing
    /// and the last one may be incomplete.
    ParsedHeader,
    /// The whole file was parsed.
    Done,
}

/// A top-level chunk, borrowed from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkRef<'a> {
    pub fourcc: FourCc,
    /// File offset of the payload.
    pub offset: usize,
    pub data: &'a [u8],
    /// False when the input ends inside this chunk.
    pub complete: bool,
}

/// One frame of a container, borrowed from the input.
///
/// Still images appear as a single frame at offset (0, 0) with a stored
/// duration of 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemuxFrame<'a> {
    pub index: usize,
    pub x_offset: u32,
    pub y_offset: u32,
    pub width: u32,
    pub height: u32,
    pub duration_ms: u32,
    pub dispose: DisposeMethod,
    pub blend: BlendMethod,
    pub has_alpha: bool,
    pub format: BitstreamFormat,
    /// `VP8L` or `ZDCT` payload.
    pub bitstream: &'a [u8],
    /// `ALPH` payload of a lossy frame.
    pub alpha: Option<&'a [u8]>,
    pub complete: bool,
}

impl DemuxFrame<'_> {
    /// Duration a player shows this frame for: the stored duration, or
    /// [`DEFAULT_FRAME_DURATION_MS`] when that is 0.
    pub fn display_duration_ms(&self) -> u32 {
        match self.duration_ms {
            0 => DEFAULT_FRAME_DURATION_MS,
            ms => ms,
        }
    }
}

/// Chunk-level view of a container.
///
/// ```
/// use zenloop::{Demuxer, MuxError};
///
/// assert_eq!(Demuxer::new(b"RIFF").unwrap_err(), MuxError::Truncated);
/// ```
#[derive(Debug, Clone)]
pub struct Demuxer<'a> {
    data: &'a [u8],
    state: DemuxState,
    canvas_width: u32,
    canvas_height: u32,
    features: FeatureFlags,
    extended: bool,
    animation: Option<AnimationParams>,
    chunks: Vec<ChunkRef<'a>>,
    frames: Vec<DemuxFrame<'a>>,
}

/// Builds a frame from an image chunk. Returns `None` when the chunk is too
/// short to hold a bitstream header and the input is partial.
fn image_frame<'a>(
    index: usize,
    image: &RawChunk<'a>,
    alpha: Option<&'a [u8]>,
    complete: bool,
) -> Result<Option<DemuxFrame<'a>>, MuxError> {
    let Some(format) = BitstreamFormat::from_fourcc(image.fourcc) else {
        return Err(MuxError::UnexpectedChunk(image.fourcc));
    };
    let header = match read_frame_header(format, image.payload) {
        Ok(header) => header,
        Err(_) if !complete => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let alpha = alpha.filter(|_| !format.supports_embedded_alpha());
    Ok(Some(DemuxFrame {
        index,
        x_offset: 0,
        y_offset: 0,
        width: header.width,
        height: header.height,
        duration_ms: 0,
        dispose: DisposeMethod::None,
        blend: BlendMethod::AlphaBlend,
        has_alpha: header.has_alpha || alpha.is_some(),
        format,
        bitstream: image.payload,
        alpha,
        complete,
    }))
}

/// Parses an `ANMF` payload.
fn anmf_frame<'a>(index: usize, chunk: &RawChunk<'a>) -> Result<Option<DemuxFrame<'a>>, MuxError> {
    let payload = chunk.payload;
    let Some(header) = payload.get(..ANMF_HEADER_SIZE) else {
        return if chunk.complete {
            Err(MuxError::InvalidChunkSize(FourCc::ANMF))
        } else {
            Ok(None)
        };
    };

    let mut alpha = None;
    let mut image = None;
    let mut pos = ANMF_HEADER_SIZE;
    loop {
        let sub = match read_chunk(payload, pos, payload.len()) {
            Ok(Some(sub)) => sub,
            Ok(None) => break,
            Err(MuxError::Truncated) if !chunk.complete => break,
            Err(MuxError::Truncated) => return Err(MuxError::InvalidChunkSize(FourCc::ANMF)),
            Err(e) => return Err(e),
        };
        pos = sub.next;
        match sub.fourcc {
            FourCc::ALPH if alpha.is_none() => alpha = Some(sub.payload),
            FourCc::VP8L | FourCc::ZDCT => {
                image = Some(sub);
                break;
            }
            _ => {}
        }
    }

    let Some(image) = image else {
        return if chunk.complete { Err(MuxError::NoImage) } else { Ok(None) };
    };
    let complete = chunk.complete && image.complete;
    let Some(mut frame) = image_frame(index, &image, alpha, complete)? else {
        return Ok(None);
    };
    let width = le(&header[6..9]) + 1;
    let height = le(&header[9..12]) + 1;
    if (width, height) != (frame.width, frame.height) {
        return Err(MuxError::FrameSizeMismatch { index });
    }
    let flags = header[15];
    frame.x_offset = le(&header[0..3]) * 2;
    frame.y_offset = le(&header[3..6]) * 2;
    frame.duration_ms = le(&header[12..15]);
    frame.dispose = if flags & ANMF_DISPOSE_BACKGROUND != 0 {
        DisposeMethod::Background
    } else {
        DisposeMethod::None
    };
    frame.blend = if flags & ANMF_NO_BLEND != 0 {
        BlendMethod::NoBlend
    } else {
        BlendMethod::AlphaBlend
    };
    Ok(Some(frame))
}

impl<'a> Demuxer<'a> {
    /// Parses a complete file.
    pub fn new(data: &'a [u8]) -> Result<Self, MuxError> {
        Self::parse(data, false)
    }

    /// Parses a possibly truncated file. Succeeds once the headers needed for
    /// the canvas size are present.
    pub fn new_partial(data: &'a [u8]) -> Result<Self, MuxError> {
        Self::parse(data, true)
    }

    fn parse(data: &'a [u8], partial: bool) -> Result<Self, MuxError> {
        let (end, mut truncated) = riff_extent(data)?;
        if truncated && !partial {
            return Err(MuxError::Truncated);
        }
        let mut demux = Demuxer {
            data,
            state: DemuxState::Done,
            canvas_width: 0,
            canvas_height: 0,
            features: FeatureFlags::default(),
            extended: false,
            animation: None,
            chunks: Vec::new(),
            frames: Vec::new(),
        };

        let mut pos = RIFF_HEADER_SIZE;
        let mut pending_alpha: Option<&'a [u8]> = None;
        let mut seen = Seen::default();
        loop {
            let chunk = match read_chunk(data, pos, end) {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(MuxError::Truncated) if partial => {
                    truncated = true;
                    break;
                }
                Err(e) => return Err(e),
            };
            if !chunk.complete {
                if !partial {
                    return Err(MuxError::Truncated);
                }
                truncated = true;
            }
            pos = chunk.next;
            demux.chunks.push(ChunkRef {
                fourcc: chunk.fourcc,
                offset: chunk.offset,
                data: chunk.payload,
                complete: chunk.complete,
            });

            if demux.chunks.len() == 1 {
                match chunk.fourcc {
                    FourCc::VP8X => {
                        if chunk.payload.len() < VP8X_CHUNK_SIZE {
                            return Err(if chunk.complete {
                                MuxError::InvalidChunkSize(FourCc::VP8X)
                            } else {
                                MuxError::Truncated
                            });
                        }
                        demux.read_vp8x(chunk.payload)?;
                    }
                    FourCc::VP8L | FourCc::ZDCT => {
                        let Some(frame) = image_frame(0, &chunk, None, chunk.complete)? else {
                            return Err(MuxError::Truncated);
                        };
                        demux.canvas_width = frame.width;
                        demux.canvas_height = frame.height;
                        demux.features.set(crate::format::ALPHA_FLAG, frame.has_alpha);
                        demux.frames.push(frame);
                    }
                    other => return Err(MuxError::UnexpectedChunk(other)),
                }
                continue;
            }
            if !demux.extended {
                // Trailing chunks after a simple-layout image are listed but not interpreted.
                continue;
            }
            demux.read_extended_chunk(&chunk, &mut seen, &mut pending_alpha)?;
            if !chunk.complete {
                break;
            }
        }
        if demux.chunks.is_empty() {
            return Err(if partial { MuxError::Truncated } else { MuxError::NoImage });
        }

        demux.state = if truncated { DemuxState::ParsedHeader } else { DemuxState::Done };
        demux.validate(&seen)?;
        Ok(demux)
    }

    fn read_vp8x(&mut self, payload: &[u8]) -> Result<(), MuxError> {
        let width = le(&payload[4..7]) + 1;
        let height = le(&payload[7..10]) + 1;
        if u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
            return Err(MuxError::InvalidCanvas { width, height });
        }
        self.extended = true;
        self.features = FeatureFlags(payload[0]);
        self.canvas_width = width;
        self.canvas_height = height;
        Ok(())
    }

    fn read_extended_chunk(
        &mut self,
        chunk: &RawChunk<'a>,
        seen: &mut Seen<'a>,
        pending_alpha: &mut Option<&'a [u8]>,
    ) -> Result<(), MuxError> {
        let has_image = !self.frames.is_empty() || seen.image;
        match chunk.fourcc {
            FourCc::VP8X => return Err(MuxError::DuplicateChunk(FourCc::VP8X)),
            FourCc::ICCP => {
                if seen.icc.is_some() {
                    return Err(MuxError::DuplicateChunk(FourCc::ICCP));
                }
                if self.animation.is_some() || has_image || pending_alpha.is_some() {
                    return Err(MuxError::UnexpectedChunk(FourCc::ICCP));
                }
                seen.icc = Some(chunk.payload);
            }
            FourCc::ANIM => {
                if self.animation.is_some() {
                    return Err(MuxError::DuplicateChunk(FourCc::ANIM));
                }
                if has_image {
                    return Err(MuxError::UnexpectedChunk(FourCc::ANIM));
                }
                match AnimationParams::from_payload(chunk.payload) {
                    Some(params) => self.animation = Some(params),
                    None if chunk.complete => return Err(MuxError::InvalidChunkSize(FourCc::ANIM)),
                    None => {}
                }
            }
            FourCc::ANMF => {
                if self.animation.is_none() {
                    return Err(MuxError::MissingChunk(FourCc::ANIM));
                }
                if seen.image {
                    return Err(MuxError::ImageAndFrames);
                }
                if let Some(frame) = anmf_frame(self.frames.len(), chunk)? {
                    self.frames.push(frame);
                }
            }
            FourCc::ALPH => {
                if self.animation.is_some() || has_image {
                    return Err(MuxError::UnexpectedChunk(FourCc::ALPH));
                }
                if pending_alpha.is_none() {
                    *pending_alpha = Some(chunk.payload);
                }
            }
            FourCc::VP8L | FourCc::ZDCT => {
                if self.animation.is_some() {
                    return Err(MuxError::ImageAndFrames);
                }
                if has_image {
                    return Err(MuxError::DuplicateChunk(chunk.fourcc));
                }
                seen.image = true;
                if let Some(frame) = image_frame(0, chunk, *pending_alpha, chunk.complete)? {
                    self.frames.push(frame);
                }
            }
            FourCc::EXIF => {
                if seen.exif.replace(chunk.payload).is_some() {
                    return Err(MuxError::DuplicateChunk(FourCc::EXIF));
                }
            }
            FourCc::XMP => {
                if seen.xmp.replace(chunk.payload).is_some() {
                    return Err(MuxError::DuplicateChunk(FourCc::XMP));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn validate(&self, seen: &Seen<'a>) -> Result<(), MuxError> {
        let done = self.state == DemuxState::Done;
        if self.extended {
            let flags = self.features;
            let checks = [
                (flags.has_animation(), self.animation.is_some(), "animation"),
                (flags.has_icc(), seen.icc.is_some(), "ICC profile"),
                (flags.has_exif(), seen.exif.is_some(), "EXIF"),
                (flags.has_xmp(), seen.xmp.is_some(), "XMP"),
            ];
            for (flag, present, what) in checks {
                // A truncated file may simply not have reached the chunk yet.
                if (present && !flag) || (flag && !present && done) {
                    return Err(MuxError::FlagMismatch(what));
                }
            }
            for frame in &self.frames {
                let right = u64::from(frame.x_offset) + u64::from(frame.width);
                let bottom = u64::from(frame.y_offset) + u64::from(frame.height);
                if right > u64::from(self.canvas_width) || bottom > u64::from(self.canvas_height) {
                    return Err(MuxError::FrameOutOfBounds { index: frame.index });
                }
                let canvas = (self.canvas_width, self.canvas_height);
                if self.animation.is_none() && (frame.width, frame.height) != canvas {
                    return Err(MuxError::FrameSizeMismatch { index: frame.index });
                }
            }
        }
        if done && self.frames.is_empty() {
            return Err(MuxError::NoImage);
        }
        Ok(())
    }

    pub fn state(&self) -> DemuxState {
        self.state
    }

    /// The bytes this demuxer was built from.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn canvas_width(&self) -> u32 {
        self.canvas_width
    }

    pub fn canvas_height(&self) -> u32 {
        self.canvas_height
    }

    /// `VP8X` flags; for simple files only the alpha flag is derived.
    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    /// True for the `VP8X` layout.
    pub fn is_extended(&self) -> bool {
        self.extended
    }

    pub fn is_animated(&self) -> bool {
        self.animation.is_some()
    }

    /// Whether every frame uses a bitstream WebP decoders can read.
    pub fn is_webp_compatible(&self) -> bool {
        self.frames.iter().all(|f| f.format.is_webp_compatible())
    }

    pub fn animation(&self) -> Option<AnimationParams> {
        self.animation
    }

    /// Loop count of an animation; 0 (forever) for still images.
    pub fn loop_count(&self) -> u16 {
        self.animation.map_or(0, |a| a.loop_count)
    }

    /// Background color of an animation; transparent black for still images.
    pub fn background(&self) -> Rgba<u8> {
        self.animation.unwrap_or_default().background
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frame(&self, index: usize) -> Option<&DemuxFrame<'a>> {
        self.frames.get(index)
    }

    pub fn frames(&self) -> &[DemuxFrame<'a>] {
        &self.frames
    }

    /// Sum of all display durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| u64::from(f.display_duration_ms())).sum()
    }

    /// The `nth` (0-based) top-level chunk with identifier `fourcc`.
    pub fn chunk(&self, fourcc: FourCc, nth: usize) -> Option<ChunkRef<'a>> {
        self.chunks.iter().filter(|c| c.fourcc == fourcc).nth(nth).copied()
    }

    pub fn chunk_count(&self, fourcc: FourCc) -> usize {
        self.chunks.iter().filter(|c| c.fourcc == fourcc).count()
    }

    /// Every top-level chunk in file order.
    pub fn chunks(&self) -> &[ChunkRef<'a>] {
        &self.chunks
    }

    pub fn icc_profile(&self) -> Option<&'a [u8]> {
        self.metadata_chunk(FourCc::ICCP)
    }

    pub fn exif(&self) -> Option<&'a [u8]> {
        self.metadata_chunk(FourCc::EXIF)
    }

    pub fn xmp(&self) -> Option<&'a [u8]> {
        self.metadata_chunk(FourCc::XMP)
    }

    fn metadata_chunk(&self, fourcc: FourCc) -> Option<&'a [u8]> {
        if !self.extended {
            return None;
        }
        self.chunk(fourcc, 0).filter(|c| c.complete).map(|c| c.data)
    }
}

#[derive(Default)]
struct Seen<'a> {
    icc: Option<&'a [u8]>,
    exif: Option<&'a [u8]>,
    xmp: Option<&'a [u8]>,
    image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ANIMATION_FLAG, ICC_FLAG};
    use crate::mux::riff::{put_u24, wrap_riff, write_chunk};
    use alloc::vec;

    /// Lossless header for a `w × h` image, padded with a few body bytes.
    fn lossless_stub(w: u32, h: u32) -> Vec<u8> {
        let bits = (w - 1) | (h - 1) << 14;
        let mut out = vec![0x2f];
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(&[0; 3]);
        out
    }

    fn vp8x(flags: u8, w: u32, h: u32) -> Vec<u8> {
        let mut payload = vec![flags, 0, 0, 0];
        put_u24(&mut payload, w - 1);
        put_u24(&mut payload, h - 1);
        payload
    }

    fn anmf(x: u32, y: u32, w: u32, h: u32, duration: u32, flags: u8) -> Vec<u8> {
        let mut payload = Vec::new();
        put_u24(&mut payload, x / 2);
        put_u24(&mut payload, y / 2);
        put_u24(&mut payload, w - 1);
        put_u24(&mut payload, h - 1);
        put_u24(&mut payload, duration);
        payload.push(flags);
        write_chunk(&mut payload, FourCc::VP8L, &lossless_stub(w, h)).unwrap();
        payload
    }

    fn file(chunks: &[(FourCc, Vec<u8>)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, payload) in chunks {
            write_chunk(&mut body, *id, payload).unwrap();
        }
        wrap_riff(&body).unwrap()
    }

    fn animated() -> Vec<u8> {
        file(&[
            (FourCc::VP8X, vp8x(ANIMATION_FLAG | ICC_FLAG, 8, 6)),
            (FourCc::ICCP, vec![7; 5]),
            (FourCc::ANIM, vec![1, 2, 3, 4, 3, 0]),
            (FourCc::ANMF, anmf(0, 0, 8, 6, 100, 0)),
            (FourCc::ANMF, anmf(2, 4, 4, 2, 50, ANMF_DISPOSE_BACKGROUND | ANMF_NO_BLEND)),
            (FourCc(*b"ZZZZ"), vec![1]),
        ])
    }

    #[test]
    fn simple_layout() {
        let data = file(&[(FourCc::VP8L, lossless_stub(5, 3))]);
        let demux = Demuxer::new(&data).unwrap();
        assert_eq!((demux.canvas_width(), demux.canvas_height()), (5, 3));
        assert!(!demux.is_extended() && !demux.is_animated());
        assert_eq!(demux.frame_count(), 1);
        assert_eq!(demux.frame(0).unwrap().format, BitstreamFormat::Lossless);
        assert_eq!(demux.state(), DemuxState::Done);
        assert_eq!(demux.icc_profile(), None);
    }

    #[test]
    fn animated_layout() {
        let data = animated();
        let demux = Demuxer::new(&data).unwrap();
        assert!(demux.is_animated());
        assert_eq!(demux.loop_count(), 3);
        assert_eq!(demux.background(), Rgba::new(3, 2, 1, 4));
        assert_eq!(demux.icc_profile(), Some(&[7u8; 5][..]));
        assert_eq!(demux.frame_count(), 2);
        let second = demux.frame(1).unwrap();
        assert_eq!((second.x_offset, second.y_offset, second.width, second.height), (2, 4, 4, 2));
        assert_eq!(second.dispose, DisposeMethod::Background);
        assert_eq!(second.blend, BlendMethod::NoBlend);
        assert_eq!(demux.total_duration_ms(), 150);
        assert_eq!(demux.chunk_count(FourCc::ANMF), 2);
        assert_eq!(demux.chunk(FourCc(*b"ZZZZ"), 0).unwrap().data, &[1]);
        assert!(demux.chunk(FourCc::ANMF, 2).is_none());
    }

    #[test]
    fn zero_duration_displays_default() {
        let data = file(&[
            (FourCc::VP8X, vp8x(ANIMATION_FLAG, 8, 6)),
            (FourCc::ANIM, vec![0; 6]),
            (FourCc::ANMF, anmf(0, 0, 8, 6, 0, 0)),
            (FourCc::ANMF, anmf(0, 0, 8, 6, 40, 0)),
        ]);
        let demux = Demuxer::new(&data).unwrap();
        let first = demux.frame(0).unwrap();
        assert_eq!(first.duration_ms, 0);
        assert_eq!(first.display_duration_ms(), DEFAULT_FRAME_DURATION_MS);
        assert_eq!(demux.frame(1).unwrap().display_duration_ms(), 40);
        assert_eq!(demux.total_duration_ms(), 140);

        let still = file(&[(FourCc::VP8L, lossless_stub(5, 3))]);
        assert_eq!(Demuxer::new(&still).unwrap().total_duration_ms(), 100);
    }

    #[test]
    fn frame_outside_canvas() {
        let data = file(&[
            (FourCc::VP8X, vp8x(ANIMATION_FLAG, 4, 4)),
            (FourCc::ANIM, vec![0; 6]),
            (FourCc::ANMF, anmf(2, 0, 4, 4, 10, 0)),
        ]);
        assert_eq!(Demuxer::new(&data).unwrap_err(), MuxError::FrameOutOfBounds { index: 0 });
    }

    #[test]
    fn anmf_before_anim() {
        let data = file(&[
            (FourCc::VP8X, vp8x(ANIMATION_FLAG, 4, 4)),
            (FourCc::ANMF, anmf(0, 0, 4, 4, 10, 0)),
        ]);
        assert_eq!(Demuxer::new(&data).unwrap_err(), MuxError::MissingChunk(FourCc::ANIM));
    }

    #[test]
    fn flags_must_match_chunks() {
        let data = file(&[
            (FourCc::VP8X, vp8x(0, 4, 4)),
            (FourCc::ICCP, vec![1]),
            (FourCc::VP8L, lossless_stub(4, 4)),
        ]);
        assert_eq!(Demuxer::new(&data).unwrap_err(), MuxError::FlagMismatch("ICC profile"));
        let data = file(&[
            (FourCc::VP8X, vp8x(ICC_FLAG, 4, 4)),
            (FourCc::VP8L, lossless_stub(4, 4)),
        ]);
        assert_eq!(Demuxer::new(&data).unwrap_err(), MuxError::FlagMismatch("ICC profile"));
    }

    #[test]
    fn declared_size_must_match_bitstream() {
        let mut frame = anmf(0, 0, 4, 4, 10, 0);
        frame[6] = 2;
        let data = file(&[
            (FourCc::VP8X, vp8x(ANIMATION_FLAG, 4, 4)),
            (FourCc::ANIM, vec![0; 6]),
            (FourCc::ANMF, frame),
        ]);
        assert_eq!(Demuxer::new(&data).unwrap_err(), MuxError::FrameSizeMismatch { index: 0 });
    }

    #[test]
    fn alpha_next_to_lossless_is_ignored() {
        let data = file(&[
            (FourCc::VP8X, vp8x(crate::format::ALPHA_FLAG, 4, 4)),
            (FourCc::ALPH, vec![0, 1, 2]),
            (FourCc::VP8L, lossless_stub(4, 4)),
        ]);
        let demux = Demuxer::new(&data).unwrap();
        assert_eq!(demux.frame(0).unwrap().alpha, None);
    }

    #[test]
    fn partial_input() {
        let data = animated();
        let cut = data.len() - 20;
        assert_eq!(Demuxer::new(&data[..cut]).unwrap_err(), MuxError::Truncated);
        let demux = Demuxer::new_partial(&data[..cut]).unwrap();
        assert_eq!(demux.state(), DemuxState::ParsedHeader);
        assert!(demux.frame_count() >= 1);
        assert!(demux.frame(0).unwrap().complete);

        for len in 0..data.len() {
            let _ = Demuxer::new_partial(&data[..len]);
            let _ = Demuxer::new(&data[..len]);
        }
    }
}
