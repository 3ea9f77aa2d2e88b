//! Container assembly from encoded frames and metadata.

use alloc::vec::Vec;

use super::riff::{chunk_size, put_u24, wrap_riff, write_chunk};
use super::{AnimationParams, BlendMethod, Demuxer, DisposeMethod, MuxError};
use crate::format::{
    ALPHA_FLAG, ANIMATION_FLAG, ANMF_DISPOSE_BACKGROUND, ANMF_HEADER_SIZE, ANMF_NO_BLEND,
    DEFAULT_FRAME_DURATION_MS, EXIF_FLAG, FeatureFlags, FourCc, ICC_FLAG, MAX_CANVAS_DIMENSION,
    MAX_CANVAS_PIXELS, MAX_DURATION_MS, MAX_FRAME_OFFSET, XMP_FLAG,
};
use crate::frame::{FrameBitstream, FrameHeader, read_frame_header};

/// An animation frame under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuxFrame {
    pub bitstream: FrameBitstream,
    /// Horizontal offset on the canvas; must be even.
    pub x_offset: u32,
    /// Vertical offset on the canvas; must be even.
    pub y_offset: u32,
    pub duration_ms: u32,
    pub dispose: DisposeMethod,
    pub blend: BlendMethod,
}

impl MuxFrame {
    /// A frame at the canvas origin shown for [`DEFAULT_FRAME_DURATION_MS`].
    pub fn new(bitstream: FrameBitstream) -> Self {
        Self {
            bitstream,
            x_offset: 0,
            y_offset: 0,
            duration_ms: DEFAULT_FRAME_DURATION_MS,
            dispose: DisposeMethod::None,
            blend: BlendMethod::AlphaBlend,
        }
    }

    pub fn with_offset(mut self, x: u32, y: u32) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    pub fn with_duration(mut self, duration_ms: u32) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_dispose(mut self, dispose: DisposeMethod) -> Self {
        self.dispose = dispose;
        self
    }

    pub fn with_blend(mut self, blend: BlendMethod) -> Self {
        self.blend = blend;
        self
    }
}

/// Owned container under construction.
///
/// ```
/// use zenloop::pixel::{ImgVec, Rgba};
/// use zenloop::{FrameSettings, Mux, encode_frame};
///
/// let image = ImgVec::new(vec![Rgba::new(0u8, 0, 0, 255); 4], 2, 2);
/// let mut mux = Mux::new();
/// mux.set_image(encode_frame(image.as_ref(), &FrameSettings::default(), None)?);
/// mux.set_exif(b"Exif\0\0".to_vec());
/// let file = mux.assemble()?;
/// assert_eq!(&file[12..16], b"VP8X");
/// # Ok::<(), zenloop::CodecError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mux {
    image: Option<FrameBitstream>,
    frames: Vec<MuxFrame>,
    animation: Option<AnimationParams>,
    canvas: Option<(u32, u32)>,
    icc_profile: Option<Vec<u8>>,
    exif: Option<Vec<u8>>,
    xmp: Option<Vec<u8>>,
    unknown: Vec<(FourCc, Vec<u8>)>,
}

fn to_owned(frame: &super::DemuxFrame<'_>) -> FrameBitstream {
    FrameBitstream {
        format: frame.format,
        data: frame.bitstream.to_vec(),
        alpha: frame.alpha.map(<[u8]>::to_vec),
    }
}

fn check_canvas(width: u32, height: u32) -> Result<(), MuxError> {
    let in_range =
        (1..=MAX_CANVAS_DIMENSION).contains(&width) && (1..=MAX_CANVAS_DIMENSION).contains(&height);
    if !in_range || u64::from(width) * u64::from(height) > MAX_CANVAS_PIXELS {
        return Err(MuxError::InvalidCanvas { width, height });
    }
    Ok(())
}

/// Appends the `ALPH` chunk (if any) and the image chunk of a frame.
fn write_image(out: &mut Vec<u8>, frame: &FrameBitstream) -> Result<(), MuxError> {
    let separate_alpha = frame.alpha.as_deref().filter(|_| !frame.format.supports_embedded_alpha());
    if let Some(alpha) = separate_alpha {
        write_chunk(out, FourCc::ALPH, alpha)?;
    }
    write_chunk(out, frame.format.fourcc(), &frame.data)
}

fn frame_has_alpha(frame: &FrameBitstream, header: &FrameHeader) -> bool {
    header.has_alpha || (frame.alpha.is_some() && !frame.format.supports_embedded_alpha())
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies every chunk of an existing file so it can be edited.
    pub fn from_bytes(data: &[u8]) -> Result<Self, MuxError> {
        let demux = Demuxer::new(data)?;
        let mut mux = Mux::new();
        if demux.is_extended() {
            mux.canvas = Some((demux.canvas_width(), demux.canvas_height()));
        }
        if let Some(params) = demux.animation() {
            mux.animation = Some(params);
            for frame in demux.frames() {
                mux.frames.push(MuxFrame {
                    bitstream: to_owned(frame),
                    x_offset: frame.x_offset,
                    y_offset: frame.y_offset,
                    duration_ms: frame.duration_ms,
                    dispose: frame.dispose,
                    blend: frame.blend,
                });
            }
        } else if let Some(frame) = demux.frame(0) {
            mux.image = Some(to_owned(frame));
        }
        mux.icc_profile = demux.icc_profile().map(<[u8]>::to_vec);
        mux.exif = demux.exif().map(<[u8]>::to_vec);
        mux.xmp = demux.xmp().map(<[u8]>::to_vec);
        if demux.is_extended() {
            mux.unknown = demux
                .chunks()
                .iter()
                .filter(|c| !c.fourcc.is_known())
                .map(|c| (c.fourcc, c.data.to_vec()))
                .collect();
        }
        Ok(mux)
    }

    /// Sets the still image, dropping any animation frames.
    pub fn set_image(&mut self, frame: FrameBitstream) {
        self.frames.clear();
        self.animation = None;
        self.image = Some(frame);
    }

    /// Appends an animation frame.
    pub fn push_frame(&mut self, frame: MuxFrame) {
        self.frames.push(frame);
    }

    pub fn set_animation(&mut self, params: AnimationParams) {
        self.animation = Some(params);
    }

    /// Fixes the canvas size instead of deriving it from the frames.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> Result<(), MuxError> {
        check_canvas(width, height)?;
        self.canvas = Some((width, height));
        Ok(())
    }

    pub fn set_icc_profile(&mut self, icc: Vec<u8>) {
        self.icc_profile = Some(icc);
    }

    pub fn set_exif(&mut self, exif: Vec<u8>) {
        self.exif = Some(exif);
    }

    pub fn set_xmp(&mut self, xmp: Vec<u8>) {
        self.xmp = Some(xmp);
    }

    /// Sets a metadata or unknown chunk, replacing one with the same identifier.
    ///
    /// Image, alpha and animation chunks have dedicated setters and are
    /// rejected here.
    pub fn set_chunk(&mut self, fourcc: FourCc, data: Vec<u8>) -> Result<(), MuxError> {
        match fourcc {
            FourCc::ICCP => self.icc_profile = Some(data),
            FourCc::EXIF => self.exif = Some(data),
            FourCc::XMP => self.xmp = Some(data),
            id if id.is_known() => return Err(MuxError::UnexpectedChunk(id)),
            id => match self.unknown.iter_mut().find(|(existing, _)| *existing == id) {
                Some(slot) => slot.1 = data,
                None => self.unknown.push((id, data)),
            },
        }
        Ok(())
    }

    /// Removes every chunk with identifier `fourcc`. Returns whether anything
    /// was removed.
    pub fn remove(&mut self, fourcc: FourCc) -> bool {
        match fourcc {
            FourCc::ICCP => self.icc_profile.take().is_some(),
            FourCc::EXIF => self.exif.take().is_some(),
            FourCc::XMP => self.xmp.take().is_some(),
            FourCc::ANIM => self.animation.take().is_some(),
            FourCc::ANMF => {
                let removed = !self.frames.is_empty();
                self.frames.clear();
                removed
            }
            FourCc::VP8X => self.canvas.take().is_some(),
            FourCc::ALPH => match self.image.as_mut() {
                Some(image) => image.alpha.take().is_some(),
                None => false,
            },
            id => {
                if self.image.as_ref().is_some_and(|image| image.format.fourcc() == id) {
                    self.image = None;
                    return true;
                }
                let before = self.unknown.len();
                self.unknown.retain(|(existing, _)| *existing != id);
                before != self.unknown.len()
            }
        }
    }

    pub fn image(&self) -> Option<&FrameBitstream> {
        self.image.as_ref()
    }

    pub fn frames(&self) -> &[MuxFrame] {
        &self.frames
    }

    /// Frames the assembled file will hold: 1 for a still image, otherwise
    /// the animation frames.
    pub fn frame_count(&self) -> usize {
        if self.image.is_some() { 1 } else { self.frames.len() }
    }

    pub fn animation(&self) -> Option<AnimationParams> {
        self.animation
    }

    pub fn icc_profile(&self) -> Option<&[u8]> {
        self.icc_profile.as_deref()
    }

    pub fn exif(&self) -> Option<&[u8]> {
        self.exif.as_deref()
    }

    pub fn xmp(&self) -> Option<&[u8]> {
        self.xmp.as_deref()
    }

    /// Serializes the container.
    ///
    /// The simple layout is used for a lone opaque-or-lossless image with no
    /// metadata; everything else gets a `VP8X` header with derived flags.
    pub fn assemble(&self) -> Result<Vec<u8>, MuxError> {
        match (&self.image, self.frames.is_empty()) {
            (Some(_), false) => Err(MuxError::ImageAndFrames),
            (None, true) => Err(MuxError::NoImage),
            (Some(image), true) => self.assemble_still(image),
            (None, false) => self.assemble_animation(),
        }
    }

    fn assemble_still(&self, image: &FrameBitstream) -> Result<Vec<u8>, MuxError> {
        let header = read_frame_header(image.format, &image.data)?;
        let (width, height) = self.canvas.unwrap_or((header.width, header.height));
        if (width, height) != (header.width, header.height) {
            return Err(MuxError::FrameSizeMismatch { index: 0 });
        }
        let has_alpha = frame_has_alpha(image, &header);
        let needs_alpha_chunk = has_alpha && !image.format.supports_embedded_alpha();
        let simple = !needs_alpha_chunk && !self.has_metadata() && self.unknown.is_empty();

        let mut body = Vec::with_capacity(chunk_size(image.data.len()) + 64);
        if simple {
            write_chunk(&mut body, image.format.fourcc(), &image.data)?;
            return wrap_riff(&body);
        }
        let mut flags = self.metadata_flags();
        flags.set(ALPHA_FLAG, has_alpha);
        self.write_vp8x(&mut body, flags, width, height)?;
        write_image(&mut body, image)?;
        self.write_trailer(&mut body)?;
        wrap_riff(&body)
    }

    fn assemble_animation(&self) -> Result<Vec<u8>, MuxError> {
        let mut headers = Vec::with_capacity(self.frames.len());
        let (mut right, mut bottom) = (0u64, 0u64);
        for (index, frame) in self.frames.iter().enumerate() {
            let header = read_frame_header(frame.bitstream.format, &frame.bitstream.data)?;
            if frame.x_offset % 2 != 0 || frame.y_offset % 2 != 0 {
                return Err(MuxError::OddOffset { index });
            }
            if frame.x_offset > MAX_FRAME_OFFSET || frame.y_offset > MAX_FRAME_OFFSET {
                return Err(MuxError::OutOfRange("frame offset"));
            }
            if frame.duration_ms > MAX_DURATION_MS {
                return Err(MuxError::OutOfRange("frame duration"));
            }
            right = right.max(u64::from(frame.x_offset) + u64::from(header.width));
            bottom = bottom.max(u64::from(frame.y_offset) + u64::from(header.height));
            headers.push(header);
        }

        let (width, height) = match self.canvas {
            Some(size) => size,
            None => (
                u32::try_from(right).map_err(|_| MuxError::OutOfRange("canvas width"))?,
                u32::try_from(bottom).map_err(|_| MuxError::OutOfRange("canvas height"))?,
            ),
        };
        check_canvas(width, height)?;
        for (index, frame) in self.frames.iter().enumerate() {
            let header = &headers[index];
            if u64::from(frame.x_offset) + u64::from(header.width) > u64::from(width)
                || u64::from(frame.y_offset) + u64::from(header.height) > u64::from(height)
            {
                return Err(MuxError::FrameOutOfBounds { index });
            }
        }

        let mut flags = self.metadata_flags();
        flags.set(ANIMATION_FLAG, true);
        let any_alpha = self
            .frames
            .iter()
            .zip(&headers)
            .any(|(f, h)| frame_has_alpha(&f.bitstream, h));
        flags.set(ALPHA_FLAG, any_alpha);

        let mut body = Vec::new();
        self.write_vp8x(&mut body, flags, width, height)?;
        let params = self.animation.unwrap_or_default();
        write_chunk(&mut body, FourCc::ANIM, &params.to_payload())?;

        let mut payload = Vec::new();
        for (frame, header) in self.frames.iter().zip(&headers) {
            payload.clear();
            put_u24(&mut payload, frame.x_offset / 2);
            put_u24(&mut payload, frame.y_offset / 2);
            put_u24(&mut payload, header.width - 1);
            put_u24(&mut payload, header.height - 1);
            put_u24(&mut payload, frame.duration_ms);
            let mut bits = 0;
            if frame.dispose == DisposeMethod::Background {
                bits |= ANMF_DISPOSE_BACKGROUND;
            }
            if frame.blend == BlendMethod::NoBlend {
                bits |= ANMF_NO_BLEND;
            }
            payload.push(bits);
            debug_assert_eq!(payload.len(), ANMF_HEADER_SIZE);
            write_image(&mut payload, &frame.bitstream)?;
            write_chunk(&mut body, FourCc::ANMF, &payload)?;
        }
        self.write_trailer(&mut body)?;
        wrap_riff(&body)
    }

    fn has_metadata(&self) -> bool {
        self.icc_profile.is_some() || self.exif.is_some() || self.xmp.is_some()
    }

    fn metadata_flags(&self) -> FeatureFlags {
        let mut flags = FeatureFlags::default();
        flags.set(ICC_FLAG, self.icc_profile.is_some());
        flags.set(EXIF_FLAG, self.exif.is_some());
        flags.set(XMP_FLAG, self.xmp.is_some());
        flags
    }

    /// Writes `VP8X` and, when present, `ICCP`.
    fn write_vp8x(
        &self,
        body: &mut Vec<u8>,
        flags: FeatureFlags,
        width: u32,
        height: u32,
    ) -> Result<(), MuxError> {
        check_canvas(width, height)?;
        let mut payload = Vec::with_capacity(10);
        payload.extend_from_slice(&[flags.0, 0, 0, 0]);
        put_u24(&mut payload, width - 1);
        put_u24(&mut payload, height - 1);
        write_chunk(body, FourCc::VP8X, &payload)?;
        if let Some(icc) = &self.icc_profile {
            write_chunk(body, FourCc::ICCP, icc)?;
        }
        Ok(())
    }

    /// Writes `EXIF`, `XMP ` and unknown chunks.
    fn write_trailer(&self, body: &mut Vec<u8>) -> Result<(), MuxError> {
        if let Some(exif) = &self.exif {
            write_chunk(body, FourCc::EXIF, exif)?;
        }
        if let Some(xmp) = &self.xmp {
            write_chunk(body, FourCc::XMP, xmp)?;
        }
        for (id, data) in &self.unknown {
            write_chunk(body, *id, data)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BitstreamFormat;
    use crate::mux::DemuxState;
    use alloc::vec;

    fn lossless_stub(w: u32, h: u32, alpha: bool) -> FrameBitstream {
        let bits = (w - 1) | (h - 1) << 14 | u32::from(alpha) << 28;
        let mut data = vec![0x2f];
        data.extend_from_slice(&bits.to_le_bytes());
        data.push(0);
        FrameBitstream {
            format: BitstreamFormat::Lossless,
            data,
            alpha: None,
        }
    }

    #[test]
    fn lone_image_uses_simple_layout() {
        let mut mux = Mux::new();
        mux.set_image(lossless_stub(3, 2, false));
        let file = mux.assemble().unwrap();
        assert_eq!(&file[12..16], b"VP8L");
        assert_eq!(file.len(), 12 + chunk_size(6));
    }

    #[test]
    fn metadata_forces_extended_layout() {
        let mut mux = Mux::new();
        mux.set_image(lossless_stub(3, 2, true));
        mux.set_icc_profile(vec![1, 2, 3]);
        mux.set_xmp(b"<x/>".to_vec());
        mux.set_chunk(FourCc(*b"ABCD"), vec![9]).unwrap();
        let file = mux.assemble().unwrap();
        let demux = Demuxer::new(&file).unwrap();
        let features = demux.features();
        assert!(features.has_icc() && features.has_xmp() && features.has_alpha());
        assert!(!demux.features().has_exif());
        assert_eq!(demux.icc_profile(), Some(&[1u8, 2, 3][..]));
        assert_eq!(demux.xmp(), Some(&b"<x/>"[..]));
        assert_eq!(demux.chunk(FourCc(*b"ABCD"), 0).unwrap().data, &[9]);

        let copy = Mux::from_bytes(&file).unwrap();
        assert_eq!(copy, Mux { canvas: Some((3, 2)), ..mux.clone() });
    }

    #[test]
    fn animation_round_trip() {
        let mut mux = Mux::new();
        mux.set_animation(AnimationParams { loop_count: 2, ..AnimationParams::default() });
        mux.push_frame(MuxFrame::new(lossless_stub(6, 4, false)).with_duration(40));
        mux.push_frame(
            MuxFrame::new(lossless_stub(2, 2, true))
                .with_offset(4, 2)
                .with_duration(60)
                .with_dispose(DisposeMethod::Background)
                .with_blend(BlendMethod::NoBlend),
        );
        let file = mux.assemble().unwrap();
        let demux = Demuxer::new(&file).unwrap();
        assert_eq!(demux.state(), DemuxState::Done);
        assert_eq!((demux.canvas_width(), demux.canvas_height()), (6, 4));
        assert_eq!(demux.loop_count(), 2);
        assert!(demux.features().has_alpha());
        let second = demux.frame(1).unwrap();
        assert_eq!((second.x_offset, second.y_offset, second.duration_ms), (4, 2, 60));
        assert_eq!(second.dispose, DisposeMethod::Background);
        assert_eq!(second.blend, BlendMethod::NoBlend);
        assert_eq!(Mux::from_bytes(&file).unwrap().assemble().unwrap(), file);
    }

    #[test]
    fn invalid_combinations() {
        let mut mux = Mux::new();
        assert_eq!(mux.assemble(), Err(MuxError::NoImage));
        mux.push_frame(MuxFrame::new(lossless_stub(2, 2, false)).with_offset(1, 0));
        assert_eq!(mux.assemble(), Err(MuxError::OddOffset { index: 0 }));

        let mut mux = Mux::new();
        mux.push_frame(MuxFrame::new(lossless_stub(4, 4, false)).with_offset(2, 0));
        mux.set_canvas_size(4, 4).unwrap();
        assert_eq!(mux.assemble(), Err(MuxError::FrameOutOfBounds { index: 0 }));
        mux.image = Some(lossless_stub(4, 4, false));
        assert_eq!(mux.assemble(), Err(MuxError::ImageAndFrames));

        assert!(Mux::new().set_canvas_size(0, 4).is_err());
        assert!(Mux::new().set_canvas_size(MAX_CANVAS_DIMENSION + 1, 1).is_err());
        assert_eq!(
            Mux::new().set_chunk(FourCc::ANMF, vec![]),
            Err(MuxError::UnexpectedChunk(FourCc::ANMF))
        );
    }

    #[test]
    fn remove_chunks() {
        let mut mux = Mux::new();
        mux.set_image(lossless_stub(2, 2, false));
        mux.set_exif(vec![1]);
        mux.set_chunk(FourCc(*b"ABCD"), vec![2]).unwrap();
        assert!(mux.remove(FourCc::EXIF));
        assert!(!mux.remove(FourCc::EXIF));
        assert!(mux.remove(FourCc(*b"ABCD")));
        assert!(mux.remove(FourCc::VP8L));
        assert_eq!(mux.frame_count(), 0);
    }
}
