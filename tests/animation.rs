//! Animation encoding, compositing and playback.

mod common;

use common::{gradient, solid};
use zenloop::pixel::{ImgVec, Rgba};
use zenloop::{
    AnimationDecoder, AnimationEncoder, AnimationParams, BlendMethod, CodecError, DecodeConfig,
    Demuxer, DEFAULT_FRAME_DURATION_MS, DisposeMethod, EncodeMode, FrameSettings, Limits, LoopMode,
    Mux, MuxFrame, encode_frame,
};

fn lossless() -> FrameSettings {
    FrameSettings {
        mode: EncodeMode::Lossless,
        ..FrameSettings::default()
    }
}

/// Gradient with a 3x3 square moved to (`step`, `step`).
fn moving_square(step: usize) -> ImgVec<Rgba<u8>> {
    let mut image = gradient(16, 12);
    for y in step..step + 3 {
        for x in step..step + 3 {
            image.buf_mut()[y * 16 + x] = Rgba::new(255, 255, 0, 255);
        }
    }
    image
}

#[test]
fn encoded_frames_play_back_exactly() {
    let frames: Vec<_> = (0..5).map(moving_square).collect();
    let mut encoder = AnimationEncoder::new(16, 12, lossless())
        .unwrap()
        .with_animation(AnimationParams {
            background: Rgba::new(0, 0, 0, 0),
            loop_count: 2,
        });
    for (i, frame) in frames.iter().enumerate() {
        encoder.add_frame(frame.as_ref(), i as u64 * 40).unwrap();
    }
    let file = encoder.finish(200).unwrap();

    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    let info = decoder.info();
    assert_eq!((info.canvas_width, info.canvas_height, info.frame_count), (16, 12, 5));
    assert_eq!(info.loop_mode, LoopMode::Repeat(2));
    assert_eq!(info.total_duration_ms, 200);
    assert!(!info.has_alpha);

    // Only the first frame covers the whole canvas.
    let demux = decoder.demuxer();
    assert!(demux.frames()[1..].iter().all(|f| f.width < 16 && f.height < 12));

    for (i, expected) in frames.iter().enumerate() {
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.index, i);
        assert_eq!(frame.timestamp_ms, i as u64 * 40);
        assert_eq!(frame.duration_ms, 40);
        assert_eq!(frame.image.buf(), expected.buf(), "frame {i}");
    }
    assert!(decoder.next_frame().unwrap().is_none());
    assert!(!decoder.has_more_frames());

    decoder.reset();
    assert_eq!(decoder.next_frame().unwrap().unwrap().image.buf(), frames[0].buf());
}

#[test]
fn seeking_replays_from_start() {
    let frames: Vec<_> = (0..4).map(moving_square).collect();
    let mut encoder = AnimationEncoder::new(16, 12, lossless()).unwrap();
    for (i, frame) in frames.iter().enumerate() {
        encoder.add_frame(frame.as_ref(), i as u64 * 10).unwrap();
    }
    let file = encoder.finish(40).unwrap();

    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    assert_eq!(decoder.frame_at(3).unwrap().image.buf(), frames[3].buf());
    assert_eq!(decoder.frame_at(1).unwrap().image.buf(), frames[1].buf());
    assert_eq!(decoder.frame_at(2).unwrap().timestamp_ms, 20);
    let wrapped = decoder.frame_at(6).unwrap();
    assert_eq!((wrapped.index, wrapped.timestamp_ms), (2, 20));
    assert_eq!(wrapped.image.buf(), frames[2].buf());
}

/// A 4x4 opaque red frame disposed to background, then a 2x2 half
/// transparent blue frame blended at (2, 2).
fn dispose_then_blend_file() -> Vec<u8> {
    let red =
        encode_frame(solid(4, 4, Rgba::new(255, 0, 0, 255)).as_ref(), &lossless(), None).unwrap();
    let blue =
        encode_frame(solid(2, 2, Rgba::new(0, 0, 255, 128)).as_ref(), &lossless(), None).unwrap();
    let mut mux = Mux::new();
    mux.set_animation(AnimationParams {
        background: Rgba::new(0, 255, 0, 255),
        loop_count: 0,
    });
    mux.push_frame(MuxFrame::new(red).with_duration(50).with_dispose(DisposeMethod::Background));
    mux.push_frame(
        MuxFrame::new(blue)
            .with_offset(2, 2)
            .with_duration(50)
            .with_blend(BlendMethod::AlphaBlend),
    );
    mux.assemble().unwrap()
}

#[test]
fn dispose_and_blend_over_transparent() {
    let file = dispose_then_blend_file();
    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    assert_eq!(decoder.info().loop_mode, LoopMode::Infinite);

    let first = decoder.next_frame().unwrap().unwrap();
    assert!(first.image.pixels().all(|p| p == Rgba::new(255, 0, 0, 255)));

    let second = decoder.next_frame().unwrap().unwrap();
    let at = |x: usize, y: usize| second.image.buf()[y * 4 + x];
    assert_eq!(at(0, 0), Rgba::new(0, 0, 0, 0));
    assert_eq!(at(1, 3), Rgba::new(0, 0, 0, 0));
    // Blending onto a fully transparent pixel keeps the source.
    assert_eq!(at(2, 2), Rgba::new(0, 0, 255, 128));
    assert_eq!(at(3, 3), Rgba::new(0, 0, 255, 128));
}

#[test]
fn dispose_and_blend_over_background_color() {
    let file = dispose_then_blend_file();
    let mut decoder = AnimationDecoder::new(&file, &Limits::none())
        .unwrap()
        .with_config(DecodeConfig::new().with_background_color(true));
    let second = decoder.frame_at(1).unwrap();
    let at = |x: usize, y: usize| second.image.buf()[y * 4 + x];
    assert_eq!(at(0, 0), Rgba::new(0, 255, 0, 255));
    let mixed = at(2, 2);
    assert_eq!(mixed.a, 255);
    assert_eq!(mixed.r, 0);
    assert!(mixed.g.abs_diff(127) <= 2 && mixed.b.abs_diff(128) <= 2, "{mixed:?}");
}

#[test]
fn no_blend_overwrites() {
    let red =
        encode_frame(solid(4, 4, Rgba::new(255, 0, 0, 255)).as_ref(), &lossless(), None).unwrap();
    let clear =
        encode_frame(solid(2, 2, Rgba::new(0, 0, 0, 0)).as_ref(), &lossless(), None).unwrap();
    let mut mux = Mux::new();
    mux.set_animation(AnimationParams::default());
    mux.push_frame(MuxFrame::new(red).with_duration(10));
    mux.push_frame(MuxFrame::new(clear.clone()).with_duration(10).with_blend(BlendMethod::NoBlend));
    mux.push_frame(MuxFrame::new(clear).with_offset(2, 2).with_duration(10));
    let file = mux.assemble().unwrap();

    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    let second = decoder.frame_at(1).unwrap();
    assert_eq!(second.image.buf()[0], Rgba::new(0, 0, 0, 0));
    assert_eq!(second.image.buf()[15], Rgba::new(255, 0, 0, 255));
    // Alpha-blending a fully transparent frame changes nothing.
    let third = decoder.next_frame().unwrap().unwrap();
    assert_eq!(third.image.buf()[15], Rgba::new(255, 0, 0, 255));
}

#[test]
fn limits_apply_to_playback() {
    let mut encoder = AnimationEncoder::new(16, 12, lossless()).unwrap();
    for i in 0..3 {
        encoder.add_frame(moving_square(i).as_ref(), i as u64 * 10).unwrap();
    }
    let file = encoder.finish(30).unwrap();
    let limits = Limits {
        max_frames: Some(2),
        ..Limits::default()
    };
    assert!(matches!(AnimationDecoder::new(&file, &limits), Err(CodecError::LimitExceeded(_))));
    let limits = Limits {
        max_pixels: Some(100),
        ..Limits::default()
    };
    assert!(matches!(AnimationDecoder::new(&file, &limits), Err(CodecError::LimitExceeded(_))));
}

#[test]
fn still_images_play_as_one_frame() {
    let file = zenloop::EncodeRequest::lossless()
        .encode_rgba8(gradient(5, 5).as_ref())
        .unwrap()
        .data;
    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    assert_eq!(decoder.info().frame_count, 1);
    let frame = decoder.next_frame().unwrap().unwrap();
    assert_eq!(frame.image.buf(), gradient(5, 5).buf());
    assert!(decoder.next_frame().unwrap().is_none());
    assert!(!Demuxer::new(&file).unwrap().is_animated());
}

#[test]
fn zero_durations_play_at_default_rate() {
    let red =
        encode_frame(solid(4, 4, Rgba::new(255, 0, 0, 255)).as_ref(), &lossless(), None).unwrap();
    let blue =
        encode_frame(solid(4, 4, Rgba::new(0, 0, 255, 255)).as_ref(), &lossless(), None).unwrap();
    let mut mux = Mux::new();
    mux.set_animation(AnimationParams::default());
    mux.push_frame(MuxFrame::new(red).with_duration(0));
    mux.push_frame(MuxFrame::new(blue).with_duration(25));
    let file = mux.assemble().unwrap();

    let demux = Demuxer::new(&file).unwrap();
    assert_eq!(demux.frame(0).unwrap().duration_ms, 0);
    assert_eq!(demux.frame(0).unwrap().display_duration_ms(), DEFAULT_FRAME_DURATION_MS);
    assert_eq!(demux.total_duration_ms(), u64::from(DEFAULT_FRAME_DURATION_MS) + 25);

    let mut decoder = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    let first = decoder.next_frame().unwrap().unwrap();
    assert_eq!(first.duration_ms, DEFAULT_FRAME_DURATION_MS);
    let second = decoder.next_frame().unwrap().unwrap();
    assert_eq!(second.timestamp_ms, u64::from(DEFAULT_FRAME_DURATION_MS));
    assert_eq!(second.duration_ms, 25);

    // Remuxing keeps the stored value.
    assert_eq!(Mux::from_bytes(&file).unwrap().frames()[0].duration_ms, 0);
}

#[test]
fn loop_mode_mapping() {
    assert_eq!(LoopMode::from_loop_count(0), LoopMode::Infinite);
    assert_eq!(LoopMode::from_loop_count(1), LoopMode::Once);
    assert_eq!(LoopMode::from_loop_count(7), LoopMode::Repeat(7));
    assert_eq!(LoopMode::Repeat(7).loop_count(), 7);
    assert_eq!(LoopMode::Infinite.loop_count(), 0);
}
