//! Encode/decode round trips through the public request builders.

mod common;

use common::{gradient, mean_abs_error, noise, palette, soft_alpha, solid};
use zenloop::pixel::{Bgra, ImgVec, Rgb, Rgba};
use zenloop::{
    BitstreamFormat, CodecConfig, DecodeConfig, DecodeRequest, EncodeRequest, LosslessConfig,
    LossyConfig, PixelLayout, Subsampling, Upsampling,
};

fn decode_rgba(data: &[u8]) -> ImgVec<Rgba<u8>> {
    DecodeRequest::new(data).decode().unwrap().pixels.to_rgba8()
}

/// Without `exact`, the encoder may discard the color of fully transparent
/// pixels.
fn visible(image: &ImgVec<Rgba<u8>>) -> Vec<Rgba<u8>> {
    image.pixels().map(|p| if p.a == 0 { Rgba::new(0, 0, 0, 0) } else { p }).collect()
}

#[test]
fn lossless_is_bit_exact() {
    let cases = [
        ("gradient", gradient(64, 48)),
        ("noise", noise(33, 17, 7, false)),
        ("noise_alpha", noise(20, 31, 99, true)),
        ("palette", palette(41, 23, 12)),
        ("soft_alpha", soft_alpha(32, 32)),
        ("single_pixel", solid(1, 1, Rgba::new(1, 2, 3, 4))),
        ("transparent", solid(5, 3, Rgba::new(0, 0, 0, 0))),
    ];
    for (name, image) in cases {
        for effort in [0, 5, 9] {
            let encoded = EncodeRequest::lossless()
                .with_effort(effort)
                .encode_rgba8(image.as_ref())
                .unwrap();
            assert_eq!(encoded.format, BitstreamFormat::Lossless);
            let decoded = decode_rgba(&encoded.data);
            assert_eq!(visible(&decoded), visible(&image), "{name} at effort {effort}");
        }
        let exact = CodecConfig::default().with_lossless(LosslessConfig::new().with_exact(true));
        let encoded = EncodeRequest::lossless()
            .with_codec_config(&exact)
            .encode_rgba8(image.as_ref())
            .unwrap();
        assert_eq!(decode_rgba(&encoded.data).buf(), image.buf(), "{name} exact");
    }
}

#[test]
fn lossless_rows_and_pixel_layouts() {
    let image = noise(9, 6, 3, true);
    let bgra: Vec<Bgra<u8>> = image
        .pixels()
        .map(|p| Bgra { b: p.b, g: p.g, r: p.r, a: p.a })
        .collect();
    let bgra = ImgVec::new(bgra, 9, 6);
    let via_bgra = EncodeRequest::lossless().encode_bgra8(bgra.as_ref()).unwrap();
    assert_eq!(visible(&decode_rgba(&via_bgra.data)), visible(&image));

    let rgb: Vec<Rgb<u8>> = image.pixels().map(|p| Rgb::new(p.r, p.g, p.b)).collect();
    let via_rgb = EncodeRequest::lossless().encode_rgb8(ImgVec::new(rgb, 9, 6).as_ref()).unwrap();
    let decoded = DecodeRequest::new(&via_rgb.data)
        .with_output_layout(PixelLayout::Rgb8)
        .decode()
        .unwrap();
    let expected: Vec<u8> = image.pixels().flat_map(|p| [p.r, p.g, p.b]).collect();
    assert_eq!(decoded.pixels.to_bytes(), expected);
    assert!(!decoded.info.has_alpha);

    let bytes: Vec<u8> = image.pixels().flat_map(|p| [p.r, p.g, p.b, p.a]).collect();
    let via_bytes = EncodeRequest::lossless().encode(&bytes, PixelLayout::Rgba8, 9, 6).unwrap();
    let via_image = EncodeRequest::lossless().encode_rgba8(image.as_ref()).unwrap();
    assert_eq!(via_bytes.data, via_image.data);
    assert!(EncodeRequest::lossless().encode(&bytes[1..], PixelLayout::Rgba8, 9, 6).is_err());
}

#[test]
fn lossy_error_falls_with_quality() {
    let image = gradient(96, 64);
    let mut previous = f64::MAX;
    for quality in [10.0, 50.0, 90.0] {
        let encoded = EncodeRequest::lossy(quality).encode_rgba8(image.as_ref()).unwrap();
        assert_eq!(encoded.format, BitstreamFormat::Lossy);
        let err = mean_abs_error(&image, &decode_rgba(&encoded.data));
        assert!(err <= previous, "quality {quality}: {err} > {previous}");
        previous = err;
    }
    assert!(previous < 4.0, "mean error at quality 90: {previous}");
}

#[test]
fn lossy_full_chroma() {
    let image = gradient(40, 40);
    let config = CodecConfig::default()
        .with_lossy(LossyConfig::new().with_quality(95.0).with_subsampling(Subsampling::Yuv444))
        .with_decoder(DecodeConfig::new().with_upsampling(Upsampling::Nearest));
    let encoded = EncodeRequest::lossy(95.0)
        .with_codec_config(&config)
        .encode_rgba8(image.as_ref())
        .unwrap();
    let decoded = DecodeRequest::new(&encoded.data).with_codec_config(&config).decode().unwrap();
    assert!(mean_abs_error(&image, &decoded.pixels.to_rgba8()) < 3.0);
}

#[test]
fn lossy_alpha_is_exact_at_full_alpha_quality() {
    let image = soft_alpha(48, 40);
    let encoded = EncodeRequest::lossy(80.0).encode_rgba8(image.as_ref()).unwrap();
    let output = DecodeRequest::new(&encoded.data).decode().unwrap();
    assert!(output.info.has_alpha);
    let decoded = output.pixels.to_rgba8();
    for (p, q) in image.pixels().zip(decoded.pixels()) {
        assert_eq!(p.a, q.a);
    }
}

#[test]
fn lossy_alpha_quality_reduces_levels() {
    let image = soft_alpha(48, 40);
    let config = CodecConfig::default()
        .with_lossy(LossyConfig::new().with_quality(80.0).with_alpha_quality(20));
    let encoded = EncodeRequest::lossy(80.0)
        .with_codec_config(&config)
        .encode_rgba8(image.as_ref())
        .unwrap();
    let decoded = decode_rgba(&encoded.data);
    let max_alpha_error = image
        .pixels()
        .zip(decoded.pixels())
        .map(|(p, q)| p.a.abs_diff(q.a))
        .max()
        .unwrap();
    assert!(max_alpha_error < 64, "{max_alpha_error}");
}

#[test]
fn auto_mode_follows_color_count() {
    let graphic = palette(50, 30, 16);
    let encoded = EncodeRequest::auto().encode_rgba8(graphic.as_ref()).unwrap();
    assert_eq!(encoded.format, BitstreamFormat::Lossless);
    assert_eq!(decode_rgba(&encoded.data).buf(), graphic.buf());

    let photo = noise(50, 30, 11, false);
    let default_quality = EncodeRequest::auto().encode_rgba8(photo.as_ref()).unwrap();
    assert_eq!(default_quality.format, BitstreamFormat::Lossy);
    let max_quality = EncodeRequest::auto()
        .with_quality(100.0)
        .encode_rgba8(photo.as_ref())
        .unwrap();
    assert_eq!(max_quality.format, BitstreamFormat::Lossless);
}

#[test]
fn odd_sizes() {
    for (w, h) in [(1, 7), (7, 1), (17, 3), (3, 17), (15, 15)] {
        let image = gradient(w, h);
        let lossless = EncodeRequest::lossless().encode_rgba8(image.as_ref()).unwrap();
        assert_eq!(decode_rgba(&lossless.data).buf(), image.buf(), "{w}x{h}");
        let lossy = EncodeRequest::lossy(75.0).encode_rgba8(image.as_ref()).unwrap();
        let decoded = decode_rgba(&lossy.data);
        assert_eq!((decoded.width(), decoded.height()), (w, h));
    }
}

/// Pixels as decoded by `image-webp`, widened to RGBA.
fn reference_decode(data: &[u8]) -> (u32, u32, Vec<Rgba<u8>>) {
    let mut decoder = image_webp::WebPDecoder::new(std::io::Cursor::new(data)).unwrap();
    let (width, height) = decoder.dimensions();
    let mut buf = vec![0u8; decoder.output_buffer_size().unwrap()];
    decoder.read_image(&mut buf).unwrap();
    (width, height, widen(&buf, width, height))
}

fn widen(buf: &[u8], width: u32, height: u32) -> Vec<Rgba<u8>> {
    match buf.len() / (width as usize * height as usize) {
        4 => buf.chunks_exact(4).map(|p| Rgba::new(p[0], p[1], p[2], p[3])).collect(),
        3 => buf.chunks_exact(3).map(|p| Rgba::new(p[0], p[1], p[2], 255)).collect(),
        n => panic!("unexpected {n} channels"),
    }
}

#[test]
fn lossless_files_read_by_webp_decoders() {
    let cases = [
        ("gradient", gradient(64, 48)),
        ("noise", noise(33, 17, 7, false)),
        ("noise_alpha", noise(20, 31, 99, true)),
        ("palette", palette(41, 23, 12)),
        ("two_colors", palette(9, 7, 2)),
        ("soft_alpha", soft_alpha(32, 32)),
        ("single_pixel", solid(1, 1, Rgba::new(1, 2, 3, 4))),
    ];
    for (name, image) in cases {
        for effort in [0, 3, 6, 9] {
            let file = EncodeRequest::lossless()
                .with_effort(effort)
                .encode_rgba8(image.as_ref())
                .unwrap()
                .data;
            let (width, height, pixels) = reference_decode(&file);
            let size = (width as usize, height as usize);
            assert_eq!(size, (image.width(), image.height()), "{name}");
            assert_eq!(pixels, decode_rgba(&file).buf().as_slice(), "{name} at effort {effort}");
        }
    }
}

#[test]
fn lossless_animation_read_by_webp_decoders() {
    use zenloop::{AnimationDecoder, AnimationEncoder, EncodeMode, FrameSettings, Limits};

    let settings = FrameSettings {
        mode: EncodeMode::Lossless,
        ..FrameSettings::default()
    };
    let mut encoder = AnimationEncoder::new(24, 16, settings).unwrap();
    for step in 0..4u8 {
        let mut frame = gradient(24, 16);
        for y in 4..10 {
            for x in usize::from(step) * 4..usize::from(step) * 4 + 6 {
                frame[(x, y)] = Rgba::new(250, 10 * step, 30, 255);
            }
        }
        encoder.add_frame(frame.as_ref(), u64::from(step) * 50).unwrap();
    }
    let file = encoder.finish(200).unwrap();

    let mut reference = image_webp::WebPDecoder::new(std::io::Cursor::new(&file[..])).unwrap();
    assert!(reference.is_animated());
    assert_eq!(reference.num_frames(), 4);
    let mut ours = AnimationDecoder::new(&file, &Limits::none()).unwrap();
    let mut buf = vec![0u8; reference.output_buffer_size().unwrap()];
    while let Some(frame) = ours.next_frame().unwrap() {
        let duration = reference.read_frame(&mut buf).unwrap();
        assert_eq!(duration, frame.duration_ms, "frame {}", frame.index);
        assert_eq!(widen(&buf, 24, 16), frame.image.buf().as_slice(), "frame {}", frame.index);
    }
}
