#![no_main]

// Lossless encode then decode must reproduce every pixel exactly.

use libfuzzer_sys::{arbitrary, fuzz_target};
use zenloop::pixel::{ImgVec, Rgba};
use zenloop::{CodecConfig, DecodeRequest, EncodeRequest, LosslessConfig};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input {
    width: u8,
    effort: u8,
    pixels: Vec<[u8; 4]>,
}

fuzz_target!(|input: Input| {
    let width = usize::from(input.width).max(1);
    let height = input.pixels.len() / width;
    if height == 0 {
        return;
    }
    let pixels: Vec<Rgba<u8>> = input.pixels[..width * height]
        .iter()
        .map(|&[r, g, b, a]| Rgba::new(r, g, b, a))
        .collect();
    let image = ImgVec::new(pixels, width, height);

    let lossless = LosslessConfig::new().with_effort(input.effort % 10).with_exact(true);
    let config = CodecConfig::default().with_lossless(lossless);
    let encoded = EncodeRequest::lossless()
        .with_codec_config(&config)
        .encode_rgba8(image.as_ref())
        .expect("lossless encode");
    let decoded = DecodeRequest::new(&encoded.data).decode().expect("decode own output");
    assert_eq!(decoded.pixels.to_rgba8().buf(), image.buf());
});
