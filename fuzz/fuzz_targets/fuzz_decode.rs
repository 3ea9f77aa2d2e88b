#![no_main]

use libfuzzer_sys::{arbitrary, fuzz_target};
use zenloop::{DecodeRequest, Limits};

#[derive(Debug, arbitrary::Arbitrary)]
struct Input<'a> {
    frame_index: u8,
    data: &'a [u8],
}

fuzz_target!(|input: Input<'_>| {
    let limits = Limits {
        max_pixels: Some(1 << 22),
        max_memory_bytes: Some(1 << 26),
        max_frames: Some(64),
        ..Limits::default()
    };
    if let Ok(output) = DecodeRequest::new(input.data)
        .with_limits(&limits)
        .with_frame_index(usize::from(input.frame_index))
        .decode()
    {
        assert_eq!(output.width(), output.info.width);
        assert_eq!(output.height(), output.info.height);
    }
});
