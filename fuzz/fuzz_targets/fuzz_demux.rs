#![no_main]

use libfuzzer_sys::fuzz_target;
use zenloop::{DemuxState, Demuxer, Mux};

fuzz_target!(|data: &[u8]| {
    if let Ok(demux) = Demuxer::new_partial(data) {
        for frame in demux.frames() {
            assert!(frame.bitstream.len() <= data.len());
        }
        let _ = demux.chunks().len();
        let _ = (demux.icc_profile(), demux.exif(), demux.xmp());
        if demux.state() == DemuxState::Done {
            assert!(demux.frame_count() > 0);
        }
    }

    // A file the muxer accepts must reassemble into one it accepts again.
    if let Ok(mux) = Mux::from_bytes(data) {
        if let Ok(bytes) = mux.assemble() {
            let again = Mux::from_bytes(&bytes).expect("reassembled file must parse");
            assert_eq!(again.frame_count(), mux.frame_count());
            assert_eq!(again.icc_profile(), mux.icc_profile());
        }
    }
});
