//! Chunk-level reading and writing of the RIFF layout.

use alloc::vec::Vec;

use super::MuxError;
use crate::format::{CHUNK_HEADER_SIZE, FourCc, MAX_CHUNK_PAYLOAD, RIFF_HEADER_SIZE};

/// Little-endian integer of up to four bytes.
pub(crate) fn le(bytes: &[u8]) -> u32 {
    bytes.iter().rev().fold(0, |acc, &b| acc << 8 | u32::from(b))
}

pub(crate) fn put_u24(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes()[..3]);
}

/// A chunk as found in the byte stream.
pub(crate) struct RawChunk<'a> {
    pub fourcc: FourCc,
    /// File offset of the payload.
    pub offset: usize,
    pub payload: &'a [u8],
    /// False when the payload was cut short by the end of the data.
    pub complete: bool,
    /// Offset of the following chunk header.
    pub next: usize,
}

/// Reads the chunk starting at `pos`, not looking past `end`.
///
/// Returns `Ok(None)` at `end` and `Err(Truncated)` when fewer than eight
/// header bytes remain.
pub(crate) fn read_chunk(
    data: &[u8],
    pos: usize,
    end: usize,
) -> Result<Option<RawChunk<'_>>, MuxError> {
    if pos >= end {
        return Ok(None);
    }
    let header = data.get(pos..pos + CHUNK_HEADER_SIZE).filter(|_| pos + CHUNK_HEADER_SIZE <= end);
    let header = header.ok_or(MuxError::Truncated)?;
    let fourcc = FourCc::from_slice(header).ok_or(MuxError::Truncated)?;
    let size = le(&header[4..8]);
    if size > MAX_CHUNK_PAYLOAD {
        return Err(MuxError::InvalidChunkSize(fourcc));
    }
    let offset = pos + CHUNK_HEADER_SIZE;
    let declared_end = offset.checked_add(size as usize).ok_or(MuxError::InvalidChunkSize(fourcc))?;
    let payload_end = declared_end.min(end);
    Ok(Some(RawChunk {
        fourcc,
        offset,
        payload: &data[offset..payload_end],
        complete: declared_end <= end,
        next: (declared_end + (size as usize & 1)).min(end),
    }))
}

/// Validates the RIFF header and returns the end of the RIFF payload,
/// clamped to the data, plus whether the clamp was needed.
pub(crate) fn riff_extent(data: &[u8]) -> Result<(usize, bool), MuxError> {
    if data.len() < RIFF_HEADER_SIZE {
        let prefix_ok = b"RIFF".iter().zip(data).all(|(a, b)| a == b);
        return Err(if prefix_ok { MuxError::Truncated } else { MuxError::NotRiff });
    }
    if !crate::format::is_supported(data) {
        return Err(MuxError::NotRiff);
    }
    let riff_size = le(&data[4..8]);
    if (riff_size as usize) < RIFF_HEADER_SIZE - 8 + CHUNK_HEADER_SIZE
        || riff_size > MAX_CHUNK_PAYLOAD
    {
        return Err(MuxError::InvalidChunkSize(FourCc::RIFF));
    }
    let end = (riff_size as usize).saturating_add(8);
    Ok((end.min(data.len()), end > data.len()))
}

/// Appends a chunk with its header and padding byte.
pub(crate) fn write_chunk(
    out: &mut Vec<u8>,
    fourcc: FourCc,
    payload: &[u8],
) -> Result<(), MuxError> {
    let size = u32::try_from(payload.len())
        .ok()
        .filter(|&s| s <= MAX_CHUNK_PAYLOAD)
        .ok_or(MuxError::InvalidChunkSize(fourcc))?;
    out.extend_from_slice(fourcc.as_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(payload);
    if size & 1 == 1 {
        out.push(0);
    }
    Ok(())
}

/// Encoded size of a chunk carrying `payload_len` bytes.
pub(crate) fn chunk_size(payload_len: usize) -> usize {
    CHUNK_HEADER_SIZE + payload_len + (payload_len & 1)
}

/// Prefixes `body` (a sequence of chunks) with the RIFF header.
pub(crate) fn wrap_riff(body: &[u8]) -> Result<Vec<u8>, MuxError> {
    let size = u32::try_from(body.len() + 4)
        .ok()
        .filter(|&s| s <= MAX_CHUNK_PAYLOAD)
        .ok_or(MuxError::OutOfRange("file size"))?;
    let mut out = Vec::with_capacity(RIFF_HEADER_SIZE + body.len());
    out.extend_from_slice(FourCc::RIFF.as_bytes());
    out.extend_from_slice(&size.to_le_bytes());
    out.extend_from_slice(FourCc::WEBP.as_bytes());
    out.extend_from_slice(body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn chunk_padding() {
        let mut out = Vec::new();
        write_chunk(&mut out, FourCc::EXIF, &[1, 2, 3]).unwrap();
        assert_eq!(out.len(), chunk_size(3));
        assert_eq!(out, [b'E', b'X', b'I', b'F', 3, 0, 0, 0, 1, 2, 3, 0]);
        let chunk = read_chunk(&out, 0, out.len()).unwrap().unwrap();
        assert_eq!(
            (chunk.fourcc, chunk.payload, chunk.complete, chunk.next),
            (FourCc::EXIF, &[1u8, 2, 3][..], true, 12)
        );
    }

    #[test]
    fn truncated_chunk_is_flagged() {
        let mut out = Vec::new();
        write_chunk(&mut out, FourCc::XMP, &[9; 10]).unwrap();
        let chunk = read_chunk(&out, 0, 12).unwrap().unwrap();
        assert!(!chunk.complete);
        assert_eq!(chunk.payload.len(), 4);
        assert!(matches!(read_chunk(&out, 0, 5), Err(MuxError::Truncated)));
        assert!(read_chunk(&out, 12, 12).unwrap().is_none());
    }

    #[test]
    fn riff_header_checks() {
        let file = wrap_riff(&[0u8; 8]).unwrap();
        assert_eq!(riff_extent(&file).unwrap(), (20, false));
        assert_eq!(riff_extent(&file[..16]).unwrap(), (16, true));
        assert_eq!(riff_extent(b"RIF"), Err(MuxError::Truncated));
        assert_eq!(riff_extent(b"GIF89a"), Err(MuxError::NotRiff));
        assert_eq!(riff_extent(&vec![0u8; 16]), Err(MuxError::NotRiff));
    }

    #[test]
    fn little_endian_fields() {
        let mut out = Vec::new();
        put_u24(&mut out, 0x01_0203);
        put_u24(&mut out, 0x0405);
        assert_eq!(out, [3, 2, 1, 5, 4, 0]);
        assert_eq!(le(&out[..3]), 0x01_0203);
        assert_eq!(le(&out[3..5]), 0x0405);
    }
}
