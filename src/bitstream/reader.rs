use crate::error::BitstreamError;

/// LSB-first bit reader over a borrowed byte slice.
///
/// Peeking beyond the end yields zero bits; consuming them is an error.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next byte to load into the accumulator.
    pos: usize,
    /// Bit accumulator, valid bits in the low `nbits`.
    buf: u64,
    nbits: u32,
}

impl<'a> BitReader<'a> {
    /// Creates a reader positioned at the first bit of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        let mut reader = Self {
            data,
            pos: 0,
            buf: 0,
            nbits: 0,
        };
        reader.refill();
        reader
    }

    #[inline]
    fn refill(&mut self) {
        while self.nbits <= 56 && self.pos < self.data.len() {
            self.buf |= u64::from(self.data[self.pos]) << self.nbits;
            self.pos += 1;
            self.nbits += 8;
        }
    }

    /// Returns the next `count` bits (at most 32) without consuming them.
    #[inline]
    #[must_use]
    pub fn peek_bits(&mut self, count: u32) -> u32 {
        debug_assert!(count <= 32);
        if self.nbits < count {
            self.refill();
        }
        if count == 0 {
            return 0;
        }
        (self.buf & ((1u64 << count) - 1)) as u32
    }

    /// Drops `count` bits that were previously peeked.
    #[inline]
    pub fn consume(&mut self, count: u32) -> Result<(), BitstreamError> {
        if self.nbits < count {
            self.refill();
            if self.nbits < count {
                self.buf = 0;
                self.nbits = 0;
                return Err(BitstreamError::UnexpectedEof);
            }
        }
        self.buf >>= count;
        self.nbits -= count;
        Ok(())
    }

    /// Reads `count` bits (at most 32) as an unsigned value.
    #[inline]
    pub fn read_bits(&mut self, count: u32) -> Result<u32, BitstreamError> {
        let value = self.peek_bits(count);
        self.consume(count)?;
        Ok(value)
    }

    /// Reads a single flag bit.
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool, BitstreamError> {
        Ok(self.read_bits(1)? == 1)
    }

    /// True once every input bit has been consumed.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.nbits == 0 && self.pos >= self.data.len()
    }

    /// Number of input bytes touched so far, rounded up to whole bytes.
    #[must_use]
    pub fn bytes_consumed(&self) -> usize {
        self.pos - (self.nbits / 8) as usize
    }
}
