use alloc::vec::Vec;

/// LSB-first bit writer.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    buffer: Vec<u8>,
    acc: u64,
    nbits: u32,
}

impl BitWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with `capacity` bytes reserved.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            acc: 0,
            nbits: 0,
        }
    }

    /// Appends the low `count` bits of `value` (count at most 32).
    #[inline]
    pub fn write_bits(&mut self, value: u32, count: u32) {
        debug_assert!(count <= 32);
        debug_assert!(count == 32 || value >> count == 0);
        if count == 0 {
            return;
        }
        self.acc |= u64::from(value) << self.nbits;
        self.nbits += count;
        while self.nbits >= 8 {
            self.buffer.push(self.acc as u8);
            self.acc >>= 8;
            self.nbits -= 8;
        }
    }

    /// Appends one flag bit.
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bits(u32::from(bit), 1);
    }

    /// Total number of bits written.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.buffer.len() * 8 + self.nbits as usize
    }

    /// Finishes the stream, zero-padding the last partial byte.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.nbits > 0 {
            self.buffer.push(self.acc as u8);
        }
        self.buffer
    }
}
