//! Bit-level I/O shared by the lossless, lossy and alpha bitstreams.
//!
//! Both directions are LSB-first: the first bit written lands in bit 0 of
//! the first byte. Prefix codes are stored bit-reversed so that they can be
//! emitted and peeked with the same primitive.

mod reader;
mod writer;

pub use reader::BitReader;
pub use writer::BitWriter;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_reader_mixed_widths() {
        let mut w = BitWriter::new();
        w.write_bits(0b101, 3);
        w.write_bits(0x2f, 8);
        w.write_bit(true);
        w.write_bits(0x3fff, 14);
        w.write_bits(0xdead_beef, 32);
        let bytes = w.into_bytes();

        let mut r = BitReader::new(&bytes);
        assert_eq!(r.read_bits(3).unwrap(), 0b101);
        assert_eq!(r.read_bits(8).unwrap(), 0x2f);
        assert!(r.read_bit().unwrap());
        assert_eq!(r.read_bits(14).unwrap(), 0x3fff);
        assert_eq!(r.read_bits(32).unwrap(), 0xdead_beef);
    }

    #[test]
    fn lsb_first_layout() {
        let mut w = BitWriter::new();
        w.write_bit(true);
        w.write_bits(0, 6);
        w.write_bit(true);
        assert_eq!(w.into_bytes(), [0x81]);
    }

    #[test]
    fn reading_past_end_fails() {
        let mut r = BitReader::new(&[0xff]);
        assert_eq!(r.read_bits(8).unwrap(), 0xff);
        assert!(r.read_bits(1).is_err());
    }

    #[test]
    fn peek_past_end_is_zero_filled() {
        let mut r = BitReader::new(&[0x01]);
        assert_eq!(r.peek_bits(16), 0x0001);
        assert!(r.consume(8).is_ok());
        assert!(r.is_exhausted());
    }
}
