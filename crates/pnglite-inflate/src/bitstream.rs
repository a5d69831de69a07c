//! LSB-first bit reader (C1), the primitive every DEFLATE block decode
//! sits on top of. Bits are delivered in the order RFC 1951 mandates:
//! the first bit read from a byte is its least-significant bit.
//!
//! The internal bit buffer is a 64-bit word so that a `refill` can
//! always load a full byte without ever dropping pending bits -- wider
//! than the 24-bit minimum spec.md §9 calls out, which is a permitted
//! local optimisation, not a change of contract.

/// Bits requested or consumed exceed what remains in the backing slice.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UnexpectedEof;

pub struct BitReader<'a> {
    data: &'a [u8],
    /// Byte offset of the next byte `refill` has not yet pulled in.
    byte_pos: usize,
    /// Pending bits, LSB-aligned: the next bit to read is `buffer & 1`.
    buffer: u64,
    bits_in_buffer: u32,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        BitReader {
            data,
            byte_pos: 0,
            buffer: 0,
            bits_in_buffer: 0,
        }
    }

    /// Current byte offset into the backing slice, rounded down to
    /// account for bits still sitting in the buffer. Used to find where
    /// a stored block's length-prefixed payload begins, and where the
    /// caller's trailer (e.g. Adler-32) starts once a deflate stream
    /// ends.
    pub fn byte_position(&self) -> usize {
        self.byte_pos - (self.bits_in_buffer / 8) as usize
    }

    pub fn bits_buffered(&self) -> u32 {
        self.bits_in_buffer
    }

    /// Bytes not yet pulled into the bit buffer.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len() - self.byte_pos
    }

    /// Pull as many whole bytes as fit into the buffer. Cheap and safe
    /// to call often; does nothing once the buffer is full or the
    /// backing slice is exhausted.
    pub fn refill(&mut self) {
        while self.bits_in_buffer <= 56 && self.byte_pos < self.data.len() {
            self.buffer |= u64::from(self.data[self.byte_pos]) << self.bits_in_buffer;
            self.byte_pos += 1;
            self.bits_in_buffer += 8;
        }
    }

    /// Whether at least `n` bits are available right now (after a
    /// `refill`).
    pub fn has(&self, n: u32) -> bool {
        self.bits_in_buffer >= n
    }

    /// Peek the low `n` bits without consuming them. `n` must be <= 57
    /// (the widest field DEFLATE ever reads in one call).
    pub fn peek_bits(&self, n: u32) -> u32 {
        debug_assert!(n <= 57);
        if n == 0 {
            return 0;
        }
        (self.buffer & ((1u64 << n) - 1)) as u32
    }

    /// Drop `n` already-peeked bits from the buffer.
    pub fn drop_bits(&mut self, n: u32) {
        self.buffer >>= n;
        self.bits_in_buffer -= n;
    }

    /// Read and consume `n` bits (0..=16), refilling if needed. Fails
    /// with `UnexpectedEof` if the stream runs out before `n` bits are
    /// available, per spec.md §4.1.
    pub fn read_bits(&mut self, n: u32) -> Result<u32, UnexpectedEof> {
        debug_assert!(n <= 16);
        if n == 0 {
            return Ok(0);
        }
        if !self.has(n) {
            self.refill();
            if !self.has(n) {
                return Err(UnexpectedEof);
            }
        }
        let v = self.peek_bits(n);
        self.drop_bits(n);
        Ok(v)
    }

    pub fn read_bit(&mut self) -> Result<u32, UnexpectedEof> {
        self.read_bits(1)
    }

    /// Discard pending bits up to the next byte boundary, per spec.md
    /// §4.1 (`align_to_byte`), used before a stored block's LEN/NLEN.
    pub fn align_to_byte(&mut self) {
        let drop = self.bits_in_buffer % 8;
        self.drop_bits(drop);
    }

    /// Byte-align, then read one byte.
    pub fn read_byte(&mut self) -> Result<u8, UnexpectedEof> {
        self.align_to_byte();
        Ok(self.read_bits(8)? as u8)
    }

    /// Byte-align, then copy `dst.len()` bytes directly from the backing
    /// slice (bypassing the bit buffer machinery, since a byte-aligned
    /// copy is exactly what stored blocks need).
    pub fn read_bytes(&mut self, dst: &mut [u8]) -> Result<(), UnexpectedEof> {
        self.align_to_byte();
        // Bits remaining in the buffer, rounded to whole bytes, must be
        // accounted for before reading straight from `data`.
        let buffered_bytes = (self.bits_in_buffer / 8) as usize;
        let start = self.byte_pos - buffered_bytes;
        let end = start.checked_add(dst.len()).ok_or(UnexpectedEof)?;
        let src = self.data.get(start..end).ok_or(UnexpectedEof)?;
        dst.copy_from_slice(src);

        // Resync: drop whatever of the copied region was still sitting
        // in the buffer. If the request reached past what was buffered,
        // jump `byte_pos` forward to the new position; otherwise the
        // unconsumed buffered bytes remain valid right where they are.
        let consume_from_buffer = buffered_bytes.min(dst.len());
        self.drop_bits((consume_from_buffer * 8) as u32);
        if dst.len() > buffered_bytes {
            self.byte_pos = end;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_order() {
        // 0b1011_0010 -> bits read low to high: 0,1,0,0,1,1,0,1
        let data = [0b1011_0010u8];
        let mut r = BitReader::new(&data);
        r.refill();
        let expected = [0, 1, 0, 0, 1, 1, 0, 1];
        for bit in expected {
            assert_eq!(r.read_bit().unwrap(), bit);
        }
    }

    #[test]
    fn read_bits_zero_is_noop() {
        let data = [0xFF];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(0).unwrap(), 0);
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
    }

    #[test]
    fn peek_is_idempotent_before_consume() {
        let data = [0b1010_1010, 0b1100_1100];
        let mut r = BitReader::new(&data);
        r.refill();
        let a = r.peek_bits(5);
        let b = r.peek_bits(5);
        assert_eq!(a, b);
        r.drop_bits(5);
    }

    #[test]
    fn eof_when_exhausted() {
        let data = [0xFFu8];
        let mut r = BitReader::new(&data);
        assert_eq!(r.read_bits(8).unwrap(), 0xFF);
        assert_eq!(r.read_bits(1), Err(UnexpectedEof));
    }

    #[test]
    fn align_then_read_bytes() {
        let data = [0b0000_0111, 0xAB, 0xCD];
        let mut r = BitReader::new(&data);
        r.refill();
        assert_eq!(r.read_bits(3).unwrap(), 0b111);
        let mut out = [0u8; 2];
        r.read_bytes(&mut out).unwrap();
        assert_eq!(out, [0xAB, 0xCD]);
    }
}
