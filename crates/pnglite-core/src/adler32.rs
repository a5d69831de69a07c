//! Adler-32 (C4): the rolling checksum used by the zlib wrapper (RFC 1950).

const MOD_ADLER: u32 = 65521;

/// Streaming Adler-32 accumulator, same shape as [`crate::Crc32`].
#[derive(Clone, Copy, Debug)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    pub const fn new() -> Self {
        Adler32 { a: 1, b: 0 }
    }

    pub fn reset(&mut self) {
        self.a = 1;
        self.b = 0;
    }

    pub fn update(&mut self, bytes: &[u8]) {
        // NMAX from zlib: the largest number of bytes that can be summed
        // into `a` before it must be reduced mod 65521, without `a`
        // overflowing a u32. Chunking the reduction like this avoids a
        // modulo per byte.
        const NMAX: usize = 5552;

        let mut a = self.a;
        let mut b = self.b;

        for chunk in bytes.chunks(NMAX) {
            for &byte in chunk {
                a += u32::from(byte);
                b += a;
            }
            a %= MOD_ADLER;
            b %= MOD_ADLER;
        }

        self.a = a;
        self.b = b;
    }

    pub fn finalize(&self) -> u32 {
        (self.b << 16) | self.a
    }

    pub fn of(bytes: &[u8]) -> u32 {
        let mut adler = Self::new();
        adler.update(bytes);
        adler.finalize()
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        // zlib's own documented test vector.
        assert_eq!(Adler32::of(b"Wikipedia"), 0x11E6_0398);
    }

    #[test]
    fn empty_is_one() {
        assert_eq!(Adler32::of(&[]), 1);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let data = vec![7u8; 20_000];
        let one_shot = Adler32::of(&data);

        let mut streaming = Adler32::new();
        for chunk in data.chunks(777) {
            streaming.update(chunk);
        }
        assert_eq!(streaming.finalize(), one_shot);
    }
}
