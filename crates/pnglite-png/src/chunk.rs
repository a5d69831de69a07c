//! Chunk framing (C9): signature verification, (length, type, data, CRC)
//! reads, and the standalone streaming chunk iterator spec.md §6 names
//! as part of the public API surface. Grounded on
//! `zune_png::decoder::PngDecoder::read_chunk_header`, generalised to a
//! borrow-friendly iterator instead of a decoder-internal method.

use crate::errors::PngError;
use pnglite_core::bytes::ByteReader;
use pnglite_core::Crc32;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// One parsed chunk: its 4-byte type and a borrowed view of its payload.
#[derive(Copy, Clone, Debug)]
pub struct Chunk<'a> {
    pub chunk_type: [u8; 4],
    pub data: &'a [u8],
    pub crc: u32,
}

impl<'a> Chunk<'a> {
    pub fn type_str(&self) -> &str {
        std::str::from_utf8(&self.chunk_type).unwrap_or("????")
    }

    /// Property bits PNG encodes in the case of each type byte (§3):
    /// bit 5 of the first byte clear => critical (must-understand).
    pub fn is_critical(&self) -> bool {
        self.chunk_type[0] & 0x20 == 0
    }

    pub fn verify_crc(&self) -> Result<(), PngError> {
        let mut crc = Crc32::new();
        crc.update(&self.chunk_type);
        crc.update(self.data);
        let computed = crc.finalize();
        if computed != self.crc {
            return Err(PngError::CrcMismatch {
                chunk_type: self.chunk_type,
                expected: self.crc,
                found: computed,
            });
        }
        Ok(())
    }
}

/// Checks the 8-byte PNG signature and returns the reader positioned
/// just after it.
pub fn verify_signature<'a>(data: &'a [u8]) -> Result<ByteReader<'a>, PngError> {
    let mut reader = ByteReader::new(data);
    let sig = reader.read_bytes(8).map_err(|_| PngError::BadSignature)?;
    if sig != PNG_SIGNATURE {
        return Err(PngError::BadSignature);
    }
    Ok(reader)
}

/// Reads one chunk frame at the reader's current position, leaving it
/// positioned just after the CRC. `max_chunk_len` bounds the declared
/// length before any allocation happens (spec.md §5's per-chunk cap).
pub fn read_chunk<'a>(
    reader: &mut ByteReader<'a>,
    max_chunk_len: u64,
) -> Result<Chunk<'a>, PngError> {
    let length = reader.read_u32_be().map_err(|_| PngError::TruncatedInput)?;
    if u64::from(length) > max_chunk_len || length > 0x7FFF_FFFF {
        return Err(PngError::ChunkTooLarge {
            length: u64::from(length),
            max: max_chunk_len,
        });
    }
    let type_bytes = reader.read_bytes(4).map_err(|_| PngError::TruncatedInput)?;
    let chunk_type: [u8; 4] = type_bytes.try_into().unwrap();
    let data = reader
        .read_bytes(length as usize)
        .map_err(|_| PngError::TruncatedInput)?;
    let crc = reader.read_u32_be().map_err(|_| PngError::TruncatedInput)?;

    Ok(Chunk { chunk_type, data, crc })
}

/// Streaming inspection iterator over a PNG's chunks, bypassing the
/// decode pipeline entirely -- spec.md §6's "Auxiliary: streaming chunk
/// iterator for inspection". Stops (yielding `None`) after IEND or on
/// the first framing error, which the error-carrying variant exposes.
pub struct ChunkIter<'a> {
    reader: ByteReader<'a>,
    max_chunk_len: u64,
    done: bool,
}

impl<'a> ChunkIter<'a> {
    /// `data` must start at the 8-byte signature.
    pub fn new(data: &'a [u8]) -> Result<Self, PngError> {
        let reader = verify_signature(data)?;
        Ok(ChunkIter {
            reader,
            max_chunk_len: u64::from(u32::MAX),
            done: false,
        })
    }

    pub fn with_max_chunk_len(mut self, max: u64) -> Self {
        self.max_chunk_len = max;
        self
    }
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = Result<Chunk<'a>, PngError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match read_chunk(&mut self.reader, self.max_chunk_len) {
            Ok(chunk) => {
                if &chunk.chunk_type == b"IEND" {
                    self.done = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnglite_core::Crc32;

    fn build_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(data);
        let mut crc = Crc32::new();
        crc.update(chunk_type);
        crc.update(data);
        out.extend_from_slice(&crc.finalize().to_be_bytes());
    }

    #[test]
    fn rejects_bad_signature() {
        let data = [0u8; 16];
        assert!(matches!(verify_signature(&data), Err(PngError::BadSignature)));
    }

    #[test]
    fn reads_a_chunk_and_checks_crc() {
        let mut png = PNG_SIGNATURE.to_vec();
        build_chunk(&mut png, b"IHDR", b"hello-ihdr-ish");
        build_chunk(&mut png, b"IEND", b"");

        let mut reader = verify_signature(&png).unwrap();
        let chunk = read_chunk(&mut reader, u64::from(u32::MAX)).unwrap();
        assert_eq!(&chunk.chunk_type, b"IHDR");
        assert!(chunk.is_critical());
        chunk.verify_crc().unwrap();
    }

    #[test]
    fn tampered_crc_is_rejected() {
        let mut png = PNG_SIGNATURE.to_vec();
        build_chunk(&mut png, b"IDAT", b"some-data");
        if let Some(b) = png.last_mut() {
            *b ^= 1;
        }

        let mut reader = verify_signature(&png).unwrap();
        let chunk = read_chunk(&mut reader, u64::from(u32::MAX)).unwrap();
        assert!(matches!(chunk.verify_crc(), Err(PngError::CrcMismatch { .. })));
    }

    #[test]
    fn iterator_stops_after_iend() {
        let mut png = PNG_SIGNATURE.to_vec();
        build_chunk(&mut png, b"IHDR", b"x");
        build_chunk(&mut png, b"IEND", b"");

        let chunks: Vec<_> = ChunkIter::new(&png).unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(&chunks[1].chunk_type, b"IEND");
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let mut png = PNG_SIGNATURE.to_vec();
        build_chunk(&mut png, b"IDAT", &[0u8; 100]);
        let mut reader = verify_signature(&png).unwrap();
        assert!(matches!(
            read_chunk(&mut reader, 10),
            Err(PngError::ChunkTooLarge { .. })
        ));
    }
}
