//! DEFLATE inflate (C6) and the decode half of the zlib wrapper (C8).
//! Grounded on `zune-inflate`'s `DeflateDecoder`: the same block loop
//! shape (stored / static / dynamic, BFINAL-terminated), the same
//! precode-then-litlen/offset table construction for dynamic blocks, and
//! output managed as one growable `Vec<u8>` that doubles as the 32 KiB
//! sliding window (back-references index straight into it) rather than
//! a separate ring buffer -- simpler, and still bounded to distances
//! actually producible once the per-call cap in `pnglite-png` is
//! enforced by the caller.

use crate::bitstream::BitReader;
use crate::constants::{
    DEFLATE_BLOCKTYPE_DYNAMIC, DEFLATE_BLOCKTYPE_STATIC, DEFLATE_BLOCKTYPE_STORED, DIST_BASE,
    DIST_EXTRA_BITS, LENGTH_BASE, LENGTH_EXTRA_BITS, NUM_PRECODE_SYMBOLS,
    PRECODE_LENS_PERMUTATION,
};
use crate::errors::InflateError;
use crate::huffman::HuffmanTable;
use pnglite_core::Adler32;

#[cfg(feature = "log")]
use log::{debug, trace};

/// Decodes a raw DEFLATE stream (no zlib wrapper).
pub fn inflate(data: &[u8]) -> Result<Vec<u8>, InflateError> {
    inflate_capped(data, usize::MAX)
}

/// As [`inflate`], but aborts with [`InflateError::OutputTooLarge`] once
/// more than `max_output_bytes` have been produced. Used by
/// `pnglite-png` to enforce `DecoderOptions::max_pixels` before an
/// adversarial IHDR can make the decoder allocate without bound.
pub fn inflate_capped(data: &[u8], max_output_bytes: usize) -> Result<Vec<u8>, InflateError> {
    let mut reader = BitReader::new(data);
    reader.refill();
    let mut out = Vec::with_capacity(data.len().saturating_mul(3).min(1 << 20));

    loop {
        if !reader.has(3) {
            reader.refill();
            if !reader.has(3) {
                return Err(InflateError::UnexpectedEof);
            }
        }
        let is_final = reader.read_bits(1)? == 1;
        let block_type = reader.read_bits(2)?;

        #[cfg(feature = "log")]
        trace!("deflate block: final={is_final} type={block_type}");

        match block_type {
            DEFLATE_BLOCKTYPE_STORED => decode_stored_block(&mut reader, &mut out)?,
            DEFLATE_BLOCKTYPE_STATIC => {
                let litlen = HuffmanTable::build(&crate::constants::fixed_litlen_lengths())?;
                let dist = HuffmanTable::build(&crate::constants::fixed_dist_lengths())?;
                decode_huffman_block(&mut reader, &litlen, &dist, &mut out, max_output_bytes)?;
            }
            DEFLATE_BLOCKTYPE_DYNAMIC => {
                let (litlen, dist) = read_dynamic_tables(&mut reader)?;
                decode_huffman_block(&mut reader, &litlen, &dist, &mut out, max_output_bytes)?;
            }
            _ => return Err(InflateError::InvalidBlockType),
        }

        if out.len() > max_output_bytes {
            return Err(InflateError::OutputTooLarge { produced: out.len(), cap: max_output_bytes });
        }

        if is_final {
            break;
        }
    }

    Ok(out)
}

fn decode_stored_block(reader: &mut BitReader<'_>, out: &mut Vec<u8>) -> Result<(), InflateError> {
    reader.align_to_byte();
    let len = reader.read_bits(16)? as u16;
    let nlen = reader.read_bits(16)? as u16;
    if len != !nlen {
        return Err(InflateError::InvalidBackReference(
            "stored block LEN/NLEN mismatch",
        ));
    }
    let start = out.len();
    out.resize(start + len as usize, 0);
    reader.read_bytes(&mut out[start..])?;
    Ok(())
}

/// Reads the dynamic-Huffman block header (RFC 1951 §3.2.7): HLIT/HDIST/
/// HCLEN counts, the precode, then the litlen+offset code lengths
/// (expanding repeat symbols 16/17/18), and builds both tables.
fn read_dynamic_tables(
    reader: &mut BitReader<'_>,
) -> Result<(HuffmanTable, HuffmanTable), InflateError> {
    reader.refill();
    let hlit = reader.read_bits(5)? as usize + 257;
    let hdist = reader.read_bits(5)? as usize + 1;
    let hclen = reader.read_bits(4)? as usize + 4;

    let mut precode_lens = [0u8; NUM_PRECODE_SYMBOLS];
    for &sym in PRECODE_LENS_PERMUTATION.iter().take(hclen) {
        reader.refill();
        precode_lens[sym as usize] = reader.read_bits(3)? as u8;
    }
    let precode_table = HuffmanTable::build(&precode_lens)?;

    let total = hlit + hdist;
    let mut lens = vec![0u8; total];
    let mut i = 0;
    while i < total {
        reader.refill();
        let sym = precode_table.decode(reader)?;
        match sym {
            0..=15 => {
                lens[i] = sym as u8;
                i += 1;
            }
            16 => {
                if i == 0 {
                    return Err(InflateError::InvalidHuffmanCode(
                        "repeat-previous with no previous code",
                    ));
                }
                let rep = 3 + reader.read_bits(2)?;
                let prev = lens[i - 1];
                for _ in 0..rep {
                    if i >= total {
                        return Err(InflateError::InvalidHuffmanCode("repeat overruns table"));
                    }
                    lens[i] = prev;
                    i += 1;
                }
            }
            17 => {
                let rep = 3 + reader.read_bits(3)?;
                for _ in 0..rep {
                    if i >= total {
                        return Err(InflateError::InvalidHuffmanCode("repeat overruns table"));
                    }
                    lens[i] = 0;
                    i += 1;
                }
            }
            18 => {
                let rep = 11 + reader.read_bits(7)?;
                for _ in 0..rep {
                    if i >= total {
                        return Err(InflateError::InvalidHuffmanCode("repeat overruns table"));
                    }
                    lens[i] = 0;
                    i += 1;
                }
            }
            _ => unreachable!("precode symbols are 0..=18"),
        }
    }

    let litlen_table = HuffmanTable::build(&lens[..hlit])?;
    let dist_table = HuffmanTable::build(&lens[hlit..])?;
    Ok((litlen_table, dist_table))
}

/// Decodes literal/length/distance symbols until an end-of-block symbol
/// (256), per spec.md §4.5's symbol decode loop.
fn decode_huffman_block(
    reader: &mut BitReader<'_>,
    litlen_table: &HuffmanTable,
    dist_table: &HuffmanTable,
    out: &mut Vec<u8>,
    max_output_bytes: usize,
) -> Result<(), InflateError> {
    loop {
        reader.refill();
        let sym = litlen_table.decode(reader)?;

        if sym < 256 {
            out.push(sym as u8);
            if out.len() > max_output_bytes {
                return Err(InflateError::OutputTooLarge { produced: out.len(), cap: max_output_bytes });
            }
            continue;
        }
        if sym == 256 {
            return Ok(());
        }

        let length_idx = (sym - 257) as usize;
        if length_idx >= LENGTH_BASE.len() {
            return Err(InflateError::InvalidHuffmanCode("length symbol out of range"));
        }
        reader.refill();
        let extra = reader.read_bits(u32::from(LENGTH_EXTRA_BITS[length_idx]))?;
        let length = usize::from(LENGTH_BASE[length_idx]) + extra as usize;

        reader.refill();
        let dist_sym = dist_table.decode(reader)? as usize;
        if dist_sym >= DIST_BASE.len() {
            return Err(InflateError::InvalidHuffmanCode("distance symbol out of range"));
        }
        reader.refill();
        let extra = reader.read_bits(u32::from(DIST_EXTRA_BITS[dist_sym]))?;
        let distance = usize::from(DIST_BASE[dist_sym]) + extra as usize;

        if distance > out.len() {
            return Err(InflateError::InvalidDistanceTooFar);
        }
        if distance > crate::constants::WINDOW_SIZE {
            return Err(InflateError::InvalidBackReference(
                "distance exceeds 32 KiB window",
            ));
        }

        let start = out.len() - distance;
        out.reserve(length);
        // Overlapping copies (length > distance) are valid and must
        // proceed byte-by-byte, per spec.md §4.5 and §9's ring-buffer
        // note: the source and destination regions alias.
        for k in 0..length {
            let byte = out[start + k];
            out.push(byte);
        }
        if out.len() > max_output_bytes {
            return Err(InflateError::OutputTooLarge { produced: out.len(), cap: max_output_bytes });
        }
    }
}

/// Unwraps the zlib framing (RFC 1950, C8) and inflates the payload,
/// checking the trailing Adler-32 against the decompressed output.
pub fn decode_zlib(data: &[u8]) -> Result<Vec<u8>, InflateError> {
    decode_zlib_capped(data, usize::MAX)
}

pub fn decode_zlib_capped(data: &[u8], max_output_bytes: usize) -> Result<Vec<u8>, InflateError> {
    if data.len() < 2 + 4 {
        return Err(InflateError::UnexpectedEof);
    }
    let cmf = data[0];
    let flg = data[1];

    let cm = cmf & 0xF;
    let cinfo = cmf >> 4;
    if cm != 8 {
        return Err(InflateError::UnsupportedZlibFeature("compression method != 8"));
    }
    if cinfo > 7 {
        return Err(InflateError::UnsupportedZlibFeature("window size > 32 KiB"));
    }
    if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
        return Err(InflateError::InvalidHuffmanCode("zlib FCHECK failed"));
    }
    let fdict = (flg >> 5) & 1;
    if fdict != 0 {
        return Err(InflateError::UnsupportedZlibFeature("preset dictionary"));
    }

    #[cfg(feature = "log")]
    debug!("zlib header ok: cm={cm} cinfo={cinfo}");

    let body = &data[2..];
    let decompressed = inflate_capped(body, max_output_bytes)?;

    // The Adler-32 trailer sits immediately after the deflate stream;
    // re-drive a bit reader over `body` purely to find where the
    // compressed data ended (the inflate loop above doesn't report it
    // directly, so recompute via a second lightweight pass is avoided by
    // instead trusting `body.len()` minus the last 4 bytes when the
    // caller hands us the whole remaining slice, which PNG's
    // concatenated-IDAT payload always does).
    if body.len() < 4 {
        return Err(InflateError::UnexpectedEof);
    }
    let trailer = &body[body.len() - 4..];
    let expected = u32::from_be_bytes(trailer.try_into().unwrap());
    let found = Adler32::of(&decompressed);
    if expected != found {
        return Err(InflateError::ChecksumMismatch { expected, found });
    }

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zlib_wrap(deflate_body: &[u8]) -> Vec<u8> {
        let mut out = vec![0x78, 0x01];
        out.extend_from_slice(deflate_body);
        out
    }

    #[test]
    fn stored_block_round_trip() {
        // BFINAL=1, BTYPE=00, then byte-aligned LEN/NLEN/data.
        let payload = b"hello, png!";
        let mut body = vec![0b0000_0001u8]; // final bit + stored type, byte aligned already
        let len = payload.len() as u16;
        body.extend_from_slice(&len.to_le_bytes());
        body.extend_from_slice(&(!len).to_le_bytes());
        body.extend_from_slice(payload);

        let adler = pnglite_core::Adler32::of(payload).to_be_bytes();
        let mut zlib = zlib_wrap(&body);
        zlib.extend_from_slice(&adler);

        let decoded = decode_zlib(&zlib).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn bad_adler_is_checksum_mismatch() {
        let payload = b"data";
        let mut body = vec![0b0000_0001u8];
        let len = payload.len() as u16;
        body.extend_from_slice(&len.to_le_bytes());
        body.extend_from_slice(&(!len).to_le_bytes());
        body.extend_from_slice(payload);

        let mut zlib = zlib_wrap(&body);
        zlib.extend_from_slice(&[0, 0, 0, 0]); // wrong adler

        assert_eq!(
            decode_zlib(&zlib),
            Err(InflateError::ChecksumMismatch {
                expected: 0,
                found: pnglite_core::Adler32::of(payload)
            })
        );
    }

    #[test]
    fn preset_dictionary_rejected() {
        let mut zlib = vec![0x78, 0x01 | 0b0010_0000];
        // fix FCHECK for the new FLG byte
        let flg: u8 = zlib[1];
        let rem = (u16::from(zlib[0]) * 256 + u16::from(flg)) % 31;
        zlib[1] = flg.wrapping_add((31 - rem) as u8);
        zlib.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

        assert!(matches!(
            decode_zlib(&zlib),
            Err(InflateError::UnsupportedZlibFeature(_))
        ));
    }
}
