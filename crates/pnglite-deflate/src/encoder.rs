//! DEFLATE block emission (C7) and the encode half of zlib framing (C8).
//! The minimum conforming path (spec.md §4.6) is stored blocks; the
//! preferred path tokenizes with [`crate::lz77`] and emits a fixed or
//! dynamic Huffman block depending on [`CompressionLevel`].

use crate::bitstream::BitWriter;
use crate::constants::{distance_to_symbol, length_to_symbol, PRECODE_LENS_PERMUTATION};
use crate::huffman::HuffmanCode;
use crate::lz77::{tokenize, Token};
use pnglite_core::Adler32;

#[cfg(feature = "log")]
use log::debug;

/// Mirrors spec.md §6's `compression_level` encoder option.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum CompressionLevel {
    /// Stored blocks only -- the minimum conforming encoder spec.md
    /// §4.6 describes. No LZ77, no Huffman coding.
    Store,
    /// LZ77 with a shallow chain search, single fixed-Huffman block.
    Fast,
    /// LZ77 with a deeper chain search, single dynamic-Huffman block.
    /// The default: usually smallest output for PNG-sized inputs.
    Default,
    /// LZ77 with an exhaustive chain search.
    Best,
}

impl CompressionLevel {
    fn max_chain(self) -> usize {
        match self {
            CompressionLevel::Store => 0,
            CompressionLevel::Fast => 16,
            CompressionLevel::Default => 128,
            CompressionLevel::Best => 1024,
        }
    }
}

const MAX_STORED_BLOCK: usize = 65535;

/// Emits a raw DEFLATE stream (no zlib wrapper) for `data` at the given
/// compression level. Always produces a valid, decodable stream;
/// `Store` never fails to terminate even on pathological input since it
/// never needs a Huffman table.
pub fn deflate(data: &[u8], level: CompressionLevel) -> Vec<u8> {
    let mut writer = BitWriter::with_capacity(data.len() / 2 + 16);

    if level == CompressionLevel::Store || data.is_empty() {
        write_stored_blocks(&mut writer, data);
        return writer.finish();
    }

    let tokens = tokenize(data, level.max_chain());
    write_huffman_block(&mut writer, &tokens, level);
    writer.finish()
}

fn write_stored_blocks(writer: &mut BitWriter, data: &[u8]) {
    if data.is_empty() {
        writer.write_bit(true); // BFINAL
        writer.write_bits(0, 2); // BTYPE = stored
        writer.align_to_byte();
        writer.write_bits(0, 16);
        writer.write_bits(0xFFFF, 16);
        return;
    }

    let mut offset = 0;
    while offset < data.len() {
        let chunk_len = (data.len() - offset).min(MAX_STORED_BLOCK);
        let is_last = offset + chunk_len == data.len();
        let chunk = &data[offset..offset + chunk_len];

        writer.write_bit(is_last);
        writer.write_bits(0, 2); // BTYPE = stored
        writer.align_to_byte();
        writer.write_bits(chunk_len as u32 & 0xFFFF, 16);
        writer.write_bits(!(chunk_len as u16) as u32 & 0xFFFF, 16);
        writer.write_bytes(chunk);

        offset += chunk_len;
    }
}

fn write_huffman_block(writer: &mut BitWriter, tokens: &[Token], level: CompressionLevel) {
    writer.write_bit(true); // single block, always final

    if level == CompressionLevel::Fast {
        writer.write_bits(1, 2); // BTYPE = fixed
        let litlen = HuffmanCode::from_lengths(&crate::constants::fixed_litlen_lengths());
        let dist = HuffmanCode::from_lengths(&crate::constants::fixed_dist_lengths());
        emit_tokens(writer, tokens, &litlen, &dist);
        return;
    }

    writer.write_bits(2, 2); // BTYPE = dynamic

    let mut litlen_freqs = [0u32; 288];
    let mut dist_freqs = [0u32; 30];
    litlen_freqs[256] = 1; // end-of-block always occurs exactly once

    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen_freqs[usize::from(b)] += 1,
            Token::Match { length, distance } => {
                let (sym, _, _) = length_to_symbol(length as usize);
                litlen_freqs[usize::from(sym)] += 1;
                let (sym, _, _) = distance_to_symbol(distance as usize);
                dist_freqs[usize::from(sym)] += 1;
            }
        }
    }

    let litlen = HuffmanCode::build(&litlen_freqs);
    let dist = HuffmanCode::build(&dist_freqs);

    let hlit = trimmed_len(&litlen.lengths, 257);
    let hdist = trimmed_len(&dist.lengths, 1);

    let mut combined = Vec::with_capacity(hlit + hdist);
    combined.extend_from_slice(&litlen.lengths[..hlit]);
    combined.extend_from_slice(&dist.lengths[..hdist]);

    let rle = rle_encode_lengths(&combined);
    let precode_freqs = precode_frequencies(&rle);
    let precode = HuffmanCode::build_precode(&precode_freqs);

    let hclen = trimmed_precode_count(&precode.lengths);

    #[cfg(feature = "log")]
    debug!(
        "dynamic block: hlit={hlit} hdist={hdist} hclen={hclen} tokens={}",
        tokens.len()
    );

    writer.write_bits((hlit - 257) as u32, 5);
    writer.write_bits((hdist - 1) as u32, 5);
    writer.write_bits((hclen - 4) as u32, 4);

    for &sym in PRECODE_LENS_PERMUTATION.iter().take(hclen) {
        writer.write_bits(u32::from(precode.len_of(usize::from(sym))), 3);
    }

    for item in &rle {
        match *item {
            RleItem::Len(l) => precode.write(writer, usize::from(l)),
            RleItem::Repeat(count) => {
                precode.write(writer, 16);
                writer.write_bits(u32::from(count - 3), 2);
            }
            RleItem::ZerosShort(count) => {
                precode.write(writer, 17);
                writer.write_bits(u32::from(count - 3), 3);
            }
            RleItem::ZerosLong(count) => {
                precode.write(writer, 18);
                writer.write_bits(u32::from(count - 11), 7);
            }
        }
    }

    emit_tokens(writer, tokens, &litlen, &dist);
}

fn emit_tokens(writer: &mut BitWriter, tokens: &[Token], litlen: &HuffmanCode, dist: &HuffmanCode) {
    for tok in tokens {
        match *tok {
            Token::Literal(b) => litlen.write(writer, usize::from(b)),
            Token::Match { length, distance } => {
                let (sym, extra_bits, extra) = length_to_symbol(length as usize);
                litlen.write(writer, usize::from(sym));
                if extra_bits > 0 {
                    writer.write_bits(extra, extra_bits);
                }
                let (sym, extra_bits, extra) = distance_to_symbol(distance as usize);
                dist.write(writer, usize::from(sym));
                if extra_bits > 0 {
                    writer.write_bits(extra, extra_bits);
                }
            }
        }
    }
    litlen.write(writer, 256);
}

fn trimmed_len(lengths: &[u8], min: usize) -> usize {
    let mut n = lengths.len();
    while n > min && lengths[n - 1] == 0 {
        n -= 1;
    }
    n
}

fn trimmed_precode_count(lengths: &[u8]) -> usize {
    let mut n = PRECODE_LENS_PERMUTATION.len();
    while n > 4 && lengths[usize::from(PRECODE_LENS_PERMUTATION[n - 1])] == 0 {
        n -= 1;
    }
    n
}

#[derive(Clone, Copy)]
enum RleItem {
    Len(u8),
    Repeat(u8),     // code 16: repeat previous length 3..=6 times
    ZerosShort(u8), // code 17: repeat zero 3..=10 times
    ZerosLong(u8),  // code 18: repeat zero 11..=138 times
}

/// Greedy run-length encode of a code-length array using DEFLATE's
/// repeat symbols 16/17/18 (RFC 1951 §3.2.7), the encode-side mirror of
/// `pnglite_inflate::decoder::read_dynamic_tables`'s expansion.
fn rle_encode_lengths(lengths: &[u8]) -> Vec<RleItem> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < lengths.len() {
        let value = lengths[i];
        let mut run = 1;
        while i + run < lengths.len() && lengths[i + run] == value {
            run += 1;
        }

        if value == 0 {
            let mut remaining = run;
            while remaining > 0 {
                if remaining >= 11 {
                    let take = remaining.min(138);
                    out.push(RleItem::ZerosLong(take as u8));
                    remaining -= take;
                } else if remaining >= 3 {
                    out.push(RleItem::ZerosShort(remaining as u8));
                    remaining = 0;
                } else {
                    for _ in 0..remaining {
                        out.push(RleItem::Len(0));
                    }
                    remaining = 0;
                }
            }
        } else {
            out.push(RleItem::Len(value));
            let mut remaining = run - 1;
            while remaining > 0 {
                if remaining >= 3 {
                    let take = remaining.min(6);
                    out.push(RleItem::Repeat(take as u8));
                    remaining -= take;
                } else {
                    for _ in 0..remaining {
                        out.push(RleItem::Len(value));
                    }
                    remaining = 0;
                }
            }
        }
        i += run;
    }
    out
}

fn precode_frequencies(rle: &[RleItem]) -> [u32; 19] {
    let mut freqs = [0u32; 19];
    for item in rle {
        let sym = match item {
            RleItem::Len(l) => usize::from(*l),
            RleItem::Repeat(_) => 16,
            RleItem::ZerosShort(_) => 17,
            RleItem::ZerosLong(_) => 18,
        };
        freqs[sym] += 1;
    }
    freqs
}

/// Wraps a raw DEFLATE stream in a zlib header/trailer (RFC 1950): CMF
/// byte advertising the DEFLATE method and a 32K window, an FLG byte
/// satisfying the CMF/FLG mod-31 check (no preset dictionary, default
/// compression-level hint), the compressed body, then the big-endian
/// Adler-32 of the *uncompressed* input.
pub fn encode_zlib(data: &[u8], level: CompressionLevel) -> Vec<u8> {
    let body = deflate(data, level);
    let mut out = Vec::with_capacity(body.len() + 6);

    let cmf: u8 = 0x78; // CM=8 (deflate), CINFO=7 (32K window)
    let level_bits: u8 = match level {
        CompressionLevel::Store => 0,
        CompressionLevel::Fast => 1,
        CompressionLevel::Default => 2,
        CompressionLevel::Best => 3,
    };
    let mut flg = level_bits << 6;
    let remainder = (u16::from(cmf) * 256 + u16::from(flg)) % 31;
    if remainder != 0 {
        flg += (31 - remainder) as u8;
    }

    out.push(cmf);
    out.push(flg);
    out.extend_from_slice(&body);
    out.extend_from_slice(&Adler32::of(data).to_be_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_level_round_trips() {
        let data = b"hello deflate".repeat(10);
        let stream = deflate(&data, CompressionLevel::Store);
        let decoded = pnglite_inflate::inflate(&stream).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn default_level_round_trips_repetitive_input() {
        let data = b"abcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabc".repeat(20);
        let stream = deflate(&data, CompressionLevel::Default);
        let decoded = pnglite_inflate::inflate(&stream).unwrap();
        assert_eq!(decoded, data);
        assert!(stream.len() < data.len());
    }

    #[test]
    fn best_level_round_trips_binary_data() {
        let data: Vec<u8> = (0..4000u32).map(|i| (i % 251) as u8).collect();
        let stream = deflate(&data, CompressionLevel::Best);
        let decoded = pnglite_inflate::inflate(&stream).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn zlib_wrapped_stream_round_trips() {
        let data = b"zlib wrapping adds a header and an adler32 trailer".repeat(5);
        let stream = encode_zlib(&data, CompressionLevel::Default);
        assert_eq!(stream[0], 0x78);
        assert_eq!((u16::from(stream[0]) * 256 + u16::from(stream[1])) % 31, 0);
        let decoded = pnglite_inflate::decode_zlib(&stream).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_input_round_trips() {
        let stream = deflate(&[], CompressionLevel::Store);
        let decoded = pnglite_inflate::inflate(&stream).unwrap();
        assert_eq!(decoded, Vec::<u8>::new());

        let stream = deflate(&[], CompressionLevel::Default);
        let decoded = pnglite_inflate::inflate(&stream).unwrap();
        assert_eq!(decoded, Vec::<u8>::new());
    }
}
