//! The literal end-to-end scenarios spec.md §8 names by byte value,
//! built from raw chunk bytes rather than through `encoder::encode` so
//! the decoder is exercised against input it didn't produce itself.

use pnglite_core::Crc32;
use pnglite_deflate::{encode_zlib, CompressionLevel};
use pnglite_png::{decode, decode_with_options, ColorType, DecoderOptions, PngError, Transparency};

const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

fn push_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    let mut crc = Crc32::new();
    crc.update(chunk_type);
    crc.update(data);
    out.extend_from_slice(&crc.finalize().to_be_bytes());
}

fn ihdr(width: u32, height: u32, depth: u8, color: u8, interlace: u8) -> [u8; 13] {
    let mut payload = [0u8; 13];
    payload[0..4].copy_from_slice(&width.to_be_bytes());
    payload[4..8].copy_from_slice(&height.to_be_bytes());
    payload[8] = depth;
    payload[9] = color;
    payload[10] = 0;
    payload[11] = 0;
    payload[12] = interlace;
    payload
}

fn build_png(ihdr_payload: &[u8; 13], extra: &[(&[u8; 4], Vec<u8>)], raw_filtered: &[u8]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    push_chunk(&mut out, b"IHDR", ihdr_payload);
    for (t, d) in extra {
        push_chunk(&mut out, t, d);
    }
    let idat = encode_zlib(raw_filtered, CompressionLevel::Store);
    push_chunk(&mut out, b"IDAT", &idat);
    push_chunk(&mut out, b"IEND", &[]);
    out
}

/// Scenario 1: minimal 1x1 RGBA, filter byte 0x00, pixel FF 00 7F 40.
#[test]
fn minimal_1x1_rgba() {
    let raw = [0x00u8, 0xFF, 0x00, 0x7F, 0x40];
    let png = build_png(&ihdr(1, 1, 8, 6, 0), &[], &raw);

    let image = decode(&png).unwrap();
    assert_eq!((image.width, image.height), (1, 1));
    assert_eq!(image.color_type, ColorType::Rgba);
    assert_eq!(image.samples, vec![255, 0, 127, 64]);
}

/// Scenario 2: 2x2 grayscale depth 1, rows `00 80` and `00 40` packed
/// MSB-first, decoding to pixels [1,0,0,1] at native (unscaled) depth,
/// then a round trip through the encoder.
#[test]
fn two_by_two_grayscale_depth_one() {
    let raw = [0x00u8, 0x80, 0x00, 0x40];
    let png = build_png(&ihdr(2, 2, 1, 0, 0), &[], &raw);

    let image = decode(&png).unwrap();
    assert_eq!(image.samples, vec![1, 0, 0, 1]);

    let reencoded =
        pnglite_png::encode(&image, &pnglite_png::EncoderOptions::default()).unwrap();
    let roundtripped = decode(&reencoded).unwrap();
    assert_eq!(roundtripped.samples, image.samples);
}

/// Scenario 3: palette image with tRNS, carried through verbatim.
#[test]
fn palette_with_trns() {
    let plte = [0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255];
    let trns = [0u8, 128, 255, 255];
    // Width 4, depth 4: indices 0,1,2,3 packed two-per-byte, MSB-first.
    let raw = [0x00u8, 0x01, 0x23];

    let png = build_png(
        &ihdr(4, 1, 4, 3, 0),
        &[(b"PLTE", plte.to_vec()), (b"tRNS", trns.to_vec())],
        &raw,
    );

    let image = decode(&png).unwrap();
    assert_eq!(image.samples, vec![0, 1, 2, 3]);
    let palette = image.palette.as_ref().unwrap();
    assert_eq!(palette.len(), 4);
    assert_eq!((palette[1].r, palette[1].g, palette[1].b), (255, 0, 0));
    assert_eq!(image.transparency, Some(Transparency::Palette(trns.to_vec())));
}

/// Scenario 4: an Adam7-encoded image decodes to the same pixels as the
/// non-interlaced encoding of the same raster.
#[test]
fn adam7_matches_non_interlaced() {
    use pnglite_png::{BitDepth, Image, Interlace};

    let width = 8;
    let height = 8;
    let samples: Vec<u16> = (0..width * height * 4).map(|i| (i * 11 % 251) as u16).collect();
    let image = Image {
        width,
        height,
        color_type: ColorType::Rgba,
        bit_depth: BitDepth::Eight,
        interlace: Interlace::None,
        palette: None,
        transparency: None,
        samples: samples.clone(),
        metadata: Default::default(),
    };

    let plain = pnglite_png::encode(&image, &pnglite_png::EncoderOptions::default()).unwrap();
    let interlaced = pnglite_png::encode(
        &image,
        &pnglite_png::EncoderOptions::default().with_interlace(Interlace::Adam7),
    )
    .unwrap();

    let decoded_plain = decode(&plain).unwrap();
    let decoded_interlaced = decode(&interlaced).unwrap();
    assert_eq!(decoded_plain.samples, samples);
    assert_eq!(decoded_interlaced.samples, samples);
    assert_eq!(decoded_interlaced.interlace, Interlace::Adam7);
}

/// Scenario 5: a single-bit CRC flip inside IDAT's trailing CRC is
/// rejected with `CrcMismatch`.
#[test]
fn crc_tamper_in_idat_is_rejected() {
    let raw = [0x00u8, 0xFF, 0x00, 0x7F, 0x40];
    let mut png = build_png(&ihdr(1, 1, 8, 6, 0), &[], &raw);

    let idat_pos = png.windows(4).position(|w| w == b"IDAT").unwrap();
    // Flip a bit inside the CRC that immediately follows IDAT's payload.
    let idat_len = u32::from_be_bytes(png[idat_pos - 4..idat_pos].try_into().unwrap()) as usize;
    let crc_pos = idat_pos + 4 + idat_len;
    png[crc_pos] ^= 1;

    assert!(matches!(decode(&png), Err(PngError::CrcMismatch { .. })));
}

/// Scenario 5 (payload variant): flipping a byte inside IDAT's payload
/// *and* patching the chunk CRC to match (so the corruption isn't
/// caught at the chunk-framing layer) surfaces at the zlib/DEFLATE
/// layer instead, as one of several acceptable typed errors.
#[test]
fn payload_tamper_in_idat_surfaces_a_typed_error() {
    let raw = [0x00u8, 0xFF, 0x00, 0x7F, 0x40];
    let mut png = build_png(&ihdr(1, 1, 8, 6, 0), &[], &raw);

    let idat_pos = png.windows(4).position(|w| w == b"IDAT").unwrap();
    let data_start = idat_pos + 4;
    let idat_len = u32::from_be_bytes(png[idat_pos - 4..idat_pos].try_into().unwrap()) as usize;
    png[data_start + 3] ^= 0xFF; // inside the zlib-wrapped deflate body

    let mut crc = Crc32::new();
    crc.update(b"IDAT");
    crc.update(&png[data_start..data_start + idat_len]);
    png[data_start + idat_len..data_start + idat_len + 4]
        .copy_from_slice(&crc.finalize().to_be_bytes());

    let result = decode(&png);
    assert!(matches!(
        result,
        Err(PngError::ChecksumMismatch { .. })
            | Err(PngError::InvalidHuffmanCode(_))
            | Err(PngError::InvalidBlockType)
            | Err(PngError::UnexpectedEof)
            | Err(PngError::InvalidDistanceTooFar)
            | Err(PngError::InvalidBackReference(_))
    ));
}

/// Scenario 6: `BTYPE = 11` inside IDAT is `InvalidBlockType`.
#[test]
fn deflate_block_type_three_is_rejected() {
    // BFINAL=1, BTYPE=11 (bits 1,1,1 LSB-first in the first byte).
    let deflate_body = [0b0000_0111u8];
    let mut idat = vec![0x78, 0x01];
    idat.extend_from_slice(&deflate_body);
    idat.extend_from_slice(&0u32.to_be_bytes());

    let png = build_png_with_raw_idat(&ihdr(1, 1, 8, 6, 0), &idat);
    assert!(matches!(decode(&png), Err(PngError::InvalidBlockType)));
}

/// Scenario 6: an inflated output shorter than the declared raster is
/// `TruncatedImage`.
#[test]
fn short_inflated_output_is_truncated_image() {
    // One byte short of the 5 bytes a 1x1 RGBA8 scanline needs.
    let raw = [0x00u8, 0xFF, 0x00, 0x7F];
    let png = build_png(&ihdr(1, 1, 8, 6, 0), &[], &raw);
    assert!(matches!(decode(&png), Err(PngError::TruncatedImage { .. })));
}

fn build_png_with_raw_idat(ihdr_payload: &[u8; 13], idat: &[u8]) -> Vec<u8> {
    let mut out = SIGNATURE.to_vec();
    push_chunk(&mut out, b"IHDR", ihdr_payload);
    push_chunk(&mut out, b"IDAT", idat);
    push_chunk(&mut out, b"IEND", &[]);
    out
}

/// Testable property: IDAT boundary placement is not significant within
/// the DEFLATE stream -- splitting one zlib stream across many IDAT
/// chunks decodes identically to a single IDAT.
#[test]
fn idat_chunk_boundaries_do_not_affect_decoding() {
    let raw = [0x00u8, 0xFF, 0x00, 0x7F, 0x40];
    let zlib = encode_zlib(&raw, CompressionLevel::Store);

    let mut one_chunk = SIGNATURE.to_vec();
    push_chunk(&mut one_chunk, b"IHDR", &ihdr(1, 1, 8, 6, 0));
    push_chunk(&mut one_chunk, b"IDAT", &zlib);
    push_chunk(&mut one_chunk, b"IEND", &[]);

    let mut split = SIGNATURE.to_vec();
    push_chunk(&mut split, b"IHDR", &ihdr(1, 1, 8, 6, 0));
    for byte_chunk in zlib.chunks(3) {
        push_chunk(&mut split, b"IDAT", byte_chunk);
    }
    push_chunk(&mut split, b"IEND", &[]);

    assert_eq!(
        decode(&one_chunk).unwrap().samples,
        decode(&split).unwrap().samples
    );
}

/// Trailing bytes after IEND are rejected by default and accepted when
/// the caller opts out via `DecoderOptions`.
#[test]
fn trailing_data_after_iend_is_configurable() {
    let raw = [0x00u8, 0xFF, 0x00, 0x7F, 0x40];
    let mut png = build_png(&ihdr(1, 1, 8, 6, 0), &[], &raw);
    png.extend_from_slice(b"extra-junk");

    assert!(matches!(decode(&png), Err(PngError::TrailingData { .. })));

    let lenient = DecoderOptions::default().with_strict_trailing_data(false);
    assert!(decode_with_options(&png, &lenient).is_ok());
}
