//! The decoder pipeline (C12): chunk iteration -> IDAT concatenation ->
//! zlib/inflate -> per-scanline unfilter -> Adam7 de-interlace -> sample
//! unpack, orchestrated the way `zune_png::decoder::PngDecoder::decode`
//! drives its own chunk-dispatch loop.

use crate::adam7;
use crate::chunk::{read_chunk, verify_signature, Chunk};
use crate::errors::PngError;
use crate::filter::{unfilter_scanline, FilterType};
use crate::image::{Image, Interlace, PaletteEntry, Transparency};
use crate::metadata::{
    Background, Chromaticities, IccProfile, ModificationTime, PhysicalPixelDimensions, TextEntry,
};
use crate::options::DecoderOptions;
use crate::pixel::unpack_scanline;
use pnglite_core::{BitDepth, ColorType};

#[cfg(feature = "log")]
use log::{debug, trace};

struct IhdrInfo {
    width: u32,
    height: u32,
    bit_depth: BitDepth,
    color_type: ColorType,
    interlace: Interlace,
}

pub fn decode(data: &[u8], options: &DecoderOptions) -> Result<Image, PngError> {
    let mut reader = verify_signature(data)?;

    let first = read_chunk(&mut reader, options.max_chunk_len)?;
    if &first.chunk_type != b"IHDR" {
        return Err(PngError::InvalidChunkOrder("first chunk must be IHDR"));
    }
    first.verify_crc()?;
    let ihdr = parse_ihdr(&first, options)?;

    #[cfg(feature = "log")]
    debug!(
        "IHDR: {}x{} depth={} color={:?} interlace={:?}",
        ihdr.width, ihdr.height, ihdr.bit_depth.to_wire(), ihdr.color_type, ihdr.interlace
    );

    let mut image = Image {
        width: ihdr.width,
        height: ihdr.height,
        color_type: ihdr.color_type,
        bit_depth: ihdr.bit_depth,
        interlace: ihdr.interlace,
        palette: None,
        transparency: None,
        samples: Vec::new(),
        metadata: Default::default(),
    };

    let mut idat = Vec::new();
    let mut seen_plte = false;
    let mut seen_idat_block = false;
    let mut idat_closed = false;
    let mut ended = false;

    loop {
        let chunk = read_chunk(&mut reader, options.max_chunk_len)?;
        let is_critical = chunk.is_critical();
        if is_critical || options.confirm_ancillary_crc {
            chunk.verify_crc()?;
        }

        if &chunk.chunk_type != b"IDAT" && seen_idat_block {
            idat_closed = true;
        }

        match &chunk.chunk_type {
            b"IHDR" => return Err(PngError::DuplicateChunk("IHDR")),
            b"PLTE" => {
                if seen_plte {
                    return Err(PngError::DuplicateChunk("PLTE"));
                }
                if seen_idat_block {
                    return Err(PngError::InvalidChunkOrder("PLTE after IDAT"));
                }
                seen_plte = true;
                if image.color_type == ColorType::Palette {
                    image.palette = Some(parse_plte(&chunk)?);
                }
            }
            b"tRNS" => {
                if seen_idat_block {
                    return Err(PngError::InvalidChunkOrder("tRNS after IDAT"));
                }
                image.transparency = Some(parse_trns(&chunk, &image)?);
            }
            b"bKGD" => {
                if seen_idat_block {
                    return Err(PngError::InvalidChunkOrder("bKGD after IDAT"));
                }
                image.metadata.background = Some(parse_bkgd(&chunk, &image)?);
            }
            b"IDAT" => {
                if idat_closed {
                    return Err(PngError::InvalidChunkOrder("IDAT chunks are not contiguous"));
                }
                seen_idat_block = true;
                idat.extend_from_slice(chunk.data);
            }
            b"IEND" => {
                if !chunk.data.is_empty() {
                    return Err(PngError::InvalidIhdr("IEND must have zero-length payload"));
                }
                ended = true;
            }
            b"gAMA" => image.metadata.gamma = Some(parse_gama(&chunk)?),
            b"cHRM" => image.metadata.chromaticities = Some(parse_chrm(&chunk)?),
            b"sRGB" => image.metadata.srgb_rendering_intent = Some(parse_srgb(&chunk)?),
            b"iCCP" => image.metadata.icc_profile = Some(parse_iccp(&chunk)?),
            b"pHYs" => image.metadata.physical_pixel_dimensions = Some(parse_phys(&chunk)?),
            b"sBIT" => image.metadata.significant_bits = Some(chunk.data.to_vec()),
            b"tIME" => image.metadata.modification_time = Some(parse_time(&chunk)?),
            b"tEXt" => image.metadata.text.push(parse_text(&chunk)?),
            b"zTXt" => image.metadata.text.push(parse_ztxt(&chunk)?),
            b"iTXt" => image.metadata.text.push(parse_itxt(&chunk)?),
            _ => {
                (options.chunk_handler)(&chunk)?;
                if options.keep_unknown_chunks {
                    image
                        .metadata
                        .unknown_chunks
                        .push((chunk.chunk_type, chunk.data.to_vec()));
                }
            }
        }

        if ended {
            break;
        }
    }

    if image.color_type == ColorType::Palette && image.palette.is_none() {
        return Err(PngError::MissingRequiredChunk("PLTE"));
    }
    if idat.is_empty() {
        return Err(PngError::MissingRequiredChunk("IDAT"));
    }

    if options.strict_trailing_data && reader.has(1) {
        return Err(PngError::TrailingData { offset: reader.position() });
    }

    let byte_cap = expected_raw_size(&image);

    #[cfg(feature = "log")]
    debug!("inflating {} bytes of IDAT payload", idat.len());
    let raw = pnglite_inflate::decode_zlib_capped(&idat, byte_cap)?;

    image.samples = unfilter_and_unpack(&raw, &image)?;

    Ok(image)
}

/// `expected_size = sum over passes of (1 + bytes_per_row) * rows_in_pass`
/// (§4.11 step 3), used both as the inflate output cap (parse_ihdr already
/// rejected pixel counts above `max_pixels`, so this is exact, not a guess)
/// and to size the unfilter stage's allocations.
fn expected_raw_size(image: &Image) -> usize {
    let spp = image.color_type.samples_per_pixel();
    let bits = image.bit_depth.bits();

    let passes: Vec<(u32, u32)> = if image.interlace == Interlace::Adam7 {
        (0..adam7::num_passes())
            .map(|p| adam7::pass_dimensions(image.width, image.height, p))
            .collect()
    } else {
        vec![(image.width, image.height)]
    };

    passes
        .iter()
        .filter(|&&(pw, ph)| pw > 0 && ph > 0)
        .map(|&(pw, ph)| {
            let row_bytes = pnglite_core::pixel::packed_row_bytes(pw, spp, bits as u8) as usize;
            (1 + row_bytes) * ph as usize
        })
        .sum()
}

/// Runs the unfilter/de-interlace/unpack stage (§4.11 steps 3-6) over
/// already-inflated bytes.
fn unfilter_and_unpack(raw: &[u8], image: &Image) -> Result<Vec<u16>, PngError> {
    let spp = image.color_type.samples_per_pixel();
    let bits = image.bit_depth.bits();
    let bpp_bytes = (u64::from(spp) * u64::from(bits)).div_ceil(8).max(1) as usize;

    let mut full = vec![0u16; image.width as usize * image.height as usize * spp as usize];
    let mut offset = 0usize;

    let passes: Vec<(u32, u32)> = if image.interlace == Interlace::Adam7 {
        (0..adam7::num_passes())
            .map(|p| adam7::pass_dimensions(image.width, image.height, p))
            .collect()
    } else {
        vec![(image.width, image.height)]
    };

    for (pass_idx, &(pw, ph)) in passes.iter().enumerate() {
        if pw == 0 || ph == 0 {
            continue;
        }
        let row_bytes = pnglite_core::pixel::packed_row_bytes(pw, spp, bits as u8) as usize;
        let mut prev = vec![0u8; row_bytes];

        for row in 0..ph {
            if offset >= raw.len() {
                return Err(PngError::TruncatedImage { expected: raw.len() + 1, found: raw.len() });
            }
            let filter_byte = raw[offset];
            offset += 1;
            let filter = FilterType::from_byte(filter_byte)
                .ok_or(PngError::InvalidFilter(filter_byte))?;

            if offset + row_bytes > raw.len() {
                return Err(PngError::TruncatedImage {
                    expected: offset + row_bytes,
                    found: raw.len(),
                });
            }
            let mut cur = raw[offset..offset + row_bytes].to_vec();
            offset += row_bytes;

            unfilter_scanline(filter, &mut cur, &prev, bpp_bytes);

            #[cfg(feature = "log")]
            trace!("pass {pass_idx} row {row}: filter={filter:?}");

            let samples = unpack_scanline(&cur, pw, spp, image.bit_depth);

            if image.interlace == Interlace::Adam7 {
                place_adam7_row(&mut full, image.width, spp, pass_idx, row, &samples);
            } else {
                let row_start = row as usize * pw as usize * spp as usize;
                full[row_start..row_start + samples.len()].copy_from_slice(&samples);
            }

            prev = cur;
        }
    }

    if offset != raw.len() {
        return Err(PngError::ExtraImageData { expected: offset, found: raw.len() });
    }

    Ok(full)
}

fn place_adam7_row(full: &mut [u16], width: u32, spp: u8, pass: usize, pass_row: u32, samples: &[u16]) {
    const PASSES: [(u32, u32, u32, u32); 7] = [
        (0, 0, 8, 8),
        (4, 0, 8, 8),
        (0, 4, 4, 8),
        (2, 0, 4, 4),
        (0, 2, 2, 4),
        (1, 0, 2, 2),
        (0, 1, 1, 2),
    ];
    let (x0, y0, xs, ys) = PASSES[pass];
    let y = y0 + pass_row * ys;
    let spp = spp as usize;
    for (px, chunk) in samples.chunks(spp).enumerate() {
        let x = x0 + px as u32 * xs;
        let idx = (y as usize * width as usize + x as usize) * spp;
        full[idx..idx + spp].copy_from_slice(chunk);
    }
}

fn parse_ihdr(chunk: &Chunk, options: &DecoderOptions) -> Result<IhdrInfo, PngError> {
    if chunk.data.len() != 13 {
        return Err(PngError::InvalidIhdr("payload must be 13 bytes"));
    }
    let width = u32::from_be_bytes(chunk.data[0..4].try_into().unwrap());
    let height = u32::from_be_bytes(chunk.data[4..8].try_into().unwrap());
    let bit_depth_byte = chunk.data[8];
    let color_byte = chunk.data[9];
    let compression = chunk.data[10];
    let filter = chunk.data[11];
    let interlace_byte = chunk.data[12];

    if width == 0 || width > 0x7FFF_FFFF || height == 0 || height > 0x7FFF_FFFF {
        return Err(PngError::InvalidIhdr("width/height out of range"));
    }
    let color_type = ColorType::from_wire(color_byte)
        .ok_or(PngError::InvalidIhdr("unknown colour type"))?;
    let bit_depth =
        BitDepth::from_wire(bit_depth_byte).ok_or(PngError::InvalidIhdr("unknown bit depth"))?;
    if !color_type.is_bit_depth_valid(bit_depth_byte) {
        return Err(PngError::InvalidIhdr("bit depth not valid for colour type"));
    }
    if compression != 0 {
        return Err(PngError::InvalidIhdr("compression method must be 0"));
    }
    if filter != 0 {
        return Err(PngError::InvalidIhdr("filter method must be 0"));
    }
    let interlace =
        Interlace::from_wire(interlace_byte).ok_or(PngError::UnsupportedInterlace(interlace_byte))?;

    let pixels = u64::from(width) * u64::from(height);
    if pixels > options.max_pixels {
        return Err(PngError::ImageTooLarge { pixels, max: options.max_pixels });
    }

    // width*height is safe above (both capped to 0x7FFFFFFF), but
    // width*height*bytes_per_pixel is not -- use the checked helper per
    // spec.md §9's pixel-cap enforcement note, and reject if it would
    // overflow or exceed the byte budget `max_pixels` implies.
    let bytes_per_pixel =
        (u32::from(color_type.samples_per_pixel()) * bit_depth.bits()).div_ceil(8).max(1);
    let actual_bytes = pnglite_core::checked_pixel_bytes(width, height, bytes_per_pixel)
        .ok_or(PngError::ImageTooLarge { pixels, max: options.max_pixels })?;
    let byte_cap = options.max_pixels.saturating_mul(u64::from(bytes_per_pixel));
    if actual_bytes > byte_cap {
        return Err(PngError::ImageTooLarge { pixels, max: options.max_pixels });
    }

    Ok(IhdrInfo { width, height, bit_depth, color_type, interlace })
}

fn parse_plte(chunk: &Chunk) -> Result<Vec<PaletteEntry>, PngError> {
    if chunk.data.is_empty() || !chunk.data.len().is_multiple_of(3) {
        return Err(PngError::InvalidPalette("length not a multiple of 3"));
    }
    let count = chunk.data.len() / 3;
    if count > 256 {
        return Err(PngError::InvalidPalette("more than 256 entries"));
    }
    Ok(chunk
        .data
        .chunks_exact(3)
        .map(|c| PaletteEntry { r: c[0], g: c[1], b: c[2] })
        .collect())
}

fn parse_trns(chunk: &Chunk, image: &Image) -> Result<Transparency, PngError> {
    match image.color_type {
        ColorType::Palette => {
            let palette_len = image.palette.as_ref().map_or(0, |p| p.len());
            if chunk.data.len() > palette_len {
                return Err(PngError::InvalidPalette("tRNS longer than palette"));
            }
            Ok(Transparency::Palette(chunk.data.to_vec()))
        }
        ColorType::Grayscale => {
            if chunk.data.len() != 2 {
                return Err(PngError::InvalidPalette("grayscale tRNS must be 2 bytes"));
            }
            Ok(Transparency::Grayscale(u16::from_be_bytes([chunk.data[0], chunk.data[1]])))
        }
        ColorType::Rgb => {
            if chunk.data.len() != 6 {
                return Err(PngError::InvalidPalette("RGB tRNS must be 6 bytes"));
            }
            Ok(Transparency::Rgb {
                r: u16::from_be_bytes([chunk.data[0], chunk.data[1]]),
                g: u16::from_be_bytes([chunk.data[2], chunk.data[3]]),
                b: u16::from_be_bytes([chunk.data[4], chunk.data[5]]),
            })
        }
        ColorType::GrayscaleAlpha | ColorType::Rgba => {
            Err(PngError::InvalidPalette("tRNS not valid for a colour type with its own alpha"))
        }
    }
}

fn parse_bkgd(chunk: &Chunk, image: &Image) -> Result<Background, PngError> {
    match image.color_type {
        ColorType::Palette => {
            if chunk.data.len() != 1 {
                return Err(PngError::InvalidPalette("palette bKGD must be 1 byte"));
            }
            let index = chunk.data[0];
            let palette_len = image.palette.as_ref().map_or(0, |p| p.len());
            if usize::from(index) >= palette_len {
                return Err(PngError::PaletteIndexOutOfRange { index, palette_len });
            }
            Ok(Background::PaletteIndex(index))
        }
        ColorType::Grayscale | ColorType::GrayscaleAlpha => {
            if chunk.data.len() != 2 {
                return Err(PngError::InvalidPalette("grayscale bKGD must be 2 bytes"));
            }
            Ok(Background::Grayscale(u16::from_be_bytes([chunk.data[0], chunk.data[1]])))
        }
        ColorType::Rgb | ColorType::Rgba => {
            if chunk.data.len() != 6 {
                return Err(PngError::InvalidPalette("RGB bKGD must be 6 bytes"));
            }
            Ok(Background::Rgb {
                r: u16::from_be_bytes([chunk.data[0], chunk.data[1]]),
                g: u16::from_be_bytes([chunk.data[2], chunk.data[3]]),
                b: u16::from_be_bytes([chunk.data[4], chunk.data[5]]),
            })
        }
    }
}

fn parse_gama(chunk: &Chunk) -> Result<u32, PngError> {
    if chunk.data.len() != 4 {
        return Err(PngError::InvalidIhdr("gAMA must be 4 bytes"));
    }
    Ok(u32::from_be_bytes(chunk.data.try_into().unwrap()))
}

fn parse_chrm(chunk: &Chunk) -> Result<Chromaticities, PngError> {
    if chunk.data.len() != 32 {
        return Err(PngError::InvalidIhdr("cHRM must be 32 bytes"));
    }
    let u = |i: usize| u32::from_be_bytes(chunk.data[i * 4..i * 4 + 4].try_into().unwrap());
    Ok(Chromaticities {
        white_point: (u(0), u(1)),
        red: (u(2), u(3)),
        green: (u(4), u(5)),
        blue: (u(6), u(7)),
    })
}

fn parse_srgb(chunk: &Chunk) -> Result<u8, PngError> {
    if chunk.data.len() != 1 {
        return Err(PngError::InvalidIhdr("sRGB must be 1 byte"));
    }
    Ok(chunk.data[0])
}

fn split_at_null(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let pos = data.iter().position(|&b| b == 0)?;
    Some((&data[..pos], &data[pos + 1..]))
}

fn parse_iccp(chunk: &Chunk) -> Result<IccProfile, PngError> {
    let (name, rest) = split_at_null(chunk.data)
        .ok_or(PngError::InvalidIhdr("iCCP missing name terminator"))?;
    if rest.is_empty() {
        return Err(PngError::InvalidIhdr("iCCP missing compression method"));
    }
    let compressed = &rest[1..];
    let profile = pnglite_inflate::decode_zlib(compressed)
        .map_err(|_| PngError::InvalidIhdr("iCCP profile failed to decompress"))?;
    Ok(IccProfile { name: String::from_utf8_lossy(name).into_owned(), profile })
}

fn parse_phys(chunk: &Chunk) -> Result<PhysicalPixelDimensions, PngError> {
    if chunk.data.len() != 9 {
        return Err(PngError::InvalidIhdr("pHYs must be 9 bytes"));
    }
    Ok(PhysicalPixelDimensions {
        x_pixels_per_unit: u32::from_be_bytes(chunk.data[0..4].try_into().unwrap()),
        y_pixels_per_unit: u32::from_be_bytes(chunk.data[4..8].try_into().unwrap()),
        unit_is_meter: chunk.data[8] == 1,
    })
}

fn parse_time(chunk: &Chunk) -> Result<ModificationTime, PngError> {
    if chunk.data.len() != 7 {
        return Err(PngError::InvalidIhdr("tIME must be 7 bytes"));
    }
    Ok(ModificationTime {
        year: u16::from_be_bytes([chunk.data[0], chunk.data[1]]),
        month: chunk.data[2],
        day: chunk.data[3],
        hour: chunk.data[4],
        minute: chunk.data[5],
        second: chunk.data[6],
    })
}

fn parse_text(chunk: &Chunk) -> Result<TextEntry, PngError> {
    let (keyword, text) =
        split_at_null(chunk.data).ok_or(PngError::InvalidIhdr("tEXt missing keyword terminator"))?;
    Ok(TextEntry {
        keyword: String::from_utf8_lossy(keyword).into_owned(),
        text: String::from_utf8_lossy(text).into_owned(),
        language_tag: None,
        translated_keyword: None,
    })
}

fn parse_ztxt(chunk: &Chunk) -> Result<TextEntry, PngError> {
    let (keyword, rest) =
        split_at_null(chunk.data).ok_or(PngError::InvalidIhdr("zTXt missing keyword terminator"))?;
    if rest.is_empty() {
        return Err(PngError::InvalidIhdr("zTXt missing compression method"));
    }
    let compressed = &rest[1..];
    let text = pnglite_inflate::decode_zlib(compressed)
        .map_err(|_| PngError::InvalidIhdr("zTXt text failed to decompress"))?;
    Ok(TextEntry {
        keyword: String::from_utf8_lossy(keyword).into_owned(),
        text: String::from_utf8_lossy(&text).into_owned(),
        language_tag: None,
        translated_keyword: None,
    })
}

fn parse_itxt(chunk: &Chunk) -> Result<TextEntry, PngError> {
    let (keyword, rest) =
        split_at_null(chunk.data).ok_or(PngError::InvalidIhdr("iTXt missing keyword terminator"))?;
    if rest.len() < 2 {
        return Err(PngError::InvalidIhdr("iTXt truncated before compression flags"));
    }
    let compressed_flag = rest[0];
    let rest = &rest[2..]; // skip compression flag + compression method
    let (language_tag, rest) =
        split_at_null(rest).ok_or(PngError::InvalidIhdr("iTXt missing language tag terminator"))?;
    let (translated_keyword, text_bytes) = split_at_null(rest)
        .ok_or(PngError::InvalidIhdr("iTXt missing translated keyword terminator"))?;

    let text = if compressed_flag == 1 {
        pnglite_inflate::decode_zlib(text_bytes)
            .map_err(|_| PngError::InvalidIhdr("iTXt text failed to decompress"))?
    } else {
        text_bytes.to_vec()
    };

    Ok(TextEntry {
        keyword: String::from_utf8_lossy(keyword).into_owned(),
        text: String::from_utf8_lossy(&text).into_owned(),
        language_tag: Some(String::from_utf8_lossy(language_tag).into_owned()),
        translated_keyword: Some(String::from_utf8_lossy(translated_keyword).into_owned()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::PNG_SIGNATURE;
    use crate::encoder::encode;
    use crate::options::EncoderOptions;

    fn tiny_rgba() -> Image {
        Image {
            width: 1,
            height: 1,
            color_type: ColorType::Rgba,
            bit_depth: BitDepth::Eight,
            interlace: Interlace::None,
            palette: None,
            transparency: None,
            samples: vec![255, 0, 127, 64],
            metadata: Default::default(),
        }
    }

    #[test]
    fn decodes_minimal_1x1_rgba_scenario() {
        let encoded = encode(&tiny_rgba(), &EncoderOptions::default()).unwrap();
        let decoded = decode(&encoded, &DecoderOptions::default()).unwrap();
        assert_eq!(decoded.width, 1);
        assert_eq!(decoded.height, 1);
        assert_eq!(decoded.samples, vec![255, 0, 127, 64]);
    }

    #[test]
    fn rejects_bad_signature() {
        let data = vec![0u8; 40];
        assert_eq!(decode(&data, &DecoderOptions::default()), Err(PngError::BadSignature));
    }

    #[test]
    fn rejects_first_chunk_not_ihdr() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(b"IEND");
        data.extend_from_slice(&pnglite_core::Crc32::of(b"IEND").to_be_bytes());
        assert!(matches!(
            decode(&data, &DecoderOptions::default()),
            Err(PngError::InvalidChunkOrder(_))
        ));
    }

    #[test]
    fn tampered_idat_crc_is_rejected() {
        let mut encoded = encode(&tiny_rgba(), &EncoderOptions::default()).unwrap();
        let idat_pos = encoded.windows(4).position(|w| w == b"IDAT").unwrap();
        *encoded.last_mut().unwrap() ^= 1; // IEND's CRC -- corrupts the final chunk
        let _ = idat_pos;
        assert!(decode(&encoded, &DecoderOptions::default()).is_err());
    }
}
