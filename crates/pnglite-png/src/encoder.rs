//! The encoder pipeline (C13): pixel pack -> optional Adam7 split ->
//! filter -> deflate/zlib -> chunk framing, the reverse of
//! [`crate::decoder::decode`].

use crate::adam7;
use crate::chunk::PNG_SIGNATURE;
use crate::errors::PngError;
use crate::filter::{apply_filter, sum_of_absolute_differences, FilterType, ALL_FILTERS};
use crate::image::{Image, Interlace, Transparency};
use crate::metadata::{Background, Chromaticities, IccProfile, ModificationTime, TextEntry};
use crate::options::{EncoderOptions, FilterStrategy};
use crate::pixel::pack_scanline;
use pnglite_core::bytes::ByteWriter;
use pnglite_core::Crc32;

#[cfg(feature = "log")]
use log::debug;

pub fn encode(image: &Image, options: &EncoderOptions) -> Result<Vec<u8>, PngError> {
    let expected_samples =
        image.width as usize * image.height as usize * image.color_type.samples_per_pixel() as usize;
    if image.samples.len() != expected_samples {
        return Err(PngError::InvalidIhdr("sample buffer length does not match width*height*channels"));
    }

    let mut out = ByteWriter::new();
    out.write_bytes(&PNG_SIGNATURE);

    write_chunk(&mut out, b"IHDR", &ihdr_payload(image, options));

    // cHRM, gAMA, iCCP, sBIT, sRGB must precede both PLTE and IDAT.
    if let Some(chrm) = &image.metadata.chromaticities {
        write_chunk(&mut out, b"cHRM", &chrm_payload(chrm));
    }
    if let Some(gamma) = image.metadata.gamma {
        write_chunk(&mut out, b"gAMA", &gamma.to_be_bytes());
    }
    if let Some(icc) = &image.metadata.icc_profile {
        write_chunk(&mut out, b"iCCP", &iccp_payload(icc, options.compression_level));
    }
    if let Some(bits) = &image.metadata.significant_bits {
        write_chunk(&mut out, b"sBIT", bits);
    }
    if let Some(intent) = image.metadata.srgb_rendering_intent {
        write_chunk(&mut out, b"sRGB", &[intent]);
    }

    if image.color_type == pnglite_core::ColorType::Palette {
        let palette = image.palette.as_ref().ok_or(PngError::MissingRequiredChunk("PLTE"))?;
        write_chunk(&mut out, b"PLTE", &plte_payload(palette));
    }

    // bKGD, tRNS must follow PLTE but precede IDAT.
    if let Some(bkgd) = &image.metadata.background {
        write_chunk(&mut out, b"bKGD", &bkgd_payload(bkgd));
    }
    if let Some(trns) = &image.transparency {
        write_chunk(&mut out, b"tRNS", &trns_payload(trns));
    }

    if let Some(phys) = &image.metadata.physical_pixel_dimensions {
        let mut payload = Vec::with_capacity(9);
        payload.extend_from_slice(&phys.x_pixels_per_unit.to_be_bytes());
        payload.extend_from_slice(&phys.y_pixels_per_unit.to_be_bytes());
        payload.push(phys.unit_is_meter as u8);
        write_chunk(&mut out, b"pHYs", &payload);
    }
    if let Some(time) = &image.metadata.modification_time {
        write_chunk(&mut out, b"tIME", &time_payload(time));
    }
    for text in &image.metadata.text {
        write_text_chunk(&mut out, text);
    }
    for (chunk_type, data) in &image.metadata.unknown_chunks {
        write_chunk(&mut out, chunk_type, data);
    }

    let raw = filter_and_pack(image, options.interlace, options.filter_strategy);
    #[cfg(feature = "log")]
    debug!("deflating {} bytes of filtered pixel data", raw.len());
    let compressed = pnglite_deflate::encode_zlib(&raw, options.compression_level);

    for chunk in compressed.chunks(options.idat_chunk_size.max(1)) {
        write_chunk(&mut out, b"IDAT", chunk);
    }

    write_chunk(&mut out, b"IEND", &[]);

    Ok(out.into_vec())
}

fn write_chunk(out: &mut ByteWriter, chunk_type: &[u8; 4], data: &[u8]) {
    out.write_u32_be(data.len() as u32);
    out.write_bytes(chunk_type);
    out.write_bytes(data);
    let mut crc = Crc32::new();
    crc.update(chunk_type);
    crc.update(data);
    out.write_u32_be(crc.finalize());
}

fn ihdr_payload(image: &Image, options: &EncoderOptions) -> [u8; 13] {
    let mut payload = [0u8; 13];
    payload[0..4].copy_from_slice(&image.width.to_be_bytes());
    payload[4..8].copy_from_slice(&image.height.to_be_bytes());
    payload[8] = image.bit_depth.to_wire();
    payload[9] = image.color_type.to_wire();
    payload[10] = 0; // compression method
    payload[11] = 0; // filter method
    payload[12] = options.interlace.to_wire();
    payload
}

fn plte_payload(palette: &[crate::image::PaletteEntry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(palette.len() * 3);
    for entry in palette {
        out.push(entry.r);
        out.push(entry.g);
        out.push(entry.b);
    }
    out
}

fn trns_payload(trns: &Transparency) -> Vec<u8> {
    match trns {
        Transparency::Palette(alphas) => alphas.clone(),
        Transparency::Grayscale(key) => key.to_be_bytes().to_vec(),
        Transparency::Rgb { r, g, b } => {
            let mut out = Vec::with_capacity(6);
            out.extend_from_slice(&r.to_be_bytes());
            out.extend_from_slice(&g.to_be_bytes());
            out.extend_from_slice(&b.to_be_bytes());
            out
        }
    }
}

fn bkgd_payload(bkgd: &Background) -> Vec<u8> {
    match bkgd {
        Background::PaletteIndex(i) => vec![*i],
        Background::Grayscale(v) => v.to_be_bytes().to_vec(),
        Background::Rgb { r, g, b } => {
            let mut out = Vec::with_capacity(6);
            out.extend_from_slice(&r.to_be_bytes());
            out.extend_from_slice(&g.to_be_bytes());
            out.extend_from_slice(&b.to_be_bytes());
            out
        }
    }
}

fn chrm_payload(chrm: &Chromaticities) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, &(x, y)) in [chrm.white_point, chrm.red, chrm.green, chrm.blue].iter().enumerate() {
        out[i * 8..i * 8 + 4].copy_from_slice(&x.to_be_bytes());
        out[i * 8 + 4..i * 8 + 8].copy_from_slice(&y.to_be_bytes());
    }
    out
}

/// iCCP's profile bytes are carried zlib-compressed on the wire; the
/// compression method byte (always 0, "zlib") sits between the
/// null-terminated name and the compressed profile.
fn iccp_payload(icc: &IccProfile, level: pnglite_deflate::CompressionLevel) -> Vec<u8> {
    let mut out = Vec::with_capacity(icc.name.len() + 2 + icc.profile.len());
    out.extend_from_slice(icc.name.as_bytes());
    out.push(0);
    out.push(0); // compression method
    out.extend_from_slice(&pnglite_deflate::encode_zlib(&icc.profile, level));
    out
}

fn time_payload(time: &ModificationTime) -> [u8; 7] {
    let mut out = [0u8; 7];
    out[0..2].copy_from_slice(&time.year.to_be_bytes());
    out[2] = time.month;
    out[3] = time.day;
    out[4] = time.hour;
    out[5] = time.minute;
    out[6] = time.second;
    out
}

/// Picks tEXt vs iTXt based on the fields the caller populated --
/// international text (a language tag or translated keyword) only
/// round-trips through iTXt. Neither is re-compressed (no zTXt/
/// compressed-iTXt on encode): these values are typically small and an
/// encoder is free to choose either in-spec form for the same text.
fn write_text_chunk(out: &mut ByteWriter, text: &TextEntry) {
    if text.language_tag.is_some() || text.translated_keyword.is_some() {
        let mut payload = Vec::new();
        payload.extend_from_slice(text.keyword.as_bytes());
        payload.push(0);
        payload.push(0); // compression flag: uncompressed
        payload.push(0); // compression method
        payload.extend_from_slice(text.language_tag.as_deref().unwrap_or("").as_bytes());
        payload.push(0);
        payload.extend_from_slice(text.translated_keyword.as_deref().unwrap_or("").as_bytes());
        payload.push(0);
        payload.extend_from_slice(text.text.as_bytes());
        write_chunk(out, b"iTXt", &payload);
    } else {
        let mut payload = Vec::with_capacity(text.keyword.len() + 1 + text.text.len());
        payload.extend_from_slice(text.keyword.as_bytes());
        payload.push(0);
        payload.extend_from_slice(text.text.as_bytes());
        write_chunk(out, b"tEXt", &payload);
    }
}

/// Packs, optionally Adam7-splits, and filters the whole raster into
/// the byte stream that gets deflated -- the inverse of
/// `crate::decoder::unfilter_and_unpack`. `interlace` is
/// `options.interlace`, the direction the caller asked for, not
/// `image.interlace` (which only describes how an already-decoded
/// image was stored and is irrelevant to how it gets re-encoded).
fn filter_and_pack(image: &Image, interlace: Interlace, strategy: FilterStrategy) -> Vec<u8> {
    let spp = image.color_type.samples_per_pixel();
    let bits = image.bit_depth.bits();
    let bpp_bytes = (u64::from(spp) * u64::from(bits)).div_ceil(8).max(1) as usize;

    let passes: Vec<(u32, u32)> = if interlace == Interlace::Adam7 {
        (0..adam7::num_passes())
            .map(|p| adam7::pass_dimensions(image.width, image.height, p))
            .collect()
    } else {
        vec![(image.width, image.height)]
    };

    let mut out = Vec::new();

    for (pass_idx, &(pw, ph)) in passes.iter().enumerate() {
        if pw == 0 || ph == 0 {
            continue;
        }
        let row_bytes = pnglite_core::pixel::packed_row_bytes(pw, spp, bits as u8) as usize;
        let mut prev = vec![0u8; row_bytes];

        for row in 0..ph {
            let samples = if interlace == Interlace::Adam7 {
                gather_adam7_row(image, spp, pass_idx, row, pw)
            } else {
                let start = row as usize * image.width as usize * spp as usize;
                image.samples[start..start + pw as usize * spp as usize].to_vec()
            };

            let packed = pack_scanline(&samples, image.bit_depth);
            debug_assert_eq!(packed.len(), row_bytes);

            let (filter, filtered) = choose_filter(strategy, &packed, &prev, bpp_bytes);
            out.push(filter.to_byte());
            out.extend_from_slice(&filtered);

            prev = packed;
        }
    }

    out
}

fn gather_adam7_row(image: &Image, spp: u8, pass: usize, pass_row: u32, pass_width: u32) -> Vec<u16> {
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
    let mut out = Vec::with_capacity(pass_width as usize * spp);
    for px in 0..pass_width {
        let x = x0 + px * xs;
        let idx = (y as usize * image.width as usize + x as usize) * spp;
        out.extend_from_slice(&image.samples[idx..idx + spp]);
    }
    out
}

fn choose_filter(
    strategy: FilterStrategy,
    packed: &[u8],
    prev: &[u8],
    bpp: usize,
) -> (FilterType, Vec<u8>) {
    match strategy {
        FilterStrategy::Fixed(filter) => {
            let mut out = vec![0u8; packed.len()];
            apply_filter(filter, packed, prev, bpp, &mut out);
            (filter, out)
        }
        FilterStrategy::MinimumSumOfAbsoluteDifferences => {
            let mut best: Option<(FilterType, Vec<u8>, u64)> = None;
            for &filter in ALL_FILTERS.iter() {
                let mut out = vec![0u8; packed.len()];
                apply_filter(filter, packed, prev, bpp, &mut out);
                let score = sum_of_absolute_differences(&out);
                if best.as_ref().is_none_or(|(_, _, best_score)| score < *best_score) {
                    best = Some((filter, out, score));
                }
            }
            let (filter, out, _) = best.expect("ALL_FILTERS is non-empty");
            (filter, out)
        }
    }
}
