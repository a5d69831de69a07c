//! Adam7 interlacing (part of C12/C13): the seven-pass sub-sampling
//! schedule PNG uses when IHDR's interlace method is 1. Used by both
//! directions -- decode recomposes passes into a raster, encode splits
//! a raster into passes before filtering.

/// Per-pass (x_start, y_start, x_step, y_step), RFC 2083 table 8.13.
const PASSES: [(u32, u32, u32, u32); 7] = [
    (0, 0, 8, 8),
    (4, 0, 8, 8),
    (0, 4, 4, 8),
    (2, 0, 4, 4),
    (0, 2, 2, 4),
    (1, 0, 2, 2),
    (0, 1, 1, 2),
];

/// Pixel dimensions of pass `i` (0-indexed) for a `width`x`height` image.
/// A pass with zero width or height contributes no scanlines at all.
pub fn pass_dimensions(width: u32, height: u32, pass: usize) -> (u32, u32) {
    let (x0, y0, xs, ys) = PASSES[pass];
    let w = if width > x0 { (width - x0).div_ceil(xs) } else { 0 };
    let h = if height > y0 { (height - y0).div_ceil(ys) } else { 0 };
    (w, h)
}

pub fn num_passes() -> usize {
    PASSES.len()
}

/// Returns `(pass_x, pass_y)` source coordinates, i.e. the position of
/// full-raster pixel `(x, y)` within its owning pass (the inverse of
/// placement).
fn pass_local_coords(x: u32, y: u32, pass: usize) -> (u32, u32) {
    let (x0, y0, xs, ys) = PASSES[pass];
    ((x - x0) / xs, (y - y0) / ys)
}

/// For a full-raster pixel coordinate, which pass owns it.
pub fn owning_pass(x: u32, y: u32) -> usize {
    for (i, &(x0, y0, xs, ys)) in PASSES.iter().enumerate() {
        if x >= x0 && (x - x0).is_multiple_of(xs) && y >= y0 && (y - y0).is_multiple_of(ys) {
            return i;
        }
    }
    unreachable!("Adam7 passes partition every (x, y)")
}

#[allow(dead_code)]
pub fn local_coords(x: u32, y: u32, pass: usize) -> (u32, u32) {
    pass_local_coords(x, y, pass)
}
