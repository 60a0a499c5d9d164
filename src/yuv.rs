//! RGBA -> YUVA 4:2:0 (BT.601) conversion and padding.
//!
//! No crate in the retrieved corpus does this narrow a conversion, so this
//! module is written in-house; the arithmetic itself is lifted from
//! `examples/original_source/knib_compress/src/PlanarWorkSet.hpp`'s
//! `RGBAToYUVA420P`, which uses the standard BT.601 integer coefficients.

use crate::math::{chroma_subsampled, round_up_to_multiple_of_8};

/// One plane of a planar image: `width * height` bytes, row-major, no
/// padding between rows.
#[derive(Debug, Clone)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl Plane {
    fn filled(width: u32, height: u32, value: u8) -> Self {
        Plane { width, height, bytes: vec![value; (width * height) as usize] }
    }
}

/// A full YCbCrA 4:2:0 frame: full-resolution Y and A planes, half-resolution
/// (rounded up) Cb and Cr planes.
#[derive(Debug, Clone)]
pub struct PlanarFrame {
    pub y: Plane,
    pub cb: Plane,
    pub cr: Plane,
    /// Present (and full-resolution) only if the source had alpha.
    pub a: Option<Plane>,
}

fn clamp_u8(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

/// BT.601 full-range RGB -> YCbCr for one pixel.
fn rgb_to_ycbcr(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    let y = (66 * r + 129 * g + 25 * b + 128) >> 8;
    let cb = (-38 * r - 74 * g + 112 * b + 128) >> 8;
    let cr = (112 * r - 94 * g - 18 * b + 128) >> 8;
    (clamp_u8(y + 16), clamp_u8(cb + 128), clamp_u8(cr + 128))
}

/// Converts one RGBA frame (`width * height * 4` bytes, rows top-to-bottom)
/// into a [`PlanarFrame`]. `has_alpha` controls whether the A plane is
/// populated; callers already know this from [`crate::image::ImageSource`]
/// stat/load results, so it isn't re-derived from the pixel data.
///
/// Width and height are padded up to a multiple of 8 first (matching
/// `main.cpp`'s padding step, required for DXT1/ETC1's 4x4 and 8x8 block
/// granularity); the padding is filled by edge-extending the rightmost
/// column / bottommost row.
pub fn rgba_to_planar(rgba: &[u8], width: u32, height: u32, has_alpha: bool) -> PlanarFrame {
    let padded_width = round_up_to_multiple_of_8(width);
    let padded_height = round_up_to_multiple_of_8(height);

    let mut y = Plane::filled(padded_width, padded_height, 16);
    let mut a = if has_alpha { Some(Plane::filled(padded_width, padded_height, 255)) } else { None };

    let cb_width = chroma_subsampled(padded_width);
    let cb_height = chroma_subsampled(padded_height);
    let mut cb = Plane::filled(cb_width, cb_height, 128);
    let mut cr = Plane::filled(cb_width, cb_height, 128);

    for py in 0 .. padded_height {
        let src_y = py.min(height.saturating_sub(1));
        for px in 0 .. padded_width {
            let src_x = px.min(width.saturating_sub(1));
            let src_index = ((src_y * width + src_x) * 4) as usize;
            let (r, g, b) = (rgba[src_index], rgba[src_index + 1], rgba[src_index + 2]);

            let (y_value, cb_value, cr_value) = rgb_to_ycbcr(r, g, b);
            y.bytes[(py * padded_width + px) as usize] = y_value;

            if let Some(plane) = a.as_mut() {
                plane.bytes[(py * padded_width + px) as usize] = rgba[src_index + 3];
            }

            // Subsample Cb/Cr by simple decimation at even rows/columns,
            // matching `CrCbAdjustResolution`'s nearest-sample approach
            // rather than averaging the 2x2 block.
            if py % 2 == 0 && px % 2 == 0 {
                let cb_index = ((py / 2) * cb_width + (px / 2)) as usize;
                cb.bytes[cb_index] = cb_value;
                cr.bytes[cb_index] = cr_value;
            }
        }
    }

    PlanarFrame { y, cb, cr, a }
}
