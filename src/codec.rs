//! Small reference software implementations of the two texture formats
//! the CLI's `-D`/`--DXT1` and `-E`/`--ETC1` flags select.
//!
//! Real-time GPU block compression is treated as an external-collaborator
//! concern the pipeline only calls through the [`BlockEncoder`] trait, and
//! the original C encoder itself links it from an external
//! `libimg`/`libimgutil` that isn't part of its own source tree (see
//! `examples/original_source/knib_compress/src/main.cpp`'s
//! `#include <libimg.h>`). These two encoders exist only so
//! `knib-compress` is runnable end-to-end without an external codec
//! dependency; they favor a simple, always-valid bitstream over encode
//! quality. A caller chasing real quality/speed should implement
//! [`BlockEncoder`] against a real vectorized encoder instead.

use crate::error::Result;
use crate::setbuilder::{BlockEncoder, Quality, TextureFormat};

/// BC1/DXT1 block encoder. Each 4x4 pixel block becomes 8 bytes: two
/// RGB565 endpoints (little-endian `u16`s) followed by a 32-bit,
/// 2-bit-per-pixel index word, row-major, LSB-first — the standard BC1
/// layout used by every desktop/ES texture loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dxt1Encoder;

/// ETC1 block encoder, individual (non-differential) mode only, with a
/// fixed codeword table (table index 0) per subblock and no `flip`: each
/// 4x4 block splits into two 4x2 vertical subblocks (left/right columns),
/// each given its own quantized average base color and per-pixel 2-bit
/// modifier index chosen to minimize luma error against that average.
#[derive(Debug, Clone, Copy, Default)]
pub struct Etc1Encoder;

const BLOCK: u32 = 4;

/// Iterates the 4x4-block grid covering `width x height`, which is
/// guaranteed a multiple of 8 (and therefore of 4) by the time it reaches
/// a `BlockEncoder` — see `crate::math::round_up_to_multiple_of_8`.
fn for_each_block(width: u32, height: u32, mut visit: impl FnMut(u32, u32)) {
    let mut by = 0;
    while by < height {
        let mut bx = 0;
        while bx < width {
            visit(bx, by);
            bx += BLOCK;
        }
        by += BLOCK;
    }
}

fn pixel_at(pixels: &[u8], width: u32, channels: u32, x: u32, y: u32) -> (u8, u8, u8) {
    let stride = (width * channels) as usize;
    let offset = y as usize * stride + x as usize * channels as usize;
    (pixels[offset], pixels[offset + 1], pixels[offset + 2])
}

fn to_565(r: u8, g: u8, b: u8) -> u16 {
    let r5 = (r as u16 >> 3) & 0x1f;
    let g6 = (g as u16 >> 2) & 0x3f;
    let b5 = (b as u16 >> 3) & 0x1f;
    (r5 << 11) | (g6 << 5) | b5
}

fn from_565(value: u16) -> (u8, u8, u8) {
    let r5 = (value >> 11) & 0x1f;
    let g6 = (value >> 5) & 0x3f;
    let b5 = value & 0x1f;
    (((r5 << 3) | (r5 >> 2)) as u8, ((g6 << 2) | (g6 >> 4)) as u8, ((b5 << 3) | (b5 >> 2)) as u8)
}

fn color_distance((r0, g0, b0): (u8, u8, u8), (r1, g1, b1): (u8, u8, u8)) -> i32 {
    let dr = r0 as i32 - r1 as i32;
    let dg = g0 as i32 - g1 as i32;
    let db = b0 as i32 - b1 as i32;
    dr * dr + dg * dg + db * db
}

fn lerp(a: u8, b: u8, num: i32, den: i32) -> u8 {
    ((a as i32 * (den - num) + b as i32 * num) / den) as u8
}

impl BlockEncoder for Dxt1Encoder {
    fn texture_format(&self) -> TextureFormat {
        TextureFormat::Dxt1
    }

    /// Endpoints are the block's per-channel min/max corners (a simple
    /// "bounding box" fit, not a principal-axis search); every pixel then
    /// picks the nearest of the 4 interpolated colors.
    fn encode(&self, pixels: &[u8], width: u32, height: u32, channels: u32, _quality: Quality) -> Result<Vec<u8>> {
        let blocks_wide = (width / BLOCK) as usize;
        let blocks_tall = (height / BLOCK) as usize;
        let mut out = Vec::with_capacity(blocks_wide * blocks_tall * 8);

        for_each_block(width, height, |bx, by| {
            let mut block_pixels = [(0u8, 0u8, 0u8); 16];
            let mut i = 0;
            for y in by .. by + BLOCK {
                for x in bx .. bx + BLOCK {
                    block_pixels[i] = pixel_at(pixels, width, channels, x, y);
                    i += 1;
                }
            }

            let (mut min, mut max) = (block_pixels[0], block_pixels[0]);
            for &(r, g, b) in &block_pixels[1 ..] {
                min = (min.0.min(r), min.1.min(g), min.2.min(b));
                max = (max.0.max(r), max.1.max(g), max.2.max(b));
            }

            // `max`'s per-channel components are each >= `min`'s, and 565
            // packs the channels into non-overlapping, equally-ordered bit
            // ranges, so `color0 >= color1` always; only equality (a
            // visually solid block) needs correcting to force the 4-color
            // mode, since `color0 == color1` would select BC1's
            // punch-through-alpha interpretation instead.
            let color0_raw = to_565(max.0, max.1, max.2);
            let color1_raw = to_565(min.0, min.1, min.2);
            let (color0, color1) = if color0_raw == color1_raw {
                if color1_raw > 0 { (color0_raw, color1_raw - 1) } else { (color0_raw + 1, color1_raw) }
            } else {
                (color0_raw, color1_raw)
            };

            let c0 = from_565(color0);
            let c1 = from_565(color1);
            let c2 = (lerp(c0.0, c1.0, 1, 3), lerp(c0.1, c1.1, 1, 3), lerp(c0.2, c1.2, 1, 3));
            let c3 = (lerp(c0.0, c1.0, 2, 3), lerp(c0.1, c1.1, 2, 3), lerp(c0.2, c1.2, 2, 3));
            let palette = [c0, c1, c2, c3];

            let mut indices: u32 = 0;
            for (i, &pixel) in block_pixels.iter().enumerate() {
                let mut best_index = 0usize;
                let mut best_distance = i32::MAX;
                for (candidate_index, &candidate) in palette.iter().enumerate() {
                    let distance = color_distance(pixel, candidate);
                    if distance < best_distance {
                        best_distance = distance;
                        best_index = candidate_index;
                    }
                }
                indices |= (best_index as u32) << (i * 2);
            }

            out.extend_from_slice(&color0.to_le_bytes());
            out.extend_from_slice(&color1.to_le_bytes());
            out.extend_from_slice(&indices.to_le_bytes());
        });

        Ok(out)
    }
}

/// Standard ETC1 per-table signed modifier values (4 entries per table,
/// table index selects the row); only table 0 is used here.
const ETC1_MODIFIERS: [i32; 4] = [2, 8, -2, -8];

fn quantize_to_4bit(value: u8) -> (u8, u8) {
    let q = value >> 4;
    (q, (q << 4) | q)
}

/// Encodes one 4x2 (or 2x4, with `flip`) subblock: returns the quantized
/// 4-bit base color and, for each of its 8 pixels, the 2-bit modifier
/// index (0-3) that best matches its luma offset from that base.
fn encode_subblock(pixels: &[(u8, u8, u8)]) -> ((u8, u8, u8), (u8, u8, u8), [u8; 8]) {
    let count = pixels.len() as u32;
    let (mut sum_r, mut sum_g, mut sum_b) = (0u32, 0u32, 0u32);
    for &(r, g, b) in pixels {
        sum_r += r as u32;
        sum_g += g as u32;
        sum_b += b as u32;
    }
    let avg = ((sum_r / count) as u8, (sum_g / count) as u8, (sum_b / count) as u8);

    let (r4, r8) = quantize_to_4bit(avg.0);
    let (g4, g8) = quantize_to_4bit(avg.1);
    let (b4, b8) = quantize_to_4bit(avg.2);
    let base4 = (r4, g4, b4);
    let base8 = (r8, g8, b8);

    let mut indices = [0u8; 8];
    for (slot, &(r, g, b)) in pixels.iter().enumerate() {
        let delta = (r as i32 - base8.0 as i32) + (g as i32 - base8.1 as i32) + (b as i32 - base8.2 as i32);
        let delta = delta / 3;

        let mut best_index = 0usize;
        let mut best_distance = i32::MAX;
        for (index, &modifier) in ETC1_MODIFIERS.iter().enumerate() {
            let distance = (delta - modifier).abs();
            if distance < best_distance {
                best_distance = distance;
                best_index = index;
            }
        }
        indices[slot] = best_index as u8;
    }

    (base4, base8, indices)
}

impl BlockEncoder for Etc1Encoder {
    fn texture_format(&self) -> TextureFormat {
        TextureFormat::Etc1
    }

    fn encode(&self, pixels: &[u8], width: u32, height: u32, channels: u32, _quality: Quality) -> Result<Vec<u8>> {
        let blocks_wide = (width / BLOCK) as usize;
        let blocks_tall = (height / BLOCK) as usize;
        let mut out = Vec::with_capacity(blocks_wide * blocks_tall * 8);

        for_each_block(width, height, |bx, by| {
            // Left/right 2-column subblocks (flip = 0).
            let mut left = Vec::with_capacity(8);
            let mut right = Vec::with_capacity(8);
            for x in bx .. bx + 2 {
                for y in by .. by + BLOCK {
                    left.push(pixel_at(pixels, width, channels, x, y));
                }
            }
            for x in bx + 2 .. bx + BLOCK {
                for y in by .. by + BLOCK {
                    right.push(pixel_at(pixels, width, channels, x, y));
                }
            }

            let (left_base4, _left_base8, left_indices) = encode_subblock(&left);
            let (right_base4, _right_base8, right_indices) = encode_subblock(&right);

            // Header word: diff=0, flip=0, table1=table2=0, individual-mode colors.
            let mut header: u64 = 0;
            header |= (left_base4.0 as u64) << 52;
            header |= (right_base4.0 as u64) << 48;
            header |= (left_base4.1 as u64) << 44;
            header |= (right_base4.1 as u64) << 40;
            header |= (left_base4.2 as u64) << 36;
            header |= (right_base4.2 as u64) << 32;

            // Pixel index word: bit position = x*4 + y (column-major), per
            // the standard ETC1 layout; left subblock occupies x in 0..2,
            // right subblock x in 2..4.
            let mut msb: u32 = 0;
            let mut lsb: u32 = 0;
            for (i, &index) in left_indices.iter().enumerate() {
                let x = i / 4;
                let y = i % 4;
                let bit = x as u32 * 4 + y as u32;
                msb |= ((index as u32 >> 1) & 1) << bit;
                lsb |= (index as u32 & 1) << bit;
            }
            for (i, &index) in right_indices.iter().enumerate() {
                let x = 2 + i / 4;
                let y = i % 4;
                let bit = x as u32 * 4 + y as u32;
                msb |= ((index as u32 >> 1) & 1) << bit;
                lsb |= (index as u32 & 1) << bit;
            }

            let pixel_word: u32 = (msb << 16) | lsb;
            let block: u64 = (header) | (pixel_word as u64);

            out.extend_from_slice(&block.to_be_bytes());
        });

        Ok(out)
    }
}
