//! Planar set builder: combines up to three source frames' worth of each
//! plane (Y, Cb, Cr, and optionally A) into one 4-channel texture per
//! plane, so a single `BlockEncoder::encode` call compresses three frames
//! at once instead of three separate calls.
//!
//! Grounded in `examples/original_source/knib_compress/src/PlanarWorkSet.hpp`,
//! whose `Run()` builds exactly this: three frames' Y/Cb/Cr/A planes packed
//! byte-wise into the R/G/B(/A) channels of one combined image before
//! handing it to the block compressor.

use std::sync::Arc;

use crate::container::ContainerWriter;
use crate::error::Result;
use crate::image::RgbaFrame;
use crate::setbuilder::{BlockEncoder, Quality, SetBuilder};
use crate::yuv::{rgba_to_planar, Plane, PlanarFrame};

/// Interleaves up to three same-sized real planes byte-wise into one
/// 4-channel buffer, starting from an all-`0xFF` fill: `out[4*i + k] =
/// planes[k][i]` for each real plane `k`. A channel with no real plane
/// (a missing trailing slot) and the unused 4th stride byte both stay
/// `0xFF`, matching `PlanarWorkSet.hpp:179-183`'s `memset(..., 0xff, ...)`
/// base fill rather than zero.
fn build_combined_plane(planes: &[&Plane], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = (width * height) as usize;
    let mut out = vec![0xFFu8; pixel_count * 4];

    for (channel, plane) in planes.iter().enumerate().take(3) {
        for i in 0 .. pixel_count {
            out[i * 4 + channel] = plane.bytes[i];
        }
    }

    out
}

struct CompressedPlanarSet {
    y: Vec<u8>,
    cb: Vec<u8>,
    cr: Vec<u8>,
    a: Vec<u8>,
}

pub struct PlanarSetBuilder {
    index: u64,
    frames: Vec<RgbaFrame>,
    encoder: Arc<dyn BlockEncoder>,
    quality: Quality,
    has_alpha: bool,
    compressed: Option<CompressedPlanarSet>,
}

impl PlanarSetBuilder {
    /// `frames` must hold 1-3 source frames, already resized to a common
    /// resolution. `has_alpha` is decided once, up front, from the stat'd
    /// first frame's format (see `crate::pipeline::run`) — every set shares
    /// the same value, so the header's single `KNIB_ALPHA` bit is never
    /// contradicted by an individual set.
    ///
    /// A trailing group shorter than 3 is *not* padded by repeating a real
    /// frame or by converting a synthetic white RGBA frame through YUV:
    /// `run` only ever converts the real frames it was given, and any
    /// channel past `frames.len()` is left at the staging planes' `0xFF`
    /// base fill.
    pub fn new(index: u64, frames: Vec<RgbaFrame>, encoder: Arc<dyn BlockEncoder>, quality: Quality, has_alpha: bool) -> Self {
        assert!(!frames.is_empty() && frames.len() <= 3, "a set holds 1 to 3 frames");
        PlanarSetBuilder { index, frames, encoder, quality, has_alpha, compressed: None }
    }
}

impl SetBuilder for PlanarSetBuilder {
    fn index(&self) -> u64 {
        self.index
    }

    fn run(&mut self) -> Result<()> {
        let planar: Vec<PlanarFrame> = self.frames.iter()
            .map(|f| rgba_to_planar(&f.pixels, f.width, f.height, self.has_alpha))
            .collect();

        let (y_width, y_height) = (planar[0].y.width, planar[0].y.height);
        let (cb_width, cb_height) = (planar[0].cb.width, planar[0].cb.height);
        let (cr_width, cr_height) = (planar[0].cr.width, planar[0].cr.height);

        let y_planes: Vec<&Plane> = planar.iter().map(|p| &p.y).collect();
        let cb_planes: Vec<&Plane> = planar.iter().map(|p| &p.cb).collect();
        let cr_planes: Vec<&Plane> = planar.iter().map(|p| &p.cr).collect();

        let y_combined = build_combined_plane(&y_planes, y_width, y_height);
        let cb_combined = build_combined_plane(&cb_planes, cb_width, cb_height);
        let cr_combined = build_combined_plane(&cr_planes, cr_width, cr_height);

        let y = self.encoder.encode(&y_combined, y_width, y_height, 4, self.quality)?;
        let cb = self.encoder.encode(&cb_combined, cb_width, cb_height, 4, self.quality)?;
        let cr = self.encoder.encode(&cr_combined, cr_width, cr_height, 4, self.quality)?;

        let a = if self.has_alpha {
            let a_planes: Vec<&Plane> = planar.iter()
                .map(|p| p.a.as_ref().expect("has_alpha implies every frame carries an A plane"))
                .collect();
            let a_combined = build_combined_plane(&a_planes, y_width, y_height);
            self.encoder.encode(&a_combined, y_width, y_height, 4, self.quality)?
        } else {
            Vec::new()
        };

        self.compressed = Some(CompressedPlanarSet { y, cb, cr, a });
        Ok(())
    }

    fn emit(&self, writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
        let compressed = self.compressed.as_ref()
            .expect("emit called before run completed");
        writer.output_planar(&compressed.y, &compressed.cb, &compressed.cr, &compressed.a)?;
        Ok(())
    }
}
