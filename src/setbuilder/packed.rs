//! Packed set builder: each source frame keeps its own RGB texture, and the
//! three frames' alpha bytes are moved out of their RGBA pixels into the
//! R/G/B channels of one shared "A012" texture.
//!
//! Grounded in
//! `examples/original_source/knib_compress/src/PackedWorkSet.hpp`'s
//! `MoveAlphaToChannel` and `Run()`.

use std::sync::Arc;

use crate::container::ContainerWriter;
use crate::error::Result;
use crate::image::RgbaFrame;
use crate::setbuilder::{BlockEncoder, Quality, SetBuilder};

/// Strips the alpha byte out of an RGBA buffer, returning the packed RGB
/// bytes and the alpha bytes separately.
fn split_rgb_and_alpha(rgba: &[u8]) -> (Vec<u8>, Vec<u8>) {
    let pixel_count = rgba.len() / 4;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in rgba.chunks_exact(4) {
        rgb.extend_from_slice(&pixel[0 .. 3]);
        alpha.push(pixel[3]);
    }
    (rgb, alpha)
}

/// Combines up to three single-channel alpha buffers into one RGB buffer:
/// `frame[0]`'s alpha goes to R, `frame[1]`'s to G, `frame[2]`'s to B.
/// Missing frames contribute a zeroed channel.
fn pack_alpha_channels(alphas: &[&[u8]]) -> Vec<u8> {
    let pixel_count = alphas[0].len();
    let mut out = vec![0u8; pixel_count * 3];
    for (channel, alpha) in alphas.iter().enumerate().take(3) {
        for i in 0 .. pixel_count {
            out[i * 3 + channel] = alpha[i];
        }
    }
    out
}

struct CompressedPackedSet {
    rgb: Vec<Vec<u8>>,
    a012: Vec<u8>,
}

pub struct PackedSetBuilder {
    index: u64,
    frames: Vec<RgbaFrame>,
    encoder: Arc<dyn BlockEncoder>,
    quality: Quality,
    has_alpha: bool,
    compressed: Option<CompressedPackedSet>,
}

impl PackedSetBuilder {
    /// `frames` holds 1-3 source frames, already resized to a common
    /// resolution. `has_alpha` is decided once, up front, from the stat'd
    /// first frame's format (see `crate::pipeline::run`), not re-derived
    /// per frame — every set agrees with the header's single `KNIB_ALPHA`
    /// bit. Unlike planar mode, packed mode doesn't pad a short tail group
    /// by repeating frames: each input frame gets its own output texture,
    /// so a 1- or 2-frame final group just emits fewer records
    /// (`ContainerWriter::output_packed` skips empty slots).
    pub fn new(index: u64, frames: Vec<RgbaFrame>, encoder: Arc<dyn BlockEncoder>, quality: Quality, has_alpha: bool) -> Self {
        assert!(!frames.is_empty() && frames.len() <= 3, "a set holds 1 to 3 frames");
        PackedSetBuilder { index, frames, encoder, quality, has_alpha, compressed: None }
    }
}

impl SetBuilder for PackedSetBuilder {
    fn index(&self) -> u64 {
        self.index
    }

    fn run(&mut self) -> Result<()> {
        let width = self.frames[0].width;
        let height = self.frames[0].height;

        let mut rgb_compressed = Vec::with_capacity(self.frames.len());
        let mut alpha_planes: Vec<Vec<u8>> = Vec::with_capacity(self.frames.len());

        for frame in &self.frames {
            let (rgb, alpha) = split_rgb_and_alpha(&frame.pixels);
            let compressed = self.encoder.encode(&rgb, width, height, 3, self.quality)?;
            rgb_compressed.push(compressed);
            alpha_planes.push(alpha);
        }

        let a012 = if self.has_alpha {
            let refs: Vec<&[u8]> = alpha_planes.iter().map(|a| a.as_slice()).collect();
            let packed = pack_alpha_channels(&refs);
            self.encoder.encode(&packed, width, height, 3, self.quality)?
        } else {
            Vec::new()
        };

        self.compressed = Some(CompressedPackedSet { rgb: rgb_compressed, a012 });
        Ok(())
    }

    fn emit(&self, writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
        let compressed = self.compressed.as_ref()
            .expect("emit called before run completed");

        let empty: Vec<u8> = Vec::new();
        let rgb0 = compressed.rgb.first().unwrap_or(&empty);
        let rgb1 = compressed.rgb.get(1).unwrap_or(&empty);
        let rgb2 = compressed.rgb.get(2).unwrap_or(&empty);

        writer.output_packed(rgb0, rgb1, rgb2, &compressed.a012)?;
        Ok(())
    }
}
