//! Frame input: the `ImageSource` trait external collaborators implement,
//! plus the default PNG-backed implementation built on the `image` crate.
//!
//! Grounded in `examples/original_source/knib_compress/src/ImageReader.hpp`
//! (the `stat`-before-`read` pattern, and the frame index iteration order)
//! and `Image.hpp` (the in-memory RGBA frame shape).

use std::path::PathBuf;

use smallvec::SmallVec;

use crate::error::{Error, Result};

/// An in-memory RGBA frame, rows top-to-bottom, 4 bytes per pixel.
#[derive(Debug, Clone)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub pixels: Vec<u8>,
}

/// Up to [`crate::pipeline::FRAMES_PER_SET`] frames staged for one set.
/// Every group the pipeline assembles holds 3 or fewer frames, so the
/// common case never allocates.
pub type FrameGroup = SmallVec<[RgbaFrame; 3]>;

/// What's known about a frame before it's decoded: just enough to let the
/// pipeline validate the whole sequence shares one resolution before doing
/// any decode work, mirroring `ImageReader::Stat`.
#[derive(Debug, Clone, Copy)]
pub struct FrameStat {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
}

/// External collaborator boundary: anything that can hand back frames by
/// index. The production implementation is [`PngSequenceSource`]; tests
/// substitute an in-memory source built directly from pixel buffers.
pub trait ImageSource: Send + Sync {
    /// Cheap check of a frame's dimensions/alpha without decoding pixels.
    /// Called once per frame before the pipeline starts, so a bad frame in
    /// the middle of a long sequence is caught before any work is wasted.
    fn stat(&self, frame: i64) -> Result<FrameStat>;

    /// Decodes one frame, resizing to `(target_width, target_height)` if
    /// they differ from the frame's own dimensions.
    fn load(&self, frame: i64, target_width: u32, target_height: u32) -> Result<RgbaFrame>;
}

/// Default [`ImageSource`]: a `printf`-style path template (e.g.
/// `frame_%04d.png`) read via the `image` crate, resized with a Lanczos3
/// filter when the requested size doesn't match the source.
pub struct PngSequenceSource {
    template: String,
}

impl PngSequenceSource {
    pub fn new(template: impl Into<String>) -> Self {
        PngSequenceSource { template: template.into() }
    }

    fn path_for(&self, frame: i64) -> PathBuf {
        PathBuf::from(expand_template(&self.template, frame))
    }

    /// Decodes the frame, reporting `has_alpha` from the source format
    /// (matching `stat`'s own `decoded.color().has_alpha()`) rather than by
    /// inspecting pixel content — alpha presence is a property of the
    /// frame's encoded format, not of whether any particular pixel happens
    /// to be fully opaque.
    fn decode(&self, frame: i64) -> Result<(image::RgbaImage, bool)> {
        let path = self.path_for(frame);
        let dynamic = image::open(&path)
            .map_err(|_| Error::InputOpenFailed { template: self.template.clone(), frame })?;
        let has_alpha = dynamic.color().has_alpha();
        Ok((dynamic.to_rgba8(), has_alpha))
    }
}

/// Expands a single `%d`-style placeholder (with optional zero-padding
/// width, e.g. `%04d`) the way the original CLI's `sprintf(path, template,
/// frame)` did. Anything more exotic than one integer placeholder isn't
/// supported, matching the original's own single-placeholder convention.
fn expand_template(template: &str, frame: i64) -> String {
    if let Some(percent_pos) = template.find('%') {
        if let Some(d_pos) = template[percent_pos ..].find('d') {
            let spec = &template[percent_pos + 1 .. percent_pos + d_pos];
            let width: usize = spec.trim_start_matches('0').parse().unwrap_or(0);
            let formatted = if spec.starts_with('0') {
                format!("{:0width$}", frame, width = width)
            } else {
                format!("{}", frame)
            };
            let mut result = String::with_capacity(template.len());
            result.push_str(&template[.. percent_pos]);
            result.push_str(&formatted);
            result.push_str(&template[percent_pos + d_pos + 1 ..]);
            return result;
        }
    }
    template.to_string()
}

impl ImageSource for PngSequenceSource {
    fn stat(&self, frame: i64) -> Result<FrameStat> {
        let path = self.path_for(frame);
        let reader = image::io::Reader::open(&path)
            .map_err(|_| Error::InputOpenFailed { template: self.template.clone(), frame })?
            .with_guessed_format()
            .map_err(|_| Error::InputOpenFailed { template: self.template.clone(), frame })?;

        let decoded = reader.decode()
            .map_err(|_| Error::InputOpenFailed { template: self.template.clone(), frame })?;

        Ok(FrameStat { width: decoded.width(), height: decoded.height(), has_alpha: decoded.color().has_alpha() })
    }

    fn load(&self, frame: i64, target_width: u32, target_height: u32) -> Result<RgbaFrame> {
        let (decoded, has_alpha) = self.decode(frame)?;
        let (width, height) = (decoded.width(), decoded.height());

        let resized = if (width, height) == (target_width, target_height) {
            decoded
        } else {
            image::imageops::resize(
                &decoded,
                target_width,
                target_height,
                image::imageops::FilterType::Lanczos3,
            )
        };

        Ok(RgbaFrame { width: target_width, height: target_height, has_alpha, pixels: resized.into_raw() })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn expands_zero_padded_template() {
        assert_eq!(expand_template("frame_%04d.png", 7), "frame_0007.png");
        assert_eq!(expand_template("frame_%d.png", 42), "frame_42.png");
        assert_eq!(expand_template("no_placeholder.png", 3), "no_placeholder.png");
    }
}
