//! Set assembly: turning one or three decoded [`crate::image::RgbaFrame`]s
//! into GPU-compressed textures ready for [`crate::container::ContainerWriter`].
//!
//! The `SetBuilder` trait and its two implementations ([`planar::PlanarSetBuilder`],
//! [`packed::PackedSetBuilder`]) are grounded in
//! `examples/original_source/knib_compress/src/PlanarWorkSet.hpp` and
//! `PackedWorkSet.hpp`; `BlockEncoder` is the external collaborator boundary
//! spec'd in section 8 ("block compression: external interface").

pub mod packed;
pub mod planar;

use crate::container::ContainerWriter;
use crate::error::Result;

/// GPU block texture formats a [`BlockEncoder`] can target. Folds directly
/// into the `KNIB_TEX_*` flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Grey,
    Etc1,
    Dxt1,
}

impl TextureFormat {
    pub fn flag(self) -> i32 {
        use crate::container::flags::*;
        match self {
            TextureFormat::Grey => KNIB_TEX_GREY,
            TextureFormat::Etc1 => KNIB_TEX_ETC1,
            TextureFormat::Dxt1 => KNIB_TEX_DXT1,
        }
    }
}

/// Block-encoder quality tier, threaded straight through from the CLI's
/// `-q`/`--quality` flag to each [`BlockEncoder::encode`] call — the
/// original's `WorkSet` constructors take the same tag and forward it to
/// `libimg`'s compressor unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    #[default]
    Hi,
    Med,
    Lo,
}

/// External collaborator that compresses raw pixels into GPU texture
/// blocks. Real, quality-competitive DXT1/ETC1 compression is treated as
/// out of scope for this crate to own; [`crate::codec`] ships a small
/// reference software implementation of each so
/// `knib-compress` is runnable standalone, but callers chasing real
/// encode speed/quality should plug in their own (e.g. an ISPC or
/// `texpresso`-style encoder bound over FFI) by implementing this trait.
pub trait BlockEncoder: Send + Sync {
    fn texture_format(&self) -> TextureFormat;

    /// Compresses `pixels` (`width * height * channels` bytes, row-major)
    /// into GPU blocks. `channels` is 3 or 4 for every caller in this
    /// crate: `planar::PlanarSetBuilder` always interleaves at stride 4
    /// (unused bytes zeroed), `packed::PackedSetBuilder` always passes
    /// 3-byte RGB pixels (including its A012 alpha-packing texture, which
    /// is RGB-shaped with one source channel per component).
    fn encode(&self, pixels: &[u8], width: u32, height: u32, channels: u32, quality: Quality) -> Result<Vec<u8>>;
}

/// Builds and emits one compressed set. Implementations run entirely on a
/// worker thread; `emit` is the only method that touches the
/// `ContainerWriter`, and the pipeline only calls it from the single
/// writer thread after this set has been reordered into place — see
/// [`crate::pipeline::reorderer::Reorderer`].
pub trait SetBuilder: Send {
    fn index(&self) -> u64;

    /// Runs the (CPU-heavy) conversion and block compression. Safe to call
    /// from any worker thread; must not touch the `ContainerWriter`.
    fn run(&mut self) -> Result<()>;

    /// Writes this set's already-compressed textures to `writer`. Must be
    /// called only after `run` has succeeded, and only in ascending index
    /// order across sets sharing one writer.
    ///
    /// Fixed to `std::fs::File` rather than generic over `Write + Seek`: a
    /// generic method here would make `SetBuilder` un-object-safe, and the
    /// pipeline only ever writes to a real output file (tests use
    /// `tempfile::tempfile()`, itself a `std::fs::File`).
    fn emit(&self, writer: &mut ContainerWriter<std::fs::File>) -> Result<()>;
}
