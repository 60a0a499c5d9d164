//! The Knib container format and its single-threaded sink, `ContainerWriter`.
//!
//! Grounded directly in `examples/original_source/knib_compress/src/KnibFile.hpp`
//! and `knib_read/src/knib_read.h` (the flag bit definitions), with the binary
//! layout serialized field-by-field through the little-endian `Data` trait
//! from [`crate::io`].

use std::io::{Seek, SeekFrom, Write};

use crate::error::{Error, Result, UnitResult};
use crate::io::Data;

/// Flag bit definitions, named after `knib_read.h`'s `knib_header_flags` enum,
/// the original reader library and the authoritative source for these exact
/// values.
pub mod flags {
    /// Set if the video has an alpha channel.
    pub const KNIB_ALPHA: i32 = 1 << 0;

    /// Channel format mask: exactly one of PLANAR/PACKED must be set.
    pub const KNIB_CHANNELS_PLANAR: i32 = 1 << 1;
    pub const KNIB_CHANNELS_PACKED: i32 = 2 << 1;
    pub const KNIB_CHANNELS_MASK: i32 = 3 << 1;

    /// Data compression mask: exactly one of PLAIN/LZ4 must be set.
    pub const KNIB_DATA_PLAIN: i32 = 1 << 22;
    pub const KNIB_DATA_LZ4: i32 = 2 << 22;
    pub const KNIB_DATA_MASK: i32 = 3 << 22;

    /// Texture format mask: exactly one of GREY/ETC1/DXT1 must be set.
    /// GREY is reserved; this encoder never produces it.
    pub const KNIB_TEX_GREY: i32 = 1 << 27;
    pub const KNIB_TEX_ETC1: i32 = 2 << 27;
    pub const KNIB_TEX_DXT1: i32 = 3 << 27;
    pub const KNIB_TEX_MASK: i32 = 3 << 27;
}

/// Number of `i32` fields following the 4-byte magic, i.e.
/// `sizeof(knib_header) - 4`.
const HEADER_I32_FIELDS: usize = 11;
/// Total on-disk size of [`FileHeader`]: 4 magic bytes + 11 `i32` fields.
pub const FILE_HEADER_SIZE: u64 = 4 + (HEADER_I32_FIELDS * 4) as u64;

/// Total on-disk size of [`SetRecord`]: 12 `i32` fields, matching the
/// original `knib_set_header` struct's field list (see `DESIGN.md`).
pub const SET_RECORD_SIZE: u64 = 12 * 4;

/// The file header, written once (mostly zero) when the container is
/// opened, and rewritten in full when it is closed.
#[derive(Debug, Clone, Copy)]
pub struct FileHeader {
    pub magic: [u8; 4],
    pub version: i32,
    pub flags: i32,
    pub orig_width: i32,
    pub orig_height: i32,
    pub frame_width: i32,
    pub frame_height: i32,
    pub frames: i32,
    /// Frames per second. Always written as zero: the original encoder
    /// never set this (a TODO in its own source), and no CLI flag adds it.
    pub framerate: i32,
    pub compressed_buffer_size: i32,
    pub uncompressed_buffer_size: i32,
    pub first_set_offset: i32,
}

impl Default for FileHeader {
    fn default() -> Self {
        FileHeader {
            magic: *b"knib",
            version: 0,
            flags: 0,
            orig_width: 0,
            orig_height: 0,
            frame_width: 0,
            frame_height: 0,
            frames: 0,
            framerate: 0,
            compressed_buffer_size: 0,
            uncompressed_buffer_size: 0,
            first_set_offset: FILE_HEADER_SIZE as i32,
        }
    }
}

impl FileHeader {
    fn write(&self, write: &mut impl Write) -> UnitResult {
        write.write_all(&self.magic)?;
        self.version.write(write)?;
        self.flags.write(write)?;
        self.orig_width.write(write)?;
        self.orig_height.write(write)?;
        self.frame_width.write(write)?;
        self.frame_height.write(write)?;
        self.frames.write(write)?;
        self.framerate.write(write)?;
        self.compressed_buffer_size.write(write)?;
        self.uncompressed_buffer_size.write(write)?;
        self.first_set_offset.write(write)?;
        Ok(())
    }
}

/// The per-set header preceding each set's payload bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetRecord {
    pub data_offset: i32,
    pub data_size: i32,
    pub data_uncompressed_size: i32,
    pub y_data_buffer_offset: i32,
    pub y_data_buffer_size: i32,
    pub cb_data_buffer_offset: i32,
    pub cb_data_buffer_size: i32,
    pub cr_data_buffer_offset: i32,
    pub cr_data_buffer_size: i32,
    pub a_data_buffer_offset: i32,
    pub a_data_buffer_size: i32,
    pub next_set_offset: i32,
}

impl SetRecord {
    fn write(&self, write: &mut impl Write) -> UnitResult {
        self.data_offset.write(write)?;
        self.data_size.write(write)?;
        self.data_uncompressed_size.write(write)?;
        self.y_data_buffer_offset.write(write)?;
        self.y_data_buffer_size.write(write)?;
        self.cb_data_buffer_offset.write(write)?;
        self.cb_data_buffer_size.write(write)?;
        self.cr_data_buffer_offset.write(write)?;
        self.cr_data_buffer_size.write(write)?;
        self.a_data_buffer_offset.write(write)?;
        self.a_data_buffer_size.write(write)?;
        self.next_set_offset.write(write)?;
        Ok(())
    }
}

fn len_to_i32(len: usize, what: &'static str) -> Result<i32> {
    i32::try_from(len).map_err(|_| Error::invalid(format!("{} too large for i32 field", what)))
}

/// Single-threaded sink owning the output file.
///
/// Only the [`crate::pipeline::reorderer::Reorderer`]'s writer thread ever
/// touches this; the main thread only mutates the pre-run header fields
/// through [`ContainerWriter::set_size`]/[`set_flags`]/[`set_frames`] before
/// handing the writer over, and retains it only long enough to guarantee
/// [`ContainerWriter::close`] runs on every exit path.
#[derive(Debug)]
pub struct ContainerWriter<W> {
    file: W,
    header: FileHeader,
    lz4_enabled: bool,

    // Owned resizable scratch buffers, grown monotonically and never
    // shrunk — the redesign's replacement for the original's
    // malloc/free-on-grow scratch buffers.
    uncompressed_scratch: Vec<u8>,
    compressed_scratch: Vec<u8>,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Opens the container: writes a (mostly zeroed) header to reserve its
    /// bytes, to be rewritten with final tallies on [`ContainerWriter::close`].
    pub fn new(mut file: W, lz4_enabled: bool) -> Result<Self> {
        let mut header = FileHeader::default();
        if lz4_enabled {
            header.flags |= flags::KNIB_DATA_LZ4;
        } else {
            header.flags |= flags::KNIB_DATA_PLAIN;
        }

        header.write(&mut file)?;

        Ok(ContainerWriter {
            file,
            header,
            lz4_enabled,
            uncompressed_scratch: Vec::new(),
            compressed_scratch: Vec::new(),
        })
    }

    /// Records both the true source resolution and the (possibly padded
    /// up to a multiple of 8) resolution every frame is actually encoded
    /// at. These diverge whenever padding occurs: `orig_width/height` keep
    /// the original, `frame_width/height` keep the padded values.
    pub fn set_size(&mut self, orig_width: u32, orig_height: u32, frame_width: u32, frame_height: u32) -> Result<()> {
        self.header.orig_width = len_to_i32(orig_width as usize, "orig_width")?;
        self.header.orig_height = len_to_i32(orig_height as usize, "orig_height")?;
        self.header.frame_width = len_to_i32(frame_width as usize, "frame_width")?;
        self.header.frame_height = len_to_i32(frame_height as usize, "frame_height")?;
        Ok(())
    }

    pub fn set_flags(&mut self, extra: i32) {
        self.header.flags |= extra;
    }

    pub fn set_frames(&mut self, frames: usize) -> Result<()> {
        self.header.frames = len_to_i32(frames, "frames")?;
        Ok(())
    }

    fn position(&mut self) -> Result<u64> {
        Ok(self.file.stream_position().map_err(Error::Write)?)
    }

    /// Concatenates `y ++ cb ++ cr ++ a` into the uncompressed scratch
    /// buffer, growing it (never shrinking) to fit.
    fn stage_concatenated(&mut self, parts: &[&[u8]]) -> usize {
        let total: usize = parts.iter().map(|p| p.len()).sum();
        self.uncompressed_scratch.clear();
        self.uncompressed_scratch.reserve(total);
        for part in parts {
            self.uncompressed_scratch.extend_from_slice(part);
        }
        total
    }

    /// Compresses the staged uncompressed scratch buffer if LZ4 is enabled,
    /// returning the number of payload bytes that will actually be written.
    fn compress_staged(&mut self) -> Result<usize> {
        if self.lz4_enabled {
            self.compressed_scratch.clear();
            let compressed = lz4::block::compress(
                &self.uncompressed_scratch,
                Some(lz4::block::CompressionMode::HIGHCOMPRESSION(9)),
                false,
            ).map_err(|err| Error::AllocationFailed(err.to_string()))?;

            self.compressed_scratch = compressed;
            Ok(self.compressed_scratch.len())
        } else {
            Ok(self.uncompressed_scratch.len())
        }
    }

    fn payload(&self) -> &[u8] {
        if self.lz4_enabled { &self.compressed_scratch } else { &self.uncompressed_scratch }
    }

    fn write_record_and_payload(&mut self, mut record: SetRecord, uncompressed_len: usize) -> UnitResult {
        let data_offset = self.position()? + SET_RECORD_SIZE;
        let data_size = self.compress_staged()?;

        record.data_offset = len_to_i32(data_offset as usize, "data_offset")?;
        record.data_size = len_to_i32(data_size, "data_size")?;
        record.data_uncompressed_size = len_to_i32(uncompressed_len, "data_uncompressed_size")?;
        record.next_set_offset = len_to_i32(data_offset as usize + data_size, "next_set_offset")?;

        tracing::trace!(data_offset, data_size, next_set_offset = record.next_set_offset, "writing set");

        record.write(&mut self.file)?;
        self.file.write_all(self.payload())?;

        if record.data_size > self.header.compressed_buffer_size {
            self.header.compressed_buffer_size = record.data_size;
        }
        if self.lz4_enabled && record.data_uncompressed_size > self.header.uncompressed_buffer_size {
            self.header.uncompressed_buffer_size = record.data_uncompressed_size;
        }

        Ok(())
    }

    /// Writes one set in planar mode: a single record spanning Y, Cb, Cr,
    /// and (if present) A, stored contiguously and offset cumulatively.
    ///
    /// Grounded in `KnibFile::OutputPlanar`.
    pub fn output_planar(&mut self, y: &[u8], cb: &[u8], cr: &[u8], a: &[u8]) -> UnitResult {
        if !a.is_empty() {
            self.header.flags |= flags::KNIB_ALPHA;
        }

        let uncompressed_len = self.stage_concatenated(&[y, cb, cr, a]);

        let record = SetRecord {
            y_data_buffer_offset: 0,
            y_data_buffer_size: len_to_i32(y.len(), "y_size")?,
            cb_data_buffer_offset: len_to_i32(y.len(), "cb_offset")?,
            cb_data_buffer_size: len_to_i32(cb.len(), "cb_size")?,
            cr_data_buffer_offset: len_to_i32(y.len() + cb.len(), "cr_offset")?,
            cr_data_buffer_size: len_to_i32(cr.len(), "cr_size")?,
            a_data_buffer_offset: len_to_i32(y.len() + cb.len() + cr.len(), "a_offset")?,
            a_data_buffer_size: len_to_i32(a.len(), "a_size")?,
            ..Default::default()
        };

        self.write_record_and_payload(record, uncompressed_len)
    }

    /// Writes one record of a packed-mode set: a single RGB texture plus an
    /// optional alpha-packing texture (only ever non-empty for the first of
    /// the up-to-three calls per set).
    ///
    /// Grounded in `KnibFile::OutputPackedPart` — note the Cb/Cr fields are
    /// always `(0, 0)` here, not cumulative offsets, matching the original
    /// byte-for-byte.
    fn output_packed_part(&mut self, rgb: &[u8], alpha: &[u8]) -> UnitResult {
        let uncompressed_len = self.stage_concatenated(&[rgb, alpha]);

        let record = SetRecord {
            y_data_buffer_offset: 0,
            y_data_buffer_size: len_to_i32(rgb.len(), "rgb_size")?,
            cb_data_buffer_offset: 0,
            cb_data_buffer_size: 0,
            cr_data_buffer_offset: 0,
            cr_data_buffer_size: 0,
            a_data_buffer_offset: len_to_i32(rgb.len(), "a_offset")?,
            a_data_buffer_size: len_to_i32(alpha.len(), "a_size")?,
            ..Default::default()
        };

        self.write_record_and_payload(record, uncompressed_len)
    }

    /// Writes up to three records in packed mode, one per populated input
    /// frame slot; only the first carries the alpha-packing texture.
    ///
    /// Grounded in `KnibFile::OutputPacked`.
    pub fn output_packed(&mut self, rgb0: &[u8], rgb1: &[u8], rgb2: &[u8], a012: &[u8]) -> UnitResult {
        if !a012.is_empty() {
            self.header.flags |= flags::KNIB_ALPHA;
        }

        if !rgb0.is_empty() { self.output_packed_part(rgb0, a012)?; }
        if !rgb1.is_empty() { self.output_packed_part(rgb1, &[])?; }
        if !rgb2.is_empty() { self.output_packed_part(rgb2, &[])?; }

        Ok(())
    }

    /// Seeks back to the start, rewrites the file header with final
    /// tallies, and flushes. Must run on every exit path, success or
    /// failure, which is why this is the `Drop`-adjacent final step rather
    /// than something callers can forget: the pipeline always calls it from
    /// its own teardown path (see [`crate::pipeline`]).
    pub fn close(mut self) -> UnitResult {
        self.file.seek(SeekFrom::Start(0)).map_err(|_| Error::Seek { offset: 0, whence: "SEEK_SET" })?;
        self.header.write(&mut self.file)?;
        self.file.flush()?;
        Ok(())
    }
}
