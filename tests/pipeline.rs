//! End-to-end pipeline scenarios, driven through the public API
//! (`knib::pipeline::run`) against an in-memory `ImageSource` and a toy
//! `BlockEncoder` whose output size is simply `width * height` bytes per
//! plane (e.g. an 8x8 Y plane compresses to 64 bytes, its 4x4 Cb plane to
//! 16), without claiming to be a real DXT1/ETC1 bitstream.

use std::io::Read;
use std::sync::Arc;

use knib::container::flags;
use knib::error::Result;
use knib::image::{FrameStat, ImageSource, RgbaFrame};
use knib::pipeline::{run, ChannelFormat, PipelineOptions};
use knib::setbuilder::{BlockEncoder, Quality, TextureFormat};

struct MemorySource {
    frames: Vec<RgbaFrame>,
}

impl ImageSource for MemorySource {
    fn stat(&self, frame: i64) -> Result<FrameStat> {
        let image = &self.frames[frame as usize];
        Ok(FrameStat { width: image.width, height: image.height, has_alpha: image.has_alpha })
    }

    fn load(&self, frame: i64, target_width: u32, target_height: u32) -> Result<RgbaFrame> {
        let image = self.frames[frame as usize].clone();
        assert_eq!((image.width, image.height), (target_width, target_height), "test frames are pre-padded");
        Ok(image)
    }
}

/// `width * height` bytes of a single checksum byte — deterministic given
/// the input pixels, small enough to size-check exactly.
struct ToyEncoder(TextureFormat);

impl BlockEncoder for ToyEncoder {
    fn texture_format(&self) -> TextureFormat { self.0 }

    fn encode(&self, pixels: &[u8], width: u32, height: u32, _channels: u32, _quality: Quality) -> Result<Vec<u8>> {
        let checksum = pixels.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte));
        Ok(vec![checksum; (width * height) as usize])
    }
}

fn solid_rgb_frame(width: u32, height: u32, value: u8) -> RgbaFrame {
    let mut pixels = vec![255u8; (width * height * 4) as usize];
    for chunk in pixels.chunks_exact_mut(4) {
        chunk[0] = value;
        chunk[1] = value;
        chunk[2] = value;
        chunk[3] = 255;
    }
    RgbaFrame { width, height, has_alpha: false, pixels }
}

fn solid_rgba_frame(width: u32, height: u32, value: u8, alpha: u8) -> RgbaFrame {
    let mut pixels = vec![0u8; (width * height * 4) as usize];
    for chunk in pixels.chunks_exact_mut(4) {
        chunk[0] = value;
        chunk[1] = value;
        chunk[2] = value;
        chunk[3] = alpha;
    }
    RgbaFrame { width, height, has_alpha: true, pixels }
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(bytes[offset .. offset + 4].try_into().unwrap())
}

fn read_output(file: &mut std::fs::File) -> Vec<u8> {
    use std::io::Seek;
    file.seek(std::io::SeekFrom::Start(0)).unwrap();
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).unwrap();
    bytes
}

const HEADER: usize = 48;
const RECORD: usize = 48;

#[test]
fn three_8x8_rgb_frames_planar_no_alpha_no_lz4() {
    let source = Arc::new(MemorySource {
        frames: vec![
            solid_rgb_frame(8, 8, 10),
            solid_rgb_frame(8, 8, 20),
            solid_rgb_frame(8, 8, 30),
        ],
    });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 2,
        increment_frame: 1,
        threads: 2,
        channel_format: ChannelFormat::Planar,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    assert_eq!(read_i32(&bytes, 4 + 6 * 4), 3, "frames");
    assert_eq!(read_i32(&bytes, 4 + 2 * 4), 8, "orig_width");
    assert_eq!(read_i32(&bytes, 4 + 3 * 4), 8, "orig_height");

    let compressed_buffer_size = read_i32(&bytes, 4 + 8 * 4);
    let uncompressed_buffer_size = read_i32(&bytes, 4 + 9 * 4);
    assert_eq!(compressed_buffer_size, 96, "y(64) + cb(16) + cr(16)");
    assert_eq!(uncompressed_buffer_size, 0, "LZ4 disabled");

    let data_size = read_i32(&bytes, HEADER + 1 * 4);
    let data_uncompressed_size = read_i32(&bytes, HEADER + 2 * 4);
    let next_set_offset = read_i32(&bytes, HEADER + 11 * 4);
    assert_eq!(data_size, 96);
    assert_eq!(data_uncompressed_size, 96);
    assert_eq!(next_set_offset as usize, HEADER + RECORD + 96);
}

#[test]
fn lz4_tracks_uncompressed_size_separately() {
    let source = Arc::new(MemorySource {
        frames: vec![
            solid_rgb_frame(8, 8, 10),
            solid_rgb_frame(8, 8, 20),
            solid_rgb_frame(8, 8, 30),
        ],
    });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 2,
        increment_frame: 1,
        threads: 2,
        channel_format: ChannelFormat::Planar,
        lz4: true,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    let uncompressed_buffer_size = read_i32(&bytes, 4 + 9 * 4);
    assert_eq!(uncompressed_buffer_size, 96);

    let data_uncompressed_size = read_i32(&bytes, HEADER + 2 * 4);
    assert_eq!(data_uncompressed_size, 96);
    // every byte of the staged buffer is identical (one checksum value
    // repeated) so liblz4 compresses it well below the uncompressed size
    let data_size = read_i32(&bytes, HEADER + 1 * 4);
    assert!(data_size > 0 && data_size <= 96, "lz4 output should never exceed the input here");
}

#[test]
fn fully_opaque_rgba_source_still_carries_alpha_plane() {
    // Every pixel's alpha byte is 255, but the source format reports
    // `has_alpha`, so the decision to carry an alpha plane must come from
    // the stat'd format, not from scanning pixel content for a non-255 byte.
    let source = Arc::new(MemorySource {
        frames: vec![
            solid_rgba_frame(8, 8, 10, 255),
            solid_rgba_frame(8, 8, 20, 255),
            solid_rgba_frame(8, 8, 30, 255),
        ],
    });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 2,
        increment_frame: 1,
        threads: 1,
        channel_format: ChannelFormat::Planar,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    let flags_word = read_i32(&bytes, 4 + 1 * 4);
    assert_ne!(flags_word & flags::KNIB_ALPHA, 0, "format-reported alpha must set KNIB_ALPHA even when every pixel is opaque");

    let a_size = read_i32(&bytes, HEADER + 10 * 4);
    assert!(a_size > 0, "an alpha plane must still be compressed and written");
}

#[test]
fn four_16x16_rgba_frames_planar_two_sets_alpha_flag_set() {
    let source = Arc::new(MemorySource {
        frames: vec![
            solid_rgba_frame(16, 16, 10, 200),
            solid_rgba_frame(16, 16, 20, 210),
            solid_rgba_frame(16, 16, 30, 220),
            solid_rgba_frame(16, 16, 40, 230),
        ],
    });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Etc1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 3,
        increment_frame: 1,
        threads: 4,
        channel_format: ChannelFormat::Planar,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    assert_eq!(read_i32(&bytes, 4 + 6 * 4), 4, "frames");
    let flags_word = read_i32(&bytes, 4 + 1 * 4);
    assert_ne!(flags_word & flags::KNIB_ALPHA, 0);

    let first_a_size = read_i32(&bytes, HEADER + 10 * 4);
    assert!(first_a_size > 0, "first set carries alpha");

    let first_next = read_i32(&bytes, HEADER + 11 * 4) as usize;
    let second_a_size = read_i32(&bytes, first_next + 10 * 4);
    assert!(second_a_size > 0, "trailing partial set still carries alpha (white-filled, not dropped)");

    let second_next = read_i32(&bytes, first_next + 11 * 4) as usize;
    assert_eq!(bytes.len(), second_next, "file ends exactly after the second set's payload");
}

#[test]
fn packed_mode_never_populates_cb_cr_fields() {
    let source = Arc::new(MemorySource {
        frames: vec![
            solid_rgb_frame(16, 16, 10),
            solid_rgb_frame(16, 16, 20),
            solid_rgb_frame(16, 16, 30),
        ],
    });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 2,
        increment_frame: 1,
        threads: 1,
        channel_format: ChannelFormat::Packed,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    // 3 frames, packed: 3 separate SetRecords sharing one set index's worth
    // of output, only the first carrying a nonzero a_off/a_size.
    let cb_size = read_i32(&bytes, HEADER + 6 * 4);
    let cr_size = read_i32(&bytes, HEADER + 8 * 4);
    assert_eq!((cb_size, cr_size), (0, 0), "packed mode never populates cb/cr");
}

#[test]
fn thread_count_does_not_change_output_bytes() {
    fn encode_with(threads: usize) -> Vec<u8> {
        let source = Arc::new(MemorySource {
            frames: vec![
                solid_rgba_frame(16, 16, 5, 250),
                solid_rgba_frame(16, 16, 15, 240),
                solid_rgba_frame(16, 16, 25, 230),
                solid_rgba_frame(16, 16, 35, 220),
                solid_rgba_frame(16, 16, 45, 210),
                solid_rgba_frame(16, 16, 55, 200),
                solid_rgba_frame(16, 16, 65, 190),
            ],
        });
        let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Etc1));
        let mut output = tempfile::tempfile().unwrap();

        run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
            from_frame: 0,
            to_frame: 6,
            increment_frame: 1,
            threads,
            channel_format: ChannelFormat::Planar,
            lz4: false,
            quality: Quality::Hi,
        }).unwrap();

        read_output(&mut output)
    }

    let single = encode_with(1);
    let multi = encode_with(8);
    assert_eq!(single, multi, "worker count must not affect the byte-exact container contents");
}

/// Records the first byte of every buffer it's asked to compress — unlike
/// `ToyEncoder`'s commutative checksum, this is sensitive to which frame
/// landed in which interleave channel, so it can actually distinguish
/// "reversed order" from "same bytes, different order".
struct FirstByteEncoder {
    first_bytes: std::sync::Mutex<Vec<u8>>,
}

impl BlockEncoder for FirstByteEncoder {
    fn texture_format(&self) -> TextureFormat { TextureFormat::Dxt1 }

    fn encode(&self, pixels: &[u8], width: u32, height: u32, _channels: u32, _quality: Quality) -> Result<Vec<u8>> {
        self.first_bytes.lock().unwrap().push(pixels[0]);
        Ok(vec![0u8; (width * height) as usize])
    }
}

/// An `ImageSource` that reports a true, non-padded resolution from
/// `stat` but actually resizes (by simple edge replication) to whatever
/// target `load` is asked for — unlike `MemorySource`, which requires
/// tests to pre-pad their frames themselves.
struct PaddingSource {
    width: u32,
    height: u32,
    has_alpha: bool,
}

impl ImageSource for PaddingSource {
    fn stat(&self, _frame: i64) -> Result<FrameStat> {
        Ok(FrameStat { width: self.width, height: self.height, has_alpha: self.has_alpha })
    }

    fn load(&self, _frame: i64, target_width: u32, target_height: u32) -> Result<RgbaFrame> {
        let mut pixels = vec![0u8; (target_width * target_height * 4) as usize];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[0] = 10;
            chunk[1] = 10;
            chunk[2] = 10;
            chunk[3] = 255;
        }
        Ok(RgbaFrame { width: target_width, height: target_height, has_alpha: self.has_alpha, pixels })
    }
}

#[test]
fn non_multiple_of_8_dimensions_are_padded_and_header_keeps_both_sizes() {
    let source = Arc::new(PaddingSource { width: 10, height: 10, has_alpha: false });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: 0,
        increment_frame: 1,
        threads: 1,
        channel_format: ChannelFormat::Planar,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    assert_eq!(read_i32(&bytes, 4 + 2 * 4), 10, "orig_width stays the true source resolution");
    assert_eq!(read_i32(&bytes, 4 + 3 * 4), 10, "orig_height stays the true source resolution");
    assert_eq!(read_i32(&bytes, 4 + 4 * 4), 16, "frame_width is padded up to a multiple of 8");
    assert_eq!(read_i32(&bytes, 4 + 5 * 4), 16, "frame_height is padded up to a multiple of 8");
}

#[test]
fn empty_range_writes_header_only_container() {
    let source = Arc::new(MemorySource { frames: vec![solid_rgb_frame(8, 8, 10)] });
    let encoder: Arc<dyn BlockEncoder> = Arc::new(ToyEncoder(TextureFormat::Dxt1));
    let mut output = tempfile::tempfile().unwrap();

    // `to < from` with a positive step never enters the loop, so this
    // source's single frame is never stat'd or loaded.
    run(source, encoder, output.try_clone().unwrap(), PipelineOptions {
        from_frame: 0,
        to_frame: -1,
        increment_frame: 1,
        threads: 2,
        channel_format: ChannelFormat::Planar,
        lz4: false,
        quality: Quality::Hi,
    }).unwrap();

    let bytes = read_output(&mut output);
    assert_eq!(bytes.len(), HEADER, "only the header is written");
    assert_eq!(read_i32(&bytes, 4 + 6 * 4), 0, "frames");
    assert_eq!(read_i32(&bytes, 4 + 8 * 4), 0, "compressed_buffer_size");
}

#[test]
fn reverse_range_processes_frames_in_reverse_order() {
    fn first_y_channel0_byte(from: i64, to: i64, inc: i64) -> u8 {
        let source = Arc::new(MemorySource {
            frames: vec![
                solid_rgb_frame(8, 8, 10),
                solid_rgb_frame(8, 8, 20),
                solid_rgb_frame(8, 8, 30),
            ],
        });
        let encoder = Arc::new(FirstByteEncoder { first_bytes: std::sync::Mutex::new(Vec::new()) });
        let mut output = tempfile::tempfile().unwrap();

        run(source, encoder.clone(), output.try_clone().unwrap(), PipelineOptions {
            from_frame: from,
            to_frame: to,
            increment_frame: inc,
            threads: 1,
            channel_format: ChannelFormat::Planar,
            lz4: false,
            quality: Quality::Hi,
        }).unwrap();

        encoder.first_bytes.lock().unwrap()[0] // first encode() call is the Y plane
    }

    // Frame 0 is darkest (value 10 -> low luma), frame 2 brightest (value
    // 30 -> high luma); whichever frame lands in interleave channel 0
    // determines the Y plane's first byte.
    let forward_first_channel = first_y_channel0_byte(0, 2, 1);
    let reverse_first_channel = first_y_channel0_byte(2, 0, -1);
    assert_ne!(forward_first_channel, reverse_first_channel, "forward puts frame 0 in channel 0, reverse puts frame 2 there");
}
