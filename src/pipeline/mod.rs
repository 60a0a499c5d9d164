//! Top-level orchestration: wires the frame reader, set assembly, worker
//! pool, and reorderer into the full encode pipeline.
//!
//! Grounded in `examples/original_source/knib_compress/src/main.cpp`, which
//! drives exactly this sequence (stat first frame, pad dimensions, open the
//! container, read/group/compress/reorder/write, rewrite the header).

pub mod frame_reader;
pub mod reorderer;
pub mod worker_pool;

use std::fs::File;
use std::sync::Arc;

use crate::container::{flags, ContainerWriter};
use crate::error::{Error, Result};
use crate::image::{ImageSource, RgbaFrame};
use crate::math::round_up_to_multiple_of_8;
use crate::setbuilder::packed::PackedSetBuilder;
use crate::setbuilder::planar::PlanarSetBuilder;
use crate::setbuilder::{BlockEncoder, Quality, SetBuilder};

use frame_reader::FrameReader;
use reorderer::Reorderer;
use worker_pool::WorkerPool;

/// How consecutive frames are packed into container sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelFormat {
    /// Three frames' worth of each plane combined into one texture per
    /// plane (the only variant the retained original CLI ever produced).
    Planar,
    /// Each frame keeps its own RGB texture; alpha is packed across up to
    /// three frames into a shared texture. See `DESIGN.md` for how the CLI
    /// selects this.
    Packed,
}

/// Frames are grouped into sets of up to this many.
const FRAMES_PER_SET: usize = 3;

pub struct PipelineOptions {
    pub from_frame: i64,
    pub to_frame: i64,
    /// Step between frame indices; negative for a reverse range. Callers
    /// are expected to have already applied the sign correction
    /// `crate::cli::Cli::corrected_increment` performs.
    pub increment_frame: i64,
    pub threads: usize,
    pub channel_format: ChannelFormat,
    pub lz4: bool,
    pub quality: Quality,
}

/// Expands `(from, to, inc)` into the concrete sequence of frame indices
/// to encode. Grounded in `ImageReader::Stat`'s loop condition, with the
/// design notes' corrected reverse-range bound applied:
/// `((inc >= 0) && (i <= to)) || ((inc < 0) && (i >= to))`.
fn frame_indices(from: i64, to: i64, inc: i64) -> Vec<i64> {
    let mut indices = Vec::new();
    let mut i = from;
    loop {
        let within_ascending = inc >= 0 && i <= to;
        let within_descending = inc < 0 && i >= to;
        if !(within_ascending || within_descending) {
            break;
        }
        indices.push(i);
        i += inc;
    }
    indices
}

/// Runs the full encode: reads `options.from_frame ..= options.to_frame`
/// (or the reverse) from `source`, compresses every set of up to
/// [`FRAMES_PER_SET`] frames with `encoder`, and writes the container to
/// `output`.
pub fn run(
    source: Arc<dyn ImageSource>,
    encoder: Arc<dyn BlockEncoder>,
    output: File,
    options: PipelineOptions,
) -> Result<()> {
    let indices = frame_indices(options.from_frame, options.to_frame, options.increment_frame);

    if indices.is_empty() {
        // No frames in range: still produce a well-formed container, just
        // a bare header with `frames = 0` and every tally at its default
        // zero, per the zero-frame boundary behavior.
        tracing::info!("empty frame range, writing header-only container");
        let mut writer = ContainerWriter::new(output, options.lz4)?;
        writer.set_flags(encoder.texture_format().flag());
        writer.set_flags(match options.channel_format {
            ChannelFormat::Planar => flags::KNIB_CHANNELS_PLANAR,
            ChannelFormat::Packed => flags::KNIB_CHANNELS_PACKED,
        });
        writer.set_frames(0)?;
        writer.close()?;
        return Ok(());
    }

    let first_index = indices[0];
    let stat = source.stat(first_index)?;
    let width = round_up_to_multiple_of_8(stat.width);
    let height = round_up_to_multiple_of_8(stat.height);

    tracing::info!(frame_count = indices.len(), orig_width = stat.width, orig_height = stat.height, width, height, "starting encode");

    // Alpha presence is decided once, here, from the first frame's stat'd
    // format — not re-derived per frame from pixel content — so every set
    // in the file agrees with each other and with the header's single
    // `KNIB_ALPHA` bit.
    let has_alpha = stat.has_alpha;

    let mut writer = ContainerWriter::new(output, options.lz4)?;
    writer.set_size(stat.width, stat.height, width, height)?;
    writer.set_flags(encoder.texture_format().flag());
    writer.set_flags(match options.channel_format {
        ChannelFormat::Planar => flags::KNIB_CHANNELS_PLANAR,
        ChannelFormat::Packed => flags::KNIB_CHANNELS_PACKED,
    });
    if has_alpha {
        writer.set_flags(flags::KNIB_ALPHA);
    }

    let threads = options.threads.max(1);
    let reader = FrameReader::spawn(source, indices.clone(), width, height);
    let mut pool = WorkerPool::new(threads)?;
    let mut reorderer = Reorderer::new(threads * 2);

    let mut current_group: Vec<RgbaFrame> = Vec::with_capacity(FRAMES_PER_SET);
    let mut next_set_index = 0u64;

    for _ in 0 .. indices.len() {
        let (_frame_index, frame) = reader.recv()
            .ok_or_else(|| Error::invalid("frame reader thread ended before every frame was produced"))??;
        current_group.push(frame);

        if current_group.len() == FRAMES_PER_SET {
            let frames = std::mem::take(&mut current_group);
            let builder = make_builder(next_set_index, frames, options.channel_format, &encoder, options.quality, has_alpha);
            pool.submit(builder, &mut reorderer, &mut writer)?;
            next_set_index += 1;
        }
    }

    if !current_group.is_empty() {
        let builder = make_builder(next_set_index, current_group, options.channel_format, &encoder, options.quality, has_alpha);
        pool.submit(builder, &mut reorderer, &mut writer)?;
        next_set_index += 1;
    }

    pool.drain_remaining(&mut reorderer, &mut writer)?;

    writer.set_frames(indices.len())?;
    writer.close()?;

    tracing::info!(sets = next_set_index, "encode finished");
    Ok(())
}

fn make_builder(
    index: u64,
    frames: Vec<RgbaFrame>,
    channel_format: ChannelFormat,
    encoder: &Arc<dyn BlockEncoder>,
    quality: Quality,
    has_alpha: bool,
) -> Box<dyn SetBuilder> {
    match channel_format {
        ChannelFormat::Planar => Box::new(PlanarSetBuilder::new(index, frames, encoder.clone(), quality, has_alpha)),
        ChannelFormat::Packed => Box::new(PackedSetBuilder::new(index, frames, encoder.clone(), quality, has_alpha)),
    }
}
