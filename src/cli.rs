//! Command-line argument surface, grounded in
//! `examples/original_source/knib_compress/src/args.c` (flag letters,
//! quality strings, and the required-argument validation in
//! `ARGP_KEY_END`) and reimplemented with `clap`'s derive API the way the
//! rest of the example pack does CLI parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::error::{Error, Result};
use crate::setbuilder::TextureFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum Quality {
    Hi,
    Med,
    Lo,
}

impl From<Quality> for crate::setbuilder::Quality {
    fn from(quality: Quality) -> Self {
        match quality {
            Quality::Hi => crate::setbuilder::Quality::Hi,
            Quality::Med => crate::setbuilder::Quality::Med,
            Quality::Lo => crate::setbuilder::Quality::Lo,
        }
    }
}

/// Worker thread count. The original hardcodes this to 8 with a
/// "TODO: assuming 8 threads is a good balance" comment rather than
/// exposing it as a flag; kept as a constant here for the same reason.
pub const DEFAULT_THREADS: usize = 8;

#[derive(Parser, Debug)]
#[command(
    name = "knib-compress",
    about = "Encodes a numbered PNG frame sequence into a Knib GPU-texture video container",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Input path template in `%d`-style format, e.g. `frames/img_%04d.png`.
    pub path_template: String,

    /// Output container file path.
    pub output_file: PathBuf,

    /// Use DXT1 texture compression.
    #[arg(short = 'D', long = "DXT1")]
    pub dxt1: bool,

    /// Use ETC1 texture compression.
    #[arg(short = 'E', long = "ETC1")]
    pub etc1: bool,

    /// Enable LZ4 container compression.
    #[arg(short = 'L', long = "LZ4")]
    pub lz4: bool,

    /// Pack frames per-texture instead of combining three into one plane.
    /// Not present in the retained original CLI, which only ever emitted
    /// planar sets; added here so the channel-format dispatch the design
    /// notes describe as authoritative is actually reachable.
    #[arg(short = 'P', long = "packed")]
    pub packed: bool,

    /// Texture compression quality.
    #[arg(short = 'q', long = "quality", value_enum, default_value_t = Quality::Hi)]
    pub quality: Quality,

    /// First frame index (inclusive).
    #[arg(short = 'f', long = "from-frame", allow_negative_numbers = true)]
    pub from_frame: i64,

    /// Last frame index (inclusive).
    #[arg(short = 't', long = "to-frame", allow_negative_numbers = true)]
    pub to_frame: i64,

    /// Step between frame indices.
    #[arg(short = 'i', long = "increment-frame", allow_negative_numbers = true, default_value_t = 1)]
    pub increment_frame: i64,
}

impl Cli {
    /// Validates the combination of flags the way `args.c`'s `ARGP_KEY_END`
    /// case does (nonzero step, at least one texture format), then resolves
    /// the parsed flags into a concrete [`TextureFormat`] and a corrected
    /// step, ready for [`crate::pipeline::PipelineOptions`].
    pub fn validate(&self) -> Result<TextureFormat> {
        if self.increment_frame == 0 {
            return Err(Error::bad_args("increment-frame must not be zero"));
        }

        match (self.dxt1, self.etc1) {
            (false, false) => Err(Error::bad_args("one of --DXT1 or --ETC1 is required")),
            (true, true) => Err(Error::bad_args("--DXT1 and --ETC1 are mutually exclusive")),
            (true, false) => Ok(TextureFormat::Dxt1),
            (false, true) => Ok(TextureFormat::Etc1),
        }
    }

    /// Corrects the step's sign when the range runs backwards, matching
    /// the design notes' resolution of the source's reverse-range
    /// transcription error: the condition driving iteration is
    /// `i >= to`, not the `i <= to` one stray variant used.
    pub fn corrected_increment(&self) -> i64 {
        if self.from_frame > self.to_frame && self.increment_frame > 0 {
            -self.increment_frame
        } else {
            self.increment_frame
        }
    }
}
