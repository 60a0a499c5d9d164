//! Encodes a numbered still-image sequence into a Knib container: a GPU
//! texture-compressed video format for playback on hardware that can
//! sample DXT1/ETC1 blocks but can't afford to decode H.264/Bink.
//!
//! A module tree organized by concern, plus a [`prelude`] re-exporting
//! the handful of types most callers need.

#![warn(rust_2018_idioms, future_incompatible, unused_extern_crates, unused)]
#![deny(unused_must_use, dead_code)]

pub mod cli;
pub mod codec;
pub mod container;
pub mod error;
pub mod image;
pub mod io;
pub mod logging;
pub mod math;
pub mod pipeline;
pub mod setbuilder;
pub mod yuv;

/// Re-exports of the types most callers of this crate as a library need:
/// the pipeline entry point, its options, the two external-collaborator
/// traits, and the error type.
pub mod prelude {
    pub use crate::codec::{Dxt1Encoder, Etc1Encoder};
    pub use crate::error::{Error, Result};
    pub use crate::image::{FrameStat, ImageSource, PngSequenceSource, RgbaFrame};
    pub use crate::pipeline::{run, ChannelFormat, PipelineOptions};
    pub use crate::setbuilder::{BlockEncoder, Quality, TextureFormat};
}
