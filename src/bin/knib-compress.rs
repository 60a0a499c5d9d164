//! `knib-compress` — the CLI surface wiring [`knib::cli::Cli`] to
//! [`knib::pipeline::run`].
//!
//! Grounded in `examples/original_source/knib_compress/src/main.cpp`:
//! stat the first frame, pad its dimensions, set up the container header,
//! then hand off to the pipeline.

use std::fs::File;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use knib::cli::{Cli, DEFAULT_THREADS};
use knib::codec::{Dxt1Encoder, Etc1Encoder};
use knib::image::PngSequenceSource;
use knib::pipeline::{self, ChannelFormat, PipelineOptions};
use knib::setbuilder::{BlockEncoder, TextureFormat};

fn main() -> ExitCode {
    knib::logging::install();

    let cli = Cli::parse();

    let texture_format = match cli.validate() {
        Ok(format) => format,
        Err(error) => {
            tracing::error!(%error, "bad arguments");
            return ExitCode::FAILURE;
        }
    };

    let encoder: Arc<dyn BlockEncoder> = match texture_format {
        TextureFormat::Dxt1 => Arc::new(Dxt1Encoder),
        TextureFormat::Etc1 => Arc::new(Etc1Encoder),
        TextureFormat::Grey => {
            tracing::error!("GREY is reserved and never selectable from the CLI");
            return ExitCode::FAILURE;
        }
    };

    let source = Arc::new(PngSequenceSource::new(cli.path_template.clone()));

    let output = match File::create(&cli.output_file) {
        Ok(file) => file,
        Err(error) => {
            tracing::error!(%error, path = %cli.output_file.display(), "can't create output file");
            return ExitCode::FAILURE;
        }
    };

    let options = PipelineOptions {
        from_frame: cli.from_frame,
        to_frame: cli.to_frame,
        increment_frame: cli.corrected_increment(),
        threads: DEFAULT_THREADS,
        channel_format: if cli.packed { ChannelFormat::Packed } else { ChannelFormat::Planar },
        lz4: cli.lz4,
        quality: cli.quality.into(),
    };

    match pipeline::run(source, encoder, output, options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "encode failed");
            ExitCode::FAILURE
        }
    }
}
