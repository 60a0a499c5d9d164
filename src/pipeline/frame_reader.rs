//! Producer thread that decodes frames ahead of the main thread's set
//! assembly loop, so PNG decode/resize overlaps with block compression.
//!
//! Grounded in
//! `examples/original_source/knib_compress/src/ImageReader.hpp`, whose
//! background thread fills a bounded queue of exactly 3 decoded frames
//! ahead of the consumer.

use std::sync::mpsc::{sync_channel, Receiver};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::error::Result;
use crate::image::{ImageSource, RgbaFrame};

/// Bounded queue capacity between the reader thread and the main thread,
/// matching the original's fixed 3-frame read-ahead buffer.
const READ_AHEAD: usize = 3;

pub struct FrameReader {
    receiver: Receiver<Result<(i64, RgbaFrame)>>,
    handle: Option<JoinHandle<()>>,
}

impl FrameReader {
    /// Spawns a thread that decodes `indices` in order (already resolved
    /// to account for a reversed `from > to` range) and resizes every
    /// frame to `(width, height)`.
    pub fn spawn(source: Arc<dyn ImageSource>, indices: Vec<i64>, width: u32, height: u32) -> Self {
        let (sender, receiver) = sync_channel(READ_AHEAD);

        let handle = std::thread::spawn(move || {
            for frame in indices {
                let loaded = source.load(frame, width, height).map(|image| (frame, image));
                if sender.send(loaded).is_err() {
                    // Consumer went away (a fatal error elsewhere); stop early.
                    break;
                }
            }
        });

        FrameReader { receiver, handle: Some(handle) }
    }

    /// Blocks for the next decoded frame, or `None` once every requested
    /// index has been produced.
    pub fn recv(&self) -> Option<Result<(i64, RgbaFrame)>> {
        self.receiver.recv().ok()
    }
}

impl Drop for FrameReader {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
