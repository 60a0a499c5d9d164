//! Restores strict ascending set-index order before writing, since sets
//! finish compression out of order across worker threads.
//!
//! Grounded in
//! `examples/original_source/knib_compress/src/SetAssembler.hpp`, which
//! holds finished sets in a sorted container keyed by index and only
//! releases a run starting at the next expected index.

use std::collections::BTreeMap;

use crate::container::ContainerWriter;
use crate::error::Result;
use crate::setbuilder::SetBuilder;

pub struct Reorderer {
    pending: BTreeMap<u64, Box<dyn SetBuilder>>,
    next_index: u64,
    capacity: usize,
}

impl Reorderer {
    /// `capacity` is `threads * 2` in the original (twice the worker
    /// pool's concurrency), kept here only as a sanity bound — actual
    /// buffering stays near `threads` in practice since `WorkerPool`
    /// applies its own back-pressure before this ever fills.
    pub fn new(capacity: usize) -> Self {
        Reorderer { pending: BTreeMap::new(), next_index: 0, capacity }
    }

    /// Buffers `builder` by its index, then emits every run of sets
    /// starting at the next expected index, in order.
    pub fn accept(&mut self, builder: Box<dyn SetBuilder>, writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
        let index = builder.index();
        self.pending.insert(index, builder);
        debug_assert!(
            self.pending.len() <= self.capacity,
            "reorder buffer grew past its expected bound ({})", self.capacity,
        );

        while let Some(builder) = self.pending.remove(&self.next_index) {
            builder.emit(writer)?;
            self.next_index += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Mutex;

    struct RecordingBuilder {
        index: u64,
        log: std::sync::Arc<Mutex<Vec<u64>>>,
    }

    impl SetBuilder for RecordingBuilder {
        fn index(&self) -> u64 { self.index }
        fn run(&mut self) -> Result<()> { Ok(()) }
        fn emit(&self, _writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
            self.log.lock().unwrap().push(self.index);
            Ok(())
        }
    }

    fn scratch_writer() -> ContainerWriter<std::fs::File> {
        let file = tempfile::tempfile().unwrap();
        ContainerWriter::new(file, false).unwrap()
    }

    #[test]
    fn holds_out_of_order_sets_until_their_turn() {
        let log = std::sync::Arc::new(Mutex::new(Vec::new()));
        let mut reorderer = Reorderer::new(8);
        let mut writer = scratch_writer();

        reorderer.accept(Box::new(RecordingBuilder { index: 2, log: log.clone() }), &mut writer).unwrap();
        assert!(log.lock().unwrap().is_empty(), "index 2 arrived before 0 and 1");

        reorderer.accept(Box::new(RecordingBuilder { index: 0, log: log.clone() }), &mut writer).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![0]);

        reorderer.accept(Box::new(RecordingBuilder { index: 1, log: log.clone() }), &mut writer).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }
}
