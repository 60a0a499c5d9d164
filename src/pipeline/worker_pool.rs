//! Parallel set compression: a fixed-size rayon thread pool plus an
//! `mpsc` channel carrying finished sets back to the caller.
//!
//! Grounded in `examples/original_source/knib_compress/src/ThreadPool.hpp`
//! (queue capacity exactly `threads`, blocking submission once full),
//! using the same `rayon::ThreadPool` + `mpsc::channel` shape.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::container::ContainerWriter;
use crate::error::{Error, Result};
use crate::pipeline::reorderer::Reorderer;
use crate::setbuilder::SetBuilder;

type Finished = (Box<dyn SetBuilder>, Result<()>);

pub struct WorkerPool {
    thread_pool: rayon::ThreadPool,
    sender: Sender<Finished>,
    receiver: Receiver<Finished>,
    capacity: usize,
    in_flight: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| Error::invalid(format!("can't start worker pool: {}", err)))?;

        let (sender, receiver) = mpsc::channel();

        Ok(WorkerPool { thread_pool, sender, receiver, capacity: threads, in_flight: 0 })
    }

    /// Spawns `builder.run()` on the pool. If `threads` sets are already in
    /// flight, blocks until one finishes and hands it to `reorderer` first
    /// — this is the back-pressure the original's fixed-capacity queue
    /// provided, reimplemented on top of a channel receive instead of a
    /// condvar wait.
    pub fn submit(
        &mut self,
        builder: Box<dyn SetBuilder>,
        reorderer: &mut Reorderer,
        writer: &mut ContainerWriter<std::fs::File>,
    ) -> Result<()> {
        if self.in_flight >= self.capacity {
            self.recv_one(reorderer, writer)?;
        }

        let sender = self.sender.clone();
        self.in_flight += 1;

        self.thread_pool.spawn(move || {
            let mut builder = builder;
            let outcome = builder.run();
            // The receiver only disconnects once the pool itself is being
            // torn down (after `drain_remaining`), so a dropped send here
            // would only happen during an abandoned shutdown; ignore it.
            let _ = sender.send((builder, outcome));
        });

        Ok(())
    }

    fn recv_one(&mut self, reorderer: &mut Reorderer, writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
        let (builder, outcome) = self.receiver.recv()
            .expect("a worker thread holds a sender clone until it finishes, so recv never starves while in_flight > 0");
        self.in_flight -= 1;
        outcome?;
        reorderer.accept(builder, writer)
    }

    /// Waits for every still-running set and hands each to `reorderer` as
    /// it completes.
    pub fn drain_remaining(&mut self, reorderer: &mut Reorderer, writer: &mut ContainerWriter<std::fs::File>) -> Result<()> {
        while self.in_flight > 0 {
            self.recv_one(reorderer, writer)?;
        }
        Ok(())
    }
}
