//! Background chunk generation on a fixed set of worker threads.
//!
//! Chunks are submitted over a bounded queue and resolved by
//! [`WorldGenerator::generate_chunk`]; finished chunks come back on a second
//! bounded channel. Generation is blocking and cannot be cancelled once queued.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender, bounded};
use tracing::{debug, trace};

use crate::generator::WorldGenerator;
use crate::sampler::ChunkSubstances;
use crate::units::ChunkPos;

/// A chunk resolved by a worker.
#[derive(Debug)]
pub struct GeneratedChunk {
    pub chunk: ChunkPos,
    pub substances: ChunkSubstances,
    /// Wall time spent in generation, in microseconds.
    pub generation_time_us: u64,
}

pub struct ChunkGenerationPool {
    task_sender: Sender<ChunkPos>,
    result_receiver: Receiver<GeneratedChunk>,
    in_flight: Arc<AtomicU64>,
    threads: usize,
}

impl ChunkGenerationPool {
    /// Spawn `thread_count` workers sharing `generator`.
    ///
    /// At most `max_queued` chunks wait for a worker; further submissions are
    /// rejected. Workers block once `result_capacity` results are undrained.
    pub fn new(
        generator: Arc<WorldGenerator>,
        thread_count: usize,
        max_queued: usize,
        result_capacity: usize,
    ) -> io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<ChunkPos>(max_queued.max(1));
        let (result_sender, result_receiver) = bounded::<GeneratedChunk>(result_capacity.max(1));
        let in_flight = Arc::new(AtomicU64::new(0));
        let threads = thread_count.max(1);

        for _ in 0..threads {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let generator = Arc::clone(&generator);

            std::thread::Builder::new()
                .name("chunk-gen-worker".into())
                .spawn(move || {
                    while let Ok(chunk) = receiver.recv() {
                        let start = Instant::now();
                        let substances = generator.generate_chunk(chunk);
                        let generation_time_us = start.elapsed().as_micros() as u64;
                        trace!(x = chunk.x, z = chunk.z, generation_time_us, "generated chunk");
                        if sender
                            .send(GeneratedChunk {
                                chunk,
                                substances,
                                generation_time_us,
                            })
                            .is_err()
                        {
                            break;
                        }
                    }
                })?;
        }

        debug!(threads, max_queued, result_capacity, "started chunk generation pool");

        Ok(Self {
            task_sender,
            result_receiver,
            in_flight,
            threads,
        })
    }

    /// Pool sized to the machine, leaving two cores for the caller.
    pub fn with_defaults(generator: Arc<WorldGenerator>) -> io::Result<Self> {
        let cpus = num_cpus::get().max(2);
        let threads = (cpus - 2).max(1);
        Self::new(generator, threads, 64, 128)
    }

    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Queue a chunk for generation.
    ///
    /// Returns `Err(chunk)` if the queue is full.
    pub fn submit(&self, chunk: ChunkPos) -> Result<(), ChunkPos> {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        self.task_sender.try_send(chunk).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            e.into_inner()
        })
    }

    /// Take every finished chunk without blocking.
    pub fn drain_results(&self) -> Vec<GeneratedChunk> {
        let results: Vec<_> = self.result_receiver.try_iter().collect();
        self.in_flight
            .fetch_sub(results.len() as u64, Ordering::Relaxed);
        results
    }

    /// Chunks submitted but not yet drained.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }
}
