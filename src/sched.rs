use std::{
    sync::{Arc, PoisonError},
    thread::JoinHandle,
};

use dashmap::DashSet;
use flume::{Receiver, Sender};
use log::{debug, error, info};

use crate::{
    error::RegionError,
    gen::ChunkProducer,
    world::{ChunkPos, RegionCache, RegionPos},
};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
struct ChunkRequest {
    region: RegionPos,
    x: usize,
    z: usize,
}

/// Generates chunks on a pool of worker threads and stores them into their
/// regions through the shared cache.
pub struct GenerationScheduler {
    cache: Arc<RegionCache>,
    producer: Arc<dyn ChunkProducer>,
    pending: Arc<DashSet<ChunkRequest>>,
    request_tx: Option<Sender<ChunkRequest>>,
    request_rx: Receiver<ChunkRequest>,
    workers: Vec<JoinHandle<Result<usize, RegionError>>>,
}

impl GenerationScheduler {
    pub fn new(cache: Arc<RegionCache>, producer: Arc<dyn ChunkProducer>) -> GenerationScheduler {
        let (tx, rx) = flume::unbounded();
        GenerationScheduler {
            cache,
            producer,
            pending: Arc::new(DashSet::new()),
            request_tx: Some(tx),
            request_rx: rx,
            workers: Vec::new(),
        }
    }

    pub fn start(&mut self, num_threads: u32) {
        for _ in 0..num_threads {
            let cache = self.cache.clone();
            let producer = self.producer.clone();
            let pending = self.pending.clone();
            let rx = self.request_rx.clone();

            self.workers.push(std::thread::spawn(move || {
                let mut stored = 0;
                let mut first_err = None;
                while let Ok(request) = rx.recv() {
                    let result = store_chunk(&cache, producer.as_ref(), request);
                    pending.remove(&request);
                    match result {
                        Ok(()) => stored += 1,
                        Err(e) => {
                            error!("Failed to store chunk {:?}: {}", request, e);
                            first_err.get_or_insert(e);
                        }
                    }
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(stored),
                }
            }));
        }
    }

    /// Queues every chunk of a region.
    pub fn request_region(&self, region: RegionPos) -> Result<(), RegionError> {
        let size = self.cache.config().layout.region_size;
        for z in 0..size {
            for x in 0..size {
                self.request_chunk(region, x, z)?;
            }
        }
        Ok(())
    }

    /// Queues one chunk unless it is already queued or already stored.
    pub fn request_chunk(&self, region: RegionPos, x: usize, z: usize) -> Result<(), RegionError> {
        let request = ChunkRequest { region, x, z };
        if self.pending.contains(&request) || self.has_chunk(request)? {
            return Ok(());
        }

        if let Some(tx) = &self.request_tx {
            self.pending.insert(request);
            if tx.send(request).is_err() {
                self.pending.remove(&request);
            }
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Closes the queue, waits for the workers to drain it and returns the
    /// number of chunks stored, or the first store error.
    pub fn finish(mut self) -> Result<usize, RegionError> {
        self.request_tx.take();

        let mut stored = 0;
        let mut first_err = None;
        for worker in self.workers.drain(..) {
            match worker.join() {
                Ok(Ok(count)) => stored += count,
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(_) => error!("Generation worker panicked"),
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                debug!("Generation finished, {} chunks stored", stored);
                Ok(stored)
            }
        }
    }

    fn has_chunk(&self, request: ChunkRequest) -> Result<bool, RegionError> {
        let region = self.cache.load_region(request.region)?;
        let region = region.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(region.chunk_index(request.x, request.z)? != 0)
    }
}

/// Generates every missing chunk of `region` and flushes the cache. Chunks
/// stored before a failure are flushed too. Returns the number of chunks
/// stored and region files written.
pub fn generate_region(
    cache: Arc<RegionCache>,
    producer: Arc<dyn ChunkProducer>,
    region: RegionPos,
    num_threads: u32,
) -> Result<(usize, usize), RegionError> {
    let mut sched = GenerationScheduler::new(cache.clone(), producer);
    sched.start(num_threads);
    let requested = sched.request_region(region);
    info!("Queued {} chunks of region {:?}", sched.pending(), region);

    let finished = sched.finish();
    if let Err(e) = &finished {
        error!("Generation of region {:?} failed: {}", region, e);
    }
    let written = cache.flush_all()?;
    requested?;
    Ok((finished?, written))
}

fn store_chunk(
    cache: &RegionCache,
    producer: &dyn ChunkProducer,
    request: ChunkRequest,
) -> Result<(), RegionError> {
    let size = cache.config().layout.region_size;
    let pos = ChunkPos::in_region(request.region, size, request.x, request.z);
    let chunk_data = producer.generate(pos, &[]);

    let region = cache.load_region(request.region)?;
    let mut region = region.lock().unwrap_or_else(PoisonError::into_inner);
    region.save_chunk_data(&chunk_data, request.x, request.z)
}
