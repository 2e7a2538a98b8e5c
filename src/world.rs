use std::sync::{Arc, Mutex, PoisonError};

use dashmap::{mapref::entry::Entry, DashMap};
use log::debug;

use crate::{config::StoreConfig, error::RegionError, region::Region};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub fn new(x: i32, z: i32) -> RegionPos {
        RegionPos { x, z }
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> ChunkPos {
        ChunkPos { x, z }
    }

    /// World chunk coordinate of local chunk `(x, z)` inside `region`.
    /// Coordinates past the `i32` range wrap around.
    pub fn in_region(region: RegionPos, region_size: usize, x: usize, z: usize) -> ChunkPos {
        let size = region_size as i32;
        ChunkPos::new(
            region.x.wrapping_mul(size).wrapping_add(x as i32),
            region.z.wrapping_mul(size).wrapping_add(z as i32),
        )
    }
}

pub type MutexRegionRef = Arc<Mutex<Region>>;

/// Loaded regions keyed by coordinate. Each region sits behind its own mutex,
/// so different regions can be worked on from different threads.
pub struct RegionCache {
    config: StoreConfig,
    regions: DashMap<RegionPos, MutexRegionRef>,
}

impl RegionCache {
    pub fn new(config: StoreConfig) -> RegionCache {
        RegionCache {
            config,
            regions: DashMap::with_capacity(16),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn get_region(&self, pos: RegionPos) -> Option<MutexRegionRef> {
        self.regions.get(&pos).map(|region| region.clone())
    }

    /// Returns the cached region, loading it on first use.
    pub fn load_region(&self, pos: RegionPos) -> Result<MutexRegionRef, RegionError> {
        if let Some(region) = self.get_region(pos) {
            return Ok(region);
        }

        match self.regions.entry(pos) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let region = Arc::new(Mutex::new(Region::load(pos, &self.config)?));
                entry.insert(region.clone());
                Ok(region)
            }
        }
    }

    /// Flushes every modified region and returns how many were written.
    /// Stops at the first failing region.
    pub fn flush_all(&self) -> Result<usize, RegionError> {
        let mut written = 0;
        for entry in self.regions.iter() {
            let mut region = entry.value().lock().unwrap_or_else(PoisonError::into_inner);
            if region.flush()? {
                written += 1;
            }
        }
        debug!("Flushed {} of {} loaded regions", written, self.regions.len());
        Ok(written)
    }

    /// Flushes a region and drops it from the cache.
    pub fn unload_region(&self, pos: RegionPos) -> Result<bool, RegionError> {
        match self.regions.remove(&pos) {
            Some((_, region)) => {
                region
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .flush()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
