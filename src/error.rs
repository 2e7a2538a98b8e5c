use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegionError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decompress region file {path:?}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("region file {path:?} is truncated: {len} bytes, lookup table needs {expected}")]
    Truncated {
        path: PathBuf,
        len: usize,
        expected: usize,
    },

    #[error("region file {path:?} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("invalid region layout: {0}")]
    Layout(String),

    #[error("region is full, all {max} chunk slots are allocated")]
    RegionFull { max: u64 },

    #[error("chunk data must be {expected} bytes, got {actual}")]
    ChunkSize { expected: usize, actual: usize },

    #[error("slot {slot} is out of range, region has {allocated} allocated chunks")]
    SlotOutOfRange { slot: u64, allocated: u64 },

    #[error("chunk ({x}, {z}) is outside a region of size {size}")]
    CoordOutOfRange { x: usize, z: usize, size: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
