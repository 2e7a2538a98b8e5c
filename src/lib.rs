//! Region storage for voxel terrain.
//!
//! A region is a fixed grid of chunks kept in memory as one byte buffer,
//! a lookup table followed by an append-only data area, and written to disk
//! as a single zlib-compressed `.reg` file.

pub mod codec;
pub mod config;
pub mod error;
pub mod gen;
pub mod layout;
pub mod paths;
pub mod region;
pub mod sched;
pub mod world;

pub use config::{Config, StoreConfig};
pub use error::{ConfigError, RegionError};
pub use layout::RegionLayout;
pub use region::{Region, RegionSource};
pub use world::{ChunkPos, RegionCache, RegionPos};
