use serde_derive::Deserialize;

pub const REGION_SIZE: usize = 32;
pub const REGION_LOOKTABLE_POS_BYTE: usize = 2;
pub const REGION_LOOKTABLE_BYTES: usize =
    REGION_SIZE * REGION_SIZE * REGION_LOOKTABLE_POS_BYTE + REGION_LOOKTABLE_POS_BYTE;

pub const CHUNK_SIZE: usize = 16;
pub const CHUNK_VERTEX_SIZE: usize = CHUNK_SIZE + 1;
pub const CHUNK_VERTEX_HEIGHT: usize = 65;
pub const CHUNK_VERTEX_AREA: usize = CHUNK_VERTEX_SIZE * CHUNK_VERTEX_SIZE;
pub const CHUNK_POINT_BYTE: usize = 2;
pub const CHUNK_BYTES: usize = CHUNK_VERTEX_AREA * CHUNK_VERTEX_HEIGHT * CHUNK_POINT_BYTE;

/// Geometry of a region buffer: how many chunks per side, how wide each
/// lookup-table slot is and how long every chunk blob is.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct RegionLayout {
    pub region_size: usize,
    pub slot_bytes: usize,
    pub chunk_bytes: usize,
}

impl Default for RegionLayout {
    fn default() -> Self {
        RegionLayout {
            region_size: REGION_SIZE,
            slot_bytes: REGION_LOOKTABLE_POS_BYTE,
            chunk_bytes: CHUNK_BYTES,
        }
    }
}

impl RegionLayout {
    pub fn new(region_size: usize, slot_bytes: usize, chunk_bytes: usize) -> RegionLayout {
        RegionLayout {
            region_size,
            slot_bytes,
            chunk_bytes,
        }
    }

    /// Size of the lookup table, including the leading allocation counter.
    pub fn lookup_table_bytes(&self) -> usize {
        self.region_size * self.region_size * self.slot_bytes + self.slot_bytes
    }

    /// Byte offset of the lookup-table slot for local chunk `(x, z)`.
    /// The first slot is skipped, it holds the allocation counter.
    pub fn slot_offset(&self, x: usize, z: usize) -> usize {
        (x + z * self.region_size) * self.slot_bytes + self.slot_bytes
    }

    /// Byte offset of the chunk blob for a 1-based slot id.
    pub fn data_offset(&self, slot: u64) -> usize {
        self.lookup_table_bytes() + (slot as usize - 1) * self.chunk_bytes
    }

    /// Largest slot id the counter can mint.
    pub fn max_chunks(&self) -> u64 {
        if self.slot_bytes >= 8 {
            u64::MAX
        } else {
            (1u64 << (8 * self.slot_bytes)) - 1
        }
    }

    pub fn contains(&self, x: usize, z: usize) -> bool {
        x < self.region_size && z < self.region_size
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.region_size == 0 {
            return Err("region_size must be positive".to_string());
        }
        if self.slot_bytes == 0 || self.slot_bytes > 8 {
            return Err(format!(
                "slot_bytes must be between 1 and 8, got {}",
                self.slot_bytes
            ));
        }
        if self.chunk_bytes == 0 {
            return Err("chunk_bytes must be positive".to_string());
        }
        Ok(())
    }
}

/// Decodes a big-endian unsigned integer, most significant byte first.
pub fn read_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Increments a big-endian counter in place, carrying from the last byte
/// towards the first. Returns `false` and leaves the bytes untouched when the
/// counter is already at its maximum.
pub fn increment_be(bytes: &mut [u8]) -> bool {
    if bytes.iter().all(|&b| b == 0xff) {
        return false;
    }

    for byte in bytes.iter_mut().rev() {
        if *byte == 0xff {
            *byte = 0;
        } else {
            *byte += 1;
            break;
        }
    }
    true
}
