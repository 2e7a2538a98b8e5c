use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};

use crate::{
    codec::Codec,
    config::StoreConfig,
    error::RegionError,
    layout::{increment_be, read_be, RegionLayout},
    world::RegionPos,
};

/// Which file a region's bytes were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionSource {
    Save,
    Seed,
    Fresh,
}

/// A region of chunks held as one contiguous buffer:
/// `[lookup table][chunk data area]`.
///
/// The lookup table starts with the allocation counter, followed by one
/// big-endian slot per chunk coordinate in `x + z * size` order. A slot of `0`
/// marks an unallocated chunk, `N` points at the `N`th blob of the data area.
#[derive(Debug)]
pub struct Region {
    pos: RegionPos,
    layout: RegionLayout,
    codec: Codec,
    target: PathBuf,
    source: RegionSource,
    data: Vec<u8>,
    modified: bool,
}

impl Region {
    /// Loads the region at `pos` from the world save, falling back to the
    /// starting terrain and finally to an empty region.
    ///
    /// In editor mode the starting terrain wins even when a save exists.
    pub fn load(pos: RegionPos, config: &StoreConfig) -> Result<Region, RegionError> {
        config.layout.validate().map_err(RegionError::Layout)?;

        let paths = config.paths();
        let save_file = paths.save_file(pos);
        let seed_file = paths.seed_file(pos);
        let codec = Codec::from_config(&config.compression);
        let layout = config.layout;

        let (source, data) = if save_file.exists() && !config.editor_mode {
            (RegionSource::Save, read_region_file(&save_file, codec, layout)?)
        } else if seed_file.exists() {
            (RegionSource::Seed, read_region_file(&seed_file, codec, layout)?)
        } else {
            (RegionSource::Fresh, vec![0; layout.lookup_table_bytes()])
        };

        let target = if config.editor_mode {
            seed_file
        } else {
            save_file
        };

        let region = Region {
            pos,
            layout,
            codec,
            target,
            source,
            data,
            modified: false,
        };
        debug!(
            "Loaded region {:?} from {:?} with {} chunks",
            pos,
            source,
            region.allocated_chunks()
        );
        Ok(region)
    }

    /// Returns the blob stored under a 1-based slot id.
    pub fn chunk_data(&self, slot: u64) -> Result<&[u8], RegionError> {
        let allocated = self.allocated_chunks();
        if slot == 0 || slot > allocated {
            return Err(RegionError::SlotOutOfRange { slot, allocated });
        }

        let start = self.layout.data_offset(slot);
        Ok(&self.data[start..start + self.layout.chunk_bytes])
    }

    /// Reads the lookup-table slot of local chunk `(x, z)`. `0` means the
    /// chunk was never written.
    pub fn chunk_index(&self, x: usize, z: usize) -> Result<u64, RegionError> {
        self.check_coords(x, z)?;
        let start = self.layout.slot_offset(x, z);
        Ok(read_be(&self.data[start..start + self.layout.slot_bytes]))
    }

    /// Lookup and read in one step; `None` for chunks never written.
    pub fn chunk(&self, x: usize, z: usize) -> Result<Option<&[u8]>, RegionError> {
        match self.chunk_index(x, z)? {
            0 => Ok(None),
            slot => self.chunk_data(slot).map(Some),
        }
    }

    /// Stores a chunk blob at local coordinate `(x, z)`, allocating the next
    /// slot the first time the coordinate is written.
    pub fn save_chunk_data(
        &mut self,
        chunk_data: &[u8],
        x: usize,
        z: usize,
    ) -> Result<(), RegionError> {
        if chunk_data.len() != self.layout.chunk_bytes {
            return Err(RegionError::ChunkSize {
                expected: self.layout.chunk_bytes,
                actual: chunk_data.len(),
            });
        }

        match self.chunk_index(x, z)? {
            0 => {
                let slot_bytes = self.layout.slot_bytes;
                if !increment_be(&mut self.data[..slot_bytes]) {
                    return Err(RegionError::RegionFull {
                        max: self.layout.max_chunks(),
                    });
                }

                let slot_pos = self.layout.slot_offset(x, z);
                self.data.copy_within(..slot_bytes, slot_pos);
                self.data.extend_from_slice(chunk_data);
                trace!(
                    "Allocated slot {} for chunk ({}, {}) in region {:?}",
                    self.allocated_chunks(),
                    x,
                    z,
                    self.pos
                );
            }
            slot => {
                let allocated = self.allocated_chunks();
                if slot > allocated {
                    return Err(RegionError::SlotOutOfRange { slot, allocated });
                }
                let start = self.layout.data_offset(slot);
                self.data[start..start + chunk_data.len()].copy_from_slice(chunk_data);
            }
        }

        self.modified = true;
        debug_assert_eq!(self.data.len(), self.expected_len());
        Ok(())
    }

    /// Writes the whole region to disk if anything changed since it was
    /// loaded or last flushed. Returns whether a write happened.
    pub fn flush(&mut self) -> Result<bool, RegionError> {
        if !self.modified {
            return Ok(false);
        }

        let compressed = self.codec.compress(&self.data).map_err(|source| RegionError::Io {
            path: self.target.clone(),
            source,
        })?;
        write_atomic(&self.target, &compressed)?;
        self.modified = false;

        info!(
            "Saved region {:?} to {:?} ({} chunks, {} bytes on disk)",
            self.pos,
            self.target,
            self.allocated_chunks(),
            compressed.len()
        );
        Ok(true)
    }

    /// Current value of the allocation counter, which is also the number of
    /// chunks in the data area.
    pub fn allocated_chunks(&self) -> u64 {
        read_be(&self.data[..self.layout.slot_bytes])
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn pos(&self) -> RegionPos {
        self.pos
    }

    pub fn source(&self) -> RegionSource {
        self.source
    }

    pub fn layout(&self) -> RegionLayout {
        self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    fn check_coords(&self, x: usize, z: usize) -> Result<(), RegionError> {
        if self.layout.contains(x, z) {
            Ok(())
        } else {
            Err(RegionError::CoordOutOfRange {
                x,
                z,
                size: self.layout.region_size,
            })
        }
    }

    fn expected_len(&self) -> usize {
        self.layout.lookup_table_bytes() + self.allocated_chunks() as usize * self.layout.chunk_bytes
    }
}

fn read_region_file(
    path: &Path,
    codec: Codec,
    layout: RegionLayout,
) -> Result<Vec<u8>, RegionError> {
    let raw = fs::read(path).map_err(|source| RegionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let data = codec
        .decompress(&raw)
        .map_err(|source| RegionError::Decompress {
            path: path.to_path_buf(),
            source,
        })?;
    trace!("Read {} bytes from {:?}, {} decompressed", raw.len(), path, data.len());

    check_region_bytes(path, &data, layout)?;
    Ok(data)
}

fn check_region_bytes(path: &Path, data: &[u8], layout: RegionLayout) -> Result<(), RegionError> {
    let table_bytes = layout.lookup_table_bytes();
    if data.len() < table_bytes {
        return Err(RegionError::Truncated {
            path: path.to_path_buf(),
            len: data.len(),
            expected: table_bytes,
        });
    }

    let body = data.len() - table_bytes;
    if body % layout.chunk_bytes != 0 {
        return Err(RegionError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "data area of {} bytes is not a multiple of the {} byte chunk size",
                body, layout.chunk_bytes
            ),
        });
    }

    let counter = read_be(&data[..layout.slot_bytes]);
    let stored = (body / layout.chunk_bytes) as u64;
    if counter != stored {
        return Err(RegionError::Corrupt {
            path: path.to_path_buf(),
            reason: format!(
                "allocation counter is {} but the data area holds {} chunks",
                counter, stored
            ),
        });
    }

    let slots = layout.region_size * layout.region_size;
    for i in 1..=slots {
        let start = i * layout.slot_bytes;
        let slot = read_be(&data[start..start + layout.slot_bytes]);
        if slot > counter {
            return Err(RegionError::Corrupt {
                path: path.to_path_buf(),
                reason: format!(
                    "lookup slot {} points at chunk {} but only {} are allocated",
                    i, slot, counter
                ),
            });
        }
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RegionError> {
    let io_err = |source: std::io::Error| RegionError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes).map_err(io_err)?;
    fs::rename(&temp_path, path).map_err(io_err)?;
    Ok(())
}
