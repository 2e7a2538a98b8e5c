use std::path::PathBuf;

use crate::world::RegionPos;

const STARTING_TERRAIN_DIR: &str = "StartingTerrain";
const REGION_EXTENSION: &str = "reg";

/// Where region files live: the active world's save directory and the
/// bundled directory holding read-only starting terrain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldPaths {
    pub save_dir: PathBuf,
    pub seed_dir: PathBuf,
}

impl WorldPaths {
    pub fn new(save_dir: impl Into<PathBuf>, seed_dir: impl Into<PathBuf>) -> WorldPaths {
        WorldPaths {
            save_dir: save_dir.into(),
            seed_dir: seed_dir.into(),
        }
    }

    pub fn save_file(&self, pos: RegionPos) -> PathBuf {
        self.save_dir.join(region_file_name(pos))
    }

    pub fn seed_file(&self, pos: RegionPos) -> PathBuf {
        self.starting_terrain_dir().join(region_file_name(pos))
    }

    pub fn starting_terrain_dir(&self) -> PathBuf {
        self.seed_dir.join(STARTING_TERRAIN_DIR)
    }
}

fn region_file_name(pos: RegionPos) -> String {
    format!("{}.{}.{}", pos.x, pos.z, REGION_EXTENSION)
}
