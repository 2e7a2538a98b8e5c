use std::{fs, path::Path, path::PathBuf};

use serde_derive::Deserialize;

use crate::{
    codec::CompressionConfig,
    error::ConfigError,
    gen::ChunkShape,
    layout::RegionLayout,
    paths::WorldPaths,
};

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub save_dir: PathBuf,
    pub seed_dir: PathBuf,
    /// Load from and save to the starting terrain instead of the world save.
    #[serde(default)]
    pub editor_mode: bool,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub layout: RegionLayout,
}

impl StoreConfig {
    pub fn new(save_dir: impl Into<PathBuf>, seed_dir: impl Into<PathBuf>) -> StoreConfig {
        StoreConfig {
            save_dir: save_dir.into(),
            seed_dir: seed_dir.into(),
            editor_mode: false,
            compression: CompressionConfig::default(),
            layout: RegionLayout::default(),
        }
    }

    pub fn paths(&self) -> WorldPaths {
        WorldPaths::new(&self.save_dir, &self.seed_dir)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProducerKind {
    Empty,
    Heightmap,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u32,
    pub kind: ProducerKind,
    pub iso_level: u8,
    pub base_height: f64,
    pub amplitude: f64,
    pub scale: f64,
    pub octaves: u32,
    pub falloff: f64,
    pub lacunarity: f64,
    pub threads: u32,
    pub shape: ChunkShape,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            seed: 0,
            kind: ProducerKind::Heightmap,
            iso_level: 128,
            base_height: 24.0,
            amplitude: 16.0,
            scale: 0.01,
            octaves: 4,
            falloff: 0.5,
            lacunarity: 2.0,
            threads: 4,
            shape: ChunkShape::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Config::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Config, ConfigError> {
        let config = toml::from_str::<Config>(data)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.store.layout.validate().map_err(ConfigError::Invalid)?;

        let shape_bytes = self.generator.shape.chunk_bytes();
        if shape_bytes != self.store.layout.chunk_bytes {
            return Err(ConfigError::Invalid(format!(
                "generator chunk shape produces {} bytes but the region layout stores {}",
                shape_bytes, self.store.layout.chunk_bytes
            )));
        }
        if self.generator.threads == 0 {
            return Err(ConfigError::Invalid(
                "generator needs at least one thread".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [store]
            save_dir = "saves/world"
            seed_dir = "assets"
            "#,
        )
        .unwrap();

        assert!(!config.store.editor_mode);
        assert_eq!(config.store.compression, CompressionConfig::default());
        assert_eq!(config.store.layout, RegionLayout::default());
        assert_eq!(config.generator.kind, ProducerKind::Heightmap);
        assert_eq!(
            config.store.paths().save_dir,
            PathBuf::from("saves/world")
        );
    }

    #[test]
    fn full_config_round_trips_values() {
        let config = Config::parse(
            r#"
            [store]
            save_dir = "saves/a"
            seed_dir = "bundle"
            editor_mode = true

            [store.compression]
            enabled = false

            [store.layout]
            region_size = 8
            slot_bytes = 1
            chunk_bytes = 16

            [generator]
            kind = "empty"
            seed = 42
            threads = 2

            [generator.shape]
            vertex_size = 2
            vertex_height = 2
            point_bytes = 2
            "#,
        )
        .unwrap();

        assert!(config.store.editor_mode);
        assert!(!config.store.compression.enabled);
        assert_eq!(config.store.layout, RegionLayout::new(8, 1, 16));
        assert_eq!(config.generator.kind, ProducerKind::Empty);
        assert_eq!(config.generator.seed, 42);
        assert_eq!(config.generator.threads, 2);
    }

    #[test]
    fn bundled_config_is_valid() {
        let config = Config::parse(include_str!("../region.toml")).unwrap();
        assert_eq!(config.generator.seed, 1337);
        assert!(config.store.compression.enabled);
    }

    #[test]
    fn mismatched_shape_is_rejected() {
        let result = Config::parse(
            r#"
            [store]
            save_dir = "s"
            seed_dir = "a"

            [store.layout]
            chunk_bytes = 8
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn broken_toml_is_a_parse_error() {
        let result = Config::parse("[store\nsave_dir = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
