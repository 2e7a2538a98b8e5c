use log::debug;
use noise::{NoiseFn, Seedable, SuperSimplex};
use serde_derive::Deserialize;

use crate::{
    config::{GeneratorConfig, ProducerKind},
    layout::{CHUNK_POINT_BYTE, CHUNK_SIZE, CHUNK_VERTEX_HEIGHT, CHUNK_VERTEX_SIZE},
    world::ChunkPos,
};

pub const BEDROCK: u8 = 7;
pub const STONE: u8 = 1;

/// Dimensions of the point grid stored in one chunk blob. Every point takes
/// `point_bytes` bytes: a density weight followed by a material id.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkShape {
    pub vertex_size: usize,
    pub vertex_height: usize,
    pub point_bytes: usize,
}

impl Default for ChunkShape {
    fn default() -> Self {
        ChunkShape {
            vertex_size: CHUNK_VERTEX_SIZE,
            vertex_height: CHUNK_VERTEX_HEIGHT,
            point_bytes: CHUNK_POINT_BYTE,
        }
    }
}

impl ChunkShape {
    pub fn vertex_area(&self) -> usize {
        self.vertex_size * self.vertex_size
    }

    pub fn chunk_bytes(&self) -> usize {
        self.vertex_area() * self.vertex_height * self.point_bytes
    }

    pub fn point_index(&self, x: usize, y: usize, z: usize) -> usize {
        (x + z * self.vertex_size + y * self.vertex_area()) * self.point_bytes
    }
}

/// Supplies the raw bytes of a chunk. `blend` carries the per-biome weights of
/// the column; producers that do not mix biomes may ignore it.
pub trait ChunkProducer: Send + Sync {
    fn shape(&self) -> ChunkShape;

    fn generate(&self, pos: ChunkPos, blend: &[f32]) -> Vec<u8>;
}

/// Flat chunk of bedrock points with zero density.
pub struct EmptyBiome {
    shape: ChunkShape,
}

impl EmptyBiome {
    pub fn new(shape: ChunkShape) -> EmptyBiome {
        EmptyBiome { shape }
    }
}

impl ChunkProducer for EmptyBiome {
    fn shape(&self) -> ChunkShape {
        self.shape
    }

    fn generate(&self, _pos: ChunkPos, _blend: &[f32]) -> Vec<u8> {
        let shape = self.shape;
        let mut chunk_data = vec![0u8; shape.chunk_bytes()];
        for y in 0..shape.vertex_height {
            for z in 0..shape.vertex_size {
                for x in 0..shape.vertex_size {
                    let index = shape.point_index(x, y, z);
                    chunk_data[index] = 0;
                    if shape.point_bytes > 1 {
                        chunk_data[index + 1] = BEDROCK;
                    }
                }
            }
        }
        chunk_data
    }
}

/// Height-field terrain sampled from fractal simplex noise.
pub struct HeightmapBiome {
    shape: ChunkShape,
    noise: SuperSimplex,
    iso_level: u8,
    base_height: f64,
    amplitude: f64,
    scale: f64,
    octaves: u32,
    falloff: f64,
    lacunarity: f64,
}

impl HeightmapBiome {
    pub fn new(config: &GeneratorConfig) -> HeightmapBiome {
        debug!("Using seed {} for heightmap generation", config.seed);

        HeightmapBiome {
            shape: config.shape,
            noise: SuperSimplex::new().set_seed(config.seed),
            iso_level: config.iso_level,
            base_height: config.base_height,
            amplitude: config.amplitude,
            scale: config.scale,
            octaves: config.octaves.max(1),
            falloff: config.falloff,
            lacunarity: config.lacunarity,
        }
    }

    /// Surface height of a world column, in points.
    pub fn height(&self, world_x: f64, world_z: f64, strength: f64) -> f64 {
        let relief = self.sample_noise_fractal(world_x, world_z) * self.amplitude * strength;
        let max_height = (self.shape.vertex_height - 1) as f64;
        (self.base_height + relief).clamp(0.0, max_height)
    }

    fn sample_noise_fractal(&self, x: f64, z: f64) -> f64 {
        let mut result = 0.0;
        let mut denom = 0.0;
        let mut scale = self.scale;

        let mut amplitude = 1.0;
        for _ in 0..self.octaves {
            result += amplitude * self.noise.get([x * scale, z * scale]);
            denom += amplitude;

            scale *= self.lacunarity;
            amplitude *= self.falloff;
        }

        result / denom
    }

    fn surface_weight(&self, height: f64) -> u8 {
        let iso = self.iso_level as f64;
        ((255.0 - iso) * height.fract() + iso) as u8
    }
}

impl ChunkProducer for HeightmapBiome {
    fn shape(&self) -> ChunkShape {
        self.shape
    }

    fn generate(&self, pos: ChunkPos, blend: &[f32]) -> Vec<u8> {
        let shape = self.shape;
        let strength = blend.first().copied().unwrap_or(1.0) as f64;
        let base_x = pos.x as f64 * CHUNK_SIZE as f64;
        let base_z = pos.z as f64 * CHUNK_SIZE as f64;

        let mut chunk_data = vec![0u8; shape.chunk_bytes()];
        for z in 0..shape.vertex_size {
            for x in 0..shape.vertex_size {
                let height = self.height(base_x + x as f64, base_z + z as f64, strength);
                let height_y = height.ceil() as usize;
                let last_vertex_weight = self.surface_weight(height);

                for y in 0..shape.vertex_height {
                    let weight = if y < height_y {
                        255
                    } else if y == height_y {
                        last_vertex_weight
                    } else {
                        0
                    };

                    let index = shape.point_index(x, y, z);
                    chunk_data[index] = weight;
                    if shape.point_bytes > 1 {
                        chunk_data[index + 1] = if y == 0 { BEDROCK } else { STONE };
                    }
                }
            }
        }
        chunk_data
    }
}

pub fn producer_from_config(config: &GeneratorConfig) -> Box<dyn ChunkProducer> {
    match config.kind {
        ProducerKind::Empty => Box::new(EmptyBiome::new(config.shape)),
        ProducerKind::Heightmap => Box::new(HeightmapBiome::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_shape() -> ChunkShape {
        ChunkShape {
            vertex_size: 3,
            vertex_height: 8,
            point_bytes: 2,
        }
    }

    #[test]
    fn point_index_is_x_then_z_then_y() {
        let shape = small_shape();
        assert_eq!(shape.chunk_bytes(), 3 * 3 * 8 * 2);
        assert_eq!(shape.point_index(0, 0, 0), 0);
        assert_eq!(shape.point_index(1, 0, 0), 2);
        assert_eq!(shape.point_index(0, 0, 1), 6);
        assert_eq!(shape.point_index(0, 1, 0), 18);
        assert_eq!(shape.point_index(2, 7, 2), shape.chunk_bytes() - 2);
    }

    #[test]
    fn default_shape_fills_a_default_chunk() {
        assert_eq!(ChunkShape::default().chunk_bytes(), crate::layout::CHUNK_BYTES);
    }

    #[test]
    fn empty_biome_is_all_bedrock() {
        let producer = EmptyBiome::new(small_shape());
        let data = producer.generate(ChunkPos::new(0, 0), &[]);

        assert_eq!(data.len(), small_shape().chunk_bytes());
        for point in data.chunks(2) {
            assert_eq!(point, &[0, BEDROCK]);
        }
    }

    #[test]
    fn heightmap_is_solid_below_the_surface() {
        let config = GeneratorConfig {
            shape: small_shape(),
            base_height: 4.0,
            amplitude: 0.0,
            ..GeneratorConfig::default()
        };
        let producer = HeightmapBiome::new(&config);
        let shape = producer.shape();
        let data = producer.generate(ChunkPos::new(2, -1), &[1.0]);

        assert_eq!(data.len(), shape.chunk_bytes());
        for y in 0..shape.vertex_height {
            let index = shape.point_index(1, y, 1);
            let expected = match y {
                0..=3 => 255,
                4 => config.iso_level,
                _ => 0,
            };
            assert_eq!(data[index], expected, "weight at y = {}", y);
        }
        assert_eq!(data[shape.point_index(0, 0, 0) + 1], BEDROCK);
        assert_eq!(data[shape.point_index(0, 1, 0) + 1], STONE);
    }

    #[test]
    fn heightmap_is_deterministic_per_seed() {
        let config = GeneratorConfig {
            shape: small_shape(),
            seed: 99,
            ..GeneratorConfig::default()
        };
        let a = HeightmapBiome::new(&config).generate(ChunkPos::new(5, 5), &[]);
        let b = HeightmapBiome::new(&config).generate(ChunkPos::new(5, 5), &[]);
        assert_eq!(a, b);
    }
}
