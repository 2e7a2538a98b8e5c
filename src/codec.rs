use std::io::{self, Read, Write};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde_derive::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        CompressionConfig {
            enabled: true,
            level: 6,
        }
    }
}

/// Whole-blob transform applied to a region buffer on its way to and from disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Zlib(u32),
    Raw,
}

impl Codec {
    pub fn from_config(config: &CompressionConfig) -> Codec {
        if config.enabled {
            Codec::Zlib(config.level.min(9))
        } else {
            Codec::Raw
        }
    }

    pub fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Codec::Zlib(level) => {
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(*level));
                encoder.write_all(data)?;
                encoder.finish()
            }
            Codec::Raw => Ok(data.to_vec()),
        }
    }

    pub fn decompress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        match self {
            Codec::Zlib(_) => {
                let mut out_vec = Vec::new();
                ZlibDecoder::new(data).read_to_end(&mut out_vec)?;
                Ok(out_vec)
            }
            Codec::Raw => Ok(data.to_vec()),
        }
    }
}
