use std::collections::{HashMap, HashSet};

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand::rngs::StdRng;
use region_store::{
    codec::CompressionConfig, Region, RegionCache, RegionLayout, RegionPos, RegionSource,
    StoreConfig,
};
use tempfile::TempDir;

const CHUNK_BYTES: usize = 32;

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig {
        layout: RegionLayout::new(16, 2, CHUNK_BYTES),
        ..StoreConfig::new(dir.path().join("world"), dir.path().join("bundle"))
    }
}

fn all_coords(size: usize) -> Vec<(usize, usize)> {
    (0..size)
        .flat_map(|z| (0..size).map(move |x| (x, z)))
        .collect()
}

#[test]
fn allocation_is_a_permutation_of_one_to_n() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    let mut coords = all_coords(16);
    coords.shuffle(&mut rng);
    let written = &coords[..100];

    let mut region = Region::load(RegionPos::new(0, 0), &config(&dir)).unwrap();
    for (i, &(x, z)) in written.iter().enumerate() {
        region.save_chunk_data(&[i as u8; CHUNK_BYTES], x, z).unwrap();
        assert_eq!(region.chunk_index(x, z).unwrap(), i as u64 + 1);
    }

    let slots = written
        .iter()
        .map(|&(x, z)| region.chunk_index(x, z).unwrap())
        .collect::<HashSet<u64>>();
    assert_eq!(slots, (1..=100).collect::<HashSet<u64>>());

    let layout = region.layout();
    assert_eq!(
        region.as_bytes().len(),
        layout.lookup_table_bytes() + 100 * CHUNK_BYTES
    );

    let written_set = written.iter().copied().collect::<HashSet<_>>();
    for (x, z) in all_coords(16) {
        if !written_set.contains(&(x, z)) {
            assert_eq!(region.chunk_index(x, z).unwrap(), 0);
        }
    }
}

#[test]
fn random_writes_survive_flush_and_reload() {
    for compressed in [true, false] {
        let dir = TempDir::new().unwrap();
        let config = StoreConfig {
            compression: CompressionConfig {
                enabled: compressed,
                level: 6,
            },
            ..config(&dir)
        };
        let pos = RegionPos::new(4, -9);
        let mut rng = StdRng::seed_from_u64(1234);
        let mut expected = HashMap::new();

        let mut region = Region::load(pos, &config).unwrap();
        for _ in 0..300 {
            let x = rng.gen_range(0..16);
            let z = rng.gen_range(0..16);
            let mut payload = vec![0u8; CHUNK_BYTES];
            rng.fill(&mut payload[..]);
            region.save_chunk_data(&payload, x, z).unwrap();
            expected.insert((x, z), payload);
        }
        assert_eq!(region.allocated_chunks(), expected.len() as u64);
        assert!(region.flush().unwrap());

        let loaded = Region::load(pos, &config).unwrap();
        assert_eq!(loaded.source(), RegionSource::Save);
        assert!(!loaded.is_modified());
        for ((x, z), payload) in &expected {
            assert_eq!(loaded.chunk(*x, *z).unwrap(), Some(&payload[..]));
        }
    }
}

#[test]
fn cache_round_trip_across_instances() {
    let dir = TempDir::new().unwrap();
    let positions = [RegionPos::new(0, 0), RegionPos::new(-1, 0), RegionPos::new(2, 3)];

    let cache = RegionCache::new(config(&dir));
    for (i, &pos) in positions.iter().enumerate() {
        let region = cache.load_region(pos).unwrap();
        let mut region = region.lock().unwrap();
        region.save_chunk_data(&[i as u8 + 1; CHUNK_BYTES], i, i).unwrap();
    }
    assert_eq!(cache.flush_all().unwrap(), positions.len());
    drop(cache);

    let cache = RegionCache::new(config(&dir));
    for (i, &pos) in positions.iter().enumerate() {
        let region = cache.load_region(pos).unwrap();
        let region = region.lock().unwrap();
        assert_eq!(region.allocated_chunks(), 1);
        assert_eq!(
            region.chunk(i, i).unwrap(),
            Some(&[i as u8 + 1; CHUNK_BYTES][..])
        );
    }
}
