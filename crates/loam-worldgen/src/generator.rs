//! Per-world generation context.

use std::sync::Arc;

use loam_config::Config;
use tracing::info;

use crate::biome::{
    BiomeExtension, BiomeId, BiomeRegistry, BiomeSource, SurfaceColumn, SurfaceSampler,
    VariantKind,
};
use crate::climate::ChunkDataProvider;
use crate::error::WorldgenError;
use crate::river::{Flow, WatershedContext};
use crate::sampler::{ChunkNoiseSampler, ChunkNoiseSamplingSettings, ChunkSubstances, NoiseSampler};
use crate::units::{CHUNK_WIDTH, ChunkPos};

/// Everything derived from one world seed, built once and shared by all
/// chunk tasks. Every query after construction is infallible.
pub struct WorldGenerator {
    config: Config,
    watersheds: Arc<WatershedContext>,
    biomes: BiomeSource,
    surface: SurfaceSampler,
    noise: NoiseSampler,
    sampling: ChunkNoiseSamplingSettings,
}

static_assertions::assert_impl_all!(WorldGenerator: Send, Sync);

impl WorldGenerator {
    /// Build with the default biome registry.
    pub fn new(
        config: &Config,
        climate: Arc<dyn ChunkDataProvider>,
    ) -> Result<Self, WorldgenError> {
        let registry = BiomeRegistry::with_default_extensions()?;
        Self::with_registry(config, climate, Arc::new(registry))
    }

    pub fn with_registry(
        config: &Config,
        climate: Arc<dyn ChunkDataProvider>,
        registry: Arc<BiomeRegistry>,
    ) -> Result<Self, WorldgenError> {
        config.validate()?;
        let sampling = ChunkNoiseSamplingSettings::from_config(config)?;
        let seed = config.world.seed;
        let watersheds = Arc::new(WatershedContext::new(config));
        let biomes = BiomeSource::new(config, Arc::clone(&watersheds), climate, registry)?;

        info!(
            seed,
            sea_level = config.world.sea_level,
            min_y = config.world.min_y,
            height = config.world.height,
            biomes = biomes.registry().len(),
            "built world generator"
        );

        Ok(Self {
            config: config.clone(),
            watersheds,
            biomes,
            surface: SurfaceSampler::new(seed, config.world.sea_level),
            noise: NoiseSampler::new(seed),
            sampling,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sea_level(&self) -> i32 {
        self.config.world.sea_level
    }

    pub fn watersheds(&self) -> &Arc<WatershedContext> {
        &self.watersheds
    }

    pub fn biome_source(&self) -> &BiomeSource {
        &self.biomes
    }

    pub fn noise(&self) -> &NoiseSampler {
        &self.noise
    }

    pub fn sampling(&self) -> &ChunkNoiseSamplingSettings {
        &self.sampling
    }

    pub fn variant(&self, quart_x: i32, quart_z: i32) -> VariantKind {
        self.biomes.variant(quart_x, quart_z)
    }

    pub fn biome_id(&self, quart_x: i32, quart_z: i32) -> BiomeId {
        self.biomes.noise_biome(quart_x, quart_z)
    }

    /// Biome at a quart column.
    pub fn biome(&self, quart_x: i32, quart_z: i32) -> &BiomeExtension {
        self.biomes.biome(quart_x, quart_z)
    }

    /// Biome at a quart column, assuming normal temperature and rainfall.
    pub fn biome_ignore_climate(&self, quart_x: i32, quart_z: i32) -> &BiomeExtension {
        let id = self.biomes.noise_biome_ignore_climate(quart_x, quart_z);
        self.biomes.registry().get(id)
    }

    pub fn flow_at(&self, block_x: i32, block_z: i32) -> Flow {
        self.watersheds.flow_at(block_x, block_z)
    }

    pub fn surface_column(&self, block_x: i32, block_z: i32) -> SurfaceColumn {
        self.surface
            .column(self.biomes.variants().as_ref(), &self.watersheds, block_x, block_z)
    }

    pub fn surface_height(&self, block_x: i32, block_z: i32) -> f64 {
        self.surface_column(block_x, block_z).height
    }

    /// Resolve every voxel of a chunk.
    pub fn generate_chunk(&self, chunk: ChunkPos) -> ChunkSubstances {
        let (min_x, min_z) = (chunk.min_block_x(), chunk.min_block_z());
        let mut columns = Vec::with_capacity((CHUNK_WIDTH * CHUNK_WIDTH) as usize);
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                columns.push(self.surface_column(min_x + x, min_z + z));
            }
        }
        let variants = self.biomes.variants().as_ref();
        ChunkNoiseSampler::new(&self.noise, &self.sampling, chunk, self.sea_level(), &columns)
            .fill(|x, z| self.surface.blended_height(variants, x, z) as i32)
    }

    /// Block column where players first appear.
    pub fn find_spawn(&self) -> (i32, i32) {
        self.biomes.find_spawn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::Substance;
    use crate::climate::{NoiseClimateProvider, UniformClimate};

    fn generator(seed: i64) -> WorldGenerator {
        let mut config = Config::default();
        config.world.seed = seed;
        config.spawn.spawn_distance = 512;
        WorldGenerator::new(&config, Arc::new(NoiseClimateProvider::new(seed))).unwrap()
    }

    #[test]
    fn test_same_seed_same_biome() {
        let a = generator(1234);
        let b = generator(1234);
        assert_eq!(a.biome_id(100, -50), b.biome_id(100, -50));
        assert_eq!(a.biome(100, -50).name, b.biome(100, -50).name);
    }

    #[test]
    fn test_biomes_deterministic_over_area() {
        let a = generator(77);
        let b = generator(77);
        for i in -30..30 {
            let (x, z) = (i * 41, i * -23);
            assert_eq!(a.biome_id(x, z), b.biome_id(x, z));
            assert_eq!(a.surface_height(x * 4, z * 4), b.surface_height(x * 4, z * 4));
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.sampling.cell_width = 3;
        let result = WorldGenerator::new(&config, Arc::new(UniformClimate {
            temperature: 10.0,
            rainfall: 250.0,
        }));
        assert!(matches!(result, Err(WorldgenError::Config(_))));
    }

    #[test]
    fn test_chunk_surface_matches_columns() {
        let generator = generator(5);
        let chunk = generator.generate_chunk(ChunkPos::new(3, -2));
        for (x, z) in [(0, 0), (7, 9), (15, 15)] {
            let column = generator.surface_column(48 + x, -32 + z);
            assert_eq!(chunk.surface_height(x, z), column.height.floor() as i32);
            assert_eq!(chunk.flow(x, z), column.flow);
        }
        assert_eq!(chunk.get(0, chunk.max_y() - 1, 0), Substance::Air);
    }

    #[test]
    fn test_generator_is_shareable() {
        let generator = Arc::new(generator(9));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || generator.biome_id(i * 100, -i * 100))
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            let i = i as i32;
            assert_eq!(handle.join().unwrap(), generator.biome_id(i * 100, -i * 100));
        }
    }
}
