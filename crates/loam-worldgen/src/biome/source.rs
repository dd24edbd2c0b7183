//! Biome resolution: variant layer + climate -> [`BiomeId`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use loam_config::{Config, MAX_SPAWN_DISTANCE, SpawnSettings};
use rand::Rng;
use tracing::{info, trace, warn};

use super::layer::VariantLayer;
use super::registry::{BiomeExtension, BiomeId, BiomeRegistry};
use super::table::BiomeTable;
use super::variant::VariantKind;
use crate::area_cache::{AreaSource, ConcurrentAreaCache};
use crate::climate::{
    ChunkDataProvider, ClimateClassifier, ClimateSnapshot, RainfallBand, TemperatureBand,
};
use crate::error::WorldgenError;
use crate::river::WatershedContext;
use crate::seed::{derive_seed, positional_rng};
use crate::units::{ChunkPos, block_to_quart, quart_to_block};

/// Quart spacing of spawn search samples.
const SPAWN_SEARCH_STEP: i32 = 32;

/// Adapts a climate provider into a chunk-keyed area source.
pub struct ClimateSource(pub Arc<dyn ChunkDataProvider>);

impl AreaSource<ClimateSnapshot> for ClimateSource {
    #[inline]
    fn sample(&self, x: i32, z: i32) -> ClimateSnapshot {
        self.0.climate(ChunkPos::new(x, z))
    }
}

pub type VariantCache = ConcurrentAreaCache<VariantKind, VariantLayer>;

/// Resolves biomes at quart positions.
pub struct BiomeSource {
    variants: Arc<VariantCache>,
    climate: ConcurrentAreaCache<ClimateSnapshot, ClimateSource>,
    classifier: ClimateClassifier,
    registry: Arc<BiomeRegistry>,
    table: BiomeTable,
    spawn: SpawnSettings,
    search_seed: u64,
    ignore_climate_logged: AtomicBool,
}

impl BiomeSource {
    pub fn new(
        config: &Config,
        watersheds: Arc<WatershedContext>,
        climate: Arc<dyn ChunkDataProvider>,
        registry: Arc<BiomeRegistry>,
    ) -> Result<Self, WorldgenError> {
        let table = BiomeTable::resolve(&registry)?;
        let layer = VariantLayer::new(config.world.seed, watersheds);
        Ok(Self {
            variants: Arc::new(ConcurrentAreaCache::new(layer, config.cache.biome_cache_bits)),
            climate: ConcurrentAreaCache::new(
                ClimateSource(climate),
                config.cache.climate_cache_bits,
            ),
            classifier: ClimateClassifier::new(&config.climate),
            registry,
            table,
            spawn: config.spawn.clone(),
            search_seed: derive_seed(config.world.seed, "biome_search"),
            ignore_climate_logged: AtomicBool::new(false),
        })
    }

    /// Cached variant layer, shared with surface sampling.
    pub fn variants(&self) -> &Arc<VariantCache> {
        &self.variants
    }

    pub fn registry(&self) -> &Arc<BiomeRegistry> {
        &self.registry
    }

    pub fn variant(&self, quart_x: i32, quart_z: i32) -> VariantKind {
        self.variants.get(quart_x, quart_z)
    }

    /// Climate snapshot of the chunk holding a block column.
    pub fn climate_at(&self, block_x: i32, block_z: i32) -> ClimateSnapshot {
        let chunk = ChunkPos::from_block(block_x, block_z);
        self.climate.get(chunk.x, chunk.z)
    }

    /// Temperature and rainfall bands at a block column.
    pub fn climate_bands(&self, block_x: i32, block_z: i32) -> (TemperatureBand, RainfallBand) {
        let snapshot = self.climate_at(block_x, block_z);
        self.classifier.classify(
            snapshot.average_temp(block_x, block_z),
            snapshot.rainfall(block_x, block_z),
        )
    }

    /// Biome at a quart position.
    pub fn noise_biome(&self, quart_x: i32, quart_z: i32) -> BiomeId {
        let variant = self.variant(quart_x, quart_z);
        let (temperature, rainfall) =
            self.climate_bands(quart_to_block(quart_x), quart_to_block(quart_z));
        self.table.get(variant, temperature, rainfall)
    }

    pub fn biome(&self, quart_x: i32, quart_z: i32) -> &BiomeExtension {
        self.registry.get(self.noise_biome(quart_x, quart_z))
    }

    /// Biome at a quart position with climate fixed to normal/normal.
    ///
    /// Skips the climate provider entirely. Meant for searches over areas
    /// whose climate has not been generated.
    pub fn noise_biome_ignore_climate(&self, quart_x: i32, quart_z: i32) -> BiomeId {
        if !self.ignore_climate_logged.swap(true, Ordering::Relaxed) {
            warn!("resolving biomes without climate, using normal temperature and rainfall");
        } else {
            trace!(quart_x, quart_z, "biome lookup without climate");
        }
        let variant = self.variant(quart_x, quart_z);
        self.table
            .get(variant, TemperatureBand::Normal, RainfallBand::Normal)
    }

    /// A uniformly random block position within `radius` blocks of the center
    /// whose climate-free biome matches `predicate`, sampled every `step` blocks.
    ///
    /// Deterministic for a given world, center and radius.
    pub fn find_biome_ignore_climate(
        &self,
        center_x: i32,
        center_z: i32,
        radius: i32,
        step: i32,
        predicate: impl Fn(&BiomeExtension) -> bool,
    ) -> Option<(i32, i32)> {
        let step = step.max(1) as i64;
        let radius = radius.max(0) as i64;
        let mut rng = positional_rng(self.search_seed, center_x, radius as i32, center_z);
        let mut found = None;
        let mut matches = 0u32;
        let radius_sq = radius * radius;

        // Offsets that leave the i32 block range are skipped.
        let mut dz = -radius;
        while dz <= radius {
            let mut dx = -radius;
            while dx <= radius {
                if dx * dx + dz * dz <= radius_sq
                    && let (Ok(x), Ok(z)) = (
                        i32::try_from(center_x as i64 + dx),
                        i32::try_from(center_z as i64 + dz),
                    )
                {
                    let id = self.noise_biome_ignore_climate(block_to_quart(x), block_to_quart(z));
                    if predicate(self.registry.get(id)) {
                        matches += 1;
                        if rng.random_range(0..matches) == 0 {
                            found = Some((x, z));
                        }
                    }
                }
                dx += step;
            }
            dz += step;
        }
        found
    }

    /// Block column where players first appear.
    ///
    /// Searches the configured spawn area for a spawnable biome and falls
    /// back to the spawn center.
    pub fn find_spawn(&self) -> (i32, i32) {
        let (cx, cz) = (self.spawn.spawn_center_x, self.spawn.spawn_center_z);
        let radius = self.spawn.spawn_distance.min(MAX_SPAWN_DISTANCE) as i32;
        let step = quart_to_block(SPAWN_SEARCH_STEP);
        match self.find_biome_ignore_climate(cx, cz, radius, step, BiomeExtension::is_spawnable) {
            Some(spawn) => {
                info!(x = spawn.0, z = spawn.1, "found spawn position");
                spawn
            }
            None => {
                info!(x = cx, z = cz, "no spawnable biome in range, spawning at center");
                (cx, cz)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::climate::UniformClimate;

    fn source(seed: i64, temperature: f32, rainfall: f32) -> BiomeSource {
        let mut config = Config::default();
        config.world.seed = seed;
        config.spawn.spawn_distance = 1024;
        BiomeSource::new(
            &config,
            Arc::new(WatershedContext::new(&config)),
            Arc::new(UniformClimate {
                temperature,
                rainfall,
            }),
            Arc::new(BiomeRegistry::with_default_extensions().unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_biome_matches_variant_and_climate() {
        let source = source(1, 30.0, 50.0);
        for i in -50..50 {
            let (x, z) = (i * 29, i * 11);
            let biome = source.biome(x, z);
            assert_eq!(biome.variant, source.variant(x, z));
            assert_eq!(biome.temperature, TemperatureBand::Warm);
            assert_eq!(biome.rainfall, RainfallBand::Arid);
        }
    }

    #[test]
    fn test_ignore_climate_uses_normal_bands() {
        let source = source(2, -40.0, 1000.0);
        for i in -20..20 {
            let id = source.noise_biome_ignore_climate(i * 7, i * 3);
            let biome = source.registry().get(id);
            assert_eq!(biome.temperature, TemperatureBand::Normal);
            assert_eq!(biome.rainfall, RainfallBand::Normal);
            assert_eq!(biome.variant, source.variant(i * 7, i * 3));
        }
    }

    #[test]
    fn test_find_biome_is_deterministic_and_matches() {
        let source = source(3, 10.0, 250.0);
        let a = source.find_biome_ignore_climate(0, 0, 2048, 64, |b| !b.is_salty());
        let b = source.find_biome_ignore_climate(0, 0, 2048, 64, |b| !b.is_salty());
        assert_eq!(a, b);
        if let Some((x, z)) = a {
            assert!(x * x + z * z <= 2048 * 2048);
            let id = source.noise_biome_ignore_climate(block_to_quart(x), block_to_quart(z));
            assert!(!source.registry().get(id).is_salty());
        }
    }

    #[test]
    fn test_find_biome_none_when_nothing_matches() {
        let source = source(4, 10.0, 250.0);
        assert_eq!(source.find_biome_ignore_climate(0, 0, 256, 32, |_| false), None);
    }

    #[test]
    fn test_spawn_is_spawnable_or_center() {
        let source = source(5, 10.0, 250.0);
        let (x, z) = source.find_spawn();
        if (x, z) != (0, 0) {
            let id = source.noise_biome_ignore_climate(block_to_quart(x), block_to_quart(z));
            assert!(source.registry().get(id).is_spawnable());
        }
    }

    #[test]
    fn test_find_biome_near_coordinate_limit() {
        let source = source(6, 10.0, 250.0);
        let center = i32::MAX - 100;
        let found = source.find_biome_ignore_climate(center, i32::MIN + 100, 1024, 128, |_| true);
        let (x, z) = found.unwrap();
        assert!((x as i64 - center as i64).abs() <= 1024);
        assert!(z <= i32::MIN + 100 + 1024);
    }
}
