//! Deterministic layered world generation: noise, climate, biome variants, rivers, and per-chunk substance fill.

mod error;

pub mod aquifer;
pub mod area_cache;
pub mod biome;
pub mod climate;
pub mod debug_viz;
pub mod generator;
pub mod noise;
pub mod pool;
pub mod river;
pub mod sampler;
pub mod seed;
pub mod units;

pub use aquifer::{NoiseBasedAquifer, Substance};
pub use area_cache::{AreaSource, ConcurrentAreaCache, FnSource};
pub use biome::{BiomeExtension, BiomeId, BiomeRegistry, BiomeRegistryError, VariantKind};
pub use climate::{
    ChunkDataProvider, ClimateClassifier, ClimateSnapshot, NoiseClimateProvider, RainfallBand,
    TemperatureBand, UniformClimate,
};
pub use debug_viz::{DebugImage, MapRegion};
pub use error::WorldgenError;
pub use generator::WorldGenerator;
pub use pool::{ChunkGenerationPool, GeneratedChunk};
pub use river::{Flow, WatershedContext};
pub use sampler::{ChunkNoiseSamplingSettings, ChunkSubstances};
pub use units::ChunkPos;
