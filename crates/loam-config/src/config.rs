//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Width of a chunk in blocks. Cell widths must divide it.
const CHUNK_WIDTH: u32 = 16;

/// Largest accepted spawn search radius in blocks.
pub const MAX_SPAWN_DISTANCE: u32 = 100_000;

/// Largest accepted absolute spawn center coordinate in blocks.
pub const MAX_SPAWN_CENTER: i32 = 30_000_000;

/// Top-level world generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Seed and vertical extent of the world.
    pub world: WorldSettings,
    /// Temperature and rainfall band cutoffs.
    pub climate: ClimateSettings,
    /// Geology settings, forwarded to the rock layer generator untouched.
    pub rock_layers: RockLayerSettings,
    /// Spawn search parameters.
    pub spawn: SpawnSettings,
    /// Watershed and river network shape.
    pub rivers: RiverSettings,
    /// Interpolation cell geometry for 3D density sampling.
    pub sampling: SamplingSettings,
    /// Slot counts for the concurrent area caches.
    pub cache: CacheSettings,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World seed and vertical extent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldSettings {
    /// World seed. Every noise layer and river network derives from it.
    pub seed: i64,
    /// Y level of the ocean surface.
    pub sea_level: i32,
    /// Lowest generated block Y.
    pub min_y: i32,
    /// Number of generated block layers above `min_y`.
    pub height: u32,
}

/// Band cutoffs for the climate classifier.
///
/// Both arrays hold four strictly increasing values splitting the real line
/// into five bands. A value equal to a cutoff belongs to the band above it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClimateSettings {
    /// Frozen/cold, cold/normal, normal/lukewarm, lukewarm/warm, in degrees.
    pub temperature_cutoffs: [f32; 4],
    /// Arid/dry, dry/normal, normal/damp, damp/wet, in millimetres.
    pub rainfall_cutoffs: [f32; 4],
}

/// Opaque geology settings. The generator only carries these along.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RockLayerSettings {
    /// Percentage of plates that are oceanic.
    pub ocean_percent: u32,
    /// Scale of rock layer regions.
    pub rock_layer_scale: u32,
    /// Rock names, in layering order.
    pub rocks: Vec<String>,
}

/// Spawn search parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpawnSettings {
    /// Maximum search radius in blocks around the spawn center.
    pub spawn_distance: u32,
    /// Block X of the search center.
    pub spawn_center_x: i32,
    /// Block Z of the search center.
    pub spawn_center_z: i32,
}

/// River network shape. Lengths are in watershed grid units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiverSettings {
    /// Probability that a coastal source cell starts a river.
    pub source_chance: f32,
    /// Length of the first river edge.
    pub length: f32,
    /// Edge count of the trunk before branching stops.
    pub depth: u32,
    /// Minimum separation between unrelated river edges.
    pub feather: f32,
    /// Midpoint displacement factor, relative to segment length (0, 0.5].
    pub roughness: f32,
    /// Bisection stops once a segment is shorter than this.
    pub min_segment_length: f32,
}

/// Interpolation cell geometry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingSettings {
    /// Cell width in blocks. Must divide 16.
    pub cell_width: u32,
    /// Cell height in blocks. Must divide the world height and `min_y`.
    pub cell_height: u32,
}

/// Slot counts (as powers of two) for the concurrent area caches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheSettings {
    /// Biome variant layer, keyed by quart column.
    pub biome_cache_bits: u32,
    /// Plate layer, keyed by watershed grid cell.
    pub plate_cache_bits: u32,
    /// Climate snapshots, keyed by chunk.
    pub climate_cache_bits: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "loam_worldgen=trace").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            sea_level: 63,
            min_y: -64,
            height: 384,
        }
    }
}

impl Default for ClimateSettings {
    fn default() -> Self {
        Self {
            temperature_cutoffs: [-17.25, -3.75, 9.75, 23.25],
            rainfall_cutoffs: [125.0, 200.0, 300.0, 375.0],
        }
    }
}

impl Default for RockLayerSettings {
    fn default() -> Self {
        Self {
            ocean_percent: 45,
            rock_layer_scale: 7,
            rocks: [
                "granite", "diorite", "gabbro", "shale", "claystone", "limestone",
                "conglomerate", "dolomite", "chert", "chalk", "rhyolite", "basalt",
                "andesite", "dacite", "quartzite", "slate", "phyllite", "schist", "gneiss",
                "marble",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            spawn_distance: 8_000,
            spawn_center_x: 0,
            spawn_center_z: 0,
        }
    }
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            source_chance: 0.5,
            length: 0.8,
            depth: 14,
            feather: 0.2,
            roughness: 0.35,
            min_segment_length: 0.06,
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            cell_width: 4,
            cell_height: 8,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            biome_cache_bits: 10,
            plate_cache_bits: 8,
            climate_cache_bits: 8,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Platform config directory for loam, e.g. `~/.config/loam` on Linux.
///
/// Falls back to `./config` when the platform reports no config directory.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("loam"))
        .unwrap_or_else(|| PathBuf::from("config"))
}

// --- Validation ---

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

fn check_cutoffs(field: &'static str, cutoffs: &[f32; 4]) -> Result<(), ConfigError> {
    if cutoffs.iter().any(|c| !c.is_finite()) {
        return Err(invalid(field, format!("cutoffs must be finite: {cutoffs:?}")));
    }
    if cutoffs.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid(
            field,
            format!("cutoffs must be strictly increasing: {cutoffs:?}"),
        ));
    }
    Ok(())
}

fn check_cache_bits(field: &'static str, bits: u32) -> Result<(), ConfigError> {
    if !(1..=24).contains(&bits) {
        return Err(invalid(field, format!("{bits} is outside 1..=24")));
    }
    Ok(())
}

impl Config {
    /// Check every value the generator relies on at construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_cutoffs("climate.temperature_cutoffs", &self.climate.temperature_cutoffs)?;
        check_cutoffs("climate.rainfall_cutoffs", &self.climate.rainfall_cutoffs)?;

        let rivers = &self.rivers;
        if !(0.0..=1.0).contains(&rivers.source_chance) {
            return Err(invalid(
                "rivers.source_chance",
                format!("{} is not a probability", rivers.source_chance),
            ));
        }
        if !(rivers.roughness > 0.0 && rivers.roughness <= 0.5) {
            return Err(invalid(
                "rivers.roughness",
                format!("{} is outside (0, 0.5]", rivers.roughness),
            ));
        }
        if !(rivers.min_segment_length > 0.0) {
            return Err(invalid("rivers.min_segment_length", "must be positive"));
        }
        if !(rivers.length > 0.0) {
            return Err(invalid("rivers.length", "must be positive"));
        }
        if rivers.feather < 0.0 {
            return Err(invalid("rivers.feather", "must not be negative"));
        }

        let sampling = &self.sampling;
        let world = &self.world;
        if sampling.cell_width == 0 || CHUNK_WIDTH % sampling.cell_width != 0 {
            return Err(invalid(
                "sampling.cell_width",
                format!("{} does not divide {CHUNK_WIDTH}", sampling.cell_width),
            ));
        }
        if sampling.cell_height == 0 || world.height % sampling.cell_height != 0 {
            return Err(invalid(
                "sampling.cell_height",
                format!(
                    "{} does not divide world height {}",
                    sampling.cell_height, world.height
                ),
            ));
        }
        if world.min_y.rem_euclid(sampling.cell_height as i32) != 0 {
            return Err(invalid(
                "world.min_y",
                format!("{} is not a multiple of the cell height", world.min_y),
            ));
        }
        if world.sea_level < world.min_y || world.sea_level >= world.min_y + world.height as i32 {
            return Err(invalid(
                "world.sea_level",
                format!("{} lies outside the generated range", world.sea_level),
            ));
        }

        let spawn = &self.spawn;
        if spawn.spawn_distance > MAX_SPAWN_DISTANCE {
            return Err(invalid(
                "spawn.spawn_distance",
                format!("{} exceeds {MAX_SPAWN_DISTANCE}", spawn.spawn_distance),
            ));
        }
        for (field, value) in [
            ("spawn.spawn_center_x", spawn.spawn_center_x),
            ("spawn.spawn_center_z", spawn.spawn_center_z),
        ] {
            if !(-MAX_SPAWN_CENTER..=MAX_SPAWN_CENTER).contains(&value) {
                return Err(invalid(
                    field,
                    format!("{value} is outside ±{MAX_SPAWN_CENTER}"),
                ));
            }
        }

        check_cache_bits("cache.biome_cache_bits", self.cache.biome_cache_bits)?;
        check_cache_bits("cache.plate_cache_bits", self.cache.plate_cache_bits)?;
        check_cache_bits("cache.climate_cache_bits", self.cache.climate_cache_bits)?;
        Ok(())
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Re-read `config.ron`: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("sea_level: 63"));
        assert!(ron_str.contains("spawn_distance: 8000"));
    }

    #[test]
    fn test_default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.world.seed = -1234;
        config.rivers.roughness = 0.25;
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let ron_str = "(world: (seed: 7), climate: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.sea_level, 63);
        assert_eq!(config.rivers, RiverSettings::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_non_monotonic_cutoffs_rejected() {
        let mut config = Config::default();
        config.climate.temperature_cutoffs = [-10.0, 5.0, 5.0, 20.0];
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field, .. } if field == "climate.temperature_cutoffs"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_nan_cutoff_rejected() {
        let mut config = Config::default();
        config.climate.rainfall_cutoffs[2] = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roughness_out_of_range_rejected() {
        let mut config = Config::default();
        config.rivers.roughness = 0.75;
        assert!(config.validate().is_err());
        config.rivers.roughness = 0.0;
        assert!(config.validate().is_err());
        config.rivers.roughness = 0.5;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cell_width_must_divide_chunk() {
        let mut config = Config::default();
        config.sampling.cell_width = 3;
        assert!(config.validate().is_err());
        config.sampling.cell_width = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_min_y_must_align_to_cell_height() {
        let mut config = Config::default();
        config.world.min_y = -60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cache_bits_bounds() {
        let mut config = Config::default();
        config.cache.biome_cache_bits = 0;
        assert!(config.validate().is_err());
        config.cache.biome_cache_bits = 25;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_spawn_bounds() {
        let mut config = Config::default();
        config.spawn.spawn_center_x = i32::MAX - 100;
        config.spawn.spawn_distance = 1024;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "spawn.spawn_center_x", .. })
        ));

        config.spawn.spawn_center_x = -MAX_SPAWN_CENTER;
        config.spawn.spawn_center_z = MAX_SPAWN_CENTER;
        config.validate().unwrap();

        config.spawn.spawn_distance = MAX_SPAWN_DISTANCE + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "spawn.spawn_distance", .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = 1234;
        config.spawn.spawn_center_x = -500;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.world.seed = 99;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.map(|c| c.world.seed), Some(99));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// world generation\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
