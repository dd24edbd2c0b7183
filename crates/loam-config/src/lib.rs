//! Configuration for the loam world generator.
//!
//! Settings persist to disk as RON files, accept CLI overrides via clap, and
//! deserialize with forward/backward compatible defaults. Every numeric knob
//! the generator reads at construction is checked by [`Config::validate`].

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CacheSettings, ClimateSettings, Config, DebugConfig, MAX_SPAWN_CENTER, MAX_SPAWN_DISTANCE,
    RiverSettings, RockLayerSettings, SamplingSettings, SpawnSettings, WorldSettings,
    default_config_dir,
};
pub use error::ConfigError;
