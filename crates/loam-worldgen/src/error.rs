use loam_config::ConfigError;

use crate::biome::BiomeRegistryError;

/// Errors raised while building a world generator.
///
/// Everything is checked once at construction. Generation itself is infallible.
#[derive(Debug, thiserror::Error)]
pub enum WorldgenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no biome registered for variant {variant} at {temperature} temperature, {rainfall} rainfall")]
    MissingExtension {
        variant: &'static str,
        temperature: &'static str,
        rainfall: &'static str,
    },

    #[error(transparent)]
    Registry(#[from] BiomeRegistryError),

    #[error("invalid sampling geometry: {reason}")]
    InvalidSampling { reason: String },
}
