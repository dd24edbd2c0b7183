//! Biome registry: maps [`BiomeId`] to [`BiomeExtension`] with name-based lookup.

use hashbrown::HashMap;

use super::variant::{BiomeVariant, VariantKind};
use crate::climate::{RainfallBand, TemperatureBand};

/// Unique identifier for a biome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(pub u16);

/// A concrete biome: a terrain variant in one climate cell.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeExtension {
    pub name: String,
    pub variant: VariantKind,
    pub temperature: TemperatureBand,
    pub rainfall: RainfallBand,
}

impl BiomeExtension {
    /// The extension for `variant` in one climate cell, named `variant_temperature_rainfall`.
    pub fn new(variant: VariantKind, temperature: TemperatureBand, rainfall: RainfallBand) -> Self {
        Self {
            name: extension_name(variant, temperature, rainfall),
            variant,
            temperature,
            rainfall,
        }
    }

    pub fn properties(&self) -> BiomeVariant {
        self.variant.variant()
    }

    pub fn is_spawnable(&self) -> bool {
        self.properties().spawnable
    }

    pub fn is_salty(&self) -> bool {
        self.properties().salty
    }
}

/// Registry name of a variant in one climate cell.
pub fn extension_name(
    variant: VariantKind,
    temperature: TemperatureBand,
    rainfall: RainfallBand,
) -> String {
    format!("{}_{}_{}", variant.name(), temperature.name(), rainfall.name())
}

/// Errors that can occur when registering biomes.
#[derive(Debug, thiserror::Error)]
pub enum BiomeRegistryError {
    /// A biome with this name is already registered.
    #[error("duplicate biome name: {0}")]
    DuplicateName(String),
    /// More biomes than a [`BiomeId`] can address.
    #[error("biome registry is full")]
    Full,
}

/// Stores all registered biomes with O(1) lookup by ID.
pub struct BiomeRegistry {
    biomes: Vec<BiomeExtension>,
    name_to_id: HashMap<String, BiomeId>,
}

impl BiomeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            biomes: Vec::new(),
            name_to_id: HashMap::new(),
        }
    }

    /// A registry holding every variant in every climate cell.
    pub fn with_default_extensions() -> Result<Self, BiomeRegistryError> {
        let mut registry = Self::new();
        for variant in VariantKind::ALL {
            for temperature in TemperatureBand::ALL {
                for rainfall in RainfallBand::ALL {
                    registry.register(BiomeExtension::new(variant, temperature, rainfall))?;
                }
            }
        }
        Ok(registry)
    }

    /// Registers a new biome, returning its assigned [`BiomeId`].
    ///
    /// # Errors
    ///
    /// Returns [`BiomeRegistryError::DuplicateName`] if a biome with the same name exists.
    pub fn register(&mut self, biome: BiomeExtension) -> Result<BiomeId, BiomeRegistryError> {
        if self.name_to_id.contains_key(&biome.name) {
            return Err(BiomeRegistryError::DuplicateName(biome.name));
        }
        let id = u16::try_from(self.biomes.len())
            .map(BiomeId)
            .map_err(|_| BiomeRegistryError::Full)?;
        self.name_to_id.insert(biome.name.clone(), id);
        self.biomes.push(biome);
        Ok(id)
    }

    /// Returns the biome for the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this registry.
    pub fn get(&self, id: BiomeId) -> &BiomeExtension {
        &self.biomes[id.0 as usize]
    }

    /// Looks up a biome ID by name.
    pub fn lookup_by_name(&self, name: &str) -> Option<BiomeId> {
        self.name_to_id.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeExtension)> {
        self.biomes
            .iter()
            .enumerate()
            .map(|(i, biome)| (BiomeId(i as u16), biome))
    }

    /// Returns the number of registered biomes.
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Returns `true` if no biomes are registered.
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }
}

impl Default for BiomeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
