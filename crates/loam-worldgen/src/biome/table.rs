//! Total `(variant, temperature, rainfall) -> BiomeId` lookup.

use super::registry::{BiomeId, BiomeRegistry, extension_name};
use super::variant::VariantKind;
use crate::climate::{RainfallBand, TemperatureBand};
use crate::error::WorldgenError;

type ClimateGrid = [[BiomeId; 5]; 5];

/// Resolved once from a registry. Construction fails if any cell is
/// missing, so lookups can never miss.
#[derive(Clone, Debug)]
pub struct BiomeTable {
    grids: Vec<ClimateGrid>,
}

impl BiomeTable {
    pub fn resolve(registry: &BiomeRegistry) -> Result<Self, WorldgenError> {
        let mut grids = Vec::with_capacity(VariantKind::COUNT);
        for variant in VariantKind::ALL {
            let mut grid = [[BiomeId(0); 5]; 5];
            for temperature in TemperatureBand::ALL {
                for rainfall in RainfallBand::ALL {
                    let name = extension_name(variant, temperature, rainfall);
                    let id = registry.lookup_by_name(&name).ok_or(
                        WorldgenError::MissingExtension {
                            variant: variant.name(),
                            temperature: temperature.name(),
                            rainfall: rainfall.name(),
                        },
                    )?;
                    grid[temperature.index()][rainfall.index()] = id;
                }
            }
            grids.push(grid);
        }
        Ok(Self { grids })
    }

    #[inline]
    pub fn get(
        &self,
        variant: VariantKind,
        temperature: TemperatureBand,
        rainfall: RainfallBand,
    ) -> BiomeId {
        self.grids[variant.index()][temperature.index()][rainfall.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biome::BiomeExtension;

    #[test]
    fn test_table_matches_registry() {
        let registry = BiomeRegistry::with_default_extensions().unwrap();
        let table = BiomeTable::resolve(&registry).unwrap();
        for variant in VariantKind::ALL {
            for temperature in TemperatureBand::ALL {
                for rainfall in RainfallBand::ALL {
                    let biome = registry.get(table.get(variant, temperature, rainfall));
                    assert_eq!(biome.variant, variant);
                    assert_eq!(biome.temperature, temperature);
                    assert_eq!(biome.rainfall, rainfall);
                }
            }
        }
    }

    #[test]
    fn test_missing_cell_fails_construction() {
        let mut registry = BiomeRegistry::new();
        for temperature in TemperatureBand::ALL {
            for rainfall in RainfallBand::ALL {
                if (temperature, rainfall) != (TemperatureBand::Warm, RainfallBand::Wet) {
                    registry
                        .register(BiomeExtension::new(VariantKind::Ocean, temperature, rainfall))
                        .unwrap();
                }
            }
        }
        let err = BiomeTable::resolve(&registry).unwrap_err();
        assert!(matches!(
            err,
            WorldgenError::MissingExtension {
                variant: "ocean",
                temperature: "warm",
                rainfall: "wet"
            }
        ));
    }
}
