//! Biome selection and surface shape.
//!
//! A biome is a terrain [`VariantKind`] placed in one temperature and one
//! rainfall band. The variant comes from the [`VariantLayer`], the bands
//! from the climate provider, and the [`BiomeTable`] maps the triple to a
//! registered [`BiomeId`].

pub mod height;
pub mod layer;
pub mod registry;
pub mod source;
pub mod surface;
pub mod table;
pub mod variant;

pub use height::CarvingNoise;
pub use layer::VariantLayer;
pub use registry::{BiomeExtension, BiomeId, BiomeRegistry, BiomeRegistryError, extension_name};
pub use source::{BiomeSource, ClimateSource, VariantCache};
pub use surface::{SurfaceColumn, SurfaceSampler};
pub use table::BiomeTable;
pub use variant::{
    BiomeGroup, BiomeVariant, BlendGroup, Carving, HeightNoise, VariantKind, VolcanoParams,
};
