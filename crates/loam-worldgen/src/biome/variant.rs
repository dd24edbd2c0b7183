//! Climate-independent terrain archetypes.
//!
//! A [`VariantKind`] decides the shape of the land: its height noise, whether
//! it carves under rivers, where its aquifers sit. The final biome at a
//! position is a variant plus a temperature band and a rainfall band.

/// Terrain archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantKind {
    Ocean,
    OceanReef,
    DeepOcean,
    DeepOceanTrench,
    Shore,
    Plains,
    Hills,
    Lowlands,
    LowCanyons,
    RollingHills,
    Badlands,
    InvertedBadlands,
    Plateau,
    Canyons,
    Mountains,
    OldMountains,
    OceanicMountains,
    VolcanicMountains,
    VolcanicOceanicMountains,
    Lake,
    MountainLake,
    OldMountainLake,
    OceanicMountainLake,
    VolcanicMountainLake,
    VolcanicOceanicMountainLake,
    PlateauLake,
    River,
    MountainRiver,
    OldMountainRiver,
    OceanicMountainRiver,
    VolcanicMountainRiver,
    VolcanicOceanicMountainRiver,
}

/// Broad category of a variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BiomeGroup {
    Ocean,
    Land,
    Lake,
    River,
}

/// Surface height blending only mixes variants of the same blend group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendGroup {
    Body,
    River,
}

/// Height field family of a variant. Heights are relative to sea level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HeightNoise {
    /// Warped rolling sea floor between `min` and `max`.
    Ocean { min: f64, max: f64 },
    /// Sea floor with a ridged trench running through it.
    OceanRidge { min: f64, max: f64 },
    /// Simple octave noise between `min` and `max`.
    Hills { min: f64, max: f64 },
    Lowlands,
    /// Terraced, steep-sided mesas.
    Canyons { min: f64, max: f64 },
    Badlands,
    InvertedBadlands,
    /// Ridged peaks rising `scale` above a `base` height, with cliffs.
    Mountains { base: f64, scale: f64 },
    Shore,
    Lake,
    River,
}

/// Cone volcanoes scattered over a variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolcanoParams {
    /// One volcano in roughly this many cellular cells.
    pub rarity: u32,
    /// Height of the cone base above sea level.
    pub base_height: f64,
    /// Additional cone height.
    pub scale_height: f64,
}

/// Underground water body carved beneath the surface of a mountain variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Carving {
    None,
    River,
    Lake,
}

/// Static properties of a variant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeVariant {
    pub kind: VariantKind,
    pub group: BiomeGroup,
    pub height: HeightNoise,
    pub salty: bool,
    pub volcanoes: Option<VolcanoParams>,
    pub carving: Carving,
    /// Offset of the default aquifer surface from sea level.
    pub aquifer_height_offset: i32,
    pub spawnable: bool,
}

const fn variant(kind: VariantKind, group: BiomeGroup, height: HeightNoise) -> BiomeVariant {
    BiomeVariant {
        kind,
        group,
        height,
        salty: false,
        volcanoes: None,
        carving: Carving::None,
        aquifer_height_offset: 0,
        spawnable: false,
    }
}

impl BiomeVariant {
    const fn salty(mut self) -> Self {
        self.salty = true;
        self
    }

    const fn spawnable(mut self) -> Self {
        self.spawnable = true;
        self
    }

    const fn aquifer(mut self, offset: i32) -> Self {
        self.aquifer_height_offset = offset;
        self
    }

    const fn volcanoes(mut self, rarity: u32, base_height: f64, scale_height: f64) -> Self {
        self.volcanoes = Some(VolcanoParams {
            rarity,
            base_height,
            scale_height,
        });
        self
    }

    /// River channels are cut into the blended land surface rather than
    /// blended with it. Mountain rivers keep their mountain surface.
    pub const fn blend_group(&self) -> BlendGroup {
        match self.height {
            HeightNoise::River => BlendGroup::River,
            _ => BlendGroup::Body,
        }
    }
}

impl VariantKind {
    pub const ALL: [VariantKind; 32] = [
        Self::Ocean,
        Self::OceanReef,
        Self::DeepOcean,
        Self::DeepOceanTrench,
        Self::Shore,
        Self::Plains,
        Self::Hills,
        Self::Lowlands,
        Self::LowCanyons,
        Self::RollingHills,
        Self::Badlands,
        Self::InvertedBadlands,
        Self::Plateau,
        Self::Canyons,
        Self::Mountains,
        Self::OldMountains,
        Self::OceanicMountains,
        Self::VolcanicMountains,
        Self::VolcanicOceanicMountains,
        Self::Lake,
        Self::MountainLake,
        Self::OldMountainLake,
        Self::OceanicMountainLake,
        Self::VolcanicMountainLake,
        Self::VolcanicOceanicMountainLake,
        Self::PlateauLake,
        Self::River,
        Self::MountainRiver,
        Self::OldMountainRiver,
        Self::OceanicMountainRiver,
        Self::VolcanicMountainRiver,
        Self::VolcanicOceanicMountainRiver,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Ocean => "ocean",
            Self::OceanReef => "ocean_reef",
            Self::DeepOcean => "deep_ocean",
            Self::DeepOceanTrench => "deep_ocean_trench",
            Self::Shore => "shore",
            Self::Plains => "plains",
            Self::Hills => "hills",
            Self::Lowlands => "lowlands",
            Self::LowCanyons => "low_canyons",
            Self::RollingHills => "rolling_hills",
            Self::Badlands => "badlands",
            Self::InvertedBadlands => "inverted_badlands",
            Self::Plateau => "plateau",
            Self::Canyons => "canyons",
            Self::Mountains => "mountains",
            Self::OldMountains => "old_mountains",
            Self::OceanicMountains => "oceanic_mountains",
            Self::VolcanicMountains => "volcanic_mountains",
            Self::VolcanicOceanicMountains => "volcanic_oceanic_mountains",
            Self::Lake => "lake",
            Self::MountainLake => "mountain_lake",
            Self::OldMountainLake => "old_mountain_lake",
            Self::OceanicMountainLake => "oceanic_mountain_lake",
            Self::VolcanicMountainLake => "volcanic_mountain_lake",
            Self::VolcanicOceanicMountainLake => "volcanic_oceanic_mountain_lake",
            Self::PlateauLake => "plateau_lake",
            Self::River => "river",
            Self::MountainRiver => "mountain_river",
            Self::OldMountainRiver => "old_mountain_river",
            Self::OceanicMountainRiver => "oceanic_mountain_river",
            Self::VolcanicMountainRiver => "volcanic_mountain_river",
            Self::VolcanicOceanicMountainRiver => "volcanic_oceanic_mountain_river",
        }
    }

    /// Static properties of this variant.
    pub const fn variant(self) -> BiomeVariant {
        use BiomeGroup::{Land, Ocean};
        use HeightNoise as H;
        match self {
            Self::Ocean => variant(self, Ocean, H::Ocean { min: -26.0, max: -12.0 })
                .salty()
                .aquifer(-24),
            Self::OceanReef => variant(self, Ocean, H::Ocean { min: -16.0, max: -8.0 })
                .salty()
                .aquifer(-16),
            Self::DeepOcean => variant(self, Ocean, H::Ocean { min: -30.0, max: -16.0 })
                .salty()
                .aquifer(-24),
            Self::DeepOceanTrench => {
                variant(self, Ocean, H::OceanRidge { min: -30.0, max: -16.0 })
                    .salty()
                    .aquifer(-24)
            }
            Self::Shore => variant(self, Ocean, H::Shore).salty().aquifer(-16),
            Self::Plains => variant(self, Land, H::Hills { min: 4.0, max: 10.0 }).spawnable(),
            Self::Hills => variant(self, Land, H::Hills { min: -5.0, max: 16.0 }).spawnable(),
            Self::Lowlands => variant(self, Land, H::Lowlands).aquifer(-16).spawnable(),
            Self::LowCanyons => variant(self, Land, H::Canyons { min: -8.0, max: 21.0 })
                .aquifer(-16)
                .spawnable(),
            Self::RollingHills => {
                variant(self, Land, H::Hills { min: -5.0, max: 28.0 }).spawnable()
            }
            Self::Badlands => variant(self, Land, H::Badlands).spawnable(),
            Self::InvertedBadlands => variant(self, Land, H::InvertedBadlands).spawnable(),
            Self::Plateau => variant(self, Land, H::Hills { min: 20.0, max: 30.0 }).spawnable(),
            Self::Canyons => variant(self, Land, H::Canyons { min: -2.0, max: 40.0 })
                .volcanoes(6, 14.0, 30.0)
                .spawnable(),
            Self::Mountains => mountains(self, 10.0, 70.0).spawnable(),
            Self::OldMountains => mountains(self, 16.0, 40.0).spawnable(),
            Self::OceanicMountains => mountains(self, -16.0, 60.0).salty().aquifer(-8),
            Self::VolcanicMountains => mountains(self, 10.0, 60.0).volcanoes(4, 25.0, 50.0),
            Self::VolcanicOceanicMountains => mountains(self, -24.0, 50.0)
                .salty()
                .aquifer(-8)
                .volcanoes(2, -12.0, 50.0),
            Self::Lake => variant(self, BiomeGroup::Lake, H::Lake).aquifer(-16),
            Self::MountainLake => mountains(self, 10.0, 70.0).lake(),
            Self::OldMountainLake => mountains(self, 16.0, 40.0).lake(),
            Self::OceanicMountainLake => mountains(self, -16.0, 60.0).salty().lake(),
            Self::VolcanicMountainLake => mountains(self, 10.0, 60.0)
                .volcanoes(4, 25.0, 50.0)
                .lake(),
            Self::VolcanicOceanicMountainLake => mountains(self, -24.0, 50.0)
                .salty()
                .volcanoes(2, -12.0, 50.0)
                .lake(),
            Self::PlateauLake => variant(self, Land, H::Hills { min: 20.0, max: 30.0 }).lake(),
            Self::River => variant(self, BiomeGroup::River, H::River),
            Self::MountainRiver => mountains(self, 10.0, 70.0).river(),
            Self::OldMountainRiver => mountains(self, 16.0, 40.0).river(),
            Self::OceanicMountainRiver => mountains(self, -16.0, 60.0).salty().river(),
            Self::VolcanicMountainRiver => mountains(self, 10.0, 60.0)
                .volcanoes(4, 25.0, 50.0)
                .river(),
            Self::VolcanicOceanicMountainRiver => mountains(self, -24.0, 50.0)
                .salty()
                .volcanoes(2, -12.0, 50.0)
                .river(),
        }
    }

    /// River variant replacing `self` where a river crosses it.
    pub const fn with_river(self) -> VariantKind {
        match self {
            Self::Mountains => Self::MountainRiver,
            Self::OldMountains => Self::OldMountainRiver,
            Self::OceanicMountains => Self::OceanicMountainRiver,
            Self::VolcanicMountains => Self::VolcanicMountainRiver,
            Self::VolcanicOceanicMountains => Self::VolcanicOceanicMountainRiver,
            _ => Self::River,
        }
    }

    /// Lake variant replacing `self` inside a lake.
    pub const fn with_lake(self) -> VariantKind {
        match self {
            Self::Mountains => Self::MountainLake,
            Self::OldMountains => Self::OldMountainLake,
            Self::OceanicMountains => Self::OceanicMountainLake,
            Self::VolcanicMountains => Self::VolcanicMountainLake,
            Self::VolcanicOceanicMountains => Self::VolcanicOceanicMountainLake,
            Self::Plateau => Self::PlateauLake,
            _ => Self::Lake,
        }
    }

    pub const fn group(self) -> BiomeGroup {
        self.variant().group
    }

    pub const fn is_ocean(self) -> bool {
        matches!(self.group(), BiomeGroup::Ocean)
    }
}

const fn mountains(kind: VariantKind, base: f64, scale: f64) -> BiomeVariant {
    variant(kind, BiomeGroup::Land, HeightNoise::Mountains { base, scale })
}

impl BiomeVariant {
    /// Lake carved under a land surface.
    const fn lake(mut self) -> Self {
        self.group = BiomeGroup::Lake;
        self.carving = Carving::Lake;
        self.aquifer_height_offset = -16;
        self
    }

    /// River tunnel carved under a land surface.
    const fn river(mut self) -> Self {
        self.group = BiomeGroup::River;
        self.carving = Carving::River;
        self
    }
}

impl std::fmt::Display for VariantKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_in_index_order() {
        for (i, kind) in VariantKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(kind.variant().kind, *kind);
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = VariantKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), VariantKind::COUNT);
    }

    #[test]
    fn test_river_and_lake_substitutes() {
        for kind in VariantKind::ALL {
            assert_eq!(kind.with_river().group(), BiomeGroup::River);
            assert_eq!(kind.with_lake().group(), BiomeGroup::Lake);
        }
        assert_eq!(VariantKind::Mountains.with_river(), VariantKind::MountainRiver);
        assert_eq!(VariantKind::Plains.with_lake(), VariantKind::Lake);
        assert_eq!(
            VariantKind::MountainRiver.variant().carving,
            Carving::River
        );
    }

    #[test]
    fn test_ocean_variants_are_salty_and_unspawnable() {
        for kind in VariantKind::ALL.into_iter().filter(|k| k.is_ocean()) {
            let variant = kind.variant();
            assert!(variant.salty, "{kind} should be salty");
            assert!(!variant.spawnable, "{kind} should not be spawnable");
        }
    }

    #[test]
    fn test_group_sizes() {
        let count = |group| VariantKind::ALL.iter().filter(|k| k.group() == group).count();
        assert_eq!(count(BiomeGroup::Ocean), 5);
        assert_eq!(count(BiomeGroup::Land), 14);
        assert_eq!(count(BiomeGroup::Lake), 7);
        assert_eq!(count(BiomeGroup::River), 6);
        assert_eq!(VariantKind::COUNT, 32);
    }

    #[test]
    fn test_volcanic_variants_keep_volcanoes() {
        for kind in [
            VariantKind::VolcanicMountains,
            VariantKind::VolcanicMountainLake,
            VariantKind::VolcanicMountainRiver,
        ] {
            let volcanoes = kind.variant().volcanoes.unwrap();
            assert_eq!(volcanoes.rarity, 4);
            assert!(volcanoes.scale_height > 0.0);
        }
        assert!(VariantKind::Mountains.variant().volcanoes.is_none());
        assert!(VariantKind::Canyons.variant().volcanoes.is_some());
    }

    #[test]
    fn test_blend_groups() {
        assert_eq!(VariantKind::River.variant().blend_group(), BlendGroup::River);
        assert_eq!(VariantKind::Lake.variant().blend_group(), BlendGroup::Body);
        assert_eq!(VariantKind::Ocean.variant().blend_group(), BlendGroup::Body);
        assert_eq!(
            VariantKind::MountainRiver.variant().blend_group(),
            BlendGroup::Body
        );
    }
}
