//! Rivers: plates, watersheds, branching networks and fractal centerlines.

pub mod fractal;
pub mod network;
pub mod plate;
pub mod watershed;

pub use fractal::{MidpointFractal, Nearest};
pub use network::{Edge, RiverNetwork, RiverParams, Vertex};
pub use plate::{Plate, PlateLayer};
pub use watershed::{Watershed, WatershedContext};

/// Half-width of a river, in watershed grid units.
pub const RIVER_WIDTH: f64 = 0.013;

/// Water movement at a column.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Flow {
    #[default]
    None,
    /// Unit downstream direction and a strength in `(0, 1]`, highest on the centerline.
    Flowing { dx: f32, dz: f32, strength: f32 },
}

impl Flow {
    pub fn is_flowing(&self) -> bool {
        matches!(self, Flow::Flowing { .. })
    }

    pub fn strength(&self) -> f32 {
        match *self {
            Flow::None => 0.0,
            Flow::Flowing { strength, .. } => strength,
        }
    }
}
