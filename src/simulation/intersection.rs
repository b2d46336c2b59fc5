//! Intersection occupancy for the traffic simulation
//!
//! The central box starts one pixel past every stop line. The scheduler asks
//! whether it is empty before committing a phase change; vehicles themselves
//! never consult it.

use super::types::Position;
use super::vehicle::Vehicle;

/// An axis-aligned box with inclusive bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntersectionBox {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

/// The conflict area shared by all four lanes
pub const CENTRAL_BOX: IntersectionBox = IntersectionBox {
    left: 301,
    right: 469,
    top: 241,
    bottom: 419,
};

impl IntersectionBox {
    pub fn contains(&self, position: Position) -> bool {
        (self.left..=self.right).contains(&position.x)
            && (self.top..=self.bottom).contains(&position.y)
    }

    /// Number of vehicles currently inside the box
    pub fn occupants<'a>(&self, vehicles: impl IntoIterator<Item = &'a Vehicle>) -> usize {
        vehicles
            .into_iter()
            .filter(|vehicle| self.contains(vehicle.position()))
            .count()
    }
}

/// Check whether no vehicle is inside the central box
pub fn is_clear<'a>(vehicles: impl IntoIterator<Item = &'a Vehicle>) -> bool {
    !vehicles
        .into_iter()
        .any(|vehicle| CENTRAL_BOX.contains(vehicle.position()))
}
