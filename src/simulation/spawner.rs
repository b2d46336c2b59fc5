//! Vehicle admission for the intersection simulation
//!
//! Spawn requests are checked against the vehicle cap and the clearance
//! around the lane entry. A refused spawn is an ordinary outcome, not an
//! error: nothing is mutated and the caller simply tries again later.

use std::fmt;

use super::config::SimConfig;
use super::types::Direction;
use super::vehicle::Vehicle;

/// Why a spawn request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRejection {
    /// The world already holds the maximum number of vehicles
    AtCapacity,
    /// A vehicle from the same lane is still too close to the entry point
    EntryBlocked,
}

impl fmt::Display for SpawnRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpawnRejection::AtCapacity => write!(f, "vehicle limit reached"),
            SpawnRejection::EntryBlocked => write!(f, "lane entry blocked"),
        }
    }
}

/// Check whether a vehicle may enter on `origin`'s lane
///
/// # Arguments
/// * `vehicles` - All active vehicles
/// * `active` - Number of active vehicles
/// * `origin` - The lane the new vehicle would enter on
/// * `config` - Vehicle cap and entry clearance
pub fn check_spawn<'a>(
    vehicles: impl IntoIterator<Item = &'a Vehicle>,
    active: usize,
    origin: Direction,
    config: &SimConfig,
) -> Result<(), SpawnRejection> {
    if active >= config.max_vehicles {
        return Err(SpawnRejection::AtCapacity);
    }

    let entry = origin.lane().entry;
    let clearance = config.spawn_clearance;
    let crowded = vehicles.into_iter().any(|vehicle| {
        let position = vehicle.position();
        vehicle.origin() == origin
            && (position.x - entry.x).abs() < clearance
            && (position.y - entry.y).abs() < clearance
    });

    if crowded {
        Err(SpawnRejection::EntryBlocked)
    } else {
        Ok(())
    }
}
