//! Vehicle movement logic for the intersection simulation
//!
//! Gate, collision, step and turn rules for a single vehicle. Vehicles never
//! look at the signal state directly; the orchestrator hands them the grants.

use super::lanes::is_off_screen;
use super::routing::lookup_turn;
use super::types::{
    Direction, DirectionMap, Position, RouteClass, VehicleId, SAFE_FOLLOWING_DISTANCE,
    VEHICLE_STEP,
};

/// Immutable view of a vehicle taken at the start of a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub position: Position,
    pub direction: Direction,
    pub route: RouteClass,
}

/// A vehicle in the intersection simulation
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    /// Spawn sequence number, used to order snapshots
    seq: u64,
    position: Position,
    /// Current heading
    direction: Direction,
    /// Heading at spawn; identifies the lane the vehicle queued in
    origin: Direction,
    route: RouteClass,
    turned: bool,
    gate_open: bool,
}

impl Vehicle {
    /// Create a vehicle at the entry point of its origin lane
    pub fn new(id: VehicleId, seq: u64, origin: Direction, route: RouteClass) -> Self {
        Self::new_at(id, seq, origin, route, origin.lane().entry)
    }

    /// Create a vehicle heading `origin` at an arbitrary position
    pub fn new_at(
        id: VehicleId,
        seq: u64,
        origin: Direction,
        route: RouteClass,
        position: Position,
    ) -> Self {
        Self {
            id,
            seq,
            position,
            direction: origin,
            origin,
            route,
            turned: false,
            gate_open: true,
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn origin(&self) -> Direction {
        self.origin
    }

    pub fn route(&self) -> RouteClass {
        self.route
    }

    pub fn has_turned(&self) -> bool {
        self.turned
    }

    pub fn gate_open(&self) -> bool {
        self.gate_open
    }

    pub fn snapshot(&self) -> VehicleSnapshot {
        VehicleSnapshot {
            id: self.id,
            position: self.position,
            direction: self.direction,
            route: self.route,
        }
    }

    /// Whether the vehicle stands exactly on the stop line of its lane
    pub fn at_stop_line(&self) -> bool {
        self.direction.along(self.position) == self.direction.lane().stop_line
    }

    /// Recompute `gate_open` from this tick's grants.
    ///
    /// Only a vehicle waiting on its stop line can be held; anything before
    /// or past the line is free to move.
    pub fn apply_gate(&mut self, grants: &DirectionMap<bool>) {
        self.gate_open = !(self.at_stop_line() && !grants[self.direction]);
    }

    /// Whether a same-direction vehicle ahead is too close to advance.
    ///
    /// The check looks one step ahead, so moving never brings this vehicle
    /// within the safe following distance of the vehicle in front.
    pub fn blocked(&self, snapshot: &[VehicleSnapshot]) -> bool {
        snapshot.iter().any(|other| {
            if other.id == self.id || other.direction != self.direction {
                return false;
            }
            let gap = self.direction.forward_gap(self.position, other.position);
            gap > 0 && gap <= VEHICLE_STEP + SAFE_FOLLOWING_DISTANCE
        })
    }

    /// Advance one step along the current heading
    pub fn step(&mut self) {
        self.position = self.position.offset(self.direction.delta(VEHICLE_STEP));
    }

    /// Turn if standing on this route's waypoint.
    ///
    /// Returns the new heading when a turn happened. A vehicle turns at most
    /// once.
    pub fn turn_check(&mut self) -> Option<Direction> {
        if self.turned {
            return None;
        }
        let turn_to = lookup_turn(self.direction, self.position, self.route)?;
        self.direction = turn_to;
        self.turned = true;
        Some(turn_to)
    }

    pub fn is_off_screen(&self) -> bool {
        is_off_screen(self.position)
    }
}
