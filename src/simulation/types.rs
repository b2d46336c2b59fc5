//! Core types for the intersection simulation
//!
//! Directions, per-direction tables, pixel positions and route classes.

use std::ops::{Index, IndexMut};

use slotmap::new_key_type;

new_key_type! {
    /// Stable arena key of a vehicle
    pub struct VehicleId;
}

/// Compass heading of a vehicle.
///
/// Screen coordinates grow rightwards and downwards, so a `North` vehicle
/// travels towards larger y and a `South` vehicle towards smaller y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// All directions in table order
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Fixed signal rotation: East -> North -> West -> South -> East
    pub const ROTATION: [Direction; 4] = [
        Direction::East,
        Direction::North,
        Direction::West,
        Direction::South,
    ];

    /// Index into a [`DirectionMap`]
    pub const fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::East => 2,
            Direction::West => 3,
        }
    }

    /// The direction that follows this one in the signal rotation
    pub fn next_in_rotation(self) -> Direction {
        match self {
            Direction::East => Direction::North,
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
        }
    }

    /// The rotation walked from this direction's successor, ending on itself
    pub fn rotation_after(self) -> [Direction; 4] {
        let first = self.next_in_rotation();
        let second = first.next_in_rotation();
        let third = second.next_in_rotation();
        [first, second, third, self]
    }

    /// Pixel offset of a single step of length `step` along this heading
    pub fn delta(self, step: i32) -> (i32, i32) {
        match self {
            Direction::North => (0, step),
            Direction::South => (0, -step),
            Direction::East => (step, 0),
            Direction::West => (-step, 0),
        }
    }

    /// Coordinate along this direction's axis
    pub fn along(self, position: Position) -> i32 {
        match self {
            Direction::North | Direction::South => position.y,
            Direction::East | Direction::West => position.x,
        }
    }

    /// Coordinate across this direction's axis, identifying the lane line
    pub fn lateral(self, position: Position) -> i32 {
        match self {
            Direction::North | Direction::South => position.x,
            Direction::East | Direction::West => position.y,
        }
    }

    /// Signed distance from `from` to `to` measured in the direction of travel.
    /// Positive means `to` is ahead of `from`.
    pub fn forward_gap(self, from: Position, to: Position) -> i32 {
        match self {
            Direction::North => to.y - from.y,
            Direction::South => from.y - to.y,
            Direction::East => to.x - from.x,
            Direction::West => from.x - to.x,
        }
    }

    /// Single-character arrow as drawn on the terminal map
    pub fn arrow(self) -> char {
        match self {
            Direction::North => 'v',
            Direction::South => '^',
            Direction::East => '>',
            Direction::West => '<',
        }
    }
}

/// A fixed-size table with one entry per [`Direction`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionMap<T>([T; 4]);

impl<T> DirectionMap<T> {
    pub fn from_fn(f: impl FnMut(Direction) -> T) -> Self {
        Self(Direction::ALL.map(f))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.0.iter()
    }
}

impl<T> Index<Direction> for DirectionMap<T> {
    type Output = T;

    fn index(&self, direction: Direction) -> &T {
        &self.0[direction.index()]
    }
}

impl<T> IndexMut<Direction> for DirectionMap<T> {
    fn index_mut(&mut self, direction: Direction) -> &mut T {
        &mut self.0[direction.index()]
    }
}

/// An integer pixel position in the simulation viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(&self, (dx, dy): (i32, i32)) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

/// Routing decision a vehicle makes at its turn waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RouteClass {
    /// Cross the intersection without turning
    #[default]
    Straight,
    /// Turn to the driver's left
    TurnLeft,
    /// Turn to the driver's right
    TurnRight,
}

impl RouteClass {
    pub const ALL: [RouteClass; 3] = [
        RouteClass::Straight,
        RouteClass::TurnLeft,
        RouteClass::TurnRight,
    ];

    /// Parse a route class name, falling back to `Straight` for anything
    /// unrecognised so demand accounting stays total.
    pub fn from_name(name: &str) -> RouteClass {
        match name.trim().to_ascii_lowercase().as_str() {
            "left" | "turn-left" | "turn_left" | "turnleft" => RouteClass::TurnLeft,
            "right" | "turn-right" | "turn_right" | "turnright" => RouteClass::TurnRight,
            _ => RouteClass::Straight,
        }
    }
}

impl From<u8> for RouteClass {
    fn from(value: u8) -> Self {
        match value {
            1 => RouteClass::TurnLeft,
            2 => RouteClass::TurnRight,
            _ => RouteClass::Straight,
        }
    }
}

/// Width of the simulated viewport in pixels
pub const VIEWPORT_WIDTH: i32 = 800;

/// Height of the simulated viewport in pixels
pub const VIEWPORT_HEIGHT: i32 = 700;

/// How far past the viewport edge a vehicle travels before it is removed
pub const OFFSCREEN_MARGIN: i32 = 40;

/// Distance a vehicle advances per tick
pub const VEHICLE_STEP: i32 = 2;

/// Length of a vehicle in pixels
pub const VEHICLE_LENGTH: i32 = 45;

/// Gap kept between queued vehicles when sizing lane capacity
pub const SAFETY_GAP: i32 = 50;

/// Minimum distance to the vehicle ahead in the same direction
pub const SAFE_FOLLOWING_DISTANCE: i32 = VEHICLE_LENGTH + SAFETY_GAP;
