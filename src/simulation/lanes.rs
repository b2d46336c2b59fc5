//! Lane geometry for the four approaches
//!
//! Each direction owns exactly one lane: vehicles heading that way enter at a
//! fixed point, queue in a fixed segment and wait at a fixed stop line.

use super::types::{
    Direction, DirectionMap, Position, OFFSCREEN_MARGIN, SAFETY_GAP, VEHICLE_LENGTH,
    VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};

/// Static geometry of one approach lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lane {
    /// Where new vehicles appear
    pub entry: Position,
    /// Axis coordinate where vehicles wait for a grant
    pub stop_line: i32,
    /// Lower bound of the queuing segment along the lane axis
    pub queue_min: i32,
    /// Upper bound of the queuing segment along the lane axis
    pub queue_max: i32,
}

impl Lane {
    /// Length of the queuing segment in pixels
    pub const fn length(&self) -> i32 {
        self.queue_max - self.queue_min
    }

    /// Number of vehicles the queuing segment holds
    pub const fn capacity(&self) -> usize {
        (self.length() / (VEHICLE_LENGTH + SAFETY_GAP)) as usize
    }

    /// Whether an axis coordinate lies inside the queuing segment
    pub fn in_queue(&self, along: i32) -> bool {
        (self.queue_min..=self.queue_max).contains(&along)
    }
}

const NORTH_LANE: Lane = Lane {
    entry: Position::new(360, -30),
    stop_line: 240,
    queue_min: -30,
    queue_max: 240,
};

const SOUTH_LANE: Lane = Lane {
    entry: Position::new(410, 700),
    stop_line: 420,
    queue_min: 420,
    queue_max: 700,
};

const EAST_LANE: Lane = Lane {
    entry: Position::new(-30, 360),
    stop_line: 300,
    queue_min: -30,
    queue_max: 300,
};

const WEST_LANE: Lane = Lane {
    entry: Position::new(800, 310),
    stop_line: 470,
    queue_min: 470,
    queue_max: 800,
};

impl Direction {
    /// The lane carrying traffic with this heading
    pub fn lane(self) -> &'static Lane {
        match self {
            Direction::North => &NORTH_LANE,
            Direction::South => &SOUTH_LANE,
            Direction::East => &EAST_LANE,
            Direction::West => &WEST_LANE,
        }
    }
}

/// Lane capacities, fixed for the lifetime of a scheduler
pub fn lane_capacities() -> DirectionMap<usize> {
    DirectionMap::from_fn(|direction| direction.lane().capacity())
}

/// Whether a position has left the viewport by more than the margin
pub fn is_off_screen(position: Position) -> bool {
    position.x < -OFFSCREEN_MARGIN
        || position.x > VIEWPORT_WIDTH + OFFSCREEN_MARGIN
        || position.y < -OFFSCREEN_MARGIN
        || position.y > VIEWPORT_HEIGHT + OFFSCREEN_MARGIN
}
