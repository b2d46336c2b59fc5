//! Turn routing table
//!
//! Turning is pure data: a vehicle heading `heading` with route `route` that
//! stands exactly on `waypoint` switches to `turn_to`. Adding a route means
//! adding a row, never a branch.

use super::types::{Direction, Position, RouteClass};

/// One row of the routing table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnRule {
    pub heading: Direction,
    pub route: RouteClass,
    pub waypoint: Position,
    pub turn_to: Direction,
}

const fn rule(
    heading: Direction,
    route: RouteClass,
    x: i32,
    y: i32,
    turn_to: Direction,
) -> TurnRule {
    TurnRule {
        heading,
        route,
        waypoint: Position::new(x, y),
        turn_to,
    }
}

/// Every turn the intersection supports
pub const TURN_RULES: [TurnRule; 8] = {
    use Direction::*;
    use RouteClass::*;
    [
        rule(North, TurnRight, 360, 310, West),
        rule(North, TurnLeft, 360, 360, East),
        rule(South, TurnLeft, 410, 310, West),
        rule(South, TurnRight, 410, 360, East),
        rule(East, TurnRight, 360, 360, North),
        rule(East, TurnLeft, 410, 360, South),
        rule(West, TurnLeft, 360, 310, North),
        rule(West, TurnRight, 410, 310, South),
    ]
};

/// Look up the new heading for a vehicle at `position`, if it should turn
pub fn lookup_turn(heading: Direction, position: Position, route: RouteClass) -> Option<Direction> {
    TURN_RULES
        .iter()
        .find(|rule| rule.heading == heading && rule.route == route && rule.waypoint == position)
        .map(|rule| rule.turn_to)
}

/// The waypoint where a vehicle from `origin` with `route` turns
pub fn turn_waypoint(origin: Direction, route: RouteClass) -> Option<Position> {
    TURN_RULES
        .iter()
        .find(|rule| rule.heading == origin && rule.route == route)
        .map(|rule| rule.waypoint)
}
