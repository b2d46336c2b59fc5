//! Standalone intersection simulation module
//!
//! This module contains all the core simulation logic: lane geometry, the
//! vehicle model, the occupancy check, the phase scheduler and the world
//! that advances them tick by tick. It has no rendering dependencies and can
//! be driven and tested from the console.

mod config;
mod intersection;
mod lanes;
mod routing;
mod scheduler;
mod spawner;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
pub use config::{
    SignalTiming, SimConfig, DURATION_GAIN, MAX_PHASE_EXTENSION_TICKS, MAX_VEHICLES,
    MIN_SPAWN_DISTANCE, OVERFLOW_EXTENSION_TICKS, PENDING_TIMEOUT_TICKS, PHASE_DURATION_TICKS,
    STARVATION_THRESHOLD_TICKS,
};
pub use intersection::{is_clear, IntersectionBox, CENTRAL_BOX};
pub use lanes::{is_off_screen, lane_capacities, Lane};
pub use routing::{lookup_turn, turn_waypoint, TurnRule, TURN_RULES};
pub use scheduler::{compute_lane_demand, PhaseScheduler};
pub use spawner::{check_spawn, SpawnRejection};
pub use types::{
    Direction, DirectionMap, Position, RouteClass, VehicleId, OFFSCREEN_MARGIN,
    SAFE_FOLLOWING_DISTANCE, SAFETY_GAP, VEHICLE_LENGTH, VEHICLE_STEP, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
pub use vehicle::{Vehicle, VehicleSnapshot};
pub use world::{SimStats, SimWorld, VehicleSet};
