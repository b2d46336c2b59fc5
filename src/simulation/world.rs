//! Main simulation world that ties everything together
//!
//! `SimWorld` owns the vehicle arena and the phase scheduler and advances
//! both one tick at a time. Renderers and drivers only read from it through
//! the snapshot and query methods.

use anyhow::Result;
use log::{debug, error};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use slotmap::SlotMap;

use super::config::SimConfig;
use super::intersection::CENTRAL_BOX;
use super::scheduler::PhaseScheduler;
use super::spawner::{check_spawn, SpawnRejection};
use super::types::{
    Direction, DirectionMap, Position, RouteClass, VehicleId, VEHICLE_LENGTH, VIEWPORT_HEIGHT,
    VIEWPORT_WIDTH,
};
use super::vehicle::{Vehicle, VehicleSnapshot};

/// Arena of active vehicles
pub type VehicleSet = SlotMap<VehicleId, Vehicle>;

/// Pixels per character on the terminal map
const MAP_SCALE: i32 = 20;

/// Half the width of a road on the terminal map
const ROAD_HALF_WIDTH: i32 = 25;

/// Running totals for a simulation session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    /// Ticks simulated
    pub ticks: u64,
    /// Vehicles admitted
    pub spawned: u64,
    /// Spawn requests refused
    pub rejected: u64,
    /// Vehicles that left the viewport
    pub exited: u64,
    /// Turns performed
    pub turns: u64,
    /// Same-lane overlaps observed after a tick
    pub invariant_violations: u64,
}

/// The main simulation world
pub struct SimWorld {
    config: SimConfig,

    scheduler: PhaseScheduler,

    /// All active vehicles
    vehicles: VehicleSet,

    /// Sequence number for the next spawned vehicle
    next_seq: u64,

    stats: SimStats,

    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SimWorld {
    fn new_internal(config: SimConfig, rng: Option<StdRng>) -> Self {
        Self {
            config,
            scheduler: PhaseScheduler::new(config.timing),
            vehicles: VehicleSet::with_key(),
            next_seq: 0,
            stats: SimStats::default(),
            rng,
        }
    }

    pub fn new() -> Self {
        Self::new_internal(SimConfig::default(), None)
    }

    /// Create a new SimWorld with a seeded RNG for reproducible simulations
    pub fn new_with_seed(seed: u64) -> Self {
        Self::new_internal(SimConfig::default(), Some(StdRng::seed_from_u64(seed)))
    }

    /// Create a world from a custom configuration, rejecting invalid values
    pub fn with_config(config: SimConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_internal(config, seed.map(StdRng::seed_from_u64)))
    }

    /// Roll a probability, using seeded RNG if available
    fn random_bool(&mut self, chance: f64) -> bool {
        let chance = chance.clamp(0.0, 1.0);
        match &mut self.rng {
            Some(rng) => rng.random_bool(chance),
            None => rand::rng().random_bool(chance),
        }
    }

    /// Choose a random element from a slice, using seeded RNG if available
    fn choose_random<T: Copy>(&mut self, slice: &[T]) -> Option<T> {
        match &mut self.rng {
            Some(rng) => slice.choose(rng).copied(),
            None => slice.choose(&mut rand::rng()).copied(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &PhaseScheduler {
        &self.scheduler
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Per-direction grants as of the last tick
    pub fn grants(&self) -> &DirectionMap<bool> {
        self.scheduler.grants()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> + Clone {
        self.vehicles.values()
    }

    pub fn get_vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id)
    }

    /// Snapshot of every active vehicle, oldest first
    pub fn snapshots(&self) -> Vec<VehicleSnapshot> {
        self.vehicles_in_order()
            .into_iter()
            .map(Vehicle::snapshot)
            .collect()
    }

    /// Spawn a vehicle at the entry of `origin`'s lane
    pub fn spawn(
        &mut self,
        origin: Direction,
        route: RouteClass,
    ) -> Result<VehicleId, SpawnRejection> {
        if let Err(reason) = check_spawn(
            self.vehicles.values(),
            self.vehicles.len(),
            origin,
            &self.config,
        ) {
            self.stats.rejected += 1;
            debug!("Spawn on {:?} lane refused: {}", origin, reason);
            return Err(reason);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        let id = self
            .vehicles
            .insert_with_key(|id| Vehicle::new(id, seq, origin, route));
        self.stats.spawned += 1;
        debug!("Spawned vehicle {} on {:?} lane ({:?})", seq, origin, route);
        Ok(id)
    }

    /// Spawn a vehicle, reporting only whether it was admitted
    pub fn try_spawn(&mut self, origin: Direction, route: RouteClass) -> bool {
        self.spawn(origin, route).is_ok()
    }

    /// Spawn a vehicle on a random lane with a random route
    pub fn spawn_random(&mut self) -> bool {
        let origin = self
            .choose_random(&Direction::ALL)
            .unwrap_or(Direction::North);
        let route = self
            .choose_random(&RouteClass::ALL)
            .unwrap_or_default();
        self.try_spawn(origin, route)
    }

    /// With probability `chance`, attempt a random spawn.
    /// Returns true if a vehicle was admitted.
    pub fn random_arrival(&mut self, chance: f64) -> bool {
        self.random_bool(chance) && self.spawn_random()
    }

    /// Advance the simulation by one tick
    pub fn tick(&mut self) {
        self.stats.ticks += 1;

        // Signal state is derived from the vehicles as they stand at tick start
        self.scheduler.update(self.vehicles.values());

        // Collision checks read this snapshot, never positions moved earlier
        // in the same pass
        let snapshot: Vec<VehicleSnapshot> =
            self.vehicles.values().map(Vehicle::snapshot).collect();
        let grants = *self.scheduler.grants();

        for vehicle in self.vehicles.values_mut() {
            vehicle.apply_gate(&grants);

            if vehicle.gate_open() && !vehicle.blocked(&snapshot) {
                vehicle.step();
            }

            // A vehicle parked on its waypoint still turns
            if let Some(turn_to) = vehicle.turn_check() {
                self.stats.turns += 1;
                debug!(
                    "Vehicle {} turned {:?} -> {:?} at ({}, {})",
                    vehicle.seq(),
                    vehicle.origin(),
                    turn_to,
                    vehicle.position().x,
                    vehicle.position().y
                );
            }
        }

        self.prune_exited();
        self.audit_invariants();
    }

    /// Remove vehicles that have driven off the viewport
    fn prune_exited(&mut self) {
        let before = self.vehicles.len();
        self.vehicles.retain(|_, vehicle| {
            let keep = !vehicle.is_off_screen();
            if !keep {
                debug!("Vehicle {} left the viewport", vehicle.seq());
            }
            keep
        });
        self.stats.exited += (before - self.vehicles.len()) as u64;
    }

    /// Pairs of same-lane vehicles closer than one vehicle length
    pub fn overlapping_pairs(&self) -> Vec<(VehicleId, VehicleId)> {
        let vehicles: Vec<&Vehicle> = self.vehicles.values().collect();
        let mut pairs = Vec::new();
        for (i, a) in vehicles.iter().enumerate() {
            for b in &vehicles[i + 1..] {
                let direction = a.direction();
                if b.direction() != direction
                    || direction.lateral(a.position()) != direction.lateral(b.position())
                {
                    continue;
                }
                if direction.forward_gap(a.position(), b.position()).abs() < VEHICLE_LENGTH {
                    pairs.push((a.id(), b.id()));
                }
            }
        }
        pairs
    }

    fn audit_invariants(&mut self) {
        let granted = self.scheduler.grants().values().filter(|on| **on).count();
        debug_assert!(granted <= 1, "{} directions granted at once", granted);

        for (a, b) in self.overlapping_pairs() {
            self.stats.invariant_violations += 1;
            error!(
                "Vehicles {:?} and {:?} overlap in the same lane at tick {}",
                a, b, self.stats.ticks
            );
        }
    }

    /// Print a summary of the world state
    pub fn print_summary(&self) {
        let scheduler = &self.scheduler;
        println!("=== Intersection Summary ===");
        println!("Tick: {}", self.stats.ticks);
        match scheduler.pending_phase() {
            Some(pending) => println!(
                "Phase: {:?} -> {:?} pending ({} ticks)",
                scheduler.current_phase(),
                pending,
                scheduler.pending_elapsed()
            ),
            None => println!(
                "Phase: {:?} ({}/{} ticks)",
                scheduler.current_phase(),
                scheduler.timer(),
                scheduler.phase_duration()
            ),
        }
        println!(
            "Vehicles: {} (in intersection: {})",
            self.vehicles.len(),
            CENTRAL_BOX.occupants(self.vehicles.values())
        );
        println!();

        println!("--- Lanes ---");
        for direction in Direction::ALL {
            println!(
                "  {:?}: signal={}, queue={}/{}, congestion={:.2}, waiting={} ticks",
                direction,
                if scheduler.is_granted(direction) { "GREEN" } else { "red" },
                scheduler.demand(direction),
                scheduler.capacity(direction),
                scheduler.congestion(direction),
                scheduler.starvation_ticks(direction)
            );
        }

        if !self.vehicles.is_empty() {
            println!("--- Active Vehicles ---");
            for vehicle in self.vehicles_in_order() {
                println!(
                    "  Vehicle {}: position=({}, {}), heading={:?}, origin={:?}, route={:?}, turned={}",
                    vehicle.seq(),
                    vehicle.position().x,
                    vehicle.position().y,
                    vehicle.direction(),
                    vehicle.origin(),
                    vehicle.route(),
                    vehicle.has_turned()
                );
            }
        }
    }

    fn vehicles_in_order(&self) -> Vec<&Vehicle> {
        let mut vehicles: Vec<&Vehicle> = self.vehicles.values().collect();
        vehicles.sort_by_key(|vehicle| vehicle.seq());
        vehicles
    }

    /// Draw a visual map of the intersection in the terminal
    pub fn draw_map(&self) {
        let width = (VIEWPORT_WIDTH / MAP_SCALE) as usize;
        let height = (VIEWPORT_HEIGHT / MAP_SCALE) as usize;

        // Helper to convert pixel coords to grid coords
        let to_grid = |position: Position| -> Option<(usize, usize)> {
            if position.x < 0 || position.y < 0 {
                return None;
            }
            let col = (position.x / MAP_SCALE) as usize;
            let row = (position.y / MAP_SCALE) as usize;
            (row < height && col < width).then_some((row, col))
        };

        let vertical_road = Direction::North.lane().entry.x - ROAD_HALF_WIDTH
            ..=Direction::South.lane().entry.x + ROAD_HALF_WIDTH;
        let horizontal_road = Direction::West.lane().entry.y - ROAD_HALF_WIDTH
            ..=Direction::East.lane().entry.y + ROAD_HALF_WIDTH;

        let mut grid = vec![vec![' '; width]; height];
        for (row, line) in grid.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                let center = Position::new(
                    col as i32 * MAP_SCALE + MAP_SCALE / 2,
                    row as i32 * MAP_SCALE + MAP_SCALE / 2,
                );
                if CENTRAL_BOX.contains(center) {
                    *cell = '#';
                } else if vertical_road.contains(&center.x) || horizontal_road.contains(&center.y) {
                    *cell = '.';
                }
            }
        }

        // Signals sit on each lane's stop line
        for direction in Direction::ALL {
            let lane = direction.lane();
            let stop = match direction {
                Direction::North | Direction::South => Position::new(lane.entry.x, lane.stop_line),
                Direction::East | Direction::West => Position::new(lane.stop_line, lane.entry.y),
            };
            if let Some((row, col)) = to_grid(stop) {
                grid[row][col] = if self.scheduler.is_granted(direction) { 'G' } else { 'R' };
            }
        }

        for vehicle in self.vehicles.values() {
            if let Some((row, col)) = to_grid(vehicle.position()) {
                grid[row][col] = vehicle.direction().arrow();
            }
        }

        println!("\n=== Intersection Map ===");
        println!("Legend: G/R=Signal, #=Intersection, .=Road, v^<>=Vehicle heading");
        println!();
        for row in &grid {
            let line: String = row.iter().collect();
            println!("{}", line.trim_end());
        }
        println!();
    }
}
