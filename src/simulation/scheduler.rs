//! Signal phase scheduling for the intersection
//!
//! One direction holds the green at a time. The green lasts longer when its
//! lane is congested, the next phase goes to the most congested lane, and a
//! lane denied service for too long preempts everything else. Switching
//! phases waits for the intersection box to empty, but only for a bounded
//! number of ticks.

use log::{debug, info, warn};
use ordered_float::OrderedFloat;

use super::config::SignalTiming;
use super::intersection::is_clear;
use super::lanes::lane_capacities;
use super::types::{Direction, DirectionMap};
use super::vehicle::Vehicle;

/// Count queued, not-yet-turned vehicles per origin lane
pub fn compute_lane_demand<'a>(
    vehicles: impl IntoIterator<Item = &'a Vehicle>,
) -> DirectionMap<usize> {
    let mut demand = DirectionMap::default();
    for vehicle in vehicles {
        if vehicle.has_turned() {
            continue;
        }
        let origin = vehicle.origin();
        if origin.lane().in_queue(origin.along(vehicle.position())) {
            demand[origin] += 1;
        }
    }
    demand
}

/// The intersection signal state machine
#[derive(Debug, Clone)]
pub struct PhaseScheduler {
    timing: SignalTiming,
    /// Direction currently (or most recently) holding the green
    current: Direction,
    /// Ticks elapsed toward `phase_duration`
    timer: u32,
    phase_duration: u32,
    /// Ticks since `current` was committed; not reset by the at-capacity hold
    green_elapsed: u32,
    pending: Option<Direction>,
    pending_elapsed: u32,
    capacity: DirectionMap<usize>,
    demand: DirectionMap<usize>,
    /// Consecutive ticks each lane had demand but no green
    starvation: DirectionMap<u32>,
    grants: DirectionMap<bool>,
    phase_switches: u64,
    forced_switches: u64,
}

impl Default for PhaseScheduler {
    fn default() -> Self {
        Self::new(SignalTiming::default())
    }
}

impl PhaseScheduler {
    /// Create a scheduler starting on the East phase
    pub fn new(timing: SignalTiming) -> Self {
        Self::with_phase(timing, Direction::East)
    }

    pub fn with_phase(timing: SignalTiming, phase: Direction) -> Self {
        let mut scheduler = Self {
            timing,
            current: phase,
            timer: 0,
            phase_duration: timing.base_duration,
            green_elapsed: 0,
            pending: None,
            pending_elapsed: 0,
            capacity: lane_capacities(),
            demand: DirectionMap::default(),
            starvation: DirectionMap::default(),
            grants: DirectionMap::default(),
            phase_switches: 0,
            forced_switches: 0,
        };
        scheduler.refresh_grants();
        scheduler
    }

    /// Advance the signal by one tick using the vehicle set as it stands at
    /// the start of the tick.
    pub fn update<'a, I>(&mut self, vehicles: I)
    where
        I: IntoIterator<Item = &'a Vehicle>,
        I::IntoIter: Clone,
    {
        let vehicles = vehicles.into_iter();
        self.demand = compute_lane_demand(vehicles.clone());
        let clear = is_clear(vehicles);

        self.update_starvation();

        match self.pending {
            Some(next) => self.resolve_pending(next, clear),
            None => self.advance_phase(clear),
        }

        self.refresh_grants();
    }

    pub fn timing(&self) -> &SignalTiming {
        &self.timing
    }

    pub fn current_phase(&self) -> Direction {
        self.current
    }

    pub fn pending_phase(&self) -> Option<Direction> {
        self.pending
    }

    pub fn pending_elapsed(&self) -> u32 {
        self.pending_elapsed
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn phase_duration(&self) -> u32 {
        self.phase_duration
    }

    pub fn green_elapsed(&self) -> u32 {
        self.green_elapsed
    }

    pub fn grants(&self) -> &DirectionMap<bool> {
        &self.grants
    }

    pub fn is_granted(&self, direction: Direction) -> bool {
        self.grants[direction]
    }

    /// The direction allowed to cross right now, if any
    pub fn granted_phase(&self) -> Option<Direction> {
        match self.pending {
            Some(_) => None,
            None => Some(self.current),
        }
    }

    /// Queued vehicles counted on the last update
    pub fn demand(&self, direction: Direction) -> usize {
        self.demand[direction]
    }

    pub fn capacity(&self, direction: Direction) -> usize {
        self.capacity[direction]
    }

    /// Demand divided by capacity; zero for a lane without capacity
    pub fn congestion(&self, direction: Direction) -> f64 {
        match self.capacity[direction] {
            0 => 0.0,
            capacity => self.demand[direction] as f64 / capacity as f64,
        }
    }

    pub fn starvation_ticks(&self, direction: Direction) -> u32 {
        self.starvation[direction]
    }

    /// Total committed phase changes
    pub fn phase_switches(&self) -> u64 {
        self.phase_switches
    }

    /// Phase changes committed by the pending timeout rather than a clear box
    pub fn forced_switches(&self) -> u64 {
        self.forced_switches
    }

    fn update_starvation(&mut self) {
        let granted = self.granted_phase();
        for direction in Direction::ALL {
            if self.demand[direction] > 0 && granted != Some(direction) {
                self.starvation[direction] = self.starvation[direction].saturating_add(1);
            } else {
                self.starvation[direction] = 0;
            }
        }
    }

    /// Run the duration policy and, on expiry, pick and request the next phase
    fn advance_phase(&mut self, clear: bool) {
        self.green_elapsed = self.green_elapsed.saturating_add(1);
        self.apply_duration_policy();

        let starved = self.most_starved();
        if starved.is_none() && self.timer < self.phase_duration {
            return;
        }

        self.timer = 0;
        let next = match starved {
            Some(direction) => {
                debug!(
                    "{:?} starved for {} ticks, preempting {:?}",
                    direction, self.starvation[direction], self.current
                );
                direction
            }
            None => self.select_by_congestion(),
        };

        if next == self.current {
            return;
        }

        if clear {
            self.commit(next, false);
        } else {
            debug!("Intersection occupied, deferring {:?} -> {:?}", self.current, next);
            self.pending = Some(next);
            self.pending_elapsed = 0;
        }
    }

    fn apply_duration_policy(&mut self) {
        let demand = self.demand[self.current];
        let capacity = self.capacity[self.current];
        let max_duration = self.timing.max_duration();

        if capacity > 0 && demand >= capacity {
            // Hold the green and size it by how far the queue overflows
            self.timer = 0;
            let overflow = (demand - capacity).max(1) as u32;
            self.phase_duration = self
                .timing
                .base_duration
                .saturating_add(self.timing.overflow_step.saturating_mul(overflow))
                .min(max_duration);
        } else {
            let extension =
                (self.congestion(self.current) * self.timing.duration_gain).round() as u32;
            self.phase_duration = self
                .timing
                .base_duration
                .saturating_add(extension)
                .min(max_duration);
            self.timer += 1;
        }
    }

    /// The lane that has waited past the starvation threshold the longest.
    ///
    /// The current phase keeps at least one base duration of green before it
    /// can be preempted.
    fn most_starved(&self) -> Option<Direction> {
        if self.green_elapsed < self.timing.base_duration {
            return None;
        }
        // `max_by_key` keeps the last maximum, so walk the rotation reversed
        // to let the earliest direction in rotation order win ties.
        self.current
            .rotation_after()
            .into_iter()
            .rev()
            .filter(|direction| {
                *direction != self.current
                    && self.starvation[*direction] > self.timing.starvation_threshold
            })
            .max_by_key(|direction| self.starvation[*direction])
    }

    /// Highest congestion wins, ties go to the earliest direction in the
    /// rotation after the current phase. With no demand anywhere this is
    /// simply the next direction in the rotation.
    fn select_by_congestion(&self) -> Direction {
        self.current
            .rotation_after()
            .into_iter()
            .rev()
            .max_by_key(|direction| OrderedFloat(self.congestion(*direction)))
            .unwrap_or_else(|| self.current.next_in_rotation())
    }

    fn resolve_pending(&mut self, next: Direction, clear: bool) {
        self.pending_elapsed += 1;
        if clear {
            self.commit(next, false);
        } else if self.pending_elapsed >= self.timing.pending_timeout {
            warn!(
                "Intersection still occupied after {} ticks, forcing {:?} -> {:?}",
                self.pending_elapsed, self.current, next
            );
            self.commit(next, true);
        }
    }

    fn commit(&mut self, next: Direction, forced: bool) {
        info!("Phase {:?} -> {:?}", self.current, next);
        self.current = next;
        self.pending = None;
        self.pending_elapsed = 0;
        self.timer = 0;
        self.green_elapsed = 0;
        self.phase_duration = self.timing.base_duration;
        self.starvation[next] = 0;
        self.phase_switches += 1;
        if forced {
            self.forced_switches += 1;
        }
    }

    fn refresh_grants(&mut self) {
        let granted = self.granted_phase();
        self.grants = DirectionMap::from_fn(|direction| granted == Some(direction));
        debug_assert!(
            self.grants.values().filter(|on| **on).count() <= 1,
            "more than one direction granted"
        );
    }
}
