//! End-to-end tests of the simulation world
//!
//! Spawning rules, a full left turn, red-light queuing and long seeded runs
//! that check the safety properties on every tick.

use std::collections::HashMap;

use intersection_sim::simulation::{
    is_clear, Direction, Position, RouteClass, SignalTiming, SimConfig, SimWorld, SpawnRejection,
    VehicleId, SAFE_FOLLOWING_DISTANCE, TURN_RULES, VEHICLE_LENGTH,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Upper bound on how long a lane with demand can go without a green
fn starvation_bound(timing: &SignalTiming) -> u32 {
    timing.starvation_threshold + 1 + 4 * (timing.base_duration + timing.pending_timeout + 2)
}

fn expected_turn(origin: Direction, route: RouteClass) -> Option<Direction> {
    TURN_RULES
        .iter()
        .find(|rule| rule.heading == origin && rule.route == route)
        .map(|rule| rule.turn_to)
}

#[test]
fn test_world_starts_empty_on_east_phase() {
    let world = SimWorld::new();
    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.scheduler().current_phase(), Direction::East);
    assert!(world.grants()[Direction::East]);
    assert_eq!(world.stats().ticks, 0);
}

#[test]
fn test_spawn_places_vehicle_at_lane_entry() {
    let mut world = SimWorld::new();
    let id = world
        .spawn(Direction::South, RouteClass::TurnLeft)
        .expect("empty lane should admit a vehicle");

    let vehicle = world.get_vehicle(id).expect("vehicle should exist");
    assert_eq!(vehicle.position(), Position::new(410, 700));
    assert_eq!(vehicle.origin(), Direction::South);
    assert_eq!(vehicle.direction(), Direction::South);
    assert_eq!(vehicle.route(), RouteClass::TurnLeft);
    assert_eq!(world.stats().spawned, 1);
}

#[test]
fn test_spawn_refused_near_lane_entry() {
    let mut world = SimWorld::new();
    assert!(world.try_spawn(Direction::North, RouteClass::Straight));
    assert_eq!(
        world.spawn(Direction::North, RouteClass::Straight),
        Err(SpawnRejection::EntryBlocked)
    );
    assert_eq!(world.vehicle_count(), 1);
    assert_eq!(world.stats().rejected, 1);

    // Other lanes are unaffected
    assert!(world.try_spawn(Direction::East, RouteClass::Straight));
    assert_eq!(world.vehicle_count(), 2);
}

#[test]
fn test_spawn_allowed_once_entry_clears() {
    let mut world = SimWorld::new();
    assert!(world.try_spawn(Direction::North, RouteClass::Straight));

    // 39 steps of 2 pixels leave the first vehicle 78 pixels from the entry
    for _ in 0..39 {
        world.tick();
    }
    assert!(!world.try_spawn(Direction::North, RouteClass::Straight));

    world.tick();
    assert!(world.try_spawn(Direction::North, RouteClass::Straight));
    assert_eq!(world.vehicle_count(), 2);
}

#[test]
fn test_spawn_refused_at_vehicle_limit() {
    let config = SimConfig {
        max_vehicles: 2,
        ..SimConfig::default()
    };
    let mut world = SimWorld::with_config(config, None).expect("valid config");

    assert!(world.try_spawn(Direction::North, RouteClass::Straight));
    assert!(world.try_spawn(Direction::South, RouteClass::Straight));
    assert_eq!(
        world.spawn(Direction::East, RouteClass::Straight),
        Err(SpawnRejection::AtCapacity)
    );
    assert_eq!(world.vehicle_count(), 2);
}

#[test]
fn test_invalid_config_rejected() {
    let zero_vehicles = SimConfig {
        max_vehicles: 0,
        ..SimConfig::default()
    };
    let err = SimWorld::with_config(zero_vehicles, None).err().expect("should fail");
    assert!(err.to_string().contains("max vehicles"));

    let zero_duration = SimConfig {
        timing: SignalTiming {
            base_duration: 0,
            ..SignalTiming::default()
        },
        ..SimConfig::default()
    };
    assert!(SimWorld::with_config(zero_duration, None).is_err());

    let short_threshold = SimConfig {
        timing: SignalTiming {
            starvation_threshold: 50,
            ..SignalTiming::default()
        },
        ..SimConfig::default()
    };
    assert!(SimWorld::with_config(short_threshold, None).is_err());

    let negative_clearance = SimConfig {
        spawn_clearance: -1,
        ..SimConfig::default()
    };
    assert!(SimWorld::with_config(negative_clearance, Some(1)).is_err());
}

#[test]
fn test_south_left_turn_scenario() {
    let mut world = SimWorld::new();
    let id = world
        .spawn(Direction::South, RouteClass::TurnLeft)
        .expect("empty lane should admit a vehicle");

    let mut turned_at = None;
    for tick in 1..=3000u32 {
        world.tick();
        let Some(vehicle) = world.get_vehicle(id) else {
            break;
        };

        if !vehicle.has_turned() {
            assert_eq!(vehicle.direction(), Direction::South);
            continue;
        }
        if turned_at.is_none() {
            assert_eq!(vehicle.position(), Position::new(410, 310));
            turned_at = Some(tick);
        }
        assert_eq!(vehicle.direction(), Direction::West);
        assert_eq!(vehicle.position().y, 310);
    }

    assert!(turned_at.is_some(), "vehicle never turned");
    assert!(world.get_vehicle(id).is_none(), "vehicle never left");
    assert_eq!(world.stats().turns, 1);
    assert_eq!(world.stats().exited, 1);
}

#[test]
fn test_vehicle_waits_at_red_light() {
    let config = SimConfig {
        timing: SignalTiming {
            base_duration: 1000,
            starvation_threshold: 1000,
            ..SignalTiming::default()
        },
        ..SimConfig::default()
    };
    let mut world = SimWorld::with_config(config, None).expect("valid config");
    let id = world
        .spawn(Direction::West, RouteClass::Straight)
        .expect("empty lane should admit a vehicle");

    for _ in 0..300 {
        world.tick();
    }

    let vehicle = world.get_vehicle(id).expect("vehicle should still be queued");
    assert_eq!(vehicle.position(), Position::new(470, 310));
    assert!(!vehicle.gate_open());
    assert_eq!(world.scheduler().current_phase(), Direction::East);
    assert_eq!(world.scheduler().demand(Direction::West), 1);
}

#[test]
fn test_straight_vehicle_crosses_and_exits() {
    let mut world = SimWorld::new();
    assert!(world.try_spawn(Direction::East, RouteClass::Straight));

    for _ in 0..3000 {
        world.tick();
        if world.vehicle_count() == 0 {
            break;
        }
    }

    assert_eq!(world.vehicle_count(), 0);
    assert_eq!(world.stats().spawned, 1);
    assert_eq!(world.stats().exited, 1);
    assert_eq!(world.stats().turns, 0);
}

#[test]
fn test_snapshots_ordered_by_spawn() {
    let mut world = SimWorld::new();
    let order = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];
    for origin in order {
        assert!(world.try_spawn(origin, RouteClass::Straight));
    }
    world.tick();

    let snapshots = world.snapshots();
    assert_eq!(snapshots.len(), 4);
    for (snapshot, origin) in snapshots.iter().zip(order) {
        assert_eq!(snapshot.direction, origin);
    }
    let seqs: Vec<u64> = snapshots
        .iter()
        .filter_map(|snapshot| world.get_vehicle(snapshot.id))
        .map(|vehicle| vehicle.seq())
        .collect();
    assert!(seqs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let mut first = SimWorld::new_with_seed(7);
    let mut second = SimWorld::new_with_seed(7);

    for _ in 0..1500 {
        first.random_arrival(0.1);
        first.tick();
        second.random_arrival(0.1);
        second.tick();
    }

    assert_eq!(first.stats(), second.stats());
    assert_eq!(first.snapshots(), second.snapshots());
    assert!(first.stats().spawned > 0);
}

#[test]
fn test_signal_invariants_under_random_traffic() {
    let mut world = SimWorld::new_with_seed(42);
    let bound = starvation_bound(&world.config().timing);
    let mut served: HashMap<Direction, u32> = HashMap::new();

    for _ in 0..8000 {
        world.random_arrival(0.1);

        let clear_before = is_clear(world.vehicles());
        let phase_before = world.scheduler().current_phase();
        let forced_before = world.scheduler().forced_switches();

        world.tick();
        let scheduler = world.scheduler();

        let granted: Vec<Direction> = Direction::ALL
            .into_iter()
            .filter(|direction| scheduler.is_granted(*direction))
            .collect();
        assert!(granted.len() <= 1, "multiple grants: {:?}", granted);
        for direction in granted {
            *served.entry(direction).or_default() += 1;
        }

        if scheduler.current_phase() != phase_before {
            assert!(
                clear_before || scheduler.forced_switches() > forced_before,
                "phase changed to {:?} with an occupied intersection",
                scheduler.current_phase()
            );
        }

        for direction in Direction::ALL {
            assert!(
                scheduler.starvation_ticks(direction) <= bound,
                "{:?} waited {} ticks",
                direction,
                scheduler.starvation_ticks(direction)
            );
        }

        for vehicle in world.vehicles() {
            if vehicle.has_turned() {
                assert_eq!(
                    Some(vehicle.direction()),
                    expected_turn(vehicle.origin(), vehicle.route())
                );
            } else {
                assert_eq!(vehicle.direction(), vehicle.origin());
            }
        }
    }

    assert!(world.stats().spawned > 0);
    assert!(world.stats().exited > 0);
    assert!(world.stats().turns > 0);
    for direction in Direction::ALL {
        assert!(served.get(&direction).copied().unwrap_or(0) > 0, "{:?} never served", direction);
    }
}

#[test]
fn test_moving_vehicles_keep_safe_distance() {
    let mut world = SimWorld::new_with_seed(3);
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..6000 {
        if rng.random_bool(0.15) {
            let origin = Direction::ALL[rng.random_range(0..Direction::ALL.len())];
            world.try_spawn(origin, RouteClass::Straight);
        }

        let before: HashMap<VehicleId, Position> = world
            .vehicles()
            .map(|vehicle| (vehicle.id(), vehicle.position()))
            .collect();

        world.tick();

        let vehicles: Vec<_> = world.vehicles().collect();
        for mover in &vehicles {
            if before.get(&mover.id()) == Some(&mover.position()) {
                continue;
            }
            let direction = mover.direction();
            for other in &vehicles {
                if other.id() == mover.id()
                    || other.direction() != direction
                    || direction.lateral(other.position()) != direction.lateral(mover.position())
                {
                    continue;
                }
                let gap = direction.forward_gap(mover.position(), other.position());
                assert!(
                    gap <= 0 || gap > SAFE_FOLLOWING_DISTANCE,
                    "vehicle moved to within {} pixels of the one ahead",
                    gap
                );
                assert!(gap.abs() >= VEHICLE_LENGTH);
            }
        }
    }

    assert_eq!(world.stats().invariant_violations, 0);
    assert!(world.stats().exited > 0);
}
