//! Boarding engine validation tests
//!
//! Exercises the public API: policies, queue validation and full runs.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::SeedableRng;

use boarding_sim::simulation::{
    split_row, thin_queue, BaggagePolicy, BoardingConfig, BoardingPolicy, Door, DoorConfig,
    DoorQueues, PassengerRecord, Seat, SimPlane, DEFAULT_MAX_TICKS,
};
use boarding_sim::stats::{run_batch, BatchSummary};

fn record(row: usize, column: usize) -> PassengerRecord {
    PassengerRecord::new(Seat::new(row, column), 1)
}

fn all_seats(queues: &DoorQueues) -> Vec<Seat> {
    queues
        .front
        .iter()
        .chain(queues.rear.iter())
        .map(|r| r.seat)
        .collect()
}

#[test]
fn test_every_policy_assigns_every_seat_once() {
    let mut rng = StdRng::seed_from_u64(5);
    for policy in BoardingPolicy::ALL {
        for doors in [DoorConfig::Single, DoorConfig::Dual] {
            let queues = policy.build_queues(29, doors, &mut rng);
            let seats = all_seats(&queues);
            let unique: HashSet<Seat> = seats.iter().copied().collect();
            assert_eq!(seats.len(), 29 * 6, "{} with {}", policy, doors);
            assert_eq!(queues.len(), seats.len());
            assert_eq!(unique.len(), seats.len(), "{} repeats a seat", policy);
            if doors == DoorConfig::Single {
                assert!(queues.rear.is_empty());
            }
        }
    }
}

#[test]
fn test_dual_door_queues_split_rows() {
    let mut rng = StdRng::seed_from_u64(9);
    let split = split_row(29);
    assert_eq!(split, 14);
    for policy in BoardingPolicy::ALL {
        let queues = policy.build_queues(29, DoorConfig::Dual, &mut rng);
        assert!(queues.front.iter().all(|r| r.seat.row <= split), "{}", policy);
        assert!(queues.rear.iter().all(|r| r.seat.row > split), "{}", policy);
    }
}

#[test]
fn test_front_to_back_boards_nearest_rows_first() {
    let mut rng = StdRng::seed_from_u64(1);
    let queues = BoardingPolicy::FrontToBack.build_queues(5, DoorConfig::Single, &mut rng);
    // The queue is consumed from the tail
    let boarding_rows: Vec<usize> = queues.front.iter().rev().map(|r| r.seat.row).collect();
    let mut sorted = boarding_rows.clone();
    sorted.sort();
    assert_eq!(boarding_rows, sorted);
}

#[test]
fn test_window_middle_aisle_order() {
    let mut rng = StdRng::seed_from_u64(2);
    let queues = BoardingPolicy::WindowMiddleAisle.build_queues(10, DoorConfig::Single, &mut rng);
    let boarding: Vec<Seat> = queues.front.iter().rev().map(|r| r.seat).collect();
    assert!(boarding[..20].iter().all(|s| s.is_window()));
    assert!(boarding[20..40].iter().all(|s| !s.is_window() && !s.is_aisle()));
    assert!(boarding[40..].iter().all(|s| s.is_aisle()));
}

#[test]
fn test_steffen_perfect_starts_at_the_back_window() {
    let mut rng = StdRng::seed_from_u64(3);
    let queues = BoardingPolicy::SteffenPerfect.build_queues(10, DoorConfig::Single, &mut rng);
    let boarding: Vec<Seat> = queues.front.iter().rev().map(|r| r.seat).collect();
    assert_eq!(boarding[0], Seat::new(9, 6));
    assert_eq!(boarding[1], Seat::new(7, 6));
    assert_eq!(boarding[5], Seat::new(9, 0));
    assert_eq!(*boarding.last().unwrap(), Seat::new(0, 2));
}

#[test]
fn test_thinning_keeps_order() {
    let mut rng = StdRng::seed_from_u64(4);
    let queue: Vec<PassengerRecord> = (0..10).map(|row| record(row, 0)).collect();
    let thinned = thin_queue(queue, 0.8, false, &mut rng);
    assert_eq!(thinned.len(), 8);
    assert!(thinned.windows(2).all(|w| w[0].seat.row < w[1].seat.row));

    let queue: Vec<PassengerRecord> = (0..7).map(|row| record(row, 0)).collect();
    assert_eq!(thin_queue(queue, 0.5, true, &mut rng).len(), 3);
}

#[test]
fn test_policy_names_parse() {
    for policy in BoardingPolicy::ALL {
        assert_eq!(policy.cli_name().parse::<BoardingPolicy>().unwrap(), policy);
    }
    assert!("sideways".parse::<BoardingPolicy>().is_err());
    assert_eq!("2".parse::<DoorConfig>().unwrap(), DoorConfig::Dual);
    assert_eq!("single".parse::<DoorConfig>().unwrap(), DoorConfig::Single);
    assert!("3".parse::<DoorConfig>().is_err());
    assert_eq!("4".parse::<BaggagePolicy>().unwrap(), BaggagePolicy::Fixed(4.0));
    assert_eq!(
        "normal".parse::<BaggagePolicy>().unwrap(),
        BaggagePolicy::default()
    );
    assert!("-1".parse::<BaggagePolicy>().is_err());
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let queues = || DoorQueues::single(vec![record(0, 0)], false);

    let zero_rows = BoardingConfig {
        seat_rows: 0,
        ..BoardingConfig::default()
    };
    assert!(SimPlane::new(zero_rows, queues()).is_err());

    let empty_load = BoardingConfig {
        load_factor: 0.0,
        ..BoardingConfig::default()
    };
    assert!(SimPlane::new(empty_load, queues()).is_err());

    let always_hold = BoardingConfig {
        hold_probability: 1.0,
        ..BoardingConfig::default()
    };
    assert!(SimPlane::new(always_hold, queues()).is_err());

    let no_arrivals = BoardingConfig {
        arrival_rate: 0.0,
        ..BoardingConfig::default()
    };
    assert!(SimPlane::new(no_arrivals, queues()).is_err());
}

#[test]
fn test_invalid_queues_are_rejected() {
    let config = BoardingConfig::default();

    let duplicate = DoorQueues::single(vec![record(0, 0), record(0, 0)], false);
    assert!(SimPlane::new(config.clone(), duplicate).is_err());

    let corridor = DoorQueues::single(vec![record(0, 3)], false);
    assert!(SimPlane::new(config.clone(), corridor).is_err());

    let beyond = DoorQueues::single(vec![record(29, 0)], false);
    assert!(SimPlane::new(config.clone(), beyond).is_err());

    let rear_on_single = DoorQueues::dual(vec![record(0, 0)], vec![record(20, 0)], false);
    assert!(SimPlane::new(config.clone(), rear_on_single).is_err());

    let dual = BoardingConfig {
        doors: DoorConfig::Dual,
        ..config
    };
    let shared_row = DoorQueues::dual(vec![record(10, 0)], vec![record(10, 6)], false);
    assert!(SimPlane::new(dual.clone(), shared_row).is_err());

    // Sections that cross would send both doors' passengers through each other
    let crossing = BoardingConfig {
        seat_rows: 10,
        ..dual.clone()
    };
    let crossed = DoorQueues::dual(vec![record(8, 0)], vec![record(1, 0)], false);
    let err = SimPlane::new(crossing.clone(), crossed).err().unwrap();
    assert!(err.to_string().contains("rear-door rows start at row 2"), "{}", err);

    let split = DoorQueues::dual(vec![record(4, 0)], vec![record(5, 6)], false);
    assert!(SimPlane::new(crossing, split).is_ok());

    assert!(DoorQueues::default().is_empty());
    assert!(SimPlane::new(dual, DoorQueues::default()).is_ok());
}

#[test]
fn test_every_policy_completes_single_door() {
    for policy in BoardingPolicy::ALL {
        let config = BoardingConfig {
            seed: Some(21),
            ..BoardingConfig::default()
        };
        let mut plane = SimPlane::from_policy(config, policy).unwrap();
        assert_eq!(plane.total_passengers(), 139, "{}", policy);

        let ticks = plane.run_to_completion(DEFAULT_MAX_TICKS).unwrap();
        assert!(ticks > 0);
        assert!(!plane.is_running());
        assert_eq!(plane.seated_count(), plane.total_passengers(), "{}", policy);
        assert_eq!(plane.queued_count(), 0);
    }
}

#[test]
fn test_full_cabin_batches_finish_with_shuffle() {
    for policy in BoardingPolicy::ALL {
        for doors in [DoorConfig::Single, DoorConfig::Dual] {
            let config = BoardingConfig {
                doors,
                seed: Some(1),
                ..BoardingConfig::default()
            };
            assert!(config.shuffle_enabled);
            let outcome = run_batch(&config, policy, 10, DEFAULT_MAX_TICKS).unwrap();
            assert_eq!(outcome.stalled, 0, "{} with {} stalled", policy, doors);
            assert_eq!(outcome.ticks.len(), 10);
        }
    }
}

#[test]
fn test_dual_door_passengers_stay_on_their_side() {
    let split = split_row(29);
    for policy in BoardingPolicy::ALL {
        let config = BoardingConfig {
            doors: DoorConfig::Dual,
            seed: Some(8),
            ..BoardingConfig::default()
        };
        let mut plane = SimPlane::from_policy(config, policy).unwrap();
        plane.run_to_completion(DEFAULT_MAX_TICKS).unwrap();

        assert_eq!(plane.seated_count(), plane.total_passengers());
        for passenger in plane.passengers().values() {
            match passenger.boarded_through {
                Some(Door::Front) => assert!(passenger.seat.row <= split),
                Some(Door::Rear) => assert!(passenger.seat.row > split),
                None => panic!("passenger {} never boarded", passenger.id.0),
            }
        }
    }
}

#[test]
fn test_seeded_runs_repeat() {
    let config = BoardingConfig {
        seat_rows: 12,
        seed: Some(99),
        ..BoardingConfig::default()
    };
    let first = SimPlane::from_policy(config.clone(), BoardingPolicy::BackToFront)
        .unwrap()
        .run_to_completion(DEFAULT_MAX_TICKS)
        .unwrap();
    let second = SimPlane::from_policy(config, BoardingPolicy::BackToFront)
        .unwrap()
        .run_to_completion(DEFAULT_MAX_TICKS)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_batch_summary() {
    let config = BoardingConfig {
        seat_rows: 8,
        seed: Some(1),
        ..BoardingConfig::default()
    };
    let outcome = run_batch(&config, BoardingPolicy::SteffenModified, 10, DEFAULT_MAX_TICKS).unwrap();
    assert_eq!(outcome.ticks.len() + outcome.stalled, 10);
    assert_eq!(outcome.stalled, 0);

    let summary = BatchSummary::from_outcome(&outcome).unwrap();
    assert!(summary.min <= summary.q1);
    assert!(summary.q1 <= summary.median);
    assert!(summary.median <= summary.q3);
    assert!(summary.q3 <= summary.max);
    assert!(summary.mean >= summary.min && summary.mean <= summary.max);
}
