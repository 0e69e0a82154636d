//! Boarding policies that fill the door queues
//!
//! A policy decides the order in which seats board. Each door serves one
//! section of rows; the boarding order for a section is built first-boarder
//! first and then reversed into the queue, because engines pop queues from
//! the tail.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use rand::seq::{index, SliceRandom};
use rand::Rng;

use super::config::DoorConfig;
use super::types::{PassengerRecord, Seat};

/// Share of passengers that ignore a back-to-front call and board whenever
const BACK_TO_FRONT_STRAGGLERS: f64 = 0.15;

const FRONT_TO_BACK_BLOCKS: usize = 4;
const BACK_TO_FRONT_BLOCKS: usize = 6;

const LEFT_WINDOW: usize = 0;
const LEFT_MIDDLE: usize = 1;
const LEFT_AISLE: usize = 2;
const RIGHT_AISLE: usize = 4;
const RIGHT_MIDDLE: usize = 5;
const RIGHT_WINDOW: usize = 6;

/// Door queues handed to the engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoorQueues {
    /// Queue of the front door (the only door in single-door runs)
    pub front: Vec<PassengerRecord>,
    /// Queue of the rear door, empty in single-door runs
    pub rear: Vec<PassengerRecord>,
    /// Reshuffle before load-factor thinning
    pub fully_random: bool,
}

impl DoorQueues {
    pub fn single(front: Vec<PassengerRecord>, fully_random: bool) -> Self {
        Self {
            front,
            rear: Vec::new(),
            fully_random,
        }
    }

    pub fn dual(front: Vec<PassengerRecord>, rear: Vec<PassengerRecord>, fully_random: bool) -> Self {
        Self {
            front,
            rear,
            fully_random,
        }
    }

    pub fn len(&self) -> usize {
        self.front.len() + self.rear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.front.is_empty() && self.rear.is_empty()
    }
}

/// Last seat row served by the front door in dual-door runs
pub fn split_row(seat_rows: usize) -> usize {
    seat_rows.saturating_sub(1) / 2
}

/// Keep `floor(len * load_factor)` entries, chosen at random, keeping queue order
pub fn thin_queue<R: Rng + ?Sized>(
    mut queue: Vec<PassengerRecord>,
    load_factor: f64,
    reshuffle: bool,
    rng: &mut R,
) -> Vec<PassengerRecord> {
    if reshuffle {
        queue.shuffle(rng);
    }
    let keep = ((queue.len() as f64) * load_factor).floor() as usize;
    let keep = keep.min(queue.len());

    let mut kept = index::sample(rng, queue.len(), keep).into_vec();
    kept.sort_unstable();
    kept.into_iter().map(|i| queue[i]).collect()
}

/// The available boarding policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardingPolicy {
    Random,
    FrontToBack,
    FrontToBackGroups,
    BackToFront,
    BackToFrontGroups,
    WindowMiddleAisle,
    SteffenPerfect,
    SteffenModified,
}

impl BoardingPolicy {
    pub const ALL: [BoardingPolicy; 8] = [
        BoardingPolicy::Random,
        BoardingPolicy::FrontToBack,
        BoardingPolicy::FrontToBackGroups,
        BoardingPolicy::BackToFront,
        BoardingPolicy::BackToFrontGroups,
        BoardingPolicy::WindowMiddleAisle,
        BoardingPolicy::SteffenPerfect,
        BoardingPolicy::SteffenModified,
    ];

    /// Name accepted on the command line
    pub fn cli_name(self) -> &'static str {
        match self {
            BoardingPolicy::Random => "random",
            BoardingPolicy::FrontToBack => "front-to-back",
            BoardingPolicy::FrontToBackGroups => "front-to-back-groups",
            BoardingPolicy::BackToFront => "back-to-front",
            BoardingPolicy::BackToFrontGroups => "back-to-front-groups",
            BoardingPolicy::WindowMiddleAisle => "window-middle-aisle",
            BoardingPolicy::SteffenPerfect => "steffen-perfect",
            BoardingPolicy::SteffenModified => "steffen-modified",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BoardingPolicy::Random => "Random",
            BoardingPolicy::FrontToBack => "Front-to-back",
            BoardingPolicy::FrontToBackGroups => "Front-to-back (4 groups)",
            BoardingPolicy::BackToFront => "Back-to-front",
            BoardingPolicy::BackToFrontGroups => "Back-to-front (6 groups)",
            BoardingPolicy::WindowMiddleAisle => "Window-Middle-Aisle",
            BoardingPolicy::SteffenPerfect => "Steffen Perfect",
            BoardingPolicy::SteffenModified => "Steffen Modified",
        }
    }

    pub fn is_fully_random(self) -> bool {
        self == BoardingPolicy::Random
    }

    /// Generate the door queues for a cabin
    pub fn build_queues<R: Rng + ?Sized>(
        self,
        seat_rows: usize,
        doors: DoorConfig,
        rng: &mut R,
    ) -> DoorQueues {
        let fully_random = self.is_fully_random();
        match doors {
            DoorConfig::Single => {
                let rows: Vec<usize> = (0..seat_rows).rev().collect();
                DoorQueues::single(self.queue_for_section(&rows, rng), fully_random)
            }
            DoorConfig::Dual => {
                let split = split_row(seat_rows);
                let front_rows: Vec<usize> = (0..=split).rev().filter(|r| *r < seat_rows).collect();
                let rear_rows: Vec<usize> = (split + 1..seat_rows).collect();
                DoorQueues::dual(
                    self.queue_for_section(&front_rows, rng),
                    self.queue_for_section(&rear_rows, rng),
                    fully_random,
                )
            }
        }
    }

    /// `far_to_near` lists the section's rows starting farthest from its door
    fn queue_for_section<R: Rng + ?Sized>(self, far_to_near: &[usize], rng: &mut R) -> Vec<PassengerRecord> {
        let mut order = match self {
            BoardingPolicy::Random => {
                let mut seats = seats_in_rows(far_to_near, &ALL_COLUMNS, 1);
                seats.shuffle(rng);
                seats
            }
            BoardingPolicy::FrontToBack => {
                let mut order = Vec::new();
                for (i, row) in far_to_near.iter().rev().enumerate() {
                    let mut seats = seats_in_rows(&[*row], &ALL_COLUMNS, i as u32 + 1);
                    seats.shuffle(rng);
                    order.extend(seats);
                }
                order
            }
            BoardingPolicy::FrontToBackGroups => {
                let near_to_far: Vec<usize> = far_to_near.iter().rev().copied().collect();
                blocks(&near_to_far, FRONT_TO_BACK_BLOCKS, rng)
            }
            BoardingPolicy::BackToFront => {
                let order = seats_in_rows(far_to_near, &ALL_COLUMNS, 1);
                reinsert_stragglers(order, BACK_TO_FRONT_STRAGGLERS, rng)
            }
            BoardingPolicy::BackToFrontGroups => blocks(far_to_near, BACK_TO_FRONT_BLOCKS, rng),
            BoardingPolicy::WindowMiddleAisle => {
                let mut order = Vec::new();
                let kinds = [
                    [LEFT_WINDOW, RIGHT_WINDOW],
                    [LEFT_MIDDLE, RIGHT_MIDDLE],
                    [LEFT_AISLE, RIGHT_AISLE],
                ];
                for (i, columns) in kinds.iter().enumerate() {
                    let mut seats = seats_in_rows(far_to_near, columns, i as u32 + 1);
                    seats.shuffle(rng);
                    order.extend(seats);
                }
                order
            }
            BoardingPolicy::SteffenPerfect => {
                let mut order = Vec::new();
                let mut group = 1;
                let kinds = [
                    (RIGHT_WINDOW, LEFT_WINDOW),
                    (RIGHT_MIDDLE, LEFT_MIDDLE),
                    (RIGHT_AISLE, LEFT_AISLE),
                ];
                for (right, left) in kinds {
                    for parity in 0..2 {
                        for column in [right, left] {
                            let rows = alternate_rows(far_to_near, parity);
                            order.extend(seats_in_rows(&rows, &[column], group));
                            group += 1;
                        }
                    }
                }
                order
            }
            BoardingPolicy::SteffenModified => {
                let mut order = Vec::new();
                let mut group = 1;
                for parity in 0..2 {
                    for side in [RIGHT_SIDE, LEFT_SIDE] {
                        let rows = alternate_rows(far_to_near, parity);
                        let mut seats = seats_in_rows(&rows, &side, group);
                        seats.shuffle(rng);
                        order.extend(seats);
                        group += 1;
                    }
                }
                order
            }
        };

        // First boarder last, so popping the tail yields boarding order
        order.reverse();
        order
    }
}

const ALL_COLUMNS: [usize; 6] = [
    LEFT_WINDOW,
    LEFT_MIDDLE,
    LEFT_AISLE,
    RIGHT_AISLE,
    RIGHT_MIDDLE,
    RIGHT_WINDOW,
];
const RIGHT_SIDE: [usize; 3] = [RIGHT_WINDOW, RIGHT_MIDDLE, RIGHT_AISLE];
const LEFT_SIDE: [usize; 3] = [LEFT_WINDOW, LEFT_MIDDLE, LEFT_AISLE];

fn seats_in_rows(rows: &[usize], columns: &[usize], group: u32) -> Vec<PassengerRecord> {
    rows.iter()
        .flat_map(|row| {
            columns
                .iter()
                .map(move |column| PassengerRecord::new(Seat::new(*row, *column), group))
        })
        .collect()
}

/// Every other row, starting at index `parity`
fn alternate_rows(rows: &[usize], parity: usize) -> Vec<usize> {
    rows.iter().skip(parity).step_by(2).copied().collect()
}

/// Split `rows` into `count` consecutive blocks, shuffling seats within each
fn blocks<R: Rng + ?Sized>(rows: &[usize], count: usize, rng: &mut R) -> Vec<PassengerRecord> {
    if rows.is_empty() {
        return Vec::new();
    }
    let chunk = rows.len().div_ceil(count);
    let mut order = Vec::new();
    for (i, block) in rows.chunks(chunk).enumerate() {
        let mut seats = seats_in_rows(block, &ALL_COLUMNS, i as u32 + 1);
        seats.shuffle(rng);
        order.extend(seats);
    }
    order
}

/// Pull a share of passengers out of `order` and put them back at random places
fn reinsert_stragglers<R: Rng + ?Sized>(
    mut order: Vec<PassengerRecord>,
    share: f64,
    rng: &mut R,
) -> Vec<PassengerRecord> {
    let count = ((order.len() as f64) * share).floor() as usize;
    if count == 0 {
        return order;
    }

    let mut picked = index::sample(rng, order.len(), count).into_vec();
    picked.sort_unstable_by(|a, b| b.cmp(a));
    let mut stragglers: Vec<PassengerRecord> = picked.into_iter().map(|i| order.remove(i)).collect();
    stragglers.shuffle(rng);

    for record in stragglers {
        let at = rng.random_range(0..=order.len());
        order.insert(at, record);
    }
    order
}

impl FromStr for BoardingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        for policy in BoardingPolicy::ALL {
            if policy.cli_name() == wanted || policy.name().to_ascii_lowercase() == wanted {
                return Ok(policy);
            }
        }
        bail!(
            "unknown boarding policy '{}' (try --list-policies)",
            s.trim()
        )
    }
}

impl fmt::Display for BoardingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
