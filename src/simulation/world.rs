//! Boarding engine that ties everything together
//!
//! Owns the cabin grid, the door queues, the scheduler and the random source.
//! Each call to [`SimPlane::step`] advances the simulation by one tick.

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Poisson};
use std::collections::{HashMap, HashSet};

use super::cell::{CellKind, Grid, Occupancy};
use super::config::{BoardingConfig, DoorConfig, STALL_TICK_LIMIT};
use super::passenger::{Passenger, PassengerState};
use super::policy::{thin_queue, BoardingPolicy, DoorQueues};
use super::scheduler::ActivationScheduler;
use super::types::{Direction, Door, PassengerId, PassengerRecord, CORRIDOR_Y};

/// The boarding simulation
pub struct SimPlane {
    pub(crate) grid: Grid,

    /// Every passenger that has been admitted, seated or not
    pub(crate) passengers: HashMap<PassengerId, Passenger>,

    /// Waiting at the front door, next to board at the tail
    pub(crate) front_queue: Vec<Passenger>,

    /// Waiting at the rear door (dual-door runs only)
    pub(crate) rear_queue: Vec<Passenger>,

    pub(crate) scheduler: ActivationScheduler,
    pub(crate) config: BoardingConfig,
    pub(crate) rng: StdRng,

    /// Arrival draw for dual-door runs
    arrivals: Option<Poisson<f64>>,

    pub(crate) running: bool,
    total_passengers: usize,

    /// Consecutive ticks in which nothing moved and nobody boarded
    pub(crate) stalled_ticks: u64,
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

impl SimPlane {
    /// Build an engine from ready-made door queues
    pub fn new(config: BoardingConfig, queues: DoorQueues) -> Result<Self> {
        config.validate()?;
        let rng = seeded_rng(config.seed);
        Self::with_rng(config, queues, rng)
    }

    /// Build an engine whose door queues come from a boarding policy
    pub fn from_policy(config: BoardingConfig, policy: BoardingPolicy) -> Result<Self> {
        config.validate()?;
        let mut rng = seeded_rng(config.seed);
        let queues = policy.build_queues(config.seat_rows, config.doors, &mut rng);
        Self::with_rng(config, queues, rng)
    }

    fn with_rng(config: BoardingConfig, queues: DoorQueues, mut rng: StdRng) -> Result<Self> {
        validate_queues(&config, &queues)?;
        debug!(
            "Thinning {} queued seats to load factor {}",
            queues.len(),
            config.load_factor
        );

        let grid = Grid::new(config.seat_rows)?;
        let arrivals = match config.doors {
            DoorConfig::Single => None,
            DoorConfig::Dual => Some(
                Poisson::new(config.arrival_rate)
                    .map_err(|e| anyhow::anyhow!("invalid arrival rate: {}", e))?,
            ),
        };

        let front = thin_queue(queues.front, config.load_factor, queues.fully_random, &mut rng);
        let rear = thin_queue(queues.rear, config.load_factor, queues.fully_random, &mut rng);

        // Ids follow queue order, front door first
        let front_queue = board_queue(front, 0, &config, &mut rng)?;
        let rear_queue = board_queue(rear, front_queue.len(), &config, &mut rng)?;
        let total_passengers = front_queue.len() + rear_queue.len();

        debug!(
            "Boarding {} passengers over {} rows through {}",
            total_passengers, config.seat_rows, config.doors
        );

        Ok(Self {
            grid,
            passengers: HashMap::new(),
            front_queue,
            rear_queue,
            scheduler: ActivationScheduler::new(),
            config,
            rng,
            arrivals,
            running: total_passengers > 0,
            total_passengers,
            stalled_ticks: 0,
        })
    }

    /// Advance the simulation by one tick
    pub fn step(&mut self) -> Result<()> {
        if !self.running {
            return Ok(());
        }

        let mut progressed =
            self.scheduler
                .step(&mut self.passengers, &mut self.grid, &mut self.rng)?;

        progressed |= self.try_admit(Door::Front)?;
        if self.config.doors == DoorConfig::Dual {
            progressed |= self.try_admit(Door::Rear)?;
        }

        if progressed {
            self.stalled_ticks = 0;
        } else {
            self.stalled_ticks += 1;
        }

        if self.scheduler.is_empty() && self.front_queue.is_empty() && self.rear_queue.is_empty() {
            self.running = false;
            debug!(
                "All {} passengers seated after {} ticks",
                self.total_passengers,
                self.scheduler.ticks()
            );
        }
        Ok(())
    }

    /// Let the next passenger in through `door` if the door cell is free
    ///
    /// Returns whether somebody boarded.
    fn try_admit(&mut self, door: Door) -> Result<bool> {
        if self.grid.refresh_door(door) != Occupancy::Free {
            return Ok(false);
        }

        let queue_empty = match door {
            Door::Front => self.front_queue.is_empty(),
            Door::Rear => self.rear_queue.is_empty(),
        };
        if queue_empty || !self.arrival(door) {
            return Ok(false);
        }

        let queue = match door {
            Door::Front => &mut self.front_queue,
            Door::Rear => &mut self.rear_queue,
        };
        let mut passenger = queue.pop().context("Door queue is empty")?;

        let pos = self.grid.door(door);
        self.grid.place(passenger.id, pos)?;
        passenger.admit(door, pos);
        debug!(
            "Passenger {} for seat {} boards through the {:?} door",
            passenger.id.0, passenger.seat, door
        );

        self.scheduler.add(passenger.id);
        self.passengers.insert(passenger.id, passenger);
        Ok(true)
    }

    fn arrival(&mut self, door: Door) -> bool {
        match &self.arrivals {
            Some(poisson) => poisson.sample(&mut self.rng) >= 1.0,
            None => {
                debug_assert_eq!(door, Door::Front);
                self.rng.random::<f64>() >= self.config.hold_probability
            }
        }
    }

    /// Step until every passenger is seated and return the tick count
    pub fn run_to_completion(&mut self, max_ticks: u64) -> Result<u64> {
        while self.running {
            if self.ticks() >= max_ticks {
                bail!(
                    "boarding did not finish within {} ticks ({} of {} passengers seated)",
                    max_ticks,
                    self.seated_count(),
                    self.total_passengers
                );
            }
            self.step()?;
            if self.stalled_ticks >= STALL_TICK_LIMIT {
                warn!(
                    "Boarding gridlocked at tick {} with {} passengers still moving",
                    self.ticks(),
                    self.scheduler.agent_count()
                );
                bail!(
                    "no passenger moved for {} ticks ({} of {} passengers seated)",
                    STALL_TICK_LIMIT,
                    self.seated_count(),
                    self.total_passengers
                );
            }
        }
        Ok(self.ticks())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn passengers(&self) -> &HashMap<PassengerId, Passenger> {
        &self.passengers
    }

    pub fn passenger(&self, id: PassengerId) -> Option<&Passenger> {
        self.passengers.get(&id)
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &BoardingConfig {
        &self.config
    }

    pub fn queued_count(&self) -> usize {
        self.front_queue.len() + self.rear_queue.len()
    }

    pub fn admitted_count(&self) -> usize {
        self.passengers.len()
    }

    pub fn seated_count(&self) -> usize {
        self.passengers.values().filter(|p| p.is_seated()).count()
    }

    pub fn total_passengers(&self) -> usize {
        self.total_passengers
    }

    pub fn shuffles_triggered(&self) -> usize {
        self.scheduler.shuffles_triggered()
    }

    pub fn stalled_ticks(&self) -> u64 {
        self.stalled_ticks
    }

    /// Print a summary of the simulation state
    pub fn print_summary(&self) {
        println!("=== Boarding Simulation Summary ===");
        println!("Ticks: {}", self.ticks());
        println!(
            "Doors: {}, rows: {}, shuffle: {}",
            self.config.doors,
            self.grid.seat_rows(),
            if self.config.shuffle_enabled { "on" } else { "off" }
        );
        println!("Passengers: {}", self.total_passengers);
        println!("Seated: {}", self.seated_count());
        println!("In cabin: {}", self.scheduler.agent_count());
        println!("Queued: {}", self.queued_count());
        println!("Shuffles: {}", self.shuffles_triggered());
        println!();

        let mut states: Vec<(PassengerState, usize)> = Vec::new();
        for passenger in self.passengers.values() {
            match states.iter_mut().find(|(s, _)| *s == passenger.state) {
                Some((_, count)) => *count += 1,
                None => states.push((passenger.state, 1)),
            }
        }
        if !states.is_empty() {
            println!("--- Passenger States ---");
            for (state, count) in states {
                println!("  {:?}: {}", state, count);
            }
            println!();
        }
    }

    /// Render the cabin as text, front door on the left
    pub fn draw_cabin(&self) -> String {
        let mut lines = Vec::with_capacity(self.grid.height() + 2);
        lines.push(format!(
            "tick {}  seated {}/{}  queued {}",
            self.ticks(),
            self.seated_count(),
            self.total_passengers,
            self.queued_count()
        ));

        let mut rows = vec![vec![' '; self.grid.width()]; self.grid.height()];
        for (pos, cell) in self.grid.cells() {
            rows[pos.y][pos.x] = match cell.kind {
                CellKind::Wall => '#',
                CellKind::Seat => '.',
                CellKind::Corridor if cell.shuffle_in_progress => ':',
                CellKind::Corridor => ' ',
            };
        }
        for door in [Door::Front, Door::Rear] {
            let pos = self.grid.door(door);
            rows[pos.y][pos.x] = '=';
        }

        for passenger in self.passengers.values() {
            let Some(pos) = passenger.position else {
                continue;
            };
            rows[pos.y][pos.x] = match passenger.state {
                PassengerState::Inactive => '?',
                PassengerState::Going if pos.y == CORRIDOR_Y => match passenger.direction {
                    Direction::Aft => '>',
                    Direction::Fore => '<',
                },
                PassengerState::Going => '?',
                PassengerState::ShuffleCheck => '!',
                PassengerState::Baggage => 'b',
                PassengerState::Seating => 's',
                PassengerState::Finished => 'o',
                PassengerState::Shuffle => 'x',
                PassengerState::Back => 'r',
            };
        }

        for row in &rows {
            lines.push(row.iter().collect());
        }
        lines.push("Legend: >/< walking, !=waiting for row, b=baggage, s=seating, o=seated, x/r=shuffling, :=reserved".to_string());
        lines.join("\n")
    }
}

fn board_queue(
    records: Vec<PassengerRecord>,
    first_id: usize,
    config: &BoardingConfig,
    rng: &mut StdRng,
) -> Result<Vec<Passenger>> {
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            let baggage = config.baggage.draw(rng)?;
            Ok(Passenger::new(
                PassengerId(first_id + i),
                record,
                baggage,
                config.shuffle_enabled,
            ))
        })
        .collect()
}

/// Reject door queues that do not fit the cabin
fn validate_queues(config: &BoardingConfig, queues: &DoorQueues) -> Result<()> {
    if queues.is_empty() {
        return Ok(());
    }
    if config.doors == DoorConfig::Single && !queues.rear.is_empty() {
        bail!(
            "single-door run was given {} passengers for the rear door",
            queues.rear.len()
        );
    }

    let mut seen = HashSet::new();
    for record in queues.front.iter().chain(queues.rear.iter()) {
        record.seat.validate(config.seat_rows)?;
        if !seen.insert(record.seat) {
            bail!("seat {} is assigned twice", record.seat);
        }
    }

    // Each door serves its own end of the cabin, so the two walks never cross
    let last_front = queues.front.iter().map(|r| r.seat.row).max();
    let first_rear = queues.rear.iter().map(|r| r.seat.row).min();
    if let (Some(last_front), Some(first_rear)) = (last_front, first_rear) {
        if last_front >= first_rear {
            bail!(
                "front-door rows reach row {} but rear-door rows start at row {}",
                last_front + 1,
                first_rear + 1
            );
        }
    }
    Ok(())
}
