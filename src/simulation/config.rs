//! Run configuration for the boarding simulation
//!
//! Defaults mirror a 29-row single-aisle cabin boarded at 80 % load.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Seat rows in the default cabin
pub const DEFAULT_SEAT_ROWS: usize = 29;

/// Fraction of generated passengers that actually board
pub const DEFAULT_LOAD_FACTOR: f64 = 0.8;

/// Mean Poisson arrival draw per door per tick in dual-door runs
pub const DEFAULT_ARRIVAL_RATE: f64 = 1.5;

/// Chance a free single door stays empty for a tick
pub const DEFAULT_HOLD_PROBABILITY: f64 = 0.0;

/// Mean stow time in ticks for normally distributed baggage
pub const BAGGAGE_MEAN: f64 = 15.0;

/// Standard deviation of the stow time for normally distributed baggage
pub const BAGGAGE_STD_DEV: f64 = 2.0;

/// Safety ceiling for a single run
pub const DEFAULT_MAX_TICKS: u64 = 100_000;

/// Consecutive ticks without any movement before a run counts as gridlocked
pub const STALL_TICK_LIMIT: u64 = 1_000;

/// Door configuration of the cabin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoorConfig {
    /// Front door only
    #[default]
    Single,
    /// Front and rear doors
    Dual,
}

impl FromStr for DoorConfig {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "single" | "1 door" => Ok(DoorConfig::Single),
            "2" | "dual" | "2 doors" => Ok(DoorConfig::Dual),
            other => bail!("unknown door configuration '{}' (expected 1 or 2)", other),
        }
    }
}

impl fmt::Display for DoorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoorConfig::Single => write!(f, "1 Door"),
            DoorConfig::Dual => write!(f, "2 Doors"),
        }
    }
}

/// How long each passenger spends stowing baggage
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaggagePolicy {
    /// Every passenger takes the same number of ticks
    Fixed(f64),
    /// Drawn once per passenger, redrawn while negative
    Normal { mean: f64, std_dev: f64 },
}

impl Default for BaggagePolicy {
    fn default() -> Self {
        BaggagePolicy::Normal {
            mean: BAGGAGE_MEAN,
            std_dev: BAGGAGE_STD_DEV,
        }
    }
}

impl BaggagePolicy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            BaggagePolicy::Fixed(ticks) if !(ticks >= 0.0 && ticks.is_finite()) => {
                bail!("fixed stow time must be a non-negative number, got {}", ticks)
            }
            BaggagePolicy::Normal { mean, std_dev }
                if !(mean >= 0.0 && mean.is_finite() && std_dev >= 0.0 && std_dev.is_finite()) =>
            {
                bail!(
                    "stow time distribution needs a non-negative mean and deviation, got N({}, {})",
                    mean,
                    std_dev
                )
            }
            _ => Ok(()),
        }
    }

    /// Draw one passenger's stow time
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        match *self {
            BaggagePolicy::Fixed(ticks) => Ok(ticks),
            BaggagePolicy::Normal { mean, std_dev } => {
                let normal = Normal::new(mean, std_dev)
                    .map_err(|e| anyhow!("invalid stow time distribution: {}", e))?;
                loop {
                    let value = normal.sample(rng);
                    if value >= 0.0 {
                        return Ok(value);
                    }
                }
            }
        }
    }
}

impl FromStr for BaggagePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("normal") {
            return Ok(BaggagePolicy::default());
        }
        let ticks: f64 = s
            .parse()
            .map_err(|_| anyhow!("baggage must be 'normal' or a number of ticks, got '{}'", s))?;
        let policy = BaggagePolicy::Fixed(ticks);
        policy.validate()?;
        Ok(policy)
    }
}

impl fmt::Display for BaggagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaggagePolicy::Fixed(ticks) => write!(f, "{}", ticks),
            BaggagePolicy::Normal { mean, std_dev } => write!(f, "normal({}, {})", mean, std_dev),
        }
    }
}

/// Engine construction parameters
#[derive(Debug, Clone)]
pub struct BoardingConfig {
    pub seat_rows: usize,
    pub doors: DoorConfig,
    /// Resolve seat interference by shuffling seated row-mates out
    pub shuffle_enabled: bool,
    pub baggage: BaggagePolicy,
    /// Poisson mean of arrivals per door per tick (dual door only)
    pub arrival_rate: f64,
    /// Chance a free door admits nobody (single door only)
    pub hold_probability: f64,
    pub load_factor: f64,
    /// Seed for reproducible runs; drawn from the thread RNG when absent
    pub seed: Option<u64>,
}

impl Default for BoardingConfig {
    fn default() -> Self {
        Self {
            seat_rows: DEFAULT_SEAT_ROWS,
            doors: DoorConfig::Single,
            shuffle_enabled: true,
            baggage: BaggagePolicy::default(),
            arrival_rate: DEFAULT_ARRIVAL_RATE,
            hold_probability: DEFAULT_HOLD_PROBABILITY,
            load_factor: DEFAULT_LOAD_FACTOR,
            seed: None,
        }
    }
}

impl BoardingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.seat_rows == 0 {
            bail!("a cabin needs at least one seat row");
        }
        if !(self.load_factor > 0.0 && self.load_factor <= 1.0) {
            bail!("load factor must be in (0, 1], got {}", self.load_factor);
        }
        if !(self.hold_probability >= 0.0 && self.hold_probability < 1.0) {
            bail!(
                "hold probability must be in [0, 1), got {}",
                self.hold_probability
            );
        }
        if !(self.arrival_rate > 0.0 && self.arrival_rate.is_finite()) {
            bail!("arrival rate must be positive, got {}", self.arrival_rate);
        }
        self.baggage.validate()
    }
}
