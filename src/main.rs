use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use boarding_sim::simulation::{
    BaggagePolicy, BoardingConfig, BoardingPolicy, DoorConfig, SimPlane, DEFAULT_ARRIVAL_RATE,
    DEFAULT_HOLD_PROBABILITY, DEFAULT_LOAD_FACTOR, DEFAULT_MAX_TICKS, DEFAULT_SEAT_ROWS,
    STALL_TICK_LIMIT,
};
use boarding_sim::stats::{render_histogram, run_batch, BatchSummary};

#[derive(Parser)]
#[command(name = "boarding_sim")]
#[command(about = "Grid-based airplane boarding simulation")]
struct Cli {
    /// Boarding policy (see --list-policies)
    #[arg(long, default_value = "random")]
    policy: BoardingPolicy,

    /// Number of doors in use: 1 or 2
    #[arg(long, default_value = "1")]
    doors: DoorConfig,

    /// Number of independent runs in batch mode
    #[arg(long, default_value_t = 100)]
    runs: usize,

    /// Seat rows in the cabin
    #[arg(long, default_value_t = DEFAULT_SEAT_ROWS)]
    rows: usize,

    /// Stow time per passenger: "normal" or a fixed number of ticks
    #[arg(long, default_value = "normal")]
    bags: BaggagePolicy,

    /// Climb over seated passengers instead of shuffling them out
    #[arg(long)]
    no_shuffle: bool,

    /// Fraction of seats that are occupied
    #[arg(long, default_value_t = DEFAULT_LOAD_FACTOR)]
    load_factor: f64,

    /// Mean arrivals per door per tick in dual-door runs
    #[arg(long, default_value_t = DEFAULT_ARRIVAL_RATE)]
    arrival_rate: f64,

    /// Chance the single door stays empty for a tick
    #[arg(long, default_value_t = DEFAULT_HOLD_PROBABILITY)]
    hold_probability: f64,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Give up on a run after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Run a single simulation and draw the cabin every tick
    #[arg(long)]
    watch: bool,

    /// Pause between frames in watch mode
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,

    /// Print the available boarding policies and exit
    #[arg(long)]
    list_policies: bool,
}

impl Cli {
    fn config(&self) -> BoardingConfig {
        BoardingConfig {
            seat_rows: self.rows,
            doors: self.doors,
            shuffle_enabled: !self.no_shuffle,
            baggage: self.bags,
            arrival_rate: self.arrival_rate,
            hold_probability: self.hold_probability,
            load_factor: self.load_factor,
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if cli.list_policies {
        for policy in BoardingPolicy::ALL {
            println!("{:<22} {}", policy.cli_name(), policy.name());
        }
        return Ok(());
    }

    let config = cli.config();
    config.validate().context("Invalid configuration")?;

    if cli.watch {
        run_watch(config, cli.policy, cli.max_ticks, Duration::from_millis(cli.delay_ms))
    } else {
        run_headless(&config, cli.policy, cli.runs, cli.max_ticks)
    }
}

/// Run a batch and report the statistics
fn run_headless(
    config: &BoardingConfig,
    policy: BoardingPolicy,
    runs: usize,
    max_ticks: u64,
) -> Result<()> {
    let outcome = run_batch(config, policy, runs, max_ticks)?;

    match BatchSummary::from_outcome(&outcome) {
        Some(summary) => summary.log(),
        None => anyhow::bail!("none of the {} runs finished", runs),
    }

    println!("Boarding time distribution for {} ({}):", policy, config.doors);
    println!("{}", render_histogram(&outcome.ticks, 20, 50));
    Ok(())
}

/// Run one simulation, drawing the cabin after every tick
fn run_watch(
    config: BoardingConfig,
    policy: BoardingPolicy,
    max_ticks: u64,
    delay: Duration,
) -> Result<()> {
    let mut plane = SimPlane::from_policy(config, policy)?;
    info!(
        "Watching {} with {} passengers through {}",
        policy,
        plane.total_passengers(),
        plane.config().doors
    );

    println!("{}", plane.draw_cabin());
    while plane.is_running() {
        if plane.ticks() >= max_ticks {
            anyhow::bail!("boarding did not finish within {} ticks", max_ticks);
        }
        plane.step()?;
        if plane.stalled_ticks() >= STALL_TICK_LIMIT {
            anyhow::bail!("boarding gridlocked at tick {}", plane.ticks());
        }
        println!();
        println!("{}", plane.draw_cabin());
        std::thread::sleep(delay);
    }

    info!("Boarding finished in {} ticks", plane.ticks());
    plane.print_summary();
    Ok(())
}
