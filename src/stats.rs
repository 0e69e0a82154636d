//! Batch runs and summary statistics
//!
//! Runs the same configuration many times and reduces the tick counts to the
//! usual descriptive statistics plus a text histogram.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::simulation::{BoardingConfig, BoardingPolicy, SimPlane};

/// How often a batch reports progress
const PROGRESS_INTERVAL: usize = 50;

/// Raw results of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Tick count of every run that finished
    pub ticks: Vec<u64>,
    /// Runs that hit the tick ceiling or gridlocked
    pub stalled: usize,
}

/// Run `runs` independent simulations of one policy
///
/// A seeded configuration gives run `i` the seed `seed + i`, so a batch is
/// reproducible as a whole. Configuration errors abort the batch; runs that
/// fail to finish are logged and counted.
pub fn run_batch(
    config: &BoardingConfig,
    policy: BoardingPolicy,
    runs: usize,
    max_ticks: u64,
) -> Result<BatchOutcome> {
    info!(
        "Running {} simulations of {} ({}, {} rows)",
        runs, policy, config.doors, config.seat_rows
    );

    let mut outcome = BatchOutcome::default();
    for run in 0..runs {
        let mut run_config = config.clone();
        run_config.seed = config.seed.map(|seed| seed.wrapping_add(run as u64));

        let mut plane = SimPlane::from_policy(run_config, policy)
            .with_context(|| format!("Failed to set up run {}", run + 1))?;
        match plane.run_to_completion(max_ticks) {
            Ok(ticks) => outcome.ticks.push(ticks),
            Err(e) => {
                warn!("Run {} did not finish: {:#}", run + 1, e);
                outcome.stalled += 1;
            }
        }

        if (run + 1) % PROGRESS_INTERVAL == 0 {
            info!("Finished {}/{} runs", run + 1, runs);
        }
    }
    Ok(outcome)
}

/// Descriptive statistics over the tick counts of a batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSummary {
    pub runs: usize,
    pub stalled: usize,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub q3: f64,
    pub max: f64,
}

impl BatchSummary {
    /// `None` when no run finished
    pub fn from_ticks(ticks: &[u64], stalled: usize) -> Option<Self> {
        if ticks.is_empty() {
            return None;
        }

        let mut sorted = ticks.to_vec();
        sorted.sort_unstable();
        let sorted: Vec<f64> = sorted.into_iter().map(|t| t as f64).collect();

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            runs: ticks.len(),
            stalled,
            mean,
            median: percentile(&sorted, 0.5),
            std_dev: variance.sqrt(),
            min: sorted[0],
            q1: percentile(&sorted, 0.25),
            q3: percentile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
        })
    }

    pub fn from_outcome(outcome: &BatchOutcome) -> Option<Self> {
        Self::from_ticks(&outcome.ticks, outcome.stalled)
    }

    pub fn log(&self) {
        info!("=== BATCH COMPLETE ===");
        info!("Runs: {} ({} stalled)", self.runs, self.stalled);
        info!("Mean: {:.2}", self.mean);
        info!("Median: {:.2}", self.median);
        info!("Std dev: {:.2}", self.std_dev);
        info!("Min: {:.0}", self.min);
        info!("Q1: {:.2}", self.q1);
        info!("Q3: {:.2}", self.q3);
        info!("Max: {:.0}", self.max);
    }
}

/// Linear interpolation between the closest ranks of sorted data
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let low = sorted[lower];
    let high = sorted[upper];
    low + (high - low) * (rank - lower as f64)
}

/// Render tick counts as a horizontal text histogram
pub fn render_histogram(ticks: &[u64], bins: usize, width: usize) -> String {
    let (Some(&min), Some(&max)) = (ticks.iter().min(), ticks.iter().max()) else {
        return String::from("(no completed runs)");
    };
    let bins = bins.max(1);
    let span = max - min + 1;
    let bin_size = span.div_ceil(bins as u64).max(1);

    let mut counts = vec![0usize; span.div_ceil(bin_size) as usize];
    for t in ticks {
        counts[((t - min) / bin_size) as usize] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1);

    let mut lines = Vec::with_capacity(counts.len());
    for (i, count) in counts.iter().enumerate() {
        let lo = min + i as u64 * bin_size;
        let hi = lo + bin_size - 1;
        let bar = "#".repeat(count * width / peak);
        lines.push(format!("{:>6}-{:<6} {:>5} {}", lo, hi, count, bar));
    }
    lines.join("\n")
}
