//! Per-tick activation of passengers
//!
//! Two ordered sets of passenger ids: `active` for ordinary passengers and
//! `priority` for row-mates that are stepping out of a row. Both take part in
//! the same randomly ordered pass every tick.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use super::cell::Grid;
use super::passenger::{Passenger, PassengerUpdateResult};
use super::types::PassengerId;

#[derive(Debug, Clone, Default)]
pub struct ActivationScheduler {
    active: BTreeSet<PassengerId>,
    priority: BTreeSet<PassengerId>,
    ticks: u64,
    shuffles_triggered: usize,
}

impl ActivationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: PassengerId) {
        self.priority.remove(&id);
        self.active.insert(id);
    }

    pub fn add_priority(&mut self, id: PassengerId) {
        self.active.remove(&id);
        self.priority.insert(id);
    }

    /// Remove from the active set. Removing an absent id does nothing.
    pub fn safe_remove(&mut self, id: PassengerId) {
        self.active.remove(&id);
    }

    /// Remove from the priority set. Removing an absent id does nothing.
    pub fn safe_remove_priority(&mut self, id: PassengerId) {
        self.priority.remove(&id);
    }

    /// Move to the priority set
    pub fn promote(&mut self, id: PassengerId) {
        self.add_priority(id);
    }

    /// Move back from the priority set to the active set
    pub fn demote(&mut self, id: PassengerId) {
        if self.priority.remove(&id) {
            self.active.insert(id);
        }
    }

    /// Drop from both sets
    pub fn finish(&mut self, id: PassengerId) {
        self.safe_remove(id);
        self.safe_remove_priority(id);
    }

    pub fn contains(&self, id: PassengerId) -> bool {
        self.active.contains(&id) || self.priority.contains(&id)
    }

    pub fn is_priority(&self, id: PassengerId) -> bool {
        self.priority.contains(&id)
    }

    pub fn agent_count(&self) -> usize {
        self.active.len() + self.priority.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.priority.is_empty()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn shuffles_triggered(&self) -> usize {
        self.shuffles_triggered
    }

    /// Members of both sets in a fresh random order
    pub fn activation_order<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<PassengerId> {
        let mut order: Vec<PassengerId> = self
            .priority
            .iter()
            .chain(self.active.iter())
            .copied()
            .collect();
        order.shuffle(rng);
        order
    }

    pub fn advance(&mut self) {
        self.ticks += 1;
    }

    /// Run one tick over every scheduled passenger
    ///
    /// Returns whether any passenger moved or changed state.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        passengers: &mut HashMap<PassengerId, Passenger>,
        grid: &mut Grid,
        rng: &mut R,
    ) -> Result<bool> {
        let mut progressed = false;

        for id in self.activation_order(rng) {
            // Members finished or moved earlier in this pass are skipped
            if !self.contains(id) {
                continue;
            }

            let mut passenger = passengers
                .remove(&id)
                .with_context(|| format!("scheduled passenger {} not found", id.0))?;
            let result = passenger.update(grid, passengers);
            passengers.insert(id, passenger);

            match result? {
                PassengerUpdateResult::Waiting => {}
                PassengerUpdateResult::Progressed => progressed = true,
                PassengerUpdateResult::Finished => {
                    self.finish(id);
                    progressed = true;
                }
                PassengerUpdateResult::ClearedShuffle => {
                    self.demote(id);
                    progressed = true;
                }
                PassengerUpdateResult::ShuffleArmed {
                    occupants,
                    heading,
                    span,
                } => {
                    for occupant in occupants {
                        passengers
                            .get_mut(&occupant)
                            .with_context(|| format!("row-mate {} not found", occupant.0))?
                            .begin_shuffle(heading, span);
                        self.promote(occupant);
                    }
                    self.shuffles_triggered += 1;
                    progressed = true;
                }
            }
        }

        self.advance();
        Ok(progressed)
    }
}
