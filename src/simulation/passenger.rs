//! Passenger movement logic for the boarding simulation
//!
//! Standalone state machine: a passenger walks the corridor, checks its row for
//! seated row-mates in the way, stows baggage and sits down. Row-mates that
//! have to let somebody through run the shuffle branch (`Shuffle` then `Back`).

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use ordered_float::OrderedFloat;

use super::cell::Grid;
use super::types::{Direction, Door, GridPos, PassengerId, PassengerRecord, Seat, CORRIDOR_Y};

/// Where a passenger is in its boarding sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerState {
    Inactive,     // Still in a door queue
    Going,        // Walking the corridor
    ShuffleCheck, // Waiting one cell short of its row for the row to clear
    Baggage,      // Stowing on the row cell
    Seating,      // Moving across the row towards the seat
    Finished,     // Seated
    Shuffle,      // Stepping out of the row for somebody else
    Back,         // Returning to the row after a shuffle
}

/// Heading and length of a shuffle a passenger is taking part in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuffleLeg {
    /// Direction of the passenger that triggered the shuffle
    pub heading: Direction,
    /// Number of row-mates stepping out, and corridor cells reserved for them
    pub span: usize,
}

/// Result of a passenger update indicating what the scheduler should do next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassengerUpdateResult {
    Progressed, // Moved or changed state
    Waiting,    // Nothing possible this tick
    Finished,   // Reached the assigned seat
    ShuffleArmed {
        occupants: Vec<PassengerId>,
        heading: Direction,
        span: usize,
    },
    ClearedShuffle, // Walked far enough out of the row, heading back now
}

/// Outcome of scanning a row for seated passengers in the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterferenceCheck {
    Clear,
    Blocked,
    Shuffle(Vec<PassengerId>),
}

/// A passenger in the boarding simulation
#[derive(Debug, Clone)]
pub struct Passenger {
    pub id: PassengerId,
    pub seat: Seat,
    pub group: u32,
    pub state: PassengerState,
    /// `None` until admitted through a door
    pub position: Option<GridPos>,
    /// Remaining stow time in ticks
    pub baggage: OrderedFloat<f64>,
    pub direction: Direction,
    /// Corridor cells still to walk while shuffling out
    pub shuffle_dist: usize,
    pub shuffle_enabled: bool,
    pub shuffle_leg: Option<ShuffleLeg>,
    pub boarded_through: Option<Door>,
    pub(crate) interference_cleared: bool,
}

impl Passenger {
    pub fn new(id: PassengerId, record: PassengerRecord, baggage: f64, shuffle_enabled: bool) -> Self {
        Self {
            id,
            seat: record.seat,
            group: record.group,
            state: PassengerState::Inactive,
            position: None,
            baggage: OrderedFloat(baggage),
            direction: Direction::Aft,
            shuffle_dist: 0,
            shuffle_enabled,
            shuffle_leg: None,
            boarded_through: None,
            interference_cleared: false,
        }
    }

    /// Put the passenger on its door cell. The caller claims the cell on the grid.
    pub fn admit(&mut self, door: Door, pos: GridPos) {
        self.state = PassengerState::Going;
        self.position = Some(pos);
        self.direction = door.direction();
        self.boarded_through = Some(door);
    }

    /// Called on a seated row-mate when somebody needs to get past it
    pub fn begin_shuffle(&mut self, heading: Direction, span: usize) {
        self.state = PassengerState::Shuffle;
        self.shuffle_leg = Some(ShuffleLeg { heading, span });
        self.shuffle_dist = 0;
    }

    pub fn is_seated(&self) -> bool {
        self.state == PassengerState::Finished && self.position == Some(self.seat.grid_pos())
    }

    /// Corridor cell just before the seat row, seen from the travel direction
    pub fn lookahead_pos(&self) -> Option<GridPos> {
        self.seat.corridor_pos().along(-self.direction.delta())
    }

    fn current_pos(&self) -> Result<GridPos> {
        self.position
            .with_context(|| format!("passenger {} acts without a position", self.id.0))
    }

    /// Update passenger logic for one tick
    ///
    /// `others` holds every other passenger; the scheduler takes this one out
    /// of the map while it runs.
    pub fn update(
        &mut self,
        grid: &mut Grid,
        others: &HashMap<PassengerId, Passenger>,
    ) -> Result<PassengerUpdateResult> {
        match self.state {
            PassengerState::Inactive | PassengerState::Finished => Ok(PassengerUpdateResult::Waiting),
            PassengerState::Going => self.step_going(grid, others),
            PassengerState::ShuffleCheck => self.step_shuffle_check(grid, others),
            PassengerState::Baggage => Ok(self.step_baggage()),
            PassengerState::Seating => self.step_seating(grid),
            PassengerState::Shuffle => self.step_shuffle(grid),
            PassengerState::Back => self.step_back(grid),
        }
    }

    fn step_going(
        &mut self,
        grid: &mut Grid,
        others: &HashMap<PassengerId, Passenger>,
    ) -> Result<PassengerUpdateResult> {
        let pos = self.current_pos()?;
        let target = pos
            .along(self.direction.delta())
            .filter(|p| grid.in_bounds(*p))
            .with_context(|| format!("passenger {} walked off the cabin at {}", self.id.0, pos))?;

        let cell = grid.cell(target).context("Corridor cell not found")?;
        if !cell.admits_traveller() {
            return Ok(PassengerUpdateResult::Waiting);
        }
        let consumes_permit = cell.shuffle_permit;

        if Some(target) == self.lookahead_pos() && self.yields_lookahead(target, grid, others) {
            return Ok(PassengerUpdateResult::Waiting);
        }

        grid.relocate(self.id, pos, target)?;
        if consumes_permit {
            grid.cell_mut(target).context("Corridor cell not found")?.shuffle_permit = false;
        }
        self.position = Some(target);

        if target == self.seat.corridor_pos() {
            self.state = if self.baggage > OrderedFloat(0.0) {
                PassengerState::Baggage
            } else {
                PassengerState::Seating
            };
            return Ok(PassengerUpdateResult::Progressed);
        }

        if self.shuffle_enabled && !self.interference_cleared && Some(target) == self.lookahead_pos() {
            self.state = PassengerState::ShuffleCheck;
            return match self.step_shuffle_check(grid, others)? {
                PassengerUpdateResult::Waiting => Ok(PassengerUpdateResult::Progressed),
                other => Ok(other),
            };
        }

        Ok(PassengerUpdateResult::Progressed)
    }

    /// Whether to hold one cell short of `lookahead` for an oncoming walker
    ///
    /// Two walkers from opposite doors waiting at neighbouring rows can each
    /// stand on the other's parking cells. The later one holds back instead:
    /// an oncoming walker waiting three cells ahead parks a two-seat shuffle
    /// on our lookahead cell.
    fn yields_lookahead(
        &self,
        lookahead: GridPos,
        grid: &Grid,
        others: &HashMap<PassengerId, Passenger>,
    ) -> bool {
        if !self.shuffle_enabled || self.interference_cleared || self.seat.is_aisle() {
            return false;
        }
        let Some(oncoming) = lookahead
            .along(self.direction.delta() * 3)
            .and_then(|pos| grid.occupant(pos))
            .and_then(|id| others.get(&id))
        else {
            return false;
        };
        oncoming.state == PassengerState::ShuffleCheck
            && oncoming.direction != self.direction
            && oncoming.seat.intervening_columns().len() >= 2
    }

    fn step_shuffle_check(
        &mut self,
        grid: &mut Grid,
        others: &HashMap<PassengerId, Passenger>,
    ) -> Result<PassengerUpdateResult> {
        match self.check_interference(grid, others)? {
            InterferenceCheck::Blocked => Ok(PassengerUpdateResult::Waiting),
            InterferenceCheck::Clear => {
                self.state = PassengerState::Going;
                self.interference_cleared = true;
                Ok(PassengerUpdateResult::Progressed)
            }
            InterferenceCheck::Shuffle(occupants) => {
                let span = occupants.len();
                self.arm_shuffle(grid, span)?;
                self.state = PassengerState::Going;
                self.interference_cleared = true;
                log::debug!(
                    "Passenger {} ({}) moves {} row-mate(s) out of row {}",
                    self.id.0,
                    self.seat,
                    span,
                    self.seat.row + 1
                );
                Ok(PassengerUpdateResult::ShuffleArmed {
                    occupants,
                    heading: self.direction,
                    span,
                })
            }
        }
    }

    /// Scan the seats between the corridor and this passenger's seat
    pub fn check_interference(
        &self,
        grid: &Grid,
        others: &HashMap<PassengerId, Passenger>,
    ) -> Result<InterferenceCheck> {
        let columns = self.seat.intervening_columns();
        if columns.is_empty() {
            return Ok(InterferenceCheck::Clear);
        }

        let row_x = self.seat.grid_pos().x;
        let mut occupants = Vec::new();
        for column in columns {
            let Some(id) = grid.occupant(GridPos::new(row_x, column)) else {
                continue;
            };
            let occupant = others
                .get(&id)
                .with_context(|| format!("occupant {} of row {} not found", id.0, self.seat.row + 1))?;
            if occupant.state != PassengerState::Finished {
                return Ok(InterferenceCheck::Blocked);
            }
            occupants.push(id);
        }

        let row_cell = self.seat.corridor_pos();
        if !free_and_quiet(grid, Some(row_cell)) {
            return Ok(InterferenceCheck::Blocked);
        }
        if occupants.is_empty() {
            return Ok(InterferenceCheck::Clear);
        }

        // Row-mates park on the corridor cells beyond the row
        for offset in 1..=occupants.len() {
            let parking = row_cell.along(self.direction.delta() * offset as isize);
            if !free_and_quiet(grid, parking) {
                return Ok(InterferenceCheck::Blocked);
            }
        }

        Ok(InterferenceCheck::Shuffle(occupants))
    }

    fn arm_shuffle(&self, grid: &mut Grid, span: usize) -> Result<()> {
        let row_cell = self.seat.corridor_pos();
        let cell = grid.cell_mut(row_cell).context("Row cell not found")?;
        cell.shuffle_count = span;
        cell.pending_exits = span;
        cell.shuffle_permit = true;

        for offset in 1..=span {
            let parking = row_cell
                .along(self.direction.delta() * offset as isize)
                .context("Shuffle parking cell outside the cabin")?;
            grid.cell_mut(parking)
                .context("Shuffle parking cell not found")?
                .shuffle_in_progress = true;
        }
        Ok(())
    }

    fn step_baggage(&mut self) -> PassengerUpdateResult {
        self.baggage -= 1.0;
        if self.baggage <= OrderedFloat(0.0) {
            self.state = PassengerState::Seating;
        }
        PassengerUpdateResult::Progressed
    }

    fn step_seating(&mut self, grid: &mut Grid) -> Result<PassengerUpdateResult> {
        let pos = self.current_pos()?;
        if pos.y == self.seat.column {
            self.state = PassengerState::Finished;
            return Ok(PassengerUpdateResult::Finished);
        }

        let dy: isize = if self.seat.column > pos.y { 1 } else { -1 };
        let target = if self.shuffle_enabled {
            pos.across(dy).filter(|p| grid.cell(*p).is_some_and(|c| c.is_free()))
        } else {
            // Climb over whoever is already seated on the way in
            let steps = pos.y.abs_diff(self.seat.column) as isize;
            (1..=steps)
                .filter_map(|n| pos.across(dy * n))
                .find(|p| grid.cell(*p).is_some_and(|c| c.is_free()))
        };

        let Some(target) = target else {
            return Ok(PassengerUpdateResult::Waiting);
        };
        grid.relocate(self.id, pos, target)?;
        self.position = Some(target);

        if target.y == self.seat.column {
            self.state = PassengerState::Finished;
            log::debug!("Passenger {} seated in {}", self.id.0, self.seat);
            return Ok(PassengerUpdateResult::Finished);
        }
        Ok(PassengerUpdateResult::Progressed)
    }

    fn step_shuffle(&mut self, grid: &mut Grid) -> Result<PassengerUpdateResult> {
        let pos = self.current_pos()?;
        let leg = self
            .shuffle_leg
            .with_context(|| format!("passenger {} shuffles without a heading", self.id.0))?;
        let row_cell = self.seat.corridor_pos();

        // Out of the seat first
        if pos.y != CORRIDOR_Y {
            let dy: isize = if pos.y < CORRIDOR_Y { 1 } else { -1 };
            let target = pos.across(dy).context("Shuffle left the cabin")?;
            if !grid.cell(target).is_some_and(|c| c.is_free()) {
                return Ok(PassengerUpdateResult::Waiting);
            }
            grid.relocate(self.id, pos, target)?;
            self.position = Some(target);
            if target == row_cell {
                self.shuffle_dist = grid.cell(row_cell).context("Row cell not found")?.shuffle_count;
            }
            return Ok(PassengerUpdateResult::Progressed);
        }

        if self.shuffle_dist == 0 {
            bail!(
                "passenger {} is shuffling on {} with nowhere to go",
                self.id.0,
                pos
            );
        }

        let target = pos
            .along(leg.heading.delta())
            .filter(|p| grid.in_bounds(*p))
            .context("Shuffle walked off the cabin")?;
        if !grid.cell(target).is_some_and(|c| c.is_free()) {
            return Ok(PassengerUpdateResult::Waiting);
        }
        grid.relocate(self.id, pos, target)?;
        self.position = Some(target);

        if pos == row_cell {
            let cell = grid.cell_mut(row_cell).context("Row cell not found")?;
            cell.shuffle_count = cell.shuffle_count.saturating_sub(1);
        }

        self.shuffle_dist -= 1;
        if self.shuffle_dist == 0 {
            self.state = PassengerState::Back;
            return Ok(PassengerUpdateResult::ClearedShuffle);
        }
        Ok(PassengerUpdateResult::Progressed)
    }

    fn step_back(&mut self, grid: &mut Grid) -> Result<PassengerUpdateResult> {
        let pos = self.current_pos()?;
        let leg = self
            .shuffle_leg
            .with_context(|| format!("passenger {} heads back without a heading", self.id.0))?;
        let row_cell = self.seat.corridor_pos();

        // Row-mates still on their way out need the cells behind us
        if grid.cell(row_cell).is_some_and(|c| c.shuffle_count > 0) {
            return Ok(PassengerUpdateResult::Waiting);
        }

        let target = pos
            .along(-leg.heading.delta())
            .context("Return walked off the cabin")?;
        let cell = grid.cell(target).context("Corridor cell not found")?;
        if !cell.is_free() || cell.shuffle_permit {
            return Ok(PassengerUpdateResult::Waiting);
        }
        grid.relocate(self.id, pos, target)?;
        self.position = Some(target);

        if target == row_cell {
            self.state = PassengerState::Seating;
            self.shuffle_leg = None;

            let cell = grid.cell_mut(row_cell).context("Row cell not found")?;
            cell.pending_exits = cell.pending_exits.saturating_sub(1);
            if cell.pending_exits == 0 {
                for offset in 1..=leg.span {
                    if let Some(parking) = row_cell.along(leg.heading.delta() * offset as isize) {
                        if let Some(parking_cell) = grid.cell_mut(parking) {
                            parking_cell.shuffle_in_progress = false;
                        }
                    }
                }
            }
        }
        Ok(PassengerUpdateResult::Progressed)
    }
}

fn free_and_quiet(grid: &Grid, pos: Option<GridPos>) -> bool {
    pos.and_then(|p| grid.cell(p))
        .is_some_and(|c| c.is_free() && c.is_quiet())
}
