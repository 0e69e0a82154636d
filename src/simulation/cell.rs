//! Cabin grid for the boarding simulation
//!
//! An arena of cells indexed by coordinate. Passengers only ever hold a
//! [`GridPos`]; claiming and vacating cells goes through [`Grid`] so the
//! occupancy flag and the occupant index never disagree.

use anyhow::{bail, Context, Result};

use super::types::{
    Door, GridPos, PassengerId, CABIN_HEIGHT, CORRIDOR_Y, REAR_MARGIN, SEAT_START_X,
};

/// What a grid location is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Seat,
    Corridor,
}

/// Whether a passenger currently stands on a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occupancy {
    Free,
    Taken,
}

/// One grid location
#[derive(Debug, Clone)]
pub struct Cell {
    pub kind: CellKind,
    pub occupancy: Occupancy,
    /// Occupants that still have to step out of their seats through this cell
    pub shuffle_count: usize,
    /// Occupants that have stepped out and not yet come back
    pub pending_exits: usize,
    /// Open for the passenger that armed the shuffle on this row
    pub shuffle_permit: bool,
    /// Reserved as parking space for shuffling occupants
    pub shuffle_in_progress: bool,
}

impl Cell {
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            occupancy: Occupancy::Free,
            shuffle_count: 0,
            pending_exits: 0,
            shuffle_permit: false,
            shuffle_in_progress: false,
        }
    }

    pub fn is_free(&self) -> bool {
        self.kind != CellKind::Wall && self.occupancy == Occupancy::Free
    }

    /// No shuffle bookkeeping is pending on this cell
    pub fn is_quiet(&self) -> bool {
        self.shuffle_count == 0
            && self.pending_exits == 0
            && !self.shuffle_permit
            && !self.shuffle_in_progress
    }

    /// Check whether a passenger walking the corridor may step onto this cell
    pub fn admits_traveller(&self) -> bool {
        self.is_free()
            && self.shuffle_count == 0
            && !self.shuffle_in_progress
            && (self.pending_exits == 0 || self.shuffle_permit)
    }
}

/// The cabin: one corridor row flanked by three seat rows on each side
#[derive(Debug, Clone)]
pub struct Grid {
    width: usize,
    seat_rows: usize,
    cells: Vec<Cell>,
    occupants: Vec<Option<PassengerId>>,
}

impl Grid {
    pub fn new(seat_rows: usize) -> Result<Self> {
        if seat_rows == 0 {
            bail!("a cabin needs at least one seat row");
        }

        let width = SEAT_START_X + seat_rows + REAR_MARGIN;
        let seat_span = SEAT_START_X..SEAT_START_X + seat_rows;
        let mut cells = Vec::with_capacity(width * CABIN_HEIGHT);
        for y in 0..CABIN_HEIGHT {
            for x in 0..width {
                let kind = if y == CORRIDOR_Y {
                    CellKind::Corridor
                } else if seat_span.contains(&x) {
                    CellKind::Seat
                } else {
                    CellKind::Wall
                };
                cells.push(Cell::new(kind));
            }
        }

        Ok(Self {
            width,
            seat_rows,
            occupants: vec![None; cells.len()],
            cells,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        CABIN_HEIGHT
    }

    pub fn seat_rows(&self) -> usize {
        self.seat_rows
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x < self.width && pos.y < CABIN_HEIGHT
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos).then(|| pos.y * self.width + pos.x)
    }

    pub fn cell(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).map(|i| &self.cells[i])
    }

    pub fn cell_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        let index = self.index(pos)?;
        Some(&mut self.cells[index])
    }

    /// The passenger standing on `pos`, if any
    pub fn occupant(&self, pos: GridPos) -> Option<PassengerId> {
        self.index(pos).and_then(|i| self.occupants[i])
    }

    pub fn door(&self, door: Door) -> GridPos {
        match door {
            Door::Front => GridPos::new(0, CORRIDOR_Y),
            Door::Rear => GridPos::new(self.width - 1, CORRIDOR_Y),
        }
    }

    /// Claim a free cell for a passenger entering the grid
    pub fn place(&mut self, id: PassengerId, pos: GridPos) -> Result<()> {
        let index = self
            .index(pos)
            .with_context(|| format!("cell {} is outside the cabin", pos))?;
        if !self.cells[index].is_free() {
            bail!(
                "passenger {} cannot claim {}: cell is taken by {:?}",
                id.0,
                pos,
                self.occupants[index]
            );
        }
        self.cells[index].occupancy = Occupancy::Taken;
        self.occupants[index] = Some(id);
        Ok(())
    }

    /// Vacate `from` and claim `to` in one step
    pub fn relocate(&mut self, id: PassengerId, from: GridPos, to: GridPos) -> Result<()> {
        let from_index = self
            .index(from)
            .with_context(|| format!("cell {} is outside the cabin", from))?;
        if self.occupants[from_index] != Some(id) {
            bail!("passenger {} is not standing on {}", id.0, from);
        }
        self.place(id, to)?;
        self.cells[from_index].occupancy = Occupancy::Free;
        self.occupants[from_index] = None;
        Ok(())
    }

    /// Mark a door cell free once nobody stands on it
    pub fn refresh_door(&mut self, door: Door) -> Occupancy {
        let pos = self.door(door);
        let index = pos.y * self.width + pos.x;
        if self.occupants[index].is_none() {
            self.cells[index].occupancy = Occupancy::Free;
        }
        self.cells[index].occupancy
    }

    /// Every cell with its coordinate, row by row
    pub fn cells(&self) -> impl Iterator<Item = (GridPos, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (GridPos::new(i % self.width, i / self.width), cell))
    }
}
