//! Core types for the boarding simulation
//!
//! Identifiers, grid coordinates and seat geometry shared by every other
//! simulation module.

use std::fmt;

use anyhow::{bail, Result};

/// Lateral index of the corridor
pub const CORRIDOR_Y: usize = 3;

/// Lateral size of the cabin: three seats, the corridor, three seats
pub const CABIN_HEIGHT: usize = 7;

/// Corridor index of the first seat row (door column plus two wall columns)
pub const SEAT_START_X: usize = 3;

/// Corridor cells after the last seat row, rear door included
pub const REAR_MARGIN: usize = 3;

/// Seat columns from the left wall to the right wall
pub const SEAT_COLUMNS: [usize; 6] = [0, 1, 2, 4, 5, 6];

/// A unique identifier for a passenger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassengerId(pub usize);

/// A cell coordinate: `x` runs along the corridor, `y` across the cabin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Shift along the corridor axis. `None` when it would leave the grid on the low side.
    pub fn along(self, dx: isize) -> Option<GridPos> {
        self.x
            .checked_add_signed(dx)
            .map(|x| GridPos { x, y: self.y })
    }

    /// Shift across the cabin
    pub fn across(self, dy: isize) -> Option<GridPos> {
        self.y
            .checked_add_signed(dy)
            .map(|y| GridPos { x: self.x, y })
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Travel direction along the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// From the front door towards the tail (+1)
    Aft,
    /// From the rear door towards the nose (-1)
    Fore,
}

impl Direction {
    pub fn delta(self) -> isize {
        match self {
            Direction::Aft => 1,
            Direction::Fore => -1,
        }
    }
}

/// A boarding door
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Door {
    Front,
    Rear,
}

impl Door {
    /// Direction every passenger entering through this door walks in
    pub fn direction(self) -> Direction {
        match self {
            Door::Front => Direction::Aft,
            Door::Rear => Direction::Fore,
        }
    }
}

/// An assigned seat: zero-based seat row and lateral column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Seat {
    pub row: usize,
    pub column: usize,
}

impl Seat {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }

    /// Reject seats that fall outside a cabin with `seat_rows` rows or on the corridor
    pub fn validate(&self, seat_rows: usize) -> Result<()> {
        if self.row >= seat_rows {
            bail!(
                "seat {} is in row {} but the cabin only has {} rows",
                self,
                self.row + 1,
                seat_rows
            );
        }
        if !SEAT_COLUMNS.contains(&self.column) {
            bail!("column {} is not a seat column", self.column);
        }
        Ok(())
    }

    pub fn grid_pos(&self) -> GridPos {
        GridPos::new(SEAT_START_X + self.row, self.column)
    }

    /// The corridor cell level with this seat's row
    pub fn corridor_pos(&self) -> GridPos {
        GridPos::new(SEAT_START_X + self.row, CORRIDOR_Y)
    }

    /// Columns strictly between the corridor and this seat, nearest the corridor first
    pub fn intervening_columns(&self) -> Vec<usize> {
        if self.column < CORRIDOR_Y {
            (self.column + 1..CORRIDOR_Y).rev().collect()
        } else {
            (CORRIDOR_Y + 1..self.column).collect()
        }
    }

    pub fn is_window(&self) -> bool {
        self.column == 0 || self.column == CABIN_HEIGHT - 1
    }

    pub fn is_aisle(&self) -> bool {
        self.column + 1 == CORRIDOR_Y || self.column == CORRIDOR_Y + 1
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.column {
            0 => 'A',
            1 => 'B',
            2 => 'C',
            4 => 'D',
            5 => 'E',
            6 => 'F',
            _ => '?',
        };
        write!(f, "{}{}", self.row + 1, letter)
    }
}

/// One entry of a door queue as produced by a boarding policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassengerRecord {
    pub seat: Seat,
    /// Boarding group, carried for display and statistics only
    pub group: u32,
}

impl PassengerRecord {
    pub fn new(seat: Seat, group: u32) -> Self {
        Self { seat, group }
    }
}
