//! Standalone boarding simulation module
//!
//! This module contains all the core boarding logic: the cabin grid, the
//! passenger state machine, per-tick activation and the engine that admits
//! passengers through the doors. It runs headless and is driven from the
//! console or from tests.

mod cell;
mod config;
mod passenger;
mod policy;
mod scheduler;
mod types;
mod world;


// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use cell::{Cell, CellKind, Grid, Occupancy};
#[allow(unused_imports)]
pub use config::{
    BaggagePolicy, BoardingConfig, DoorConfig, BAGGAGE_MEAN, BAGGAGE_STD_DEV,
    DEFAULT_ARRIVAL_RATE, DEFAULT_HOLD_PROBABILITY, DEFAULT_LOAD_FACTOR, DEFAULT_MAX_TICKS,
    DEFAULT_SEAT_ROWS, STALL_TICK_LIMIT,
};
#[allow(unused_imports)]
pub use passenger::{InterferenceCheck, Passenger, PassengerState, PassengerUpdateResult, ShuffleLeg};
#[allow(unused_imports)]
pub use policy::{split_row, thin_queue, BoardingPolicy, DoorQueues};
#[allow(unused_imports)]
pub use scheduler::ActivationScheduler;
#[allow(unused_imports)]
pub use types::{
    Direction, Door, GridPos, PassengerId, PassengerRecord, Seat, CABIN_HEIGHT, CORRIDOR_Y,
    REAR_MARGIN, SEAT_COLUMNS, SEAT_START_X,
};
pub use world::SimPlane;
