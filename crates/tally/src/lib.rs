//! `tally` - A persistent single-screen counter
//!
//! This library provides the record store, observable state, and screen
//! controller behind the `tally` binary. The total survives restarts in a
//! local `SQLite` database.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod record;
pub mod state;
pub mod storage;
pub mod ui;

pub use config::Config;
pub use controller::{CounterView, TotalController};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{TotalRecord, NEVER, TOTAL_ID};
pub use state::TotalState;
pub use storage::{RecordStore, Storage, UnavailableStore};
