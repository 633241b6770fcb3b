//! # Sunsched Library
//!
//! Weekly time-of-day scheduling engine behind the `sunsched` binary.
//!
//! A [`scheduler::Scheduler`] aggregate owns weekly schedule instances, each
//! holding commands that fire at a fixed wall-clock time or at an offset from
//! the day's sunrise or sunset. The engine only computes when the next command
//! is due; a host arms a timer for that instant and calls back into a
//! [`dispatch::SchedulerDispatcher`] when it goes off.
//!
//! ## Architecture
//!
//! - **Scheduling**: `scheduler` holds the model, the per-instance engine and
//!   the scheduler-wide coordinator
//! - **Time and place**: `time` for weekdays, times of day and clocks; `geo`
//!   for locations and sunrise/sunset calculation
//! - **Persistence**: `store` for JSON-file and in-memory scheduler stores
//! - **Host driver**: `dispatch` turns operations into wake-up changes
//! - **CLI**: `args` and `commands`, with `config` for the TOML settings

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod args;
pub mod commands;
pub mod common;
pub mod config;
pub mod dispatch;
pub mod geo;
pub mod scheduler;
pub mod store;
pub mod time;
