//! Weekly time-of-day scheduling.
//!
//! ## Module Structure
//!
//! - [`model`]: the persisted [`Scheduler`] aggregate and its [`WeeklySchedule`] instances
//! - [`command`]: [`ScheduledCommand`] and the [`CommandSpec`] requests that change it
//! - [`context`]: timezone, location, solar provider and clock
//! - [`weekly`]: per-instance command CRUD and next-fire search
//! - [`coordinator`]: instance lifecycle, group exclusion, firing, global next fire
//! - [`message`]: the [`MessageBody`] produced when a command fires
//! - [`error`]: [`SchedulerError`]
//!
//! Every operation either succeeds and leaves the aggregate with an up to date
//! next fire, or fails and leaves it exactly as it was.

pub mod command;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod model;
pub mod weekly;

pub use command::{Attributes, CommandSpec, Mode, ScheduledCommand};
pub use context::SchedulerContext;
pub use coordinator::SchedulerCoordinator;
pub use error::{Result, SchedulerError};
pub use message::MessageBody;
pub use model::{Scheduler, WeekBuckets, WeeklySchedule};
pub use weekly::WeeklyScheduleEngine;
