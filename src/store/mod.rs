//! Persistence boundary for scheduler aggregates.
//!
//! Every scheduler operation mutates one [`Scheduler`] in memory; callers hand
//! the result to a [`SchedulerStore`] explicitly once the operation succeeds.
//!
//! - [`json`]: one pretty-printed JSON file per scheduler under the state directory
//! - [`memory`]: in-process map, used by tests and the `simulate` command

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::MemoryStore;

use anyhow::Result;

use crate::scheduler::Scheduler;

/// Load, save and delete scheduler aggregates by id.
pub trait SchedulerStore {
    /// Returns `None` when no scheduler with this id has been saved.
    fn load(&self, id: &str) -> Result<Option<Scheduler>>;

    fn save(&self, scheduler: &Scheduler) -> Result<()>;

    /// Returns `false` when there was nothing to delete.
    fn delete(&self, id: &str) -> Result<bool>;

    /// Load `id`, or start an empty scheduler with that id.
    fn load_or_new(&self, id: &str) -> Result<Scheduler> {
        Ok(self.load(id)?.unwrap_or_else(|| Scheduler::new(id)))
    }
}
