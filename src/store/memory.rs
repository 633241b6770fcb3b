//! In-memory store.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Mutex;

use super::SchedulerStore;
use crate::scheduler::Scheduler;

#[derive(Default)]
pub struct MemoryStore {
    schedulers: Mutex<HashMap<String, Scheduler>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.schedulers.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SchedulerStore for MemoryStore {
    fn load(&self, id: &str) -> Result<Option<Scheduler>> {
        let map = self
            .schedulers
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        Ok(map.get(id).cloned())
    }

    fn save(&self, scheduler: &Scheduler) -> Result<()> {
        let mut map = self
            .schedulers
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        map.insert(scheduler.id.clone(), scheduler.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let mut map = self
            .schedulers
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))?;
        Ok(map.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.save(&Scheduler::new("place-1")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("place-1").unwrap(), Some(Scheduler::new("place-1")));
        assert!(store.delete("place-1").unwrap());
        assert!(store.load("place-1").unwrap().is_none());
    }
}
