//! JSON file store.
//!
//! Each scheduler lives in `<dir>/<id>.json`, with `:` escaped as `%3A`.
//! Writes go to a temporary file in the same directory that is then renamed
//! over the target, and are serialized across processes by an exclusive `fs2`
//! lock on `<dir>/.lock`.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::SchedulerStore;
use crate::scheduler::Scheduler;

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding scheduler `id`.
    ///
    /// `:` is written as `%3A`. `%` is not a valid id character, so distinct
    /// ids always map to distinct files.
    pub fn path_for(&self, id: &str) -> Result<PathBuf> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
            && !id.starts_with('.');
        if !valid {
            anyhow::bail!("Invalid scheduler id '{id}'");
        }
        Ok(self.dir.join(format!("{}.json", id.replace(':', "%3A"))))
    }

    /// Hold the store-wide lock for the duration of `op`.
    fn locked<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_path = self.dir.join(".lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("Failed to lock {}", lock_path.display()))?;

        let result = op();
        let _ = FileExt::unlock(&lock_file);
        result
    }
}

impl SchedulerStore for JsonFileStore {
    fn load(&self, id: &str) -> Result<Option<Scheduler>> {
        let path = self.path_for(id)?;
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let scheduler: Scheduler = serde_json::from_reader(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse scheduler state {}", path.display()))?;
        if scheduler.id != id {
            anyhow::bail!(
                "Scheduler state {} belongs to '{}', not '{id}'",
                path.display(),
                scheduler.id
            );
        }
        Ok(Some(scheduler))
    }

    fn save(&self, scheduler: &Scheduler) -> Result<()> {
        let path = self.path_for(&scheduler.id)?;
        let json = serde_json::to_string_pretty(scheduler)
            .context("Failed to serialize scheduler state")?;

        self.locked(|| {
            let mut temp = tempfile::NamedTempFile::new_in(&self.dir)
                .with_context(|| format!("Failed to create temporary file in {}", self.dir.display()))?;
            temp.write_all(json.as_bytes())?;
            temp.write_all(b"\n")?;
            temp.as_file().sync_all()?;
            temp.persist(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(())
        })
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let path = self.path_for(id)?;
        self.locked(|| {
            if !path.exists() {
                return Ok(false);
            }
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::WeeklySchedule;
    use tempfile::tempdir;

    #[test]
    fn test_missing_scheduler_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.load("place-1").unwrap().is_none());
        assert_eq!(store.load_or_new("place-1").unwrap(), Scheduler::new("place-1"));
    }

    #[test]
    fn test_save_load_delete() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("nested")).unwrap();

        let mut scheduler = Scheduler::new("place-1");
        scheduler
            .instances
            .insert("weekday".to_string(), WeeklySchedule::new_weekly("climate", true));
        store.save(&scheduler).unwrap();
        assert!(store.path_for("place-1").unwrap().exists());

        // Overwrite in place
        scheduler.target = Some("dev:thermostat".to_string());
        store.save(&scheduler).unwrap();
        assert_eq!(store.load("place-1").unwrap(), Some(scheduler));

        assert!(store.delete("place-1").unwrap());
        assert!(!store.delete("place-1").unwrap());
        assert!(store.load("place-1").unwrap().is_none());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        for id in ["", "../escape", "a/b", ".hidden"] {
            assert!(store.path_for(id).is_err(), "accepted {id:?}");
        }
        assert!(store.path_for("SERV:sched:place-1").is_ok());
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        fs::write(store.path_for("place-1").unwrap(), "{ not json").unwrap();

        let err = store.load("place-1").unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse scheduler state"));
    }

    #[test]
    fn test_colon_and_underscore_ids_use_separate_files() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert_ne!(
            store.path_for("place:1").unwrap(),
            store.path_for("place_1").unwrap()
        );

        let mut colon = Scheduler::new("place:1");
        colon.target = Some("dev:colon".to_string());
        let mut underscore = Scheduler::new("place_1");
        underscore.target = Some("dev:underscore".to_string());
        store.save(&colon).unwrap();
        store.save(&underscore).unwrap();

        assert_eq!(store.load("place:1").unwrap(), Some(colon.clone()));
        assert_eq!(store.load("place_1").unwrap(), Some(underscore));

        assert!(store.delete("place_1").unwrap());
        assert!(store.load("place_1").unwrap().is_none());
        assert_eq!(store.load("place:1").unwrap(), Some(colon));
    }
}
