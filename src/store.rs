//! Durable queue of pending changes.
//!
//! The deployment pipeline treats the store as its sole input source and
//! its sole sink for marking work consumed: changes are read at the start
//! of a run and removed only after their repository deployed cleanly.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::change::PendingChange;
use crate::error::Result;

/// Queue of user-authored edits awaiting deployment.
pub trait PendingChangeStore {
    /// All pending changes, oldest first.
    fn list_pending(&self) -> Result<Vec<PendingChange>>;

    /// Append a change to the queue.
    fn add(&self, change: PendingChange) -> Result<()>;

    /// Remove one consumed change. Unknown ids are a no-op.
    fn remove(&self, id: &str) -> Result<()>;

    /// Drop the whole queue.
    fn clear(&self) -> Result<()>;
}

/// File-backed store persisting the queue as a JSON array.
///
/// Writes go through a temp file and rename so a crash mid-write never
/// truncates the queue.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<PendingChange>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, changes: &[PendingChange]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(changes)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PendingChangeStore for JsonFileStore {
    fn list_pending(&self) -> Result<Vec<PendingChange>> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        self.load()
    }

    fn add(&self, change: PendingChange) -> Result<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let mut changes = self.load()?;
        changes.push(change);
        self.save(&changes)
    }

    fn remove(&self, id: &str) -> Result<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        let mut changes = self.load()?;
        changes.retain(|c| c.id != id);
        self.save(&changes)
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().expect("store lock poisoned");
        self.save(&[])
    }
}

/// In-memory store for tests and one-shot CLI invocations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    changes: Mutex<Vec<PendingChange>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_changes(changes: Vec<PendingChange>) -> Self {
        Self {
            changes: Mutex::new(changes),
        }
    }
}

impl PendingChangeStore for MemoryStore {
    fn list_pending(&self) -> Result<Vec<PendingChange>> {
        Ok(self.changes.lock().expect("store lock poisoned").clone())
    }

    fn add(&self, change: PendingChange) -> Result<()> {
        self.changes.lock().expect("store lock poisoned").push(change);
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.changes
            .lock()
            .expect("store lock poisoned")
            .retain(|c| c.id != id);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.changes.lock().expect("store lock poisoned").clear();
        Ok(())
    }
}
