//! Persistent flags and the report-once gate

use super::error::{LogError, LogResult};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;

/// Flag recording that the invalid write path has been reported.
pub const REPORTED_FILE_PATH_ERROR: &str = "has_logged_file_creation_failure";

/// Boolean key/value store that outlives the process.
pub trait FlagStore: Send + Sync {
    /// Read a flag; unset flags are `false`
    fn get_flag(&self, key: &str) -> LogResult<bool>;

    /// Write a flag
    fn set_flag(&self, key: &str, value: bool) -> LogResult<()>;
}

/// In-memory flag store
#[derive(Debug, Default)]
pub struct MemoryFlagStore {
    flags: Mutex<HashMap<String, bool>>,
}

impl MemoryFlagStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn flags(&self) -> MutexGuard<'_, HashMap<String, bool>> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl FlagStore for MemoryFlagStore {
    fn get_flag(&self, key: &str) -> LogResult<bool> {
        Ok(self.flags().get(key).copied().unwrap_or(false))
    }

    fn set_flag(&self, key: &str, value: bool) -> LogResult<()> {
        self.flags().insert(key.to_string(), value);
        Ok(())
    }
}

/// Flag store persisted as a JSON object file
#[derive(Debug)]
pub struct JsonFlagStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFlagStore {
    /// Create a store backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> LogResult<BTreeMap<String, bool>> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(LogError::FlagStore(format!(
                "failed to read '{}': {e}",
                self.path.display()
            ))),
        }
    }

    fn write(&self, flags: &BTreeMap<String, bool>) -> LogResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(flags)?;
        fs::write(&self.path, text)?;
        Ok(())
    }
}

impl FlagStore for JsonFlagStore {
    fn get_flag(&self, key: &str) -> LogResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read()?.get(key).copied().unwrap_or(false))
    }

    fn set_flag(&self, key: &str, value: bool) -> LogResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut flags = self.read()?;
        flags.insert(key.to_string(), value);
        self.write(&flags)
    }
}

/// At-most-once gate backed by an optional persistent flag.
///
/// The in-process compare-and-set keeps concurrent callers from racing
/// past the store; the store keeps the gate closed across restarts.
pub struct ReportOnce {
    claimed: AtomicBool,
    store: Option<Arc<dyn FlagStore>>,
    key: &'static str,
}

impl ReportOnce {
    /// Create a gate for `key`
    pub fn new(store: Option<Arc<dyn FlagStore>>, key: &'static str) -> Self {
        Self {
            claimed: AtomicBool::new(false),
            store,
            key,
        }
    }

    /// Claim the gate. Returns `true` exactly once per flag lifetime.
    ///
    /// A failed store read does not block the claim.
    pub fn try_claim(&self) -> bool {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let Some(store) = &self.store else {
            return true;
        };

        match store.get_flag(self.key) {
            Ok(true) => return false,
            Ok(false) => {},
            Err(e) => warn!(key = self.key, error = %e, "failed to read flag store"),
        }

        if let Err(e) = store.set_flag(self.key, true) {
            warn!(key = self.key, error = %e, "failed to write flag store");
        }

        true
    }

    /// Check if this process already claimed the gate
    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for ReportOnce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportOnce")
            .field("key", &self.key)
            .field("claimed", &self.is_claimed())
            .field("persistent", &self.store.is_some())
            .finish()
    }
}
