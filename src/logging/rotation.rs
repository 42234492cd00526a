//! Log rotation over a fixed pool of numbered files
//!
//! The rotator owns `K` candidate files named `<prefix>_<index>.<ext>`.
//! One of them is "current"; the choice is cached and only revisited once
//! the rotation period has elapsed. A fresh selection fills a missing slot
//! first and otherwise recycles the least recently modified one, expired or
//! not, so rotation never fails just because every slot looks fresh. Either way the
//! chosen file starts empty: a file only ever holds lines from one selection,
//! which keeps mtime order equal to line order and lets retention pruning
//! drop old lines.

use super::error::{LogError, LogResult};
use crate::config::RotationSettings;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Ordering for log file listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogSort {
    /// Oldest first
    #[default]
    LastModifiedAsc,
    /// Newest first
    LastModifiedDesc,
}

#[derive(Debug, Clone, Copy)]
struct CurrentFile {
    index: usize,
    selected_at: SystemTime,
}

/// Log file rotator
pub struct LogRotator {
    /// Directory holding the pool
    directory: PathBuf,

    /// File name prefix
    prefix: String,

    /// File extension
    extension: String,

    /// Number of slots
    pool_size: usize,

    /// How long a file stays current
    rotation_period: Duration,

    /// How long files are kept
    retention: Duration,

    /// Cached current slot
    current: Option<CurrentFile>,
}

impl LogRotator {
    /// Create a rotator over `directory`, creating it if needed.
    pub fn new(directory: impl Into<PathBuf>, settings: &RotationSettings) -> LogResult<Self> {
        let directory = directory.into();

        if settings.pool_size == 0 {
            return Err(LogError::Rotation(
                "pool size must be at least 1".to_string(),
            ));
        }

        fs::create_dir_all(&directory).map_err(|source| LogError::Directory {
            path: directory.clone(),
            source,
        })?;

        Ok(Self {
            directory,
            prefix: settings.file_prefix.clone(),
            extension: settings.file_extension.clone(),
            pool_size: settings.pool_size,
            rotation_period: settings.rotation_period(),
            retention: settings.retention(),
            current: None,
        })
    }

    /// Directory holding the pool
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Number of slots
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Path of slot `index`
    pub fn slot_path(&self, index: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{}.{}", self.prefix, index, self.extension))
    }

    /// Path of the cached current file, if one has been selected
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current.map(|c| self.slot_path(c.index))
    }

    /// Get the file to write to at `now`, rotating if the cached one expired.
    pub fn current_writable_file(&mut self, now: SystemTime) -> LogResult<PathBuf> {
        if let Some(current) = self.current {
            if elapsed(current.selected_at, now) < self.rotation_period {
                return Ok(self.slot_path(current.index));
            }
        }

        let index = self.select_slot(now)?;
        self.current = Some(CurrentFile {
            index,
            selected_at: now,
        });

        Ok(self.slot_path(index))
    }

    fn select_slot(&self, now: SystemTime) -> LogResult<usize> {
        let cached = self.current.map(|c| c.index);
        let mut candidates: Vec<usize> = (0..self.pool_size)
            .filter(|i| Some(*i) != cached)
            .collect();

        // A single-slot pool can only rotate onto itself.
        if candidates.is_empty() {
            candidates = (0..self.pool_size).collect();
        }

        if let Some(index) = candidates
            .iter()
            .copied()
            .find(|&index| modified(&self.slot_path(index)).is_none())
        {
            truncate(&self.slot_path(index), now)?;
            return Ok(index);
        }

        let (mtime, oldest) = candidates
            .iter()
            .copied()
            .filter_map(|index| modified(&self.slot_path(index)).map(|mtime| (mtime, index)))
            .min()
            .ok_or_else(|| LogError::Rotation("no candidate log files".to_string()))?;

        let path = self.slot_path(oldest);
        if elapsed(mtime, now) < self.rotation_period {
            debug!(path = %path.display(), "all log files are fresh, evicting the oldest");
        }
        truncate(&path, now)?;

        Ok(oldest)
    }

    /// Append `text` plus a line terminator to the current file.
    pub fn append_line(&mut self, now: SystemTime, text: &str) -> LogResult<()> {
        let path = self.current_writable_file(now)?;

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(line.as_bytes())?;

        Ok(())
    }

    /// Delete pool files last modified before `now - retention`.
    ///
    /// Returns the number of files removed.
    pub fn prune_expired(&mut self, now: SystemTime) -> usize {
        let Some(cutoff) = now.checked_sub(self.retention) else {
            return 0;
        };

        let mut removed = 0;
        for index in 0..self.pool_size {
            let path = self.slot_path(index);
            let Some(mtime) = modified(&path) else {
                continue;
            };
            if mtime >= cutoff {
                continue;
            }

            debug!(path = %path.display(), "deleting expired log file");
            match fs::remove_file(&path) {
                Ok(()) => {
                    removed += 1;
                    if self.current.is_some_and(|c| c.index == index) {
                        self.current = None;
                    }
                },
                Err(e) => warn!(path = %path.display(), error = %e, "failed to delete log file"),
            }
        }

        removed
    }

    /// Existing pool files in the requested order.
    pub fn list_files(&self, sort: LogSort) -> Vec<PathBuf> {
        let mut files: Vec<(SystemTime, usize, PathBuf)> = (0..self.pool_size)
            .filter_map(|index| {
                let path = self.slot_path(index);
                modified(&path).map(|mtime| (mtime, index, path))
            })
            .collect();

        files.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        if sort == LogSort::LastModifiedDesc {
            files.reverse();
        }

        files.into_iter().map(|(_, _, path)| path).collect()
    }

    /// Prune, then concatenate every remaining file oldest first.
    ///
    /// Unreadable files are skipped.
    pub fn read_all_contents(&mut self, now: SystemTime) -> String {
        self.prune_expired(now);

        let mut contents = String::new();
        for path in self.list_files(LogSort::LastModifiedAsc) {
            match fs::read_to_string(&path) {
                Ok(text) => contents.push_str(&text),
                Err(e) => warn!(path = %path.display(), error = %e, "failed to read log file"),
            }
        }

        contents
    }
}

impl std::fmt::Debug for LogRotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogRotator")
            .field("directory", &self.directory)
            .field("pool_size", &self.pool_size)
            .field("rotation_period", &self.rotation_period)
            .field("current", &self.current.map(|c| c.index))
            .finish()
    }
}

/// Time from `earlier` to `now`; zero if the clock went backwards.
fn elapsed(earlier: SystemTime, now: SystemTime) -> Duration {
    now.duration_since(earlier).unwrap_or(Duration::ZERO)
}

/// Last-modified time, `None` if the file does not exist.
fn modified(path: &Path) -> Option<SystemTime> {
    let metadata = fs::metadata(path).ok()?;
    Some(metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH))
}

fn truncate(path: &Path, now: SystemTime) -> io::Result<()> {
    let file = File::create(path)?;
    file.set_modified(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const DAY: Duration = Duration::from_secs(86_400);

    fn settings(pool_size: usize, rotation_seconds: u64) -> RotationSettings {
        RotationSettings {
            pool_size,
            rotation_seconds,
            keep_logs_for_days: 1,
            ..Default::default()
        }
    }

    fn rotator(pool_size: usize, rotation_seconds: u64) -> (TempDir, LogRotator) {
        let dir = tempdir().unwrap();
        let rotator = LogRotator::new(dir.path().join("logs"), &settings(pool_size, rotation_seconds))
            .unwrap();
        (dir, rotator)
    }

    fn write_with_mtime(path: &Path, content: &str, mtime: SystemTime) {
        fs::write(path, content).unwrap();
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(mtime).unwrap();
    }

    fn assert_touched_at(path: &Path, now: SystemTime) {
        let mtime = modified(path).unwrap();
        let drift = elapsed(mtime, now).max(elapsed(now, mtime));
        assert!(drift < Duration::from_secs(1), "mtime drifted by {drift:?}");
    }

    #[test]
    fn test_rotator_creates_directory() {
        let (dir, rotator) = rotator(3, 60);
        assert!(dir.path().join("logs").is_dir());
        assert_eq!(rotator.pool_size(), 3);
        assert!(rotator.current_path().is_none());
    }

    #[test]
    fn test_zero_pool_rejected() {
        let dir = tempdir().unwrap();
        let result = LogRotator::new(dir.path(), &settings(0, 60));
        assert!(matches!(result, Err(LogError::Rotation(_))));
    }

    #[test]
    fn test_slot_naming() {
        let (_dir, rotator) = rotator(10, 60);
        let name = rotator.slot_path(9);
        assert_eq!(name.file_name().unwrap(), "sclog_9.txt");
    }

    #[test]
    fn test_first_selection_touches_slot_zero() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(0));
        assert!(path.exists());
        assert_touched_at(&path, now);
    }

    #[test]
    fn test_cache_hit_within_period() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        let first = rotator.current_writable_file(now).unwrap();
        fs::remove_file(&first).unwrap();

        // Cache hit: no I/O, the same file even though it was removed.
        let second = rotator
            .current_writable_file(now + Duration::from_secs(59))
            .unwrap();
        assert_eq!(first, second);
        assert!(!second.exists());
    }

    #[test]
    fn test_rotates_to_missing_slot_after_period() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        let first = rotator.current_writable_file(now).unwrap();
        let second = rotator
            .current_writable_file(now + Duration::from_secs(60))
            .unwrap();

        assert_eq!(first, rotator.slot_path(0));
        assert_eq!(second, rotator.slot_path(1));
        assert_eq!(rotator.current_path(), Some(second));
    }

    #[test]
    fn test_expired_slot_is_reused_empty() {
        let (_dir, mut rotator) = rotator(2, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "old\n", now - Duration::from_secs(600));
        write_with_mtime(&rotator.slot_path(1), "recent\n", now - Duration::from_secs(5));

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(0));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(fs::read_to_string(rotator.slot_path(1)).unwrap(), "recent\n");
        assert_touched_at(&path, now);
    }

    #[test]
    fn test_missing_slot_filled_before_recycling() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "expired\n", now - Duration::from_secs(600));
        write_with_mtime(&rotator.slot_path(2), "also expired\n", now - Duration::from_secs(900));

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(1));
        assert_eq!(fs::read_to_string(rotator.slot_path(0)).unwrap(), "expired\n");
    }

    #[test]
    fn test_recycles_least_recently_modified_slot() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "a\n", now - Duration::from_secs(600));
        write_with_mtime(&rotator.slot_path(1), "b\n", now - Duration::from_secs(900));
        write_with_mtime(&rotator.slot_path(2), "c\n", now - Duration::from_secs(300));

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(1));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_reused_slot_does_not_outlive_retention() {
        let (_dir, mut rotator) = rotator(2, 60);
        let now = SystemTime::now();

        write_with_mtime(
            &rotator.slot_path(0),
            "ancient line\n",
            now - Duration::from_secs(23 * 3600),
        );
        write_with_mtime(&rotator.slot_path(1), "recent line\n", now - Duration::from_secs(10));

        rotator.append_line(now, "new line").unwrap();
        assert_eq!(rotator.current_path(), Some(rotator.slot_path(0)));

        let contents = rotator.read_all_contents(now + Duration::from_secs(2 * 3600));
        assert_eq!(contents, "recent line\nnew line\n");
    }

    #[test]
    fn test_lines_read_back_in_write_order() {
        let (_dir, mut rotator) = rotator(2, 60);
        let start = SystemTime::now();

        for (i, offset) in [0u64, 90, 180, 270].into_iter().enumerate() {
            let at = start + Duration::from_secs(offset);
            rotator.append_line(at, &format!("line {i}")).unwrap();
            // Appends stamp the real clock; pin mtime to the simulated one.
            let current = rotator.current_path().unwrap();
            OpenOptions::new()
                .write(true)
                .open(&current)
                .unwrap()
                .set_modified(at)
                .unwrap();
        }

        let contents = rotator.read_all_contents(start + Duration::from_secs(300));
        assert_eq!(contents, "line 2\nline 3\n");
    }

    #[test]
    fn test_forced_eviction_when_all_fresh() {
        let (_dir, mut rotator) = rotator(2, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "a\n", now - Duration::from_secs(10));
        write_with_mtime(&rotator.slot_path(1), "b\n", now - Duration::from_secs(5));

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(0));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(fs::read_to_string(rotator.slot_path(1)).unwrap(), "b\n");
    }

    #[test]
    fn test_forced_eviction_skips_current_file() {
        let (_dir, mut rotator) = rotator(2, 60);
        let start = SystemTime::now();

        assert_eq!(rotator.current_writable_file(start).unwrap(), rotator.slot_path(0));

        // Both files were written moments ago; the cached selection is stale.
        let now = start + Duration::from_secs(120);
        write_with_mtime(&rotator.slot_path(0), "current\n", now - Duration::from_secs(30));
        write_with_mtime(&rotator.slot_path(1), "other\n", now - Duration::from_secs(1));

        let path = rotator.current_writable_file(now).unwrap();
        assert_eq!(path, rotator.slot_path(1));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(fs::read_to_string(rotator.slot_path(0)).unwrap(), "current\n");
    }

    #[test]
    fn test_single_slot_pool_rotates_onto_itself() {
        let (_dir, mut rotator) = rotator(1, 60);
        let now = SystemTime::now();

        rotator.append_line(now, "first").unwrap();
        let later = now + Duration::from_secs(61);
        rotator.append_line(later, "second").unwrap();

        // The slot was expired at `later`, so it is reused from empty.
        let path = rotator.slot_path(0);
        assert_eq!(fs::read_to_string(path).unwrap(), "second\n");
    }

    #[test]
    fn test_append_line() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        rotator.append_line(now, "one").unwrap();
        rotator.append_line(now, "two").unwrap();

        let contents = fs::read_to_string(rotator.slot_path(0)).unwrap();
        assert_eq!(contents, "one\ntwo\n");
    }

    #[test]
    fn test_prune_expired() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "stale\n", now - 2 * DAY);
        write_with_mtime(&rotator.slot_path(1), "kept\n", now - Duration::from_secs(3600));

        assert_eq!(rotator.prune_expired(now), 1);
        assert!(!rotator.slot_path(0).exists());
        assert!(rotator.slot_path(1).exists());
    }

    #[test]
    fn test_prune_clears_current_selection() {
        let (_dir, mut rotator) = rotator(2, 60);
        let now = SystemTime::now();

        rotator.current_writable_file(now - 2 * DAY).unwrap();
        assert_eq!(rotator.prune_expired(now), 1);
        assert!(rotator.current_path().is_none());
    }

    #[test]
    fn test_read_all_contents_oldest_first() {
        let (_dir, mut rotator) = rotator(3, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "newest\n", now - Duration::from_secs(10));
        write_with_mtime(&rotator.slot_path(1), "expired\n", now - 3 * DAY);
        write_with_mtime(&rotator.slot_path(2), "older\n", now - Duration::from_secs(7200));

        let contents = rotator.read_all_contents(now);
        assert_eq!(contents, "older\nnewest\n");
    }

    #[test]
    fn test_list_files_sorted() {
        let (_dir, rotator) = rotator(3, 60);
        let now = SystemTime::now();

        write_with_mtime(&rotator.slot_path(0), "", now - Duration::from_secs(20));
        write_with_mtime(&rotator.slot_path(2), "", now - Duration::from_secs(40));

        let asc = rotator.list_files(LogSort::LastModifiedAsc);
        assert_eq!(asc, vec![rotator.slot_path(2), rotator.slot_path(0)]);

        let desc = rotator.list_files(LogSort::LastModifiedDesc);
        assert_eq!(desc, vec![rotator.slot_path(0), rotator.slot_path(2)]);
    }
}
