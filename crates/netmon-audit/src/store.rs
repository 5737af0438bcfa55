//! Append-only audit log on disk.
//!
//! Events are written as JSON lines, one file per UTC day:
//! ```text
//! {dir}/
//!   audit-2026-10-15.jsonl
//!   audit-2026-10-16.jsonl
//! ```
//! Each line is an [`AuditRecord`]: the event plus its BLAKE3 hash.
//! Retention removes files older than `max_age_days`, then the oldest files
//! until the directory fits in `max_total_bytes`. It runs when a new day's
//! file is opened and again every `check_every` appends. The file being
//! written is never removed.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};

use netmon_core::AuditEvent;

use crate::hash::compute_event_hash;

const FILE_PREFIX: &str = "audit-";
const FILE_SUFFIX: &str = ".jsonl";

/// Errors that can occur during audit log operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditStoreError {
    #[error("Integrity check failed at {path}:{line}: stored hash does not match content")]
    IntegrityViolation { path: PathBuf, line: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One persisted line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditRecord {
    pub event: AuditEvent,
    /// BLAKE3 hex digest of `event`.
    pub hash: String,
}

impl AuditRecord {
    pub fn seal(event: AuditEvent) -> Self {
        let hash = compute_event_hash(&event);
        Self { event, hash }
    }

    pub fn verify(&self) -> bool {
        self.hash == compute_event_hash(&self.event)
    }
}

/// How much audit history to keep on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_age_days: u32,
    pub max_total_bytes: u64,
    /// Appends between retention passes within one day. Zero disables them.
    pub check_every: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_age_days: 14,
            max_total_bytes: 256 * 1024 * 1024,
            check_every: 1000,
        }
    }
}

/// Daily-rotated audit log writer.
pub struct AuditLog {
    dir: PathBuf,
    retention: RetentionPolicy,
    current: Option<(NaiveDate, File)>,
    appends_since_prune: u32,
}

impl AuditLog {
    /// Open a log rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, retention: RetentionPolicy) -> Result<Self, AuditStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            retention,
            current: None,
            appends_since_prune: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding events for `day`.
    pub fn file_for(&self, day: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", day.format("%Y-%m-%d")))
    }

    /// Append one event to the file for its UTC day.
    pub fn append(&mut self, event: &AuditEvent) -> Result<(), AuditStoreError> {
        let day = event.timestamp.date_naive();
        let line = serde_json::to_string(&AuditRecord::seal(event.clone()))?;

        let file = match self.current.take() {
            Some((open_day, file)) if open_day == day => file,
            _ => {
                let path = self.file_for(day);
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                tracing::debug!(path = %path.display(), "Audit log rotated");
                self.apply_retention(day);
                file
            }
        };
        let file = &mut self.current.insert((day, file)).1;

        writeln!(file, "{line}")?;
        file.flush()?;

        self.appends_since_prune += 1;
        if self.retention.check_every > 0 && self.appends_since_prune >= self.retention.check_every {
            self.apply_retention(day);
        }
        Ok(())
    }

    fn apply_retention(&mut self, today: NaiveDate) {
        self.appends_since_prune = 0;
        if let Err(e) = self.prune(today) {
            tracing::warn!(error = %e, "Audit log retention failed");
        }
    }

    /// Apply the retention policy relative to `today`. Returns files removed.
    pub fn prune(&self, today: NaiveDate) -> Result<usize, AuditStoreError> {
        let mut files = self.list_files()?;
        files.sort_by_key(|(day, _, _)| *day);

        let cutoff = today - TimeDelta::days(i64::from(self.retention.max_age_days));
        let mut removed = 0;
        let mut kept = Vec::new();
        for (day, path, size) in files {
            if day < cutoff {
                fs::remove_file(&path)?;
                removed += 1;
            } else {
                kept.push((day, path, size));
            }
        }

        let mut total: u64 = kept.iter().map(|(_, _, size)| size).sum();
        for (day, path, size) in &kept {
            if total <= self.retention.max_total_bytes || *day == today {
                break;
            }
            fs::remove_file(path)?;
            total -= size;
            removed += 1;
        }

        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "Pruned audit log files");
        }
        Ok(removed)
    }

    /// Read and verify every event recorded for `day`.
    pub fn read_day(&self, day: NaiveDate) -> Result<Vec<AuditEvent>, AuditStoreError> {
        let path = self.file_for(day);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&path)?);
        let mut events = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: AuditRecord = serde_json::from_str(&line)?;
            if !record.verify() {
                return Err(AuditStoreError::IntegrityViolation {
                    path,
                    line: idx + 1,
                });
            }
            events.push(record.event);
        }
        Ok(events)
    }

    /// `(day, path, size)` for every audit file in the directory.
    fn list_files(&self) -> Result<Vec<(NaiveDate, PathBuf, u64)>, AuditStoreError> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            let Some(day) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_file_day)
            else {
                continue;
            };
            files.push((day, path, entry.metadata()?.len()));
        }
        Ok(files)
    }
}

fn parse_file_day(name: &str) -> Option<NaiveDate> {
    let date = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
