//! Checkpoint metadata and resume state
//!
//! The checkpoint CSV alone cannot say which page the crawl reached: a run
//! can stop mid-page, which makes the `records / page-size` arithmetic
//! wrong. A small sidecar JSON file records the last COMPLETED page and the
//! record count at that page boundary; resume truncates to the boundary and
//! continues on the next page. The arithmetic remains as a fallback for
//! checkpoints written without a sidecar.

use crate::records::ListingRecord;
use crate::storage::{csv_store, StorageResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Sidecar state written after every completed page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    /// Last page whose cards were fully processed
    pub completed_page: u32,

    /// Record count at the moment that page finished
    pub record_count: usize,
}

/// Crawl state reconstructed from a checkpoint
#[derive(Debug)]
pub struct ResumeState {
    pub records: Vec<ListingRecord>,
    pub next_page: u32,
}

/// Persists the sidecar atomically
pub fn save_meta(path: &Path, meta: &CheckpointMeta) -> StorageResult<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, serde_json::to_string_pretty(meta)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads the sidecar; a missing or malformed file is treated as absent
pub fn load_meta(path: &Path) -> Option<CheckpointMeta> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::warn!(
                "Ignoring malformed checkpoint metadata {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

/// Reconstructs crawl state from the checkpoint files, if any exist
///
/// Returns `Ok(None)` when there is no checkpoint CSV, i.e. a fresh crawl.
pub fn load_resume_state(
    checkpoint_path: &Path,
    meta_path: &Path,
    page_size: usize,
) -> StorageResult<Option<ResumeState>> {
    if !checkpoint_path.exists() {
        return Ok(None);
    }

    let mut records = csv_store::load_listings(checkpoint_path)?;
    let next_page = match load_meta(meta_path) {
        Some(meta) => {
            // Drop any partial-page tail so page accounting stays exact
            records.truncate(meta.record_count);
            meta.completed_page + 1
        }
        None => (records.len() / page_size) as u32 + 1,
    };

    Ok(Some(ResumeState { records, next_page }))
}

/// Removes checkpoint files so the next crawl starts from page 1
pub fn clear(checkpoint_path: &Path, meta_path: &Path) -> StorageResult<()> {
    for path in [checkpoint_path, meta_path] {
        if path.exists() {
            fs::remove_file(path)?;
        }
    }
    Ok(())
}
