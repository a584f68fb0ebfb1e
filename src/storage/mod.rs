//! CSV persistence for listing records and crawl checkpoints
//!
//! Both the checkpoint file and the final output share one schema, so a
//! checkpoint is just an early copy of the output. Writes go through a
//! temporary file and a rename so a crash mid-write never truncates the
//! previous snapshot.

pub mod checkpoint;
mod csv_store;

pub use checkpoint::{CheckpointMeta, ResumeState};
pub use csv_store::{load_listings, save_enriched, save_listings};

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint metadata error: {0}")]
    Meta(#[from] serde_json::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
