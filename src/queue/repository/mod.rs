//! Repository abstraction for queue persistence.
//!
//! This module defines the `QueueRepository` trait that abstracts storage
//! of per-location queue entries and reset markers. Implementations can
//! provide different backends (in-memory, Firebase RTDB).

mod firebase;
mod memory;

pub use firebase::FirebaseRepository;
pub use memory::InMemoryRepository;

use std::fmt;

use async_trait::async_trait;

use super::state::{EntryStatus, Location, Plate, QueueEntry};

/// Error from a repository operation.
#[derive(Debug)]
pub enum RepositoryError {
    /// The backend failed to carry out an operation.
    Storage { operation: String, detail: String },
}

impl RepositoryError {
    pub fn storage(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        RepositoryError::Storage {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryError::Storage { operation, detail } => {
                write!(f, "storage error during {}: {}", operation, detail)
            }
        }
    }
}

impl std::error::Error for RepositoryError {}

/// Repository trait for per-location queue state.
///
/// The `QueueStore` uses this trait to abstract away storage details; tests
/// inject [`InMemoryRepository`], production wires up [`FirebaseRepository`].
/// Single-key writes are as atomic as the backend makes them; cross-key
/// sequencing is the store's job.
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// All entries for a location, in no particular order.
    async fn get_location_queue(&self, location: Location)
        -> Result<Vec<QueueEntry>, RepositoryError>;

    /// Look up a single entry by plate, `None` if absent.
    async fn get_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError>;

    /// Store an entry (upsert semantics, last write wins).
    async fn put_entry(&self, location: Location, entry: QueueEntry)
        -> Result<(), RepositoryError>;

    /// Overwrite the status of an existing entry. A missing entry is not an
    /// error at this layer; callers check existence first.
    async fn update_entry_status(
        &self,
        location: Location,
        plate: &Plate,
        status: EntryStatus,
    ) -> Result<(), RepositoryError>;

    /// Delete an entry, returning it if it existed.
    async fn delete_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError>;

    /// Remove every entry for a location (daily reset).
    async fn clear_location(&self, location: Location) -> Result<(), RepositoryError>;

    /// The location's last-reset date (`YYYY-MM-DD`), `None` if never reset.
    async fn get_reset_marker(&self, location: Location)
        -> Result<Option<String>, RepositoryError>;

    /// Record the location's last-reset date.
    async fn set_reset_marker(&self, location: Location, date: &str)
        -> Result<(), RepositoryError>;
}
