//! Queue store: the state machine over per-location queue snapshots.
//!
//! Every operation follows the same shape: take the location's mutex, read
//! the snapshot from the repository, decide with the pure rules in
//! [`super::state`], write the decision back. Holding the mutex across the
//! read-modify-write closes the admission/promotion race that a bare
//! read-then-write against the remote store would allow.

use std::fmt;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use super::repository::{QueueRepository, RepositoryError};
use super::reset;
use super::state::{
    admission_status, promotion_candidate, sort_by_arrival, EntryStatus, Location, Plate,
    QueueEntry,
};

/// Outcome of an admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub plate: Plate,
    pub status: EntryStatus,
}

/// Target of an operator call: the entry's plate and its stored contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTarget {
    pub plate: Plate,
    pub origin: String,
}

/// Outcome of completing an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub plate: Plate,
    /// The buffered entry promoted into the freed slot, if any.
    pub promoted: Option<Plate>,
}

/// Error from a queue operation.
#[derive(Debug)]
pub enum QueueError {
    /// No entry with that plate at the location.
    NotFound { plate: Plate },
    /// The entry exists but has no stored sender to notify.
    NoContact { plate: Plate },
    /// The repository failed.
    Repository(RepositoryError),
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::NotFound { plate } => write!(f, "no queue entry for {}", plate),
            QueueError::NoContact { plate } => write!(f, "no contact stored for {}", plate),
            QueueError::Repository(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for QueueError {}

impl From<RepositoryError> for QueueError {
    fn from(e: RepositoryError) -> Self {
        QueueError::Repository(e)
    }
}

/// One mutex per location; all read-modify-write sequences for a location
/// run under its mutex.
struct LocationLocks {
    mall: Mutex<()>,
    jatinegara: Mutex<()>,
}

/// Thread-safe coordinator for the per-location queues.
pub struct QueueStore {
    repository: Arc<dyn QueueRepository>,
    locks: LocationLocks,
}

impl QueueStore {
    pub fn new(repository: Arc<dyn QueueRepository>) -> Self {
        Self {
            repository,
            locks: LocationLocks {
                mall: Mutex::new(()),
                jatinegara: Mutex::new(()),
            },
        }
    }

    async fn lock(&self, location: Location) -> MutexGuard<'_, ()> {
        match location {
            Location::MallNusantara => self.locks.mall.lock().await,
            Location::StasiunJatinegara => self.locks.jatinegara.lock().await,
        }
    }

    /// Run the daily reset policy for a location (idempotent per day).
    pub async fn ensure_daily_reset(&self, location: Location) -> Result<bool, RepositoryError> {
        let _guard = self.lock(location).await;
        let cleared = reset::run(&*self.repository, location, &reset::jakarta_today()).await?;
        if cleared {
            info!("Daily reset cleared queue for {}", location);
        }
        Ok(cleared)
    }

    /// Admit a plate into the location's queue.
    ///
    /// The assigned status depends on the current active count; an existing
    /// entry with the same plate is overwritten (last write wins).
    pub async fn register(
        &self,
        location: Location,
        origin: Option<String>,
        plate: Plate,
    ) -> Result<Registration, RepositoryError> {
        let _guard = self.lock(location).await;

        let entries = self.repository.get_location_queue(location).await?;
        let status = admission_status(&entries);

        let entry = QueueEntry {
            plate: plate.clone(),
            origin,
            status,
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.repository.put_entry(location, entry).await?;

        info!("Registered {} at {} as {}", plate, location, status);
        Ok(Registration { plate, status })
    }

    /// All entries for a location in arrival order.
    pub async fn list(&self, location: Location) -> Result<Vec<QueueEntry>, RepositoryError> {
        let _guard = self.lock(location).await;
        let mut entries = self.repository.get_location_queue(location).await?;
        sort_by_arrival(&mut entries);
        Ok(entries)
    }

    /// Resolve the contact for an operator call. Does not change status.
    pub async fn call(&self, location: Location, plate: &Plate) -> Result<CallTarget, QueueError> {
        let _guard = self.lock(location).await;

        let entry = self
            .repository
            .get_entry(location, plate)
            .await?
            .ok_or_else(|| QueueError::NotFound {
                plate: plate.clone(),
            })?;

        let origin = entry.origin.ok_or_else(|| QueueError::NoContact {
            plate: plate.clone(),
        })?;

        Ok(CallTarget {
            plate: entry.plate,
            origin,
        })
    }

    /// Mark an entry done and promote the earliest-buffered entry if the
    /// lobby now has a free slot. At most one entry is promoted.
    pub async fn complete(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Completion, QueueError> {
        let _guard = self.lock(location).await;

        self.repository
            .get_entry(location, plate)
            .await?
            .ok_or_else(|| QueueError::NotFound {
                plate: plate.clone(),
            })?;

        self.repository
            .update_entry_status(location, plate, EntryStatus::Done)
            .await?;

        let entries = self.repository.get_location_queue(location).await?;
        let promoted = promotion_candidate(&entries).map(|e| e.plate.clone());
        if let Some(candidate) = &promoted {
            self.repository
                .update_entry_status(location, candidate, EntryStatus::Active)
                .await?;
            info!("Promoted {} to active at {}", candidate, location);
        }

        info!("Completed {} at {}", plate, location);
        Ok(Completion {
            plate: plate.clone(),
            promoted,
        })
    }

    /// Remove an entry from the queue. A missing plate is an error; see
    /// DESIGN.md for the choice between erroring and silently succeeding.
    pub async fn remove(&self, location: Location, plate: &Plate) -> Result<QueueEntry, QueueError> {
        let _guard = self.lock(location).await;

        let removed = self
            .repository
            .delete_entry(location, plate)
            .await?
            .ok_or_else(|| QueueError::NotFound {
                plate: plate.clone(),
            })?;

        info!("Removed {} from {}", plate, location);
        Ok(removed)
    }
}
