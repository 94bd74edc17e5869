//! In-memory implementation of `QueueRepository`.
//!
//! All state is held in memory and lost on restart. Used by tests and
//! local runs without a configured database.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{QueueRepository, RepositoryError};
use crate::queue::state::{EntryStatus, Location, Plate, QueueEntry};

/// In-memory queue repository.
///
/// Entries are kept per location in a `BTreeMap` keyed by plate so that
/// iteration order is deterministic.
pub struct InMemoryRepository {
    queues: RwLock<HashMap<Location, BTreeMap<String, QueueEntry>>>,
    markers: RwLock<HashMap<Location, String>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            markers: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueueRepository for InMemoryRepository {
    async fn get_location_queue(
        &self,
        location: Location,
    ) -> Result<Vec<QueueEntry>, RepositoryError> {
        let queues = self.queues.read().await;
        Ok(queues
            .get(&location)
            .map(|q| q.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn get_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        let queues = self.queues.read().await;
        Ok(queues
            .get(&location)
            .and_then(|q| q.get(&plate.0))
            .cloned())
    }

    async fn put_entry(
        &self,
        location: Location,
        entry: QueueEntry,
    ) -> Result<(), RepositoryError> {
        let mut queues = self.queues.write().await;
        queues
            .entry(location)
            .or_default()
            .insert(entry.plate.0.clone(), entry);
        Ok(())
    }

    async fn update_entry_status(
        &self,
        location: Location,
        plate: &Plate,
        status: EntryStatus,
    ) -> Result<(), RepositoryError> {
        let mut queues = self.queues.write().await;
        if let Some(entry) = queues.get_mut(&location).and_then(|q| q.get_mut(&plate.0)) {
            entry.status = status;
        }
        Ok(())
    }

    async fn delete_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        let mut queues = self.queues.write().await;
        Ok(queues.get_mut(&location).and_then(|q| q.remove(&plate.0)))
    }

    async fn clear_location(&self, location: Location) -> Result<(), RepositoryError> {
        let mut queues = self.queues.write().await;
        queues.remove(&location);
        Ok(())
    }

    async fn get_reset_marker(
        &self,
        location: Location,
    ) -> Result<Option<String>, RepositoryError> {
        let markers = self.markers.read().await;
        Ok(markers.get(&location).cloned())
    }

    async fn set_reset_marker(
        &self,
        location: Location,
        date: &str,
    ) -> Result<(), RepositoryError> {
        let mut markers = self.markers.write().await;
        markers.insert(location, date.to_string());
        Ok(())
    }
}
