//! Firebase Realtime Database implementation of `QueueRepository`.
//!
//! Talks to the database's REST surface: every node is addressable as
//! `{base_url}/{path}.json`, GET returns the node (literal `null` when
//! absent), PUT replaces it, PATCH merges, DELETE removes it. An optional
//! `auth` query parameter carries the database secret.
//!
//! Paths mirror the production database layout:
//! `pangkalan/{location}/antrian/{PLATE}` for entries and
//! `pangkalan/{location}/_meta` for the reset marker.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::{QueueRepository, RepositoryError};
use crate::queue::state::{EntryStatus, Location, Plate, QueueEntry};

/// Reset marker node, one per location.
#[derive(Debug, Serialize, Deserialize)]
struct ResetMarker {
    #[serde(rename = "lastReset")]
    last_reset: String,
}

/// Queue repository backed by a Firebase Realtime Database.
pub struct FirebaseRepository {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseRepository {
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            auth_token,
        }
    }

    fn node_url(&self, path: &str) -> String {
        match &self.auth_token {
            Some(token) => format!("{}/{}.json?auth={}", self.base_url, path, token),
            None => format!("{}/{}.json", self.base_url, path),
        }
    }

    fn queue_path(location: Location) -> String {
        format!("pangkalan/{}/antrian", location)
    }

    fn entry_path(location: Location, plate: &Plate) -> String {
        format!("pangkalan/{}/antrian/{}", location, plate)
    }

    fn meta_path(location: Location) -> String {
        format!("pangkalan/{}/_meta", location)
    }

    /// GET a node, decoding `null` (absent node) to `None`.
    async fn get_node<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
    ) -> Result<Option<T>, RepositoryError> {
        let response = self
            .client
            .get(self.node_url(path))
            .send()
            .await
            .map_err(|e| RepositoryError::storage(operation, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RepositoryError::storage(operation, e.to_string()))?;

        if !status.is_success() {
            error!("Firebase read failed: {} - {}", status, body);
            return Err(RepositoryError::storage(
                operation,
                format!("{}: {}", status, body),
            ));
        }

        serde_json::from_str::<Option<T>>(&body)
            .map_err(|e| RepositoryError::storage(operation, format!("decode failed: {}", e)))
    }

    /// Issue a write (PUT/PATCH/DELETE) and check the response status.
    async fn write_node(
        &self,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<(), RepositoryError> {
        let response = request
            .send()
            .await
            .map_err(|e| RepositoryError::storage(operation, e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Firebase write failed: {} - {}", status, body);
            return Err(RepositoryError::storage(
                operation,
                format!("{}: {}", status, body),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueRepository for FirebaseRepository {
    async fn get_location_queue(
        &self,
        location: Location,
    ) -> Result<Vec<QueueEntry>, RepositoryError> {
        let queue: Option<HashMap<String, QueueEntry>> = self
            .get_node("get location queue", &Self::queue_path(location))
            .await?;
        Ok(queue.map(|q| q.into_values().collect()).unwrap_or_default())
    }

    async fn get_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        self.get_node("get entry", &Self::entry_path(location, plate))
            .await
    }

    async fn put_entry(
        &self,
        location: Location,
        entry: QueueEntry,
    ) -> Result<(), RepositoryError> {
        let url = self.node_url(&Self::entry_path(location, &entry.plate));
        self.write_node("put entry", self.client.put(url).json(&entry))
            .await
    }

    async fn update_entry_status(
        &self,
        location: Location,
        plate: &Plate,
        status: EntryStatus,
    ) -> Result<(), RepositoryError> {
        let url = self.node_url(&Self::entry_path(location, plate));
        let patch = json!({ "status": status });
        self.write_node("update entry status", self.client.patch(url).json(&patch))
            .await
    }

    async fn delete_entry(
        &self,
        location: Location,
        plate: &Plate,
    ) -> Result<Option<QueueEntry>, RepositoryError> {
        // The REST DELETE gives no indication whether the node existed, so
        // read it first. The store serializes writers per location, so the
        // read-delete pair cannot interleave with another admin action.
        let existing = self.get_entry(location, plate).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let url = self.node_url(&Self::entry_path(location, plate));
        self.write_node("delete entry", self.client.delete(url))
            .await?;
        Ok(existing)
    }

    async fn clear_location(&self, location: Location) -> Result<(), RepositoryError> {
        let url = self.node_url(&Self::queue_path(location));
        self.write_node("clear location", self.client.delete(url))
            .await
    }

    async fn get_reset_marker(
        &self,
        location: Location,
    ) -> Result<Option<String>, RepositoryError> {
        let marker: Option<ResetMarker> = self
            .get_node("get reset marker", &Self::meta_path(location))
            .await?;
        Ok(marker.map(|m| m.last_reset))
    }

    async fn set_reset_marker(
        &self,
        location: Location,
        date: &str,
    ) -> Result<(), RepositoryError> {
        let url = self.node_url(&Self::meta_path(location));
        let marker = ResetMarker {
            last_reset: date.to_string(),
        };
        self.write_node("set reset marker", self.client.put(url).json(&marker))
            .await
    }
}
