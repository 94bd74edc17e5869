//! Queue entry types and the pure admission/promotion rules.
//!
//! Everything in this module is side-effect free: the functions take a
//! snapshot of a location's entries and answer questions about it. The
//! `QueueStore` is responsible for reading snapshots from the repository
//! and writing decisions back.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How many entries may hold `active` status at one location.
pub const LOBBY_CAPACITY: usize = 3;

/// The two fixed queueing sites. Each has its own isolated queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    MallNusantara,
    StasiunJatinegara,
}

impl Location {
    pub const ALL: [Location; 2] = [Location::MallNusantara, Location::StasiunJatinegara];

    /// The identifier used in store paths and in the admin `lokasi` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::MallNusantara => "mall_nusantara",
            Location::StasiunJatinegara => "stasiun_jatinegara",
        }
    }

    /// Parse an admin `lokasi` parameter. Unknown values are a caller error.
    pub fn from_param(value: &str) -> Option<Location> {
        match value {
            "mall_nusantara" => Some(Location::MallNusantara),
            "stasiun_jatinegara" => Some(Location::StasiunJatinegara),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Newtype for a normalized vehicle plate, the key of a queue entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plate(pub String);

impl Plate {
    /// Normalize a raw token into a plate identifier (uppercased).
    pub fn normalize(raw: &str) -> Plate {
        Plate(raw.to_uppercase())
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Eligible to be called to the lobby.
    Active,
    /// Waiting for a lobby slot to free up.
    Buffered,
    /// Completed by an operator.
    Done,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryStatus::Active => "active",
            EntryStatus::Buffered => "buffered",
            EntryStatus::Done => "done",
        };
        write!(f, "{}", s)
    }
}

/// A single queue entry as stored per location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub plate: Plate,
    /// Sender identifier for outbound replies. May be absent for entries
    /// created without a recorded sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub status: EntryStatus,
    /// RFC 3339 timestamp, compared lexicographically for ordering only.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl QueueEntry {
    /// Arrival ordering key: `createdAt` first, plate as the deterministic
    /// tiebreak.
    fn arrival_key(&self) -> (&str, &str) {
        (self.created_at.as_str(), self.plate.0.as_str())
    }
}

/// Count of entries currently holding `active` status.
pub fn active_count(entries: &[QueueEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.status == EntryStatus::Active)
        .count()
}

/// Status assigned to a newly admitted entry, given the current snapshot.
pub fn admission_status(entries: &[QueueEntry]) -> EntryStatus {
    if active_count(entries) >= LOBBY_CAPACITY {
        EntryStatus::Buffered
    } else {
        EntryStatus::Active
    }
}

/// Sort entries into arrival order (ascending `createdAt`, plate tiebreak).
pub fn sort_by_arrival(entries: &mut [QueueEntry]) {
    entries.sort_by(|a, b| a.arrival_key().cmp(&b.arrival_key()));
}

/// The entry to promote when a lobby slot frees up: the earliest-buffered
/// entry, but only while the active count is below capacity.
///
/// Returns `None` when the lobby is still full or no entry is buffered.
pub fn promotion_candidate(entries: &[QueueEntry]) -> Option<&QueueEntry> {
    if active_count(entries) >= LOBBY_CAPACITY {
        return None;
    }
    entries
        .iter()
        .filter(|e| e.status == EntryStatus::Buffered)
        .min_by(|a, b| a.arrival_key().cmp(&b.arrival_key()))
}
