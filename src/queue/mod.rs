//! Per-location vehicle queues: types, rules, persistence, daily reset.

pub mod repository;
pub mod reset;
pub mod state;
pub mod store;

pub use repository::{FirebaseRepository, InMemoryRepository, QueueRepository, RepositoryError};
pub use state::{EntryStatus, Location, Plate, QueueEntry, LOBBY_CAPACITY};
pub use store::{CallTarget, Completion, QueueError, QueueStore, Registration};
