//! Daily reset policy.
//!
//! Each location's queue is wiped once per calendar day, where "day" is the
//! date in Asia/Jakarta. A marker record per location gates the wipe; the
//! first command of a new day clears the queue, every later invocation that
//! day is a no-op.

use chrono::Utc;
use chrono_tz::Asia::Jakarta;

use super::repository::{QueueRepository, RepositoryError};
use super::state::Location;

/// Today's date in the queue's business timezone, formatted `YYYY-MM-DD`.
pub fn jakarta_today() -> String {
    Utc::now().with_timezone(&Jakarta).format("%Y-%m-%d").to_string()
}

/// Clear the location's queue if its marker predates `today`.
///
/// Returns `true` if the queue was cleared. Callers serialize invocations
/// per location; the policy itself does no locking.
pub(crate) async fn run(
    repository: &dyn QueueRepository,
    location: Location,
    today: &str,
) -> Result<bool, RepositoryError> {
    let marker = repository.get_reset_marker(location).await?;
    if marker.as_deref() == Some(today) {
        return Ok(false);
    }

    repository.clear_location(location).await?;
    repository.set_reset_marker(location, today).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::repository::InMemoryRepository;
    use crate::queue::state::{EntryStatus, Plate, QueueEntry};

    fn test_entry(plate: &str) -> QueueEntry {
        QueueEntry {
            plate: Plate::normalize(plate),
            origin: None,
            status: EntryStatus::Active,
            created_at: "2024-06-01T08:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_run_clears_and_marks() {
        let repo = InMemoryRepository::new();
        repo.put_entry(Location::MallNusantara, test_entry("B1"))
            .await
            .unwrap();

        let cleared = run(&repo, Location::MallNusantara, "2024-06-02")
            .await
            .unwrap();

        assert!(cleared);
        assert!(repo
            .get_location_queue(Location::MallNusantara)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            repo.get_reset_marker(Location::MallNusantara).await.unwrap(),
            Some("2024-06-02".to_string())
        );
    }

    #[tokio::test]
    async fn test_same_day_run_is_noop() {
        let repo = InMemoryRepository::new();
        run(&repo, Location::MallNusantara, "2024-06-02")
            .await
            .unwrap();

        // An entry admitted after the morning reset must survive later
        // invocations on the same day.
        repo.put_entry(Location::MallNusantara, test_entry("B1"))
            .await
            .unwrap();

        let cleared = run(&repo, Location::MallNusantara, "2024-06-02")
            .await
            .unwrap();

        assert!(!cleared);
        assert_eq!(
            repo.get_location_queue(Location::MallNusantara)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_next_day_clears_again() {
        let repo = InMemoryRepository::new();
        run(&repo, Location::MallNusantara, "2024-06-02")
            .await
            .unwrap();
        repo.put_entry(Location::MallNusantara, test_entry("B1"))
            .await
            .unwrap();

        let cleared = run(&repo, Location::MallNusantara, "2024-06-03")
            .await
            .unwrap();

        assert!(cleared);
        assert!(repo
            .get_location_queue(Location::MallNusantara)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_locations_reset_independently() {
        let repo = InMemoryRepository::new();
        run(&repo, Location::MallNusantara, "2024-06-02")
            .await
            .unwrap();

        // The other location's marker is untouched.
        assert_eq!(
            repo.get_reset_marker(Location::StasiunJatinegara)
                .await
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_jakarta_today_format() {
        let today = jakarta_today();
        assert_eq!(today.len(), 10);
        assert_eq!(&today[4..5], "-");
        assert_eq!(&today[7..8], "-");
    }
}
