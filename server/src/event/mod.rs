use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::admission::AdmissionCache;
use crate::error::BookingError;
use crate::logger::warn_if_slow;
use crate::seat::model::{Event, Seat};
use crate::seat::repository::SeatRepository;
use crate::time::next_id;

/// Event creation and seat-map reads.
///
/// Creation materializes the full seat grid in one seat-store transaction
/// and then seeds the admission counter. The counter seed is best-effort:
/// losing it only loses the fast path, never correctness.
pub struct EventService {
    repo: Arc<dyn SeatRepository>,
    admission: Option<Arc<dyn AdmissionCache>>,
    admission_ttl_secs: u64,
}

impl EventService {
    pub fn new(
        repo: Arc<dyn SeatRepository>,
        admission: Option<Arc<dyn AdmissionCache>>,
        admission_ttl_secs: u64,
    ) -> Self {
        Self {
            repo,
            admission,
            admission_ttl_secs,
        }
    }

    #[instrument(target = "event", skip(self, name, date), fields(rows, cols))]
    pub async fn create_event(
        &self,
        name: &str,
        date: &str,
        rows: i64,
        cols: i64,
    ) -> Result<Event, BookingError> {
        if name.trim().is_empty() {
            return Err(BookingError::Invalid("name must not be empty".into()));
        }
        let is_iso8601 = chrono::DateTime::parse_from_rfc3339(date).is_ok()
            || chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok();
        if !is_iso8601 {
            return Err(BookingError::Invalid(format!(
                "date is not ISO8601: {date}"
            )));
        }
        if rows < 1 || cols < 1 {
            return Err(BookingError::Invalid(
                "rows and cols must be at least 1".into(),
            ));
        }

        let event = Event {
            id: next_id(),
            name: name.trim().to_string(),
            date: date.to_string(),
            rows,
            cols,
        };

        // The grid insert is the one genuinely heavy write in the system.
        warn_if_slow(
            "insert_event_with_seats",
            event.id,
            Duration::from_millis(500),
            self.repo.insert_event_with_seats(&event),
        )
        .await
        .map_err(BookingError::Internal)?;

        if let Some(ac) = &self.admission {
            ac.seed(event.id, event.total_seats(), self.admission_ttl_secs)
                .await;
        } else {
            warn!(event_id = event.id, "admission cache disabled; no counter seeded");
        }

        info!(
            event_id = event.id,
            seats = event.total_seats(),
            "event created"
        );

        Ok(event)
    }

    /// Full seat map, or `None` for an unknown event.
    pub async fn seat_map(&self, event_id: i64) -> Result<Option<Vec<Seat>>, BookingError> {
        let event = self
            .repo
            .fetch_event(event_id)
            .await
            .map_err(BookingError::Internal)?;

        if event.is_none() {
            return Ok(None);
        }

        let seats = self
            .repo
            .fetch_all_seats(event_id)
            .await
            .map_err(BookingError::Internal)?;

        Ok(Some(seats))
    }
}
