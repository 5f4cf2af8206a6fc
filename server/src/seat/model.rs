use serde::{Deserialize, Serialize};

/// An event with a fixed rectangular seat grid. Immutable after creation.
#[derive(Clone, Debug)]
pub struct Event {
    pub id: i64,
    pub name: String,
    /// ISO8601 date string as supplied on the wire.
    pub date: String,
    pub rows: i64,
    pub cols: i64,
}

impl Event {
    pub fn total_seats(&self) -> i64 {
        self.rows * self.cols
    }
}

/// Seat lifecycle. `Booked` is terminal: once a seat is booked the pair
/// `(status, holder)` never changes again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeatStatus {
    Available,
    Booked,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Booked => "BOOKED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(Self::Available),
            "BOOKED" => Some(Self::Booked),
            _ => None,
        }
    }
}

/// A persisted seat row. `holder` is set exactly when `status` is `Booked`.
#[derive(Clone, Debug)]
pub struct Seat {
    pub id: i64,
    pub event_id: i64,
    pub row: String,
    pub col: String,
    pub status: SeatStatus,
    pub holder: Option<String>,
}

/// Natural seat coordinates within an event. Row and column are opaque
/// labels, not numbers, so `"A"` and `"12"` are both valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRef {
    pub row: String,
    pub col: String,
}

impl SeatRef {
    pub fn new(row: impl Into<String>, col: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            col: col.into(),
        }
    }

    /// Lock-store hash field for this seat, `"row-col"`.
    pub fn lock_field(&self) -> String {
        format!("{}-{}", self.row, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_field_joins_row_and_col() {
        assert_eq!(SeatRef::new("A", "12").lock_field(), "A-12");
        assert_eq!(SeatRef::new("1", "1").lock_field(), "1-1");
    }

    #[test]
    fn status_round_trips_wire_names() {
        assert_eq!(SeatStatus::parse("AVAILABLE"), Some(SeatStatus::Available));
        assert_eq!(SeatStatus::parse("BOOKED"), Some(SeatStatus::Booked));
        assert_eq!(SeatStatus::parse("RESERVED"), None);
        assert_eq!(SeatStatus::Booked.as_str(), "BOOKED");
    }

    #[test]
    fn total_seats_is_rows_times_cols() {
        let e = Event {
            id: 1,
            name: "gig".into(),
            date: "2026-09-01T20:00:00Z".into(),
            rows: 40,
            cols: 25,
        };
        assert_eq!(e.total_seats(), 1_000);
    }
}
