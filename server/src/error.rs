use thiserror::Error;

/// Booking outcome taxonomy. Every component reports one of these kinds;
/// nothing below the HTTP layer deals in status codes.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("invalid booking request: {0}")]
    Invalid(String),

    /// Admission fast path observed a zero counter.
    #[error("event is sold out")]
    SoldOut,

    /// Admission fast path observed fewer remaining seats than requested.
    #[error("only {available} seat(s) left")]
    InsufficientCapacity { available: i64 },

    /// Gatekeeper found at least one requested seat already claimed.
    #[error("one or more seats are already claimed")]
    ConflictCached,

    /// Optimistic commit: seat state changed between fetch and update.
    #[error("seat state changed during commit")]
    ConflictVersion,

    /// Pessimistic commit: another transaction holds the row locks.
    #[error("seats are locked by a concurrent booking")]
    ConflictRowLock,

    #[error("one or more requested seats do not exist")]
    SeatsNotFound,

    #[error("one or more requested seats are already booked")]
    SeatsUnavailable,

    /// Lock store or seat store unreachable / timed out. Transient.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A bug. Not expected in steady state.
    #[error("internal error: {0}")]
    Internal(anyhow::Error),
}

impl BookingError {
    /// Stable wire identifier, surfaced as `errorDetails` on 4xx/5xx bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Invalid(_) => "INVALID",
            Self::SoldOut => "SOLD_OUT",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::ConflictCached => "CONFLICT_CACHED",
            Self::ConflictVersion => "CONFLICT_VERSION",
            Self::ConflictRowLock => "CONFLICT_ROWLOCK",
            Self::SeatsNotFound => "SEATS_NOT_FOUND",
            Self::SeatsUnavailable => "SEATS_UNAVAILABLE",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status for the external boundary. Every race a well-behaved
    /// client might retry is a 409; infrastructure trouble is 503; 500 is
    /// reserved for bugs.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Invalid(_) => 400,
            Self::SoldOut
            | Self::InsufficientCapacity { .. }
            | Self::ConflictCached
            | Self::ConflictVersion
            | Self::ConflictRowLock
            | Self::SeatsNotFound
            | Self::SeatsUnavailable => 409,
            Self::Unavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// True for the kinds produced by losing a race rather than by bad input
    /// or broken infrastructure.
    pub fn is_conflict(&self) -> bool {
        self.http_status() == 409
    }
}
