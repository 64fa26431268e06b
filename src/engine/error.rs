use chrono::{DateTime, NaiveDate, Utc};
use ulid::Ulid;

use crate::ledger::PersistenceError;
use crate::model::{OrderStatus, StayRange};

#[derive(Debug)]
pub enum BookingError {
    /// The check-in/check-out pair is not a bookable stay.
    InvalidRange {
        check_in: NaiveDate,
        check_out: NaiveDate,
        reason: &'static str,
    },
    RoomNotFound(Ulid),
    GuestNotFound(Ulid),
    OrderNotFound(Ulid),
    /// The requested stay collides with an active reservation. Not a bug:
    /// callers are expected to offer alternative dates.
    RoomUnavailable {
        room_id: Ulid,
        blocking_order: Ulid,
        blocking_stay: StayRange,
    },
    /// The order's decision deadline elapsed during the update; it has been
    /// force-cancelled and its room released. Callers must re-fetch.
    ReservationExpired {
        order_id: Ulid,
        deadline: DateTime<Utc>,
    },
    InvalidTransition {
        order_id: Ulid,
        from: OrderStatus,
    },
    LimitExceeded(&'static str),
    Persistence(PersistenceError),
}

impl BookingError {
    /// Only persistence failures are transient; every validation rejection
    /// is final and must not be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Persistence(_))
    }
}

impl std::fmt::Display for BookingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingError::InvalidRange {
                check_in,
                check_out,
                reason,
            } => write!(f, "invalid stay [{check_in}, {check_out}): {reason}"),
            BookingError::RoomNotFound(id) => write!(f, "room not found: {id}"),
            BookingError::GuestNotFound(id) => write!(f, "guest not found: {id}"),
            BookingError::OrderNotFound(id) => write!(f, "order not found: {id}"),
            BookingError::RoomUnavailable {
                room_id,
                blocking_order,
                blocking_stay,
            } => write!(
                f,
                "room {room_id} unavailable: blocked by order {blocking_order} over [{}, {})",
                blocking_stay.check_in, blocking_stay.check_out
            ),
            BookingError::ReservationExpired { order_id, deadline } => write!(
                f,
                "reservation {order_id} expired at {deadline}; order cancelled and room released"
            ),
            BookingError::InvalidTransition { order_id, from } => {
                write!(f, "order {order_id} cannot transition from {from:?}")
            }
            BookingError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            BookingError::Persistence(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BookingError {}

impl From<PersistenceError> for BookingError {
    fn from(e: PersistenceError) -> Self {
        BookingError::Persistence(e)
    }
}
