use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::limits::{MAX_ADVANCE_DAYS, MAX_STAY_NIGHTS};
use crate::model::{Order, RoomState, StayRange};

use super::BookingError;

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Shape checks that apply to any stay, new or revised.
pub(crate) fn validate_stay(stay: &StayRange) -> Result<(), BookingError> {
    if stay.check_in >= stay.check_out {
        return Err(BookingError::InvalidRange {
            check_in: stay.check_in,
            check_out: stay.check_out,
            reason: "check-out must be after check-in",
        });
    }
    if stay.nights() > MAX_STAY_NIGHTS {
        return Err(BookingError::LimitExceeded("stay too long"));
    }
    Ok(())
}

/// Validation for a brand-new reservation: the stay must also start today
/// or later, and within the advance-booking horizon.
pub(crate) fn validate_new_stay(stay: &StayRange, now: DateTime<Utc>) -> Result<(), BookingError> {
    validate_stay(stay)?;
    let today = now.date_naive();
    if stay.check_in < today {
        return Err(BookingError::InvalidRange {
            check_in: stay.check_in,
            check_out: stay.check_out,
            reason: "check-in is in the past",
        });
    }
    if (stay.check_in - today).num_days() > MAX_ADVANCE_DAYS {
        return Err(BookingError::LimitExceeded("check-in too far in the future"));
    }
    Ok(())
}

/// Scan a room for an active reservation colliding with `stay` under the
/// half-open rule. Cancelled orders never block, and neither does a
/// PENDING order whose deadline has already elapsed — the sweeper will
/// reclaim it, and a new booking must not be refused on its account.
/// `exclude` lets an order being revised skip itself.
pub(crate) fn find_conflict<'a>(
    room: &'a RoomState,
    stay: &StayRange,
    exclude: Option<Ulid>,
    now: DateTime<Utc>,
) -> Option<&'a Order> {
    room.overlapping(stay)
        .find(|o| Some(o.id) != exclude && o.occupies(now))
}
