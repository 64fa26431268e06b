use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Money in minor units (cents) — the only money type.
pub type Cents = i64;

/// Half-open stay interval `[check_in, check_out)`, counted in nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayRange {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayRange {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Self {
        debug_assert!(check_in < check_out, "check-in must precede check-out");
        Self {
            check_in,
            check_out,
        }
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Two stays collide iff they share at least one night. Touching at a
    /// boundary date (back-to-back bookings) is not an overlap.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

/// Lifecycle of a reservation. PENDING is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Confirmed | OrderStatus::Cancelled)
    }
}

/// Outcome reported by the payment collaborator. Deliberately exhaustive:
/// a new status has to be added here and handled at every match site, it
/// cannot fall through a catch-all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Failed,
    /// The processor has the payment but has not settled it yet.
    PendingConfirmation,
}

impl std::str::FromStr for PaymentStatus {
    type Err = UnknownPaymentStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "PENDING" | "PENDING_CONFIRMATION" => Ok(PaymentStatus::PendingConfirmation),
            _ => Err(UnknownPaymentStatus(s.to_string())),
        }
    }
}

/// A payment status string the engine does not know. Surfaces at the wire
/// boundary instead of being silently treated as PENDING.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentStatus(pub String);

impl std::fmt::Display for UnknownPaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized payment status: {}", self.0)
    }
}

impl std::error::Error for UnknownPaymentStatus {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Booked,
}

/// A reservation of one room for one guest over a stay interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: Ulid,
    pub guest_id: Ulid,
    pub room_id: Ulid,
    pub stay: StayRange,
    /// Nights × the room category's nightly rate, fixed at creation unless
    /// explicitly overridden by a revision.
    pub total: Cents,
    pub created_at: DateTime<Utc>,
    /// A PENDING order left unpaid past this instant is reclaimed by the
    /// sweeper.
    pub deadline: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Whether this order holds its room at `now`: PENDING with a live
    /// deadline, or CONFIRMED.
    pub fn occupies(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            OrderStatus::Pending => self.deadline > now,
            OrderStatus::Confirmed => true,
            OrderStatus::Cancelled => false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == OrderStatus::Pending && self.deadline <= now
    }
}

/// Inventory-facing room record. The nightly rate lives on the category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub category_id: Ulid,
    pub status: RoomStatus,
}

/// Working state for one room: its record plus every order taken for it,
/// sorted by check-in. Cancelled orders keep their slot with the status
/// flipped — payment and review records may still reference them.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub category_id: Ulid,
    pub status: RoomStatus,
    pub orders: Vec<Order>,
}

impl RoomState {
    pub fn new(record: RoomRecord) -> Self {
        Self {
            id: record.id,
            hotel_id: record.hotel_id,
            category_id: record.category_id,
            status: record.status,
            orders: Vec::new(),
        }
    }

    pub fn record(&self) -> RoomRecord {
        RoomRecord {
            id: self.id,
            hotel_id: self.hotel_id,
            category_id: self.category_id,
            status: self.status,
        }
    }

    /// Insert an order maintaining sort order by check-in.
    pub fn insert_order(&mut self, order: Order) {
        let pos = self
            .orders
            .binary_search_by_key(&order.stay.check_in, |o| o.stay.check_in)
            .unwrap_or_else(|e| e);
        self.orders.insert(pos, order);
    }

    /// Insert or replace by id. A replaced order is repositioned in case
    /// its stay moved.
    pub fn upsert_order(&mut self, order: Order) {
        self.remove_order(order.id);
        self.insert_order(order);
    }

    pub fn remove_order(&mut self, id: Ulid) -> Option<Order> {
        if let Some(pos) = self.orders.iter().position(|o| o.id == id) {
            Some(self.orders.remove(pos))
        } else {
            None
        }
    }

    pub fn find_order(&self, id: Ulid) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    /// Orders whose stay overlaps the query window. Binary search skips
    /// everything checking in at or after `query.check_out`.
    pub fn overlapping(&self, query: &StayRange) -> impl Iterator<Item = &Order> {
        let right_bound = self
            .orders
            .partition_point(|o| o.stay.check_in < query.check_out);
        self.orders[..right_bound]
            .iter()
            .filter(move |o| o.stay.check_out > query.check_in)
    }

    /// A room is BOOKED iff at least one order still holds it.
    pub fn occupancy(&self, now: DateTime<Utc>) -> RoomStatus {
        booked_if(self.orders.iter().any(|o| o.occupies(now)))
    }

    /// Occupancy as it will be once `candidate` is written (replacing any
    /// stored order with the same id).
    pub fn occupancy_with(&self, candidate: &Order, now: DateTime<Utc>) -> RoomStatus {
        if candidate.occupies(now) {
            return RoomStatus::Booked;
        }
        booked_if(
            self.orders
                .iter()
                .any(|o| o.id != candidate.id && o.occupies(now)),
        )
    }

    /// Occupancy as it will be once the order `excluded` has left the room.
    pub fn occupancy_excluding(&self, excluded: Ulid, now: DateTime<Utc>) -> RoomStatus {
        booked_if(
            self.orders
                .iter()
                .any(|o| o.id != excluded && o.occupies(now)),
        )
    }
}

fn booked_if(occupied: bool) -> RoomStatus {
    if occupied {
        RoomStatus::Booked
    } else {
        RoomStatus::Available
    }
}

/// Broadcast on the NotifyHub after every committed transition. The mail
/// and front-desk collaborators subscribe per room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    ReservationCreated { order: Order },
    ReservationRevised { order: Order },
    OrderConfirmed { order_id: Ulid, room_id: Ulid },
    OrderCancelled { order_id: Ulid, room_id: Ulid },
    ReservationExpired { order_id: Ulid, room_id: Ulid },
}
