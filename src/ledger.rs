use async_trait::async_trait;
use dashmap::DashMap;
use ulid::Ulid;

use crate::model::{Order, OrderStatus, RoomStatus};

/// Transient storage failure. Callers may retry; the sweeper defers the
/// affected order to its next cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceError(String);

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "persistence failure: {}", self.0)
    }
}

impl std::error::Error for PersistenceError {}

/// The reservation ledger collaborator: the durable home of every order.
///
/// The engine keeps the working state in memory and writes through; the
/// ledger is replayed once when the engine opens. Orders are only ever
/// inserted or updated here — deletion is an administrative operation that
/// never goes through the booking core.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Every order ever recorded, for startup replay.
    async fn load_all(&self) -> Result<Vec<Order>, PersistenceError>;

    /// Insert or update a single order.
    async fn record_order(&self, order: &Order) -> Result<(), PersistenceError>;

    /// Insert or update an order together with its room's status flip.
    /// Both land or neither does — the engine's one transactional boundary.
    async fn record_order_and_room(
        &self,
        order: &Order,
        room_id: Ulid,
        status: RoomStatus,
    ) -> Result<(), PersistenceError>;

    /// Room status alone (the released side of a room move).
    async fn record_room(&self, room_id: Ulid, status: RoomStatus)
    -> Result<(), PersistenceError>;

    /// Non-cancelled orders for one room.
    async fn find_active_for_room(&self, room_id: Ulid) -> Result<Vec<Order>, PersistenceError>;
}

/// In-memory ledger stand-in used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryLedger {
    orders: DashMap<Ulid, Order>,
    room_status: DashMap<Ulid, RoomStatus>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, id: Ulid) -> Option<Order> {
        self.orders.get(&id).map(|e| e.value().clone())
    }

    pub fn room_status(&self, room_id: Ulid) -> Option<RoomStatus> {
        self.room_status.get(&room_id).map(|e| *e.value())
    }

    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn load_all(&self) -> Result<Vec<Order>, PersistenceError> {
        Ok(self.orders.iter().map(|e| e.value().clone()).collect())
    }

    async fn record_order(&self, order: &Order) -> Result<(), PersistenceError> {
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn record_order_and_room(
        &self,
        order: &Order,
        room_id: Ulid,
        status: RoomStatus,
    ) -> Result<(), PersistenceError> {
        self.orders.insert(order.id, order.clone());
        self.room_status.insert(room_id, status);
        Ok(())
    }

    async fn record_room(
        &self,
        room_id: Ulid,
        status: RoomStatus,
    ) -> Result<(), PersistenceError> {
        self.room_status.insert(room_id, status);
        Ok(())
    }

    async fn find_active_for_room(&self, room_id: Ulid) -> Result<Vec<Order>, PersistenceError> {
        Ok(self
            .orders
            .iter()
            .filter(|e| e.value().room_id == room_id && e.value().status != OrderStatus::Cancelled)
            .map(|e| e.value().clone())
            .collect())
    }
}
