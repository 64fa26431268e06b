mod conflict;
mod error;
mod pricing;
mod queries;
mod reservations;

pub use error::BookingError;
pub use pricing::stay_total;
pub use reservations::ReservationUpdate;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracing::warn;
use ulid::Ulid;

use crate::config::BookingPolicy;
use crate::inventory::Inventory;
use crate::ledger::Ledger;
use crate::model::{Order, OrderEvent, RoomState, RoomStatus};
use crate::notify::NotifyHub;
use crate::observability;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// The reservation engine: decides whether a room may be booked for a
/// requested stay, runs each order's lifecycle against payment outcomes,
/// and hands expired PENDING orders to the sweeper.
///
/// Each room's state sits behind its own `RwLock`; holding the write lock
/// across the conflict check and the ledger write is what serializes
/// check-then-insert per room. There is no global lock.
pub struct Engine {
    rooms: DashMap<Ulid, SharedRoomState>,
    /// Reverse lookup: order id → room id.
    order_to_room: DashMap<Ulid, Ulid>,
    inventory: Arc<dyn Inventory>,
    ledger: Arc<dyn Ledger>,
    notify: Arc<NotifyHub>,
    policy: BookingPolicy,
}

impl Engine {
    /// Build the engine by replaying the ledger's order history into
    /// per-room working state. Room status is recomputed from the orders,
    /// not trusted from storage.
    pub async fn open(
        inventory: Arc<dyn Inventory>,
        ledger: Arc<dyn Ledger>,
        notify: Arc<NotifyHub>,
        policy: BookingPolicy,
    ) -> Result<Self, BookingError> {
        let engine = Self {
            rooms: DashMap::new(),
            order_to_room: DashMap::new(),
            inventory,
            ledger,
            notify,
            policy,
        };

        let orders = engine.ledger.load_all().await?;
        let now = conflict::now();
        for order in orders {
            let rs = match engine.room_state(&order.room_id).await {
                Ok(rs) => rs,
                Err(BookingError::RoomNotFound(id)) => {
                    warn!(order = %order.id, room = %id, "replay: order references unknown room, skipping");
                    continue;
                }
                Err(e) => return Err(e),
            };
            // Sole owner during replay — try_write never contends.
            let mut guard = rs.try_write().expect("replay: uncontended write");
            engine.order_to_room.insert(order.id, order.room_id);
            guard.insert_order(order);
            guard.status = guard.occupancy(now);
        }

        Ok(engine)
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Room working state, loaded lazily from the inventory on first use.
    pub(crate) async fn room_state(&self, id: &Ulid) -> Result<SharedRoomState, BookingError> {
        if let Some(entry) = self.rooms.get(id) {
            return Ok(entry.value().clone());
        }
        let record = self
            .inventory
            .room(*id)
            .await?
            .ok_or(BookingError::RoomNotFound(*id))?;
        let entry = self
            .rooms
            .entry(*id)
            .or_insert_with(|| Arc::new(RwLock::new(RoomState::new(record))));
        Ok(entry.value().clone())
    }

    /// Lookup order → room, fetch the room, take its write lock.
    pub(crate) async fn resolve_order_write(
        &self,
        order_id: &Ulid,
    ) -> Result<(Ulid, OwnedRwLockWriteGuard<RoomState>), BookingError> {
        let room_id = self
            .order_to_room
            .get(order_id)
            .map(|e| *e.value())
            .ok_or(BookingError::OrderNotFound(*order_id))?;
        let rs = self.room_state(&room_id).await?;
        let guard = rs.write_owned().await;
        Ok((room_id, guard))
    }

    /// Ledger write + in-memory apply + notify, in that order. Nothing
    /// mutates until the ledger accepted the record, which is what makes
    /// the order/room-status flip both-or-neither.
    pub(crate) async fn commit(
        &self,
        rs: &mut RoomState,
        order: Order,
        event: OrderEvent,
    ) -> Result<Order, BookingError> {
        let status = rs.occupancy_with(&order, conflict::now());
        if status == rs.status {
            self.ledger.record_order(&order).await?;
        } else {
            self.ledger
                .record_order_and_room(&order, rs.id, status)
                .await?;
        }
        self.apply(rs, order.clone(), status);
        self.notify.send(rs.id, &event);
        Ok(order)
    }

    fn apply(&self, rs: &mut RoomState, order: Order, status: RoomStatus) {
        track_room_status(rs.status, status);
        self.order_to_room.insert(order.id, rs.id);
        rs.upsert_order(order);
        rs.status = status;
    }
}

fn track_room_status(old: RoomStatus, new: RoomStatus) {
    match (old, new) {
        (RoomStatus::Available, RoomStatus::Booked) => {
            metrics::gauge!(observability::ROOMS_BOOKED).increment(1.0);
        }
        (RoomStatus::Booked, RoomStatus::Available) => {
            metrics::gauge!(observability::ROOMS_BOOKED).decrement(1.0);
        }
        _ => {}
    }
}
