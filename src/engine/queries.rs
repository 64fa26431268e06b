use chrono::{DateTime, Utc};
use ulid::Ulid;

use crate::model::{Order, RoomStatus, StayRange};

use super::conflict::{self, find_conflict};
use super::{BookingError, Engine};

impl Engine {
    /// Would the proposed stay collide with an active reservation?
    /// `exclude` lets an order being revised skip itself. Read-only.
    pub async fn has_conflict(
        &self,
        room_id: Ulid,
        stay: StayRange,
        exclude: Option<Ulid>,
    ) -> Result<bool, BookingError> {
        conflict::validate_stay(&stay)?;
        let rs = self.room_state(&room_id).await?;
        let guard = rs.read().await;
        Ok(find_conflict(&guard, &stay, exclude, conflict::now()).is_some())
    }

    pub async fn get_order(&self, order_id: Ulid) -> Result<Order, BookingError> {
        let room_id = self
            .order_to_room
            .get(&order_id)
            .map(|e| *e.value())
            .ok_or(BookingError::OrderNotFound(order_id))?;
        let rs = self.room_state(&room_id).await?;
        let guard = rs.read().await;
        guard
            .find_order(order_id)
            .cloned()
            .ok_or(BookingError::OrderNotFound(order_id))
    }

    /// Orders currently holding the room: PENDING with a live deadline, or
    /// CONFIRMED.
    pub async fn active_orders_for_room(&self, room_id: Ulid) -> Result<Vec<Order>, BookingError> {
        let rs = self.room_state(&room_id).await?;
        let guard = rs.read().await;
        let now = conflict::now();
        Ok(guard
            .orders
            .iter()
            .filter(|o| o.occupies(now))
            .cloned()
            .collect())
    }

    pub async fn room_status(&self, room_id: Ulid) -> Result<RoomStatus, BookingError> {
        let rs = self.room_state(&room_id).await?;
        let guard = rs.read().await;
        Ok(guard.status)
    }

    /// Expired PENDING orders as (order id, room id), for the sweeper.
    /// Rooms under active mutation are skipped; the next cycle picks them
    /// up.
    pub fn collect_expired(&self, now: DateTime<Utc>) -> Vec<(Ulid, Ulid)> {
        let mut expired = Vec::new();
        for entry in self.rooms.iter() {
            let rs = entry.value().clone();
            if let Ok(guard) = rs.try_read() {
                for order in &guard.orders {
                    if order.is_expired(now) {
                        expired.push((order.id, guard.id));
                    }
                }
            }
        }
        expired
    }
}
