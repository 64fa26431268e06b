use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OwnedRwLockWriteGuard;
use ulid::Ulid;

use crate::ledger::PersistenceError;
use crate::limits::MAX_ORDERS_PER_ROOM;
use crate::model::{Cents, Order, OrderEvent, OrderStatus, PaymentStatus, RoomState, StayRange};
use crate::observability;

use super::conflict::{find_conflict, now, validate_new_stay, validate_stay};
use super::pricing::stay_total;
use super::{BookingError, Engine, track_room_status};

/// Field changes accepted by [`Engine::update_reservation`]. `None` leaves
/// a field untouched. An explicit `deadline` is an explicit reset and may
/// move it in either direction; left unset, the deadline never decreases.
#[derive(Debug, Clone, Default)]
pub struct ReservationUpdate {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub room_id: Option<Ulid>,
    pub deadline: Option<DateTime<Utc>>,
    /// Explicit override for the total. Without it, a stay or room change
    /// reprices at the (new) room's nightly rate.
    pub total: Option<Cents>,
}

impl Engine {
    /// Take a booking: validate guest and room, check the stay for
    /// conflicts, price it, and persist the PENDING order together with
    /// the room's flip to BOOKED. The room's write lock is held from the
    /// conflict check through the ledger write, so two racing requests for
    /// the same room cannot both pass the check.
    pub async fn create_reservation(
        &self,
        guest_id: Ulid,
        room_id: Ulid,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Result<Order, BookingError> {
        let t = now();
        let stay = StayRange {
            check_in,
            check_out,
        };
        validate_new_stay(&stay, t)?;

        if !self.inventory.guest_exists(guest_id).await? {
            return Err(BookingError::GuestNotFound(guest_id));
        }
        let rs = self.room_state(&room_id).await?;
        let rate = self
            .inventory
            .nightly_rate(room_id)
            .await?
            .ok_or_else(|| PersistenceError::new("room category has no nightly rate"))?;

        let mut guard = rs.write_owned().await;
        if guard.orders.len() >= MAX_ORDERS_PER_ROOM {
            return Err(BookingError::LimitExceeded("too many orders on room"));
        }
        if let Some(blocking) = find_conflict(&guard, &stay, None, t) {
            metrics::counter!(observability::RESERVATIONS_REJECTED_TOTAL, "reason" => "conflict")
                .increment(1);
            return Err(BookingError::RoomUnavailable {
                room_id,
                blocking_order: blocking.id,
                blocking_stay: blocking.stay,
            });
        }

        let order = Order {
            id: Ulid::new(),
            guest_id,
            room_id,
            stay,
            total: stay_total(&stay, rate),
            created_at: t,
            deadline: t + self.policy.reservation_window,
            status: OrderStatus::Pending,
        };
        let event = OrderEvent::ReservationCreated {
            order: order.clone(),
        };
        let order = self.commit(&mut guard, order, event).await?;
        metrics::counter!(observability::RESERVATIONS_TOTAL).increment(1);
        Ok(order)
    }

    /// Apply an outcome delivered by the payment collaborator. PAID
    /// confirms, FAILED cancels and releases the room, an unsettled
    /// payment leaves the order PENDING. Orders already CONFIRMED or
    /// CANCELLED are never mutated.
    pub async fn apply_payment_outcome(
        &self,
        order_id: Ulid,
        outcome: PaymentStatus,
    ) -> Result<Order, BookingError> {
        let (room_id, mut guard) = self.resolve_order_write(&order_id).await?;
        let order = guard
            .find_order(order_id)
            .cloned()
            .ok_or(BookingError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(BookingError::InvalidTransition {
                order_id,
                from: order.status,
            });
        }

        match outcome {
            PaymentStatus::PendingConfirmation => {
                metrics::counter!(observability::PAYMENT_OUTCOMES_TOTAL, "outcome" => "pending")
                    .increment(1);
                Ok(order)
            }
            PaymentStatus::Paid => {
                let mut next = order;
                next.status = OrderStatus::Confirmed;
                let event = OrderEvent::OrderConfirmed { order_id, room_id };
                let next = self.commit(&mut guard, next, event).await?;
                metrics::counter!(observability::PAYMENT_OUTCOMES_TOTAL, "outcome" => "paid")
                    .increment(1);
                Ok(next)
            }
            PaymentStatus::Failed => {
                let mut next = order;
                next.status = OrderStatus::Cancelled;
                let event = OrderEvent::OrderCancelled { order_id, room_id };
                let next = self.commit(&mut guard, next, event).await?;
                metrics::counter!(observability::PAYMENT_OUTCOMES_TOTAL, "outcome" => "failed")
                    .increment(1);
                Ok(next)
            }
        }
    }

    /// Revise a reservation's stay, room, deadline, or total. Date and
    /// room changes are re-validated through the conflict checker with the
    /// order excluding itself.
    ///
    /// If the (possibly revised) deadline of a PENDING order has already
    /// elapsed, the merged fields are written, the order is
    /// force-cancelled, its room released, and `ReservationExpired` is
    /// returned — a failed update with side effects; callers must
    /// re-fetch.
    pub async fn update_reservation(
        &self,
        order_id: Ulid,
        update: ReservationUpdate,
    ) -> Result<Order, BookingError> {
        let t = now();
        let old_room_id = self
            .order_to_room
            .get(&order_id)
            .map(|e| *e.value())
            .ok_or(BookingError::OrderNotFound(order_id))?;
        let new_room_id = update.room_id.unwrap_or(old_room_id);

        let (mut src, mut dst) = self.lock_pair(old_room_id, new_room_id).await?;

        let existing = src
            .find_order(order_id)
            .cloned()
            .ok_or(BookingError::OrderNotFound(order_id))?;
        if existing.status == OrderStatus::Cancelled {
            return Err(BookingError::InvalidTransition {
                order_id,
                from: existing.status,
            });
        }

        let mut revised = existing.clone();
        revised.room_id = new_room_id;
        if let Some(check_in) = update.check_in {
            revised.stay.check_in = check_in;
        }
        if let Some(check_out) = update.check_out {
            revised.stay.check_out = check_out;
        }
        if let Some(deadline) = update.deadline {
            revised.deadline = deadline;
        }
        validate_stay(&revised.stay)?;

        if let Some(total) = update.total {
            revised.total = total;
        } else if revised.stay != existing.stay || new_room_id != old_room_id {
            let rate = self
                .inventory
                .nightly_rate(new_room_id)
                .await?
                .ok_or_else(|| PersistenceError::new("room category has no nightly rate"))?;
            revised.total = stay_total(&revised.stay, rate);
        }

        if revised.status == OrderStatus::Pending && revised.deadline <= t {
            let deadline = revised.deadline;
            revised.status = OrderStatus::Cancelled;
            let event = OrderEvent::ReservationExpired {
                order_id,
                room_id: new_room_id,
            };
            metrics::counter!(observability::CANCELLATIONS_TOTAL, "reason" => "expired")
                .increment(1);
            self.commit_move(&mut src, dst.as_deref_mut(), revised, event)
                .await?;
            return Err(BookingError::ReservationExpired { order_id, deadline });
        }

        let target: &RoomState = dst.as_deref().unwrap_or(&src);
        if let Some(blocking) = find_conflict(target, &revised.stay, Some(order_id), t) {
            return Err(BookingError::RoomUnavailable {
                room_id: new_room_id,
                blocking_order: blocking.id,
                blocking_stay: blocking.stay,
            });
        }

        let event = OrderEvent::ReservationRevised {
            order: revised.clone(),
        };
        self.commit_move(&mut src, dst.as_deref_mut(), revised, event)
            .await
    }

    /// Guest-initiated cancellation. Allowed from PENDING only.
    pub async fn cancel_reservation(&self, order_id: Ulid) -> Result<Order, BookingError> {
        let (room_id, mut guard) = self.resolve_order_write(&order_id).await?;
        let order = guard
            .find_order(order_id)
            .cloned()
            .ok_or(BookingError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(BookingError::InvalidTransition {
                order_id,
                from: order.status,
            });
        }

        let mut next = order;
        next.status = OrderStatus::Cancelled;
        let event = OrderEvent::OrderCancelled { order_id, room_id };
        let next = self.commit(&mut guard, next, event).await?;
        metrics::counter!(observability::CANCELLATIONS_TOTAL, "reason" => "guest").increment(1);
        Ok(next)
    }

    /// Sweeper entry point: cancel `order_id` if it is still an expired
    /// PENDING order. The state is re-checked under the room lock — a
    /// payment outcome may have landed since the scan. Returns false when
    /// there was nothing left to do, which makes re-sweeping idempotent.
    pub(crate) async fn expire_reservation(
        &self,
        order_id: Ulid,
        now: DateTime<Utc>,
    ) -> Result<bool, BookingError> {
        let (room_id, mut guard) = self.resolve_order_write(&order_id).await?;
        let Some(order) = guard.find_order(order_id).cloned() else {
            return Ok(false);
        };
        if !order.is_expired(now) {
            return Ok(false);
        }

        let mut next = order;
        next.status = OrderStatus::Cancelled;
        let event = OrderEvent::ReservationExpired { order_id, room_id };
        self.commit(&mut guard, next, event).await?;
        Ok(true)
    }

    /// Write locks for a (source, destination) room pair, destination
    /// present only when the order is moving. Locks are taken in id order
    /// so two concurrent moves cannot deadlock.
    async fn lock_pair(
        &self,
        src_id: Ulid,
        dst_id: Ulid,
    ) -> Result<
        (
            OwnedRwLockWriteGuard<RoomState>,
            Option<OwnedRwLockWriteGuard<RoomState>>,
        ),
        BookingError,
    > {
        if src_id == dst_id {
            let rs = self.room_state(&src_id).await?;
            return Ok((rs.write_owned().await, None));
        }
        let src_rs = self.room_state(&src_id).await?;
        let dst_rs = self.room_state(&dst_id).await?;
        if src_id < dst_id {
            let src = src_rs.write_owned().await;
            let dst = dst_rs.write_owned().await;
            Ok((src, Some(dst)))
        } else {
            let dst = dst_rs.write_owned().await;
            let src = src_rs.write_owned().await;
            Ok((src, Some(dst)))
        }
    }

    /// Commit a revised order, relocating it when a destination room is
    /// given. The order travels with its new room's status as the atomic
    /// pair; the source room's release is persisted first so a storage
    /// failure aborts the whole move before anything is applied.
    async fn commit_move(
        &self,
        src: &mut RoomState,
        dst: Option<&mut RoomState>,
        order: Order,
        event: OrderEvent,
    ) -> Result<Order, BookingError> {
        let Some(dst) = dst else {
            return self.commit(src, order, event).await;
        };
        let t = now();
        let src_status = src.occupancy_excluding(order.id, t);
        let dst_status = dst.occupancy_with(&order, t);
        if src_status != src.status {
            self.ledger.record_room(src.id, src_status).await?;
        }
        self.ledger
            .record_order_and_room(&order, dst.id, dst_status)
            .await?;

        src.remove_order(order.id);
        track_room_status(src.status, src_status);
        src.status = src_status;
        self.order_to_room.insert(order.id, dst.id);
        track_room_status(dst.status, dst_status);
        dst.upsert_order(order.clone());
        dst.status = dst_status;
        self.notify.send(src.id, &event);
        self.notify.send(dst.id, &event);
        Ok(order)
    }
}
