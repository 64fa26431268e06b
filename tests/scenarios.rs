use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use ulid::Ulid;

use innkeep::{
    BookingError, BookingPolicy, Engine, InMemoryInventory, InMemoryLedger, NotifyHub, OrderEvent,
    OrderStatus, PaymentStatus, RoomCategory, RoomRecord, RoomStatus, Sweeper,
};

const RATE: innkeep::Cents = 100_00;

fn day(offset: i64) -> NaiveDate {
    chrono::Utc::now().date_naive() + chrono::Duration::days(offset)
}

struct Hotel {
    engine: Arc<Engine>,
    notify: Arc<NotifyHub>,
    guest: Ulid,
    room: Ulid,
}

async fn hotel(policy: BookingPolicy) -> Hotel {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let inventory = Arc::new(InMemoryInventory::new());
    let category = Ulid::new();
    inventory.add_category(RoomCategory {
        id: category,
        name: "double".into(),
        nightly_rate: RATE,
    });
    let room = Ulid::new();
    inventory.add_room(RoomRecord {
        id: room,
        hotel_id: Ulid::new(),
        category_id: category,
        status: RoomStatus::Available,
    });
    let guest = Ulid::new();
    inventory.add_guest(guest);

    let notify = Arc::new(NotifyHub::new());
    let engine = Arc::new(
        Engine::open(
            inventory,
            Arc::new(InMemoryLedger::new()),
            notify.clone(),
            policy,
        )
        .await
        .unwrap(),
    );
    Hotel {
        engine,
        notify,
        guest,
        room,
    }
}

#[tokio::test]
async fn booking_flow_with_notifications() {
    let h = hotel(BookingPolicy::default()).await;
    let mut rx = h.notify.subscribe(h.room);

    let order = h
        .engine
        .create_reservation(h.guest, h.room, day(10), day(12))
        .await
        .unwrap();
    assert_eq!(order.total, 2 * RATE);
    match rx.recv().await.unwrap() {
        OrderEvent::ReservationCreated { order: created } => assert_eq!(created.id, order.id),
        other => panic!("expected ReservationCreated, got {other:?}"),
    }

    h.engine
        .apply_payment_outcome(order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    match rx.recv().await.unwrap() {
        OrderEvent::OrderConfirmed { order_id, room_id } => {
            assert_eq!(order_id, order.id);
            assert_eq!(room_id, h.room);
        }
        other => panic!("expected OrderConfirmed, got {other:?}"),
    }
}

#[tokio::test]
async fn double_booking_refused_but_back_to_back_allowed() {
    let h = hotel(BookingPolicy::default()).await;
    h.engine
        .create_reservation(h.guest, h.room, day(10), day(12))
        .await
        .unwrap();

    let err = h
        .engine
        .create_reservation(h.guest, h.room, day(11), day(13))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::RoomUnavailable { .. }));

    // Shared boundary date: the first guest leaves the morning the second
    // arrives.
    h.engine
        .create_reservation(h.guest, h.room, day(12), day(14))
        .await
        .unwrap();
}

#[tokio::test]
async fn sweeper_reclaims_rooms_end_to_end() {
    let h = hotel(BookingPolicy {
        reservation_window: Duration::ZERO,
        sweep_interval: Duration::from_millis(20),
    })
    .await;

    let order = h
        .engine
        .create_reservation(h.guest, h.room, day(10), day(12))
        .await
        .unwrap();

    let sweeper = Sweeper::start(h.engine.clone());
    tokio::time::sleep(Duration::from_millis(120)).await;
    sweeper.stop().await;

    assert_eq!(
        h.engine.get_order(order.id).await.unwrap().status,
        OrderStatus::Cancelled
    );
    assert_eq!(
        h.engine.room_status(h.room).await.unwrap(),
        RoomStatus::Available
    );
    // The room is bookable again once reclaimed.
    assert!(
        !h.engine
            .has_conflict(h.room, innkeep::StayRange::new(day(10), day(12)), None)
            .await
            .unwrap()
    );
}
