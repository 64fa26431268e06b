//! innkeep — a hotel back-office reservation engine: conflict-checked
//! bookings, a payment-driven order lifecycle, and deadline-based room
//! reclamation.
//!
//! The [`engine::Engine`] serializes every check-then-write sequence per
//! room, prices stays from the room category's nightly rate, and writes
//! through to a pluggable [`ledger::Ledger`]. A background
//! [`sweeper::Sweeper`] cancels PENDING orders past their decision
//! deadline and releases their rooms. Committed transitions are broadcast
//! on the [`notify::NotifyHub`] for the mail and front-desk collaborators.

pub mod config;
pub mod engine;
pub mod inventory;
pub mod ledger;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod sweeper;

pub use config::BookingPolicy;
pub use engine::{BookingError, Engine, ReservationUpdate};
pub use inventory::{InMemoryInventory, Inventory, RoomCategory};
pub use ledger::{InMemoryLedger, Ledger, PersistenceError};
pub use model::{
    Cents, Order, OrderEvent, OrderStatus, PaymentStatus, RoomRecord, RoomStatus, StayRange,
};
pub use notify::NotifyHub;
pub use sweeper::{Sweeper, SweepStats, sweep};
