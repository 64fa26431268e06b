use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::ledger::PersistenceError;
use crate::model::{Cents, RoomRecord};

/// A room category; the price of every room in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomCategory {
    pub id: Ulid,
    pub name: String,
    pub nightly_rate: Cents,
}

/// Room catalog collaborator: rooms, their categories, and the guest
/// directory. Read-only from the engine's point of view — room status
/// flips go through the [`crate::ledger::Ledger`].
#[async_trait]
pub trait Inventory: Send + Sync {
    async fn room(&self, id: Ulid) -> Result<Option<RoomRecord>, PersistenceError>;

    /// Nightly rate for the room, derived from its category.
    async fn nightly_rate(&self, room_id: Ulid) -> Result<Option<Cents>, PersistenceError>;

    async fn guest_exists(&self, guest_id: Ulid) -> Result<bool, PersistenceError>;
}

/// In-memory inventory stand-in used by tests and single-process
/// deployments.
#[derive(Default)]
pub struct InMemoryInventory {
    rooms: DashMap<Ulid, RoomRecord>,
    categories: DashMap<Ulid, RoomCategory>,
    guests: DashMap<Ulid, ()>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_category(&self, category: RoomCategory) {
        self.categories.insert(category.id, category);
    }

    pub fn add_room(&self, room: RoomRecord) {
        self.rooms.insert(room.id, room);
    }

    pub fn add_guest(&self, guest_id: Ulid) {
        self.guests.insert(guest_id, ());
    }
}

#[async_trait]
impl Inventory for InMemoryInventory {
    async fn room(&self, id: Ulid) -> Result<Option<RoomRecord>, PersistenceError> {
        Ok(self.rooms.get(&id).map(|e| e.value().clone()))
    }

    async fn nightly_rate(&self, room_id: Ulid) -> Result<Option<Cents>, PersistenceError> {
        let Some(room) = self.rooms.get(&room_id) else {
            return Ok(None);
        };
        Ok(self
            .categories
            .get(&room.category_id)
            .map(|c| c.nightly_rate))
    }

    async fn guest_exists(&self, guest_id: Ulid) -> Result<bool, PersistenceError> {
        Ok(self.guests.contains_key(&guest_id))
    }
}
