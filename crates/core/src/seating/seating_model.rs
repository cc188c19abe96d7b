//! Guest and table domain models.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable-store key for the guest roster document.
pub const GUESTS_KEY: &str = "seating-guests";
/// Durable-store key for the table grid document.
pub const TABLES_KEY: &str = "seating-tables";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: String,
    pub name: String,
}

impl Guest {
    /// New roster entry with a freshly generated unique id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

/// A table with a fixed-length seat sequence. Ids are 1-based and never
/// reused within a grid unless the whole grid is regenerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: i64,
    pub seats: Vec<Option<Guest>>,
}

impl Table {
    pub fn empty(id: i64, capacity: usize) -> Self {
        Self {
            id,
            seats: vec![None; capacity],
        }
    }

    pub fn occupied_seats(&self) -> usize {
        self.seats.iter().filter(|seat| seat.is_some()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.seats.iter().all(|seat| seat.is_some())
    }

    /// Position of the seat holding `guest_id`, if any.
    pub fn seat_of(&self, guest_id: &str) -> Option<usize> {
        self.seats
            .iter()
            .position(|seat| seat.as_ref().is_some_and(|guest| guest.id == guest_id))
    }

    /// Copy of this table with every seat holding `guest_id` emptied.
    pub fn cleared_of(&self, guest_id: &str) -> Self {
        Self {
            id: self.id,
            seats: self
                .seats
                .iter()
                .map(|seat| match seat {
                    Some(guest) if guest.id == guest_id => None,
                    other => other.clone(),
                })
                .collect(),
        }
    }
}

/// Read-only copy of both collections, consumed by export collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingSnapshot {
    pub guests: Vec<Guest>,
    pub tables: Vec<Table>,
}
