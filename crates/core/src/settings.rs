//! Table layout settings.

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

pub const DEFAULT_SEATS_PER_TABLE: usize = 10;
pub const DEFAULT_SUGGESTED_GUESTS_PER_TABLE: usize = 10;

/// Capacity and auto-partitioning configuration.
///
/// `seats_per_table` is the fixed length of every table's seat sequence;
/// `suggested_guests_per_table` drives how many tables auto-generation
/// produces and must not exceed the capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSettings {
    pub seats_per_table: usize,
    pub suggested_guests_per_table: usize,
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            seats_per_table: DEFAULT_SEATS_PER_TABLE,
            suggested_guests_per_table: DEFAULT_SUGGESTED_GUESTS_PER_TABLE,
        }
    }
}

impl TableSettings {
    pub fn new(seats_per_table: usize, suggested_guests_per_table: usize) -> Result<Self> {
        if seats_per_table == 0 {
            return Err(Error::validation("a table needs at least one seat"));
        }
        if suggested_guests_per_table == 0 {
            return Err(Error::validation("suggested occupancy must be at least one"));
        }
        if suggested_guests_per_table > seats_per_table {
            return Err(Error::validation(
                "suggested occupancy cannot exceed the table capacity",
            ));
        }
        Ok(Self {
            seats_per_table,
            suggested_guests_per_table,
        })
    }

    /// Number of tables auto-generation produces for `guest_count` guests.
    pub fn tables_for(&self, guest_count: usize) -> usize {
        guest_count.div_ceil(self.suggested_guests_per_table)
    }
}
