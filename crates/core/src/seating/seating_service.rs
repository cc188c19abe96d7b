//! Seating roster and table assignment service.
//!
//! All mutations go through whole-collection replacement on two
//! independent synchronized cells. There is no cross-cell atomicity; a
//! partial application is self-healing on the next full read.

use std::collections::HashSet;
use std::sync::Mutex;

use crate::errors::{Error, Result};
use crate::seating::{Guest, SeatingSnapshot, Table, GUESTS_KEY, TABLES_KEY};
use crate::settings::TableSettings;
use crate::sync::{SyncContext, SyncedCell};

pub struct SeatingService {
    settings: TableSettings,
    guests: Mutex<SyncedCell<Vec<Guest>>>,
    tables: Mutex<SyncedCell<Vec<Table>>>,
}

impl SeatingService {
    pub fn new(ctx: &SyncContext, settings: TableSettings) -> Self {
        Self {
            settings,
            guests: Mutex::new(SyncedCell::new(ctx, GUESTS_KEY, Vec::new())),
            tables: Mutex::new(SyncedCell::new(ctx, TABLES_KEY, Vec::new())),
        }
    }

    pub fn settings(&self) -> TableSettings {
        self.settings
    }

    /// Append a guest to the roster. The name is trimmed and must not be
    /// empty.
    pub fn add_guest(&self, name: &str) -> Result<Guest> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("guest name must not be empty"));
        }
        let guest = Guest::new(name);
        let added = guest.clone();
        self.guests.lock().unwrap().write_with(|current| {
            let mut next = current.clone();
            next.push(guest);
            next
        });
        Ok(added)
    }

    /// Drop a guest from the roster and empty any seat holding them.
    ///
    /// Two independent cell writes; removing an unknown id is a no-op.
    pub fn remove_guest(&self, guest_id: &str) -> Result<()> {
        self.guests.lock().unwrap().write_with(|current| {
            current
                .iter()
                .filter(|guest| guest.id != guest_id)
                .cloned()
                .collect()
        });
        self.tables.lock().unwrap().write_with(|current| {
            current.iter().map(|table| table.cleared_of(guest_id)).collect()
        });
        Ok(())
    }

    /// Replace the grid with `ceil(guests / suggested_occupancy)` fresh
    /// empty tables numbered from 1. Discards all prior seat assignments.
    /// With an empty roster nothing changes and 0 is returned.
    pub fn generate_tables(&self) -> Result<usize> {
        let guest_count = self.guests.lock().unwrap().read().len();
        if guest_count == 0 {
            return Ok(0);
        }
        let count = self.settings.tables_for(guest_count);
        let capacity = self.settings.seats_per_table;
        self.tables.lock().unwrap().write(
            (1..=count as i64)
                .map(|id| Table::empty(id, capacity))
                .collect(),
        );
        Ok(count)
    }

    /// Append one empty table, numbered past the highest existing id so
    /// ids stay unique even after interior removals.
    pub fn add_table(&self) -> Result<Table> {
        let mut tables = self.tables.lock().unwrap();
        let next_id = tables.read().iter().map(|table| table.id).max().unwrap_or(0) + 1;
        let table = Table::empty(next_id, self.settings.seats_per_table);
        let added = table.clone();
        tables.write_with(|current| {
            let mut next = current.clone();
            next.push(table);
            next
        });
        Ok(added)
    }

    /// Seat a roster guest at `(table_id, position)`.
    ///
    /// The target seat must be empty; the guest's previous seat, if any,
    /// is emptied in the same write, so each guest occupies at most one
    /// seat and one message is broadcast per assignment.
    pub fn assign_guest_to_seat(&self, table_id: i64, position: usize, guest: &Guest) -> Result<()> {
        let on_roster = self
            .guests
            .lock()
            .unwrap()
            .read()
            .iter()
            .any(|candidate| candidate.id == guest.id);
        if !on_roster {
            return Err(Error::validation(format!(
                "guest '{}' is not on the roster",
                guest.id
            )));
        }

        let mut tables = self.tables.lock().unwrap();
        let current = tables.read();
        let target = current
            .iter()
            .find(|table| table.id == table_id)
            .ok_or_else(|| Error::validation(format!("no table with id {table_id}")))?;
        if position >= target.seats.len() {
            return Err(Error::validation(format!(
                "seat {position} is out of range for table {table_id}"
            )));
        }
        if target.seats[position].is_some() {
            return Err(Error::validation(format!(
                "seat {position} at table {table_id} is already occupied"
            )));
        }

        tables.write_with(|current| {
            current
                .iter()
                .map(|table| {
                    let mut table = table.cleared_of(&guest.id);
                    if table.id == table_id {
                        table.seats[position] = Some(guest.clone());
                    }
                    table
                })
                .collect()
        });
        Ok(())
    }

    /// Empty the seat at `(table_id, position)`. No other side effects.
    pub fn remove_guest_from_seat(&self, table_id: i64, position: usize) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let current = tables.read();
        let target = current
            .iter()
            .find(|table| table.id == table_id)
            .ok_or_else(|| Error::validation(format!("no table with id {table_id}")))?;
        if position >= target.seats.len() {
            return Err(Error::validation(format!(
                "seat {position} is out of range for table {table_id}"
            )));
        }

        tables.write_with(|current| {
            current
                .iter()
                .map(|table| {
                    if table.id != table_id {
                        return table.clone();
                    }
                    let mut table = table.clone();
                    table.seats[position] = None;
                    table
                })
                .collect()
        });
        Ok(())
    }

    /// Replace both collections with empty sequences. The storage keys
    /// stay live; a reset is an ordinary write, not a delete.
    pub fn reset_all(&self) -> Result<()> {
        self.guests.lock().unwrap().write(Vec::new());
        self.tables.lock().unwrap().write(Vec::new());
        Ok(())
    }

    /// Replace both collections from an imported snapshot.
    pub fn load_snapshot(&self, snapshot: SeatingSnapshot) -> Result<()> {
        self.guests.lock().unwrap().write(snapshot.guests);
        self.tables.lock().unwrap().write(snapshot.tables);
        Ok(())
    }

    pub fn guests(&self) -> Vec<Guest> {
        self.guests.lock().unwrap().read()
    }

    pub fn tables(&self) -> Vec<Table> {
        self.tables.lock().unwrap().read()
    }

    /// Guests whose id appears in no table's seats.
    pub fn unassigned_guests(&self) -> Vec<Guest> {
        let seated: HashSet<String> = self
            .tables()
            .iter()
            .flat_map(|table| table.seats.iter().flatten().map(|guest| guest.id.clone()))
            .collect();
        self.guests()
            .into_iter()
            .filter(|guest| !seated.contains(&guest.id))
            .collect()
    }

    pub fn snapshot(&self) -> SeatingSnapshot {
        SeatingSnapshot {
            guests: self.guests(),
            tables: self.tables(),
        }
    }

    /// Pump both cells' remote queues. Returns the number of applied
    /// remote changes.
    pub fn apply_pending(&self) -> usize {
        self.guests.lock().unwrap().apply_pending() + self.tables.lock().unwrap().apply_pending()
    }
}
