//! Read-only seating report built from a roster/tables snapshot.

use serde::{Deserialize, Serialize};

use crate::seating::SeatingSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub guests: usize,
    pub assigned: usize,
    pub unassigned: usize,
    pub tables: usize,
    pub complete_tables: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatRow {
    pub position: usize,
    pub guest_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSection {
    pub table_id: i64,
    pub occupied: usize,
    pub capacity: usize,
    pub seats: Vec<SeatRow>,
}

/// Formatted-document model consumed by export collaborators. No write
/// path back into the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingReport {
    pub totals: ReportTotals,
    pub guest_names: Vec<String>,
    pub sections: Vec<TableSection>,
}

impl SeatingReport {
    pub fn from_snapshot(snapshot: &SeatingSnapshot) -> Self {
        let assigned = snapshot
            .tables
            .iter()
            .map(|table| table.occupied_seats())
            .sum::<usize>();
        let totals = ReportTotals {
            guests: snapshot.guests.len(),
            assigned,
            unassigned: snapshot.guests.len().saturating_sub(assigned),
            tables: snapshot.tables.len(),
            complete_tables: snapshot
                .tables
                .iter()
                .filter(|table| table.is_complete())
                .count(),
        };
        let sections = snapshot
            .tables
            .iter()
            .map(|table| TableSection {
                table_id: table.id,
                occupied: table.occupied_seats(),
                capacity: table.seats.len(),
                seats: table
                    .seats
                    .iter()
                    .enumerate()
                    .map(|(position, seat)| SeatRow {
                        position,
                        guest_name: seat.as_ref().map(|guest| guest.name.clone()),
                    })
                    .collect(),
            })
            .collect();
        Self {
            totals,
            guest_names: snapshot.guests.iter().map(|guest| guest.name.clone()).collect(),
            sections,
        }
    }

    /// Plain-text rendering. With no tables, only the guest list is
    /// printed.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("Seating plan\n");
        if self.sections.is_empty() {
            out.push_str(&format!("Guest list ({} total)\n", self.totals.guests));
            for (index, name) in self.guest_names.iter().enumerate() {
                out.push_str(&format!("{:02}. {}\n", index + 1, name));
            }
            return out;
        }

        out.push_str(&format!(
            "Guests: {} | Assigned: {} | Unassigned: {} | Complete tables: {} of {}\n",
            self.totals.guests,
            self.totals.assigned,
            self.totals.unassigned,
            self.totals.complete_tables,
            self.totals.tables,
        ));
        for section in &self.sections {
            out.push_str(&format!(
                "\nTable {} ({}/{})\n",
                section.table_id, section.occupied, section.capacity
            ));
            for seat in &section.seats {
                match &seat.guest_name {
                    Some(name) => out.push_str(&format!("  {:02}. {}\n", seat.position + 1, name)),
                    None => out.push_str(&format!("  {:02}. (empty)\n", seat.position + 1)),
                }
            }
        }
        out
    }
}
