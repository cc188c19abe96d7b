//! Cross-context synchronization: wire model and the synchronized cell.

mod sync_model;
mod synced_cell;

pub use sync_model::*;
pub use synced_cell::*;

#[cfg(test)]
mod tests;
