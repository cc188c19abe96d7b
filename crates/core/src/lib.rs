//! Core domain and synchronization logic for the seating planner.
//!
//! The crate is split along the same seams as the system itself: the
//! [`sync`] module holds the synchronized key-value cell and its wire
//! model, [`store`] and [`transport`] define the adapter contracts the
//! cell composes, and [`seating`] implements the roster/table mutation
//! rules on top of two cells. Presentation concerns (rendering, drag
//! geometry, PDF layout) live outside this workspace and consume the
//! service API plus the [`events`] sink.

pub mod errors;
pub mod events;
pub mod report;
pub mod seating;
pub mod settings;
pub mod share;
pub mod store;
pub mod sync;
pub mod transport;

pub use errors::{Error, Result};
