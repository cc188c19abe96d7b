//! Seating domain: guest roster and table assignment.

mod seating_model;
mod seating_service;

pub use seating_model::*;
pub use seating_service::*;
