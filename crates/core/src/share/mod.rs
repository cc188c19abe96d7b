//! Best-effort snapshot sharing via short codes.

mod share_service;

pub use share_service::*;
