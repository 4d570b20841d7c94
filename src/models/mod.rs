//! Diesel row models mapping the domain onto the SQLite schema.

pub mod config;
pub mod document;
pub mod draft;
pub mod status_event;
pub mod submission;
