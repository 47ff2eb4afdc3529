//! Storage Layer
//!
//! Handles all data persistence: the SQLite log store and the JSON config.

pub mod config;
pub mod database;

pub use config::*;
pub use database::*;
