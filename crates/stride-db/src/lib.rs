//! Persistence layer for the stride training-plan hierarchy.
//!
//! Row models, connection pooling, embedded migrations and one query
//! module per table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
