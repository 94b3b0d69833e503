//! Query functions, one module per table.
//!
//! Single-statement functions are generic over [`sqlx::PgExecutor`] so they
//! run against a pool or inside a transaction (`&mut *tx`). Functions that
//! issue several statements take `&mut PgConnection`.

pub mod classifications;
pub mod days;
pub mod laps;
pub mod move_units;
pub mod plans;
pub mod sessions;
pub mod templates;
pub mod weeks;
