//! Persistence layer for plantcare: connection config, pool, migrations and
//! query functions for the `plants` table.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
