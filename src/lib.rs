// lib.rs
// Billing engine for tenant electricity consumption: formulas, derived-data
// recalculation, entity store and the event socket that serves them.

pub mod config;
pub mod error;
pub mod events;
pub mod formula;
pub mod models;
pub mod routes;
pub mod state;
