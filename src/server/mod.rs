//! Diagnostic endpoint
//!
//! A small HTTP server exposing live coordinator state and worker counters.
//! It only reads the pool's atomics and has no effect on the workload.

pub mod routes;

pub use routes::{serve, spawn_background};
