//! Lounge listener presence server library.
//! This crate exposes internal modules for integration testing.
//! The binary entry point is in main.rs.

pub mod channels;
pub mod config;
pub mod presence;
pub mod routes;
pub mod state;
