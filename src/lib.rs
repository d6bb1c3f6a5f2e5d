//! Task List Relay Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod caller;
pub mod config;
pub mod consumer;
pub mod error;
pub mod payload;
pub mod transport;
