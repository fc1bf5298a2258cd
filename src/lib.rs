//! Gyuldam AI — weather-aware farming assistant for Jeju farmers.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod context;
pub mod knowledge;
pub mod llm;
pub mod server;
pub mod weather;
