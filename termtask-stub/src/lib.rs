//! `TermTask` stub backend library.
//!
//! Exposes the in-memory REST backend for use in tests and embedding.
//! The stub implements the same endpoint contract as the real (external)
//! backend: bearer-token auth with refresh rotation, and per-user task
//! CRUD. State lives in memory and dies with the process.

pub mod config;
pub mod server;
pub mod store;
