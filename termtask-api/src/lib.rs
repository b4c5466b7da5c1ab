//! Shared REST API contract for `TermTask`.
//!
//! The backend is external; this crate pins down the endpoint paths, JSON
//! shapes, and field names that both the client and the stub server agree
//! on. Field naming follows the backend wire format (`iscompleted`,
//! `userId`, `createdAt`), mapped to idiomatic Rust names via serde.

pub mod auth;
pub mod envelope;
pub mod paths;
pub mod task;

pub use envelope::ApiEnvelope;
pub use task::Task;
