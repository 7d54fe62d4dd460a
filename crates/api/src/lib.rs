//! `staffsight-api` — HTTP surface of the orchestration core.
//!
//! Three trust boundaries share this router: authenticated staff (JWT),
//! anonymous form recipients (bearer token in the path), and the external
//! workflow engine (shared-secret callback).

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
