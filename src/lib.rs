//! EduSmart · student progress engine and client.
//!
//! - `server`: the authoritative Progress Engine (axum JSON API + static frontend)
//! - `client`: session store, API gateway, auth, videos, adaptive test, rewards
//! - `protocol`: DTOs shared by both sides

pub mod client;
pub mod config;
pub mod domain;
pub mod protocol;
pub mod server;
pub mod telemetry;
pub mod util;
