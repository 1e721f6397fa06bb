//! Opsbooks API Library
//!
//! This crate contains the API server components for Opsbooks: health
//! probes and the bearer-guarded recurring-billing cron trigger.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
