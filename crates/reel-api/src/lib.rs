//! Axum HTTP API server.
//!
//! This crate provides:
//! - The multipart `/generate-multi-scene` endpoint driving the pipeline
//! - Static serving of finished videos under `/videos`
//! - Per-IP rate limiting and security headers
//! - Health, readiness and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod public_url;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
