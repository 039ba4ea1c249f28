//! HTTP handlers.

pub mod generate;
pub mod health;

pub use generate::generate_multi_scene;
pub use health::{health, ready};
