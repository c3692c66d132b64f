//! HTTP API handlers for birdnotify

pub mod health;
pub mod notify;

pub use health::health_routes;
pub use notify::{notify, usage_hint};
