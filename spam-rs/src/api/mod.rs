//! REST API module for spam-rs
//!
//! Thin HTTP boundary over the inference service and history store

pub mod handlers;
pub mod server;

pub use handlers::{ApiResponse, AppState};
pub use server::ApiServer;
