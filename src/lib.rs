// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod indicators;
pub mod models;
pub mod risk;
pub mod simulation;
pub mod strategy;

// Re-export commonly used types
pub use api::*;
pub use crate::config::Settings;
pub use crate::error::MonitorError;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;
