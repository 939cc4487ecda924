pub mod api;
pub mod config;
pub mod error;
pub mod fc;
pub mod observability;
pub mod state;
