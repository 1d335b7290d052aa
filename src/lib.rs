pub mod actions;
pub mod bridge;
pub mod condition;
pub mod config;
pub mod context;
pub mod runtime;
pub mod schema;
pub mod service;

pub const RUNTIME_VERSION: &str = "0.1.0";
