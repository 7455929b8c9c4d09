//! Infrastructure adapters and runtime bootstrap.

pub mod config_sink;
pub mod error;
pub mod http;
pub mod layout;
pub mod telemetry;
pub mod uploads;
