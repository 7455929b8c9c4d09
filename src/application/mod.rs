//! Application services orchestrating domain operations.

pub mod editor;
pub mod error;
pub mod ports;
pub mod render;
