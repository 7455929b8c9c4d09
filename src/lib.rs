//! Backend for a browser email-template editor.
//!
//! The interesting part lives in [`application::render`]: a layout template
//! carrying `{{key}}` placeholders is filled from an ordered list of editor
//! sections. Everything else is a thin axum surface around it.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
