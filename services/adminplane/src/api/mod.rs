//! Admin-plane HTTP API module.
//!
//! # Purpose
//! Route handler modules plus the shared error and payload types.
pub mod changes;
pub mod configuration;
pub mod error;
pub mod openapi;
pub mod service;
pub mod system;
pub mod types;
