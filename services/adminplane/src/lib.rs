//! Lumen admin-plane library crate.
//!
//! # Purpose
//! Exposes the configuration engine, store, service supervisor, HTTP API,
//! configuration and observability wiring for use by the binary and tests.
pub mod api;
pub mod app;
pub mod capability;
pub mod config;
pub mod engine;
pub mod model;
pub mod observability;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
