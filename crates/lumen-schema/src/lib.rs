//! Schema layer of the lumen configuration engine.
//!
//! # Purpose
//! Object type tables, the per-property validator, defaulting and read-back
//! rendering, and the error catalog. Everything here is pure; stored state
//! lives in the admin-plane service.
pub mod catalog;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod schema;
pub mod validate;
pub mod value;

pub use error::{Acknowledgement, ConfigError, ConfigResult, ErrorKind};
pub use normalize::Assignment;
pub use registry::Registry;
pub use schema::{ObjectRule, ObjectType, PropertyKind, PropertySchema, StringFormat};
pub use validate::{Subject, validate};
