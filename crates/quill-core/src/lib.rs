//! Quill Core: values, type keys, errors and the execution context
//!
//! Everything here is shared by the registries and by every expression node.
//! Nothing in this crate knows about converters or syntax; it only defines the
//! vocabulary the other crates speak.

pub mod config;
pub mod context;
pub mod error;
pub mod time;
pub mod value;

pub use config::{EngineConfig, Verbosity};
pub use context::{ContextHandle, ExecutionContext};
pub use error::{QuillError, Result};
pub use time::{Kleenean, Time};
pub use value::{NativeShape, TypeKey, Value};

/// Engine version
pub const QUILL_VERSION: &str = "1.0.0";
