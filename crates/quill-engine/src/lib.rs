//! Quill Engine: startup and lifecycle
//!
//! The host builds a [`Manifest`] of registration steps, hands it to
//! [`startup`] and gets back a sealed, shareable [`Registry`]. Compiled
//! scripts live in [`Trigger`]s that are torn down on reload.

pub mod defaults;
pub mod manifest;
pub mod registry;
pub mod report;
pub mod trigger;

pub use manifest::Manifest;
pub use registry::{startup, Registry};
pub use report::{ConverterEntry, RegistryReport, SyntaxEntry, TypeEntry};
pub use trigger::{TeardownReport, Trigger};
