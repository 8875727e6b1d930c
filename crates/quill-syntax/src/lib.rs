//! Quill Syntax: the catalog of syntax elements
//!
//! Each [`SyntaxDescriptor`] pairs textual patterns with a producer that
//! builds the element once a pattern matched. Descriptors are tagged with a
//! [`SyntaxKind`]; the external matcher walks them in the order the
//! [`SyntaxRegistry`] hands them out.

pub mod descriptor;
pub mod pattern;
pub mod registry;
pub mod statement;

pub use descriptor::{ExpressionRank, SyntaxDescriptor, SyntaxKind};
pub use pattern::{placeholders, Placeholder};
pub use registry::SyntaxRegistry;
pub use statement::{Condition, Effect, Element, EventMatcher, InitArgs, Producer};
