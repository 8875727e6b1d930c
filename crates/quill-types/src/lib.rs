//! Quill Types: the catalog of convertible types
//!
//! The registry is append-only until [`TypeRegistry::seal`], which synthesizes
//! the transitive converter closure and fixes the descriptor order. After that
//! it is read-only and can be shared behind an `Arc` without locking.
//!
//! ```
//! use quill_core::Value;
//! use quill_types::{TypeDescriptor, TypeRegistry};
//!
//! let mut types = TypeRegistry::new();
//! types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
//! types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
//! types
//!     .register_converter("integer", "text", |i: &i64| Some(i.to_string()))
//!     .unwrap();
//! types.seal().unwrap();
//!
//! let text = types.convert(&Value::new("integer", 5i64), &"text".into()).unwrap();
//! assert_eq!(text.downcast_ref::<String>().map(String::as_str), Some("5"));
//! ```

pub mod changer;
pub mod comparator;
pub mod converter;
pub mod descriptor;
pub mod registry;
mod sort;

pub use changer::{ChangeMode, Changer};
pub use comparator::{ComparatorEntry, ComparatorFn, Relation};
pub use converter::{ConvertFn, ConverterEdge};
pub use descriptor::{DefaultSupplier, TypeDescriptor};
pub use registry::TypeRegistry;
