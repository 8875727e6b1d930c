//! Quill Expr: the expression protocol
//!
//! Every node of a compiled tree implements [`Expression`]. Trees are built
//! once after the registries are sealed and then evaluated many times, each
//! time against a fresh [`ExecutionContext`](quill_core::ExecutionContext).
//! Nodes are shared as [`ExprRef`] and hold their temporal binding in atomic
//! cells, so a tree is `Send + Sync` without locks.

pub mod converted;
pub mod event_value;
pub mod expression;
pub mod list;
pub mod literal;
pub mod property;
pub mod snapshot;

pub use converted::ConvertedExpression;
pub use event_value::{EventGetter, EventValueExpression, TimeSlot};
pub use expression::{
    bind_time, check_values, convert_to, describe_joined, loop_matches, ExprRef, ExprRefExt, Expression,
    Quantifier,
};
pub use list::ExpressionList;
pub use literal::Literal;
pub use property::{Getter, PropertyExpression};
pub use snapshot::{memoized, snapshot, Memoized, Snapshot};
