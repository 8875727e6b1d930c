//! The Expression trait and the operations built on it
use crate::converted::ConvertedExpression;
use quill_core::{ExecutionContext, Kleenean, QuillError, Result, Time, TypeKey, Value};
use quill_types::{ChangeMode, TypeRegistry};
use std::sync::Arc;
use tracing::{debug, trace};

/// Shared handle to a compiled node
pub type ExprRef = Arc<dyn Expression>;

/// How a multi-valued node reads under a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Every element must pass: "all of x are y"
    And,
    /// One element suffices: "any of x is y"
    Or,
}

impl Quantifier {
    pub fn conjunction(self) -> &'static str {
        match self {
            Quantifier::And => "and",
            Quantifier::Or => "or",
        }
    }
}

/// A node of a compiled expression tree.
///
/// Only `return_type`, `is_single`, `array` and `describe` are required.
/// Evaluation never fails: a node that has nothing to yield returns an empty
/// `Vec` or `None`.
pub trait Expression: Send + Sync {
    /// Declared type. Every value the node yields is assignable to it.
    fn return_type(&self) -> TypeKey;

    /// At most one value per evaluation. Fixed for the node's lifetime.
    fn is_single(&self) -> bool;

    fn quantifier(&self) -> Quantifier {
        Quantifier::And
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value>;

    /// Some element of `array`, or `None` iff `array` is empty.
    fn single(&self, ctx: &ExecutionContext) -> Option<Value> {
        self.array(ctx).into_iter().next()
    }

    /// All values regardless of quantifier; same elements as `array`.
    fn all(&self, ctx: &ExecutionContext) -> Vec<Value> {
        self.array(ctx)
    }

    /// Single-pass iteration over the same elements as `array`.
    fn iterate<'a>(&'a self, ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.array(ctx).into_iter())
    }

    /// Test the node's values against `predicate` under its quantifier.
    /// Single nodes read existentially, so an empty single node never passes.
    fn check(&self, ctx: &ExecutionContext, predicate: &dyn Fn(&Value) -> bool, negated: bool) -> bool {
        let quantifier = if self.is_single() { Quantifier::Or } else { self.quantifier() };
        check_values(ctx, self.iterate(ctx), quantifier, predicate, negated)
    }

    /// The node this one was converted from, if any.
    fn source(&self) -> Option<ExprRef> {
        None
    }

    /// Node-specific conversion, tried before registry converters.
    fn convert_self(&self, _types: &TypeRegistry, _to: &TypeKey) -> Option<ExprRef> {
        None
    }

    /// Delta types accepted for `mode`, `None` if unsupported.
    fn accept_change(&self, types: &TypeRegistry, mode: ChangeMode) -> Option<Vec<TypeKey>> {
        types.changer(&self.return_type())?.accept_change(mode)
    }

    /// Apply a change to every current value. A revoked context leaves the
    /// values untouched.
    fn change(
        &self,
        types: &TypeRegistry,
        ctx: &ExecutionContext,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<()> {
        let accepted = self.accept_change(types, mode);
        types.validate_delta(accepted.as_deref(), delta, mode)?;
        let changer = types.changer(&self.return_type()).ok_or_else(|| {
            QuillError::unsupported(format!("{} cannot be changed", self.describe(None, false)))
        })?;
        if ctx.is_revoked() {
            return Ok(());
        }
        changer.change(&self.array(ctx), delta, mode)
    }

    /// Bind the node to a state of the event. Nodes without distinct temporal
    /// states accept only `Time::Default`. A rejection keeps the old binding.
    fn set_time(&self, time: Time) -> Result<()> {
        if time == Time::Default {
            return Ok(());
        }
        Err(QuillError::TemporalBindingRejected {
            node: self.describe(None, false),
            requested: time,
        })
    }

    fn time(&self) -> Time {
        Time::Default
    }

    /// Stands in for a value the pattern omitted.
    fn is_default(&self) -> bool {
        false
    }

    /// Answers to `loop-<name>` when iterated by a loop.
    fn is_loop_of(&self, _name: &str) -> bool {
        false
    }

    fn children(&self) -> Vec<ExprRef> {
        Vec::new()
    }

    /// Human-readable form. With a context, `debug` may include current values.
    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String;
}

/// Shared quantifier scan used by every `check`.
///
/// AND returns `!negated` when all values pass and `negated` at the first
/// failure. OR returns `!negated` at the first pass and `negated` when none
/// pass. A revoked context stops the scan and yields `false`.
pub fn check_values(
    ctx: &ExecutionContext,
    values: impl Iterator<Item = Value>,
    quantifier: Quantifier,
    predicate: &dyn Fn(&Value) -> bool,
    negated: bool,
) -> bool {
    for value in values {
        if ctx.is_revoked() {
            return false;
        }
        let passed = predicate(&value);
        match quantifier {
            Quantifier::And if !passed => return negated,
            Quantifier::Or if passed => return !negated,
            _ => {}
        }
    }
    if ctx.is_revoked() {
        return false;
    }
    match quantifier {
        Quantifier::And => !negated,
        Quantifier::Or => negated,
    }
}

/// Convert `expr` to yield values of `to`.
///
/// Returns the same node when its type already satisfies `to`, the node's own
/// conversion if it has one, and otherwise a [`ConvertedExpression`] over the
/// registry edge. Fails at bind time when no path exists.
pub fn convert_to(expr: &ExprRef, types: &TypeRegistry, to: &TypeKey) -> Result<ExprRef> {
    let from = expr.return_type();
    if types.is_assignable(&from, to) {
        return Ok(Arc::clone(expr));
    }
    if let Some(converted) = expr.convert_self(types, to) {
        trace!(from = %from, to = %to, "node converted itself");
        return Ok(converted);
    }
    match types.converter(&from, to) {
        Some(edge) => Ok(Arc::new(ConvertedExpression::new(Arc::clone(expr), edge.clone()))),
        None => Err(QuillError::ConversionUnavailable { from, to: to.clone() }),
    }
}

/// Bind `expr` to `time`, taking the delay before the element into account:
/// after a definite delay the event is over and only the present exists.
pub fn bind_time(expr: &dyn Expression, time: Time, delay: Kleenean) -> Result<()> {
    if time != Time::Default && delay.is_true() {
        debug!(node = %expr.describe(None, false), requested = %time, "time binding after delay");
        return Err(QuillError::TemporalBindingRejected {
            node: expr.describe(None, false),
            requested: time,
        });
    }
    expr.set_time(time)
}

/// Whether `loop-<name>` refers to `expr`: either the node claims the name or
/// the name resolves to a type its values are assignable to.
pub fn loop_matches(expr: &dyn Expression, types: &TypeRegistry, name: &str) -> bool {
    if expr.is_loop_of(name) {
        return true;
    }
    types
        .resolve_name(name)
        .map(|key| types.is_assignable(&expr.return_type(), &key))
        .unwrap_or(false)
}

/// "a", "a and b", "a, b and c"
pub fn describe_joined(parts: &[String], quantifier: Quantifier) -> String {
    match parts {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} {} {}", init.join(", "), quantifier.conjunction(), last),
    }
}

/// Conveniences on shared nodes.
pub trait ExprRefExt {
    fn convert_to(&self, types: &TypeRegistry, to: &TypeKey) -> Result<ExprRef>;

    /// The outermost unconverted node: `self` when not converted.
    fn origin(&self) -> ExprRef;

    /// Nodes in the tree rooted here, counting shared subtrees once per path.
    fn node_count(&self) -> usize;
}

impl ExprRefExt for ExprRef {
    fn convert_to(&self, types: &TypeRegistry, to: &TypeKey) -> Result<ExprRef> {
        convert_to(self, types, to)
    }

    fn origin(&self) -> ExprRef {
        let mut current = Arc::clone(self);
        while let Some(source) = current.source() {
            current = source;
        }
        current
    }

    fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }
}
