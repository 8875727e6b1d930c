//! Captured and cached values
//!
//! A [`Snapshot`] freezes a node's values at a suspension point so the rest
//! of the trigger sees them even after the event has moved on. [`Memoized`]
//! evaluates its node once per context when the context carries a memo cache.
use crate::expression::{describe_joined, ExprRef, Expression, Quantifier};
use quill_core::{ExecutionContext, QuillError, Result, Time, TypeKey, Value};
use quill_types::{ChangeMode, TypeRegistry};
use std::sync::Arc;

pub struct Snapshot {
    ty: TypeKey,
    values: Vec<Value>,
    single: bool,
    quantifier: Quantifier,
    time: Time,
    label: String,
}

/// Capture `expr`'s current values together with its type, cardinality,
/// quantifier and time. The snapshot is read-only.
pub fn snapshot(expr: &dyn Expression, ctx: &ExecutionContext) -> ExprRef {
    Arc::new(Snapshot {
        ty: expr.return_type(),
        values: expr.array(ctx),
        single: expr.is_single(),
        quantifier: expr.quantifier(),
        time: expr.time(),
        label: expr.describe(None, false),
    })
}

impl Expression for Snapshot {
    fn return_type(&self) -> TypeKey {
        self.ty.clone()
    }

    fn is_single(&self) -> bool {
        self.single
    }

    fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    fn array(&self, _ctx: &ExecutionContext) -> Vec<Value> {
        self.values.clone()
    }

    fn iterate<'a>(&'a self, _ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.values.iter().cloned())
    }

    fn accept_change(&self, _types: &TypeRegistry, _mode: ChangeMode) -> Option<Vec<TypeKey>> {
        None
    }

    fn set_time(&self, time: Time) -> Result<()> {
        if time == self.time {
            return Ok(());
        }
        Err(QuillError::TemporalBindingRejected {
            node: self.label.clone(),
            requested: time,
        })
    }

    fn time(&self) -> Time {
        self.time
    }

    fn describe(&self, _ctx: Option<&ExecutionContext>, debug: bool) -> String {
        if debug {
            let parts: Vec<String> = self.values.iter().map(Value::render).collect();
            format!("{} [{}]", self.label, describe_joined(&parts, self.quantifier))
        } else {
            self.label.clone()
        }
    }
}

/// Caches `inner`'s values in the context's memo, keyed by node identity and
/// temporal binding. A change through this node drops the cached values.
pub struct Memoized {
    inner: ExprRef,
}

pub fn memoized(inner: ExprRef) -> ExprRef {
    Arc::new(Memoized { inner })
}

impl Memoized {
    fn key(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

impl Expression for Memoized {
    fn return_type(&self) -> TypeKey {
        self.inner.return_type()
    }

    fn is_single(&self) -> bool {
        self.inner.is_single()
    }

    fn quantifier(&self) -> Quantifier {
        self.inner.quantifier()
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value> {
        ctx.memoized(self.key(), self.inner.time(), || self.inner.array(ctx))
    }

    fn source(&self) -> Option<ExprRef> {
        self.inner.source()
    }

    fn accept_change(&self, types: &TypeRegistry, mode: ChangeMode) -> Option<Vec<TypeKey>> {
        self.inner.accept_change(types, mode)
    }

    fn change(
        &self,
        types: &TypeRegistry,
        ctx: &ExecutionContext,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<()> {
        self.inner.change(types, ctx, delta, mode)?;
        ctx.forget(self.key());
        Ok(())
    }

    fn set_time(&self, time: Time) -> Result<()> {
        self.inner.set_time(time)
    }

    fn time(&self) -> Time {
        self.inner.time()
    }

    fn is_default(&self) -> bool {
        self.inner.is_default()
    }

    fn is_loop_of(&self, name: &str) -> bool {
        self.inner.is_loop_of(name)
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.inner)]
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        self.inner.describe(ctx, debug)
    }
}
