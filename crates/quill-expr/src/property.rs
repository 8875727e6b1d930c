//! "<property> of <owner>" nodes
use crate::expression::{ExprRef, Expression, Quantifier};
use quill_core::{ExecutionContext, Result, Time, TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Maps an owner value to the property value, or `None` if it has none.
pub type Getter = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Yields `getter(v)` for every value `v` of the owner.
pub struct PropertyExpression {
    owner: ExprRef,
    name: String,
    ty: TypeKey,
    getter: Getter,
}

impl PropertyExpression {
    pub fn new(owner: ExprRef, name: impl Into<String>, ty: impl Into<TypeKey>, getter: Getter) -> Self {
        Self {
            owner,
            name: name.into(),
            ty: ty.into(),
            getter,
        }
    }

    /// Property over owners with an `O` payload, yielding `T` payloads.
    pub fn typed<O, T, F>(owner: ExprRef, name: impl Into<String>, ty: impl Into<TypeKey>, get: F) -> Self
    where
        O: Any,
        T: Any + Send + Sync + fmt::Debug,
        F: Fn(&O) -> Option<T> + Send + Sync + 'static,
    {
        let ty = ty.into();
        let tag = ty.clone();
        let getter: Getter = Arc::new(move |v: &Value| {
            v.downcast_ref::<O>()
                .and_then(|o| get(o))
                .map(|out| Value::new(tag.clone(), out))
        });
        Self::new(owner, name, ty, getter)
    }

    pub fn owner(&self) -> &ExprRef {
        &self.owner
    }
}

impl Expression for PropertyExpression {
    fn return_type(&self) -> TypeKey {
        self.ty.clone()
    }

    fn is_single(&self) -> bool {
        self.owner.is_single()
    }

    fn quantifier(&self) -> Quantifier {
        self.owner.quantifier()
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value> {
        self.iterate(ctx).collect()
    }

    fn single(&self, ctx: &ExecutionContext) -> Option<Value> {
        self.iterate(ctx).next()
    }

    fn iterate<'a>(&'a self, ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.owner.iterate(ctx).filter_map(move |v| (self.getter)(&v)))
    }

    fn set_time(&self, time: Time) -> Result<()> {
        self.owner.set_time(time)
    }

    fn time(&self) -> Time {
        self.owner.time()
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.owner)]
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        format!("{} of {}", self.name, self.owner.describe(ctx, debug))
    }
}
