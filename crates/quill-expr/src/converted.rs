//! Nodes wrapped in a registry converter
use crate::expression::{convert_to, ExprRef, Expression, Quantifier};
use quill_core::{ExecutionContext, Result, Time, TypeKey, Value};
use quill_types::{ChangeMode, ConverterEdge, TypeRegistry};
use std::sync::Arc;

/// Yields `source`'s values converted by `edge`, dropping values that fail.
///
/// Cardinality, quantifier, time and changes all belong to the source; this
/// node only maps what comes out of it.
pub struct ConvertedExpression {
    source: ExprRef,
    edge: ConverterEdge,
}

impl ConvertedExpression {
    pub fn new(source: ExprRef, edge: ConverterEdge) -> Self {
        Self { source, edge }
    }

    pub fn edge(&self) -> &ConverterEdge {
        &self.edge
    }
}

impl Expression for ConvertedExpression {
    fn return_type(&self) -> TypeKey {
        self.edge.to.clone()
    }

    fn is_single(&self) -> bool {
        self.source.is_single()
    }

    fn quantifier(&self) -> Quantifier {
        self.source.quantifier()
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value> {
        self.iterate(ctx).collect()
    }

    fn single(&self, ctx: &ExecutionContext) -> Option<Value> {
        self.iterate(ctx).next()
    }

    fn iterate<'a>(&'a self, ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.source.iterate(ctx).filter_map(move |v| self.edge.apply(&v)))
    }

    fn source(&self) -> Option<ExprRef> {
        Some(Arc::clone(&self.source))
    }

    /// Re-convert from the source rather than stacking converters.
    fn convert_self(&self, types: &TypeRegistry, to: &TypeKey) -> Option<ExprRef> {
        convert_to(&self.source, types, to).ok()
    }

    fn accept_change(&self, types: &TypeRegistry, mode: ChangeMode) -> Option<Vec<TypeKey>> {
        self.source.accept_change(types, mode)
    }

    fn change(
        &self,
        types: &TypeRegistry,
        ctx: &ExecutionContext,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<()> {
        self.source.change(types, ctx, delta, mode)
    }

    fn set_time(&self, time: Time) -> Result<()> {
        self.source.set_time(time)
    }

    fn time(&self) -> Time {
        self.source.time()
    }

    fn is_default(&self) -> bool {
        self.source.is_default()
    }

    fn is_loop_of(&self, name: &str) -> bool {
        self.source.is_loop_of(name)
    }

    fn children(&self) -> Vec<ExprRef> {
        vec![Arc::clone(&self.source)]
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        let inner = self.source.describe(ctx, debug);
        if debug {
            format!("({} as {})", inner, self.edge.to)
        } else {
            inner
        }
    }
}
