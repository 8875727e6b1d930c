//! Combined expressions: "a, b and c" / "a or b"
use crate::expression::{check_values, convert_to, describe_joined, ExprRef, Expression, Quantifier};
use quill_core::{ExecutionContext, QuillError, Result, Time, TypeKey, Value};
use quill_types::{ChangeMode, TypeRegistry};
use std::sync::Arc;

pub struct ExpressionList {
    children: Vec<ExprRef>,
    ty: TypeKey,
    quantifier: Quantifier,
}

impl ExpressionList {
    /// The list's type is the children's shared type, or `object` if they differ.
    pub fn new(children: Vec<ExprRef>, quantifier: Quantifier) -> Self {
        let ty = match children.split_first() {
            Some((first, rest)) => {
                let ty = first.return_type();
                if rest.iter().all(|c| c.return_type() == ty) {
                    ty
                } else {
                    TypeKey::object()
                }
            }
            None => TypeKey::object(),
        };
        Self {
            children,
            ty,
            quantifier,
        }
    }
}

impl Expression for ExpressionList {
    fn return_type(&self) -> TypeKey {
        self.ty.clone()
    }

    fn is_single(&self) -> bool {
        matches!(self.children.as_slice(), [only] if only.is_single())
    }

    fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value> {
        self.iterate(ctx).collect()
    }

    fn iterate<'a>(&'a self, ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.children.iter().flat_map(move |c| c.iterate(ctx)))
    }

    /// Every value of every child is tested under the list's quantifier;
    /// children contribute values, not verdicts.
    fn check(&self, ctx: &ExecutionContext, predicate: &dyn Fn(&Value) -> bool, negated: bool) -> bool {
        let quantifier = if self.is_single() { Quantifier::Or } else { self.quantifier };
        check_values(ctx, self.iterate(ctx), quantifier, predicate, negated)
    }

    fn convert_self(&self, types: &TypeRegistry, to: &TypeKey) -> Option<ExprRef> {
        let children = self
            .children
            .iter()
            .map(|c| convert_to(c, types, to).ok())
            .collect::<Option<Vec<ExprRef>>>()?;
        Some(Arc::new(ExpressionList {
            children,
            ty: to.clone(),
            quantifier: self.quantifier,
        }))
    }

    /// Types every child accepts.
    fn accept_change(&self, types: &TypeRegistry, mode: ChangeMode) -> Option<Vec<TypeKey>> {
        let mut accepted: Option<Vec<TypeKey>> = None;
        for child in &self.children {
            let mine = child.accept_change(types, mode)?;
            accepted = Some(match accepted {
                None => mine,
                Some(prev) => prev.into_iter().filter(|t| mine.contains(t)).collect(),
            });
        }
        accepted.filter(|a| !a.is_empty())
    }

    fn change(
        &self,
        types: &TypeRegistry,
        ctx: &ExecutionContext,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<()> {
        let accepted = self.accept_change(types, mode);
        types.validate_delta(accepted.as_deref(), delta, mode)?;
        for child in &self.children {
            child.change(types, ctx, delta, mode)?;
        }
        Ok(())
    }

    /// Succeeds if at least one child has the requested state.
    fn set_time(&self, time: Time) -> Result<()> {
        let mut any = false;
        for child in &self.children {
            any |= child.set_time(time).is_ok();
        }
        if any || time == Time::Default {
            Ok(())
        } else {
            Err(QuillError::TemporalBindingRejected {
                node: self.describe(None, false),
                requested: time,
            })
        }
    }

    fn time(&self) -> Time {
        let mut times = self.children.iter().map(|c| c.time());
        match times.next() {
            Some(first) if times.all(|t| t == first) => first,
            _ => Time::Default,
        }
    }

    fn is_loop_of(&self, name: &str) -> bool {
        self.children.iter().any(|c| c.is_loop_of(name))
    }

    fn children(&self) -> Vec<ExprRef> {
        self.children.clone()
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        let parts: Vec<String> = self.children.iter().map(|c| c.describe(ctx, debug)).collect();
        describe_joined(&parts, self.quantifier)
    }
}
