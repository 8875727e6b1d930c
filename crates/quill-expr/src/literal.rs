//! Constant values fixed at parse time
use crate::expression::{describe_joined, ExprRef, Expression, Quantifier};
use quill_core::{ExecutionContext, TypeKey, Value};
use quill_types::TypeRegistry;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

pub struct Literal {
    ty: TypeKey,
    values: Vec<Value>,
    quantifier: Quantifier,
}

impl Literal {
    pub fn new(ty: impl Into<TypeKey>, values: Vec<Value>) -> Self {
        Self {
            ty: ty.into(),
            values,
            quantifier: Quantifier::And,
        }
    }

    /// Literal of plain payloads, each tagged with `ty`.
    pub fn of<T>(ty: impl Into<TypeKey>, items: impl IntoIterator<Item = T>) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        let ty = ty.into();
        let values = items.into_iter().map(|item| Value::new(ty.clone(), item)).collect();
        Self::new(ty, values)
    }

    pub fn with_quantifier(mut self, quantifier: Quantifier) -> Self {
        self.quantifier = quantifier;
        self
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl Expression for Literal {
    fn return_type(&self) -> TypeKey {
        self.ty.clone()
    }

    fn is_single(&self) -> bool {
        self.values.len() == 1
    }

    fn quantifier(&self) -> Quantifier {
        self.quantifier
    }

    fn array(&self, _ctx: &ExecutionContext) -> Vec<Value> {
        self.values.clone()
    }

    fn single(&self, _ctx: &ExecutionContext) -> Option<Value> {
        self.values.first().cloned()
    }

    fn iterate<'a>(&'a self, _ctx: &'a ExecutionContext) -> Box<dyn Iterator<Item = Value> + 'a> {
        Box::new(self.values.iter().cloned())
    }

    /// An `object` literal converts by value, since its declared type says
    /// nothing about the payloads. Every value must convert.
    fn convert_self(&self, types: &TypeRegistry, to: &TypeKey) -> Option<ExprRef> {
        if !self.ty.is_object() {
            return None;
        }
        let converted = self
            .values
            .iter()
            .map(|v| types.convert(v, to))
            .collect::<Option<Vec<Value>>>()?;
        Some(Arc::new(Literal {
            ty: to.clone(),
            values: converted,
            quantifier: self.quantifier,
        }))
    }

    fn describe(&self, _ctx: Option<&ExecutionContext>, _debug: bool) -> String {
        let parts: Vec<String> = self.values.iter().map(Value::render).collect();
        describe_joined(&parts, self.quantifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::convert_to;
    use quill_types::TypeDescriptor;

    #[test]
    fn test_single_iff_one_value() {
        let ctx = ExecutionContext::new(());
        let one = Literal::of("integer", [5i64]);
        let many = Literal::of("integer", [1i64, 2]);
        assert!(one.is_single());
        assert!(!many.is_single());
        assert_eq!(one.single(&ctx).unwrap().downcast_ref::<i64>(), Some(&5));
        assert_eq!(many.describe(None, false), "1 and 2");
    }

    #[test]
    fn test_object_literal_converts_by_value() {
        let mut types = TypeRegistry::new();
        types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
        types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
        types
            .register_converter("integer", "text", |i: &i64| Some(i.to_string()))
            .unwrap();
        types.seal().unwrap();

        let mixed: ExprRef = Arc::new(Literal::new(
            TypeKey::object(),
            vec![Value::new("integer", 7i64), Value::new("text", "x".to_string())],
        ));
        let text = convert_to(&mixed, &types, &"text".into()).unwrap();
        assert_eq!(text.return_type().as_str(), "text");
        assert_eq!(text.describe(None, false), "\"7\" and \"x\"");

        assert!(convert_to(&mixed, &types, &"integer".into()).is_err());
    }
}
