//! Integration tests for the expression protocol over a sealed type registry.

use proptest::prelude::*;
use quill_core::{ExecutionContext, Kleenean, QuillError, Time, TypeKey, Value};
use quill_expr::{
    bind_time, convert_to, EventValueExpression, ExprRef, ExprRefExt, Expression, ExpressionList, Literal,
    PropertyExpression, Quantifier,
};
use quill_types::{Relation, TypeDescriptor, TypeRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn types() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
    types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
    types.register_type(TypeDescriptor::new::<bool>("boolean")).unwrap();
    types
        .register_converter("integer", "text", |i: &i64| Some(i.to_string()))
        .unwrap();
    types
        .register_comparator("text", "text", |a: &String, b: &String| Relation::from_equality(a == b))
        .unwrap();
    types.seal().unwrap();
    types
}

fn ints(values: &[i64]) -> ExprRef {
    Arc::new(Literal::of("integer", values.iter().copied()))
}

fn strings(values: &[Value]) -> Vec<String> {
    values.iter().filter_map(|v| v.downcast_ref::<String>().cloned()).collect()
}

/// Counts evaluations so tests can prove nothing ran.
struct Tally {
    evaluations: AtomicUsize,
}

impl Expression for Tally {
    fn return_type(&self) -> TypeKey {
        TypeKey::new("integer")
    }

    fn is_single(&self) -> bool {
        true
    }

    fn array(&self, _ctx: &ExecutionContext) -> Vec<Value> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        vec![Value::new("integer", 1i64)]
    }

    fn describe(&self, _ctx: Option<&ExecutionContext>, _debug: bool) -> String {
        "tally".to_string()
    }
}

// =============================================================================
// Conversion
// =============================================================================

#[test]
fn test_integer_list_converts_to_text() {
    let types = types();
    let ctx = ExecutionContext::new(());
    let converted = convert_to(&ints(&[1, 2, 3]), &types, &"text".into()).unwrap();

    assert_eq!(converted.return_type().as_str(), "text");
    assert_eq!(strings(&converted.array(&ctx)), vec!["1", "2", "3"]);
    assert_eq!(strings(&converted.iterate(&ctx).collect::<Vec<_>>()), vec!["1", "2", "3"]);
    assert!(converted.source().is_some());
}

#[test]
fn test_identity_conversion_returns_same_node() {
    let types = types();
    let ctx = ExecutionContext::new(());
    let original = ints(&[4, 5]);

    let same = original.convert_to(&types, &"integer".into()).unwrap();
    assert!(Arc::ptr_eq(&same, &original));
    assert!(same.source().is_none());

    let as_object = original.convert_to(&types, &TypeKey::object()).unwrap();
    let a: Vec<i64> = original.array(&ctx).iter().filter_map(|v| v.downcast_ref::<i64>().copied()).collect();
    let b: Vec<i64> = as_object.array(&ctx).iter().filter_map(|v| v.downcast_ref::<i64>().copied()).collect();
    assert_eq!(a, b);
}

#[test]
fn test_unavailable_conversion_fails_at_bind_time() {
    let types = types();
    let tally = Arc::new(Tally {
        evaluations: AtomicUsize::new(0),
    });
    let expr: ExprRef = tally.clone();

    let err = convert_to(&expr, &types, &"boolean".into()).err().unwrap();
    assert_eq!(
        err,
        QuillError::ConversionUnavailable {
            from: TypeKey::new("integer"),
            to: TypeKey::new("boolean"),
        }
    );
    assert_eq!(tally.evaluations.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Conditions
// =============================================================================

#[test]
fn test_or_list_compared_to_text() {
    let types = types();
    let ctx = ExecutionContext::new(());
    let one_or_two: ExprRef = Arc::new(ExpressionList::new(vec![ints(&[1]), ints(&[2])], Quantifier::Or));
    let as_text = convert_to(&one_or_two, &types, &"text".into()).unwrap();

    let target = Value::new("text", "2".to_string());
    let equals = |v: &Value| types.compare(v, &target).is_equal();

    assert!(as_text.check(&ctx, &equals, false));
    assert!(!as_text.check(&ctx, &equals, true));
}

#[test]
fn test_property_of_converted_owner() {
    let types = types();
    let ctx = ExecutionContext::new(());
    let owner = convert_to(&ints(&[7, 42]), &types, &"text".into()).unwrap();
    let digits: ExprRef = Arc::new(PropertyExpression::typed(owner, "digit count", "integer", |s: &String| {
        Some(s.len() as i64)
    }));

    let counts: Vec<i64> = digits.array(&ctx).iter().filter_map(|v| v.downcast_ref::<i64>().copied()).collect();
    assert_eq!(counts, vec![1, 2]);
    assert_eq!(digits.node_count(), 3);
    assert!(digits.check(&ctx, &|v: &Value| v.downcast_ref::<i64>().map(|n| *n > 0).unwrap_or(false), false));
}

// =============================================================================
// Temporal binding
// =============================================================================

struct Teleport {
    from: String,
    to: String,
}

#[test]
fn test_past_binding_before_and_after_delay() {
    let location = EventValueExpression::typed("text", "location", |e: &Teleport| Some(e.to.clone()))
        .with_typed_state(Time::Past, |e: &Teleport| Some(e.from.clone()));
    let ctx = ExecutionContext::new(Teleport {
        from: "spawn".to_string(),
        to: "arena".to_string(),
    });

    assert!(bind_time(&location, Time::Past, Kleenean::True).is_err());
    assert_eq!(location.time(), Time::Default);

    bind_time(&location, Time::Past, Kleenean::False).unwrap();
    assert_eq!(strings(&location.array(&ctx)), vec!["spawn"]);

    assert!(bind_time(&location, Time::Future, Kleenean::Unknown).is_err());
    assert_eq!(location.time(), Time::Past);
}

// =============================================================================
// Property tests
// =============================================================================

fn is_even(v: &Value) -> bool {
    v.downcast_ref::<i64>().map(|n| n % 2 == 0).unwrap_or(false)
}

proptest! {
    #[test]
    fn prop_single_agrees_with_array(values in proptest::collection::vec(-50i64..50, 0..6)) {
        let ctx = ExecutionContext::new(());
        let expr = ints(&values);
        let array = expr.array(&ctx);
        let single = expr.single(&ctx);
        prop_assert_eq!(single.is_none(), array.is_empty());
        if let Some(v) = single {
            prop_assert!(array.iter().any(|a| a.downcast_ref::<i64>() == v.downcast_ref::<i64>()));
        }
        prop_assert_eq!(expr.all(&ctx).len(), array.len());
        prop_assert_eq!(expr.iterate(&ctx).count(), array.len());
    }

    #[test]
    fn prop_quantifier_truth_table(values in proptest::collection::vec(-50i64..50, 2..6), negated in any::<bool>()) {
        let ctx = ExecutionContext::new(());
        let all_even = values.iter().all(|n| n % 2 == 0);
        let any_even = values.iter().any(|n| n % 2 == 0);

        let and: ExprRef = Arc::new(Literal::of("integer", values.clone()));
        let or: ExprRef = Arc::new(Literal::of("integer", values.clone()).with_quantifier(Quantifier::Or));

        prop_assert_eq!(and.check(&ctx, &is_even, negated), all_even != negated);
        prop_assert_eq!(or.check(&ctx, &is_even, negated), any_even != negated);
    }

    #[test]
    fn prop_conversion_preserves_order(values in proptest::collection::vec(-500i64..500, 0..8)) {
        let types = types();
        let ctx = ExecutionContext::new(());
        let converted = convert_to(&ints(&values), &types, &"text".into()).unwrap();
        let expected: Vec<String> = values.iter().map(|n| n.to_string()).collect();
        prop_assert_eq!(strings(&converted.array(&ctx)), expected);
    }
}
