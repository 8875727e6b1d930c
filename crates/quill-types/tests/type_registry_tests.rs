//! Integration tests for the type registry: closure, supertypes, comparison
//! and the seal boundary.

use proptest::prelude::*;
use quill_core::{Result, TypeKey, Value};
use quill_types::{ChangeMode, Changer, Relation, TypeDescriptor, TypeRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn key(name: &str) -> TypeKey {
    TypeKey::new(name)
}

/// integer -> number -> text, boolean -> text, and a `player` subtype of `entity`.
fn sample() -> TypeRegistry {
    let mut types = TypeRegistry::new();
    types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
    types.register_type(TypeDescriptor::new::<f64>("number")).unwrap();
    types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
    types.register_type(TypeDescriptor::new::<bool>("boolean")).unwrap();
    types.register_type(TypeDescriptor::new::<u32>("entity")).unwrap();
    types
        .register_type(TypeDescriptor::new::<u32>("player").with_supertype("entity"))
        .unwrap();

    types
        .register_converter("integer", "number", |i: &i64| Some(*i as f64))
        .unwrap();
    types
        .register_converter("number", "text", |n: &f64| Some(format!("{}", n)))
        .unwrap();
    types
        .register_converter("entity", "integer", |id: &u32| Some(*id as i64))
        .unwrap();
    types
        .register_comparator("integer", "integer", |a: &i64, b: &i64| Relation::from_ordering(a.cmp(b)))
        .unwrap();
    types
        .register_comparator("number", "number", |a: &f64, b: &f64| Relation::from_partial(a.partial_cmp(b)))
        .unwrap();
    types
}

// =============================================================================
// Converter closure
// =============================================================================

#[test]
fn test_transitive_closure_after_seal() {
    let mut types = sample();
    types.seal().unwrap();

    assert!(types.converter_exists(&key("integer"), &key("text")));
    assert!(types.converter_exists(&key("entity"), &key("text")));
    assert!(types.converter_exists(&key("player"), &key("text")));
    assert!(!types.converter_exists(&key("text"), &key("integer")));
    assert!(!types.converter_exists(&key("boolean"), &key("text")));
}

#[test]
fn test_subtype_inherits_supertype_converters() {
    let mut types = sample();
    types.seal().unwrap();

    let player = Value::new("player", 7u32);
    let out = types.convert(&player, &key("number")).unwrap();
    assert_eq!(out.type_key(), &key("number"));
    assert_eq!(out.downcast_ref::<f64>(), Some(&7.0));

    assert!(types.is_assignable(&key("player"), &key("entity")));
    assert!(!types.is_assignable(&key("entity"), &key("player")));
    assert_eq!(types.convert(&player, &key("entity")).unwrap().downcast_ref::<u32>(), Some(&7));
}

#[test]
fn test_synthesized_chain_is_shortest() {
    let mut types = sample();
    types
        .register_converter("integer", "text", |i: &i64| Some(format!("#{}", i)))
        .unwrap();
    types.seal().unwrap();

    let edge = types.converter(&key("entity"), &key("text")).unwrap();
    let chain: Vec<&str> = edge.chain().iter().map(|k| k.as_str()).collect();
    assert_eq!(chain, vec!["entity", "integer", "text"]);

    let out = types.convert(&Value::new("entity", 3u32), &key("text")).unwrap();
    assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("#3"));
}

#[test]
fn test_per_value_failure_is_absence() {
    let mut types = TypeRegistry::new();
    types.register_type(TypeDescriptor::new::<String>("text")).unwrap();
    types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
    types
        .register_converter("text", "integer", |s: &String| s.parse::<i64>().ok())
        .unwrap();
    types.seal().unwrap();

    assert!(types.convert(&Value::new("text", "12".to_string()), &key("integer")).is_some());
    assert!(types.convert(&Value::new("text", "twelve".to_string()), &key("integer")).is_none());
}

// =============================================================================
// Comparison
// =============================================================================

#[test]
fn test_compare_exact_and_converted() {
    let mut types = sample();
    types.seal().unwrap();

    let one = Value::new("integer", 1i64);
    let two = Value::new("integer", 2i64);
    assert_eq!(types.compare(&one, &two), Relation::Smaller);

    let half = Value::new("number", 0.5f64);
    assert_eq!(types.compare(&one, &half), Relation::Greater);
    assert_eq!(types.compare(&half, &one), Relation::Smaller);

    let yes = Value::new("boolean", true);
    assert_eq!(types.compare(&one, &yes), Relation::Unknown);
}

#[test]
fn test_reverse_comparator_inverts_relation() {
    let mut types = sample();
    types
        .register_comparator("integer", "number", |a: &i64, b: &f64| {
            Relation::from_partial((*a as f64).partial_cmp(b))
        })
        .unwrap();
    types.seal().unwrap();

    let three = Value::new("integer", 3i64);
    let pi = Value::new("number", 3.14f64);
    assert_eq!(types.compare(&three, &pi), Relation::Smaller);
    assert_eq!(types.compare(&pi, &three), Relation::Greater);
}

// =============================================================================
// Seal boundary
// =============================================================================

#[test]
fn test_registration_after_seal_has_no_effect() {
    let mut types = sample();
    types.seal().unwrap();

    let err = types
        .register_converter("boolean", "text", |b: &bool| Some(b.to_string()))
        .unwrap_err();
    assert!(err.is_configuration());
    assert!(!types.converter_exists(&key("boolean"), &key("text")));

    let err = types.register_type(TypeDescriptor::new::<char>("letter")).unwrap_err();
    assert!(err.is_configuration());
    assert!(types.descriptor(&key("letter")).is_none());
}

#[test]
fn test_rejected_registrations() {
    let mut types = sample();
    assert!(types.register_type(TypeDescriptor::new::<i64>("integer")).is_err());
    assert!(types
        .register_type(TypeDescriptor::new::<u8>("robot").with_supertype("machine"))
        .is_err());
    assert!(types
        .register_type(TypeDescriptor::new::<i64>("npc").with_supertype("entity"))
        .is_err());
    assert!(types
        .register_converter("integer", "integer", |i: &i64| Some(*i))
        .is_err());
    assert!(types
        .register_converter("integer", "number", |i: &i64| Some(*i as f64))
        .is_err());
}

// =============================================================================
// Names, defaults, changers
// =============================================================================

struct CountingChanger(Arc<AtomicUsize>);

impl Changer for CountingChanger {
    fn accept_change(&self, mode: ChangeMode) -> Option<Vec<TypeKey>> {
        match mode {
            ChangeMode::Add => Some(vec![TypeKey::new("integer")]),
            _ => None,
        }
    }

    fn change(&self, what: &[Value], _delta: Option<&[Value]>, _mode: ChangeMode) -> Result<()> {
        self.0.fetch_add(what.len(), Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_changer_is_inherited() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut types = TypeRegistry::new();
    types.register_type(TypeDescriptor::new::<i64>("integer")).unwrap();
    types
        .register_type(TypeDescriptor::new::<u32>("entity").with_changer(CountingChanger(calls.clone())))
        .unwrap();
    types
        .register_type(TypeDescriptor::new::<u32>("player").with_supertype("entity"))
        .unwrap();
    types.seal().unwrap();

    let changer = types.changer(&key("player")).unwrap();
    assert_eq!(changer.accept_change(ChangeMode::Add), Some(vec![key("integer")]));
    assert!(changer.accept_change(ChangeMode::Delete).is_none());
    changer
        .change(&[Value::new("player", 1u32), Value::new("player", 2u32)], None, ChangeMode::Add)
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(types.changer(&key("integer")).is_none());
}

#[test]
fn test_resolve_names_and_defaults() {
    let mut types = TypeRegistry::new();
    types
        .register_type(
            TypeDescriptor::new::<i64>("integer")
                .with_user_name("whole number")
                .with_default(|| Some(Value::new("integer", 0i64))),
        )
        .unwrap();
    types.seal().unwrap();

    assert_eq!(types.resolve_name("integers"), Some(key("integer")));
    assert_eq!(types.resolve_name("Whole Number"), Some(key("integer")));
    assert_eq!(types.resolve_name("objects"), Some(TypeKey::object()));
    assert_eq!(types.resolve_name("widget"), None);
    assert_eq!(types.default_value(&key("integer")).unwrap().downcast_ref::<i64>(), Some(&0));
}

// =============================================================================
// Property tests
// =============================================================================

proptest! {
    /// On a random chain of types, every forward pair converts after seal and
    /// the conversion adds one per hop.
    #[test]
    fn prop_chain_closure(len in 2usize..8, start in 0i64..1000) {
        let mut types = TypeRegistry::new();
        for i in 0..len {
            types.register_type(TypeDescriptor::new::<i64>(format!("t{}", i))).unwrap();
        }
        for i in 1..len {
            types
                .register_converter(format!("t{}", i - 1), format!("t{}", i), |v: &i64| Some(v + 1))
                .unwrap();
        }
        types.seal().unwrap();

        for i in 0..len {
            for j in 0..len {
                let (from, to) = (key(&format!("t{}", i)), key(&format!("t{}", j)));
                prop_assert_eq!(types.converter_exists(&from, &to), i <= j);
                if i <= j {
                    let out = types.convert(&Value::new(from.clone(), start), &to).unwrap();
                    prop_assert_eq!(out.downcast_ref::<i64>(), Some(&(start + (j - i) as i64)));
                }
            }
        }
    }
}
