//! Built-in types
//!
//! | type      | payload  |
//! |-----------|----------|
//! | `boolean` | `bool`   |
//! | `integer` | `i64`    |
//! | `number`  | `f64`    |
//! | `text`    | `String` |
//!
//! `object` is always present. Everything converts to `text`; integers widen
//! to numbers.
use crate::registry::Registry;
use quill_core::{Result, Value};
use quill_types::{Relation, TypeDescriptor};

pub fn register(registry: &mut Registry) -> Result<()> {
    let types = registry.types_mut();

    types.register_type(
        TypeDescriptor::new::<bool>("boolean")
            .with_plural("booleans")
            .with_default(|| Some(Value::new("boolean", false))),
    )?;
    types.register_type(
        TypeDescriptor::new::<i64>("integer")
            .with_user_name("whole number")
            .before("number")
            .with_default(|| Some(Value::new("integer", 0i64))),
    )?;
    types.register_type(TypeDescriptor::new::<f64>("number").with_default(|| Some(Value::new("number", 0.0f64))))?;
    types.register_type(
        TypeDescriptor::new::<String>("text")
            .with_user_name("string")
            .with_default(|| Some(Value::new("text", String::new()))),
    )?;

    types.register_converter("integer", "number", |i: &i64| Some(*i as f64))?;
    types.register_converter("integer", "text", |i: &i64| Some(i.to_string()))?;
    types.register_converter("number", "text", |n: &f64| Some(format_number(*n)))?;
    types.register_converter("boolean", "text", |b: &bool| Some(b.to_string()))?;

    types.register_comparator("boolean", "boolean", |a: &bool, b: &bool| Relation::from_equality(a == b))?;
    types.register_comparator("integer", "integer", |a: &i64, b: &i64| Relation::from_ordering(a.cmp(b)))?;
    types.register_comparator("number", "number", |a: &f64, b: &f64| Relation::from_partial(a.partial_cmp(b)))?;
    types.register_comparator("text", "text", |a: &String, b: &String| {
        Relation::from_equality(a.eq_ignore_ascii_case(b))
    })?;
    Ok(())
}

/// At most two decimals, trailing zeros dropped: `2.5`, `3`, `0.33`.
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.2}", n);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{EngineConfig, TypeKey};

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(1.0 / 3.0), "0.33");
        assert_eq!(format_number(-0.001), "0");
        assert_eq!(format_number(120.0), "120");
    }

    #[test]
    fn test_defaults_seal_cleanly() {
        let mut registry = Registry::new(EngineConfig::default());
        register(&mut registry).unwrap();
        registry.seal().unwrap();

        let types = registry.types();
        let text = TypeKey::new("text");
        let three = Value::new("integer", 3i64);
        let out = types.convert(&three, &text).unwrap();
        assert_eq!(out.downcast_ref::<String>().map(String::as_str), Some("3"));

        assert_eq!(types.compare(&three, &Value::new("number", 3.0f64)), Relation::Equal);
        assert_eq!(
            types.compare(&Value::new("text", "Hi".to_string()), &Value::new("text", "hI".to_string())),
            Relation::Equal
        );
        assert_eq!(types.resolve_name("string"), Some(text));

        let order: Vec<&str> = types.sorted_types().iter().map(|k| k.as_str()).collect();
        assert_eq!(order, vec!["boolean", "integer", "number", "text", "object"]);
    }
}
