//! Converter edges
use quill_core::{TypeKey, Value};
use std::fmt;
use std::sync::Arc;

/// Maps one value to an optional value of another type; may fail per value.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// A directed conversion, either registered or composed at seal.
#[derive(Clone)]
pub struct ConverterEdge {
    pub from: TypeKey,
    pub to: TypeKey,
    convert: ConvertFn,
    /// Types visited, `from` first and `to` last; two entries for a direct edge
    chain: Vec<TypeKey>,
}

impl ConverterEdge {
    pub fn new(from: TypeKey, to: TypeKey, convert: ConvertFn) -> Self {
        let chain = vec![from.clone(), to.clone()];
        Self {
            from,
            to,
            convert,
            chain,
        }
    }

    pub fn apply(&self, value: &Value) -> Option<Value> {
        (self.convert)(value)
    }

    pub fn chain(&self) -> &[TypeKey] {
        &self.chain
    }

    pub fn is_synthesized(&self) -> bool {
        self.chain.len() > 2
    }

    /// The same conversion applied to values of `from`, a subtype of `self.from`.
    pub fn rebased(&self, from: TypeKey) -> ConverterEdge {
        let mut chain = self.chain.clone();
        chain.insert(0, from.clone());
        ConverterEdge {
            from,
            to: self.to.clone(),
            convert: Arc::clone(&self.convert),
            chain,
        }
    }

    /// `self` followed by `next`. `next.from` must accept `self.to` values.
    pub fn then(&self, next: &ConverterEdge) -> ConverterEdge {
        let first = Arc::clone(&self.convert);
        let second = Arc::clone(&next.convert);
        let mut chain = self.chain.clone();
        chain.extend(next.chain.iter().skip(1).cloned());
        ConverterEdge {
            from: self.from.clone(),
            to: next.to.clone(),
            convert: Arc::new(move |v: &Value| first(v).and_then(|mid| second(&mid))),
            chain,
        }
    }
}

impl fmt::Debug for ConverterEdge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let chain: Vec<&str> = self.chain.iter().map(|k| k.as_str()).collect();
        write!(f, "ConverterEdge({})", chain.join(" -> "))
    }
}
