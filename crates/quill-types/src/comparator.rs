//! Comparators and relations
use quill_core::{TypeKey, Value};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Equal,
    NotEqual,
    Smaller,
    Greater,
    Unknown,
}

impl Relation {
    pub fn from_ordering(ordering: Ordering) -> Self {
        match ordering {
            Ordering::Less => Relation::Smaller,
            Ordering::Equal => Relation::Equal,
            Ordering::Greater => Relation::Greater,
        }
    }

    pub fn from_partial(ordering: Option<Ordering>) -> Self {
        ordering.map(Self::from_ordering).unwrap_or(Relation::Unknown)
    }

    pub fn from_equality(equal: bool) -> Self {
        if equal {
            Relation::Equal
        } else {
            Relation::NotEqual
        }
    }

    /// The relation with its operands swapped.
    pub fn inverse(self) -> Self {
        match self {
            Relation::Smaller => Relation::Greater,
            Relation::Greater => Relation::Smaller,
            other => other,
        }
    }

    pub fn is_equal(self) -> bool {
        self == Relation::Equal
    }

    pub fn is_unknown(self) -> bool {
        self == Relation::Unknown
    }

    /// Smaller and greater also count as not equal.
    pub fn satisfies(self, wanted: Relation) -> bool {
        match wanted {
            Relation::NotEqual => matches!(self, Relation::NotEqual | Relation::Smaller | Relation::Greater),
            other => self == other,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Relation::Equal => "equal to",
            Relation::NotEqual => "not equal to",
            Relation::Smaller => "smaller than",
            Relation::Greater => "greater than",
            Relation::Unknown => "not comparable to",
        };
        f.write_str(s)
    }
}

pub type ComparatorFn = Arc<dyn Fn(&Value, &Value) -> Relation + Send + Sync>;

#[derive(Clone)]
pub struct ComparatorEntry {
    pub from: TypeKey,
    pub to: TypeKey,
    compare: ComparatorFn,
}

impl ComparatorEntry {
    pub fn new(from: TypeKey, to: TypeKey, compare: ComparatorFn) -> Self {
        Self { from, to, compare }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Relation {
        (self.compare)(a, b)
    }
}

impl fmt::Debug for ComparatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ComparatorEntry({} <=> {})", self.from, self.to)
    }
}
