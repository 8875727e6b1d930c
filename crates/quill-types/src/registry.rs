//! Type Registry: types, converters, comparators and changers
use crate::changer::{ChangeMode, Changer};
use crate::comparator::{ComparatorEntry, ComparatorFn, Relation};
use crate::converter::{ConvertFn, ConverterEdge};
use crate::descriptor::TypeDescriptor;
use crate::sort::sort_descriptors;
use quill_core::{NativeShape, QuillError, Result, TypeKey, Value};
use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

type Pair = (TypeKey, TypeKey);

pub struct TypeRegistry {
    sealed: bool,
    types: Vec<TypeDescriptor>,
    index: HashMap<TypeKey, usize>,
    converters: HashMap<Pair, ConverterEdge>,
    /// Registered edges in registration order; synthesized ones are not listed
    direct: Vec<Pair>,
    comparators: HashMap<Pair, ComparatorEntry>,
    comparator_order: Vec<Pair>,
    sorted: Vec<TypeKey>,
    synthesized: usize,
}

impl TypeRegistry {
    /// An empty registry holding only the universal `object` type.
    pub fn new() -> Self {
        let mut registry = Self {
            sealed: false,
            types: Vec::new(),
            index: HashMap::new(),
            converters: HashMap::new(),
            direct: Vec::new(),
            comparators: HashMap::new(),
            comparator_order: Vec::new(),
            sorted: Vec::new(),
            synthesized: 0,
        };
        registry.insert_descriptor(TypeDescriptor::object());
        registry
    }

    // ================ REGISTRATION ================

    fn check_accepting(&self, what: impl fmt::Display) -> Result<()> {
        if self.sealed {
            return Err(QuillError::config(format!(
                "cannot register {}: registering is disabled after seal",
                what
            )));
        }
        Ok(())
    }

    fn insert_descriptor(&mut self, descriptor: TypeDescriptor) {
        self.index.insert(descriptor.key().clone(), self.types.len());
        self.types.push(descriptor);
    }

    fn require_type(&self, key: &TypeKey) -> Result<&TypeDescriptor> {
        self.descriptor(key)
            .ok_or_else(|| QuillError::config(format!("unknown type '{}'", key)))
    }

    fn check_endpoint(&self, key: &TypeKey, shape: NativeShape) -> Result<()> {
        let descriptor = self.require_type(key)?;
        match descriptor.native() {
            Some(native) if native != shape => Err(QuillError::config(format!(
                "type '{}' holds {} values, not {}",
                key, native.name, shape.name
            ))),
            _ => Ok(()),
        }
    }

    pub fn register_type(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        self.check_accepting(format_args!("type '{}'", descriptor.key()))?;
        let key = descriptor.key().clone();

        if self.index.contains_key(&key) {
            return Err(QuillError::config(format!("type '{}' is already registered", key)));
        }

        for parent_key in descriptor.supertypes() {
            let parent = self.descriptor(parent_key).ok_or_else(|| {
                QuillError::config(format!("type '{}' declares unknown supertype '{}'", key, parent_key))
            })?;
            if let Some(shape) = parent.native() {
                if descriptor.native() != Some(shape) {
                    return Err(QuillError::config(format!(
                        "type '{}' must share the native shape of its supertype '{}' ({})",
                        key, parent_key, shape.name
                    )));
                }
            }
        }

        debug!(type_key = %key, native = ?descriptor.native().map(|n| n.name), "registered type");
        self.insert_descriptor(descriptor);
        Ok(())
    }

    /// Register a converter from `from` (payload `F`) to `to` (payload `T`).
    pub fn register_converter<F, T, C>(
        &mut self,
        from: impl Into<TypeKey>,
        to: impl Into<TypeKey>,
        convert: C,
    ) -> Result<()>
    where
        F: Any,
        T: Any + Send + Sync + fmt::Debug,
        C: Fn(&F) -> Option<T> + Send + Sync + 'static,
    {
        let (from, to) = (from.into(), to.into());
        self.check_accepting(format_args!("converter {} -> {}", from, to))?;
        self.check_endpoint(&from, NativeShape::of::<F>())?;
        self.check_endpoint(&to, NativeShape::of::<T>())?;

        let target = to.clone();
        let erased: ConvertFn = Arc::new(move |value: &Value| {
            value
                .downcast_ref::<F>()
                .and_then(|payload| convert(payload))
                .map(|out| Value::new(target.clone(), out))
        });
        self.insert_converter(ConverterEdge::new(from, to, erased))
    }

    /// Register an already type-erased converter. The function must produce
    /// values tagged with `edge.to`.
    pub fn register_converter_edge(&mut self, edge: ConverterEdge) -> Result<()> {
        self.check_accepting(format_args!("converter {} -> {}", edge.from, edge.to))?;
        self.require_type(&edge.from)?;
        self.require_type(&edge.to)?;
        self.insert_converter(edge)
    }

    fn insert_converter(&mut self, edge: ConverterEdge) -> Result<()> {
        if edge.from == edge.to {
            return Err(QuillError::config(format!("converter from '{}' to itself", edge.from)));
        }
        let pair = (edge.from.clone(), edge.to.clone());
        if self.converters.contains_key(&pair) {
            return Err(QuillError::config(format!(
                "converter {} -> {} is already registered",
                pair.0, pair.1
            )));
        }
        debug!(from = %pair.0, to = %pair.1, "registered converter");
        self.direct.push(pair.clone());
        self.converters.insert(pair, edge);
        Ok(())
    }

    /// Register a comparator between `a` (payload `A`) and `b` (payload `B`).
    pub fn register_comparator<A, B, C>(
        &mut self,
        a: impl Into<TypeKey>,
        b: impl Into<TypeKey>,
        compare: C,
    ) -> Result<()>
    where
        A: Any,
        B: Any,
        C: Fn(&A, &B) -> Relation + Send + Sync + 'static,
    {
        let (a, b) = (a.into(), b.into());
        self.check_accepting(format_args!("comparator {} <=> {}", a, b))?;
        self.check_endpoint(&a, NativeShape::of::<A>())?;
        self.check_endpoint(&b, NativeShape::of::<B>())?;

        let pair = (a.clone(), b.clone());
        if self.comparators.contains_key(&pair) {
            return Err(QuillError::config(format!(
                "comparator {} <=> {} is already registered",
                a, b
            )));
        }

        let erased: ComparatorFn = Arc::new(move |x: &Value, y: &Value| {
            match (x.downcast_ref::<A>(), y.downcast_ref::<B>()) {
                (Some(x), Some(y)) => compare(x, y),
                _ => Relation::Unknown,
            }
        });
        debug!(a = %a, b = %b, "registered comparator");
        self.comparator_order.push(pair.clone());
        self.comparators.insert(pair, ComparatorEntry::new(a, b, erased));
        Ok(())
    }

    // ================ SEAL ================

    /// One-way transition to read-only. Synthesizes the converter closure and
    /// fixes the descriptor order. A second call is a configuration error.
    pub fn seal(&mut self) -> Result<()> {
        if self.sealed {
            return Err(QuillError::config("type registry is already sealed"));
        }
        self.synthesized = self.synthesize_missing_converters();
        self.sorted = sort_descriptors(&self.types);
        self.sealed = true;

        info!(
            types = self.types.len(),
            converters = self.converters.len(),
            synthesized = self.synthesized,
            comparators = self.comparators.len(),
            "type registry sealed"
        );
        Ok(())
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Compose edges for every reachable pair that lacks one, so lookups after
    /// seal never search the graph. Breadth-first, so each synthesized edge is
    /// a shortest chain.
    fn synthesize_missing_converters(&mut self) -> usize {
        let mut by_source: HashMap<TypeKey, Vec<TypeKey>> = HashMap::new();
        for (from, to) in &self.direct {
            by_source.entry(from.clone()).or_default().push(to.clone());
        }

        let sources: Vec<TypeKey> = self.types.iter().map(|d| d.key().clone()).collect();
        let mut added = 0;

        for src in sources {
            let mut seen: HashSet<TypeKey> = HashSet::from([src.clone()]);
            let mut queue = VecDeque::from([src.clone()]);

            while let Some(mid) = queue.pop_front() {
                for (via, next) in self.outgoing(&mid, &by_source) {
                    if !seen.insert(next.clone()) {
                        continue;
                    }
                    queue.push_back(next.clone());

                    if self.is_assignable(&src, &next) || self.find_edge(&src, &next).is_some() {
                        continue;
                    }
                    let Some(second) = self.converters.get(&(via, next.clone())).cloned() else {
                        continue;
                    };
                    let edge = match self.find_edge(&src, &mid) {
                        Some(first) => first.then(&second),
                        None if self.is_assignable(&src, &mid) => second.rebased(src.clone()),
                        None => {
                            warn!(from = %src, via = %mid, to = %next, "no edge to compose from");
                            continue;
                        }
                    };
                    trace!(chain = ?edge, "synthesized converter");
                    self.converters.insert((src.clone(), next), edge);
                    added += 1;
                }
            }
        }

        added
    }

    /// Direct edges leaving `key` or one of its supertypes, as `(via, next)`.
    fn outgoing(&self, key: &TypeKey, by_source: &HashMap<TypeKey, Vec<TypeKey>>) -> Vec<Pair> {
        let mut out = Vec::new();
        for via in self.self_and_ancestors(key) {
            if let Some(targets) = by_source.get(&via) {
                out.extend(targets.iter().map(|t| (via.clone(), t.clone())));
            }
        }
        out
    }

    // ================ LOOKUP ================

    pub fn descriptor(&self, key: &TypeKey) -> Option<&TypeDescriptor> {
        self.index.get(key).map(|&i| &self.types[i])
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.index.contains_key(key)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Descriptor order fixed at seal; empty before.
    pub fn sorted_types(&self) -> &[TypeKey] {
        &self.sorted
    }

    /// Deterministic order over all descriptors, stable for a given
    /// registration order. For reporting; nothing depends on it.
    pub fn sort_descriptors(&self) -> Vec<TypeKey> {
        sort_descriptors(&self.types)
    }

    /// All transitive supertypes of `key`, nearest first.
    pub fn ancestors(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut out = Vec::new();
        let mut queue: VecDeque<TypeKey> = VecDeque::from([key.clone()]);
        while let Some(current) = queue.pop_front() {
            if let Some(d) = self.descriptor(&current) {
                for parent in d.supertypes() {
                    if parent != key && !out.contains(parent) {
                        out.push(parent.clone());
                        queue.push_back(parent.clone());
                    }
                }
            }
        }
        out
    }

    fn self_and_ancestors(&self, key: &TypeKey) -> Vec<TypeKey> {
        let mut out = vec![key.clone()];
        out.extend(self.ancestors(key));
        out
    }

    /// Values of `from` are already values of `to`.
    pub fn is_assignable(&self, from: &TypeKey, to: &TypeKey) -> bool {
        from == to || to.is_object() || self.ancestors(from).contains(to)
    }

    fn find_edge(&self, from: &TypeKey, to: &TypeKey) -> Option<&ConverterEdge> {
        if let Some(edge) = self.converters.get(&(from.clone(), to.clone())) {
            return Some(edge);
        }
        self.ancestors(from)
            .into_iter()
            .find_map(|parent| self.converters.get(&(parent, to.clone())))
    }

    /// Reflexive, and transitively closed once sealed.
    pub fn converter_exists(&self, from: &TypeKey, to: &TypeKey) -> bool {
        self.is_assignable(from, to) || self.find_edge(from, to).is_some()
    }

    /// The edge converting `from` values to `to`, direct, synthesized or
    /// inherited from a supertype of `from`. `None` when no conversion is
    /// needed or none exists.
    pub fn converter(&self, from: &TypeKey, to: &TypeKey) -> Option<&ConverterEdge> {
        self.find_edge(from, to)
    }

    /// Convert one value; `None` if there is no path or the value fails.
    pub fn convert(&self, value: &Value, to: &TypeKey) -> Option<Value> {
        if self.is_assignable(value.type_key(), to) {
            return Some(value.clone());
        }
        self.find_edge(value.type_key(), to)?.apply(value)
    }

    /// Registered and synthesized edges, sorted by endpoints.
    pub fn converters(&self) -> Vec<&ConverterEdge> {
        let mut edges: Vec<&ConverterEdge> = self.converters.values().collect();
        edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        edges
    }

    pub fn synthesized_count(&self) -> usize {
        self.synthesized
    }

    /// Comparator pairs in registration order.
    pub fn comparators(&self) -> impl Iterator<Item = &ComparatorEntry> {
        self.comparator_order.iter().filter_map(|p| self.comparators.get(p))
    }

    fn find_comparator(&self, a: &TypeKey, b: &TypeKey) -> Option<&ComparatorEntry> {
        let mut left = self.self_and_ancestors(a);
        left.push(TypeKey::object());
        let mut right = self.self_and_ancestors(b);
        right.push(TypeKey::object());

        for x in &left {
            for y in &right {
                if let Some(entry) = self.comparators.get(&(x.clone(), y.clone())) {
                    return Some(entry);
                }
            }
        }
        None
    }

    /// Compare two values. Tries the exact comparator, then the reverse one,
    /// then converts either operand to the other's type. Never fails.
    pub fn compare(&self, a: &Value, b: &Value) -> Relation {
        let (ta, tb) = (a.type_key(), b.type_key());

        if let Some(entry) = self.find_comparator(ta, tb) {
            return entry.compare(a, b);
        }
        if let Some(entry) = self.find_comparator(tb, ta) {
            return entry.compare(b, a).inverse();
        }
        if let Some(b2) = self.find_edge(tb, ta).and_then(|e| e.apply(b)) {
            if let Some(entry) = self.find_comparator(ta, ta) {
                return entry.compare(a, &b2);
            }
        }
        if let Some(a2) = self.find_edge(ta, tb).and_then(|e| e.apply(a)) {
            if let Some(entry) = self.find_comparator(tb, tb) {
                return entry.compare(&a2, b);
            }
        }
        Relation::Unknown
    }

    /// The changer registered for `key` or its nearest supertype.
    pub fn changer(&self, key: &TypeKey) -> Option<Arc<dyn Changer>> {
        self.self_and_ancestors(key)
            .iter()
            .find_map(|k| self.descriptor(k).and_then(|d| d.changer().cloned()))
    }

    pub fn default_value(&self, key: &TypeKey) -> Option<Value> {
        self.descriptor(key).and_then(|d| d.default_value())
    }

    /// Resolve a placeholder name (code name, plural or user name).
    pub fn resolve_name(&self, name: &str) -> Option<TypeKey> {
        self.types
            .iter()
            .find(|d| d.answers_to(name))
            .map(|d| d.key().clone())
    }

    /// Check a delta against the types approved for `mode`. Deltas are never
    /// coerced: every value must already be assignable to an accepted type.
    pub fn validate_delta(
        &self,
        accepted: Option<&[TypeKey]>,
        delta: Option<&[Value]>,
        mode: ChangeMode,
    ) -> Result<()> {
        let accepted =
            accepted.ok_or_else(|| QuillError::unsupported(format!("{} is not supported here", mode)))?;

        if !mode.takes_delta() {
            if delta.map(|d| !d.is_empty()).unwrap_or(false) {
                return Err(QuillError::unsupported(format!("{} does not take a value", mode)));
            }
            return Ok(());
        }

        let delta = match delta {
            Some(d) if !d.is_empty() => d,
            _ => return Err(QuillError::unsupported(format!("{} requires a value", mode))),
        };

        for value in delta {
            if !accepted.iter().any(|t| self.is_assignable(value.type_key(), t)) {
                let expected: Vec<&str> = accepted.iter().map(|t| t.as_str()).collect();
                return Err(QuillError::unsupported(format!(
                    "cannot {} a {} value; expected {}",
                    mode,
                    value.type_key(),
                    expected.join(" or ")
                )));
            }
        }
        Ok(())
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("sealed", &self.sealed)
            .field("types", &self.types.len())
            .field("converters", &self.converters.len())
            .field("comparators", &self.comparators.len())
            .finish()
    }
}
