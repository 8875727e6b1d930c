//! Deterministic descriptor ordering
//!
//! Kahn's algorithm over the before/after hints and the supertype relation
//! (subtypes first, `object` last), breaking ties by registration order.
use crate::descriptor::TypeDescriptor;
use quill_core::TypeKey;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use tracing::warn;

pub(crate) fn sort_descriptors(types: &[TypeDescriptor]) -> Vec<TypeKey> {
    let n = types.len();
    let index: HashMap<&TypeKey, usize> = types.iter().enumerate().map(|(i, d)| (d.key(), i)).collect();

    let mut succ: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut indegree = vec![0usize; n];
    let mut add = |a: usize, b: usize| {
        if a != b && !succ[a].contains(&b) {
            succ[a].push(b);
            indegree[b] += 1;
        }
    };

    let object = index.get(&TypeKey::object()).copied();
    for (i, d) in types.iter().enumerate() {
        for key in d.sorts_before() {
            if let Some(&j) = index.get(key) {
                add(i, j);
            }
        }
        for key in d.sorts_after() {
            if let Some(&j) = index.get(key) {
                add(j, i);
            }
        }
        for key in d.supertypes() {
            if let Some(&j) = index.get(key) {
                add(i, j);
            }
        }
        if let Some(o) = object {
            add(i, o);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..n).filter(|&i| indegree[i] == 0).map(Reverse).collect();
    let mut placed = vec![false; n];
    let mut order = Vec::with_capacity(n);

    while let Some(Reverse(i)) = ready.pop() {
        placed[i] = true;
        order.push(types[i].key().clone());
        for &j in &succ[i] {
            indegree[j] -= 1;
            if indegree[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }

    if order.len() < n {
        let stuck: Vec<&str> = (0..n).filter(|&i| !placed[i]).map(|i| types[i].key().as_str()).collect();
        warn!(types = ?stuck, "circular before/after hints; keeping registration order for these types");
        for i in 0..n {
            if !placed[i] {
                order.push(types[i].key().clone());
            }
        }
    }

    order
}
