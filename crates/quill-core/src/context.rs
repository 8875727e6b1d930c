//! Execution Context: one host event threaded through every evaluation call
//!
//! The engine never looks inside the event. It only carries it to the nodes,
//! which hand it back to host-supplied getters, and uses the context as the
//! key of an optional per-event memo cache.
use crate::config::EngineConfig;
use crate::time::Time;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub struct ExecutionContext {
    trace_id: String,
    created_at: DateTime<Utc>,
    event: Arc<dyn Any + Send + Sync>,
    revoked: Arc<AtomicBool>,
    memo: Option<Mutex<HashMap<(usize, Time), Vec<Value>>>>,
}

impl ExecutionContext {
    pub fn new<E: Any + Send + Sync>(event: E) -> Self {
        Self::from_shared(Arc::new(event))
    }

    pub fn from_shared(event: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            trace_id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            event,
            revoked: Arc::new(AtomicBool::new(false)),
            memo: None,
        }
    }

    pub fn for_config<E: Any + Send + Sync>(event: E, config: &EngineConfig) -> Self {
        let ctx = Self::new(event);
        if config.memoize {
            ctx.with_memo()
        } else {
            ctx
        }
    }

    /// Enable the per-context memo cache.
    pub fn with_memo(mut self) -> Self {
        self.memo = Some(Mutex::new(HashMap::new()));
        self
    }

    /// Host-side accessor for the wrapped event.
    pub fn event<E: Any>(&self) -> Option<&E> {
        self.event.downcast_ref::<E>()
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Handle the host keeps to revoke the event mid-evaluation.
    pub fn handle(&self) -> ContextHandle {
        ContextHandle {
            revoked: Arc::clone(&self.revoked),
        }
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }

    pub fn has_memo(&self) -> bool {
        self.memo.is_some()
    }

    /// Values cached for `node` bound to `time` in this context, computing
    /// them on first use.
    ///
    /// The lock is not held while `compute` runs, so memoized nodes may nest.
    pub fn memoized(&self, node: usize, time: Time, compute: impl FnOnce() -> Vec<Value>) -> Vec<Value> {
        let key = (node, time);
        let Some(memo) = &self.memo else {
            return compute();
        };

        if let Some(hit) = lock(memo).get(&key) {
            return hit.clone();
        }

        let values = compute();
        if !self.is_revoked() {
            lock(memo).insert(key, values.clone());
        }
        values
    }

    /// Drop every cached entry of `node`, e.g. after its values changed.
    pub fn forget(&self, node: usize) {
        if let Some(memo) = &self.memo {
            lock(memo).retain(|(cached, _), _| *cached != node);
        }
    }

    pub fn memo_len(&self) -> usize {
        self.memo.as_ref().map(|m| lock(m).len()).unwrap_or(0)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("trace_id", &self.trace_id)
            .field("created_at", &self.created_at)
            .field("revoked", &self.is_revoked())
            .field("memo", &self.memo.is_some())
            .finish()
    }
}

/// Revocation handle shared between the host and a context.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    revoked: Arc<AtomicBool>,
}

impl ContextHandle {
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::Release);
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked.load(Ordering::Acquire)
    }
}
