//! Values read from the current event
use crate::expression::Expression;
use quill_core::{ExecutionContext, QuillError, Result, Time, TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicI8, Ordering};
use std::sync::Arc;

/// Reads one value from the context's event.
pub type EventGetter = Arc<dyn Fn(&ExecutionContext) -> Option<Value> + Send + Sync>;

/// Atomic temporal binding for nodes shared across threads.
#[derive(Debug, Default)]
pub struct TimeSlot(AtomicI8);

impl TimeSlot {
    pub fn new(time: Time) -> Self {
        Self(AtomicI8::new(time.as_i8()))
    }

    pub fn get(&self) -> Time {
        Time::from_i8(self.0.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set(&self, time: Time) {
        self.0.store(time.as_i8(), Ordering::Release);
    }
}

/// The event's value of one type, with optional past and future states.
pub struct EventValueExpression {
    ty: TypeKey,
    name: String,
    /// Indexed by `Time::as_i8() + 1`
    getters: [Option<EventGetter>; 3],
    time: TimeSlot,
}

fn slot(time: Time) -> usize {
    (time.as_i8() + 1) as usize
}

impl EventValueExpression {
    pub fn new(ty: impl Into<TypeKey>, name: impl Into<String>, present: EventGetter) -> Self {
        let mut getters: [Option<EventGetter>; 3] = [None, None, None];
        getters[slot(Time::Default)] = Some(present);
        Self {
            ty: ty.into(),
            name: name.into(),
            getters,
            time: TimeSlot::default(),
        }
    }

    /// Event value read from an `E` event, yielding `T` payloads.
    pub fn typed<E, T, F>(ty: impl Into<TypeKey>, name: impl Into<String>, get: F) -> Self
    where
        E: Any,
        T: Any + Send + Sync + fmt::Debug,
        F: Fn(&E) -> Option<T> + Send + Sync + 'static,
    {
        let ty = ty.into();
        Self::new(ty.clone(), name, typed_getter(ty, get))
    }

    /// Add the value the event had (`Past`) or will have (`Future`).
    pub fn with_state(mut self, time: Time, getter: EventGetter) -> Self {
        self.getters[slot(time)] = Some(getter);
        self
    }

    pub fn with_typed_state<E, T, F>(self, time: Time, get: F) -> Self
    where
        E: Any,
        T: Any + Send + Sync + fmt::Debug,
        F: Fn(&E) -> Option<T> + Send + Sync + 'static,
    {
        let getter = typed_getter(self.ty.clone(), get);
        self.with_state(time, getter)
    }

    pub fn has_state(&self, time: Time) -> bool {
        self.getters[slot(time)].is_some()
    }
}

fn typed_getter<E, T, F>(ty: TypeKey, get: F) -> EventGetter
where
    E: Any,
    T: Any + Send + Sync + fmt::Debug,
    F: Fn(&E) -> Option<T> + Send + Sync + 'static,
{
    Arc::new(move |ctx: &ExecutionContext| {
        ctx.event::<E>()
            .and_then(|e| get(e))
            .map(|out| Value::new(ty.clone(), out))
    })
}

impl Expression for EventValueExpression {
    fn return_type(&self) -> TypeKey {
        self.ty.clone()
    }

    fn is_single(&self) -> bool {
        true
    }

    fn array(&self, ctx: &ExecutionContext) -> Vec<Value> {
        self.single(ctx).into_iter().collect()
    }

    fn single(&self, ctx: &ExecutionContext) -> Option<Value> {
        if ctx.is_revoked() {
            return None;
        }
        self.getters[slot(self.time.get())].as_ref().and_then(|get| get(ctx))
    }

    fn set_time(&self, time: Time) -> Result<()> {
        if !self.has_state(time) {
            return Err(QuillError::TemporalBindingRejected {
                node: self.describe(None, false),
                requested: time,
            });
        }
        self.time.set(time);
        Ok(())
    }

    fn time(&self) -> Time {
        self.time.get()
    }

    fn is_default(&self) -> bool {
        true
    }

    fn describe(&self, ctx: Option<&ExecutionContext>, debug: bool) -> String {
        let label = match self.time.get() {
            Time::Past => format!("past {}", self.name),
            Time::Default => self.name.clone(),
            Time::Future => format!("future {}", self.name),
        };
        match ctx {
            Some(ctx) if debug => {
                let value = self.single(ctx).map(|v| v.render()).unwrap_or_else(|| "<none>".to_string());
                format!("{} ({})", label, value)
            }
            _ => label,
        }
    }
}
