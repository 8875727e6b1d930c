//! Type descriptors
use crate::changer::Changer;
use quill_core::{NativeShape, TypeKey, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Supplies the value a type defaults to when a pattern omits it.
pub type DefaultSupplier = Arc<dyn Fn() -> Option<Value> + Send + Sync>;

/// A registered semantic type
#[derive(Clone)]
pub struct TypeDescriptor {
    key: TypeKey,
    /// `None` only for the universal `object` type
    native: Option<NativeShape>,
    plural: String,
    user_name: Option<String>,
    supertypes: Vec<TypeKey>,
    before: Vec<TypeKey>,
    after: Vec<TypeKey>,
    default: Option<DefaultSupplier>,
    changer: Option<Arc<dyn Changer>>,
}

impl TypeDescriptor {
    /// Describe a type whose values carry a `T` payload.
    pub fn new<T: Any>(key: impl Into<TypeKey>) -> Self {
        let key = key.into();
        Self {
            plural: format!("{}s", key),
            key,
            native: Some(NativeShape::of::<T>()),
            user_name: None,
            supertypes: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            default: None,
            changer: None,
        }
    }

    /// The universal type; every value is assignable to it.
    pub fn object() -> Self {
        Self {
            key: TypeKey::object(),
            native: None,
            plural: "objects".to_string(),
            user_name: None,
            supertypes: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
            default: None,
            changer: None,
        }
    }

    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self
    }

    /// Human-readable name used in diagnostics and placeholder lookup.
    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = Some(name.into());
        self
    }

    /// Declare a supertype. A subtype shares its supertype's native shape.
    pub fn with_supertype(mut self, key: impl Into<TypeKey>) -> Self {
        self.supertypes.push(key.into());
        self
    }

    /// Sort this type before `key` when listing descriptors.
    pub fn before(mut self, key: impl Into<TypeKey>) -> Self {
        self.before.push(key.into());
        self
    }

    /// Sort this type after `key` when listing descriptors.
    pub fn after(mut self, key: impl Into<TypeKey>) -> Self {
        self.after.push(key.into());
        self
    }

    pub fn with_default(mut self, supplier: impl Fn() -> Option<Value> + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(supplier));
        self
    }

    pub fn with_changer(mut self, changer: impl Changer + 'static) -> Self {
        self.changer = Some(Arc::new(changer));
        self
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn native(&self) -> Option<NativeShape> {
        self.native
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn user_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or(self.key.as_str())
    }

    pub fn supertypes(&self) -> &[TypeKey] {
        &self.supertypes
    }

    pub fn sorts_before(&self) -> &[TypeKey] {
        &self.before
    }

    pub fn sorts_after(&self) -> &[TypeKey] {
        &self.after
    }

    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().and_then(|supplier| supplier())
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn changer(&self) -> Option<&Arc<dyn Changer>> {
        self.changer.as_ref()
    }

    /// Whether `name` refers to this type in a pattern placeholder.
    pub fn answers_to(&self, name: &str) -> bool {
        name == self.key.as_str()
            || name == self.plural
            || self
                .user_name
                .as_deref()
                .map(|u| u.eq_ignore_ascii_case(name))
                .unwrap_or(false)
    }

    /// Whether a value's payload has this descriptor's native shape.
    pub fn accepts_payload(&self, value: &Value) -> bool {
        match self.native {
            Some(shape) => value.native_type_id() == shape.id,
            None => true,
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("key", &self.key)
            .field("native", &self.native.map(|n| n.name))
            .field("plural", &self.plural)
            .field("supertypes", &self.supertypes)
            .field("has_default", &self.default.is_some())
            .field("has_changer", &self.changer.is_some())
            .finish()
    }
}
