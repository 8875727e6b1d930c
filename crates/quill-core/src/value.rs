//! Values and type keys
//!
//! A [`Value`] is a type-erased, reference-counted payload tagged with the
//! [`TypeKey`] of the registered type it belongs to. There is no null value:
//! absence is always an empty `Vec<Value>` or `None`.
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

static OBJECT: Lazy<TypeKey> = Lazy::new(|| TypeKey::new(TypeKey::OBJECT_NAME));

/// Code name of a registered type (ex: "integer", "text")
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    pub const OBJECT_NAME: &'static str = "object";

    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// The universal type every value satisfies.
    pub fn object() -> Self {
        OBJECT.clone()
    }

    pub fn is_object(&self) -> bool {
        &*self.0 == Self::OBJECT_NAME
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        TypeKey::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        TypeKey::new(name)
    }
}

impl From<&TypeKey> for TypeKey {
    fn from(key: &TypeKey) -> Self {
        key.clone()
    }
}

/// The Rust type backing a registered type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeShape {
    pub id: TypeId,
    pub name: &'static str,
}

impl NativeShape {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }
}

trait Payload: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + Send + Sync + fmt::Debug> Payload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A present value of some registered type.
#[derive(Clone)]
pub struct Value {
    ty: TypeKey,
    data: Arc<dyn Payload>,
}

impl Value {
    pub fn new<T>(ty: impl Into<TypeKey>, data: T) -> Self
    where
        T: Any + Send + Sync + fmt::Debug,
    {
        Self {
            ty: ty.into(),
            data: Arc::new(data),
        }
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.ty
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // `Arc<dyn Payload>` is itself a `Payload`; deref to reach the vtable
        (*self.data).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.data).as_any().is::<T>()
    }

    /// `TypeId` of the payload, compared against a descriptor's [`NativeShape`].
    pub fn native_type_id(&self) -> TypeId {
        Any::type_id((*self.data).as_any())
    }

    /// Both values share the same payload allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn render(&self) -> String {
        format!("{:?}", self.data)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{:?}", self.ty, self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert!(TypeKey::object().is_object());
        assert!(!TypeKey::new("integer").is_object());
        assert_eq!(TypeKey::object(), TypeKey::from("object"));
    }

    #[test]
    fn test_value_downcast() {
        let v = Value::new("integer", 42i64);
        assert_eq!(v.type_key().as_str(), "integer");
        assert_eq!(v.downcast_ref::<i64>(), Some(&42));
        assert!(v.downcast_ref::<String>().is_none());
        assert_eq!(v.native_type_id(), NativeShape::of::<i64>().id);
    }

    #[test]
    fn test_clone_shares_payload() {
        let v = Value::new("text", "hello".to_string());
        let w = v.clone();
        assert!(v.ptr_eq(&w));
        assert_eq!(w.render(), "\"hello\"");
        assert_eq!(format!("{:?}", w), "text:\"hello\"");
    }

    #[test]
    fn test_type_key_serializes_as_string() {
        let json = serde_json::to_string(&TypeKey::new("number")).unwrap();
        assert_eq!(json, "\"number\"");
        let back: TypeKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TypeKey::new("number"));
    }
}
