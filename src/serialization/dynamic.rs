//! Type-erased values
//!
//! `Dynamic` plays the role of an interface-typed slot: it may hold any
//! cloneable, comparable value, or nothing at all. Encoding a `Dynamic`
//! requires the concrete type to be registered in the active
//! [`TypeRegistry`](super::TypeRegistry); the encoded form carries the
//! registered name so decoding can rebuild the exact concrete type.

use std::any::{Any, TypeId};
use std::fmt;

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::registry::{self, Envelope};

/// Object-safe view of a value that can live inside a [`Dynamic`]
pub trait DynValue: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
    fn clone_boxed(&self) -> Box<dyn DynValue>;
    fn eq_dyn(&self, other: &dyn DynValue) -> bool;
    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn type_name(&self) -> &'static str;
}

impl<T> DynValue for T
where
    T: Any + Clone + PartialEq + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn DynValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn fmt_dyn(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// A value of any registered type, or nil
#[derive(Default)]
pub struct Dynamic(Option<Box<dyn DynValue>>);

impl Dynamic {
    /// Wrap a concrete value
    pub fn new<T: DynValue>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// The empty value
    pub fn nil() -> Self {
        Self(None)
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_none()
    }

    /// Check whether the held value is a `T`
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// Borrow the held value as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref()?.as_any().downcast_ref::<T>()
    }

    /// Take the held value as `T`, handing `self` back on mismatch
    pub fn take<T: Any>(self) -> Result<T, Self> {
        match self.0 {
            Some(inner) if inner.as_any().is::<T>() => match inner.into_any().downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(Self::nil()),
            },
            other => Err(Self(other)),
        }
    }

    /// `TypeId` of the held value
    pub fn value_type_id(&self) -> Option<TypeId> {
        self.0.as_ref().map(|v| v.as_any().type_id())
    }

    /// Rust type name of the held value, `"nil"` when empty
    pub fn type_name(&self) -> &'static str {
        self.0.as_ref().map_or("nil", |v| v.type_name())
    }

    pub(crate) fn as_dyn(&self) -> Option<&dyn DynValue> {
        self.0.as_deref()
    }
}

impl Clone for Dynamic {
    fn clone(&self) -> Self {
        Self(self.0.as_ref().map(|v| v.clone_boxed()))
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(a), Some(b)) => a.eq_dyn(b.as_ref()),
            _ => false,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => {
                write!(f, "Dynamic(")?;
                value.fmt_dyn(f)?;
                write!(f, ")")
            }
            None => write!(f, "Dynamic(nil)"),
        }
    }
}

impl Serialize for Dynamic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let envelope = registry::with_active(|registry| registry.encode_dynamic(self))
            .map_err(S::Error::custom)?;
        envelope.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Dynamic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let envelope = Envelope::deserialize(deserializer)?;
        registry::with_active(|registry| registry.decode_dynamic(envelope))
            .map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ticket {
        id: u32,
    }

    #[test]
    fn test_downcast_and_take() {
        let value = Dynamic::new(Ticket { id: 7 });
        assert!(value.is::<Ticket>());
        assert!(!value.is::<String>());
        assert_eq!(value.downcast_ref::<Ticket>().unwrap().id, 7);

        let value = value.take::<String>().unwrap_err();
        assert_eq!(value.take::<Ticket>().unwrap(), Ticket { id: 7 });
    }

    #[test]
    fn test_equality_and_nil() {
        assert_eq!(Dynamic::nil(), Dynamic::default());
        assert_eq!(Dynamic::new(1i64), Dynamic::new(1i64));
        assert_ne!(Dynamic::new(1i64), Dynamic::new(1i32));
        assert_ne!(Dynamic::new(1i64), Dynamic::nil());
        assert_eq!(Dynamic::nil().type_name(), "nil");
        assert!(Dynamic::new(String::from("x")).type_name().ends_with("String"));
    }

    #[test]
    fn test_clone_is_deep() {
        let original = Dynamic::new(vec![Ticket { id: 1 }]);
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_eq!(format!("{:?}", copy), "Dynamic([Ticket { id: 1 }])");
    }
}
