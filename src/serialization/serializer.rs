//! Registry-backed value codec
//!
//! Every payload is written as an envelope `{"type": <name>, "value": ..}`.
//! The tag is present when the value's type is registered, which is what
//! lets a [`Dynamic`] destination rebuild the concrete type. Static
//! destinations decode structurally and only use the tag to reject
//! values of a different registered type.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::dynamic::Dynamic;
use super::error::{SerializationError, SerializationResult};
use super::registry::{ActiveScope, Envelope, TypeEntry, TypeRegistry};

/// Encodes and decodes values against a [`TypeRegistry`]
#[derive(Debug, Clone, Default)]
pub struct GenericSerializer {
    registry: Arc<TypeRegistry>,
}

impl GenericSerializer {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Encode `value` into bytes
    pub fn marshal<T: Serialize + 'static>(&self, value: &T) -> SerializationResult<Vec<u8>> {
        let _scope = ActiveScope::enter(self.registry.clone());
        let envelope = self.encode(value)?;
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn encode<T: Serialize + 'static>(&self, value: &T) -> SerializationResult<Envelope> {
        let any = value as &dyn Any;
        if let Some(dynamic) = any.downcast_ref::<Dynamic>() {
            return self.registry.encode_dynamic(dynamic);
        }

        match self.registry.entry_for(TypeId::of::<T>()) {
            Some(entry) => Ok(Envelope {
                type_name: Some(entry.name.clone()),
                value: entry.encode(any)?,
            }),
            None => Ok(Envelope {
                type_name: None,
                value: serde_json::to_value(value)?,
            }),
        }
    }

    /// Decode bytes into a new `T`
    ///
    /// Decoding into [`Dynamic`] rebuilds whatever registered type the
    /// payload was tagged with.
    pub fn unmarshal<T: DeserializeOwned + 'static>(&self, data: &[u8]) -> SerializationResult<T> {
        let _scope = ActiveScope::enter(self.registry.clone());
        let envelope: Envelope = serde_json::from_slice(data)?;

        if TypeId::of::<T>() == TypeId::of::<Dynamic>() {
            let dynamic: Box<dyn Any> = Box::new(self.registry.decode_dynamic(envelope)?);
            return dynamic
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| SerializationError::NotRegistered(type_name::<T>()));
        }

        let from = tag_of(&envelope);
        let to = type_name::<T>();
        let cannot_assign = |reason: String| SerializationError::CannotAssign {
            from: from.clone(),
            to,
            reason,
        };

        let target = self.registry.entry_for(TypeId::of::<T>()).cloned();
        match target.filter(|t| !t.builtin) {
            Some(target) => {
                self.check_assignable(&envelope, &target, to)?;
                target
                    .decode(envelope.value)
                    .map_err(|e| cannot_assign(e.to_string()))?
                    .take::<T>()
                    .map_err(|other| cannot_assign(format!("decoded a `{}`", other.type_name())))
            }
            None => serde_json::from_value(envelope.value).map_err(|e| cannot_assign(e.to_string())),
        }
    }

    /// Decode bytes into an existing `T`
    pub fn unmarshal_into<T: DeserializeOwned + 'static>(
        &self,
        data: &[u8],
        dest: &mut T,
    ) -> SerializationResult<()> {
        *dest = self.unmarshal(data)?;
        Ok(())
    }

    /// Decode bytes into the type currently held by `slot`
    ///
    /// The slot acts as the destination pointer: it must hold a value of
    /// a registered type, which is then replaced.
    pub fn unmarshal_into_dynamic(&self, data: &[u8], slot: &mut Dynamic) -> SerializationResult<()> {
        let type_id = slot.value_type_id().ok_or_else(|| {
            SerializationError::NilDestination("destination holds no value".to_string())
        })?;
        let target = self.registry.entry_for(type_id).cloned().ok_or_else(|| {
            SerializationError::NilDestination(format!(
                "destination type `{}` is not registered",
                slot.type_name()
            ))
        })?;

        let _scope = ActiveScope::enter(self.registry.clone());
        let envelope: Envelope = serde_json::from_slice(data)?;
        let to = slot.type_name();
        self.check_assignable(&envelope, &target, to)?;

        let from = tag_of(&envelope);
        *slot = target
            .decode(envelope.value)
            .map_err(|e| SerializationError::CannotAssign {
                from,
                to,
                reason: e.to_string(),
            })?;
        Ok(())
    }

    /// Two registered user types only match when they share a base name
    fn check_assignable(
        &self,
        envelope: &Envelope,
        target: &TypeEntry,
        to: &'static str,
    ) -> SerializationResult<()> {
        let Some(source) = envelope
            .type_name
            .as_deref()
            .and_then(|tag| self.registry.entry_named(tag))
        else {
            return Ok(());
        };

        if !source.builtin && !target.builtin && source.base_name() != target.base_name() {
            return Err(SerializationError::CannotAssign {
                from: source.name.clone(),
                to,
                reason: format!("destination is registered as `{}`", target.name),
            });
        }
        Ok(())
    }
}

fn tag_of(envelope: &Envelope) -> String {
    envelope
        .type_name
        .clone()
        .unwrap_or_else(|| "untyped".to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fmt::Debug;

    use serde::{Deserialize, Serialize};
    use serde_json::Value;

    use super::*;
    use crate::serialization::KeyedMap;

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct Ticket {
        a: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Plain {
        field_a: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Composite {
        a: Dynamic,
        b: Dynamic,
        c: HashMap<String, Box<Box<Ticket>>>,
        d: KeyedMap<Ticket, Dynamic>,
        e: Vec<Dynamic>,
        g: Plain,
        h: Option<Box<Plain>>,
        i: Vec<Box<Plain>>,
        j: HashMap<String, Plain>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Unregistered {
        n: i32,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Celsius(f64);

    fn ticket(a: &str) -> Ticket {
        Ticket { a: a.to_string() }
    }

    fn serializer() -> GenericSerializer {
        let mut registry = TypeRegistry::new();
        registry.register::<Ticket>("ticket").unwrap();
        registry.register::<Composite>("composite").unwrap();
        registry.register::<Plain>("plain").unwrap();
        registry
            .register::<KeyedMap<Ticket, Dynamic>>("map<ticket,any>")
            .unwrap();
        registry
            .register_with::<Celsius, _, _>(
                "celsius",
                |c: &Celsius| Ok(Value::String(format!("{}C", c.0))),
                |v: Value| {
                    let text = v.as_str().ok_or_else(|| SerializationError::custom("expected text"))?;
                    text.trim_end_matches('C')
                        .parse()
                        .map(Celsius)
                        .map_err(|_| SerializationError::custom("bad temperature"))
                },
            )
            .unwrap();
        GenericSerializer::new(registry)
    }

    fn round_trip<T>(s: &GenericSerializer, value: T)
    where
        T: Serialize + serde::de::DeserializeOwned + PartialEq + Debug + 'static,
    {
        let data = s.marshal(&value).unwrap();
        let back: T = s.unmarshal(&data).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_round_trip_shapes() {
        let s = serializer();
        let nested = Box::new(Box::new(ticket("test")));

        round_trip(&s, 10i64);
        round_trip(&s, "test".to_string());
        round_trip(&s, ticket("test"));
        round_trip(&s, Box::new(ticket("test")));
        round_trip(&s, nested.clone());
        round_trip(&s, Dynamic::new(Box::new(ticket("test"))));
        round_trip(&s, vec![1, 2, 3]);
        round_trip(&s, vec![Dynamic::new(1i64), Dynamic::new("test".to_string())]);
        round_trip(
            &s,
            vec![Dynamic::nil(), Dynamic::new(Box::new(ticket("1"))), Dynamic::new(Box::new(ticket("2")))],
        );
        round_trip(
            &s,
            HashMap::from([("123".to_string(), "123".to_string()), ("abc".to_string(), "abc".to_string())]),
        );
        round_trip(
            &s,
            HashMap::from([
                ("123".to_string(), Dynamic::new(1i64)),
                ("abc".to_string(), Dynamic::new(Box::new(ticket("1")))),
                ("bcd".to_string(), Dynamic::nil()),
            ]),
        );
        round_trip(&s, Vec::<Box<Ticket>>::new());
        round_trip(&s, Box::new(ticket("")));
        round_trip(
            &s,
            HashMap::from([(
                "1".to_string(),
                HashMap::from([("a".to_string(), vec![HashMap::from([("b".to_string(), vec![vec!["c".to_string()], vec!["d".to_string()]])])])]),
            )]),
        );
    }

    #[test]
    fn test_round_trip_struct_keyed_and_composite() {
        let s = serializer();
        let nested = Box::new(Box::new(ticket("test")));

        let inner: KeyedMap<Ticket, Dynamic> = [
            (ticket("1"), Dynamic::new(1i64)),
            (ticket("2"), Dynamic::nil()),
        ]
        .into_iter()
        .collect();
        let keyed: KeyedMap<Ticket, Dynamic> = [
            (ticket("1"), Dynamic::new(1i64)),
            (ticket("2"), Dynamic::new(Box::new(ticket("2")))),
            (ticket("3"), Dynamic::nil()),
            (
                ticket("4"),
                Dynamic::new(vec![
                    Dynamic::new(1i64),
                    Dynamic::new(nested.clone()),
                    Dynamic::new("123".to_string()),
                    Dynamic::nil(),
                    Dynamic::new(inner),
                ]),
            ),
        ]
        .into_iter()
        .collect();
        round_trip(&s, keyed.clone());

        let composite = Composite {
            a: Dynamic::new("123".to_string()),
            b: Dynamic::new(Box::new(ticket("test"))),
            c: HashMap::from([("a".to_string(), nested)]),
            d: [(ticket("a"), Dynamic::new(1i64))].into_iter().collect(),
            e: vec![Dynamic::new(1i64), Dynamic::new("2".to_string()), Dynamic::new(3i64)],
            g: Plain { field_a: "1".into() },
            h: None,
            i: vec![Box::new(Plain { field_a: "2".into() })],
            j: HashMap::from([("1".to_string(), Plain { field_a: "4".into() })]),
        };
        round_trip(&s, composite.clone());
        round_trip(&s, Dynamic::new(composite));
        round_trip(&s, Dynamic::new(keyed));
    }

    #[test]
    fn test_custom_hooks_take_precedence() {
        let s = serializer();
        let data = s.marshal(&Celsius(21.5)).unwrap();
        assert!(String::from_utf8_lossy(&data).contains("21.5C"));
        assert_eq!(s.unmarshal::<Celsius>(&data).unwrap(), Celsius(21.5));

        let map = HashMap::from([("t".to_string(), Dynamic::new(Celsius(3.0)))]);
        round_trip(&s, map);
    }

    #[test]
    fn test_pointer_and_value_interchange() {
        let s = serializer();

        let data = s.marshal(&Box::new(ticket("p2v"))).unwrap();
        assert_eq!(s.unmarshal::<Ticket>(&data).unwrap(), ticket("p2v"));

        let data = s.marshal(&ticket("v2p")).unwrap();
        assert_eq!(s.unmarshal::<Box<Ticket>>(&data).unwrap(), Box::new(ticket("v2p")));

        let data = s.marshal(&Option::<Box<Ticket>>::None).unwrap();
        assert_eq!(s.unmarshal::<Option<Box<Ticket>>>(&data).unwrap(), None);

        let data = s.marshal(&12345i64).unwrap();
        assert_eq!(s.unmarshal::<Box<i64>>(&data).unwrap(), Box::new(12345));
    }

    #[test]
    fn test_convertible_scalars() {
        let s = serializer();
        let data = s.marshal(&42i32).unwrap();
        assert_eq!(s.unmarshal::<i64>(&data).unwrap(), 42i64);

        let mut dest = 0i64;
        s.unmarshal_into(&data, &mut dest).unwrap();
        assert_eq!(dest, 42);
    }

    #[test]
    fn test_unmarshal_to_dynamic() {
        let s = serializer();
        let data = s.marshal(&ticket("any")).unwrap();
        let value: Dynamic = s.unmarshal(&data).unwrap();
        assert_eq!(value.downcast_ref::<Ticket>(), Some(&ticket("any")));

        let mut slot = Dynamic::new(Box::new(ticket("")));
        s.unmarshal_into_dynamic(&data, &mut slot).unwrap();
        assert_eq!(slot.downcast_ref::<Box<Ticket>>(), Some(&Box::new(ticket("any"))));
    }

    #[test]
    fn test_non_nil_destination_required() {
        let s = serializer();
        let data = s.marshal(&123i64).unwrap();

        let mut nil = Dynamic::nil();
        let err = s.unmarshal_into_dynamic(&data, &mut nil).unwrap_err();
        assert!(err.to_string().contains("value must be a non-nil pointer"));

        let mut unregistered = Dynamic::new(Unregistered { n: 1 });
        let err = s.unmarshal_into_dynamic(&data, &mut unregistered).unwrap_err();
        assert!(err.to_string().contains("value must be a non-nil pointer"));
    }

    #[test]
    fn test_cannot_assign() {
        let s = serializer();

        let data = s.marshal(&"i am a string".to_string()).unwrap();
        let err = s.unmarshal::<i64>(&data).unwrap_err();
        assert!(err.to_string().contains("cannot assign"));

        let data = s.marshal(&123i64).unwrap();
        let err = s.unmarshal::<bool>(&data).unwrap_err();
        assert!(err.to_string().contains("cannot assign"));

        let data = s.marshal(&ticket("x")).unwrap();
        let err = s.unmarshal::<Plain>(&data).unwrap_err();
        assert!(err.to_string().contains("cannot assign"));
    }

    #[test]
    fn test_unregistered_dynamic_fails() {
        let s = serializer();
        let err = s.marshal(&Dynamic::new(Unregistered { n: 1 })).unwrap_err();
        assert!(err.to_string().contains("not registered"));

        let err = s
            .marshal(&vec![Dynamic::new(1i64), Dynamic::new(Unregistered { n: 2 })])
            .unwrap_err();
        assert!(err.to_string().contains("not registered"));

        assert!(s.marshal(&Unregistered { n: 3 }).is_ok());
    }
}
