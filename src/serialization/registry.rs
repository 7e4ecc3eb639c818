//! Type registry
//!
//! Maps stable names to concrete Rust types so values held behind a
//! [`Dynamic`] survive a round trip. Registering `T` under `name` also
//! registers `Box<T>` as `*name` and `Box<Box<T>>` as `**name`, keeping
//! the indirection depth of the original value.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dynamic::{DynValue, Dynamic};
use super::error::{SerializationError, SerializationResult};
use crate::core::{AgentInput, Message};

type EncodeFn = Arc<dyn Fn(&dyn Any) -> SerializationResult<Value> + Send + Sync>;
type DecodeFn = Arc<dyn Fn(Value) -> SerializationResult<Dynamic> + Send + Sync>;

/// Wire form of every encoded value: a type tag plus the JSON body
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default)]
    pub value: Value,
}

impl Envelope {
    pub fn nil() -> Self {
        Self {
            type_name: None,
            value: Value::Null,
        }
    }
}

/// Encode/decode strategy for one registered type
pub(crate) struct TypeEntry {
    pub name: String,
    pub rust_name: &'static str,
    pub builtin: bool,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl TypeEntry {
    pub fn encode(&self, value: &dyn Any) -> SerializationResult<Value> {
        (self.encode)(value)
    }

    pub fn decode(&self, value: Value) -> SerializationResult<Dynamic> {
        (self.decode)(value)
    }

    /// Name with pointer markers removed
    pub fn base_name(&self) -> &str {
        self.name.trim_start_matches('*')
    }
}

impl fmt::Debug for TypeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeEntry")
            .field("name", &self.name)
            .field("rust_name", &self.rust_name)
            .field("builtin", &self.builtin)
            .finish()
    }
}

/// Whitelist of types that may appear behind a [`Dynamic`]
#[derive(Debug)]
pub struct TypeRegistry {
    by_name: HashMap<String, Arc<TypeEntry>>,
    by_type: HashMap<TypeId, Arc<TypeEntry>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the builtin types
    pub fn new() -> Self {
        let mut registry = Self {
            by_name: HashMap::new(),
            by_type: HashMap::new(),
        };
        registry.register_builtins();
        registry
    }

    fn register_builtins(&mut self) {
        self.builtin::<bool>("bool");
        self.builtin::<i8>("i8");
        self.builtin::<i16>("i16");
        self.builtin::<i32>("i32");
        self.builtin::<i64>("i64");
        self.builtin::<isize>("isize");
        self.builtin::<u8>("u8");
        self.builtin::<u16>("u16");
        self.builtin::<u32>("u32");
        self.builtin::<u64>("u64");
        self.builtin::<usize>("usize");
        self.builtin::<f32>("f32");
        self.builtin::<f64>("f64");
        self.builtin::<String>("string");
        self.builtin::<Value>("json");
        self.builtin::<Vec<Dynamic>>("vec<any>");
        self.builtin::<Vec<String>>("vec<string>");
        self.builtin::<Vec<i64>>("vec<i64>");
        self.builtin::<HashMap<String, Dynamic>>("map<string,any>");
        self.builtin::<HashMap<String, String>>("map<string,string>");
        self.builtin::<Message>("message");
        self.builtin::<Vec<Message>>("vec<message>");
        self.builtin::<AgentInput>("agent_input");
    }

    fn builtin<T>(&mut self, name: &str)
    where
        T: DynValue + Serialize + DeserializeOwned,
    {
        let entry = serde_entry::<T>(name.to_string(), true);
        self.by_type.insert(TypeId::of::<T>(), entry.clone());
        self.by_name.insert(name.to_string(), entry);
    }

    /// Register `T` under `name`, using its serde representation
    pub fn register<T>(&mut self, name: impl Into<String>) -> SerializationResult<()>
    where
        T: DynValue + Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned,
    {
        let name = name.into();
        self.insert_levels::<T>(
            &name,
            Arc::new(serde_encode::<T>),
            Arc::new(serde_decode::<T>),
        )
    }

    /// Register `T` under `name` with a custom encode/decode pair
    ///
    /// The hooks take precedence over the serde representation wherever
    /// the registry is consulted: top-level values and dynamic slots.
    pub fn register_with<T, E, D>(
        &mut self,
        name: impl Into<String>,
        encode: E,
        decode: D,
    ) -> SerializationResult<()>
    where
        T: DynValue + Clone + PartialEq + fmt::Debug,
        E: Fn(&T) -> SerializationResult<Value> + Send + Sync + 'static,
        D: Fn(Value) -> SerializationResult<T> + Send + Sync + 'static,
    {
        let name = name.into();
        self.insert_levels::<T>(&name, Arc::new(encode), Arc::new(decode))
    }

    fn insert_levels<T: DynValue + Clone + PartialEq + fmt::Debug>(
        &mut self,
        name: &str,
        encode: Arc<dyn Fn(&T) -> SerializationResult<Value> + Send + Sync>,
        decode: Arc<dyn Fn(Value) -> SerializationResult<T> + Send + Sync>,
    ) -> SerializationResult<()> {
        let boxed_encode = encode.clone();
        let boxed_decode = decode.clone();
        let boxed_boxed_encode = encode.clone();
        let boxed_boxed_decode = decode.clone();

        let entries = vec![
            (
                TypeId::of::<T>(),
                strategy::<T>(name.to_string(), false, encode, decode),
            ),
            (
                TypeId::of::<Box<T>>(),
                strategy::<Box<T>>(
                    format!("*{}", name),
                    false,
                    Arc::new(move |value: &Box<T>| boxed_encode(&**value)),
                    Arc::new(move |value: Value| boxed_decode(value).map(Box::new)),
                ),
            ),
            (
                TypeId::of::<Box<Box<T>>>(),
                strategy::<Box<Box<T>>>(
                    format!("**{}", name),
                    false,
                    Arc::new(move |value: &Box<Box<T>>| boxed_boxed_encode(&***value)),
                    Arc::new(move |value: Value| {
                        boxed_boxed_decode(value).map(|v| Box::new(Box::new(v)))
                    }),
                ),
            ),
        ];

        for (type_id, entry) in &entries {
            self.check_free(*type_id, entry)?;
        }
        for (type_id, entry) in entries {
            self.by_name.insert(entry.name.clone(), entry.clone());
            self.by_type.insert(type_id, entry);
        }

        tracing::debug!(name = %name, rust_type = std::any::type_name::<T>(), "Registered type");
        Ok(())
    }

    /// Re-registering a type under its own name is allowed
    fn check_free(&self, type_id: TypeId, entry: &TypeEntry) -> SerializationResult<()> {
        if let Some(existing) = self.by_name.get(&entry.name) {
            if self.by_type.get(&type_id).map(|e| e.name.as_str()) != Some(entry.name.as_str()) {
                return Err(SerializationError::NameConflict {
                    name: entry.name.clone(),
                    existing: existing.rust_name,
                });
            }
        }
        if let Some(existing) = self.by_type.get(&type_id) {
            if existing.name != entry.name {
                return Err(SerializationError::TypeConflict {
                    rust_name: entry.rust_name,
                    existing: existing.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Registered name of `T`
    pub fn name_of<T: Any>(&self) -> Option<&str> {
        self.by_type.get(&TypeId::of::<T>()).map(|e| e.name.as_str())
    }

    /// Check whether `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub(crate) fn entry_for(&self, type_id: TypeId) -> Option<&Arc<TypeEntry>> {
        self.by_type.get(&type_id)
    }

    pub(crate) fn entry_named(&self, name: &str) -> Option<&Arc<TypeEntry>> {
        self.by_name.get(name)
    }

    pub(crate) fn encode_dynamic(&self, value: &Dynamic) -> SerializationResult<Envelope> {
        let Some(inner) = value.as_dyn() else {
            return Ok(Envelope::nil());
        };
        let entry = self
            .entry_for(inner.as_any().type_id())
            .ok_or(SerializationError::NotRegistered(inner.type_name()))?;
        Ok(Envelope {
            type_name: Some(entry.name.clone()),
            value: entry.encode(inner.as_any())?,
        })
    }

    pub(crate) fn decode_dynamic(&self, envelope: Envelope) -> SerializationResult<Dynamic> {
        match envelope.type_name {
            Some(name) => {
                let entry = self
                    .entry_named(&name)
                    .ok_or(SerializationError::UnknownTypeName(name))?;
                entry.decode(envelope.value)
            }
            None if envelope.value.is_null() => Ok(Dynamic::nil()),
            None => Err(SerializationError::MissingTypeTag),
        }
    }
}

fn serde_entry<T>(name: String, builtin: bool) -> Arc<TypeEntry>
where
    T: DynValue + Serialize + DeserializeOwned,
{
    strategy::<T>(
        name,
        builtin,
        Arc::new(serde_encode::<T>),
        Arc::new(serde_decode::<T>),
    )
}

fn serde_encode<T: Serialize>(value: &T) -> SerializationResult<Value> {
    Ok(serde_json::to_value(value)?)
}

fn serde_decode<T: DeserializeOwned>(value: Value) -> SerializationResult<T> {
    Ok(serde_json::from_value(value)?)
}

fn strategy<T: DynValue>(
    name: String,
    builtin: bool,
    encode: Arc<dyn Fn(&T) -> SerializationResult<Value> + Send + Sync>,
    decode: Arc<dyn Fn(Value) -> SerializationResult<T> + Send + Sync>,
) -> Arc<TypeEntry> {
    let rust_name = std::any::type_name::<T>();
    Arc::new(TypeEntry {
        name,
        rust_name,
        builtin,
        encode: Arc::new(move |value: &dyn Any| {
            let value = value
                .downcast_ref::<T>()
                .ok_or(SerializationError::NotRegistered(rust_name))?;
            encode(value)
        }),
        decode: Arc::new(move |value: Value| decode(value).map(Dynamic::new)),
    })
}

thread_local! {
    static ACTIVE: RefCell<Vec<Arc<TypeRegistry>>> = RefCell::new(Vec::new());
}

/// Keeps a registry active on this thread until dropped
pub(crate) struct ActiveScope {
    _private: (),
}

impl ActiveScope {
    pub fn enter(registry: Arc<TypeRegistry>) -> Self {
        ACTIVE.with(|stack| stack.borrow_mut().push(registry));
        Self { _private: () }
    }
}

impl Drop for ActiveScope {
    fn drop(&mut self) {
        ACTIVE.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Run `f` against the innermost active registry
pub(crate) fn with_active<R>(
    f: impl FnOnce(&TypeRegistry) -> SerializationResult<R>,
) -> SerializationResult<R> {
    let registry = ACTIVE
        .with(|stack| stack.borrow().last().cloned())
        .ok_or(SerializationError::NoActiveRegistry)?;
    f(&registry)
}
