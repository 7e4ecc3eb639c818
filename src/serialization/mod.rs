//! Checkpoint payload serialization
//!
//! A registry-driven JSON codec able to persist values whose concrete
//! type is only known at runtime.

mod dynamic;
mod error;
mod keyed_map;
mod registry;
mod serializer;

pub use dynamic::{DynValue, Dynamic};
pub use error::{SerializationError, SerializationResult};
pub use keyed_map::KeyedMap;
pub use registry::TypeRegistry;
pub use serializer::GenericSerializer;
