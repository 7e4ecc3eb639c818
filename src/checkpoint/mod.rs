//! Checkpoint persistence
//!
//! A checkpoint captures the root run context and the interrupt that
//! suspended it, encoded with the [`GenericSerializer`](crate::serialization::GenericSerializer)
//! and kept in a [`CheckPointStore`].

pub mod file;
pub mod memory;
pub mod store;

pub use file::FileCheckPointStore;
pub use memory::InMemoryCheckPointStore;
pub use store::{CheckPointStore, Checkpoint};
