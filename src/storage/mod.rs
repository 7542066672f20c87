//! Storage implementations of the collaborator contracts

pub mod in_memory;

pub use in_memory::{InMemoryCredentialStore, InMemoryStore, StoreHandler};
