//! Storage effect handlers
//!
//! Implementations of `StorageEffects` from actor-core: an in-memory map for
//! tests and single-process embedding, and a filesystem store for native
//! hosts.

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemStorageHandler;
pub use memory::MemoryStorageHandler;
