//! # Actor Effects
//!
//! Handlers for the effect traits declared in `actor-core`:
//!
//! - Storage: [`MemoryStorageHandler`], [`FilesystemStorageHandler`]
//! - Broadcast: [`LocalBroadcastHub`]
//! - Confirmation: [`StaticConfirmationHandler`]
//! - Storage access: [`AmbientStorageAccess`], [`GatedStorageAccess`]
//!
//! Handlers are stateless apart from what they model (a shared store, a
//! shared channel, a gate); cloning one shares that state.

pub mod access;
pub mod broadcast;
pub mod confirmation;
pub mod storage;

pub use access::{AmbientStorageAccess, GatedStorageAccess};
pub use broadcast::LocalBroadcastHub;
pub use confirmation::StaticConfirmationHandler;
pub use storage::{FilesystemStorageHandler, MemoryStorageHandler};
