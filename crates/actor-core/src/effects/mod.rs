//! Effect traits: the ports through which the manager reaches the outside world
//!
//! Each trait is an infrastructure effect. Handlers live in `actor-effects`;
//! the orchestration layer only ever sees `Arc<dyn ...Effects>`.

pub mod access;
pub mod broadcast;
pub mod confirmation;
pub mod storage;

pub use access::StorageAccessEffects;
pub use broadcast::{BroadcastEffects, BroadcastStream};
pub use confirmation::ConfirmationEffects;
pub use storage::{StorageEffects, StorageError, StoredEntry, TtlClass, TtlPolicy};
