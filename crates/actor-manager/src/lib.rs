//! # Actor Manager
//!
//! Orchestration layer: manages actor identities for one referrer and keeps
//! every instance sharing the same storage and broadcast channel in sync.
//!
//! - [`ActorManager`]: lifecycle (create, store, get, rename, delete,
//!   choose, unchoose) and crypto with the chosen actor (sign, public key,
//!   shared secret, encrypt, decrypt)
//! - [`AnnouncementBus`] / [`AnnouncementStream`]: local change notifications
//! - [`InitPhase`]: initialization state machine
//!
//! Handlers for storage, broadcast, confirmation and storage access come
//! from `actor-effects` or the embedder.

mod announcements;
mod builder;
mod lifecycle;
mod manager;
mod sync;
mod tasks;

pub use announcements::{AnnouncementBus, AnnouncementStream};
pub use builder::ActorManagerBuilder;
pub use lifecycle::InitPhase;
pub use manager::ActorManager;
