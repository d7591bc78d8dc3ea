//! # Actor Core
//!
//! Foundation layer of the actor manager: the types every other crate speaks,
//! the pure cryptographic primitives and the effect traits that abstract the
//! environment (storage, broadcast, confirmation, storage access).
//!
//! This crate performs no I/O of its own. Handlers for the effect traits live
//! in `actor-effects`; orchestration lives in `actor-manager`.

pub mod config;
pub mod crypto;
pub mod effects;
pub mod errors;
pub mod messages;
pub mod types;

pub use config::ManagerConfig;
pub use crypto::{ActorPublicKey, ActorSigningKey, RootSecret, SharedSecret};
pub use errors::{ActorError, Result};
pub use messages::{Action, ActorEvent, Announcement, ChannelMessage};
pub use types::{Actor, ActorUri, ChannelId, Referrer};
