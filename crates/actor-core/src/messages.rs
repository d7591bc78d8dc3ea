//! Lifecycle events, local announcements and the cross-tab wire message
//!
//! The same three events travel both to local subscribers (as announcements)
//! and between instances (inside a [`ChannelMessage`]). On the wire a message
//! is the flat JSON object
//! `{"action": "choose"|"update"|"delete", "referrer": ..., "uri": ...|null, "id": ...}`.

use crate::errors::{ActorError, Result};
use crate::types::{ActorUri, ChannelId, Referrer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Wire tag of an [`ActorEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Chosen pointer changed
    Choose,
    /// Actor record created or changed
    Update,
    /// Actor record removed
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Choose => write!(f, "choose"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
        }
    }
}

/// A change to actor state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorEvent {
    /// The chosen actor is now `uri`, or nobody
    Choose(Option<ActorUri>),
    /// The actor record at this URI was written
    Update(ActorUri),
    /// The actor record at this URI was removed
    Delete(ActorUri),
}

/// Event as delivered to local subscribers.
pub type Announcement = ActorEvent;

impl ActorEvent {
    /// Wire tag of this event.
    pub fn action(&self) -> Action {
        match self {
            ActorEvent::Choose(_) => Action::Choose,
            ActorEvent::Update(_) => Action::Update,
            ActorEvent::Delete(_) => Action::Delete,
        }
    }

    /// URI carried by the event, if any.
    pub fn uri(&self) -> Option<&ActorUri> {
        match self {
            ActorEvent::Choose(uri) => uri.as_ref(),
            ActorEvent::Update(uri) | ActorEvent::Delete(uri) => Some(uri),
        }
    }

    /// Rebuild an event from its wire parts. Only `choose` may omit the URI.
    pub fn from_parts(action: Action, uri: Option<ActorUri>) -> Result<Self> {
        match (action, uri) {
            (Action::Choose, uri) => Ok(ActorEvent::Choose(uri)),
            (Action::Update, Some(uri)) => Ok(ActorEvent::Update(uri)),
            (Action::Delete, Some(uri)) => Ok(ActorEvent::Delete(uri)),
            (action, None) => Err(ActorError::invalid_input(format!(
                "\"{action}\" message without a URI"
            ))),
        }
    }
}

/// Message exchanged between instances over the shared broadcast channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    /// What happened
    pub event: ActorEvent,
    /// Referrer of the sending instance
    pub referrer: Referrer,
    /// Channel id of the sending instance
    pub sender: ChannelId,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    action: Action,
    referrer: String,
    uri: Option<String>,
    id: String,
}

impl ChannelMessage {
    /// Encode as JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = WireMessage {
            action: self.event.action(),
            referrer: self.referrer.as_str().to_string(),
            uri: self.event.uri().map(|uri| uri.as_str().to_string()),
            id: self.sender.as_str().to_string(),
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decode JSON bytes, rejecting anything that is not a well-formed message.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: WireMessage = serde_json::from_slice(bytes)?;
        let uri = wire.uri.as_deref().map(ActorUri::parse).transpose()?;
        Ok(Self {
            event: ActorEvent::from_parts(wire.action, uri)?,
            referrer: Referrer::new(wire.referrer),
            sender: ChannelId::new(wire.id),
        })
    }
}
