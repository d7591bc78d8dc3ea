//! Core domain types: actor records, URIs, referrers and channel identifiers

use crate::crypto::{actor_uri_decode, ActorPublicKey, RootSecret};
use crate::errors::{ActorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity URI of an actor: `actor:<base64url(public key)>`.
///
/// Always well formed: construction and deserialization validate the encoded
/// key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ActorUri(String);

impl ActorUri {
    /// Scheme prefix shared by every actor URI (and every actor storage key)
    pub const PREFIX: &'static str = "actor:";

    /// Parse and validate a URI string.
    ///
    /// Padded or standard-alphabet spellings of the key are accepted and
    /// normalized, so equal keys always give equal URIs.
    pub fn parse(uri: &str) -> Result<Self> {
        Ok(actor_uri_decode(uri)?.uri())
    }

    pub(crate) fn from_encoded_key(encoded: &str) -> Self {
        Self(format!("{}{encoded}", Self::PREFIX))
    }

    /// The public key this URI encodes.
    pub fn public_key(&self) -> Result<ActorPublicKey> {
        actor_uri_decode(&self.0)
    }

    /// URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if a storage key names an actor record.
    pub fn is_actor_key(name: &str) -> bool {
        name.starts_with(Self::PREFIX)
    }
}

impl fmt::Display for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ActorUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorUri({})", self.0)
    }
}

impl AsRef<str> for ActorUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ActorUri {
    type Err = ActorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ActorUri {
    type Error = ActorError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ActorUri> for String {
    fn from(uri: ActorUri) -> Self {
        uri.0
    }
}

/// Persisted actor record.
///
/// Stored as JSON `{"nickname": ..., "rootSecretBase64": ...}` under the
/// actor's URI.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    /// Human readable name; the only mutable field
    pub nickname: String,
    /// Root secret, base64url encoded
    pub root_secret_base64: String,
}

impl Actor {
    /// Build a record around an existing root secret.
    pub fn new(nickname: impl Into<String>, root_secret: &RootSecret) -> Self {
        Self {
            nickname: nickname.into(),
            root_secret_base64: root_secret.to_base64(),
        }
    }

    /// Decode the root secret.
    pub fn root_secret(&self) -> Result<RootSecret> {
        RootSecret::from_base64(&self.root_secret_base64)
    }

    /// URI derived from the record's secret.
    pub fn uri(&self) -> Result<ActorUri> {
        Ok(self.root_secret()?.actor_uri())
    }

    /// Serialize to the stored JSON form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the stored JSON form.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Actor")
            .field("nickname", &self.nickname)
            .field("root_secret_base64", &"[REDACTED]")
            .finish()
    }
}

/// Origin of the embedding page. Scopes the chosen-actor pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Referrer(String);

impl Referrer {
    /// Storage key prefix of chosen-actor pointers
    pub const CHOSEN_PREFIX: &'static str = "chosen:";

    /// Use `referrer` verbatim.
    pub fn new(referrer: impl Into<String>) -> Self {
        Self(referrer.into())
    }

    /// Resolve the referrer the way an embedded document does: the origin of
    /// the document referrer if there is one, else the origin of the
    /// document's own location.
    pub fn resolve(document_referrer: Option<&str>, location: &str) -> Result<Self> {
        let source = match document_referrer {
            Some(referrer) if !referrer.is_empty() => referrer,
            _ => location,
        };
        let url = url::Url::parse(source)
            .map_err(|e| ActorError::invalid_input(format!("Invalid URL \"{source}\": {e}")))?;
        Ok(Self(url.origin().ascii_serialization()))
    }

    /// Storage key of this referrer's chosen-actor pointer.
    pub fn chosen_key(&self) -> String {
        format!("{}{}", Self::CHOSEN_PREFIX, self.0)
    }

    /// Referrer as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Referrer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Random per-instance identifier used for echo suppression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Fresh random identifier.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received over the wire.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
