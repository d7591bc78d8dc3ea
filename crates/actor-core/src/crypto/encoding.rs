//! Base64url and actor URI codecs

use crate::crypto::keys::{ActorPublicKey, PUBLIC_KEY_LENGTH};
use crate::errors::{ActorError, Result};
use crate::types::ActorUri;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// URL-safe alphabet, unpadded output, padding optional on input.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded base64url (`-` and `_` instead of `+` and `/`).
pub fn base64_encode(bytes: &[u8]) -> String {
    URL_SAFE_LENIENT.encode(bytes)
}

/// Decode base64url, with or without padding.
///
/// Input written in the standard alphabet is accepted too.
pub fn base64_decode(encoded: &str) -> Result<Vec<u8>> {
    let normalized: String = encoded
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    URL_SAFE_LENIENT
        .decode(normalized.as_bytes())
        .map_err(|e| ActorError::invalid_input(format!("Invalid base64: {e}")))
}

/// Build the actor URI for a public key.
pub fn actor_uri_encode(public_key: &ActorPublicKey) -> ActorUri {
    ActorUri::from_encoded_key(&base64_encode(public_key.as_bytes()))
}

/// Recover the public key from an actor URI.
pub fn actor_uri_decode(uri: &str) -> Result<ActorPublicKey> {
    let encoded = uri
        .strip_prefix(ActorUri::PREFIX)
        .ok_or_else(|| ActorError::invalid_input(format!("Not an actor URI: \"{uri}\"")))?;
    let bytes = base64_decode(encoded)?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        ActorError::invalid_input(format!(
            "Actor URI must encode {PUBLIC_KEY_LENGTH} bytes, got {}",
            b.len()
        ))
    })?;
    Ok(ActorPublicKey::from_bytes(bytes))
}
