//! Domain-separated key derivation for actor identities
//!
//! An actor owns a single 32-byte root secret. The secret itself is never used
//! as key material: every purpose hashes a distinct domain tag together with
//! the secret, so new purpose-specific subkeys can be added later without ever
//! reusing a key across purposes.
//!
//! - Main signing key: `SHA-256(SIGNING_DOMAIN || root)`
//! - One-time signing key: `SHA-256(nonce || root)`, nonce at least 24 bytes
//! - Self-encryption key: `SHA-256(SELF_ENCRYPTION_DOMAIN || signing seed)`
//!
//! Signing is Ed25519. Key agreement maps both Ed25519 keys onto Curve25519
//! (Montgomery form) and runs X25519.

use crate::crypto::encoding::{actor_uri_encode, base64_decode, base64_encode};
use crate::errors::{ActorError, Result};
use crate::types::ActorUri;
use curve25519_dalek::montgomery::MontgomeryPoint;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of an actor root secret in bytes
pub const ROOT_SECRET_LENGTH: usize = 32;
/// Length of an Ed25519 public key in bytes
pub const PUBLIC_KEY_LENGTH: usize = 32;
/// Length of an Ed25519 signature in bytes
pub const SIGNATURE_LENGTH: usize = 64;
/// Shortest nonce accepted for one-time key derivation
pub const MIN_NONCE_LENGTH: usize = 24;

const SIGNING_DOMAIN: &[u8] = b"actor-manager/v1/signing";
const SELF_ENCRYPTION_DOMAIN: &[u8] = b"actor-manager/v1/self-encryption";

fn sha256_concat(prefix: &[u8], data: &[u8]) -> [u8; 32] {
    let digest = Sha256::new()
        .chain_update(prefix)
        .chain_update(data)
        .finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// The 32 random bytes every key of an actor is derived from.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RootSecret([u8; ROOT_SECRET_LENGTH]);

impl PartialEq for RootSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for RootSecret {}

impl RootSecret {
    /// Draw a fresh secret from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ROOT_SECRET_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Wrap existing secret bytes.
    pub fn from_bytes(bytes: [u8; ROOT_SECRET_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Decode the base64url form stored in actor records.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let mut bytes = base64_decode(encoded)?;
        if bytes.len() != ROOT_SECRET_LENGTH {
            let len = bytes.len();
            bytes.zeroize();
            return Err(ActorError::invalid_input(format!(
                "Root secret must be {ROOT_SECRET_LENGTH} bytes, got {len}"
            )));
        }
        let mut secret = [0u8; ROOT_SECRET_LENGTH];
        secret.copy_from_slice(&bytes);
        bytes.zeroize();
        Ok(Self(secret))
    }

    /// Encode for storage in an actor record.
    pub fn to_base64(&self) -> String {
        base64_encode(&self.0)
    }

    /// Raw secret bytes.
    ///
    /// # Security
    ///
    /// Handle with care - this is secret key material.
    pub fn as_bytes(&self) -> &[u8; ROOT_SECRET_LENGTH] {
        &self.0
    }

    /// The actor's main signing key.
    pub fn signing_key(&self) -> ActorSigningKey {
        ActorSigningKey::from_seed(sha256_concat(SIGNING_DOMAIN, &self.0))
    }

    /// A one-time signing key bound to `nonce`.
    ///
    /// The same (secret, nonce) pair always yields the same key. Nonces
    /// shorter than [`MIN_NONCE_LENGTH`] are rejected.
    pub fn one_time_signing_key(&self, nonce: &[u8]) -> Result<ActorSigningKey> {
        if nonce.len() < MIN_NONCE_LENGTH {
            return Err(ActorError::invalid_input(format!(
                "Nonce is too short: {} bytes, need at least {MIN_NONCE_LENGTH}",
                nonce.len()
            )));
        }
        Ok(ActorSigningKey::from_seed(sha256_concat(nonce, &self.0)))
    }

    /// Main key when `nonce` is `None`, one-time key otherwise.
    pub fn derive_signing_key(&self, nonce: Option<&[u8]>) -> Result<ActorSigningKey> {
        match nonce {
            Some(nonce) => self.one_time_signing_key(nonce),
            None => Ok(self.signing_key()),
        }
    }

    /// URI of the actor owning this secret.
    pub fn actor_uri(&self) -> ActorUri {
        actor_uri_encode(&self.signing_key().public_key())
    }
}

impl fmt::Debug for RootSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootSecret([REDACTED])")
    }
}

/// An Ed25519 signing key derived from a root secret.
pub struct ActorSigningKey {
    inner: SigningKey,
}

impl ActorSigningKey {
    fn from_seed(mut seed: [u8; 32]) -> Self {
        let inner = SigningKey::from_bytes(&seed);
        seed.zeroize();
        Self { inner }
    }

    /// Public half of this key.
    pub fn public_key(&self) -> ActorPublicKey {
        ActorPublicKey(self.inner.verifying_key().to_bytes())
    }

    /// Ed25519 signature over `message`.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.inner.sign(message).to_bytes()
    }

    /// X25519 shared secret with `their_public_key`.
    ///
    /// Without a peer key this returns the caller's own self-encryption key,
    /// which lets an actor encrypt messages to itself.
    pub fn shared_secret(&self, their_public_key: Option<&ActorPublicKey>) -> Result<SharedSecret> {
        let Some(peer) = their_public_key else {
            let mut seed = self.inner.to_bytes();
            let key = sha256_concat(SELF_ENCRYPTION_DOMAIN, &seed);
            seed.zeroize();
            return Ok(SharedSecret(key));
        };

        let peer = peer.verifying_key()?;
        if peer.is_weak() {
            return Err(ActorError::invalid_input(
                "Peer public key is a small-order point",
            ));
        }
        let montgomery: MontgomeryPoint = peer.to_montgomery();
        let mut scalar = self.inner.to_scalar_bytes();
        let shared = montgomery.mul_clamped(scalar);
        scalar.zeroize();
        Ok(SharedSecret(shared.to_bytes()))
    }
}

impl fmt::Debug for ActorSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Don't expose the signing key in debug output
        f.debug_struct("ActorSigningKey")
            .field("signing_key", &"[REDACTED]")
            .field("public_key", &self.public_key())
            .finish()
    }
}

/// A 32-byte Ed25519 public key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActorPublicKey([u8; PUBLIC_KEY_LENGTH]);

impl ActorPublicKey {
    /// Wrap raw key bytes. No curve validation happens here.
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Wrap a byte slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            ActorError::invalid_input(format!(
                "Public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(bytes))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Actor URI addressing this key.
    pub fn uri(&self) -> ActorUri {
        actor_uri_encode(self)
    }

    /// Check a signature made by the matching signing key.
    ///
    /// Malformed signatures or keys simply fail to verify.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(key) = self.verifying_key() else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        key.verify_strict(message, &signature).is_ok()
    }

    fn verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.0)
            .map_err(|e| ActorError::invalid_input(format!("Invalid Ed25519 public key: {e}")))
    }
}

impl fmt::Debug for ActorPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorPublicKey({})", base64_encode(&self.0))
    }
}

/// Symmetric key produced by key agreement (or self-derivation).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; 32]);

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for SharedSecret {}

impl SharedSecret {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret([REDACTED])")
    }
}
