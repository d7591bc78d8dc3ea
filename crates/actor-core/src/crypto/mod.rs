//! Cryptographic primitives
//!
//! Pure, synchronous building blocks: codecs, key derivation, signatures,
//! key agreement and authenticated encryption. Nothing in here touches
//! storage or holds state.

pub mod aead;
pub mod encoding;
pub mod keys;

pub use aead::{decrypt, encrypt, AEAD_NONCE_LENGTH};
pub use encoding::{actor_uri_decode, actor_uri_encode, base64_decode, base64_encode};
pub use keys::{
    ActorPublicKey, ActorSigningKey, RootSecret, SharedSecret, MIN_NONCE_LENGTH,
    PUBLIC_KEY_LENGTH, ROOT_SECRET_LENGTH, SIGNATURE_LENGTH,
};
