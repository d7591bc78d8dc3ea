//! Private-message encryption with XChaCha20-Poly1305
//!
//! Output layout: `nonce (24 bytes) || ciphertext+tag`. A fresh random nonce is
//! drawn for every message; the extended nonce makes random nonces safe.

use crate::crypto::keys::SharedSecret;
use crate::errors::{ActorError, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::rngs::OsRng;
use rand::RngCore;

/// Length of the nonce prefixed to every ciphertext
pub const AEAD_NONCE_LENGTH: usize = 24;

/// Encrypt `plaintext` under `key`, prefixing the random nonce.
pub fn encrypt(key: &SharedSecret, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce = [0u8; AEAD_NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|e| ActorError::crypto(format!("Encryption failed: {e}")))?;

    let mut out = Vec::with_capacity(AEAD_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Split off the nonce and decrypt.
pub fn decrypt(key: &SharedSecret, ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < AEAD_NONCE_LENGTH {
        return Err(ActorError::invalid_input(format!(
            "Ciphertext is too short: {} bytes, need at least {AEAD_NONCE_LENGTH}",
            ciphertext_with_nonce.len()
        )));
    }
    let (nonce, ciphertext) = ciphertext_with_nonce.split_at(AEAD_NONCE_LENGTH);

    let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|e| ActorError::crypto(format!("Decryption failed: {e}")))
}
