//! Audio-Payload Verschluesselung
//!
//! Verschluesselt Sprach-Clips mit dem Schluessel des Ziel-Peers.
//!
//! ## Format (kombinierte Darstellung)
//! ```text
//! [nonce(12)] [ciphertext] [auth_tag(16)]
//! ```
//!
//! Die Nonce wird pro Aufruf frisch aus dem OS-Zufallsgenerator gezogen,
//! sie wiederholt sich fuer denselben Schluessel daher nicht.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{EncryptedPayload, Nonce, SharedKey, NONCE_LEN};

/// Verschluesselt einen Payload und liefert die kombinierte Darstellung
pub fn encrypt(plaintext: &[u8], key: &SharedKey) -> CryptoResult<Vec<u8>> {
    Ok(encrypt_payload(plaintext, key)?.to_bytes())
}

/// Verschluesselt einen Payload mit frischer Zufalls-Nonce
pub fn encrypt_payload(plaintext: &[u8], key: &SharedKey) -> CryptoResult<EncryptedPayload> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce { bytes: nonce_bytes };

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(AesNonce::from_slice(nonce.as_bytes()), plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    Ok(EncryptedPayload { nonce, ciphertext })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
