//! # flurfunk-crypto
//!
//! Ende-zu-Ende Verschluesselung fuer Flurfunk-Sprachnachrichten.
//!
//! ## Module
//! - `e2e` - P-256 Key Agreement, AES-256-GCM, Schluessel-Speicher pro Peer
//! - `types` - Gemeinsame Typen (SharedKey, Nonce, EncryptedPayload)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use types::{EncryptedPayload, Nonce, SharedKey, KEY_LEN, NONCE_LEN, PUBLIC_KEY_LEN, TAG_LEN};

pub use e2e::{decrypt, encrypt, hkdf_derive, KeyAgreement, SecretStore, DEFAULT_HKDF_SALT};
