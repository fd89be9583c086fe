//! E2E Verschluesselung (End-to-End)
//!
//! Peer <-> Peer Verschluesselung ohne zentralen Server.
//!
//! ## Ablauf
//! 1. Jeder Knoten erzeugt beim Start ein P-256 Schluesselpaar (`KeyAgreement`)
//! 2. Bei Session-Aufbau: beide Seiten senden ihren rohen Public Key (65 Bytes)
//! 3. ECDH + HKDF-SHA256 ergibt einen 32-Byte Schluessel pro Peer (`SecretStore`)
//! 4. Audio-Clips werden mit AES-256-GCM verschluesselt
//! 5. Bei Reconnect wird der Austausch wiederholt und der Schluessel ersetzt

pub mod decrypt;
pub mod encrypt;
pub mod key_exchange;
pub mod secret_store;

pub use decrypt::{decrypt, decrypt_payload};
pub use encrypt::encrypt;
pub use key_exchange::{hkdf_derive, KeyAgreement, DEFAULT_HKDF_SALT};
pub use secret_store::SecretStore;
