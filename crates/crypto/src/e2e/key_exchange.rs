//! P-256 Diffie-Hellman Key Agreement
//!
//! Jeder Knoten haelt fuer die Lebensdauer des Prozesses ein statisches
//! Schluesselpaar. Beim Session-Aufbau senden beide Seiten unabhaengig
//! voneinander ihren rohen Public Key (SEC1 unkomprimiert, 65 Bytes):
//!
//! ```text
//! [0x04] [X (32)] [Y (32)]
//! ```
//!
//! Aus dem ECDH-Ergebnis wird per HKDF-SHA256 (fester Anwendungs-Salt,
//! leere Info) ein 32-Byte Schluessel abgeleitet. Beide Seiten kommen
//! ohne weitere Koordination zum gleichen Ergebnis.

use hkdf::Hkdf;
use p256::ecdh::diffie_hellman;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::{PublicKey, SecretKey};
use rand::rngs::OsRng;
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};
use crate::types::{SharedKey, KEY_LEN, PUBLIC_KEY_LEN};

/// Standard-Salt fuer die Schluesselableitung
pub const DEFAULT_HKDF_SALT: &[u8] = b"Flurfunk";

/// SEC1-Praefix fuer unkomprimierte Punkte
const SEC1_UNKOMPRIMIERT: u8 = 0x04;

/// Langlebiges Schluesselpaar eines Knotens
pub struct KeyAgreement {
    secret: SecretKey,
    public_key: [u8; PUBLIC_KEY_LEN],
    salt: Vec<u8>,
}

impl KeyAgreement {
    /// Erzeugt ein frisches Schluesselpaar mit dem Standard-Salt
    pub fn generate() -> Self {
        Self::mit_salt(DEFAULT_HKDF_SALT)
    }

    /// Erzeugt ein frisches Schluesselpaar mit eigenem HKDF-Salt
    pub fn mit_salt(salt: &[u8]) -> Self {
        let secret = SecretKey::random(&mut OsRng);
        let encoded = secret.public_key().to_encoded_point(false);

        let mut public_key = [0u8; PUBLIC_KEY_LEN];
        public_key.copy_from_slice(encoded.as_bytes());

        Self {
            secret,
            public_key,
            salt: salt.to_vec(),
        }
    }

    /// Roher oeffentlicher Schluessel (Handshake-Payload)
    pub fn public_key_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.public_key
    }

    /// Leitet den gemeinsamen Schluessel mit einem Peer ab
    ///
    /// Schlaegt fehl wenn `peer_public_key` kein gueltiger unkomprimierter
    /// P-256 Punkt ist. Ein fehlgeschlagener Austausch laesst den Peer ohne
    /// Schluessel, die Session bleibt davon unberuehrt.
    pub fn derive_shared_key(&self, peer_public_key: &[u8]) -> CryptoResult<SharedKey> {
        if peer_public_key.len() != PUBLIC_KEY_LEN {
            return Err(CryptoError::UngueltigerPublicKey(format!(
                "erwartet {} Bytes, erhalten {}",
                PUBLIC_KEY_LEN,
                peer_public_key.len()
            )));
        }
        if peer_public_key[0] != SEC1_UNKOMPRIMIERT {
            return Err(CryptoError::UngueltigerPublicKey(format!(
                "unbekanntes SEC1-Praefix 0x{:02X}",
                peer_public_key[0]
            )));
        }

        let peer = PublicKey::from_sec1_bytes(peer_public_key)
            .map_err(|e| CryptoError::UngueltigerPublicKey(e.to_string()))?;

        let shared = diffie_hellman(self.secret.to_nonzero_scalar(), peer.as_affine());
        let okm = hkdf_derive(shared.raw_secret_bytes().as_slice(), &self.salt, &[], KEY_LEN)?;

        SharedKey::from_slice(&okm).ok_or(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: KEY_LEN,
            erhalten: okm.len(),
        })
    }
}

impl std::fmt::Debug for KeyAgreement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyAgreement")
            .field("public_key_len", &self.public_key.len())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// HKDF-basierte Key Derivation (allgemein verwendbar)
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
