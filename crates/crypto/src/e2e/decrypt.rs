//! Audio-Payload Entschluesselung
//!
//! Entschluesselt die kombinierte Darstellung und verifiziert dabei den
//! Auth-Tag. Manipulierte Daten oder ein falscher Schluessel fuehren zu
//! `CryptoError::Entschluesselung`.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{EncryptedPayload, SharedKey};

/// Entschluesselt einen strukturierten Payload
pub fn decrypt_payload(payload: &EncryptedPayload, key: &SharedKey) -> CryptoResult<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    cipher
        .decrypt(
            AesNonce::from_slice(payload.nonce.as_bytes()),
            payload.ciphertext.as_slice(),
        )
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

/// Entschluesselt rohe Bytes in kombinierter Darstellung
///
/// Nuetzlich wenn Bytes direkt aus dem `payload`-Feld einer WireMessage kommen.
pub fn decrypt(combined: &[u8], key: &SharedKey) -> CryptoResult<Vec<u8>> {
    let payload = EncryptedPayload::from_bytes(combined).ok_or_else(|| {
        CryptoError::UngueltigeDaten(format!(
            "Payload zu kurz: {} Bytes",
            combined.len()
        ))
    })?;
    decrypt_payload(&payload, key)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2e::encrypt::encrypt;
    use crate::e2e::key_exchange::KeyAgreement;

    fn schluesselpaar() -> (SharedKey, SharedKey) {
        let alice = KeyAgreement::generate();
        let bob = KeyAgreement::generate();
        (
            alice.derive_shared_key(bob.public_key_bytes()).unwrap(),
            bob.derive_shared_key(alice.public_key_bytes()).unwrap(),
        )
    }

    #[test]
    fn roundtrip_ueber_abgeleitete_schluessel() {
        let (k_alice, k_bob) = schluesselpaar();
        let plaintext = b"Hallo Bob, hier ist ein Clip";

        let combined = encrypt(plaintext, &k_alice).unwrap();
        let decrypted = decrypt(&combined, &k_bob).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn roundtrip_verschiedene_groessen() {
        let (k_alice, k_bob) = schluesselpaar();
        for len in [0usize, 1, 15, 16, 17, 4096, 65_537] {
            let plaintext: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let combined = encrypt(&plaintext, &k_alice).unwrap();
            assert_eq!(decrypt(&combined, &k_bob).unwrap(), plaintext, "Laenge {len}");
        }
    }

    #[test]
    fn falscher_schluessel_schlaegt_fehl() {
        let (k_alice, _) = schluesselpaar();
        let (andere, _) = schluesselpaar();

        let combined = encrypt(b"Geheime Audio-Daten", &k_alice).unwrap();
        let result = decrypt(&combined, &andere);

        assert!(matches!(result, Err(CryptoError::Entschluesselung(_))));
    }

    #[test]
    fn manipulierter_ciphertext_schlaegt_fehl() {
        let (k_alice, k_bob) = schluesselpaar();
        let mut combined = encrypt(b"Roh-Audio", &k_alice).unwrap();
        let letzter = combined.len() - 1;
        combined[letzter] ^= 0x01;

        assert!(decrypt(&combined, &k_bob).is_err());
    }

    #[test]
    fn manipulierte_nonce_schlaegt_fehl() {
        let (k_alice, k_bob) = schluesselpaar();
        let mut combined = encrypt(b"Roh-Audio", &k_alice).unwrap();
        combined[0] ^= 0xFF;

        assert!(decrypt(&combined, &k_bob).is_err());
    }

    #[test]
    fn ungueltige_bytes_schlagen_fehl() {
        let (k, _) = schluesselpaar();
        let result = decrypt(&[0u8; 5], &k);
        assert!(matches!(result, Err(CryptoError::UngueltigeDaten(_))));
    }
}
