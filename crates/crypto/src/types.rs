//! Gemeinsame Typen fuer das Kryptografie-Subsystem

/// Laenge eines unkomprimierten SEC1 P-256 Public Keys (0x04 || X || Y)
pub const PUBLIC_KEY_LEN: usize = 65;

/// Laenge des symmetrischen Schluessels (AES-256)
pub const KEY_LEN: usize = 32;

/// Laenge der AEAD-Nonce (96 Bit)
pub const NONCE_LEN: usize = 12;

/// Laenge des GCM Auth-Tags
pub const TAG_LEN: usize = 16;

/// Symmetrischer Schluessel fuer genau einen Peer (wird beim Drop genullt)
#[derive(Clone, PartialEq, Eq)]
pub struct SharedKey([u8; KEY_LEN]);

impl SharedKey {
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Erstellt einen Schluessel aus einem Slice mit Laengenpruefung
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let arr: [u8; KEY_LEN] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for SharedKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedKey([REDACTED] {} bytes)", KEY_LEN)
    }
}

/// Eine kryptografische Nonce (Number used once)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    pub bytes: [u8; NONCE_LEN],
}

impl Nonce {
    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.bytes
    }
}

/// Verschluesselter Payload (Nonce + Ciphertext + Auth-Tag)
#[derive(Debug, Clone)]
pub struct EncryptedPayload {
    /// 12 Bytes Nonce, pro Aufruf frisch gezogen
    pub nonce: Nonce,
    /// Verschluesselter Inhalt inkl. 16 Bytes Auth-Tag (angehaengt)
    pub ciphertext: Vec<u8>,
}

impl EncryptedPayload {
    /// Serialisiert zur kombinierten Darstellung: [nonce(12)] + [ciphertext + tag(16)]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.nonce.bytes);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Deserialisiert aus der kombinierten Darstellung
    ///
    /// Gibt `None` zurueck wenn nicht einmal Nonce und Auth-Tag Platz haben.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < NONCE_LEN + TAG_LEN {
            return None;
        }
        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(&bytes[..NONCE_LEN]);
        Some(Self {
            nonce: Nonce { bytes: nonce_bytes },
            ciphertext: bytes[NONCE_LEN..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_key_debug_ist_geschwaerzt() {
        let key = SharedKey::new([7u8; KEY_LEN]);
        let debug = format!("{key:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("7, 7"));
    }

    #[test]
    fn shared_key_aus_falschem_slice() {
        assert!(SharedKey::from_slice(&[0u8; 16]).is_none());
        assert!(SharedKey::from_slice(&[0u8; KEY_LEN]).is_some());
    }

    #[test]
    fn zu_kurze_payload_wird_abgelehnt() {
        assert!(EncryptedPayload::from_bytes(&[0u8; NONCE_LEN + TAG_LEN - 1]).is_none());
    }
}
