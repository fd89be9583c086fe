//! Schluessel-Speicher pro Peer
//!
//! Haelt `PeerId -> SharedKey`. Ein Eintrag existiert fuer Peer P nur nach
//! einem erfolgreichen Handshake mit P. Das Fehlen eines Eintrags ist
//! selbst eine Information: ausgehende Nachrichten gehen dann unverschluesselt
//! raus. Nicht persistiert, wird beim Session-Abbau geleert.
//!
//! Der Speicher gehoert exklusiv dem Codec und wird nur ueber die engen
//! Zugriffe `get`/`put`/`has`/`remove`/`clear` veraendert.

use std::collections::HashMap;

use flurfunk_core::PeerId;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SharedKey;

/// Verwaltet die abgeleiteten Schluessel aller Peers
#[derive(Debug, Default)]
pub struct SecretStore {
    keys: HashMap<PeerId, SharedKey>,
}

impl SecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gibt den Schluessel eines Peers zurueck
    pub fn get(&self, peer_id: &PeerId) -> CryptoResult<&SharedKey> {
        self.keys.get(peer_id).ok_or_else(|| CryptoError::KeinGeheimnis {
            peer_id: peer_id.to_string(),
        })
    }

    /// Speichert (oder ersetzt) den Schluessel eines Peers
    ///
    /// Gibt true zurueck wenn ein vorhandener Schluessel ueberschrieben wurde.
    pub fn put(&mut self, peer_id: PeerId, key: SharedKey) -> bool {
        let ersetzt = self.keys.contains_key(&peer_id);
        if ersetzt {
            tracing::debug!(peer = %peer_id, "Schluessel ersetzt");
        }
        self.keys.insert(peer_id, key);
        ersetzt
    }

    pub fn has(&self, peer_id: &PeerId) -> bool {
        self.keys.contains_key(peer_id)
    }

    /// Entfernt den Schluessel eines Peers (bei Session-Abbau)
    pub fn remove(&mut self, peer_id: &PeerId) -> bool {
        self.keys.remove(peer_id).is_some()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Kennungen aller Peers mit abgeschlossenem Handshake (sortiert)
    pub fn peer_ids(&self) -> Vec<PeerId> {
        let mut ids: Vec<PeerId> = self.keys.keys().cloned().collect();
        ids.sort();
        ids
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn key(b: u8) -> SharedKey {
        SharedKey::new([b; 32])
    }

    #[test]
    fn fehlender_schluessel_ergibt_fehler() {
        let store = SecretStore::new();
        let result = store.get(&PeerId::new("nicht-vorhanden"));
        assert!(matches!(result, Err(CryptoError::KeinGeheimnis { .. })));
    }

    #[test]
    fn put_und_get() {
        let mut store = SecretStore::new();
        assert!(!store.put(PeerId::new("p1"), key(1)));
        assert!(store.has(&PeerId::new("p1")));
        assert_eq!(store.get(&PeerId::new("p1")).unwrap().as_bytes(), &[1u8; 32]);
    }

    #[test]
    fn reconnect_ueberschreibt_schluessel() {
        let mut store = SecretStore::new();
        store.put(PeerId::new("p1"), key(1));
        assert!(store.put(PeerId::new("p1"), key(2)));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&PeerId::new("p1")).unwrap().as_bytes(), &[2u8; 32]);
    }

    #[test]
    fn remove_und_clear() {
        let mut store = SecretStore::new();
        store.put(PeerId::new("p1"), key(1));
        store.put(PeerId::new("p2"), key(2));

        assert!(store.remove(&PeerId::new("p1")));
        assert!(!store.remove(&PeerId::new("p1")));
        assert_eq!(store.peer_ids(), vec![PeerId::new("p2")]);

        store.clear();
        assert!(store.is_empty());
    }
}
