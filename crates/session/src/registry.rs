//! Peer-Registry
//!
//! Zwei Maps, beide nach `PeerId` geschluesselt:
//! - entdeckt: alle Peers mit Discovery-Buchfuehrung
//! - verbunden: Peers mit aufgebauter Session
//!
//! Invariante: jeder verbundene Peer hat auch einen Eintrag in `entdeckt`.
//! Ein Host, der eine Einladung eines nie entdeckten Peers annimmt, legt den
//! Eintrag beim Verbinden an. Verschwindet ein verbundener Peer aus der
//! Discovery, bleibt sein Eintrag als `Lost` stehen bis die Session endet.

use std::collections::HashMap;

use flurfunk_core::{Peer, PeerConnectionState, PeerId};

/// Buchfuehrung ueber entdeckte und verbundene Peers
#[derive(Debug, Default)]
pub struct PeerRegistry {
    entdeckt: HashMap<PeerId, Peer>,
    verbunden: HashMap<PeerId, Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Peer entdeckt. Gibt true zurueck wenn der Peer neu ist.
    ///
    /// Eine erneute Entdeckung aktualisiert nur den Anzeigenamen.
    pub fn gefunden(&mut self, id: PeerId, display_name: &str) -> bool {
        let ist_verbunden = self.verbunden.contains_key(&id);
        if let Some(peer) = self.verbunden.get_mut(&id) {
            peer.display_name = display_name.to_string();
        }
        match self.entdeckt.get_mut(&id) {
            Some(peer) => {
                peer.display_name = display_name.to_string();
                if peer.state == PeerConnectionState::Lost {
                    peer.state = if ist_verbunden {
                        PeerConnectionState::Connected
                    } else {
                        PeerConnectionState::Discovered
                    };
                }
                false
            }
            None => {
                self.entdeckt.insert(
                    id.clone(),
                    Peer::neu(id, display_name, PeerConnectionState::Discovered),
                );
                true
            }
        }
    }

    /// Peer aus der Discovery verschwunden
    ///
    /// Gibt true zurueck wenn der Peer bekannt war.
    pub fn verloren(&mut self, id: &PeerId) -> bool {
        if self.verbunden.contains_key(id) {
            match self.entdeckt.get_mut(id) {
                Some(peer) => {
                    peer.state = PeerConnectionState::Lost;
                    true
                }
                None => false,
            }
        } else {
            self.entdeckt.remove(id).is_some()
        }
    }

    /// Verbindungsaufbau zu einem entdeckten Peer laeuft
    pub fn verbindend(&mut self, id: &PeerId) {
        if let Some(peer) = self.entdeckt.get_mut(id) {
            if peer.state != PeerConnectionState::Connected {
                peer.state = PeerConnectionState::Connecting;
            }
        }
    }

    /// Session mit einem Peer aufgebaut
    ///
    /// `name_hinweis` wird verwendet wenn der Peer nie entdeckt wurde.
    /// Gibt den verbundenen Peer zurueck.
    pub fn verbunden(&mut self, id: PeerId, name_hinweis: Option<&str>) -> Peer {
        let eintrag = self.entdeckt.entry(id.clone()).or_insert_with(|| {
            let name = name_hinweis.unwrap_or_else(|| id.as_str());
            Peer::neu(id.clone(), name, PeerConnectionState::Discovered)
        });
        eintrag.state = PeerConnectionState::Connected;
        let peer = eintrag.clone();
        self.verbunden.insert(id, peer.clone());
        peer
    }

    /// Session mit einem Peer beendet
    ///
    /// Gibt den entfernten Peer zurueck falls er verbunden war. Ein
    /// abgebrochener Verbindungsaufbau setzt den Peer auf `Discovered` zurueck.
    pub fn getrennt(&mut self, id: &PeerId) -> Option<Peer> {
        let Some(peer) = self.verbunden.remove(id) else {
            if let Some(p) = self.entdeckt.get_mut(id) {
                if p.state == PeerConnectionState::Connecting {
                    p.state = PeerConnectionState::Discovered;
                }
            }
            return None;
        };
        let verloren = self
            .entdeckt
            .get(id)
            .map(|p| p.state == PeerConnectionState::Lost)
            .unwrap_or(false);
        if verloren {
            self.entdeckt.remove(id);
        } else if let Some(p) = self.entdeckt.get_mut(id) {
            p.state = PeerConnectionState::Discovered;
        }
        Some(peer)
    }

    pub fn ist_entdeckt(&self, id: &PeerId) -> bool {
        self.entdeckt.contains_key(id)
    }

    pub fn ist_verbunden(&self, id: &PeerId) -> bool {
        self.verbunden.contains_key(id)
    }

    pub fn anzahl_verbunden(&self) -> usize {
        self.verbunden.len()
    }

    pub fn peer(&self, id: &PeerId) -> Option<&Peer> {
        self.entdeckt.get(id)
    }

    /// Entdeckte Peers, nach ID sortiert
    pub fn entdeckte(&self) -> Vec<Peer> {
        sortiert(self.entdeckt.values())
    }

    /// Verbundene Peers, nach ID sortiert
    pub fn verbundene(&self) -> Vec<Peer> {
        sortiert(self.verbunden.values())
    }

    pub fn verbundene_ids(&self) -> Vec<PeerId> {
        self.verbundene().into_iter().map(|p| p.id).collect()
    }

    pub fn leeren(&mut self) {
        self.entdeckt.clear();
        self.verbunden.clear();
    }
}

fn sortiert<'a>(peers: impl Iterator<Item = &'a Peer>) -> Vec<Peer> {
    let mut v: Vec<Peer> = peers.cloned().collect();
    v.sort_by(|a, b| a.id.cmp(&b.id));
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PeerId {
        PeerId::new(s)
    }

    #[test]
    fn doppelte_entdeckung_ist_idempotent() {
        let mut r = PeerRegistry::new();
        assert!(r.gefunden(id("p1"), "Alice"));
        assert!(!r.gefunden(id("p1"), "Alice"));
        assert!(!r.gefunden(id("p1"), "Alice"));
        assert_eq!(r.entdeckte().len(), 1);
    }

    #[test]
    fn neue_entdeckung_aktualisiert_nur_namen() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        r.gefunden(id("p1"), "Alice (Telefon)");
        let peers = r.entdeckte();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].display_name, "Alice (Telefon)");
    }

    #[test]
    fn gleicher_name_verschiedene_ids() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        r.gefunden(id("p2"), "Alice");
        assert_eq!(r.entdeckte().len(), 2);
    }

    #[test]
    fn verbinden_ohne_entdeckung_legt_eintrag_an() {
        let mut r = PeerRegistry::new();
        let peer = r.verbunden(id("gast"), Some("Gast"));
        assert_eq!(peer.display_name, "Gast");
        assert!(r.ist_entdeckt(&id("gast")));
        assert!(r.ist_verbunden(&id("gast")));
        assert_eq!(r.peer(&id("gast")).unwrap().state, PeerConnectionState::Connected);
    }

    #[test]
    fn jeder_verbundene_ist_entdeckt() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("a"), "A");
        r.verbunden(id("a"), None);
        r.verbunden(id("b"), None);
        r.verloren(&id("a"));
        for p in r.verbundene() {
            assert!(r.ist_entdeckt(&p.id));
        }
    }

    #[test]
    fn verloren_entfernt_unverbundenen_peer() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        assert!(r.verloren(&id("p1")));
        assert!(!r.ist_entdeckt(&id("p1")));
        assert!(!r.verloren(&id("p1")));
    }

    #[test]
    fn verloren_waehrend_verbunden_dann_getrennt() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        r.verbunden(id("p1"), None);
        r.verloren(&id("p1"));
        assert_eq!(r.peer(&id("p1")).unwrap().state, PeerConnectionState::Lost);

        assert!(r.getrennt(&id("p1")).is_some());
        assert!(!r.ist_entdeckt(&id("p1")));
        assert_eq!(r.anzahl_verbunden(), 0);
    }

    #[test]
    fn getrennt_behaelt_entdeckung() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        r.verbindend(&id("p1"));
        assert_eq!(r.peer(&id("p1")).unwrap().state, PeerConnectionState::Connecting);
        r.verbunden(id("p1"), None);
        r.getrennt(&id("p1"));
        assert_eq!(r.peer(&id("p1")).unwrap().state, PeerConnectionState::Discovered);
        assert!(r.getrennt(&id("p1")).is_none());
    }

    #[test]
    fn abgebrochener_verbindungsaufbau_setzt_zurueck() {
        let mut r = PeerRegistry::new();
        r.gefunden(id("p1"), "Alice");
        r.verbindend(&id("p1"));
        assert!(r.getrennt(&id("p1")).is_none());
        assert_eq!(r.peer(&id("p1")).unwrap().state, PeerConnectionState::Discovered);
        assert!(!r.ist_verbunden(&id("p1")));
    }
}
