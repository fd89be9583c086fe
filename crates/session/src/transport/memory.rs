//! In-Process-Transport
//!
//! `MemoryNetwork` ist ein Hub, an dem beliebig viele Knoten haengen. Er
//! bildet Advertising, Browsing, Einladungen und zuverlaessiges Senden im
//! Speicher nach und liefert die passenden `TransportEvent`s an die
//! beteiligten Knoten. Fuer Tests lassen sich Fehlschlaege injizieren.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use flurfunk_core::PeerId;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::{SessionState, Transport, TransportEvent, TransportEventSender};

#[derive(Debug, Default)]
struct Fehlerinjektion {
    advertising: u32,
    browsing: u32,
    senden: u32,
}

#[derive(Debug)]
struct Knoten {
    name: String,
    events: TransportEventSender,
    advertising: bool,
    browsing: bool,
    sitzungen: HashSet<PeerId>,
    einladungen: HashSet<PeerId>,
    fehler: Fehlerinjektion,
}

#[derive(Debug, Default)]
struct NetzInner {
    knoten: HashMap<PeerId, Knoten>,
}

impl NetzInner {
    /// Sendet ein Ereignis an einen Knoten, falls er noch im Netz ist
    fn melden(&self, an: &PeerId, event: TransportEvent) {
        if let Some(k) = self.knoten.get(an) {
            if !k.events.send(event) {
                tracing::trace!(knoten = %an, "Ereignis verworfen, Session beendet");
            }
        }
    }

    /// Alle anderen Knoten, die gerade eine bestimmte Rolle ausueben
    fn andere_mit<F>(&self, ausser: &PeerId, rolle: F) -> Vec<(PeerId, String)>
    where
        F: Fn(&Knoten) -> bool,
    {
        self.knoten
            .iter()
            .filter(|(id, k)| *id != ausser && rolle(*k))
            .map(|(id, k)| (id.clone(), k.name.clone()))
            .collect()
    }
}

/// Gemeinsames In-Memory-Netz
#[derive(Debug, Clone, Default)]
pub struct MemoryNetwork {
    inner: Arc<Mutex<NetzInner>>,
}

impl MemoryNetwork {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Haengt einen Knoten an das Netz und liefert seinen Transport
    pub fn verbinden(
        &self,
        id: PeerId,
        display_name: impl Into<String>,
        events: TransportEventSender,
    ) -> MemoryTransport {
        self.inner.lock().knoten.insert(
            id.clone(),
            Knoten {
                name: display_name.into(),
                events,
                advertising: false,
                browsing: false,
                sitzungen: HashSet::new(),
                einladungen: HashSet::new(),
                fehler: Fehlerinjektion::default(),
            },
        );
        tracing::debug!(knoten = %id, "Knoten mit In-Memory-Netz verbunden");
        MemoryTransport {
            netz: self.clone(),
            id,
        }
    }

    /// Entfernt einen Knoten, als waere das Geraet ausser Reichweite
    pub fn entfernen(&self, id: &PeerId) {
        let mut netz = self.inner.lock();
        let Some(knoten) = netz.knoten.remove(id) else {
            return;
        };
        if knoten.advertising {
            for (browser, _) in netz.andere_mit(id, |k| k.browsing) {
                netz.melden(&browser, TransportEvent::PeerLost { peer: id.clone() });
            }
        }
        for partner in knoten.sitzungen {
            if let Some(k) = netz.knoten.get_mut(&partner) {
                k.sitzungen.remove(id);
            }
            netz.melden(
                &partner,
                TransportEvent::SessionStateChanged {
                    peer: id.clone(),
                    state: SessionState::NotConnected,
                },
            );
        }
    }

    /// Die naechsten `anzahl` Advertising-Starts von `id` schlagen fehl
    pub fn advertising_fehler_injizieren(&self, id: &PeerId, anzahl: u32) {
        if let Some(k) = self.inner.lock().knoten.get_mut(id) {
            k.fehler.advertising = anzahl;
        }
    }

    /// Die naechsten `anzahl` Browsing-Starts von `id` schlagen fehl
    pub fn browsing_fehler_injizieren(&self, id: &PeerId, anzahl: u32) {
        if let Some(k) = self.inner.lock().knoten.get_mut(id) {
            k.fehler.browsing = anzahl;
        }
    }

    /// Die naechsten `anzahl` Sendeversuche von `id` schlagen fehl
    pub fn senden_fehler_injizieren(&self, id: &PeerId, anzahl: u32) {
        if let Some(k) = self.inner.lock().knoten.get_mut(id) {
            k.fehler.senden = anzahl;
        }
    }

    /// Stellt beliebige Bytes zu, als haette `von` sie gesendet
    pub fn rohdaten_zustellen(&self, von: &PeerId, an: &PeerId, data: Vec<u8>) {
        self.inner.lock().melden(
            an,
            TransportEvent::DataReceived {
                peer: von.clone(),
                data,
            },
        );
    }

    pub fn ist_advertising(&self, id: &PeerId) -> bool {
        self.inner
            .lock()
            .knoten
            .get(id)
            .map(|k| k.advertising)
            .unwrap_or(false)
    }

    pub fn ist_browsing(&self, id: &PeerId) -> bool {
        self.inner
            .lock()
            .knoten
            .get(id)
            .map(|k| k.browsing)
            .unwrap_or(false)
    }

    /// Session-Partner eines Knotens, sortiert
    pub fn sitzungen_von(&self, id: &PeerId) -> Vec<PeerId> {
        let mut v: Vec<PeerId> = self
            .inner
            .lock()
            .knoten
            .get(id)
            .map(|k| k.sitzungen.iter().cloned().collect())
            .unwrap_or_default();
        v.sort();
        v
    }
}

/// Transport eines Knotens am `MemoryNetwork`
#[derive(Debug)]
pub struct MemoryTransport {
    netz: MemoryNetwork,
    id: PeerId,
}

impl MemoryTransport {
    pub fn id(&self) -> &PeerId {
        &self.id
    }
}

impl Transport for MemoryTransport {
    fn start_advertising(&mut self) {
        let mut netz = self.netz.inner.lock();
        let Some(k) = netz.knoten.get_mut(&self.id) else {
            return;
        };
        if k.fehler.advertising > 0 {
            k.fehler.advertising -= 1;
            k.events.send(TransportEvent::AdvertisingFailed {
                fehler: TransportError::AdvertisingFehlgeschlagen("simuliert".into()),
            });
            return;
        }
        k.advertising = true;
        let name = k.name.clone();
        for (browser, _) in netz.andere_mit(&self.id, |k| k.browsing) {
            netz.melden(
                &browser,
                TransportEvent::PeerFound {
                    peer: self.id.clone(),
                    display_name: name.clone(),
                },
            );
        }
    }

    fn stop_advertising(&mut self) {
        let mut netz = self.netz.inner.lock();
        let war_aktiv = match netz.knoten.get_mut(&self.id) {
            Some(k) => std::mem::replace(&mut k.advertising, false),
            None => return,
        };
        if war_aktiv {
            for (browser, _) in netz.andere_mit(&self.id, |k| k.browsing) {
                netz.melden(&browser, TransportEvent::PeerLost { peer: self.id.clone() });
            }
        }
    }

    fn start_browsing(&mut self) {
        let mut netz = self.netz.inner.lock();
        let Some(k) = netz.knoten.get_mut(&self.id) else {
            return;
        };
        if k.fehler.browsing > 0 {
            k.fehler.browsing -= 1;
            k.events.send(TransportEvent::BrowsingFailed {
                fehler: TransportError::BrowsingFehlgeschlagen("simuliert".into()),
            });
            return;
        }
        k.browsing = true;
        for (host, name) in netz.andere_mit(&self.id, |k| k.advertising) {
            netz.melden(
                &self.id,
                TransportEvent::PeerFound {
                    peer: host,
                    display_name: name,
                },
            );
        }
    }

    fn stop_browsing(&mut self) {
        if let Some(k) = self.netz.inner.lock().knoten.get_mut(&self.id) {
            k.browsing = false;
        }
    }

    fn invite(&mut self, peer: &PeerId, timeout: Duration) -> Result<(), TransportError> {
        let mut netz = self.netz.inner.lock();
        let eigener_name = match netz.knoten.get(&self.id) {
            Some(k) => k.name.clone(),
            None => {
                return Err(TransportError::EinladungFehlgeschlagen {
                    peer: peer.to_string(),
                    grund: "eigener Knoten nicht im Netz".into(),
                })
            }
        };
        match netz.knoten.get_mut(peer) {
            Some(ziel) if ziel.advertising => {
                ziel.einladungen.insert(self.id.clone());
            }
            _ => {
                return Err(TransportError::EinladungFehlgeschlagen {
                    peer: peer.to_string(),
                    grund: "Peer nicht erreichbar".into(),
                })
            }
        }
        tracing::trace!(von = %self.id, an = %peer, timeout_s = timeout.as_secs(), "Einladung zugestellt");
        netz.melden(
            &self.id,
            TransportEvent::SessionStateChanged {
                peer: peer.clone(),
                state: SessionState::Connecting,
            },
        );
        netz.melden(
            peer,
            TransportEvent::InvitationReceived {
                peer: self.id.clone(),
                display_name: eigener_name,
            },
        );
        Ok(())
    }

    fn accept_invitation(&mut self, peer: &PeerId, accept: bool) {
        let mut netz = self.netz.inner.lock();
        let offen = match netz.knoten.get_mut(&self.id) {
            Some(k) => k.einladungen.remove(peer),
            None => return,
        };
        if !offen || !netz.knoten.contains_key(peer) {
            return;
        }

        if !accept {
            netz.melden(
                peer,
                TransportEvent::SessionStateChanged {
                    peer: self.id.clone(),
                    state: SessionState::NotConnected,
                },
            );
            return;
        }

        if let Some(k) = netz.knoten.get_mut(&self.id) {
            k.sitzungen.insert(peer.clone());
        }
        if let Some(k) = netz.knoten.get_mut(peer) {
            k.sitzungen.insert(self.id.clone());
        }
        netz.melden(
            &self.id,
            TransportEvent::SessionStateChanged {
                peer: peer.clone(),
                state: SessionState::Connected,
            },
        );
        netz.melden(
            peer,
            TransportEvent::SessionStateChanged {
                peer: self.id.clone(),
                state: SessionState::Connected,
            },
        );
    }

    fn send_reliable(&mut self, peer: &PeerId, data: Vec<u8>) -> Result<(), TransportError> {
        let mut netz = self.netz.inner.lock();
        let Some(k) = netz.knoten.get_mut(&self.id) else {
            return Err(TransportError::SendenFehlgeschlagen {
                peer: peer.to_string(),
                grund: "eigener Knoten nicht im Netz".into(),
            });
        };
        if k.fehler.senden > 0 {
            k.fehler.senden -= 1;
            return Err(TransportError::SendenFehlgeschlagen {
                peer: peer.to_string(),
                grund: "simulierter Sendefehler".into(),
            });
        }
        if !k.sitzungen.contains(peer) {
            return Err(TransportError::SendenFehlgeschlagen {
                peer: peer.to_string(),
                grund: "keine Session".into(),
            });
        }
        netz.melden(
            peer,
            TransportEvent::DataReceived {
                peer: self.id.clone(),
                data,
            },
        );
        Ok(())
    }

    fn disconnect_all(&mut self) {
        let mut netz = self.netz.inner.lock();
        let partner: Vec<PeerId> = match netz.knoten.get_mut(&self.id) {
            Some(k) => {
                k.einladungen.clear();
                k.sitzungen.drain().collect()
            }
            None => return,
        };
        for p in partner {
            if let Some(k) = netz.knoten.get_mut(&p) {
                k.sitzungen.remove(&self.id);
            }
            netz.melden(
                &p,
                TransportEvent::SessionStateChanged {
                    peer: self.id.clone(),
                    state: SessionState::NotConnected,
                },
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
