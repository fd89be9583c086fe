//! Grenze zum Discovery- und Verbindungs-Transport
//!
//! Der Transport ist ein externer Kollaborateur: Aufrufe sind nicht
//! blockierende Anfragen, Ergebnisse kommen spaeter als `TransportEvent`
//! ueber den `TransportEventSender` zurueck. Nur `invite` und
//! `send_reliable` melden einen sofortigen Fehlschlag.

pub mod memory;
pub mod recording;

use std::sync::Arc;
use std::time::Duration;

use flurfunk_core::PeerId;
use tokio::sync::mpsc;

use crate::error::TransportError;

pub use memory::{MemoryNetwork, MemoryTransport};
pub use recording::{RecordingTransport, TransportAufruf};

/// Verbindungszustand einer Transport-Session mit einem Peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotConnected,
    Connecting,
    Connected,
}

/// Ereignisse, die der Transport an die Session meldet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    PeerFound { peer: PeerId, display_name: String },
    PeerLost { peer: PeerId },
    SessionStateChanged { peer: PeerId, state: SessionState },
    DataReceived { peer: PeerId, data: Vec<u8> },
    InvitationReceived { peer: PeerId, display_name: String },
    AdvertisingFailed { fehler: TransportError },
    BrowsingFailed { fehler: TransportError },
}

/// Vom Core benoetigte Transport-Operationen
pub trait Transport {
    fn start_advertising(&mut self);
    fn stop_advertising(&mut self);
    fn start_browsing(&mut self);
    fn stop_browsing(&mut self);

    /// Laedt einen entdeckten Peer in eine Session ein
    fn invite(&mut self, peer: &PeerId, timeout: Duration) -> Result<(), TransportError>;

    /// Beantwortet eine eingegangene Einladung
    fn accept_invitation(&mut self, peer: &PeerId, accept: bool);

    /// Zuverlaessige Zustellung an genau einen Peer (atomar pro Aufruf)
    fn send_reliable(&mut self, peer: &PeerId, data: Vec<u8>) -> Result<(), TransportError>;

    /// Beendet alle Sessions
    fn disconnect_all(&mut self);
}

/// Rueckkanal vom Transport zur Session
///
/// Klonbar, von beliebigen Threads nutzbar. `send` liefert false wenn die
/// Session nicht mehr existiert.
#[derive(Clone)]
pub struct TransportEventSender {
    senden: Arc<dyn Fn(TransportEvent) -> bool + Send + Sync>,
}

impl TransportEventSender {
    pub fn neu<F>(senden: F) -> Self
    where
        F: Fn(TransportEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            senden: Arc::new(senden),
        }
    }

    /// Sender mit eigenem Kanal (fuer Transport-Tests ohne Session)
    pub fn kanal() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::neu(move |ev| tx.send(ev).is_ok()), rx)
    }

    pub fn send(&self, event: TransportEvent) -> bool {
        (self.senden)(event)
    }
}

impl std::fmt::Debug for TransportEventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportEventSender").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kanal_leitet_weiter() {
        let (sender, mut rx) = TransportEventSender::kanal();
        assert!(sender.send(TransportEvent::PeerLost {
            peer: PeerId::new("p1")
        }));
        assert_eq!(
            rx.try_recv().unwrap(),
            TransportEvent::PeerLost {
                peer: PeerId::new("p1")
            }
        );

        drop(rx);
        assert!(!sender.send(TransportEvent::AdvertisingFailed {
            fehler: TransportError::AdvertisingFehlgeschlagen("x".into()),
        }));
    }
}
