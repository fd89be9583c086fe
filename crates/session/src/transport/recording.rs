//! Aufzeichnender Transport fuer Tests der Zustandsmaschine
//!
//! Fuehrt nichts aus, merkt sich nur jeden Aufruf. Klone teilen die
//! Aufzeichnung, ein Test behaelt also einen Klon waehrend der Core den
//! anderen besitzt.

use std::sync::Arc;
use std::time::Duration;

use flurfunk_core::PeerId;
use parking_lot::Mutex;

use crate::error::TransportError;
use crate::transport::Transport;

/// Ein aufgezeichneter Transport-Aufruf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportAufruf {
    StartAdvertising,
    StopAdvertising,
    StartBrowsing,
    StopBrowsing,
    Invite { peer: PeerId, timeout: Duration },
    AcceptInvitation { peer: PeerId, accept: bool },
    SendReliable { peer: PeerId, data: Vec<u8> },
    DisconnectAll,
}

#[derive(Debug, Default)]
struct Inner {
    aufrufe: Vec<TransportAufruf>,
    senden_schlaegt_fehl: bool,
    einladen_schlaegt_fehl: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingTransport {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn aufrufe(&self) -> Vec<TransportAufruf> {
        self.inner.lock().aufrufe.clone()
    }

    /// Gibt die bisherigen Aufrufe zurueck und leert die Aufzeichnung
    pub fn abholen(&self) -> Vec<TransportAufruf> {
        std::mem::take(&mut self.inner.lock().aufrufe)
    }

    /// Alle an `peer` gesendeten Byte-Bloecke
    pub fn gesendet_an(&self, peer: &PeerId) -> Vec<Vec<u8>> {
        self.inner
            .lock()
            .aufrufe
            .iter()
            .filter_map(|a| match a {
                TransportAufruf::SendReliable { peer: p, data } if p == peer => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn senden_schlaegt_fehl(&self, fehler: bool) {
        self.inner.lock().senden_schlaegt_fehl = fehler;
    }

    pub fn einladen_schlaegt_fehl(&self, fehler: bool) {
        self.inner.lock().einladen_schlaegt_fehl = fehler;
    }

    fn aufzeichnen(&self, aufruf: TransportAufruf) {
        self.inner.lock().aufrufe.push(aufruf);
    }
}

impl Transport for RecordingTransport {
    fn start_advertising(&mut self) {
        self.aufzeichnen(TransportAufruf::StartAdvertising);
    }

    fn stop_advertising(&mut self) {
        self.aufzeichnen(TransportAufruf::StopAdvertising);
    }

    fn start_browsing(&mut self) {
        self.aufzeichnen(TransportAufruf::StartBrowsing);
    }

    fn stop_browsing(&mut self) {
        self.aufzeichnen(TransportAufruf::StopBrowsing);
    }

    fn invite(&mut self, peer: &PeerId, timeout: Duration) -> Result<(), TransportError> {
        self.aufzeichnen(TransportAufruf::Invite {
            peer: peer.clone(),
            timeout,
        });
        if self.inner.lock().einladen_schlaegt_fehl {
            return Err(TransportError::EinladungFehlgeschlagen {
                peer: peer.to_string(),
                grund: "simuliert".into(),
            });
        }
        Ok(())
    }

    fn accept_invitation(&mut self, peer: &PeerId, accept: bool) {
        self.aufzeichnen(TransportAufruf::AcceptInvitation {
            peer: peer.clone(),
            accept,
        });
    }

    fn send_reliable(&mut self, peer: &PeerId, data: Vec<u8>) -> Result<(), TransportError> {
        self.aufzeichnen(TransportAufruf::SendReliable {
            peer: peer.clone(),
            data,
        });
        if self.inner.lock().senden_schlaegt_fehl {
            return Err(TransportError::SendenFehlgeschlagen {
                peer: peer.to_string(),
                grund: "simuliert".into(),
            });
        }
        Ok(())
    }

    fn disconnect_all(&mut self) {
        self.aufzeichnen(TransportAufruf::DisconnectAll);
    }
}
