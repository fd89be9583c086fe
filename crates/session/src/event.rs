//! Benachrichtigungen und Snapshots fuer Konsumenten der Session

use flurfunk_core::{ConnectionStatus, Message, MessageId, Peer, PeerId};
use serde::Serialize;

use crate::role::{Rolle, RollenStatus};

/// Ereignis der Session-Schicht an ihren Konsumenten
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Genau einmal pro erfolgreich dekodierter Nachricht
    NachrichtEmpfangen(Message),
    StatusGeaendert(ConnectionStatus),
    PeerGefunden(Peer),
    PeerVerloren(PeerId),
    PeerVerbunden(Peer),
    PeerGetrennt(PeerId),
    /// Schluessel fuer einen Peer abgeleitet
    HandshakeAbgeschlossen(PeerId),
    SendenFehlgeschlagen {
        peer: PeerId,
        message_id: MessageId,
        grund: String,
    },
    /// Empfangene Bytes verworfen (kaputt, nicht entschluesselbar)
    EmpfangVerworfen { peer: PeerId, grund: String },
    /// Retry-Versuche einer Rolle erschoepft
    DiscoveryAufgegeben { rolle: Rolle, versuche: u32 },
}

/// Momentaufnahme des Session-Zustands
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub entdeckt: Vec<Peer>,
    pub verbunden: Vec<Peer>,
    pub hosting: RollenStatus,
    pub browsing: RollenStatus,
    pub peers_mit_schluessel: Vec<PeerId>,
    pub ausstehende_timer: usize,
}
