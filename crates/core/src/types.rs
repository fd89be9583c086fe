//! Gemeinsame Typen fuer Flurfunk
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Peer-Kennungen, Anzeigenamen und Nachrichten-IDs zur Compilezeit
//! auszuschliessen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FlurfunkError, Result};

// ---------------------------------------------------------------------------
// PeerId
// ---------------------------------------------------------------------------

/// Stabile, opake Kennung eines Peers im Mesh
///
/// Wird vom Transport vergeben und ist vom (veraenderlichen) Anzeigenamen
/// entkoppelt. Peers werden ausschliesslich ueber diese Kennung verglichen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// MessageId
// ---------------------------------------------------------------------------

/// Eindeutige Nachrichten-ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    /// Erstellt eine neue zufaellige MessageId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Peer
// ---------------------------------------------------------------------------

/// Verbindungszustand eines einzelnen Peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerConnectionState {
    Discovered,
    Connecting,
    Connected,
    Lost,
}

/// Ein Geraet im Mesh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    pub id: PeerId,
    pub display_name: String,
    pub state: PeerConnectionState,
}

impl Peer {
    pub fn neu(id: PeerId, display_name: impl Into<String>, state: PeerConnectionState) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            state,
        }
    }
}

// Gleichheit nur ueber die Kennung, nicht ueber Name oder Zustand
impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Peer {}

impl std::hash::Hash for Peer {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

// ---------------------------------------------------------------------------
// ConnectionStatus
// ---------------------------------------------------------------------------

/// Globaler Status der Session-Schicht
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    /// Advertising aktiv
    Hosting,
    /// Browsing aktiv
    Browsing,
    /// Mindestens eine Peer-Session aktiv
    Connected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Hosting => write!(f, "hosting"),
            ConnectionStatus::Browsing => write!(f, "browsing"),
            ConnectionStatus::Connected => write!(f, "connected"),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Eine Sprachnachricht (logisches Domaenenobjekt)
///
/// Der Payload ist ein opaker Audio-Clip. Nach der Konstruktion unveraenderlich.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    id: MessageId,
    sender_id: PeerId,
    sender_name: String,
    timestamp: DateTime<Utc>,
    payload: Vec<u8>,
    duration_seconds: f64,
}

impl Message {
    /// Erstellt eine lokal verfasste Nachricht mit neuer ID und aktuellem Zeitstempel
    pub fn neu(
        sender_id: PeerId,
        sender_name: impl Into<String>,
        payload: Vec<u8>,
        duration_seconds: f64,
    ) -> Result<Self> {
        Self::rekonstruieren(
            MessageId::new(),
            sender_id,
            sender_name,
            Utc::now(),
            payload,
            duration_seconds,
        )
    }

    /// Setzt eine Nachricht aus empfangenen Einzelteilen zusammen
    pub fn rekonstruieren(
        id: MessageId,
        sender_id: PeerId,
        sender_name: impl Into<String>,
        timestamp: DateTime<Utc>,
        payload: Vec<u8>,
        duration_seconds: f64,
    ) -> Result<Self> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(FlurfunkError::UngueltigeDauer(duration_seconds));
        }
        Ok(Self {
            id,
            sender_id,
            sender_name: sender_name.into(),
            timestamp,
            payload,
            duration_seconds,
        })
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn sender_id(&self) -> &PeerId {
        &self.sender_id
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}
