//! flurfunk-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die fundamentalen Bausteine bereit, die von allen
//! anderen Flurfunk-Crates gemeinsam genutzt werden: Peer-Identitaeten,
//! die logische Sprachnachricht und den globalen Verbindungsstatus.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{FlurfunkError, Result};
pub use types::{ConnectionStatus, Message, MessageId, Peer, PeerConnectionState, PeerId};
