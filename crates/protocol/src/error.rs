//! Fehlertypen fuer das Peer-Protokoll

use thiserror::Error;

/// Fehler beim Kodieren oder Dekodieren von Peer-Daten
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Empfangene Bytes sind keine gueltige WireMessage
    #[error("Ungueltige WireMessage: {0}")]
    UngueltigeNachricht(String),

    /// Serialisierung einer ausgehenden Nachricht fehlgeschlagen
    #[error("Serialisierung fehlgeschlagen: {0}")]
    Serialisierung(String),

    /// Nachricht ueberschreitet die erlaubte Groesse
    #[error("Nachricht zu gross: {groesse} Bytes (Maximum: {maximum} Bytes)")]
    ZuGross { groesse: usize, maximum: usize },

    /// Leerer Frame
    #[error("Leerer Frame")]
    LeererFrame,

    /// Unbekanntes Typ-Byte im expliziten Framing
    #[error("Unbekannter Frame-Typ: 0x{0:02X}")]
    UnbekannterTyp(u8),

    /// Handshake-Frame mit falscher Laenge
    #[error("Ungueltige Handshake-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    HandshakeLaenge { erwartet: usize, erhalten: usize },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        Self::UngueltigeNachricht(e.to_string())
    }
}

/// Result-Typ fuer das Peer-Protokoll
pub type ProtocolResult<T> = Result<T, ProtocolError>;
