//! Fehlertypen fuer die Session-Schicht

use flurfunk_core::FlurfunkError;
use flurfunk_crypto::CryptoError;
use flurfunk_protocol::ProtocolError;
use thiserror::Error;

/// Fehler der Transport-Schicht (Discovery, Einladung, Senden)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Advertising fehlgeschlagen: {0}")]
    AdvertisingFehlgeschlagen(String),

    #[error("Browsing fehlgeschlagen: {0}")]
    BrowsingFehlgeschlagen(String),

    #[error("Einladung an {peer} fehlgeschlagen: {grund}")]
    EinladungFehlgeschlagen { peer: String, grund: String },

    #[error("Senden an {peer} fehlgeschlagen: {grund}")]
    SendenFehlgeschlagen { peer: String, grund: String },
}

/// Fehler der Session-Schicht
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Krypto(#[from] CryptoError),

    #[error(transparent)]
    Protokoll(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Core(#[from] FlurfunkError),

    #[error("Peer nicht verbunden: {0}")]
    NichtVerbunden(String),

    #[error("Keine Peers verbunden")]
    KeinePeers,

    #[error("Clip zu lang: {dauer}s (Maximum: {maximum}s)")]
    ClipZuLang { dauer: f64, maximum: f64 },

    #[error("Peer-Limit erreicht: maximal {0} Verbindungen")]
    PeerLimitErreicht(usize),

    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    /// Der Session-Actor laeuft nicht mehr
    #[error("Session beendet")]
    Beendet,
}

impl SessionError {
    /// Gibt true zurueck wenn der Fehler beim Empfang eines Handshakes entstand
    pub fn ist_handshake_fehler(&self) -> bool {
        matches!(
            self,
            SessionError::Krypto(CryptoError::UngueltigerPublicKey(_))
                | SessionError::Krypto(CryptoError::KeyDerivation(_))
                | SessionError::Protokoll(ProtocolError::HandshakeLaenge { .. })
        )
    }

    /// Nur eine ungueltige Konfiguration ist fatal
    pub fn ist_fatal(&self) -> bool {
        matches!(self, SessionError::Konfiguration(_))
    }
}

impl From<SessionError> for FlurfunkError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Core(inner) => inner,
            SessionError::Konfiguration(msg) => FlurfunkError::Konfiguration(msg),
            SessionError::Krypto(inner) => FlurfunkError::Krypto(inner.to_string()),
            SessionError::Transport(inner) => FlurfunkError::Transport(inner.to_string()),
            SessionError::Protokoll(inner) => FlurfunkError::UngueltigeNachricht(inner.to_string()),
            andere => FlurfunkError::Intern(andere.to_string()),
        }
    }
}

/// Result-Typ fuer die Session-Schicht
pub type SessionResult<T> = Result<T, SessionError>;
