//! Fehlertypen fuer Flurfunk
//!
//! Zentraler Fehler-Enum fuer Zustaende, die keinem einzelnen Subsystem
//! gehoeren. Untermodule definieren eigene Fehler und konvertieren via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer Flurfunk
pub type Result<T> = std::result::Result<T, FlurfunkError>;

/// Alle uebergreifenden Fehler im Flurfunk-System
#[derive(Debug, Error)]
pub enum FlurfunkError {
    // --- Transport ---
    #[error("Transportfehler: {0}")]
    Transport(String),

    // --- Kryptografie ---
    #[error("Kryptografiefehler: {0}")]
    Krypto(String),

    // --- Protokoll ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Ungueltige Clip-Dauer: {0}")]
    UngueltigeDauer(f64),

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),
}

impl FlurfunkError {
    /// Gibt true zurueck wenn der Fehler den Prozess beenden muss
    ///
    /// Nur eine ungueltige statische Konfiguration ist fatal, alle Fehler
    /// aus dem Peer-Verkehr werden pro Nachricht oder pro Peer isoliert.
    pub fn ist_fatal(&self) -> bool {
        matches!(self, Self::Konfiguration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = FlurfunkError::Transport("Advertising abgelehnt".into());
        assert_eq!(e.to_string(), "Transportfehler: Advertising abgelehnt");
    }

    #[test]
    fn nur_konfiguration_ist_fatal() {
        assert!(FlurfunkError::Konfiguration("service_type".into()).ist_fatal());
        assert!(!FlurfunkError::Krypto("tag".into()).ist_fatal());
        assert!(!FlurfunkError::UngueltigeNachricht("json".into()).ist_fatal());
    }
}
