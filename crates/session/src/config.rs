//! Laufzeit-Konfiguration einer Session
//!
//! Die Werte kommen im Knoten aus der TOML-Datei, Tests bauen sie direkt.
//! `validieren()` wird vor dem Start der Session aufgerufen; ein ungueltiger
//! Service-Typ ist der einzige fatale Fehler des gesamten Systems.

use std::time::Duration;

use flurfunk_core::PeerId;
use flurfunk_crypto::DEFAULT_HKDF_SALT;
use flurfunk_observability::DEFAULT_KAPAZITAET;
use flurfunk_protocol::{FramingMode, DEFAULT_MAX_NACHRICHT_GROESSE};

use crate::error::{SessionError, SessionResult};
use crate::retry::{RetryPolicy, MAX_VERZOEGERUNG};

/// Standard-Service-Typ fuer Advertising und Browsing
pub const DEFAULT_SERVICE_TYPE: &str = "flurfunk";

/// Maximale Laenge eines Service-Typs
pub const MAX_SERVICE_TYPE_LAENGE: usize = 15;

/// Konfiguration der Session-Schicht
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Stabile Kennung dieses Knotens
    pub local_id: PeerId,
    /// Anzeigename (Absendername in Nachrichten)
    pub display_name: String,
    /// Service-Typ, 1-15 Zeichen aus [A-Za-z0-9-]
    pub service_type: String,
    /// Wartezeit zwischen Stop und Start einer Rolle
    pub settle_delay: Duration,
    pub retry: RetryPolicy,
    pub framing: FramingMode,
    /// Eingehende Einladungen automatisch annehmen
    pub auto_accept_invitations: bool,
    /// Maximale Anzahl gleichzeitig verbundener Peers
    pub max_peers: usize,
    pub invitation_timeout: Duration,
    /// Maximale Clip-Dauer in Sekunden
    pub max_clip_sekunden: f64,
    /// Maximale Groesse einer empfangenen WireMessage in Bytes
    pub max_nachricht_groesse: usize,
    pub hkdf_salt: Vec<u8>,
    pub event_log_kapazitaet: usize,
}

impl SessionConfig {
    /// Konfiguration mit Standardwerten fuer einen Knoten
    pub fn neu(local_id: impl Into<PeerId>, display_name: impl Into<String>) -> Self {
        Self {
            local_id: local_id.into(),
            display_name: display_name.into(),
            service_type: DEFAULT_SERVICE_TYPE.to_string(),
            settle_delay: Duration::from_secs(3),
            retry: RetryPolicy::default(),
            framing: FramingMode::default(),
            auto_accept_invitations: true,
            max_peers: 8,
            invitation_timeout: Duration::from_secs(30),
            max_clip_sekunden: 300.0,
            max_nachricht_groesse: DEFAULT_MAX_NACHRICHT_GROESSE,
            hkdf_salt: DEFAULT_HKDF_SALT.to_vec(),
            event_log_kapazitaet: DEFAULT_KAPAZITAET,
        }
    }

    /// Prueft die statische Konfiguration
    pub fn validieren(&self) -> SessionResult<()> {
        if !service_type_gueltig(&self.service_type) {
            return Err(SessionError::Konfiguration(format!(
                "Ungueltiger Service-Typ '{}': erlaubt sind 1-{} Zeichen aus [A-Za-z0-9-]",
                self.service_type, MAX_SERVICE_TYPE_LAENGE
            )));
        }
        if self.local_id.as_str().is_empty() {
            return Err(SessionError::Konfiguration("Leere Knoten-ID".into()));
        }
        if self.display_name.trim().is_empty() {
            return Err(SessionError::Konfiguration("Leerer Anzeigename".into()));
        }
        if self.max_peers == 0 {
            return Err(SessionError::Konfiguration("max_peers muss mindestens 1 sein".into()));
        }
        if !self.max_clip_sekunden.is_finite() || self.max_clip_sekunden <= 0.0 {
            return Err(SessionError::Konfiguration(format!(
                "Ungueltige maximale Clip-Dauer: {}",
                self.max_clip_sekunden
            )));
        }
        if self.retry.faktor == 0 {
            return Err(SessionError::Konfiguration("Retry-Faktor muss mindestens 1 sein".into()));
        }
        for (name, wert) in [
            ("settle_delay", self.settle_delay),
            ("invitation_timeout", self.invitation_timeout),
            ("retry_verzoegerung", self.retry.retry_verzoegerung),
            ("neustart_verzoegerung", self.retry.neustart_verzoegerung),
        ] {
            if wert > MAX_VERZOEGERUNG {
                return Err(SessionError::Konfiguration(format!(
                    "{name} zu gross: {} s (maximal {} s)",
                    wert.as_secs(),
                    MAX_VERZOEGERUNG.as_secs()
                )));
            }
        }
        Ok(())
    }
}

/// Service-Typ: 1-15 Zeichen, nur ASCII-Buchstaben, Ziffern und Bindestrich
pub fn service_type_gueltig(service_type: &str) -> bool {
    (1..=MAX_SERVICE_TYPE_LAENGE).contains(&service_type.len())
        && service_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardwerte() {
        let c = SessionConfig::neu("geraet-1", "Alice");
        assert_eq!(c.settle_delay, Duration::from_secs(3));
        assert_eq!(c.max_peers, 8);
        assert_eq!(c.invitation_timeout, Duration::from_secs(30));
        assert_eq!(c.max_clip_sekunden, 300.0);
        assert!(c.auto_accept_invitations);
        assert_eq!(c.framing, FramingMode::LengthDiscriminated);
        assert!(c.validieren().is_ok());
    }

    #[test]
    fn service_typ_regeln() {
        assert!(service_type_gueltig("flurfunk"));
        assert!(service_type_gueltig("a"));
        assert!(service_type_gueltig("abc-123-XYZ-def"));
        assert!(!service_type_gueltig(""));
        assert!(!service_type_gueltig("sechzehn-zeichen"));
        assert!(!service_type_gueltig("mit_unterstrich"));
        assert!(!service_type_gueltig("leer zeichen"));
        assert!(!service_type_gueltig("umlaut-ä"));
    }

    #[test]
    fn ungueltiger_service_typ_ist_fatal() {
        let mut c = SessionConfig::neu("geraet-1", "Alice");
        c.service_type = "viel-zu-langer-service".into();
        let err = c.validieren().unwrap_err();
        assert!(err.ist_fatal());
    }

    #[test]
    fn weitere_pruefungen() {
        let mut c = SessionConfig::neu("geraet-1", "Alice");
        c.max_peers = 0;
        assert!(c.validieren().is_err());

        let mut c = SessionConfig::neu("geraet-1", "  ");
        assert!(c.validieren().is_err());
        c.display_name = "Bob".into();
        c.max_clip_sekunden = f64::NAN;
        assert!(c.validieren().is_err());
    }

    #[test]
    fn zu_grosse_verzoegerungen_werden_abgelehnt() {
        let mut c = SessionConfig::neu("geraet-1", "Alice");
        c.retry.retry_verzoegerung = MAX_VERZOEGERUNG;
        assert!(c.validieren().is_ok());

        c.retry.retry_verzoegerung = Duration::from_secs(u64::MAX);
        assert!(matches!(c.validieren(), Err(SessionError::Konfiguration(_))));

        let mut c = SessionConfig::neu("geraet-1", "Alice");
        c.settle_delay = MAX_VERZOEGERUNG + Duration::from_secs(1);
        assert!(c.validieren().is_err());

        let mut c = SessionConfig::neu("geraet-1", "Alice");
        c.retry.neustart_verzoegerung = Duration::MAX;
        assert!(c.validieren().is_err());
    }
}
