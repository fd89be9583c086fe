//! Knoten-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Knoten ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use flurfunk_observability::{log_format_gueltig, log_level_gueltig};
use flurfunk_protocol::FramingMode;
use flurfunk_session::{
    RetryPolicy, SessionConfig, SessionError, SessionResult, DEFAULT_SERVICE_TYPE,
};
use serde::{Deserialize, Serialize};

/// Umgebungsvariable mit dem Pfad zur Konfigurationsdatei
pub const ENV_CONFIG: &str = "FLURFUNK_CONFIG";

/// Standardpfad der Konfigurationsdatei
pub const DEFAULT_CONFIG_PFAD: &str = "flurfunk.toml";

/// Vollstaendige Knoten-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Identitaet des Knotens
    pub knoten: KnotenEinstellungen,
    /// Discovery, Einladungen und Retry
    pub discovery: DiscoveryEinstellungen,
    /// Schluesselableitung, Framing und Limits
    pub sicherheit: SicherheitsEinstellungen,
    pub logging: LoggingEinstellungen,
}

/// Identitaet des Knotens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnotenEinstellungen {
    /// Stabile Kennung, unabhaengig vom Anzeigenamen
    pub id: String,
    /// Anzeigename fuer andere Peers
    pub name: String,
}

impl Default for KnotenEinstellungen {
    fn default() -> Self {
        Self {
            id: "flurfunk-knoten".into(),
            name: "Flurfunk".into(),
        }
    }
}

/// Discovery-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryEinstellungen {
    /// Service-Typ, 1-15 Zeichen aus [A-Za-z0-9-]
    pub service_type: String,
    /// Wartezeit zwischen Stop und Start einer Rolle in ms
    pub settle_delay_ms: u64,
    /// Anzahl Retries nach einem Discovery-Fehler
    pub retry_max_versuche: u32,
    pub retry_verzoegerung_ms: u64,
    pub retry_faktor: u32,
    pub neustart_verzoegerung_ms: u64,
    /// Eingehende Einladungen automatisch annehmen
    pub auto_accept: bool,
    pub max_peers: usize,
    pub einladung_timeout_s: u64,
}

impl Default for DiscoveryEinstellungen {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            service_type: DEFAULT_SERVICE_TYPE.into(),
            settle_delay_ms: 3000,
            retry_max_versuche: retry.max_versuche,
            retry_verzoegerung_ms: retry.retry_verzoegerung.as_millis() as u64,
            retry_faktor: retry.faktor,
            neustart_verzoegerung_ms: retry.neustart_verzoegerung.as_millis() as u64,
            auto_accept: true,
            max_peers: 8,
            einladung_timeout_s: 30,
        }
    }
}

/// Sicherheits- und Protokoll-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SicherheitsEinstellungen {
    /// "length_discriminated" (Standard) oder "tagged"
    pub framing: FramingMode,
    /// Salt der Schluesselableitung, muss auf allen Geraeten gleich sein
    pub hkdf_salt: String,
    pub max_clip_sekunden: f64,
    /// Maximale Groesse einer empfangenen Nachricht in Bytes
    pub max_nachricht_groesse: usize,
}

impl Default for SicherheitsEinstellungen {
    fn default() -> Self {
        Self {
            framing: FramingMode::default(),
            hkdf_salt: "Flurfunk".into(),
            max_clip_sekunden: 300.0,
            max_nachricht_groesse: flurfunk_protocol::DEFAULT_MAX_NACHRICHT_GROESSE,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
    /// Kapazitaet des Debug-Ereignisprotokolls
    pub event_log_kapazitaet: usize,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
            event_log_kapazitaet: flurfunk_observability::DEFAULT_KAPAZITAET,
        }
    }
}

impl LoggingEinstellungen {
    /// Prueft Level und Format, bevor das Logging damit initialisiert wird
    pub fn pruefen(&self) -> SessionResult<()> {
        if !log_level_gueltig(&self.level) {
            return Err(SessionError::Konfiguration(format!(
                "Ungueltiger Log-Level '{}': erlaubt sind trace, debug, info, warn, error",
                self.level
            )));
        }
        if !log_format_gueltig(&self.format) {
            return Err(SessionError::Konfiguration(format!(
                "Ungueltiges Log-Format '{}': erlaubt sind text, json",
                self.format
            )));
        }
        Ok(())
    }
}

impl NodeConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                config
                    .logging
                    .pruefen()
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Pfad aus `FLURFUNK_CONFIG`, sonst `flurfunk.toml`
    pub fn pfad_aus_env() -> String {
        std::env::var(ENV_CONFIG).unwrap_or_else(|_| DEFAULT_CONFIG_PFAD.into())
    }

    /// Session-Konfiguration fuer diesen Knoten, bereits validiert
    pub fn session_config(&self) -> SessionResult<SessionConfig> {
        self.session_config_fuer(&self.knoten.id, &self.knoten.name)
    }

    /// Wie `session_config`, aber mit abweichender Identitaet
    pub fn session_config_fuer(&self, id: &str, name: &str) -> SessionResult<SessionConfig> {
        self.logging.pruefen()?;
        let d = &self.discovery;
        let s = &self.sicherheit;

        let mut config = SessionConfig::neu(id, name);
        config.service_type = d.service_type.clone();
        config.settle_delay = Duration::from_millis(d.settle_delay_ms);
        config.retry = RetryPolicy {
            max_versuche: d.retry_max_versuche,
            retry_verzoegerung: Duration::from_millis(d.retry_verzoegerung_ms),
            faktor: d.retry_faktor,
            neustart_verzoegerung: Duration::from_millis(d.neustart_verzoegerung_ms),
        };
        config.auto_accept_invitations = d.auto_accept;
        config.max_peers = d.max_peers;
        config.invitation_timeout = Duration::from_secs(d.einladung_timeout_s);
        config.framing = s.framing;
        config.hkdf_salt = s.hkdf_salt.as_bytes().to_vec();
        config.max_clip_sekunden = s.max_clip_sekunden;
        config.max_nachricht_groesse = s.max_nachricht_groesse;
        config.event_log_kapazitaet = self.logging.event_log_kapazitaet;

        config.validieren()?;
        Ok(config)
    }
}
