//! flurfunk-node – Bibliotheks-Root
//!
//! Deklariert die Knoten-Module und stellt den oeffentlichen Einstiegspunkt
//! fuer Tests bereit.

pub mod config;
pub mod demo;

use anyhow::Result;
use config::NodeConfig;

/// Haelt den Knoten-Zustand zusammen
pub struct Knoten {
    pub config: NodeConfig,
}

impl Knoten {
    /// Erstellt einen neuen Knoten aus der gegebenen Konfiguration
    pub fn neu(config: NodeConfig) -> Self {
        Self { config }
    }

    /// Prueft die Konfiguration und fuehrt die Loopback-Demo aus
    ///
    /// Bricht ab, sobald Ctrl-C empfangen wird.
    pub async fn starten(self) -> Result<()> {
        // Ungueltige Konfiguration ist der einzige fatale Fehler
        self.config.session_config()?;

        tracing::info!(
            knoten = %self.config.knoten.id,
            name = %self.config.knoten.name,
            service = %self.config.discovery.service_type,
            framing = %self.config.sicherheit.framing,
            "Knoten startet"
        );

        tokio::select! {
            ergebnis = demo::loopback_ausfuehren(&self.config) => {
                let ergebnis = ergebnis?;
                tracing::info!(
                    id = %ergebnis.empfangen.id(),
                    bytes = ergebnis.empfangen.payload().len(),
                    host_eintraege = ergebnis.host_log.len(),
                    gast_eintraege = ergebnis.gast_log.len(),
                    "Loopback-Demo abgeschlossen"
                );
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen, Knoten wird beendet");
            }
        }

        Ok(())
    }
}
