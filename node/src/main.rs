//! Flurfunk Knoten – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Knoten.

use anyhow::Result;
use flurfunk_node::{config::NodeConfig, Knoten};
use flurfunk_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> Result<()> {
    let config_pfad = NodeConfig::pfad_aus_env();

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = NodeConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Flurfunk Knoten wird initialisiert"
    );

    Knoten::neu(config).starten().await?;

    Ok(())
}
