//! Loopback-Demo
//!
//! Zwei Knoten am selben `MemoryNetwork`: der konfigurierte Knoten hostet,
//! ein Gast-Knoten sucht ihn, laedt ihn ein und schickt nach dem
//! automatischen Handshake einen verschluesselten Clip.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use flurfunk_core::{ConnectionStatus, Message, PeerId};
use flurfunk_observability::EventLog;
use flurfunk_session::{
    session_starten, MemoryNetwork, SessionConfig, SessionEvent, SessionHandle,
};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::config::NodeConfig;

/// Wartezeit pro Schritt der Demo
pub const SCHRITT_TIMEOUT: Duration = Duration::from_secs(60);

/// Ergebnis eines Demo-Durchlaufs
#[derive(Debug, Clone)]
pub struct DemoErgebnis {
    pub gesendet: Message,
    pub empfangen: Message,
    /// Status des Hosts waehrend der Verbindung
    pub host_status: ConnectionStatus,
    pub host_log: EventLog,
    pub gast_log: EventLog,
}

type Ereignisse = UnboundedReceiver<SessionEvent>;

/// Fuehrt die Demo einmal vollstaendig aus
pub async fn loopback_ausfuehren(config: &NodeConfig) -> Result<DemoErgebnis> {
    let netz = MemoryNetwork::neu();

    let host_config = config.session_config()?;
    let gast_id = format!("{}-gast", config.knoten.id);
    let gast_config = config.session_config_fuer(&gast_id, "Gast")?;

    let (host, mut host_events) = knoten_starten(&netz, host_config)?;
    let (gast, mut gast_events) = knoten_starten(&netz, gast_config)?;

    host.start_hosting()?;
    gast.start_browsing()?;

    let host_id = host.local_id().clone();
    warte_auf(&mut gast_events, "Host gefunden", |e| {
        matches!(e, SessionEvent::PeerGefunden(p) if p.id == host_id)
    })
    .await?;

    gast.invite(host_id.clone()).await?;
    let gast_id = gast.local_id().clone();
    warte_auf(&mut host_events, "Handshake beim Host", |e| {
        *e == SessionEvent::HandshakeAbgeschlossen(gast_id.clone())
    })
    .await?;
    warte_auf(&mut gast_events, "Handshake beim Gast", |e| {
        *e == SessionEvent::HandshakeAbgeschlossen(host_id.clone())
    })
    .await?;

    let gesendet = gast.clip_senden(clip_erzeugen(4096), 1.5).await?;
    tracing::info!(id = %gesendet.id(), bytes = gesendet.payload().len(), "Clip gesendet");

    let empfangen = match warte_auf(&mut host_events, "Clip beim Host", |e| {
        matches!(e, SessionEvent::NachrichtEmpfangen(_))
    })
    .await?
    {
        SessionEvent::NachrichtEmpfangen(m) => m,
        andere => bail!("Unerwartetes Ereignis: {andere:?}"),
    };
    if empfangen.payload() != gesendet.payload() {
        bail!("Clip unterscheidet sich nach der Uebertragung");
    }
    tracing::info!(
        id = %empfangen.id(),
        von = %empfangen.sender_name(),
        dauer_s = empfangen.duration_seconds(),
        "Clip empfangen"
    );

    let host_status = host.snapshot().await?.status;

    gast.disconnect().await?;
    host.disconnect().await?;
    let host_log = host.event_log().clone();
    let gast_log = gast.event_log().clone();
    host.beenden()?;
    gast.beenden()?;

    Ok(DemoErgebnis {
        gesendet,
        empfangen,
        host_status,
        host_log,
        gast_log,
    })
}

fn knoten_starten(netz: &MemoryNetwork, session: SessionConfig) -> Result<(SessionHandle, Ereignisse)> {
    let log = EventLog::mit_kapazitaet(session.event_log_kapazitaet);
    let netz = netz.clone();
    let id: PeerId = session.local_id.clone();
    let name = session.display_name.clone();
    let gestartet = session_starten(session, log, move |events| netz.verbinden(id, name, events))?;
    Ok(gestartet)
}

async fn warte_auf<F>(rx: &mut Ereignisse, schritt: &str, passt: F) -> Result<SessionEvent>
where
    F: Fn(&SessionEvent) -> bool,
{
    let ergebnis = tokio::time::timeout(SCHRITT_TIMEOUT, async {
        while let Some(e) = rx.recv().await {
            tracing::debug!(schritt, ereignis = ?e, "Session-Ereignis");
            if passt(&e) {
                return Some(e);
            }
        }
        None
    })
    .await
    .with_context(|| format!("Zeitueberschreitung bei '{schritt}'"))?;

    ergebnis.with_context(|| format!("Session beendet vor '{schritt}'"))
}

/// Pseudo-Audiodaten fuer die Demo
fn clip_erzeugen(laenge: usize) -> Vec<u8> {
    (0..laenge).map(|i| (i % 251) as u8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flurfunk_observability::EventKategorie;

    #[tokio::test(start_paused = true)]
    async fn demo_laeuft_durch() {
        let ergebnis = loopback_ausfuehren(&NodeConfig::default()).await.unwrap();
        assert_eq!(ergebnis.empfangen.id(), ergebnis.gesendet.id());
        assert_eq!(ergebnis.empfangen.sender_name(), "Gast");
        assert_eq!(ergebnis.host_status, ConnectionStatus::Connected);
        assert!(!ergebnis.host_log.nach_kategorie(EventKategorie::Handshake).is_empty());
        assert!(!ergebnis.gast_log.nach_kategorie(EventKategorie::Send).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn demo_mit_tagged_framing() {
        let mut config = NodeConfig::default();
        config.sicherheit.framing = flurfunk_protocol::FramingMode::Tagged;
        let ergebnis = loopback_ausfuehren(&config).await.unwrap();
        assert_eq!(ergebnis.empfangen.payload(), ergebnis.gesendet.payload());
    }

    #[tokio::test]
    async fn ungueltige_konfiguration_bricht_ab() {
        let mut config = NodeConfig::default();
        config.discovery.service_type = String::new();
        assert!(loopback_ausfuehren(&config).await.is_err());
    }

    #[test]
    fn clip_hat_gewuenschte_laenge() {
        assert_eq!(clip_erzeugen(10).len(), 10);
        assert_eq!(clip_erzeugen(300)[251], 0);
    }
}
