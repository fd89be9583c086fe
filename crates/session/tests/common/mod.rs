//! Gemeinsame Hilfen fuer die Session-Integrationstests

use std::time::Duration;

use flurfunk_core::{Message, PeerId};
use flurfunk_observability::EventLog;
use flurfunk_session::{session_starten, MemoryNetwork, SessionConfig, SessionEvent, SessionHandle};
use tokio::sync::mpsc::UnboundedReceiver;

/// Startet einen Knoten am In-Memory-Netz
#[allow(dead_code)]
pub fn knoten(
    netz: &MemoryNetwork,
    id: &str,
    name: &str,
) -> (SessionHandle, UnboundedReceiver<SessionEvent>) {
    knoten_mit_config(netz, SessionConfig::neu(id, name))
}

#[allow(dead_code)]
pub fn knoten_mit_config(
    netz: &MemoryNetwork,
    config: SessionConfig,
) -> (SessionHandle, UnboundedReceiver<SessionEvent>) {
    let netz = netz.clone();
    let id = config.local_id.clone();
    let name = config.display_name.clone();
    session_starten(config, EventLog::neu(), move |events| {
        netz.verbinden(id, name, events)
    })
    .expect("Session sollte starten")
}

/// Wartet (virtuell max. 60 s) auf das erste passende Ereignis
pub async fn warte_auf<F>(rx: &mut UnboundedReceiver<SessionEvent>, passt: F) -> SessionEvent
where
    F: Fn(&SessionEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            match rx.recv().await {
                Some(e) if passt(&e) => return e,
                Some(_) => continue,
                None => panic!("Ereigniskanal geschlossen"),
            }
        }
    })
    .await
    .expect("Ereignis nicht eingetroffen")
}

#[allow(dead_code)]
pub async fn warte_auf_nachricht(rx: &mut UnboundedReceiver<SessionEvent>) -> Message {
    match warte_auf(rx, |e| matches!(e, SessionEvent::NachrichtEmpfangen(_))).await {
        SessionEvent::NachrichtEmpfangen(m) => m,
        andere => panic!("unerwartet: {andere:?}"),
    }
}

/// Baut Hosting/Browsing auf, verbindet und wartet auf beide Handshakes
#[allow(dead_code)]
pub async fn verbinden(
    host: &SessionHandle,
    host_events: &mut UnboundedReceiver<SessionEvent>,
    gast: &SessionHandle,
    gast_events: &mut UnboundedReceiver<SessionEvent>,
) {
    let host_id = host.local_id().clone();
    let gast_id = gast.local_id().clone();

    host.start_hosting().unwrap();
    gast.start_browsing().unwrap();
    warte_auf(gast_events, |e| {
        matches!(e, SessionEvent::PeerGefunden(p) if p.id == host_id)
    })
    .await;

    gast.invite(host_id.clone()).await.unwrap();
    warte_auf(host_events, |e| {
        matches!(e, SessionEvent::HandshakeAbgeschlossen(p) if *p == gast_id)
    })
    .await;
    warte_auf(gast_events, |e| {
        matches!(e, SessionEvent::HandshakeAbgeschlossen(p) if *p == host_id)
    })
    .await;
}

#[allow(dead_code)]
pub fn id(s: &str) -> PeerId {
    PeerId::new(s)
}
