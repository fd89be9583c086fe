//! Session-Actor
//!
//! Ein Tokio-Task besitzt den `SessionCore`. API-Befehle und
//! Transport-Ereignisse kommen ueber denselben Kanal an und werden strikt
//! nacheinander verarbeitet. Zwischen zwei Eingaben schlaeft der Actor bis
//! zur naechsten Timer-Deadline.
//!
//! ```text
//! SessionHandle ---Befehl---+
//!                           +--> mpsc --> Actor(SessionCore) --> SessionEvent
//! Transport ----Ereignis----+
//! ```

use std::time::Instant;

use flurfunk_core::{Message, PeerId};
use flurfunk_observability::EventLog;
use tokio::sync::{mpsc, oneshot};

use crate::clock::{Clock, TokioClock};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::event::{SessionEvent, SessionSnapshot};
use crate::state::SessionCore;
use crate::transport::{Transport, TransportEvent, TransportEventSender};

/// API-Befehle an den Actor
#[derive(Debug)]
enum Befehl {
    StartHosting,
    StopHosting,
    StartBrowsing,
    StopBrowsing,
    Einladen {
        peer: PeerId,
        antwort: oneshot::Sender<SessionResult<()>>,
    },
    Senden {
        peer: PeerId,
        message: Message,
        antwort: oneshot::Sender<SessionResult<()>>,
    },
    ClipSenden {
        payload: Vec<u8>,
        dauer: f64,
        antwort: oneshot::Sender<SessionResult<Message>>,
    },
    Snapshot {
        antwort: oneshot::Sender<SessionSnapshot>,
    },
    Trennen {
        antwort: oneshot::Sender<()>,
    },
    Beenden,
}

/// Einzige Eingangsquelle des Actors
#[derive(Debug)]
enum Eingang {
    Befehl(Befehl),
    Transport(TransportEvent),
}

/// Klonbarer Zugriff auf eine laufende Session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Eingang>,
    local_id: PeerId,
    event_log: EventLog,
}

impl SessionHandle {
    pub fn local_id(&self) -> &PeerId {
        &self.local_id
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn start_hosting(&self) -> SessionResult<()> {
        self.senden(Befehl::StartHosting)
    }

    pub fn stop_hosting(&self) -> SessionResult<()> {
        self.senden(Befehl::StopHosting)
    }

    pub fn start_browsing(&self) -> SessionResult<()> {
        self.senden(Befehl::StartBrowsing)
    }

    pub fn stop_browsing(&self) -> SessionResult<()> {
        self.senden(Befehl::StopBrowsing)
    }

    pub async fn invite(&self, peer: PeerId) -> SessionResult<()> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::Einladen { peer, antwort })?;
        rx.await.map_err(|_| SessionError::Beendet)?
    }

    /// Sendet eine fertige Nachricht an genau einen Peer
    pub async fn send(&self, peer: PeerId, message: Message) -> SessionResult<()> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::Senden {
            peer,
            message,
            antwort,
        })?;
        rx.await.map_err(|_| SessionError::Beendet)?
    }

    /// Sendet einen Clip an alle verbundenen Peers
    pub async fn clip_senden(&self, payload: Vec<u8>, dauer: f64) -> SessionResult<Message> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::ClipSenden {
            payload,
            dauer,
            antwort,
        })?;
        rx.await.map_err(|_| SessionError::Beendet)?
    }

    pub async fn snapshot(&self) -> SessionResult<SessionSnapshot> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::Snapshot { antwort })?;
        rx.await.map_err(|_| SessionError::Beendet)
    }

    /// Setzt die Session zurueck und wartet bis der Actor fertig ist
    pub async fn disconnect(&self) -> SessionResult<()> {
        let (antwort, rx) = oneshot::channel();
        self.senden(Befehl::Trennen { antwort })?;
        rx.await.map_err(|_| SessionError::Beendet)
    }

    /// Trennt und beendet den Actor-Task
    pub fn beenden(&self) -> SessionResult<()> {
        self.senden(Befehl::Beenden)
    }

    fn senden(&self, befehl: Befehl) -> SessionResult<()> {
        self.tx
            .send(Eingang::Befehl(befehl))
            .map_err(|_| SessionError::Beendet)
    }
}

/// Startet eine Session auf der aktuellen Tokio-Runtime
///
/// `transport_bauen` erhaelt den Rueckkanal fuer Transport-Ereignisse. Der
/// Rueckkanal haelt den Actor nicht am Leben: sind alle Handles weg, baut
/// der Actor die Session ab und endet.
pub fn session_starten<T, F>(
    config: SessionConfig,
    event_log: EventLog,
    transport_bauen: F,
) -> SessionResult<(SessionHandle, mpsc::UnboundedReceiver<SessionEvent>)>
where
    T: Transport + Send + 'static,
    F: FnOnce(TransportEventSender) -> T,
{
    config.validieren()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let schwach = tx.downgrade();
    let rueckkanal = TransportEventSender::neu(move |event| match schwach.upgrade() {
        Some(tx) => tx.send(Eingang::Transport(event)).is_ok(),
        None => false,
    });

    let transport = transport_bauen(rueckkanal);
    let local_id = config.local_id.clone();
    let core = SessionCore::neu(config, transport, TokioClock, event_log.clone())?;

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    tokio::spawn(ausfuehren(core, rx, event_tx));

    tracing::info!(knoten = %local_id, "Session-Actor gestartet");
    Ok((
        SessionHandle {
            tx,
            local_id,
            event_log,
        },
        event_rx,
    ))
}

async fn ausfuehren<T, C>(
    mut core: SessionCore<T, C>,
    mut rx: mpsc::UnboundedReceiver<Eingang>,
    events: mpsc::UnboundedSender<SessionEvent>,
) where
    T: Transport,
    C: Clock,
{
    loop {
        weiterleiten(&mut core, &events);
        let deadline = core.naechste_deadline();

        tokio::select! {
            eingang = rx.recv() => match eingang {
                Some(Eingang::Transport(event)) => core.transport_ereignis(event),
                Some(Eingang::Befehl(Befehl::Beenden)) | None => {
                    core.disconnect();
                    weiterleiten(&mut core, &events);
                    break;
                }
                Some(Eingang::Befehl(befehl)) => befehl_ausfuehren(&mut core, befehl),
            },
            _ = schlafen_bis(deadline) => {
                core.timer_verarbeiten();
            }
        }
    }

    tracing::info!(knoten = %core.config().local_id, "Session-Actor beendet");
}

fn befehl_ausfuehren<T: Transport, C: Clock>(core: &mut SessionCore<T, C>, befehl: Befehl) {
    match befehl {
        Befehl::StartHosting => core.start_hosting(),
        Befehl::StopHosting => core.stop_hosting(),
        Befehl::StartBrowsing => core.start_browsing(),
        Befehl::StopBrowsing => core.stop_browsing(),
        Befehl::Einladen { peer, antwort } => {
            let _ = antwort.send(core.invite(&peer));
        }
        Befehl::Senden {
            peer,
            message,
            antwort,
        } => {
            let _ = antwort.send(core.senden(&peer, &message));
        }
        Befehl::ClipSenden {
            payload,
            dauer,
            antwort,
        } => {
            let _ = antwort.send(core.clip_senden(payload, dauer));
        }
        Befehl::Snapshot { antwort } => {
            let _ = antwort.send(core.snapshot());
        }
        Befehl::Trennen { antwort } => {
            core.disconnect();
            let _ = antwort.send(());
        }
        Befehl::Beenden => {}
    }
}

fn weiterleiten<T: Transport, C: Clock>(
    core: &mut SessionCore<T, C>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) {
    for event in core.ereignisse_abholen() {
        // Ohne Empfaenger gehen Ereignisse verloren, die Session laeuft weiter
        let _ = events.send(event);
    }
}

async fn schlafen_bis(deadline: Option<Instant>) {
    match deadline {
        Some(d) => tokio::time::sleep_until(tokio::time::Instant::from_std(d)).await,
        None => std::future::pending::<()>().await,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{RecordingTransport, TransportAufruf};
    use flurfunk_core::ConnectionStatus;
    use std::time::Duration;

    fn starten() -> (SessionHandle, mpsc::UnboundedReceiver<SessionEvent>, RecordingTransport) {
        let transport = RecordingTransport::neu();
        let klon = transport.clone();
        let (handle, events) =
            session_starten(SessionConfig::neu("ich", "Ich"), EventLog::neu(), move |_| klon).unwrap();
        (handle, events, transport)
    }

    #[tokio::test(start_paused = true)]
    async fn hosting_startet_nach_settle_delay() {
        let (handle, _events, transport) = starten();
        handle.start_hosting().unwrap();

        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.status, ConnectionStatus::Hosting);
        assert_eq!(transport.aufrufe(), vec![TransportAufruf::StopAdvertising]);

        tokio::time::sleep(Duration::from_millis(3100)).await;
        handle.snapshot().await.unwrap();
        assert_eq!(
            transport.aufrufe(),
            vec![TransportAufruf::StopAdvertising, TransportAufruf::StartAdvertising]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_verhindert_alte_timer() {
        let (handle, _events, transport) = starten();
        handle.start_browsing().unwrap();
        handle.disconnect().await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        handle.snapshot().await.unwrap();
        assert!(!transport.aufrufe().contains(&TransportAufruf::StartBrowsing));
    }

    #[tokio::test]
    async fn ungueltige_konfiguration_ist_fatal() {
        let mut config = SessionConfig::neu("ich", "Ich");
        config.service_type = String::new();
        let result = session_starten(config, EventLog::neu(), |_| RecordingTransport::neu());
        assert!(matches!(result, Err(SessionError::Konfiguration(_))));
    }

    #[tokio::test]
    async fn beenden_schliesst_actor() {
        let (handle, mut events, _transport) = starten();
        handle.beenden().unwrap();
        // Ereigniskanal schliesst, sobald der Actor endet
        while events.recv().await.is_some() {}
        assert!(matches!(handle.snapshot().await, Err(SessionError::Beendet)));
    }

    #[tokio::test]
    async fn status_ereignisse_kommen_an() {
        let (handle, mut events, _transport) = starten();
        handle.start_browsing().unwrap();
        assert_eq!(
            events.recv().await,
            Some(SessionEvent::StatusGeaendert(ConnectionStatus::Browsing))
        );
    }
}
