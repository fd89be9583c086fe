//! Session-Core: die serialisierte Zustandsmaschine
//!
//! Alle Mutationen laufen ueber genau einen Besitzer. Der Core ist
//! synchron: er reagiert auf API-Aufrufe und Transport-Ereignisse, plant
//! Timer als Daten in seiner `TimerQueue` und sammelt Ereignisse fuer den
//! Konsumenten, die der Besitzer mit `ereignisse_abholen()` abholt.
//!
//! ## Globaler Status
//! ```text
//! >= 1 verbundener Peer         -> Connected
//! Hosting  Starting oder Active -> Hosting
//! Browsing Starting oder Active -> Browsing
//! sonst                         -> Disconnected
//! ```

use std::collections::HashMap;
use std::time::Duration;

use flurfunk_core::{ConnectionStatus, Message, PeerId};
use flurfunk_observability::{EventEntry, EventKategorie, EventLog, EventStufe};

use crate::clock::Clock;
use crate::codec::{Eingehend, SecureCodec};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult, TransportError};
use crate::event::{SessionEvent, SessionSnapshot};
use crate::registry::PeerRegistry;
use crate::role::{Rolle, RollenPhase, RollenStatus};
use crate::timer::{TimerAktion, TimerQueue};
use crate::transport::{SessionState, Transport, TransportEvent};

/// Zustandsmaschine einer Session ueber einem Transport
pub struct SessionCore<T: Transport, C: Clock> {
    config: SessionConfig,
    transport: T,
    clock: C,
    codec: SecureCodec,
    registry: PeerRegistry,
    timer: TimerQueue,
    hosting: RollenStatus,
    browsing: RollenStatus,
    status: ConnectionStatus,
    /// Namen aus angenommenen Einladungen bis zum Verbindungsaufbau
    einladungen: HashMap<PeerId, String>,
    log: EventLog,
    ausgang: Vec<SessionEvent>,
}

impl<T: Transport, C: Clock> SessionCore<T, C> {
    /// Erstellt den Core, prueft vorher die Konfiguration
    pub fn neu(config: SessionConfig, transport: T, clock: C, log: EventLog) -> SessionResult<Self> {
        config.validieren()?;
        let codec = SecureCodec::neu(&config.hkdf_salt, config.framing, config.max_nachricht_groesse);
        log.info(
            EventKategorie::Lifecycle,
            format!(
                "Session erstellt: id={}, service={}, framing={}",
                config.local_id, config.service_type, config.framing
            ),
        );
        Ok(Self {
            config,
            transport,
            clock,
            codec,
            registry: PeerRegistry::new(),
            timer: TimerQueue::new(),
            hosting: RollenStatus::default(),
            browsing: RollenStatus::default(),
            status: ConnectionStatus::Disconnected,
            einladungen: HashMap::new(),
            log,
            ausgang: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Discovery-Rollen
    // -----------------------------------------------------------------------

    pub fn start_hosting(&mut self) {
        self.rolle_starten(Rolle::Hosting);
    }

    pub fn stop_hosting(&mut self) {
        self.rolle_stoppen(Rolle::Hosting);
    }

    pub fn start_browsing(&mut self) {
        self.rolle_starten(Rolle::Browsing);
    }

    pub fn stop_browsing(&mut self) {
        self.rolle_stoppen(Rolle::Browsing);
    }

    fn rolle_starten(&mut self, rolle: Rolle) {
        // Vorherigen Zustand des Transports verwerfen
        self.transport_stoppen(rolle);
        self.timer.abbrechen_fuer(rolle);

        *self.rolle_mut(rolle) = RollenStatus {
            phase: RollenPhase::Starting,
            fehlversuche: 0,
        };
        if !self.planen_in(self.config.settle_delay, TimerAktion::StartRolle(rolle)) {
            self.rolle_mut(rolle).phase = RollenPhase::Idle;
            self.status_neu_berechnen();
            return;
        }

        self.log.info(
            EventKategorie::Discovery,
            format!(
                "{rolle} angefordert, Start in {} ms",
                self.config.settle_delay.as_millis()
            ),
        );
        self.status_neu_berechnen();
    }

    fn rolle_stoppen(&mut self, rolle: Rolle) {
        self.timer.abbrechen_fuer(rolle);
        self.transport_stoppen(rolle);
        let war = std::mem::take(self.rolle_mut(rolle));
        if war.phase != RollenPhase::Idle {
            self.log
                .info(EventKategorie::Discovery, format!("{rolle} gestoppt"));
        }
        self.status_neu_berechnen();
    }

    fn transport_starten(&mut self, rolle: Rolle) {
        match rolle {
            Rolle::Hosting => self.transport.start_advertising(),
            Rolle::Browsing => self.transport.start_browsing(),
        }
    }

    fn transport_stoppen(&mut self, rolle: Rolle) {
        match rolle {
            Rolle::Hosting => self.transport.stop_advertising(),
            Rolle::Browsing => self.transport.stop_browsing(),
        }
    }

    fn rolle_mut(&mut self, rolle: Rolle) -> &mut RollenStatus {
        match rolle {
            Rolle::Hosting => &mut self.hosting,
            Rolle::Browsing => &mut self.browsing,
        }
    }

    pub fn rolle(&self, rolle: Rolle) -> RollenStatus {
        match rolle {
            Rolle::Hosting => self.hosting,
            Rolle::Browsing => self.browsing,
        }
    }

    // -----------------------------------------------------------------------
    // Timer
    // -----------------------------------------------------------------------

    /// Naechster Zeitpunkt, zu dem `timer_verarbeiten` etwas zu tun hat
    pub fn naechste_deadline(&self) -> Option<std::time::Instant> {
        self.timer.naechste_deadline()
    }

    /// Fuehrt alle faelligen Timer aus, gibt ihre Anzahl zurueck
    pub fn timer_verarbeiten(&mut self) -> usize {
        let faellig = self.timer.faellige(self.clock.now());
        let anzahl = faellig.len();
        for aktion in faellig {
            self.timer_ausfuehren(aktion);
        }
        anzahl
    }

    fn timer_ausfuehren(&mut self, aktion: TimerAktion) {
        match aktion {
            TimerAktion::StartRolle(rolle) => {
                self.transport_starten(rolle);
                self.rolle_mut(rolle).phase = RollenPhase::Active;
                self.log
                    .info(EventKategorie::Discovery, format!("{rolle} gestartet"));
            }
            TimerAktion::RetryStoppen(rolle) => {
                self.transport_stoppen(rolle);
                let neustart = self.config.retry.neustart_verzoegerung;
                if !self.planen_in(neustart, TimerAktion::RetryStarten(rolle)) {
                    let versuche = self.rolle(rolle).fehlversuche;
                    self.aufgeben(rolle, versuche, "Neustart nicht planbar");
                    return;
                }
                self.log.info(
                    EventKategorie::Retry,
                    format!(
                        "{rolle} fuer Retry gestoppt, Neustart in {} ms",
                        self.config.retry.neustart_verzoegerung.as_millis()
                    ),
                );
            }
            TimerAktion::RetryStarten(rolle) => {
                self.transport_starten(rolle);
                self.rolle_mut(rolle).phase = RollenPhase::Active;
                self.log
                    .info(EventKategorie::Retry, format!("{rolle} nach Retry neu gestartet"));
            }
        }
        self.status_neu_berechnen();
    }

    fn rolle_fehlgeschlagen(&mut self, rolle: Rolle, fehler: &TransportError) {
        if self.rolle(rolle).phase == RollenPhase::Idle {
            self.log.debug(
                EventKategorie::Retry,
                format!("{fehler}, nach Stop ignoriert"),
            );
            return;
        }
        let status = self.rolle_mut(rolle);
        status.fehlversuche += 1;
        status.phase = RollenPhase::Retrying;
        let versuch = status.fehlversuche;

        self.timer.abbrechen_fuer(rolle);
        self.status_neu_berechnen();

        let Some(verzoegerung) = self.config.retry.verzoegerung(versuch) else {
            self.aufgeben(rolle, versuch, &fehler.to_string());
            return;
        };
        if !self.planen_in(verzoegerung, TimerAktion::RetryStoppen(rolle)) {
            self.aufgeben(rolle, versuch, &fehler.to_string());
            return;
        }
        self.log.warnung(
            EventKategorie::Retry,
            format!(
                "{fehler}, Retry {versuch}/{} in {} ms",
                self.config.retry.max_versuche,
                verzoegerung.as_millis()
            ),
        );
    }

    fn aufgeben(&mut self, rolle: Rolle, versuche: u32, grund: &str) {
        self.timer.abbrechen_fuer(rolle);
        self.rolle_mut(rolle).phase = RollenPhase::Idle;
        self.log.fehler(
            EventKategorie::Retry,
            format!("{rolle} aufgegeben nach {versuche} Versuchen ({grund})"),
        );
        self.ausgang.push(SessionEvent::DiscoveryAufgegeben { rolle, versuche });
        self.status_neu_berechnen();
    }

    /// Plant eine Aktion relativ zu jetzt. Liegt die Deadline ausserhalb des
    /// darstellbaren Zeitbereichs, wird nichts geplant.
    fn planen_in(&mut self, verzoegerung: Duration, aktion: TimerAktion) -> bool {
        match self.clock.now().checked_add(verzoegerung) {
            Some(deadline) => {
                self.timer.planen(deadline, aktion);
                true
            }
            None => {
                self.log.fehler(
                    EventKategorie::Retry,
                    format!("{aktion:?} nicht planbar, Verzoegerung {verzoegerung:?} zu gross"),
                );
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Transport-Ereignisse
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Ereignis des Transports
    pub fn transport_ereignis(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::PeerFound { peer, display_name } => {
                self.peer_gefunden(peer, &display_name)
            }
            TransportEvent::PeerLost { peer } => self.peer_verloren(&peer),
            TransportEvent::SessionStateChanged { peer, state } => {
                self.session_zustand(peer, state)
            }
            TransportEvent::DataReceived { peer, data } => self.daten_empfangen(&peer, &data),
            TransportEvent::InvitationReceived { peer, display_name } => {
                self.einladung_erhalten(peer, display_name)
            }
            TransportEvent::AdvertisingFailed { fehler } => {
                self.rolle_fehlgeschlagen(Rolle::Hosting, &fehler)
            }
            TransportEvent::BrowsingFailed { fehler } => {
                self.rolle_fehlgeschlagen(Rolle::Browsing, &fehler)
            }
        }
    }

    fn peer_gefunden(&mut self, peer: PeerId, display_name: &str) {
        if self.registry.gefunden(peer.clone(), display_name) {
            self.log.record(
                EventEntry::neu(
                    EventKategorie::Discovery,
                    EventStufe::Info,
                    format!("Peer gefunden: {display_name}"),
                )
                .mit_peer(&peer),
            );
            if let Some(p) = self.registry.peer(&peer) {
                self.ausgang.push(SessionEvent::PeerGefunden(p.clone()));
            }
        }
    }

    fn peer_verloren(&mut self, peer: &PeerId) {
        if self.registry.verloren(peer) {
            self.log.record(
                EventEntry::neu(EventKategorie::Discovery, EventStufe::Info, "Peer verloren")
                    .mit_peer(peer),
            );
            self.ausgang.push(SessionEvent::PeerVerloren(peer.clone()));
        }
    }

    fn session_zustand(&mut self, peer: PeerId, state: SessionState) {
        match state {
            SessionState::Connecting => {
                self.registry.verbindend(&peer);
                self.log.record(
                    EventEntry::neu(EventKategorie::Lifecycle, EventStufe::Debug, "Verbindung wird aufgebaut")
                        .mit_peer(&peer),
                );
            }
            SessionState::Connected => {
                let name = self.einladungen.remove(&peer);
                let verbunden = self.registry.verbunden(peer.clone(), name.as_deref());
                self.log.record(
                    EventEntry::neu(
                        EventKategorie::Lifecycle,
                        EventStufe::Info,
                        format!("Verbunden mit {}", verbunden.display_name),
                    )
                    .mit_peer(&peer),
                );
                self.ausgang.push(SessionEvent::PeerVerbunden(verbunden));
                self.handshake_senden(&peer);
                self.status_neu_berechnen();
            }
            SessionState::NotConnected => {
                self.einladungen.remove(&peer);
                let schluessel_entfernt = self.codec.peer_entfernen(&peer);
                if self.registry.getrennt(&peer).is_some() {
                    self.log.record(
                        EventEntry::neu(
                            EventKategorie::Lifecycle,
                            EventStufe::Info,
                            format!("Getrennt (Schluessel entfernt: {schluessel_entfernt})"),
                        )
                        .mit_peer(&peer),
                    );
                    self.ausgang.push(SessionEvent::PeerGetrennt(peer));
                }
                self.status_neu_berechnen();
            }
        }
    }

    fn handshake_senden(&mut self, peer: &PeerId) {
        let frame = self.codec.handshake_frame();
        let laenge = frame.len();
        match self.transport.send_reliable(peer, frame) {
            Ok(()) => self.log.record(
                EventEntry::neu(EventKategorie::Handshake, EventStufe::Info, "Public Key gesendet")
                    .mit_peer(peer)
                    .mit_bytes(laenge),
            ),
            Err(e) => self.log.record(
                EventEntry::neu(
                    EventKategorie::Handshake,
                    EventStufe::Fehler,
                    format!("Public Key nicht gesendet: {e}"),
                )
                .mit_peer(peer),
            ),
        }
    }

    fn einladung_erhalten(&mut self, peer: PeerId, display_name: String) {
        // Angenommene, noch nicht verbundene Einladungen belegen schon einen Platz
        let belegt = self.registry.anzahl_verbunden() + self.einladungen.len();
        let platz = belegt < self.config.max_peers;
        let annehmen = self.config.auto_accept_invitations && platz;
        self.transport.accept_invitation(&peer, annehmen);

        let nachricht = if annehmen {
            format!("Einladung von {display_name} angenommen")
        } else if !platz {
            format!(
                "Einladung von {display_name} abgelehnt, Peer-Limit {} erreicht",
                self.config.max_peers
            )
        } else {
            format!("Einladung von {display_name} abgelehnt")
        };
        self.log.record(
            EventEntry::neu(EventKategorie::Lifecycle, EventStufe::Info, nachricht).mit_peer(&peer),
        );
        if annehmen {
            self.einladungen.insert(peer, display_name);
        }
    }

    fn daten_empfangen(&mut self, peer: &PeerId, data: &[u8]) {
        match self.codec.decode(peer, data) {
            Ok(Eingehend::Handshake { ersetzt }) => {
                self.log.record(
                    EventEntry::neu(
                        EventKategorie::Handshake,
                        EventStufe::Info,
                        if ersetzt {
                            "Schluessel erneuert"
                        } else {
                            "Schluessel abgeleitet"
                        },
                    )
                    .mit_peer(peer)
                    .mit_bytes(data.len()),
                );
                self.ausgang
                    .push(SessionEvent::HandshakeAbgeschlossen(peer.clone()));
            }
            Ok(Eingehend::Nachricht(message)) => {
                self.log.record(
                    EventEntry::neu(
                        EventKategorie::Receive,
                        EventStufe::Info,
                        format!("Nachricht {} empfangen", message.id()),
                    )
                    .mit_peer(peer)
                    .mit_bytes(data.len()),
                );
                self.ausgang.push(SessionEvent::NachrichtEmpfangen(message));
            }
            Err(e) => {
                let kategorie = if e.ist_handshake_fehler() {
                    EventKategorie::Handshake
                } else {
                    EventKategorie::Receive
                };
                self.log.record(
                    EventEntry::neu(kategorie, EventStufe::Warnung, format!("Verworfen: {e}"))
                        .mit_peer(peer)
                        .mit_bytes(data.len()),
                );
                self.ausgang.push(SessionEvent::EmpfangVerworfen {
                    peer: peer.clone(),
                    grund: e.to_string(),
                });
            }
        }
    }

    // -----------------------------------------------------------------------
    // Einladen und Senden
    // -----------------------------------------------------------------------

    /// Laedt einen entdeckten Peer ein
    ///
    /// Ein nicht (mehr) entdeckter Peer ist ein normales Rennen mit der
    /// Discovery und wird nur protokolliert.
    pub fn invite(&mut self, peer: &PeerId) -> SessionResult<()> {
        if !self.registry.ist_entdeckt(peer) {
            self.log.record(
                EventEntry::neu(
                    EventKategorie::Lifecycle,
                    EventStufe::Debug,
                    "Einladung uebersprungen, Peer nicht entdeckt",
                )
                .mit_peer(peer),
            );
            return Ok(());
        }
        if self.registry.anzahl_verbunden() >= self.config.max_peers {
            self.log.record(
                EventEntry::neu(
                    EventKategorie::Lifecycle,
                    EventStufe::Warnung,
                    format!("Einladung abgelehnt, Peer-Limit {} erreicht", self.config.max_peers),
                )
                .mit_peer(peer),
            );
            return Err(SessionError::PeerLimitErreicht(self.config.max_peers));
        }
        match self.transport.invite(peer, self.config.invitation_timeout) {
            Ok(()) => {
                self.log.record(
                    EventEntry::neu(EventKategorie::Lifecycle, EventStufe::Info, "Einladung gesendet")
                        .mit_peer(peer),
                );
                Ok(())
            }
            Err(e) => {
                self.log.record(
                    EventEntry::neu(
                        EventKategorie::Lifecycle,
                        EventStufe::Warnung,
                        format!("Einladung fehlgeschlagen: {e}"),
                    )
                    .mit_peer(peer),
                );
                Err(e.into())
            }
        }
    }

    /// Sendet eine Nachricht an genau einen verbundenen Peer
    ///
    /// Ohne Schluessel geht die Nachricht unverschluesselt raus.
    pub fn senden(&mut self, peer: &PeerId, message: &Message) -> SessionResult<()> {
        if !self.registry.ist_verbunden(peer) {
            return Err(SessionError::NichtVerbunden(peer.to_string()));
        }
        self.dauer_pruefen(message.duration_seconds())?;

        let ausgehend = match self.codec.encode(peer, message) {
            Ok(a) => a,
            Err(e) => {
                self.senden_fehlgeschlagen(peer, message, &e.to_string());
                return Err(e);
            }
        };
        if !ausgehend.verschluesselt {
            self.log.record(
                EventEntry::neu(
                    EventKategorie::Send,
                    EventStufe::Warnung,
                    "Kein Schluessel, sende unverschluesselt",
                )
                .mit_peer(peer),
            );
        }

        let laenge = ausgehend.bytes.len();
        match self.transport.send_reliable(peer, ausgehend.bytes) {
            Ok(()) => {
                self.log.record(
                    EventEntry::neu(
                        EventKategorie::Send,
                        EventStufe::Info,
                        format!("Nachricht {} gesendet", message.id()),
                    )
                    .mit_peer(peer)
                    .mit_bytes(laenge),
                );
                Ok(())
            }
            Err(e) => {
                self.senden_fehlgeschlagen(peer, message, &e.to_string());
                Err(e.into())
            }
        }
    }

    /// Baut einen Clip als Nachricht dieses Knotens und sendet ihn an alle
    /// verbundenen Peers
    ///
    /// Fehler einzelner Peers erscheinen als `SendenFehlgeschlagen`.
    pub fn clip_senden(&mut self, payload: Vec<u8>, dauer: f64) -> SessionResult<Message> {
        self.dauer_pruefen(dauer)?;
        let peers = self.registry.verbundene_ids();
        if peers.is_empty() {
            return Err(SessionError::KeinePeers);
        }
        let message = Message::neu(
            self.config.local_id.clone(),
            self.config.display_name.clone(),
            payload,
            dauer,
        )?;
        for peer in &peers {
            if let Err(e) = self.senden(peer, &message) {
                tracing::debug!(peer = %peer, fehler = %e, "Clip an Peer nicht zugestellt");
            }
        }
        Ok(message)
    }

    fn dauer_pruefen(&self, dauer: f64) -> SessionResult<()> {
        if dauer > self.config.max_clip_sekunden {
            return Err(SessionError::ClipZuLang {
                dauer,
                maximum: self.config.max_clip_sekunden,
            });
        }
        Ok(())
    }

    fn senden_fehlgeschlagen(&mut self, peer: &PeerId, message: &Message, grund: &str) {
        self.log.record(
            EventEntry::neu(
                EventKategorie::Send,
                EventStufe::Fehler,
                format!("Senden von {} fehlgeschlagen: {grund}", message.id()),
            )
            .mit_peer(peer),
        );
        self.ausgang.push(SessionEvent::SendenFehlgeschlagen {
            peer: peer.clone(),
            message_id: message.id(),
            grund: grund.to_string(),
        });
    }

    // -----------------------------------------------------------------------
    // Abbau
    // -----------------------------------------------------------------------

    /// Setzt die Session vollstaendig zurueck. Immer sicher, idempotent.
    pub fn disconnect(&mut self) {
        self.timer.leeren();
        self.transport.disconnect_all();
        self.transport.stop_advertising();
        self.transport.stop_browsing();
        self.hosting = RollenStatus::default();
        self.browsing = RollenStatus::default();

        let getrennt = self.registry.verbundene_ids();
        self.registry.leeren();
        self.codec.leeren();
        self.einladungen.clear();

        for peer in getrennt {
            self.ausgang.push(SessionEvent::PeerGetrennt(peer));
        }
        self.log.info(EventKategorie::Lifecycle, "Session getrennt");
        self.status_neu_berechnen();
    }

    // -----------------------------------------------------------------------
    // Status und Abfragen
    // -----------------------------------------------------------------------

    fn status_neu_berechnen(&mut self) {
        let neu = if self.registry.anzahl_verbunden() > 0 {
            ConnectionStatus::Connected
        } else if self.hosting.ist_live() {
            ConnectionStatus::Hosting
        } else if self.browsing.ist_live() {
            ConnectionStatus::Browsing
        } else {
            ConnectionStatus::Disconnected
        };
        if neu != self.status {
            self.log.info(
                EventKategorie::Lifecycle,
                format!("Status {} -> {}", self.status, neu),
            );
            self.status = neu;
            self.ausgang.push(SessionEvent::StatusGeaendert(neu));
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status,
            entdeckt: self.registry.entdeckte(),
            verbunden: self.registry.verbundene(),
            hosting: self.hosting,
            browsing: self.browsing,
            peers_mit_schluessel: self.codec.peers_mit_schluessel(),
            ausstehende_timer: self.timer.len(),
        }
    }

    /// Entnimmt alle seit dem letzten Aufruf gesammelten Ereignisse
    pub fn ereignisse_abholen(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.ausgang)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn geplante_timer(&self) -> Vec<TimerAktion> {
        self.timer.aktionen()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
