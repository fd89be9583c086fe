//! Debug-Ereignisprotokoll
//!
//! Begrenzter Ringpuffer aller Entscheidungen der Session-Schicht
//! (Lifecycle, Discovery, Handshake, Senden, Empfangen, Retry). Der Handle ist
//! billig klonbar, alle Klone teilen denselben Puffer. Jeder Eintrag wird
//! zusaetzlich auf der passenden Stufe an `tracing` weitergereicht.
//!
//! Live-Beobachter abonnieren per `subscribe()` einen Broadcast-Kanal.
//! Langsame Abonnenten verlieren Eintraege (Lagged), der Puffer selbst nie.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Standard-Kapazitaet des Ringpuffers
pub const DEFAULT_KAPAZITAET: usize = 500;

/// Puffergroesse des Broadcast-Kanals fuer Live-Abonnenten
const BROADCAST_KAPAZITAET: usize = 256;

// ---------------------------------------------------------------------------
// Eintraege
// ---------------------------------------------------------------------------

/// Bereich aus dem ein Ereignis stammt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKategorie {
    Lifecycle,
    Discovery,
    Handshake,
    Send,
    Receive,
    Retry,
}

impl std::fmt::Display for EventKategorie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventKategorie::Lifecycle => "lifecycle",
            EventKategorie::Discovery => "discovery",
            EventKategorie::Handshake => "handshake",
            EventKategorie::Send => "send",
            EventKategorie::Receive => "receive",
            EventKategorie::Retry => "retry",
        };
        write!(f, "{s}")
    }
}

/// Schweregrad eines Ereignisses
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStufe {
    Debug,
    Info,
    Warnung,
    Fehler,
}

/// Ein einzelner Protokolleintrag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEntry {
    pub zeitpunkt: DateTime<Utc>,
    pub kategorie: EventKategorie,
    pub stufe: EventStufe,
    pub nachricht: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

impl EventEntry {
    pub fn neu(kategorie: EventKategorie, stufe: EventStufe, nachricht: impl Into<String>) -> Self {
        Self {
            zeitpunkt: Utc::now(),
            kategorie,
            stufe,
            nachricht: nachricht.into(),
            peer: None,
            bytes: None,
        }
    }

    pub fn mit_peer(mut self, peer: impl std::fmt::Display) -> Self {
        self.peer = Some(peer.to_string());
        self
    }

    pub fn mit_bytes(mut self, bytes: usize) -> Self {
        self.bytes = Some(bytes);
        self
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

struct EventLogInner {
    eintraege: Mutex<VecDeque<EventEntry>>,
    kapazitaet: usize,
    sender: broadcast::Sender<EventEntry>,
}

/// Geteilter Handle auf das Ereignisprotokoll
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<EventLogInner>,
}

impl EventLog {
    /// Erstellt ein Protokoll mit Standard-Kapazitaet
    pub fn neu() -> Self {
        Self::mit_kapazitaet(DEFAULT_KAPAZITAET)
    }

    /// Erstellt ein Protokoll mit eigener Kapazitaet (mindestens 1)
    pub fn mit_kapazitaet(kapazitaet: usize) -> Self {
        let kapazitaet = kapazitaet.max(1);
        let (sender, _) = broadcast::channel(BROADCAST_KAPAZITAET);
        Self {
            inner: Arc::new(EventLogInner {
                eintraege: Mutex::new(VecDeque::with_capacity(kapazitaet)),
                kapazitaet,
                sender,
            }),
        }
    }

    /// Haengt einen Eintrag an, verdraengt bei voller Kapazitaet den aeltesten
    pub fn record(&self, eintrag: EventEntry) {
        an_tracing_weiterreichen(&eintrag);

        {
            let mut eintraege = self.inner.eintraege.lock();
            if eintraege.len() >= self.inner.kapazitaet {
                eintraege.pop_front();
            }
            eintraege.push_back(eintrag.clone());
        }

        // Ohne Abonnenten schlaegt send fehl, das ist kein Fehler
        let _ = self.inner.sender.send(eintrag);
    }

    pub fn debug(&self, kategorie: EventKategorie, nachricht: impl Into<String>) {
        self.record(EventEntry::neu(kategorie, EventStufe::Debug, nachricht));
    }

    pub fn info(&self, kategorie: EventKategorie, nachricht: impl Into<String>) {
        self.record(EventEntry::neu(kategorie, EventStufe::Info, nachricht));
    }

    pub fn warnung(&self, kategorie: EventKategorie, nachricht: impl Into<String>) {
        self.record(EventEntry::neu(kategorie, EventStufe::Warnung, nachricht));
    }

    pub fn fehler(&self, kategorie: EventKategorie, nachricht: impl Into<String>) {
        self.record(EventEntry::neu(kategorie, EventStufe::Fehler, nachricht));
    }

    /// Kopie aller Eintraege, aelteste zuerst
    pub fn snapshot(&self) -> Vec<EventEntry> {
        self.inner.eintraege.lock().iter().cloned().collect()
    }

    /// Eintraege einer Kategorie, aelteste zuerst
    pub fn nach_kategorie(&self, kategorie: EventKategorie) -> Vec<EventEntry> {
        self.inner
            .eintraege
            .lock()
            .iter()
            .filter(|e| e.kategorie == kategorie)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.inner.eintraege.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.eintraege.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.eintraege.lock().is_empty()
    }

    pub fn kapazitaet(&self) -> usize {
        self.inner.kapazitaet
    }

    /// Abonniert neue Eintraege ab jetzt
    pub fn subscribe(&self) -> broadcast::Receiver<EventEntry> {
        self.inner.sender.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::neu()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("kapazitaet", &self.inner.kapazitaet)
            .finish()
    }
}

fn an_tracing_weiterreichen(e: &EventEntry) {
    let peer = e.peer.as_deref().unwrap_or("-");
    let bytes = e.bytes.unwrap_or(0);
    match e.stufe {
        EventStufe::Debug => {
            tracing::debug!(kategorie = %e.kategorie, peer, bytes, "{}", e.nachricht)
        }
        EventStufe::Info => {
            tracing::info!(kategorie = %e.kategorie, peer, bytes, "{}", e.nachricht)
        }
        EventStufe::Warnung => {
            tracing::warn!(kategorie = %e.kategorie, peer, bytes, "{}", e.nachricht)
        }
        EventStufe::Fehler => {
            tracing::error!(kategorie = %e.kategorie, peer, bytes, "{}", e.nachricht)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
