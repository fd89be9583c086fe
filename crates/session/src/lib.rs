//! # flurfunk-session
//!
//! Sichere Peer-Session-Schicht: Discovery-Buchfuehrung, Verbindungs-
//! Lebenszyklus mit Retry, automatischer ECDH-Handshake beim Verbinden und
//! verschluesselter Nachrichtenaustausch ueber einen unzuverlaessigen
//! Transport.
//!
//! ## Module
//! - `state` - synchrone Zustandsmaschine (`SessionCore`)
//! - `actor` - Tokio-Actor und `SessionHandle`
//! - `codec` - Handshake, Verschluesselung, Wire-Format
//! - `registry` - entdeckte und verbundene Peers
//! - `timer`, `retry`, `role`, `clock` - Timer als Daten, Backoff, Rollen-Phasen
//! - `transport` - Transport-Grenze, In-Memory- und Aufzeichnungs-Transport

pub mod actor;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod event;
pub mod registry;
pub mod retry;
pub mod role;
pub mod state;
pub mod timer;
pub mod transport;

pub use actor::{session_starten, SessionHandle};
pub use clock::{Clock, ManualClock, TokioClock};
pub use codec::{Ausgehend, Eingehend, SecureCodec};
pub use config::{service_type_gueltig, SessionConfig, DEFAULT_SERVICE_TYPE};
pub use error::{SessionError, SessionResult, TransportError};
pub use event::{SessionEvent, SessionSnapshot};
pub use registry::PeerRegistry;
pub use retry::{RetryPolicy, MAX_VERZOEGERUNG};
pub use role::{Rolle, RollenPhase, RollenStatus};
pub use state::SessionCore;
pub use timer::{TimerAktion, TimerQueue};
pub use transport::{
    MemoryNetwork, MemoryTransport, RecordingTransport, SessionState, Transport, TransportAufruf,
    TransportEvent, TransportEventSender,
};
