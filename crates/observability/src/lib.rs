//! # flurfunk-observability
//!
//! Observability-Crate fuer Flurfunk:
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Begrenztes Debug-Ereignisprotokoll (`EventLog`) mit Live-Abonnement

pub mod event_log;
pub mod logging;

pub use event_log::{EventEntry, EventKategorie, EventLog, EventStufe, DEFAULT_KAPAZITAET};
pub use logging::{log_format_gueltig, log_level_gueltig, logging_initialisieren};
