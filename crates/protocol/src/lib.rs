//! flurfunk-protocol – Netzwerkprotokoll-Definitionen
//!
//! Dieses Crate definiert alles was zwischen zwei Peers ueber den rohen
//! Byte-Kanal des Transports laeuft:
//!
//! - `wire` – `WireMessage` (JSON, Payload ggf. Ciphertext)
//! - `frame` – Unterscheidung Handshake-Payload vs. Nachricht
//! - `error` – Protokollfehler

pub mod error;
pub mod frame;
pub mod wire;

pub use error::{ProtocolError, ProtocolResult};
pub use frame::{Frame, FramingMode, HANDSHAKE_LEN, TAG_HANDSHAKE, TAG_NACHRICHT};
pub use wire::{WireMessage, DEFAULT_MAX_NACHRICHT_GROESSE};
