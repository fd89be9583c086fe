//! Wire-Format fuer Sprachnachrichten
//!
//! Eine `WireMessage` ist das einzige Objekt das als strukturierte Nachricht
//! ueber den Transport geht. Kodierung: JSON mit benannten Feldern.
//!
//! ```json
//! {
//!   "id": "6f1c…",
//!   "senderID": "geraet-1",
//!   "senderName": "Alice",
//!   "timestamp": "2026-10-18T09:30:00Z",
//!   "payload": "<base64>",
//!   "durationSeconds": 2.5,
//!   "isEncrypted": true
//! }
//! ```
//!
//! Im Gegensatz zur `Message` kann `payload` Ciphertext sein, `isEncrypted`
//! haelt fest welcher Fall vorliegt.

use chrono::{DateTime, Utc};
use flurfunk_core::{Message, MessageId, PeerId};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Nachrichtengroesse (16 MB, reicht fuer 5 Minuten Audio)
pub const DEFAULT_MAX_NACHRICHT_GROESSE: usize = 16 * 1024 * 1024;

// ---------------------------------------------------------------------------
// WireMessage
// ---------------------------------------------------------------------------

/// Sprachnachricht in Uebertragungsform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub id: MessageId,
    #[serde(rename = "senderID")]
    pub sender_id: PeerId,
    #[serde(rename = "senderName")]
    pub sender_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "base64_bytes")]
    pub payload: Vec<u8>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: f64,
    #[serde(rename = "isEncrypted")]
    pub is_encrypted: bool,
}

impl WireMessage {
    /// Baut die Uebertragungsform aus einer Nachricht und dem (ggf. verschluesselten) Payload
    pub fn aus_nachricht(message: &Message, payload: Vec<u8>, is_encrypted: bool) -> Self {
        Self {
            id: message.id(),
            sender_id: message.sender_id().clone(),
            sender_name: message.sender_name().to_string(),
            timestamp: message.timestamp(),
            payload,
            duration_seconds: message.duration_seconds(),
            is_encrypted,
        }
    }

    /// Setzt die logische Nachricht mit dem Klartext-Payload wieder zusammen
    ///
    /// ID, Absender, Zeitstempel und Dauer werden aus der Huelle uebernommen.
    pub fn in_nachricht(self, klartext: Vec<u8>) -> ProtocolResult<Message> {
        Message::rekonstruieren(
            self.id,
            self.sender_id,
            self.sender_name,
            self.timestamp,
            klartext,
            self.duration_seconds,
        )
        .map_err(|e| ProtocolError::UngueltigeNachricht(e.to_string()))
    }

    /// Serialisiert zu JSON-Bytes
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtocolError::Serialisierung(e.to_string()))
    }

    /// Deserialisiert aus JSON-Bytes mit Standard-Groessenlimit
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Self::decode_mit_limit(bytes, DEFAULT_MAX_NACHRICHT_GROESSE)
    }

    /// Deserialisiert aus JSON-Bytes mit eigenem Groessenlimit
    pub fn decode_mit_limit(bytes: &[u8], max_groesse: usize) -> ProtocolResult<Self> {
        if bytes.len() > max_groesse {
            return Err(ProtocolError::ZuGross {
                groesse: bytes.len(),
                maximum: max_groesse,
            });
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Serde-Adapter: `Vec<u8>` als Base64-String
mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn beispiel() -> WireMessage {
        let msg = Message::neu(PeerId::new("geraet-1"), "Alice", vec![1, 2, 3, 4], 1.5).unwrap();
        WireMessage::aus_nachricht(&msg, msg.payload().to_vec(), false)
    }

    #[test]
    fn json_feldnamen() {
        let json: serde_json::Value =
            serde_json::from_slice(&beispiel().encode().unwrap()).unwrap();
        let obj = json.as_object().unwrap();
        for feld in [
            "id",
            "senderID",
            "senderName",
            "timestamp",
            "payload",
            "durationSeconds",
            "isEncrypted",
        ] {
            assert!(obj.contains_key(feld), "Feld {feld} fehlt");
        }
        assert_eq!(obj["payload"], "AQIDBA==");
        assert_eq!(obj["senderID"], "geraet-1");
    }

    #[test]
    fn dekodieren_uebernimmt_felder() {
        let vorher = beispiel();
        let bytes = vorher.encode().unwrap();
        let dekodiert = WireMessage::decode(&bytes).unwrap();
        assert_eq!(dekodiert, vorher);

        let msg = dekodiert.in_nachricht(vec![1, 2, 3, 4]).unwrap();
        assert_eq!(msg.id(), vorher.id);
        assert_eq!(msg.sender_name(), "Alice");
    }

    #[test]
    fn muell_ergibt_protokollfehler() {
        let result = WireMessage::decode(b"\x00\x01kein json");
        assert!(matches!(result, Err(ProtocolError::UngueltigeNachricht(_))));
    }

    #[test]
    fn fehlendes_feld_ergibt_protokollfehler() {
        let json = br#"{"id":"6f1c2a50-0000-4000-8000-000000000000","senderID":"a"}"#;
        assert!(WireMessage::decode(json).is_err());
    }

    #[test]
    fn ungueltiges_base64_ergibt_protokollfehler() {
        let mut json: serde_json::Value =
            serde_json::from_slice(&beispiel().encode().unwrap()).unwrap();
        json["payload"] = serde_json::Value::String("%%%".into());
        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(WireMessage::decode(&bytes).is_err());
    }

    #[test]
    fn zu_grosse_nachricht_wird_abgelehnt() {
        let bytes = beispiel().encode().unwrap();
        let result = WireMessage::decode_mit_limit(&bytes, 10);
        assert!(matches!(result, Err(ProtocolError::ZuGross { maximum: 10, .. })));
    }

    #[test]
    fn negative_dauer_wird_beim_zusammensetzen_abgelehnt() {
        let mut wire = beispiel();
        wire.duration_seconds = -1.0;
        assert!(wire.in_nachricht(vec![]).is_err());
    }
}
