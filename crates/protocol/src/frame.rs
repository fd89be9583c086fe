//! Frame-Erkennung: Handshake-Payload vs. Nachricht
//!
//! Handshake (roher Public Key) und WireMessage teilen sich denselben
//! Byte-Kanal. Zwei Modi:
//!
//! ## LengthDiscriminated (Standard, kompatibel)
//! ```text
//! genau 65 Bytes  -> Handshake
//! jede andere     -> WireMessage (JSON)
//! ```
//! Kein Envelope. Eine JSON-Nachricht von exakt 65 Bytes wuerde falsch
//! erkannt; eine gueltige WireMessage ist allein durch ihre Feldnamen und
//! die UUID deutlich laenger.
//!
//! ## Tagged
//! ```text
//! +--------+------------------------+
//! | Typ(1) | Inhalt                 |
//! +--------+------------------------+
//! 0x01 = Handshake (65 Bytes), 0x02 = WireMessage
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

/// Laenge eines Handshake-Payloads (unkomprimierter P-256 Public Key)
pub const HANDSHAKE_LEN: usize = 65;

/// Typ-Byte fuer Handshake-Frames im expliziten Framing
pub const TAG_HANDSHAKE: u8 = 0x01;

/// Typ-Byte fuer Nachrichten-Frames im expliziten Framing
pub const TAG_NACHRICHT: u8 = 0x02;

/// Erkannter Inhalt eines empfangenen Byte-Blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// Roher Public Key des Peers
    Handshake(&'a [u8]),
    /// JSON-kodierte WireMessage
    Message(&'a [u8]),
}

/// Framing-Modus fuer den Byte-Kanal zwischen zwei Peers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FramingMode {
    /// Unterscheidung allein ueber die Laenge (65 Bytes = Handshake)
    #[default]
    LengthDiscriminated,
    /// Explizites Typ-Byte vor jedem Frame
    Tagged,
}

impl FramingMode {
    /// Ordnet empfangene Bytes einem Frame-Typ zu
    ///
    /// Im laengenbasierten Modus schlaegt das nie fehl, jede Laenge ausser 65
    /// gilt als Nachricht.
    pub fn classify<'a>(self, bytes: &'a [u8]) -> ProtocolResult<Frame<'a>> {
        match self {
            FramingMode::LengthDiscriminated => {
                if bytes.len() == HANDSHAKE_LEN {
                    Ok(Frame::Handshake(bytes))
                } else {
                    Ok(Frame::Message(bytes))
                }
            }
            FramingMode::Tagged => {
                let (&typ, inhalt) = bytes.split_first().ok_or(ProtocolError::LeererFrame)?;
                match typ {
                    TAG_HANDSHAKE if inhalt.len() == HANDSHAKE_LEN => Ok(Frame::Handshake(inhalt)),
                    TAG_HANDSHAKE => Err(ProtocolError::HandshakeLaenge {
                        erwartet: HANDSHAKE_LEN,
                        erhalten: inhalt.len(),
                    }),
                    TAG_NACHRICHT => Ok(Frame::Message(inhalt)),
                    andere => Err(ProtocolError::UnbekannterTyp(andere)),
                }
            }
        }
    }

    /// Verpackt einen Public Key als Handshake-Frame
    pub fn encode_handshake(self, public_key: &[u8]) -> Vec<u8> {
        self.verpacken(TAG_HANDSHAKE, public_key)
    }

    /// Verpackt eine JSON-kodierte WireMessage als Nachrichten-Frame
    pub fn encode_message(self, json: &[u8]) -> Vec<u8> {
        self.verpacken(TAG_NACHRICHT, json)
    }

    fn verpacken(self, typ: u8, inhalt: &[u8]) -> Vec<u8> {
        match self {
            FramingMode::LengthDiscriminated => inhalt.to_vec(),
            FramingMode::Tagged => {
                let mut out = Vec::with_capacity(1 + inhalt.len());
                out.push(typ);
                out.extend_from_slice(inhalt);
                out
            }
        }
    }
}

impl std::fmt::Display for FramingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FramingMode::LengthDiscriminated => write!(f, "length_discriminated"),
            FramingMode::Tagged => write!(f, "tagged"),
        }
    }
}

impl std::str::FromStr for FramingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length_discriminated" => Ok(Self::LengthDiscriminated),
            "tagged" => Ok(Self::Tagged),
            other => Err(format!("Unbekannter FramingMode: '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laengenbasiert_genau_65_ist_handshake() {
        for len in 0..=300usize {
            let bytes = vec![0xABu8; len];
            let frame = FramingMode::LengthDiscriminated.classify(&bytes).unwrap();
            match frame {
                Frame::Handshake(b) => {
                    assert_eq!(len, HANDSHAKE_LEN);
                    assert_eq!(b.len(), HANDSHAKE_LEN);
                }
                Frame::Message(b) => {
                    assert_ne!(len, HANDSHAKE_LEN, "65 Bytes duerfen keine Nachricht sein");
                    assert_eq!(b.len(), len);
                }
            }
        }
    }

    #[test]
    fn laengenbasiert_ohne_envelope() {
        let pk = [0x04u8; HANDSHAKE_LEN];
        assert_eq!(FramingMode::LengthDiscriminated.encode_handshake(&pk), pk.to_vec());
        assert_eq!(FramingMode::LengthDiscriminated.encode_message(b"{}"), b"{}".to_vec());
    }

    #[test]
    fn tagged_unterscheidet_65_byte_nachricht() {
        let json = vec![b'x'; HANDSHAKE_LEN];
        let frame = FramingMode::Tagged.encode_message(&json);
        assert_eq!(FramingMode::Tagged.classify(&frame).unwrap(), Frame::Message(&json[..]));
    }

    #[test]
    fn tagged_handshake_roundtrip() {
        let pk = [0x04u8; HANDSHAKE_LEN];
        let frame = FramingMode::Tagged.encode_handshake(&pk);
        assert_eq!(frame[0], TAG_HANDSHAKE);
        assert_eq!(FramingMode::Tagged.classify(&frame).unwrap(), Frame::Handshake(&pk[..]));
    }

    #[test]
    fn tagged_fehlerfaelle() {
        assert!(matches!(
            FramingMode::Tagged.classify(&[]),
            Err(ProtocolError::LeererFrame)
        ));
        assert!(matches!(
            FramingMode::Tagged.classify(&[0x7F, 1, 2]),
            Err(ProtocolError::UnbekannterTyp(0x7F))
        ));
        assert!(matches!(
            FramingMode::Tagged.classify(&[TAG_HANDSHAKE, 1, 2]),
            Err(ProtocolError::HandshakeLaenge { erhalten: 2, .. })
        ));
    }

    #[test]
    fn framing_mode_aus_string() {
        assert_eq!("tagged".parse::<FramingMode>().unwrap(), FramingMode::Tagged);
        assert_eq!(
            FramingMode::LengthDiscriminated.to_string().parse::<FramingMode>().unwrap(),
            FramingMode::LengthDiscriminated
        );
        assert!("xml".parse::<FramingMode>().is_err());
    }
}
