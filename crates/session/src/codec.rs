//! Sicherer Nachrichten-Codec
//!
//! Besitzt das Schluesselpaar des Knotens und den Schluessel-Speicher.
//!
//! Senden:
//! ```text
//! Schluessel vorhanden -> AES-256-GCM, isEncrypted = true
//! kein Schluessel      -> Klartext,    isEncrypted = false
//! ```
//! Empfangen: zuerst Frame-Erkennung (Handshake oder Nachricht), dann
//! JSON-Dekodierung und ggf. Entschluesselung mit dem Schluessel des
//! Transport-Absenders. Fehler betreffen immer nur die eine Nachricht.

use flurfunk_core::{Message, PeerId};
use flurfunk_crypto::{decrypt, encrypt, KeyAgreement, SecretStore};
use flurfunk_protocol::{Frame, FramingMode, WireMessage};

use crate::error::SessionResult;

/// Ergebnis der Verarbeitung empfangener Bytes
#[derive(Debug, Clone, PartialEq)]
pub enum Eingehend {
    /// Public Key eines Peers verarbeitet, Schluessel gespeichert
    Handshake {
        /// Ein vorhandener Schluessel wurde ersetzt (Reconnect)
        ersetzt: bool,
    },
    /// Vollstaendig dekodierte (und ggf. entschluesselte) Nachricht
    Nachricht(Message),
}

/// Fertig kodierte ausgehende Nachricht
#[derive(Debug, Clone)]
pub struct Ausgehend {
    pub bytes: Vec<u8>,
    pub verschluesselt: bool,
}

/// Handshake, Verschluesselung und Wire-Format einer Session
pub struct SecureCodec {
    schluessel: KeyAgreement,
    secrets: SecretStore,
    framing: FramingMode,
    max_groesse: usize,
}

impl SecureCodec {
    pub fn neu(hkdf_salt: &[u8], framing: FramingMode, max_groesse: usize) -> Self {
        Self {
            schluessel: KeyAgreement::mit_salt(hkdf_salt),
            secrets: SecretStore::new(),
            framing,
            max_groesse,
        }
    }

    /// Eigener Handshake-Frame (roher Public Key, ggf. mit Typ-Byte)
    pub fn handshake_frame(&self) -> Vec<u8> {
        self.framing.encode_handshake(self.schluessel.public_key_bytes())
    }

    /// Baut die WireMessage fuer genau einen Empfaenger
    pub fn wire_nachricht(&self, peer: &PeerId, message: &Message) -> SessionResult<WireMessage> {
        if !self.secrets.has(peer) {
            return Ok(WireMessage::aus_nachricht(
                message,
                message.payload().to_vec(),
                false,
            ));
        }
        let key = self.secrets.get(peer)?;
        let ciphertext = encrypt(message.payload(), key)?;
        Ok(WireMessage::aus_nachricht(message, ciphertext, true))
    }

    /// Kodiert eine Nachricht fuer genau einen Empfaenger
    pub fn encode(&self, peer: &PeerId, message: &Message) -> SessionResult<Ausgehend> {
        let wire = self.wire_nachricht(peer, message)?;
        let json = wire.encode()?;
        Ok(Ausgehend {
            bytes: self.framing.encode_message(&json),
            verschluesselt: wire.is_encrypted,
        })
    }

    /// Verarbeitet empfangene Bytes des Transport-Absenders `von`
    pub fn decode(&mut self, von: &PeerId, bytes: &[u8]) -> SessionResult<Eingehend> {
        match self.framing.classify(bytes)? {
            Frame::Handshake(public_key) => {
                let key = self.schluessel.derive_shared_key(public_key)?;
                let ersetzt = self.secrets.put(von.clone(), key);
                Ok(Eingehend::Handshake { ersetzt })
            }
            Frame::Message(json) => {
                let mut wire = WireMessage::decode_mit_limit(json, self.max_groesse)?;
                let klartext = if wire.is_encrypted {
                    let key = self.secrets.get(von)?;
                    decrypt(&wire.payload, key)?
                } else {
                    std::mem::take(&mut wire.payload)
                };
                Ok(Eingehend::Nachricht(wire.in_nachricht(klartext)?))
            }
        }
    }

    pub fn hat_schluessel(&self, peer: &PeerId) -> bool {
        self.secrets.has(peer)
    }

    /// Entfernt den Schluessel eines Peers (Session beendet)
    pub fn peer_entfernen(&mut self, peer: &PeerId) -> bool {
        self.secrets.remove(peer)
    }

    pub fn leeren(&mut self) {
        self.secrets.clear();
    }

    /// Peers mit abgeschlossenem Handshake, sortiert
    pub fn peers_mit_schluessel(&self) -> Vec<PeerId> {
        self.secrets.peer_ids()
    }

    pub fn framing(&self) -> FramingMode {
        self.framing
    }
}

impl std::fmt::Debug for SecureCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureCodec")
            .field("framing", &self.framing)
            .field("schluessel", &self.secrets.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
