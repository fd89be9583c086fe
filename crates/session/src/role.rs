//! Discovery-Rollen und ihr Lebenszyklus
//!
//! Hosting (Advertising) und Browsing (Scanning) laufen unabhaengig
//! voneinander, jede Rolle hat eine eigene Phase und einen eigenen
//! Fehlerzaehler.
//!
//! ```text
//! Idle -> Starting -> Active
//!           ^           |  Fehler
//!           |           v
//!           +------- Retrying -> Idle (aufgegeben)
//! ```

use serde::{Deserialize, Serialize};

/// Discovery-Rolle eines Knotens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rolle {
    /// Eigenen Dienst ankuendigen
    Hosting,
    /// Nach anderen Knoten suchen
    Browsing,
}

impl std::fmt::Display for Rolle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rolle::Hosting => write!(f, "hosting"),
            Rolle::Browsing => write!(f, "browsing"),
        }
    }
}

/// Phase einer Rolle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollenPhase {
    #[default]
    Idle,
    /// Stop ausgegeben, Start nach Settle-Delay ausstehend
    Starting,
    Active,
    /// Fehler beobachtet, Retry-Timer ausstehend
    Retrying,
}

/// Zustand einer Rolle inkl. Fehlerzaehler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RollenStatus {
    pub phase: RollenPhase,
    pub fehlversuche: u32,
}

impl RollenStatus {
    /// Zaehlt fuer den globalen Status als "live"
    pub fn ist_live(&self) -> bool {
        matches!(self.phase, RollenPhase::Starting | RollenPhase::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nur_starting_und_active_sind_live() {
        let mut s = RollenStatus::default();
        assert!(!s.ist_live());
        s.phase = RollenPhase::Starting;
        assert!(s.ist_live());
        s.phase = RollenPhase::Active;
        assert!(s.ist_live());
        s.phase = RollenPhase::Retrying;
        assert!(!s.ist_live());
    }
}
