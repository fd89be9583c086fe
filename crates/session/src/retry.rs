//! Retry-Strategie fuer fehlgeschlagenes Advertising/Browsing
//!
//! Nach dem n-ten Fehlschlag (n beginnt bei 1):
//! ```text
//! n <= max_versuche: Retry-Stop nach retry_verzoegerung * faktor^(n-1),
//!                    danach Neustart nach neustart_verzoegerung
//! n >  max_versuche: aufgeben
//! ```

use std::time::Duration;

/// Obergrenze fuer jede einzelne Verzoegerung (eine Stunde)
pub const MAX_VERZOEGERUNG: Duration = Duration::from_secs(60 * 60);

/// Begrenzte Wiederholungsstrategie mit exponentiellem Backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximale Anzahl Wiederholungen pro Rolle
    pub max_versuche: u32,
    /// Verzoegerung vor dem ersten Retry-Stop
    pub retry_verzoegerung: Duration,
    /// Multiplikator pro weiterem Versuch
    pub faktor: u32,
    /// Pause zwischen Retry-Stop und erneutem Start
    pub neustart_verzoegerung: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_versuche: 1,
            retry_verzoegerung: Duration::from_secs(3),
            faktor: 2,
            neustart_verzoegerung: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Keine Wiederholungen
    pub fn keine() -> Self {
        Self {
            max_versuche: 0,
            ..Self::default()
        }
    }

    /// Verzoegerung bis zum Retry-Stop fuer Fehlschlag Nummer `versuch`
    ///
    /// `None` heisst: Versuche erschoepft, aufgeben. Der Backoff wird bei
    /// [`MAX_VERZOEGERUNG`] gekappt.
    pub fn verzoegerung(&self, versuch: u32) -> Option<Duration> {
        if versuch == 0 || versuch > self.max_versuche {
            return None;
        }
        let multiplikator = self.faktor.checked_pow(versuch - 1).unwrap_or(u32::MAX);
        Some(
            self.retry_verzoegerung
                .saturating_mul(multiplikator)
                .min(MAX_VERZOEGERUNG),
        )
    }
}
