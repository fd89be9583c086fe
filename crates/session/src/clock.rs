//! Injizierbare Uhr fuer die Timer-Queue
//!
//! Die Zustandsmaschine fragt nie selbst die Systemzeit ab. Im Actor laeuft
//! `TokioClock` (respektiert pausierte Test-Zeit), Unit-Tests stellen eine
//! `ManualClock` von Hand vor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Zeitquelle der Session
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Uhr der Tokio-Runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Von Hand gestellte Uhr, Klone teilen dieselbe Zeit
#[derive(Debug, Clone)]
pub struct ManualClock {
    jetzt: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn neu() -> Self {
        Self {
            jetzt: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Stellt die Uhr um `dauer` vor
    pub fn vorstellen(&self, dauer: Duration) {
        *self.jetzt.lock() += dauer;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::neu()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.jetzt.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manuelle_uhr_steht_bis_zum_vorstellen() {
        let uhr = ManualClock::neu();
        let start = uhr.now();
        assert_eq!(uhr.now(), start);

        let klon = uhr.clone();
        klon.vorstellen(Duration::from_secs(3));
        assert_eq!(uhr.now() - start, Duration::from_secs(3));
    }
}
