//! Timer-Queue der Zustandsmaschine
//!
//! Ein Timer ist nur Daten: Deadline plus Aktion. Die Queue wird vom
//! Besitzer der Zustandsmaschine abgefragt (`naechste_deadline`) und
//! abgearbeitet (`faellige`). Damit feuert nach `leeren()` garantiert kein
//! vorher geplanter Timer mehr.

use std::time::Instant;

use crate::role::Rolle;

/// Aktion die beim Ablauf eines Timers ausgefuehrt wird
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAktion {
    /// Rolle nach dem Settle-Delay tatsaechlich starten
    StartRolle(Rolle),
    /// Rolle nach einem Fehlschlag stoppen (erster Retry-Schritt)
    RetryStoppen(Rolle),
    /// Rolle nach dem Retry-Stop neu starten
    RetryStarten(Rolle),
}

impl TimerAktion {
    pub fn rolle(&self) -> Rolle {
        match *self {
            TimerAktion::StartRolle(r) | TimerAktion::RetryStoppen(r) | TimerAktion::RetryStarten(r) => r,
        }
    }
}

#[derive(Debug, Clone)]
struct Eintrag {
    deadline: Instant,
    seq: u64,
    aktion: TimerAktion,
}

/// Geplante Timer, nach Deadline und Einfuegereihenfolge abgearbeitet
#[derive(Debug, Default)]
pub struct TimerQueue {
    eintraege: Vec<Eintrag>,
    naechste_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn planen(&mut self, deadline: Instant, aktion: TimerAktion) {
        let seq = self.naechste_seq;
        self.naechste_seq += 1;
        self.eintraege.push(Eintrag { deadline, seq, aktion });
    }

    /// Entfernt alle Timer einer Rolle, gibt die Anzahl zurueck
    pub fn abbrechen_fuer(&mut self, rolle: Rolle) -> usize {
        let vorher = self.eintraege.len();
        self.eintraege.retain(|e| e.aktion.rolle() != rolle);
        vorher - self.eintraege.len()
    }

    pub fn naechste_deadline(&self) -> Option<Instant> {
        self.eintraege.iter().map(|e| e.deadline).min()
    }

    /// Entnimmt alle bis `jetzt` faelligen Aktionen in Ablaufreihenfolge
    pub fn faellige(&mut self, jetzt: Instant) -> Vec<TimerAktion> {
        let (mut faellig, rest): (Vec<_>, Vec<_>) =
            self.eintraege.drain(..).partition(|e| e.deadline <= jetzt);
        self.eintraege = rest;
        faellig.sort_by_key(|e| (e.deadline, e.seq));
        faellig.into_iter().map(|e| e.aktion).collect()
    }

    pub fn leeren(&mut self) {
        self.eintraege.clear();
    }

    pub fn len(&self) -> usize {
        self.eintraege.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eintraege.is_empty()
    }

    /// Geplante Aktionen (fuer Snapshots und Tests)
    pub fn aktionen(&self) -> Vec<TimerAktion> {
        let mut v: Vec<_> = self.eintraege.iter().collect();
        v.sort_by_key(|e| (e.deadline, e.seq));
        v.into_iter().map(|e| e.aktion).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn faellige_in_deadline_reihenfolge() {
        let t0 = Instant::now();
        let mut q = TimerQueue::new();
        q.planen(t0 + Duration::from_secs(5), TimerAktion::RetryStarten(Rolle::Hosting));
        q.planen(t0 + Duration::from_secs(1), TimerAktion::StartRolle(Rolle::Browsing));
        q.planen(t0 + Duration::from_secs(9), TimerAktion::StartRolle(Rolle::Hosting));

        assert_eq!(q.naechste_deadline(), Some(t0 + Duration::from_secs(1)));
        assert!(q.faellige(t0).is_empty());

        let faellig = q.faellige(t0 + Duration::from_secs(5));
        assert_eq!(
            faellig,
            vec![
                TimerAktion::StartRolle(Rolle::Browsing),
                TimerAktion::RetryStarten(Rolle::Hosting)
            ]
        );
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn gleiche_deadline_behaelt_einfuegereihenfolge() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.planen(t, TimerAktion::StartRolle(Rolle::Hosting));
        q.planen(t, TimerAktion::StartRolle(Rolle::Browsing));
        assert_eq!(
            q.faellige(t),
            vec![
                TimerAktion::StartRolle(Rolle::Hosting),
                TimerAktion::StartRolle(Rolle::Browsing)
            ]
        );
    }

    #[test]
    fn abbrechen_nur_fuer_eine_rolle() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.planen(t, TimerAktion::StartRolle(Rolle::Hosting));
        q.planen(t, TimerAktion::RetryStoppen(Rolle::Hosting));
        q.planen(t, TimerAktion::StartRolle(Rolle::Browsing));

        assert_eq!(q.abbrechen_fuer(Rolle::Hosting), 2);
        assert_eq!(q.aktionen(), vec![TimerAktion::StartRolle(Rolle::Browsing)]);
    }

    #[test]
    fn leeren_verhindert_ausfuehrung() {
        let t = Instant::now();
        let mut q = TimerQueue::new();
        q.planen(t, TimerAktion::StartRolle(Rolle::Hosting));
        q.leeren();
        assert!(q.faellige(t + Duration::from_secs(60)).is_empty());
        assert_eq!(q.naechste_deadline(), None);
    }
}
