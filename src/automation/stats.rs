use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};

/// Run counters, incremented only by the worker.
///
/// Readers take point-in-time snapshots; no cross-field atomicity is needed
/// since the worker bumps at most one counter per state transition. Counters
/// reset only when the engine is re-created.
#[derive(Debug, Default)]
pub struct RunStats {
    battles_started: AtomicU32,
    victories: AtomicU32,
    defeats: AtomicU32,
    connection_losses: AtomicU32,
    errors: AtomicU32,
}

impl RunStats {
    pub fn record_battle_started(&self) {
        self.battles_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_victory(&self) {
        self.victories.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_defeat(&self) {
        self.defeats.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_loss(&self) {
        self.connection_losses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            battles_started: self.battles_started.load(Ordering::Relaxed),
            victories: self.victories.load(Ordering::Relaxed),
            defeats: self.defeats.load(Ordering::Relaxed),
            connection_losses: self.connection_losses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Immutable copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub battles_started: u32,
    pub victories: u32,
    pub defeats: u32,
    pub connection_losses: u32,
    pub errors: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = RunStats::default();
        stats.record_battle_started();
        stats.record_battle_started();
        stats.record_victory();
        stats.record_defeat();
        stats.record_connection_loss();
        stats.record_error();

        let snap = stats.snapshot();
        assert_eq!(snap.battles_started, 2);
        assert_eq!(snap.victories, 1);
        assert_eq!(snap.defeats, 1);
        assert_eq!(snap.connection_losses, 1);
        assert_eq!(snap.errors, 1);
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let stats = RunStats::default();
        let before = stats.snapshot();
        stats.record_victory();
        let after = stats.snapshot();
        assert_eq!(before.victories, 0);
        assert_eq!(after.victories, 1);
    }
}
