//! Rolling performance counters
//!
//! Reset to zero whenever a metronome is created; nothing is persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingCounters {
    /// Cycles that completed successfully.
    pub cycles: u64,
    /// Cycles that returned an error or panicked.
    pub failed_cycles: u64,
    /// Exponential moving average of cycle duration, milliseconds.
    pub ema_cycle_ms: f64,
    /// Duration of the last successful cycle, milliseconds.
    pub last_cycle_ms: f64,
    /// Atoms at or above the consolidation threshold after the last cycle.
    pub consolidated: usize,
    /// Atoms removed by decay since start, failed cycles included.
    pub total_removed: u64,
    /// Atoms promoted since start, failed cycles included.
    pub total_promoted: u64,
    /// Scheduled introspection runs.
    pub introspections: u64,
    /// Scheduled auto-optimization runs.
    pub optimizations: u64,
}

impl RollingCounters {
    /// Fold one successful cycle in. The first sample seeds the EMA.
    pub fn record(&mut self, alpha: f64, cycle_ms: f64, consolidated: usize, removed: usize, promoted: usize) {
        self.ema_cycle_ms = if self.cycles == 0 {
            cycle_ms
        } else {
            alpha * cycle_ms + (1.0 - alpha) * self.ema_cycle_ms
        };
        self.cycles += 1;
        self.last_cycle_ms = cycle_ms;
        self.consolidated = consolidated;
        self.total_removed += removed as u64;
        self.total_promoted += promoted as u64;
    }

    /// Count a failed cycle. A failed cycle is not rolled back, so whatever
    /// it removed or promoted still goes into the totals.
    pub fn record_failure(&mut self, removed: usize, promoted: usize) {
        self.failed_cycles += 1;
        self.total_removed += removed as u64;
        self.total_promoted += promoted as u64;
    }
}
