//! Per-cell thumbnail load lifecycle.
//!
//! Each visible grid cell runs a small state machine: it waits for the
//! viewport proximity gate (or a priority flag), loads, and on failure
//! retries automatically at growing delays before surfacing a manual-retry
//! affordance. Retry timers are plain deadlines owned by the tracker and
//! polled from the UI tick — when a cell's entry is dropped its timer goes
//! with it, so a stale timer can never touch a torn-down cell.

use std::collections::HashMap;
use tokio::time::{Duration, Instant};

/// Automatic retries before a cell gives up and waits for the user.
pub const MAX_AUTO_RETRIES: u8 = 2;
/// Backoff grows linearly: `RETRY_BASE_DELAY * (retries_used + 1)`.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Load phase of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellPhase {
    /// Not yet loading; waiting for the proximity gate or a priority flag.
    Pending,
    /// A fetch is outstanding.
    Loading,
    /// Failed; will re-enter Loading when the deadline passes.
    PendingRetry { until: Instant },
    /// Thumbnail bytes arrived.
    Loaded,
    /// Auto-retries exhausted; only a manual retry resets the cell.
    Errored,
}

#[derive(Debug)]
struct CellState {
    phase: CellPhase,
    retries_used: u8,
}

impl CellState {
    fn new() -> Self {
        Self {
            phase: CellPhase::Pending,
            retries_used: 0,
        }
    }
}

/// Cell state for every feed currently in the collection, keyed by feed id.
#[derive(Debug, Default)]
pub struct CellTracker {
    cells: HashMap<i64, CellState>,
}

impl CellTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase; unknown cells are Pending.
    pub fn phase(&self, feed_id: i64) -> CellPhase {
        self.cells
            .get(&feed_id)
            .map(|cell| cell.phase)
            .unwrap_or(CellPhase::Pending)
    }

    pub fn retries_used(&self, feed_id: i64) -> u8 {
        self.cells
            .get(&feed_id)
            .map(|cell| cell.retries_used)
            .unwrap_or(0)
    }

    /// Claim a load for a pending cell. Returns true when the caller should
    /// spawn the fetch; false when the cell is already past Pending.
    pub fn begin_load(&mut self, feed_id: i64) -> bool {
        let cell = self.cells.entry(feed_id).or_insert_with(CellState::new);
        if cell.phase == CellPhase::Pending {
            cell.phase = CellPhase::Loading;
            true
        } else {
            false
        }
    }

    /// Record a successful load. Also used for cache hits straight from
    /// Pending.
    pub fn mark_loaded(&mut self, feed_id: i64) {
        let cell = self.cells.entry(feed_id).or_insert_with(CellState::new);
        cell.phase = CellPhase::Loaded;
    }

    /// Record a failed load: schedules the next automatic retry, or parks
    /// the cell in Errored once both retries are spent.
    pub fn mark_failed(&mut self, feed_id: i64, now: Instant) -> CellPhase {
        let cell = self.cells.entry(feed_id).or_insert_with(CellState::new);
        if cell.retries_used < MAX_AUTO_RETRIES {
            let delay = RETRY_BASE_DELAY * u32::from(cell.retries_used) + RETRY_BASE_DELAY;
            cell.retries_used += 1;
            cell.phase = CellPhase::PendingRetry { until: now + delay };
        } else {
            cell.phase = CellPhase::Errored;
        }
        cell.phase
    }

    /// User-requested retry: resets the retry budget and re-enters Pending,
    /// so the next tick re-runs the proximity gate. Allowed any number of
    /// times.
    pub fn manual_retry(&mut self, feed_id: i64) {
        let cell = self.cells.entry(feed_id).or_insert_with(CellState::new);
        cell.retries_used = 0;
        cell.phase = CellPhase::Pending;
    }

    /// Flip every due retry deadline back to Loading and return the ids
    /// whose fetch should be spawned now.
    pub fn poll_retries(&mut self, now: Instant) -> Vec<i64> {
        let mut due = Vec::new();
        for (id, cell) in &mut self.cells {
            if let CellPhase::PendingRetry { until } = cell.phase {
                if now >= until {
                    cell.phase = CellPhase::Loading;
                    due.push(*id);
                }
            }
        }
        due
    }

    /// Drop state for cells whose feed left the collection; their retry
    /// deadlines are discarded with them.
    pub fn retain(&mut self, mut keep: impl FnMut(i64) -> bool) {
        self.cells.retain(|id, _| keep(*id));
    }

    /// Drop everything — used when the collection resets on a sort change.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}
