//! Per-thread allocation counters for value cells.
//!
//! Every non-immortal cell records itself on construction and again when it
//! is freed, so `snapshot().live()` is the number of cells currently alive on
//! this thread. Immortal cells are excluded.

use std::cell::Cell;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LeakStats {
    pub allocated: usize,
    pub freed: usize,
    pub closures_allocated: usize,
    pub closures_freed: usize,
}

impl LeakStats {
    pub fn live(&self) -> usize {
        self.allocated.saturating_sub(self.freed)
    }

    pub fn live_closures(&self) -> usize {
        self.closures_allocated.saturating_sub(self.closures_freed)
    }

    /// Counter deltas accumulated after `earlier` was taken.
    pub fn since(&self, earlier: &LeakStats) -> LeakStats {
        LeakStats {
            allocated: self.allocated - earlier.allocated,
            freed: self.freed - earlier.freed,
            closures_allocated: self.closures_allocated - earlier.closures_allocated,
            closures_freed: self.closures_freed - earlier.closures_freed,
        }
    }
}

thread_local! {
    static ALLOCATED: Cell<usize> = const { Cell::new(0) };
    static FREED: Cell<usize> = const { Cell::new(0) };
    static CLOSURES_ALLOCATED: Cell<usize> = const { Cell::new(0) };
    static CLOSURES_FREED: Cell<usize> = const { Cell::new(0) };
}

fn bump(counter: &'static std::thread::LocalKey<Cell<usize>>) {
    // Cells freed during thread teardown may outlive the counters.
    let _ = counter.try_with(|c| c.set(c.get() + 1));
}

pub fn record_alloc(closure: bool) {
    bump(&ALLOCATED);
    if closure {
        bump(&CLOSURES_ALLOCATED);
    }
}

pub fn record_free(closure: bool) {
    bump(&FREED);
    if closure {
        bump(&CLOSURES_FREED);
    }
}

pub fn snapshot() -> LeakStats {
    LeakStats {
        allocated: ALLOCATED.with(Cell::get),
        freed: FREED.with(Cell::get),
        closures_allocated: CLOSURES_ALLOCATED.with(Cell::get),
        closures_freed: CLOSURES_FREED.with(Cell::get),
    }
}
