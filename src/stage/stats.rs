use std::sync::atomic::{AtomicUsize, Ordering};

/// Live item accounting shared by every worker of one stage
#[derive(Debug, Default)]
pub struct StageStats {
    fetched: AtomicUsize,
    emitted: AtomicUsize,
    canceled: AtomicUsize,
}

impl StageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_fetched(&self) {
        self.fetched.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_emitted(&self) {
        self.emitted.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn record_canceled(&self) {
        self.canceled.fetch_add(1, Ordering::AcqRel);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        // Resolutions are loaded before fetches so a concurrent snapshot never
        // reports more resolved items than fetched ones.
        let emitted = self.emitted.load(Ordering::Acquire);
        let canceled = self.canceled.load(Ordering::Acquire);
        let fetched = self.fetched.load(Ordering::Acquire);

        StatsSnapshot {
            fetched,
            emitted,
            canceled,
        }
    }
}

/// Counters captured by [`StageStats::snapshot`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Items taken from the input stream
    pub fetched: usize,
    /// Items handed to the output stream
    pub emitted: usize,
    /// Items handed to the transformer's cancel callback
    pub canceled: usize,
}

impl StatsSnapshot {
    /// Items fetched but not yet emitted or canceled
    pub fn in_flight(&self) -> usize {
        self.fetched
            .saturating_sub(self.emitted)
            .saturating_sub(self.canceled)
    }

    /// True once every fetched item has been resolved
    pub fn is_settled(&self) -> bool {
        self.in_flight() == 0
    }
}
