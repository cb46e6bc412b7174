use crate::types::{ThreadId, Tick};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;

/// Threads blocked in a timed sleep, ordered by wakeup tick then arrival.
pub(crate) struct SleepQueue {
    sleepers: BTreeMap<(Tick, u64), ThreadId>,
    next_seq: u64,
    // Earliest pending wakeup; Tick::MAX when nobody sleeps. Checked on every
    // tick, so it must stay a plain compare.
    next_wakeup: Tick,
}

impl SleepQueue {
    pub fn new() -> Self {
        Self {
            sleepers: BTreeMap::new(),
            next_seq: 0,
            next_wakeup: Tick::MAX,
        }
    }

    pub fn insert(&mut self, thread: ThreadId, wakeup: Tick) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.sleepers.insert((wakeup, seq), thread);
        self.next_wakeup = self.next_wakeup.min(wakeup);
    }

    /// Earliest pending wakeup, if anyone sleeps.
    pub fn next_wakeup(&self) -> Option<Tick> {
        (self.next_wakeup != Tick::MAX).then_some(self.next_wakeup)
    }

    /// Whether anything is due at `now`.
    pub fn due(&self, now: Tick) -> bool {
        now >= self.next_wakeup
    }

    /// Remove every sleeper whose wakeup is at or before `now`, earliest first.
    pub fn expire(&mut self, now: Tick) -> Vec<ThreadId> {
        if !self.due(now) {
            return Vec::new();
        }
        let later = self.sleepers.split_off(&(now + 1, 0));
        let expired = core::mem::replace(&mut self.sleepers, later);
        self.next_wakeup = self
            .sleepers
            .keys()
            .next()
            .map_or(Tick::MAX, |&(tick, _)| tick);
        expired.into_values().collect()
    }

    pub fn contains(&self, thread: ThreadId) -> bool {
        self.sleepers.values().any(|&t| t == thread)
    }

    pub fn is_empty(&self) -> bool {
        self.sleepers.is_empty()
    }
}
