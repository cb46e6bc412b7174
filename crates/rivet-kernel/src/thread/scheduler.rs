use crate::types::{Priority, ThreadId, PRI_MAX};
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

/// The ready queue.
pub trait Scheduler: Send {
    /// Remove and return the thread that should run next.
    fn schedule(&mut self) -> Option<ThreadId>;

    /// Add a thread at the tail of its priority band.
    fn enqueue(&mut self, thread: ThreadId, priority: Priority);

    /// Move a queued thread to a new priority, keeping its arrival order.
    fn requeue(&mut self, thread: ThreadId, priority: Priority) -> bool;

    /// Priority of the thread `schedule` would return.
    fn peek_priority(&self) -> Option<Priority>;

    fn contains(&self, thread: ThreadId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

const BANDS: usize = PRI_MAX as usize + 1;

/// One FIFO band per priority level, with a bitmap of the non-empty ones.
///
/// Entries carry the sequence number they were enqueued with, so a thread
/// whose priority changes while Ready slots into its new band by arrival.
pub struct PriorityScheduler {
    bands: Vec<VecDeque<(u64, ThreadId)>>,
    occupied: u64,
    index: BTreeMap<ThreadId, (Priority, u64)>,
    next_seq: u64,
}

impl Default for PriorityScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PriorityScheduler {
    pub fn new() -> Self {
        Self {
            bands: (0..BANDS).map(|_| VecDeque::new()).collect(),
            occupied: 0,
            index: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn highest_band(&self) -> Option<usize> {
        if self.occupied == 0 {
            None
        } else {
            Some(63 - self.occupied.leading_zeros() as usize)
        }
    }

    fn remove_entry(&mut self, priority: Priority, seq: u64) {
        let band = &mut self.bands[priority as usize];
        let pos = band.partition_point(|&(s, _)| s < seq);
        debug_assert!(matches!(band.get(pos), Some(&(s, _)) if s == seq));
        band.remove(pos);
        if band.is_empty() {
            self.occupied &= !(1 << priority);
        }
    }

    fn insert_entry(&mut self, thread: ThreadId, priority: Priority, seq: u64) {
        let band = &mut self.bands[priority as usize];
        let pos = band.partition_point(|&(s, _)| s < seq);
        band.insert(pos, (seq, thread));
        self.occupied |= 1 << priority;
        self.index.insert(thread, (priority, seq));
    }
}

impl Scheduler for PriorityScheduler {
    fn schedule(&mut self) -> Option<ThreadId> {
        let priority = self.highest_band()?;
        let band = &mut self.bands[priority];
        let (_, thread) = band.pop_front()?;
        if band.is_empty() {
            self.occupied &= !(1 << priority);
        }
        self.index.remove(&thread);
        Some(thread)
    }

    fn enqueue(&mut self, thread: ThreadId, priority: Priority) {
        assert!(priority <= PRI_MAX, "priority {priority} out of range");
        assert!(
            !self.index.contains_key(&thread),
            "thread {thread} is already on the ready queue"
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.insert_entry(thread, priority, seq);
    }

    fn requeue(&mut self, thread: ThreadId, priority: Priority) -> bool {
        let Some(&(old, seq)) = self.index.get(&thread) else {
            return false;
        };
        if old != priority {
            self.remove_entry(old, seq);
            self.insert_entry(thread, priority, seq);
        }
        true
    }

    fn peek_priority(&self) -> Option<Priority> {
        self.highest_band().map(|p| p as Priority)
    }

    fn contains(&self, thread: ThreadId) -> bool {
        self.index.contains_key(&thread)
    }

    fn len(&self) -> usize {
        self.index.len()
    }
}
