use super::lock::Lock;
use crate::types::{CondvarId, Priority, SemaphoreId};
use crate::Kernel;
use alloc::vec::Vec;
use core::cmp::Reverse;
use log::{trace, warn};

/// One thread blocked in `Condvar::wait`.
pub(crate) struct CondWaiter {
    pub sema: SemaphoreId,
    pub priority: Priority,
    pub seq: u64,
}

/// A condition variable with Mesa semantics: a woken waiter re-acquires the
/// lock and must re-check its condition.
pub struct Condvar {
    kernel: Kernel,
    id: CondvarId,
}

impl Condvar {
    pub fn new(kernel: &Kernel) -> Self {
        let mut st = kernel.state();
        let id = CondvarId::new(st.allocate_object());
        st.condvars.insert(id, Vec::new());
        drop(st);
        Self {
            kernel: kernel.clone(),
            id,
        }
    }

    pub fn id(&self) -> CondvarId {
        self.id
    }

    /// Atomically releases `lock` and waits to be signalled, then
    /// re-acquires `lock` before returning.
    pub fn wait(&self, lock: &Lock) {
        let held = lock.held_by_current();
        let mut st = self.kernel.state();
        let cur = st.current;
        if st.intr.in_handler {
            st.fatal(format!("wait on {} in interrupt context", self.id));
        }
        if !held {
            st.fatal(format!("thread {cur} waits on {} without holding {}", self.id, lock.id()));
        }
        let sema = st.sema_create(0);
        let waiter = CondWaiter {
            sema,
            priority: st.thread(cur).priority,
            seq: st.next_seq(),
        };
        match st.condvars.get_mut(&self.id) {
            Some(waiters) => waiters.push(waiter),
            None => st.fatal(format!("{} does not exist", self.id)),
        }
        trace!("thread {cur} waits on {}", self.id);
        drop(st);

        lock.release();
        self.kernel.sema_down(sema);
        lock.acquire();
        self.kernel.state().sema_destroy(sema);
    }

    /// Wakes the highest-priority waiter, if any. The caller must hold
    /// `lock`.
    pub fn signal(&self, lock: &Lock) {
        if let Some(sema) = self.take_waiter(lock, "signal") {
            self.kernel.sema_up(sema);
        }
    }

    /// Wakes every waiter. The caller must hold `lock`.
    pub fn broadcast(&self, lock: &Lock) {
        while let Some(sema) = self.take_waiter(lock, "broadcast") {
            self.kernel.sema_up(sema);
        }
    }

    fn take_waiter(&self, lock: &Lock, op: &str) -> Option<SemaphoreId> {
        let held = lock.held_by_current();
        let mut st = self.kernel.state();
        if !held {
            let cur = st.current;
            st.fatal(format!("thread {cur} calls {op} on {} without holding {}", self.id, lock.id()));
        }
        let waiters = st.condvars.get_mut(&self.id)?;
        let (i, _) = waiters
            .iter()
            .enumerate()
            .max_by_key(|(_, w)| (w.priority, Reverse(w.seq)))?;
        Some(waiters.remove(i).sema)
    }

    /// Number of threads waiting.
    pub fn waiters(&self) -> usize {
        self.kernel
            .state()
            .condvars
            .get(&self.id)
            .map_or(0, Vec::len)
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        let mut st = self.kernel.state();
        if let Some(waiters) = st.condvars.remove(&self.id) {
            if !waiters.is_empty() {
                warn!("{} dropped with {} waiters", self.id, waiters.len());
            }
        }
    }
}
