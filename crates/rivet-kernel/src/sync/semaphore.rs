use crate::thread::tcb::{Membership, ThreadState};
use crate::thread::ThreadManager;
use crate::types::{SemaphoreId, ThreadId};
use crate::Kernel;
use alloc::vec::Vec;
use core::cmp::Reverse;
use log::{trace, warn};

pub(crate) struct SemaState {
    pub value: usize,
    /// `(arrival, thread)`, in arrival order.
    pub waiters: Vec<(u64, ThreadId)>,
}

impl ThreadManager {
    pub(crate) fn sema_create(&mut self, value: usize) -> SemaphoreId {
        let id = SemaphoreId::new(self.allocate_object());
        self.semaphores.insert(
            id,
            SemaState {
                value,
                waiters: Vec::new(),
            },
        );
        id
    }

    pub(crate) fn sema(&self, id: SemaphoreId) -> &SemaState {
        match self.semaphores.get(&id) {
            Some(s) => s,
            None => panic!("{id} does not exist"),
        }
    }

    fn sema_mut(&mut self, id: SemaphoreId) -> &mut SemaState {
        match self.semaphores.get_mut(&id) {
            Some(s) => s,
            None => panic!("{id} does not exist"),
        }
    }

    pub(crate) fn sema_try_down(&mut self, id: SemaphoreId) -> bool {
        let sema = self.sema_mut(id);
        if sema.value == 0 {
            return false;
        }
        sema.value -= 1;
        true
    }

    /// Queue `thread` on the semaphore and mark it blocked. The caller
    /// switches away afterwards.
    pub(crate) fn sema_wait(&mut self, id: SemaphoreId, thread: ThreadId) {
        let seq = self.next_seq();
        self.sema_mut(id).waiters.push((seq, thread));
        self.transfer(thread, Membership::Detached, Membership::Waiting(id));
        self.thread_mut(thread).state = ThreadState::Blocked;
        trace!("thread {thread} waits on {id}");
    }

    /// Release one unit. A waiter, if any, gets it directly and is returned.
    pub(crate) fn sema_up(&mut self, id: SemaphoreId) -> Option<ThreadId> {
        // Waiter priorities can change while they wait, so pick at wake time.
        let pick = self
            .sema(id)
            .waiters
            .iter()
            .enumerate()
            .max_by_key(|&(_, &(seq, t))| (self.thread(t).priority, Reverse(seq)))
            .map(|(i, _)| i);
        let Some(i) = pick else {
            self.sema_mut(id).value += 1;
            return None;
        };
        let (_, thread) = self.sema_mut(id).waiters.remove(i);
        self.transfer(thread, Membership::Waiting(id), Membership::Detached);
        self.enqueue_ready(thread);
        trace!("{id} wakes thread {thread}");
        Some(thread)
    }

    pub(crate) fn sema_destroy(&mut self, id: SemaphoreId) {
        if let Some(sema) = self.semaphores.remove(&id) {
            if !sema.waiters.is_empty() {
                warn!("{id} destroyed with {} waiters", sema.waiters.len());
            }
        }
    }
}

impl Kernel {
    pub(crate) fn sema_down(&self, id: SemaphoreId) {
        let mut st = self.state();
        if st.intr.in_handler {
            st.fatal(format!("down on {id} in interrupt context"));
        }
        if st.sema_try_down(id) {
            return;
        }
        let cur = st.current;
        st.sema_wait(id, cur);
        // The unit is ours once we run again.
        self.schedule(st);
    }

    pub(crate) fn sema_up(&self, id: SemaphoreId) {
        let mut st = self.state();
        st.sema_up(id);
        self.preempt_check(st);
    }
}

/// A counting semaphore.
///
/// Waiters are woken highest priority first, earliest arrival among equals.
pub struct Semaphore {
    kernel: Kernel,
    id: SemaphoreId,
}

impl Semaphore {
    pub fn new(kernel: &Kernel, value: usize) -> Self {
        let id = kernel.state().sema_create(value);
        Self {
            kernel: kernel.clone(),
            id,
        }
    }

    pub fn id(&self) -> SemaphoreId {
        self.id
    }

    /// Waits for a unit and takes it. May not be called in interrupt context.
    pub fn down(&self) {
        self.kernel.sema_down(self.id);
    }

    /// Takes a unit if one is available. Never blocks.
    pub fn try_down(&self) -> bool {
        self.kernel.state().sema_try_down(self.id)
    }

    /// Releases a unit. Never blocks; usable from timer hooks.
    pub fn up(&self) {
        self.kernel.sema_up(self.id);
    }

    pub fn value(&self) -> usize {
        self.kernel.state().sema(self.id).value
    }

    /// Number of threads blocked in `down`.
    pub fn waiters(&self) -> usize {
        self.kernel.state().sema(self.id).waiters.len()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        self.kernel.state().sema_destroy(self.id);
    }
}
