use crate::config::Policy;
use crate::thread::ThreadManager;
use crate::types::{LockId, SemaphoreId, ThreadId};
use crate::Kernel;
use alloc::vec::Vec;
use log::{debug, trace, warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct LockState {
    pub sema: SemaphoreId,
    pub owner: Option<ThreadId>,
}

impl ThreadManager {
    fn lock_state(&self, id: LockId) -> LockState {
        match self.locks.get(&id) {
            Some(l) => *l,
            None => panic!("{id} does not exist"),
        }
    }

    fn set_owner(&mut self, id: LockId, owner: Option<ThreadId>) {
        if let Some(lock) = self.locks.get_mut(&id) {
            lock.owner = owner;
        }
    }

    /// Lend `donor`'s priority down the chain of lock owners it waits
    /// behind.
    fn donate(&mut self, donor: ThreadId, max_depth: usize) {
        let priority = self.thread(donor).priority;
        let mut waiting = self.thread(donor).waiting_lock;
        let mut depth = 0;
        while let Some(lock) = waiting {
            let Some(holder) = self.lock_state(lock).owner else {
                break;
            };
            if holder == donor {
                self.fatal(format!("lock-wait cycle through {lock} back to thread {donor}"));
            }
            let Some(h) = self.threads.get(&holder) else {
                break;
            };
            if h.priority >= priority {
                break;
            }
            depth += 1;
            if depth > max_depth {
                self.fatal(format!(
                    "donation chain from thread {donor} longer than {max_depth} links"
                ));
            }
            debug!("thread {donor} donates {priority} to {holder} through {lock}");
            self.set_effective(holder, priority);
            waiting = self.thread(holder).waiting_lock;
        }
    }

    /// Make `owner`, just woken by the release of `lock`, its holder.
    fn hand_over(&mut self, lock: LockId, owner: ThreadId) {
        let sema = self.lock_state(lock).sema;
        self.set_owner(lock, Some(owner));
        self.thread_mut(owner).waiting_lock = None;
        if self.policy == Policy::Priority {
            // Everyone still queued now waits behind the new owner.
            let waiters: Vec<ThreadId> = self.sema(sema).waiters.iter().map(|&(_, t)| t).collect();
            let t = self.thread_mut(owner);
            for w in waiters {
                if !t.donors.contains(&w) {
                    t.donors.push(w);
                }
            }
            self.refresh_priority(owner);
        }
        debug!("{lock} handed to thread {owner}");
    }
}

/// A mutual-exclusion lock owned by at most one thread.
///
/// Under the priority policy a thread blocked on the lock lends its
/// priority to the owner, and on through whatever the owner waits for.
/// Not recursive: acquiring a lock you hold is fatal.
pub struct Lock {
    kernel: Kernel,
    id: LockId,
}

impl Lock {
    pub fn new(kernel: &Kernel) -> Self {
        let mut st = kernel.state();
        let sema = st.sema_create(1);
        let id = LockId::new(st.allocate_object());
        st.locks.insert(id, LockState { sema, owner: None });
        drop(st);
        Self {
            kernel: kernel.clone(),
            id,
        }
    }

    pub fn id(&self) -> LockId {
        self.id
    }

    /// Blocks until the lock is free, then takes it.
    pub fn acquire(&self) {
        let config = self.kernel.config();
        let mut st = self.kernel.state();
        let cur = st.current;
        if st.intr.in_handler {
            st.fatal(format!("acquire of {} in interrupt context", self.id));
        }
        let LockState { sema, owner } = st.lock_state(self.id);
        if owner == Some(cur) {
            st.fatal(format!("thread {cur} acquires {}, which it already holds", self.id));
        }
        if st.sema_try_down(sema) {
            st.set_owner(self.id, Some(cur));
            trace!("thread {cur} took {}", self.id);
            return;
        }

        st.thread_mut(cur).waiting_lock = Some(self.id);
        if config.policy == Policy::Priority {
            if let Some(holder) = owner.and_then(|o| st.threads.get_mut(&o)) {
                holder.donors.push(cur);
            }
            st.donate(cur, config.donation_depth);
        }
        st.sema_wait(sema, cur);
        // `release` makes us the owner before waking us.
        self.kernel.schedule(st);
    }

    /// Takes the lock if it is free. Never blocks and never donates.
    pub fn try_acquire(&self) -> bool {
        let mut st = self.kernel.state();
        let cur = st.current;
        let LockState { sema, owner } = st.lock_state(self.id);
        if owner == Some(cur) {
            st.fatal(format!("thread {cur} acquires {}, which it already holds", self.id));
        }
        if !st.sema_try_down(sema) {
            return false;
        }
        st.set_owner(self.id, Some(cur));
        true
    }

    /// Releases the lock, which the caller must hold.
    pub fn release(&self) {
        let mut guard = self.kernel.state();
        let st = &mut *guard;
        let cur = st.current;
        let LockState { sema, owner } = st.lock_state(self.id);
        if owner != Some(cur) {
            st.fatal(format!("thread {cur} releases {}, which it does not hold", self.id));
        }
        st.set_owner(self.id, None);
        if st.policy == Policy::Priority {
            let id = self.id;
            let donors = core::mem::take(&mut st.thread_mut(cur).donors);
            let kept: Vec<ThreadId> = donors
                .into_iter()
                .filter(|d| st.threads.get(d).is_some_and(|t| t.waiting_lock != Some(id)))
                .collect();
            st.thread_mut(cur).donors = kept;
            st.refresh_priority(cur);
        }
        if let Some(next) = st.sema_up(sema) {
            st.hand_over(self.id, next);
        }
        trace!("thread {cur} released {}", self.id);
        self.kernel.preempt_check(guard);
    }

    pub fn held_by_current(&self) -> bool {
        let st = self.kernel.state();
        st.lock_state(self.id).owner == Some(st.current)
    }

    /// Thread holding the lock.
    ///
    /// A release that wakes a waiter makes that waiter the owner at once, so
    /// this may name a thread that has not yet returned from `acquire`.
    pub fn owner(&self) -> Option<ThreadId> {
        self.kernel.state().lock_state(self.id).owner
    }
}

impl Drop for Lock {
    fn drop(&mut self) {
        let mut st = self.kernel.state();
        if let Some(lock) = st.locks.remove(&self.id) {
            if let Some(owner) = lock.owner {
                warn!("{} dropped while held by thread {owner}", self.id);
            }
            st.sema_destroy(lock.sema);
        }
    }
}
