use super::context::Context;
use crate::fixed_point::Fixed;
use crate::types::{LockId, Nice, Priority, SemaphoreId, ThreadId, Tick};
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::thread::JoinHandle;

/// Represents the current state of a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadState {
    /// Thread is currently executing on the CPU.
    Running,
    /// Thread is ready to run and is on the ready queue.
    Ready,
    /// Thread is waiting for an event: a semaphore, a wakeup time, or an
    /// explicit `unblock`.
    Blocked,
    /// Thread has exited; its record is reclaimed by a later switch.
    Dying,
}

/// Which queue, if any, currently holds the thread.
///
/// A thread is on at most one queue at a time; every queue operation checks
/// the tag it expects before changing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// Running, Dying, or blocked without a queue (`Kernel::block`, idle).
    Detached,
    /// On the ready queue.
    Ready,
    /// On the sleep queue.
    Sleeping,
    /// On the wait queue of a semaphore.
    Waiting(SemaphoreId),
}

/// Thread Control Block (TCB)
pub(crate) struct Thread {
    pub id: ThreadId,
    pub name: String,
    pub state: ThreadState,
    pub membership: Membership,
    /// Priority as set by the owner (or derived by MLFQS).
    pub base_priority: Priority,
    /// Priority used for every scheduling decision.
    pub priority: Priority,
    /// Lock this thread is blocked acquiring.
    pub waiting_lock: Option<LockId>,
    /// Threads blocked on locks this thread holds.
    pub donors: Vec<ThreadId>,
    pub nice: Nice,
    pub recent_cpu: Fixed,
    pub wakeup: Option<Tick>,
    pub context: Arc<Context>,
    // Detached on reclaim; the host thread finishes on its own.
    pub host: Option<JoinHandle<()>>,
}

impl Thread {
    pub fn new(id: ThreadId, name: &str, priority: Priority, context: Arc<Context>) -> Self {
        Self {
            id,
            name: name.into(),
            state: ThreadState::Blocked,
            membership: Membership::Detached,
            base_priority: priority,
            priority,
            waiting_lock: None,
            donors: Vec::new(),
            nice: 0,
            recent_cpu: Fixed::ZERO,
            wakeup: None,
            context,
            host: None,
        }
    }

    pub fn info(&self) -> ThreadInfo {
        ThreadInfo {
            id: self.id,
            name: self.name.clone(),
            state: self.state,
            membership: self.membership,
            base_priority: self.base_priority,
            priority: self.priority,
            waiting_lock: self.waiting_lock,
            donors: self.donors.clone(),
            nice: self.nice,
            recent_cpu: self.recent_cpu,
            wakeup: self.wakeup,
        }
    }
}

/// Snapshot of a thread record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadInfo {
    pub id: ThreadId,
    pub name: String,
    pub state: ThreadState,
    pub membership: Membership,
    pub base_priority: Priority,
    pub priority: Priority,
    pub waiting_lock: Option<LockId>,
    pub donors: Vec<ThreadId>,
    pub nice: Nice,
    pub recent_cpu: Fixed,
    pub wakeup: Option<Tick>,
}
