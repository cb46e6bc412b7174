pub(crate) mod context;
mod mlfqs;
pub mod scheduler;
mod sleep;
pub mod tcb;

use crate::config::{KernelConfig, Policy};
use crate::error::KernelError;
use crate::fixed_point::Fixed;
use crate::sync::condvar::CondWaiter;
use crate::sync::lock::LockState;
use crate::sync::semaphore::SemaState;
use crate::sync::spinlock::SpinLockGuard;
use crate::timer::{InterruptState, TimerHook};
use crate::types::{CondvarId, LockId, Priority, SemaphoreId, ThreadId, Tick, NICE_DEFAULT, PRI_DEFAULT, PRI_MAX, PRI_MIN};
use crate::Kernel;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use context::{panic_message, Context, Resume, Unwind};
use core::fmt;
use log::{debug, error, trace, warn};
use scheduler::{PriorityScheduler, Scheduler};
use sleep::SleepQueue;
use std::panic::{self, AssertUnwindSafe};
use tcb::{Membership, Thread, ThreadInfo, ThreadState};

/// Counters reported at shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub ticks: Tick,
    pub idle_ticks: Tick,
    pub kernel_ticks: Tick,
    pub context_switches: u64,
    pub threads_created: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timer: {} ticks; Thread: {} idle ticks, {} kernel ticks; {} context switches, {} threads created",
            self.ticks, self.idle_ticks, self.kernel_ticks, self.context_switches, self.threads_created
        )
    }
}

/// All scheduler state. Lives behind the kernel's spin lock; holding the
/// guard is what "interrupts off" means.
pub(crate) struct ThreadManager {
    pub policy: Policy,
    pub threads: BTreeMap<ThreadId, Thread>,
    pub scheduler: Box<dyn Scheduler>,
    pub sleepers: SleepQueue,
    pub current: ThreadId,
    pub initial: ThreadId,
    pub idle: ThreadId,
    next_tid: u32,
    next_object: u32,
    next_seq: u64,
    /// Ticks the running thread has had since it was switched in.
    pub slice_ticks: u32,
    pub ticks: Tick,
    pub load_avg: Fixed,
    pub stats: Stats,
    /// Exited threads waiting to be reclaimed by the next switch.
    pub dying: Vec<ThreadId>,
    pub semaphores: BTreeMap<SemaphoreId, SemaState>,
    pub locks: BTreeMap<LockId, LockState>,
    pub condvars: BTreeMap<CondvarId, Vec<CondWaiter>>,
    pub intr: InterruptState,
    pub timer_hooks: Vec<TimerHook>,
    pub halted: Option<String>,
}

impl ThreadManager {
    /// State for a kernel whose only thread is the caller, running as "main".
    pub fn new(config: &KernelConfig) -> Self {
        let main = ThreadId::new(1).expect("tid is non-zero");
        let mut thread = Thread::new(main, "main", PRI_DEFAULT, Arc::new(Context::new()));
        thread.state = ThreadState::Running;
        if config.policy == Policy::Mlfqs {
            thread.base_priority = mlfqs::priority(thread.recent_cpu, thread.nice);
            thread.priority = thread.base_priority;
        }
        let mut threads = BTreeMap::new();
        threads.insert(main, thread);
        Self {
            policy: config.policy,
            threads,
            scheduler: Box::new(PriorityScheduler::new()),
            sleepers: SleepQueue::new(),
            current: main,
            initial: main,
            // Replaced once the idle thread exists.
            idle: main,
            next_tid: 2,
            next_object: 1,
            next_seq: 0,
            slice_ticks: 0,
            ticks: 0,
            load_avg: Fixed::ZERO,
            stats: Stats {
                threads_created: 1,
                ..Stats::default()
            },
            dying: Vec::new(),
            semaphores: BTreeMap::new(),
            locks: BTreeMap::new(),
            condvars: BTreeMap::new(),
            intr: InterruptState::default(),
            timer_hooks: Vec::new(),
            halted: None,
        }
    }

    pub fn thread(&self, id: ThreadId) -> &Thread {
        match self.threads.get(&id) {
            Some(t) => t,
            None => panic!("no thread {id}"),
        }
    }

    pub fn thread_mut(&mut self, id: ThreadId) -> &mut Thread {
        match self.threads.get_mut(&id) {
            Some(t) => t,
            None => panic!("no thread {id}"),
        }
    }

    fn allocate_tid(&mut self) -> ThreadId {
        let id = ThreadId::new(self.next_tid).expect("tid is non-zero");
        self.next_tid += 1;
        id
    }

    /// Id for a new semaphore, lock or condition variable.
    pub fn allocate_object(&mut self) -> u32 {
        let id = self.next_object;
        self.next_object += 1;
        id
    }

    /// Arrival order shared by every wait queue.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Threads that have not exited yet, idle and the initial thread included.
    pub fn live_threads(&self) -> usize {
        self.threads
            .values()
            .filter(|t| t.state != ThreadState::Dying)
            .count()
    }

    /// Stop the machine: every other context is released and unwinds.
    pub fn halt(&mut self, reason: String) {
        if self.halted.is_some() {
            return;
        }
        let current = self.current;
        for t in self.threads.values().filter(|t| t.id != current) {
            t.context.resume(Resume::Halt);
        }
        self.halted = Some(reason);
    }

    /// A broken kernel invariant. Never returns.
    pub fn fatal(&mut self, msg: impl Into<String>) -> ! {
        let msg = msg.into();
        error!("kernel panic: {msg}");
        self.halt(msg.clone());
        panic!("{msg}");
    }

    /// Move `id` between queues, checking where it is now.
    pub fn transfer(&mut self, id: ThreadId, from: Membership, to: Membership) {
        let found = self.thread(id).membership;
        if found != from {
            self.fatal(format!("thread {id} expected on {from:?} but found on {found:?}"));
        }
        self.thread_mut(id).membership = to;
    }

    /// Put a detached thread on the ready queue.
    pub fn enqueue_ready(&mut self, id: ThreadId) {
        self.transfer(id, Membership::Detached, Membership::Ready);
        let t = self.thread_mut(id);
        t.state = ThreadState::Ready;
        let priority = t.priority;
        self.scheduler.enqueue(id, priority);
        trace!("thread {id} ready at priority {priority}");
    }

    pub fn set_effective(&mut self, id: ThreadId, priority: Priority) {
        let t = self.thread_mut(id);
        t.priority = priority;
        if t.state == ThreadState::Ready {
            self.scheduler.requeue(id, priority);
        }
    }

    /// Recompute effective priority as the max of base and every donor.
    pub fn refresh_priority(&mut self, id: ThreadId) {
        let t = self.thread(id);
        let donated = t
            .donors
            .iter()
            .filter_map(|d| self.threads.get(d))
            .map(|d| d.priority)
            .max();
        let priority = donated.map_or(t.base_priority, |d| d.max(t.base_priority));
        self.set_effective(id, priority);
    }

    /// Whether the running thread should give up the CPU right now.
    pub fn should_preempt(&self) -> bool {
        match self.scheduler.peek_priority() {
            None => false,
            Some(_) if self.current == self.idle => true,
            Some(p) => p > self.thread(self.current).priority,
        }
    }

    /// Drop the records of threads that finished switching away.
    fn reap(&mut self) {
        for id in core::mem::take(&mut self.dying) {
            if let Some(t) = self.threads.remove(&id) {
                trace!("reclaimed thread {id} `{}`", t.name);
            }
        }
    }

    /// Check every scheduler invariant.
    fn audit(&self) -> Result<(), String> {
        let running: Vec<_> = self
            .threads
            .values()
            .filter(|t| t.state == ThreadState::Running)
            .map(|t| t.id)
            .collect();
        if running != [self.current] {
            return Err(format!(
                "running threads {running:?}, current is {}",
                self.current
            ));
        }

        for t in self.threads.values() {
            if t.state == ThreadState::Dying {
                continue;
            }
            let id = t.id;
            match self.policy {
                Policy::Priority => {
                    let donated = t
                        .donors
                        .iter()
                        .filter_map(|d| self.threads.get(d))
                        .map(|d| d.priority)
                        .max()
                        .unwrap_or(PRI_MIN);
                    if t.priority != t.base_priority.max(donated) {
                        return Err(format!(
                            "thread {id} has priority {} but base {} and best donor {donated}",
                            t.priority, t.base_priority
                        ));
                    }
                }
                Policy::Mlfqs => {
                    if !t.donors.is_empty() || t.priority != t.base_priority {
                        return Err(format!("thread {id} has donations under MLFQS"));
                    }
                }
            }
            if t.donors.contains(&id) {
                return Err(format!("thread {id} donates to itself"));
            }

            let ready = t.state == ThreadState::Ready;
            if ready != self.scheduler.contains(id) || ready != (t.membership == Membership::Ready) {
                return Err(format!(
                    "thread {id} is {:?} on {:?}, ready queue membership {}",
                    t.state,
                    t.membership,
                    self.scheduler.contains(id)
                ));
            }
            match t.membership {
                Membership::Sleeping => {
                    if t.state != ThreadState::Blocked || !self.sleepers.contains(id) {
                        return Err(format!("thread {id} marked sleeping but not asleep"));
                    }
                }
                Membership::Waiting(s) => {
                    let queued = self
                        .semaphores
                        .get(&s)
                        .is_some_and(|sema| sema.waiters.iter().any(|&(_, w)| w == id));
                    if t.state != ThreadState::Blocked || !queued {
                        return Err(format!("thread {id} marked waiting on {s} but not queued"));
                    }
                }
                _ => {}
            }

            if let Some(lock_id) = t.waiting_lock {
                let Some(lock) = self.locks.get(&lock_id) else {
                    return Err(format!("thread {id} waits on missing {lock_id}"));
                };
                if t.membership != Membership::Waiting(lock.sema) {
                    return Err(format!("thread {id} waits on {lock_id} but is {:?}", t.membership));
                }
                if lock.owner == Some(id) {
                    return Err(format!("thread {id} waits on {lock_id}, which it owns"));
                }
                if self.policy == Policy::Priority {
                    if let Some(owner) = lock.owner.and_then(|o| self.threads.get(&o)) {
                        if owner.priority < t.priority {
                            return Err(format!(
                                "thread {id} at {} waits on {lock_id} held by {} at {}",
                                t.priority, owner.id, owner.priority
                            ));
                        }
                    }
                }
            }
        }

        for (&lock_id, lock) in &self.locks {
            let Some(sema) = self.semaphores.get(&lock.sema) else {
                return Err(format!("{lock_id} lost its semaphore"));
            };
            if lock.owner.is_none() != (sema.value == 1) {
                return Err(format!(
                    "{lock_id} owner {:?} with {} units",
                    lock.owner, sema.value
                ));
            }
            for &(_, w) in &sema.waiters {
                if self.threads.get(&w).and_then(|t| t.waiting_lock) != Some(lock_id) {
                    return Err(format!("thread {w} queued on {lock_id} without waiting for it"));
                }
            }
        }

        let earliest = self
            .threads
            .values()
            .filter(|t| t.membership == Membership::Sleeping)
            .filter_map(|t| t.wakeup)
            .min();
        if self.sleepers.next_wakeup() != earliest {
            return Err(format!(
                "sleep queue expects a wakeup at {:?}, earliest sleeper wants {earliest:?}",
                self.sleepers.next_wakeup()
            ));
        }

        let idle = self.thread(self.idle);
        if self.scheduler.contains(self.idle)
            || !matches!(idle.state, ThreadState::Running | ThreadState::Blocked)
        {
            return Err(format!("idle thread is {:?}", idle.state));
        }
        Ok(())
    }
}

impl Kernel {
    /// Creates a thread running `entry` and makes it ready.
    ///
    /// Returns the new thread's id. If the new thread outranks the caller,
    /// the caller yields before this returns.
    pub fn create<F>(&self, name: &str, priority: Priority, entry: F) -> Result<ThreadId, KernelError>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut st = self.state();
        if priority > PRI_MAX {
            st.fatal(format!("priority {priority} for `{name}` out of range"));
        }
        let limit = self.config().max_threads;
        if st.live_threads() >= limit {
            warn!("cannot create `{name}`: {limit} threads alive");
            return Err(KernelError::ThreadLimit { limit });
        }
        let id = self.spawn_context(&mut st, name, priority, entry)?;
        if st.policy == Policy::Mlfqs {
            // Fresh threads start at the default nice with no CPU history.
            let t = st.thread_mut(id);
            t.nice = NICE_DEFAULT;
            t.recent_cpu = Fixed::ZERO;
            t.base_priority = mlfqs::priority(t.recent_cpu, t.nice);
            t.priority = t.base_priority;
        }
        debug!(
            "created thread {id} `{name}` at priority {}",
            st.thread(id).priority
        );
        st.enqueue_ready(id);
        self.preempt_check(st);
        Ok(id)
    }

    /// Starts a host thread to serve as the execution context of a new,
    /// blocked thread record.
    fn spawn_context<F>(
        &self,
        st: &mut ThreadManager,
        name: &str,
        priority: Priority,
        entry: F,
    ) -> Result<ThreadId, KernelError>
    where
        F: FnOnce() + Send + 'static,
    {
        let id = st.allocate_tid();
        let context = Arc::new(Context::new());
        let kernel = self.clone();
        let baton = Arc::clone(&context);
        let host = std::thread::Builder::new()
            .name(format!("rivet {name}"))
            .stack_size(self.config().stack_size)
            .spawn(move || kernel.trampoline(&baton, entry))?;
        let mut thread = Thread::new(id, name, priority, context);
        thread.host = Some(host);
        st.threads.insert(id, thread);
        st.stats.threads_created += 1;
        Ok(id)
    }

    /// First and last code run on a spawned thread's host thread.
    fn trampoline<F: FnOnce()>(self, context: &Context, entry: F) {
        if context.park() == Resume::Halt {
            return;
        }
        match panic::catch_unwind(AssertUnwindSafe(entry)) {
            Ok(()) => self.exit_current(),
            Err(payload) => match payload.downcast_ref::<Unwind>() {
                Some(Unwind::Exit) => self.exit_current(),
                Some(Unwind::Halted) => {}
                None => self.crash(&panic_message(&*payload)),
            },
        }
    }

    pub(crate) fn spawn_idle(&self) -> Result<ThreadId, KernelError> {
        let mut st = self.state();
        let kernel = self.clone();
        let id = self.spawn_context(&mut st, "idle", PRI_MIN, move || kernel.idle_loop())?;
        st.idle = id;
        Ok(id)
    }

    /// Runs when nothing else is ready. Each pass is one "halt until the
    /// next interrupt".
    fn idle_loop(&self) {
        loop {
            let mut st = self.state();
            if st.scheduler.is_empty() && st.sleepers.is_empty() && st.timer_hooks.is_empty() {
                st.fatal("machine stall: every thread is blocked and nothing can wake one");
            }
            let idle = st.idle;
            st.thread_mut(idle).state = ThreadState::Blocked;
            self.schedule(st);
            self.timer_interrupt();
        }
    }

    fn exit_current(&self) {
        let mut st = self.state();
        if st.halted.is_some() {
            return;
        }
        let cur = st.current;
        let held: Vec<LockId> = st
            .locks
            .iter()
            .filter(|(_, l)| l.owner == Some(cur))
            .map(|(&id, _)| id)
            .collect();
        if !held.is_empty() {
            warn!("thread {cur} exiting while holding {held:?}");
        }
        let t = st.thread_mut(cur);
        t.state = ThreadState::Dying;
        debug!("thread {cur} `{}` exiting", t.name);
        self.schedule(st);
    }

    /// A panic escaped a thread's entry closure.
    fn crash(&self, msg: &str) {
        let mut st = self.state();
        if st.halted.is_some() {
            return;
        }
        let reason = format!("thread `{}` panicked: {msg}", st.thread(st.current).name);
        error!("{reason}");
        st.halt(reason);
    }

    /// Switch to the best ready thread, or idle.
    ///
    /// The caller has already set the current thread's new state and queued
    /// it wherever it belongs. Returns when the current thread is picked
    /// again.
    pub(crate) fn schedule(&self, mut st: SpinLockGuard<'_, ThreadManager>) {
        if st.halted.is_some() {
            return;
        }
        let prev = st.current;
        debug_assert_ne!(st.thread(prev).state, ThreadState::Running);
        st.reap();

        let next = match st.scheduler.schedule() {
            Some(t) => {
                st.transfer(t, Membership::Ready, Membership::Detached);
                t
            }
            None => st.idle,
        };
        st.thread_mut(next).state = ThreadState::Running;
        st.current = next;
        st.slice_ticks = 0;
        if next == prev {
            return;
        }

        let prev_dying = st.thread(prev).state == ThreadState::Dying;
        if prev_dying {
            st.dying.push(prev);
        }
        let next_ctx = Arc::clone(&st.thread(next).context);
        let prev_ctx = Arc::clone(&st.thread(prev).context);
        st.stats.context_switches += 1;
        trace!("switch {prev} -> {next}");
        let initial = prev == st.initial;
        drop(st);

        next_ctx.resume(Resume::Run);
        if prev_dying {
            return;
        }
        if prev_ctx.park() == Resume::Halt {
            if initial {
                let reason = self.state().halted.clone().unwrap_or_default();
                panic!("kernel halted: {reason}");
            }
            panic::resume_unwind(Box::new(Unwind::Halted));
        }
    }

    /// Current thread goes back on the ready queue and the best thread runs.
    pub(crate) fn yield_locked(&self, mut st: SpinLockGuard<'_, ThreadManager>) {
        let cur = st.current;
        if cur == st.idle {
            st.thread_mut(cur).state = ThreadState::Blocked;
        } else {
            st.enqueue_ready(cur);
        }
        self.schedule(st);
    }

    /// Yield if a ready thread outranks the running one. In interrupt
    /// context the yield waits for the handler to return.
    pub(crate) fn preempt_check(&self, mut st: SpinLockGuard<'_, ThreadManager>) {
        if !st.should_preempt() {
            return;
        }
        if st.intr.in_handler {
            st.intr.yield_on_return = true;
        } else {
            self.yield_locked(st);
        }
    }

    /// Puts the current thread to sleep until `unblock`.
    pub fn block(&self) {
        let mut st = self.state();
        if st.intr.in_handler {
            st.fatal("block in interrupt context");
        }
        let cur = st.current;
        st.thread_mut(cur).state = ThreadState::Blocked;
        self.schedule(st);
    }

    /// Makes a thread stopped by `block` ready again.
    pub fn unblock(&self, id: ThreadId) {
        let mut st = self.state();
        let blocked = st.threads.get(&id).is_some_and(|t| {
            t.state == ThreadState::Blocked && t.membership == Membership::Detached
        });
        if !blocked || id == st.idle {
            st.fatal(format!("unblock of thread {id}, which is not blocked"));
        }
        st.enqueue_ready(id);
        self.preempt_check(st);
    }

    pub fn yield_now(&self) {
        let mut st = self.state();
        if st.intr.in_handler {
            st.intr.yield_on_return = true;
            return;
        }
        self.yield_locked(st);
    }

    /// Ends the current thread. Its closure's locals are dropped first.
    pub fn exit(&self) -> ! {
        {
            let mut st = self.state();
            let cur = st.current;
            if cur == st.initial || cur == st.idle {
                let msg = format!("thread {cur} `{}` may not exit", st.thread(cur).name);
                st.fatal(msg);
            }
            if st.intr.in_handler {
                st.fatal("exit in interrupt context");
            }
        }
        panic::resume_unwind(Box::new(Unwind::Exit))
    }

    /// Sets the current thread's base priority. Ignored under MLFQS.
    pub fn set_priority(&self, priority: Priority) {
        let mut st = self.state();
        if priority > PRI_MAX {
            st.fatal(format!("priority {priority} out of range"));
        }
        if st.policy == Policy::Mlfqs {
            debug!("set_priority({priority}) ignored under MLFQS");
            return;
        }
        let cur = st.current;
        st.thread_mut(cur).base_priority = priority;
        st.refresh_priority(cur);
        self.preempt_check(st);
    }

    /// Effective priority of the current thread.
    pub fn priority(&self) -> Priority {
        let st = self.state();
        st.thread(st.current).priority
    }

    pub fn current(&self) -> ThreadId {
        self.state().current
    }

    pub fn thread_name(&self) -> String {
        let st = self.state();
        st.thread(st.current).name.clone()
    }

    pub fn thread(&self, id: ThreadId) -> Option<ThreadInfo> {
        self.state().threads.get(&id).map(Thread::info)
    }

    pub fn threads(&self) -> Vec<ThreadInfo> {
        self.state().threads.values().map(Thread::info).collect()
    }

    pub fn stats(&self) -> Stats {
        let st = self.state();
        Stats {
            ticks: st.ticks,
            ..st.stats.clone()
        }
    }

    /// Audits every scheduler invariant; a violation is fatal.
    pub fn check_invariants(&self) {
        let mut st = self.state();
        if let Err(msg) = st.audit() {
            st.fatal(format!("invariant violated: {msg}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel() -> Kernel {
        let _ = env_logger::builder().is_test(true).try_init();
        Kernel::boot(KernelConfig::default()).unwrap()
    }

    #[test]
    fn boot_makes_main_and_idle() {
        let k = kernel();
        let threads = k.threads();
        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].name, "main");
        assert_eq!(threads[0].state, ThreadState::Running);
        assert_eq!(threads[0].priority, PRI_DEFAULT);
        assert_eq!(threads[1].name, "idle");
        assert_eq!(threads[1].state, ThreadState::Blocked);
        assert_eq!(threads[1].priority, PRI_MIN);
        assert_eq!(k.thread_name(), "main");
        k.check_invariants();
        k.shutdown();
    }

    #[test]
    fn higher_priority_child_runs_before_create_returns() {
        let k = kernel();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        k.create("eager", PRI_DEFAULT + 1, move || {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        })
        .unwrap();
        assert!(ran.load(std::sync::atomic::Ordering::SeqCst));
        k.check_invariants();
        let stats = k.shutdown();
        assert_eq!(stats.threads_created, 3);
        assert_eq!(stats.context_switches, 2);
    }

    #[test]
    fn lower_priority_child_waits_for_yield() {
        let k = kernel();
        let ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let id = k
            .create("lazy", PRI_DEFAULT - 1, move || {
                flag.store(true, std::sync::atomic::Ordering::SeqCst);
            })
            .unwrap();
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(k.thread(id).unwrap().state, ThreadState::Ready);
        k.yield_now();
        // Main still outranks it.
        assert!(!ran.load(std::sync::atomic::Ordering::SeqCst));
        k.set_priority(PRI_MIN);
        assert!(ran.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(k.priority(), PRI_MIN);
        k.check_invariants();
        k.shutdown();
    }

    #[test]
    fn exit_reclaims_the_record() {
        let k = kernel();
        let k2 = k.clone();
        let id = k
            .create("quitter", PRI_MAX, move || {
                k2.exit();
            })
            .unwrap();
        assert_eq!(k.thread(id).unwrap().state, ThreadState::Dying);
        // Reclaimed by the next switch decision.
        k.yield_now();
        assert!(k.thread(id).is_none());
        k.check_invariants();
        k.shutdown();
    }

    #[test]
    #[should_panic(expected = "may not exit")]
    fn initial_thread_cannot_exit() {
        let k = kernel();
        k.exit();
    }

    #[test]
    #[should_panic(expected = "not blocked")]
    fn unblock_of_ready_thread_is_fatal() {
        let k = kernel();
        let id = k.create("ready", PRI_MIN + 1, || {}).unwrap();
        k.unblock(id);
    }

    #[test]
    fn stats_display() {
        let stats = Stats {
            ticks: 10,
            idle_ticks: 4,
            kernel_ticks: 6,
            context_switches: 3,
            threads_created: 2,
        };
        assert_eq!(
            stats.to_string(),
            "Timer: 10 ticks; Thread: 4 idle ticks, 6 kernel ticks; 3 context switches, 2 threads created"
        );
    }
}
