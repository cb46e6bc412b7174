//! The timer interrupt and everything driven by it: quantum preemption,
//! timed sleep, MLFQS bookkeeping and device hooks.

use crate::config::Policy;
use crate::thread::tcb::{Membership, ThreadState};
use crate::types::Tick;
use crate::Kernel;
use log::{debug, trace};

/// Callback run in interrupt context after every tick's scheduling work.
pub type TimerHook = Box<dyn FnMut(&Kernel, Tick) + Send>;

#[derive(Debug, Default)]
pub(crate) struct InterruptState {
    /// Inside `timer_interrupt`.
    pub in_handler: bool,
    /// Yield once the handler returns.
    pub yield_on_return: bool,
}

impl Kernel {
    /// Delivers one timer interrupt on the current thread.
    pub fn timer_interrupt(&self) {
        let mut st = self.state();
        if st.intr.in_handler {
            st.fatal("nested timer interrupt");
        }
        st.intr.in_handler = true;
        st.ticks += 1;
        st.slice_ticks += 1;
        let now = st.ticks;
        if st.current == st.idle {
            st.stats.idle_ticks += 1;
        } else {
            st.stats.kernel_ticks += 1;
        }

        if st.policy == Policy::Mlfqs {
            st.mlfqs_tick(self.config().timer_freq);
        }
        if st.current != st.idle && st.slice_ticks >= self.config().time_slice {
            st.intr.yield_on_return = true;
        }
        if st.sleepers.due(now) {
            for id in st.sleepers.expire(now) {
                st.transfer(id, Membership::Sleeping, Membership::Detached);
                st.thread_mut(id).wakeup = None;
                debug!("thread {id} woke at tick {now}");
                st.enqueue_ready(id);
            }
        }
        if st.should_preempt() {
            st.intr.yield_on_return = true;
        }

        if !st.timer_hooks.is_empty() {
            let mut hooks = core::mem::take(&mut st.timer_hooks);
            drop(st);
            for hook in hooks.iter_mut() {
                hook(self, now);
            }
            st = self.state();
            // Hooks registered by hooks go after the existing ones.
            hooks.append(&mut st.timer_hooks);
            st.timer_hooks = hooks;
        }

        st.intr.in_handler = false;
        if core::mem::take(&mut st.intr.yield_on_return) {
            trace!("yield on return from tick {now}");
            self.yield_locked(st);
        }
    }

    /// Ticks since boot.
    pub fn ticks(&self) -> Tick {
        self.state().ticks
    }

    /// Ticks since `then`, a value returned by `ticks`.
    pub fn elapsed(&self, then: Tick) -> Tick {
        self.ticks().saturating_sub(then)
    }

    /// Sleeps for at least `ticks` timer ticks.
    pub fn sleep(&self, ticks: Tick) {
        let start = self.ticks();
        self.sleep_until(start.saturating_add(ticks));
    }

    /// Blocks until the tick counter reaches `wakeup`. A deadline already
    /// reached returns at once.
    pub fn sleep_until(&self, wakeup: Tick) {
        let mut st = self.state();
        if st.intr.in_handler {
            st.fatal("sleep in interrupt context");
        }
        let cur = st.current;
        if cur == st.idle {
            st.fatal("idle thread may not sleep");
        }
        if wakeup <= st.ticks {
            return;
        }
        st.transfer(cur, Membership::Detached, Membership::Sleeping);
        let t = st.thread_mut(cur);
        t.state = ThreadState::Blocked;
        t.wakeup = Some(wakeup);
        st.sleepers.insert(cur, wakeup);
        trace!("thread {cur} sleeps until tick {wakeup}");
        self.schedule(st);
    }

    /// Registers a hook run in interrupt context on every tick.
    ///
    /// Hooks may only use operations that never block: `Semaphore::up`,
    /// `Semaphore::try_down`, `Lock::try_acquire`, `unblock` and inspection.
    pub fn on_timer<F>(&self, hook: F)
    where
        F: FnMut(&Kernel, Tick) + Send + 'static,
    {
        self.state().timer_hooks.push(Box::new(hook));
    }
}

#[cfg(test)]
mod tests {
    use crate::config::KernelConfig;
    use crate::Kernel;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    fn kernel() -> Kernel {
        let _ = env_logger::builder().is_test(true).try_init();
        Kernel::boot(KernelConfig::default()).unwrap()
    }

    #[test]
    fn ticks_count_up() {
        let k = kernel();
        let start = k.ticks();
        for _ in 0..5 {
            k.timer_interrupt();
        }
        assert_eq!(k.elapsed(start), 5);
        assert_eq!(k.stats().kernel_ticks, 5);
        k.shutdown();
    }

    #[test]
    fn past_deadline_returns_immediately() {
        let k = kernel();
        k.timer_interrupt();
        k.sleep_until(1);
        k.sleep(0);
        assert_eq!(k.ticks(), 1);
        k.shutdown();
    }

    #[test]
    fn main_sleep_is_driven_by_idle() {
        let k = kernel();
        k.sleep(10);
        assert_eq!(k.ticks(), 10);
        let stats = k.stats();
        assert_eq!(stats.idle_ticks, 10);
        k.check_invariants();
        k.shutdown();
    }

    #[test]
    fn sleepers_pass_the_audit() {
        let k = kernel();
        for (name, wakeup) in [("late", 12), ("early", 7)] {
            let k2 = k.clone();
            k.create(name, 40, move || k2.sleep_until(wakeup)).unwrap();
        }
        let early = k.threads().into_iter().find(|t| t.name == "early").unwrap();
        assert_eq!(early.wakeup, Some(7));
        k.check_invariants();
        k.sleep(8);
        // "early" is gone; "late" still sleeps.
        assert_eq!(k.threads().len(), 3);
        k.check_invariants();
        k.sleep(5);
        assert_eq!(k.threads().len(), 2);
        k.shutdown();
    }

    #[test]
    fn elapsed_never_underflows() {
        let k = kernel();
        k.timer_interrupt();
        assert_eq!(k.elapsed(0), 1);
        assert_eq!(k.elapsed(5), 0);
        k.shutdown();
    }

    #[test]
    fn hooks_see_every_tick() {
        let k = kernel();
        let seen = Arc::new(AtomicU64::new(0));
        let last = Arc::clone(&seen);
        k.on_timer(move |_, now| last.store(now, Ordering::SeqCst));
        for _ in 0..3 {
            k.timer_interrupt();
        }
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        k.shutdown();
    }

    #[test]
    #[should_panic(expected = "nested timer interrupt")]
    fn nested_interrupt_is_fatal() {
        let k = kernel();
        k.on_timer(|k, _| k.timer_interrupt());
        k.timer_interrupt();
    }
}
