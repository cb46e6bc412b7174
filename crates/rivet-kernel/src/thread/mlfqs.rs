//! Multi-level feedback queue scheduling.
//!
//! Priorities are derived from each thread's `nice` and its decaying
//! `recent_cpu`, and the decay rate follows the system load average.

use super::tcb::ThreadState;
use super::ThreadManager;
use crate::config::Policy;
use crate::fixed_point::Fixed;
use crate::types::{Nice, Priority, NICE_MAX, NICE_MIN, PRI_MAX, PRI_MIN};
use crate::Kernel;
use log::debug;

/// `PRI_MAX - recent_cpu/4 - 2*nice`, rounded and clamped.
pub(crate) fn priority(recent_cpu: Fixed, nice: Nice) -> Priority {
    let p = (Fixed::from_int(PRI_MAX as i32) - recent_cpu / 4 - nice * 2).round();
    p.clamp(PRI_MIN as i32, PRI_MAX as i32) as Priority
}

/// `(59/60)*load_avg + (1/60)*ready`.
pub(crate) fn load_avg(load_avg: Fixed, ready: usize) -> Fixed {
    Fixed::ratio(59, 60) * load_avg + Fixed::ratio(1, 60) * ready as i32
}

/// `(2*load_avg)/(2*load_avg + 1) * recent_cpu + nice`, never below zero.
pub(crate) fn recent_cpu(recent_cpu: Fixed, load_avg: Fixed, nice: Nice) -> Fixed {
    let twice = load_avg * 2;
    (twice / (twice + 1) * recent_cpu + nice).max(Fixed::ZERO)
}

impl ThreadManager {
    /// Per-tick bookkeeping; runs in the timer handler.
    pub(crate) fn mlfqs_tick(&mut self, timer_freq: u32) {
        let (current, idle) = (self.current, self.idle);
        if current != idle {
            let t = self.thread_mut(current);
            t.recent_cpu = t.recent_cpu + 1;
        }
        if self.ticks % timer_freq as u64 != 0 {
            return;
        }

        let ready = self.scheduler.len() + usize::from(current != idle);
        self.load_avg = load_avg(self.load_avg, ready);
        let load = self.load_avg;
        for t in self.threads.values_mut() {
            if t.id == idle || t.state == ThreadState::Dying {
                continue;
            }
            t.recent_cpu = recent_cpu(t.recent_cpu, load, t.nice);
            t.base_priority = priority(t.recent_cpu, t.nice);
            t.priority = t.base_priority;
            if t.state == ThreadState::Ready {
                self.scheduler.requeue(t.id, t.priority);
            }
        }
        debug!("load_avg {} with {ready} ready at tick {}", self.load_avg, self.ticks);
    }
}

impl Kernel {
    /// Sets the current thread's niceness and rederives its priority.
    pub fn set_nice(&self, nice: Nice) {
        let mut st = self.state();
        if !(NICE_MIN..=NICE_MAX).contains(&nice) {
            st.fatal(format!("nice {nice} out of range"));
        }
        let cur = st.current;
        let t = st.thread_mut(cur);
        t.nice = nice;
        if st.policy == Policy::Mlfqs {
            let t = st.thread_mut(cur);
            t.base_priority = priority(t.recent_cpu, nice);
            t.priority = t.base_priority;
            self.preempt_check(st);
        }
    }

    pub fn nice(&self) -> Nice {
        let st = self.state();
        st.thread(st.current).nice
    }

    pub fn recent_cpu(&self) -> Fixed {
        let st = self.state();
        st.thread(st.current).recent_cpu
    }

    pub fn load_avg(&self) -> Fixed {
        self.state().load_avg
    }

    /// `100 * recent_cpu` of the current thread, rounded.
    pub fn recent_cpu_x100(&self) -> i32 {
        self.recent_cpu().x100()
    }

    /// `100 * load_avg`, rounded.
    pub fn load_avg_x100(&self) -> i32 {
        self.load_avg().x100()
    }
}
