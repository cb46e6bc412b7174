//! Thread scheduler and synchronization core of the Rivet teaching kernel.
//!
//! A single logical CPU is shared by kernel threads under one of two
//! policies: strict priority with priority donation through locks, or the
//! multi-level feedback queue scheduler. Semaphores, locks and condition
//! variables are built on the scheduler's block/unblock primitives.
//!
//! The kernel runs hosted: every kernel thread has a host thread as its
//! execution context, and exactly one of them runs at a time. Time advances
//! only through [`Kernel::timer_interrupt`], called by running threads and
//! by the idle thread.

extern crate alloc;

pub mod config;
pub mod error;
pub mod fixed_point;
pub mod sync;
pub mod thread;
pub mod timer;
pub mod types;

pub use config::{KernelConfig, Policy};
pub use error::KernelError;
pub use fixed_point::Fixed;
pub use sync::{Condvar, Lock, Semaphore};
pub use thread::tcb::{Membership, ThreadInfo, ThreadState};
pub use thread::Stats;
pub use types::*;

use alloc::sync::Arc;
use log::info;
use sync::spinlock::{SpinLock, SpinLockGuard};
use thread::ThreadManager;

struct Shared {
    config: KernelConfig,
    state: SpinLock<ThreadManager>,
}

/// Handle to a running kernel. Cheap to clone; every clone refers to the
/// same machine.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<Shared>,
}

impl Kernel {
    /// Boots a kernel. The calling host thread becomes the initial thread,
    /// "main", and keeps running.
    pub fn boot(config: KernelConfig) -> Result<Kernel, KernelError> {
        config.validate()?;
        let state = ThreadManager::new(&config);
        let kernel = Kernel {
            inner: Arc::new(Shared {
                config,
                state: SpinLock::new(state),
            }),
        };
        kernel.spawn_idle()?;
        info!(
            "rivet: booted, {:?} scheduling, {} tick time slice, {} Hz timer",
            kernel.config().policy,
            kernel.config().time_slice,
            kernel.config().timer_freq
        );
        Ok(kernel)
    }

    /// Powers the machine off. Must be called by the initial thread.
    ///
    /// Every other thread is released from wherever it is parked and its
    /// host thread finishes before this returns.
    pub fn shutdown(self) -> Stats {
        let mut st = self.state();
        if st.current != st.initial {
            let msg = format!("shutdown from thread {}", st.current);
            st.fatal(msg);
        }
        let stats = Stats {
            ticks: st.ticks,
            ..st.stats.clone()
        };
        st.halt("shutdown".into());
        let hooks = core::mem::take(&mut st.timer_hooks);
        let hosts: Vec<_> = st
            .threads
            .values_mut()
            .filter_map(|t| t.host.take())
            .collect();
        drop(st);
        // Hooks can own kernel objects whose drop takes the state lock.
        drop(hooks);
        for host in hosts {
            let _ = host.join();
        }
        info!("rivet: powering off");
        info!("{stats}");
        stats
    }

    pub fn config(&self) -> &KernelConfig {
        &self.inner.config
    }

    pub(crate) fn state(&self) -> SpinLockGuard<'_, ThreadManager> {
        self.inner.state.lock()
    }
}
