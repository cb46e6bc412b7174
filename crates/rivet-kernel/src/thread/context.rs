//! The execution-context switch primitive.
//!
//! Each kernel thread runs on its own host thread, but only one of them is
//! ever allowed to run kernel code. The others sit in [`Context::park`]. A
//! switch from A to B is "resume B's context, then park A's", which is the
//! hosted equivalent of saving A's registers and restoring B's.

use std::sync::{Condvar, Mutex, PoisonError};

/// Why a parked context was woken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resume {
    /// The scheduler picked this thread.
    Run,
    /// The kernel halted; the thread must unwind without touching the
    /// scheduler again.
    Halt,
}

#[derive(Default)]
pub(crate) struct Context {
    baton: Mutex<Option<Resume>>,
    cvar: Condvar,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand the CPU to this context. A pending halt is never overwritten.
    pub fn resume(&self, how: Resume) {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        if *baton != Some(Resume::Halt) {
            *baton = Some(how);
        }
        self.cvar.notify_one();
    }

    /// Sleep until resumed. A resume that raced ahead of us is not lost.
    pub fn park(&self) -> Resume {
        let mut baton = self.baton.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match *baton {
                // A halt stays latched so any later park sees it too.
                Some(Resume::Halt) => return Resume::Halt,
                Some(Resume::Run) => {
                    *baton = None;
                    return Resume::Run;
                }
                None => {
                    baton = self
                        .cvar
                        .wait(baton)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

/// Unwind payload that ends a kernel thread's host thread.
pub(crate) enum Unwind {
    /// `Kernel::exit` was called; the thread still has to be descheduled.
    Exit,
    /// The kernel halted while this thread was parked.
    Halted,
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn early_resume_is_not_lost() {
        let ctx = Context::new();
        ctx.resume(Resume::Run);
        assert_eq!(ctx.park(), Resume::Run);
    }

    #[test]
    fn halt_wins_and_stays() {
        let ctx = Context::new();
        ctx.resume(Resume::Halt);
        ctx.resume(Resume::Run);
        assert_eq!(ctx.park(), Resume::Halt);
        assert_eq!(ctx.park(), Resume::Halt);
    }

    #[test]
    fn ping_pong_between_host_threads() {
        let a = Arc::new(Context::new());
        let b = Arc::new(Context::new());
        let (a2, b2) = (Arc::clone(&a), Arc::clone(&b));
        let peer = std::thread::spawn(move || {
            let mut rounds = 0;
            while b2.park() == Resume::Run {
                rounds += 1;
                a2.resume(Resume::Run);
            }
            rounds
        });
        for _ in 0..100 {
            b.resume(Resume::Run);
            assert_eq!(a.park(), Resume::Run);
        }
        b.resume(Resume::Halt);
        assert_eq!(peer.join().unwrap(), 100);
    }
}
