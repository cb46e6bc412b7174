//! Scheduling workloads: classic kernel thread tests, each of which checks
//! its own outcome and leaves a transcript behind.

use crate::{RuntimeError, Transcript};
use rivet_kernel::{Condvar, Fixed, Kernel, Lock, Policy, Priority, Semaphore, Tick, PRI_DEFAULT, PRI_MIN};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workload {
    /// Five threads sleep for different durations, seven times each. Wakeups
    /// must come in order of total sleep time.
    AlarmMultiple,
    /// Equal-priority threads yielding to each other run round robin.
    PriorityFifo,
    /// Two threads wait on a lock held by main and lend it their priority.
    PriorityDonateOne,
    /// A chain of lock waits, each link lending the top priority to the next.
    PriorityDonateChain,
    /// Condition variable signals wake waiters by priority.
    PriorityCondvar,
    /// Two threads hand control back and forth through two semaphores.
    SemaPingPong,
    /// One busy thread drives the MLFQS load average past 0.5.
    MlfqsLoad,
}

impl Workload {
    pub const ALL: [Workload; 7] = [
        Workload::AlarmMultiple,
        Workload::PriorityFifo,
        Workload::PriorityDonateOne,
        Workload::PriorityDonateChain,
        Workload::PriorityCondvar,
        Workload::SemaPingPong,
        Workload::MlfqsLoad,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Workload::AlarmMultiple => "alarm-multiple",
            Workload::PriorityFifo => "priority-fifo",
            Workload::PriorityDonateOne => "priority-donate-one",
            Workload::PriorityDonateChain => "priority-donate-chain",
            Workload::PriorityCondvar => "priority-condvar",
            Workload::SemaPingPong => "sema-pingpong",
            Workload::MlfqsLoad => "mlfqs-load",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Workload::AlarmMultiple => "5 threads sleep 7 times each; wakeups ordered by total sleep",
            Workload::PriorityFifo => "16 equal-priority threads yield round robin",
            Workload::PriorityDonateOne => "two waiters donate to the lock holder",
            Workload::PriorityDonateChain => "donation through a chain of 6 lock waits",
            Workload::PriorityCondvar => "condvar signals wake the highest-priority waiter",
            Workload::SemaPingPong => "two threads alternate through a pair of semaphores",
            Workload::MlfqsLoad => "load average rises to 0.5 in 38-45 seconds and decays when idle",
        }
    }

    /// Scheduler the workload is written for.
    pub fn policy(self) -> Policy {
        match self {
            Workload::MlfqsLoad => Policy::Mlfqs,
            _ => Policy::Priority,
        }
    }

    /// Runs the workload on `kernel` from its initial thread.
    pub fn run(self, kernel: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
        match self {
            Workload::AlarmMultiple => alarm_multiple(kernel, out),
            Workload::PriorityFifo => priority_fifo(kernel, out),
            Workload::PriorityDonateOne => priority_donate_one(kernel, out),
            Workload::PriorityDonateChain => priority_donate_chain(kernel, out),
            Workload::PriorityCondvar => priority_condvar(kernel, out),
            Workload::SemaPingPong => sema_pingpong(kernel, out),
            Workload::MlfqsLoad => mlfqs_load(kernel, out),
        }
    }

    fn fail(self, message: impl Into<String>) -> RuntimeError {
        RuntimeError::Check {
            workload: self.name(),
            message: message.into(),
        }
    }

    fn expect_transcript(self, out: &Transcript, expected: &[String]) -> Result<(), RuntimeError> {
        let lines = out.lines();
        if let Some(i) = lines.iter().zip(expected).position(|(got, want)| got != want) {
            return Err(self.fail(format!(
                "line {}: expected `{}`, got `{}`",
                i + 1,
                expected[i],
                lines[i]
            )));
        }
        if lines.len() != expected.len() {
            return Err(self.fail(format!("expected {} lines, got {}", expected.len(), lines.len())));
        }
        Ok(())
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Workload {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Workload::ALL
            .into_iter()
            .find(|w| w.name() == s)
            .ok_or_else(|| RuntimeError::UnknownWorkload(s.to_string()))
    }
}

type Shared<T> = Arc<Mutex<Vec<T>>>;

fn record<T>(shared: &Shared<T>, item: T) {
    shared.lock().unwrap_or_else(PoisonError::into_inner).push(item);
}

fn take<T>(shared: &Shared<T>) -> Vec<T> {
    std::mem::take(&mut *shared.lock().unwrap_or_else(PoisonError::into_inner))
}

struct Wake {
    thread: usize,
    duration: Tick,
    iteration: Tick,
    deadline: Tick,
    woke: Tick,
}

fn alarm_multiple(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    const THREADS: usize = 5;
    const ITERATIONS: Tick = 7;
    let this = Workload::AlarmMultiple;

    let wakes: Shared<Wake> = Arc::default();
    let done = Arc::new(Semaphore::new(k, 0));
    // Leave room for every thread to start before the first deadline.
    let start = k.ticks() + 100;
    for thread in 0..THREADS {
        let (k2, wakes, done) = (k.clone(), Arc::clone(&wakes), Arc::clone(&done));
        let duration = (thread as Tick + 1) * 10;
        k.create(&format!("thread {thread}"), PRI_DEFAULT, move || {
            for iteration in 1..=ITERATIONS {
                let deadline = start + iteration * duration;
                k2.sleep_until(deadline);
                let woke = k2.ticks();
                record(
                    &wakes,
                    Wake {
                        thread,
                        duration,
                        iteration,
                        deadline,
                        woke,
                    },
                );
            }
            done.up();
        })?;
    }
    for _ in 0..THREADS {
        done.down();
    }

    let wakes = take(&wakes);
    if wakes.len() != THREADS * ITERATIONS as usize {
        return Err(this.fail(format!("{} wakeups recorded", wakes.len())));
    }
    let mut last_product = 0;
    for w in &wakes {
        let product = w.iteration * w.duration;
        out.push(format!(
            "thread {}: duration={}, iteration={}, product={product}",
            w.thread, w.duration, w.iteration
        ));
        if w.woke < w.deadline {
            return Err(this.fail(format!(
                "thread {} woke at tick {} before its deadline {}",
                w.thread, w.woke, w.deadline
            )));
        }
        if product < last_product {
            return Err(this.fail(format!("thread {} woke out of order", w.thread)));
        }
        last_product = product;
    }
    Ok(())
}

fn priority_fifo(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    const THREADS: usize = 16;
    const ITERATIONS: usize = 16;
    let this = Workload::PriorityFifo;

    let order: Shared<usize> = Arc::default();
    k.set_priority(PRI_DEFAULT + 2);
    for i in 0..THREADS {
        let (k2, order) = (k.clone(), Arc::clone(&order));
        k.create(&format!("{i}"), PRI_DEFAULT + 1, move || {
            for _ in 0..ITERATIONS {
                record(&order, i);
                k2.yield_now();
            }
        })?;
    }
    // Everyone runs to completion before main is back.
    k.set_priority(PRI_DEFAULT);

    let order = take(&order);
    if order.len() != THREADS * ITERATIONS {
        return Err(this.fail(format!("{} turns recorded", order.len())));
    }
    for (round, turns) in order.chunks(THREADS).enumerate() {
        let line: Vec<String> = turns.iter().map(ToString::to_string).collect();
        out.push(format!("iteration: {}", line.join(" ")));
        if turns.iter().copied().ne(0..THREADS) {
            return Err(this.fail(format!("round {round} ran out of order")));
        }
    }
    Ok(())
}

fn priority_donate_one(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    let lock = Arc::new(Lock::new(k));
    lock.acquire();
    for (name, priority) in [("acquire1", PRI_DEFAULT + 1), ("acquire2", PRI_DEFAULT + 2)] {
        let (lock, out2) = (Arc::clone(&lock), out.clone());
        k.create(name, priority, move || {
            lock.acquire();
            out2.push(format!("{name}: got the lock"));
            lock.release();
            out2.push(format!("{name}: done"));
        })?;
        out.push(format!(
            "This thread should have priority {priority}.  Actual priority: {}.",
            k.priority()
        ));
    }
    lock.release();
    out.push("acquire2, acquire1 must already have finished, in that order.");
    out.push("This should be the last line before finishing this test.");

    let expected = [
        format!("This thread should have priority {0}.  Actual priority: {0}.", PRI_DEFAULT + 1),
        format!("This thread should have priority {0}.  Actual priority: {0}.", PRI_DEFAULT + 2),
        "acquire2: got the lock".into(),
        "acquire2: done".into(),
        "acquire1: got the lock".into(),
        "acquire1: done".into(),
        "acquire2, acquire1 must already have finished, in that order.".into(),
        "This should be the last line before finishing this test.".into(),
    ];
    Workload::PriorityDonateOne.expect_transcript(out, &expected)
}

fn priority_donate_chain(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    const DEPTH: usize = 7;
    const STEP: Priority = 3;
    let this = Workload::PriorityDonateChain;
    let top = PRI_MIN + STEP * (DEPTH as Priority - 1);

    let locks: Vec<Arc<Lock>> = (0..DEPTH).map(|_| Arc::new(Lock::new(k))).collect();
    k.set_priority(PRI_MIN);
    locks[0].acquire();
    for i in 1..DEPTH {
        let priority = PRI_MIN + STEP * i as Priority;
        let (k2, out2) = (k.clone(), out.clone());
        let (own, wants) = (Arc::clone(&locks[i]), Arc::clone(&locks[i - 1]));
        k.create(&format!("thread {i}"), priority, move || {
            own.acquire();
            wants.acquire();
            out2.push(format!("thread {i} got lock {} at priority {}", i - 1, k2.priority()));
            wants.release();
            own.release();
            out2.push(format!("thread {i} finishing with priority {}", k2.priority()));
        })?;
        // Thread i now waits on a lock main is at the end of.
        if k.priority() != priority {
            return Err(this.fail(format!(
                "main should have priority {priority} after thread {i}, has {}",
                k.priority()
            )));
        }
    }
    locks[0].release();
    out.push(format!("main finishing with priority {}", k.priority()));

    let mut expected: Vec<String> = (1..DEPTH)
        .map(|i| format!("thread {i} got lock {} at priority {top}", i - 1))
        .collect();
    expected.extend(
        (1..DEPTH)
            .rev()
            .map(|i| format!("thread {i} finishing with priority {}", PRI_MIN + STEP * i as Priority)),
    );
    expected.push(format!("main finishing with priority {PRI_MIN}"));
    k.set_priority(PRI_DEFAULT);
    this.expect_transcript(out, &expected)
}

fn priority_condvar(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    const THREADS: Priority = 10;
    let lock = Arc::new(Lock::new(k));
    let cond = Arc::new(Condvar::new(k));

    k.set_priority(PRI_MIN);
    let mut expected = Vec::new();
    for i in 0..THREADS {
        let priority = PRI_DEFAULT - (i + 7) % 10 - 1;
        let name = format!("priority {priority}");
        let (lock, cond, out2) = (Arc::clone(&lock), Arc::clone(&cond), out.clone());
        expected.push(format!("Thread {name} starting."));
        k.create(&name.clone(), priority, move || {
            lock.acquire();
            out2.push(format!("Thread {name} starting."));
            cond.wait(&lock);
            out2.push(format!("Thread {name} woke up."));
            lock.release();
        })?;
    }
    for _ in 0..THREADS {
        lock.acquire();
        out.push("Signaling...");
        cond.signal(&lock);
        lock.release();
    }
    for priority in (PRI_DEFAULT - THREADS..PRI_DEFAULT).rev() {
        expected.push("Signaling...".into());
        expected.push(format!("Thread priority {priority} woke up."));
    }
    k.set_priority(PRI_DEFAULT);
    Workload::PriorityCondvar.expect_transcript(out, &expected)
}

fn sema_pingpong(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    const ROUNDS: usize = 10;
    let ping = Arc::new(Semaphore::new(k, 0));
    let pong = Arc::new(Semaphore::new(k, 0));
    let (p, q, out2) = (Arc::clone(&ping), Arc::clone(&pong), out.clone());
    k.create("pong", PRI_DEFAULT, move || {
        for round in 0..ROUNDS {
            p.down();
            out2.push(format!("pong {round}"));
            q.up();
        }
    })?;
    for round in 0..ROUNDS {
        out.push(format!("ping {round}"));
        ping.up();
        pong.down();
    }
    let expected: Vec<String> = (0..ROUNDS)
        .flat_map(|round| [format!("ping {round}"), format!("pong {round}")])
        .collect();
    Workload::SemaPingPong.expect_transcript(out, &expected)
}

fn mlfqs_load(k: &Kernel, out: &Transcript) -> Result<(), RuntimeError> {
    let this = Workload::MlfqsLoad;
    let second = Tick::from(k.config().timer_freq);
    let half = Fixed::ratio(1, 2);

    let start = k.ticks();
    while k.load_avg() < half {
        if k.elapsed(start) > 45 * second {
            return Err(this.fail(format!(
                "load average only {} after 45 seconds",
                x100(k.load_avg_x100())
            )));
        }
        k.timer_interrupt();
    }
    let seconds = k.elapsed(start) / second;
    if seconds < 38 {
        return Err(this.fail(format!("load average rose to 0.5 after only {seconds} seconds")));
    }
    out.push(format!("load average rose to 0.5 after {seconds} seconds"));

    out.push("sleeping for another 10 seconds, please wait...");
    k.sleep(10 * second);
    if k.load_avg() >= half {
        return Err(this.fail(format!(
            "load average stayed at {} after sleeping",
            x100(k.load_avg_x100())
        )));
    }
    out.push(format!("load average fell back to {}", x100(k.load_avg_x100())));
    Ok(())
}

fn x100(v: i32) -> String {
    let sign = if v < 0 { "-" } else { "" };
    format!("{sign}{}.{:02}", v.abs() / 100, v.abs() % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Runtime;
    use rivet_kernel::KernelConfig;

    fn run(workload: Workload) -> crate::Report {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = match workload.policy() {
            Policy::Mlfqs => KernelConfig::mlfqs(),
            Policy::Priority => KernelConfig::default(),
        };
        let report = Runtime::new(config).unwrap().run(workload);
        report.unwrap_or_else(|e| panic!("{workload}: {e}"))
    }

    #[test]
    fn names_round_trip() {
        for w in Workload::ALL {
            assert_eq!(w.name().parse::<Workload>().unwrap(), w);
        }
        assert!(matches!(
            "priority-sema".parse::<Workload>(),
            Err(RuntimeError::UnknownWorkload(_))
        ));
    }

    #[test]
    fn alarm_multiple_passes() {
        let report = run(Workload::AlarmMultiple);
        assert_eq!(report.transcript.len(), 35);
        assert_eq!(report.transcript[0], "thread 0: duration=10, iteration=1, product=10");
        assert_eq!(report.transcript[34], "thread 4: duration=50, iteration=7, product=350");
        // Everyone sleeps until tick 450; the time passes on the idle thread.
        assert!(report.stats.ticks >= 450);
        assert!(report.stats.idle_ticks >= 440);
    }

    #[test]
    fn priority_fifo_passes() {
        let report = run(Workload::PriorityFifo);
        assert_eq!(report.transcript.len(), 16);
        assert_eq!(report.transcript[0], "iteration: 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15");
    }

    #[test]
    fn priority_donate_one_passes() {
        let report = run(Workload::PriorityDonateOne);
        assert_eq!(report.transcript[0], "This thread should have priority 32.  Actual priority: 32.");
    }

    #[test]
    fn priority_donate_chain_passes() {
        let report = run(Workload::PriorityDonateChain);
        assert_eq!(report.transcript[0], "thread 1 got lock 0 at priority 18");
        assert_eq!(report.transcript.last().unwrap(), "main finishing with priority 0");
    }

    #[test]
    fn short_donation_depth_halts_the_chain() {
        let _ = env_logger::builder().is_test(true).try_init();
        let config = KernelConfig {
            donation_depth: 3,
            ..KernelConfig::default()
        };
        let err = Runtime::new(config)
            .unwrap()
            .run(Workload::PriorityDonateChain)
            .unwrap_err();
        match err {
            RuntimeError::Halted(reason) => assert!(reason.contains("donation chain"), "{reason}"),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn priority_condvar_passes() {
        let report = run(Workload::PriorityCondvar);
        assert_eq!(report.transcript[0], "Thread priority 23 starting.");
        assert_eq!(report.transcript[10], "Signaling...");
        assert_eq!(report.transcript[11], "Thread priority 30 woke up.");
    }

    #[test]
    fn sema_pingpong_passes() {
        let report = run(Workload::SemaPingPong);
        assert_eq!(report.transcript.len(), 20);
        assert_eq!(report.stats.threads_created, 3);
    }

    #[test]
    fn mlfqs_load_passes() {
        let report = run(Workload::MlfqsLoad);
        assert_eq!(report.transcript.len(), 3);
        assert!(report.transcript[2].starts_with("load average fell back to 0.4"));
    }

    #[test]
    fn x100_formats_two_places() {
        assert_eq!(x100(0), "0.00");
        assert_eq!(x100(42), "0.42");
        assert_eq!(x100(1205), "12.05");
        assert_eq!(x100(-7), "-0.07");
    }
}
