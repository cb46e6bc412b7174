mod common;

use common::boot;
use rivet_kernel::{Fixed, KernelConfig, ThreadState, PRI_MAX};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[test]
fn fresh_kernel_runs_at_the_top() {
    let k = boot(KernelConfig::mlfqs());
    assert_eq!(k.priority(), PRI_MAX);
    assert_eq!(k.nice(), 0);
    assert_eq!(k.load_avg_x100(), 0);
    assert_eq!(k.recent_cpu_x100(), 0);
    k.set_nice(5);
    assert_eq!(k.priority(), 53);
    // Explicit priorities are ignored.
    k.set_priority(10);
    assert_eq!(k.priority(), 53);
    k.check_invariants();
    k.shutdown();
}

#[test]
fn one_busy_second() {
    let k = boot(KernelConfig::mlfqs());
    k.set_nice(5);
    for _ in 0..100 {
        k.timer_interrupt();
    }
    assert_eq!(k.load_avg_x100(), 2);
    let recent = k.recent_cpu_x100();
    assert!((820..=825).contains(&recent), "recent_cpu x100 = {recent}");
    assert_eq!(k.priority(), 51);
    k.check_invariants();
    k.shutdown();
}

#[test]
fn children_start_at_default_nice() {
    let k = boot(KernelConfig::mlfqs());
    k.set_nice(-5);
    // Half a second: main has CPU history but nothing is recomputed yet.
    for _ in 0..50 {
        k.timer_interrupt();
    }
    assert_eq!(k.recent_cpu_x100(), 5000);
    let k2 = k.clone();
    let seen = Arc::new(AtomicU64::new(0));
    let s = Arc::clone(&seen);
    let id = k
        .create("child", 0, move || {
            s.store((k2.nice() + 100) as u64, Ordering::SeqCst);
        })
        .unwrap();
    let child = k.thread(id).unwrap();
    assert_eq!(child.nice, 0);
    assert_eq!(child.recent_cpu, Fixed::ZERO);
    assert_eq!(child.priority, PRI_MAX);
    // Main is still at the top too, so the child waits for a yield.
    assert_eq!(child.state, ThreadState::Ready);
    k.yield_now();
    assert_eq!(seen.load(Ordering::SeqCst), 100);
    k.shutdown();
}

#[test]
fn nicer_thread_gets_less_cpu() {
    let k = boot(KernelConfig::mlfqs());
    let counts: Vec<Arc<AtomicU64>> = (0..2).map(|_| Arc::new(AtomicU64::new(0))).collect();
    for (i, nice) in [0, 10].into_iter().enumerate() {
        let (k2, count) = (k.clone(), Arc::clone(&counts[i]));
        k.create(&format!("nice {nice}"), 0, move || {
            k2.set_nice(nice);
            while k2.ticks() < 600 {
                count.fetch_add(1, Ordering::SeqCst);
                k2.timer_interrupt();
            }
        })
        .unwrap();
    }
    // Main steps aside until both are done.
    k.set_nice(20);
    k.sleep_until(601);
    let (a, b) = (counts[0].load(Ordering::SeqCst), counts[1].load(Ordering::SeqCst));
    assert!(a > b, "nice 0 ran {a} ticks, nice 10 ran {b}");
    k.check_invariants();
    k.shutdown();
}

#[test]
#[should_panic(expected = "out of range")]
fn nice_out_of_range_is_fatal() {
    let k = boot(KernelConfig::mlfqs());
    k.set_nice(21);
}
